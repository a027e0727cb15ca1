//! In-memory user storage.
//!
//! Records live in a `BTreeMap` keyed by id. Ids grow monotonically from 1
//! and are never handed out twice, so key order is insertion order.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::user::{NewUser, User, UserPatch};

#[derive(Debug)]
struct Inner {
    records: BTreeMap<u64, User>,
    next_id: u64,
}

/// Owns every user record and the id counter.
///
/// Each operation holds one lock over both, so id assignment and the map
/// update happen as a unit. Construct one at startup and share it behind an
/// `Arc`.
#[derive(Debug)]
pub struct UserStore {
    inner: Mutex<Inner>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner { records: BTreeMap::new(), next_id: 1 }),
        }
    }

    // A panic inside an operation cannot leave `Inner` half-written: every
    // mutation is a single map call or counter bump.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All records, oldest first.
    pub fn list(&self) -> Vec<User> {
        self.lock().records.values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Option<User> {
        self.lock().records.get(&id).cloned()
    }

    /// Stores `user` under the next id and returns the stored record.
    pub fn create(&self, user: NewUser) -> User {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let record = User {
            id,
            name: user.name,
            email: user.email,
            age: user.age,
            status: user.status.unwrap_or_default(),
        };
        inner.records.insert(id, record.clone());

        debug!(id, status = %record.status, "user created");
        record
    }

    /// Applies the fields present in `patch`. `None` if `id` is unknown.
    pub fn update(&self, id: u64, patch: UserPatch) -> Option<User> {
        let mut inner = self.lock();
        let record = inner.records.get_mut(&id)?;
        record.apply(patch);

        debug!(id, "user updated");
        Some(record.clone())
    }

    /// Removes the record. The id stays retired either way.
    pub fn delete(&self, id: u64) -> bool {
        let removed = self.lock().records.remove(&id).is_some();
        if removed {
            debug!(id, "user deleted");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UserStore {
    fn default() -> Self { Self::new() }
}
