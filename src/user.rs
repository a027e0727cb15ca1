//! User record, input shapes and boundary validation.
//!
//! Inbound JSON is checked field by field before anything reaches the
//! [`UserStore`](crate::store::UserStore). Every failing field is reported,
//! not just the first one.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const NAME_MAX_CHARS: usize = 50;
pub const AGE_MAX: u8 = 150;

const FIELDS: [&str; 4] = ["name", "email", "age", "status"];

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("email pattern is valid")
});

/// Lifecycle state of a user account.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active   => "active",
            Self::Inactive => "inactive",
            Self::Pending  => "pending",
        }
    }
}

impl FromStr for UserStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active"   => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "pending"  => Ok(Self::Pending),
            _          => Err(()),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored user. `id` is assigned by the store and never changes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub age: u8,
    pub status: UserStatus,
}

impl User {
    /// Overwrites the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Validated fields for a new user. `status` falls back to
/// [`UserStatus::Active`] when omitted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: u8,
    pub status: Option<UserStatus>,
}

/// A partial update: `None` leaves the stored value as it is.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<u8>,
    pub status: Option<UserStatus>,
}

impl NewUser {
    /// Validates a create/replace body.
    ///
    /// `name`, `email` and `age` are required and keys outside the schema are
    /// rejected.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let obj = as_object(value)?;
        let mut errors = ValidationErrors::default();

        for key in obj.keys().filter(|k| !FIELDS.contains(&k.as_str())) {
            errors.push(key, "extra fields not permitted");
        }

        let name = required(obj, "name", parse_name, &mut errors);
        let email = required(obj, "email", parse_email, &mut errors);
        let age = required(obj, "age", parse_age, &mut errors);
        let status = optional(obj, "status", parse_status, &mut errors);

        match (name, email, age) {
            (Some(name), Some(email), Some(age)) if errors.is_empty() => {
                Ok(Self { name, email, age, status })
            }
            _ => Err(errors),
        }
    }
}

impl UserPatch {
    /// Validates a partial-update body. Every field is optional; keys outside
    /// the schema are ignored.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let obj = as_object(value)?;
        let mut errors = ValidationErrors::default();

        let patch = Self {
            name: optional(obj, "name", parse_name, &mut errors),
            email: optional(obj, "email", parse_email, &mut errors),
            age: optional(obj, "age", parse_age, &mut errors),
            status: optional(obj, "status", parse_status, &mut errors),
        };

        if errors.is_empty() { Ok(patch) } else { Err(errors) }
    }
}

/// Full replacement: every field is set, an omitted status resets to active.
impl From<NewUser> for UserPatch {
    fn from(user: NewUser) -> Self {
        Self {
            name: Some(user.name),
            email: Some(user.email),
            age: Some(user.age),
            status: Some(user.status.unwrap_or_default()),
        }
    }
}

// ── Field checks ──────────────────────────────────────────────────────────────

fn as_object(value: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    value.as_object().ok_or_else(|| ValidationErrors::single("body", "expected a JSON object"))
}

fn required<T>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&Value) -> Result<T, String>,
    errors: &mut ValidationErrors,
) -> Option<T> {
    if !obj.contains_key(field) {
        errors.push(field, "field required");
        return None;
    }
    optional(obj, field, parse, errors)
}

fn optional<T>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&Value) -> Result<T, String>,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let value = obj.get(field)?;
    if value.is_null() {
        errors.push(field, "must not be null");
        return None;
    }
    match parse(value) {
        Ok(v) => Some(v),
        Err(message) => {
            errors.push(field, message);
            None
        }
    }
}

fn parse_name(value: &Value) -> Result<String, String> {
    let name = value.as_str().ok_or("must be a string")?;
    let len = name.chars().count();
    if len == 0 {
        return Err("must contain at least 1 character".into());
    }
    if len > NAME_MAX_CHARS {
        return Err(format!("must contain at most {NAME_MAX_CHARS} characters"));
    }
    Ok(name.to_owned())
}

fn parse_email(value: &Value) -> Result<String, String> {
    let email = value.as_str().ok_or("must be a string")?;
    if !EMAIL_RE.is_match(email) {
        return Err("is not a valid email address".into());
    }
    Ok(email.to_owned())
}

/// Whole numbers are accepted as JSON integers, integral floats (`30.0`) or
/// numeric strings (`"30"`).
fn parse_age(value: &Value) -> Result<u8, String> {
    let not_integer = || String::from("must be an integer");
    let out_of_range = || format!("must be between 0 and {AGE_MAX}");

    let age = match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i,
            (None, Some(_), _) => return Err(out_of_range()),
            (None, None, Some(f)) if f.is_finite() && f.fract() == 0.0 => {
                if !(0.0..=f64::from(AGE_MAX)).contains(&f) {
                    return Err(out_of_range());
                }
                f as i64
            }
            _ => return Err(not_integer()),
        },
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| not_integer())?,
        _ => return Err(not_integer()),
    };

    match u8::try_from(age) {
        Ok(age) if age <= AGE_MAX => Ok(age),
        _ => Err(out_of_range()),
    }
}

fn parse_status(value: &Value) -> Result<UserStatus, String> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "must be one of 'active', 'inactive', 'pending'".into())
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// One rejected input field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field failure found in one request, in discovery order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError { field: field.to_owned(), message: message.into() });
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|e| e.field.as_str()) }
    pub fn errors(&self) -> &[FieldError] { &self.0 }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(errors: &ValidationErrors) -> Vec<&str> {
        errors.fields().collect()
    }

    #[test]
    fn new_user_defaults_status() {
        let user = NewUser::from_json(&json!({ "name": "Ada", "email": "ada@example.com", "age": 36 }))
            .unwrap();
        assert_eq!(user.status, None);
        assert_eq!(UserPatch::from(user).status, Some(UserStatus::Active));
    }

    #[test]
    fn age_bounds() {
        for age in [0, 150] {
            let body = json!({ "name": "Ada", "email": "ada@example.com", "age": age });
            assert_eq!(NewUser::from_json(&body).unwrap().age, age as u8);
        }
        for age in [json!(-1), json!(151), json!(1.5), json!("thirty"), json!(true), json!(u64::MAX)] {
            let body = json!({ "name": "Ada", "email": "ada@example.com", "age": age });
            assert_eq!(fields(&NewUser::from_json(&body).unwrap_err()), ["age"], "{age}");
        }
    }

    #[test]
    fn age_coerces_whole_numbers() {
        for age in [json!(30.0), json!("30"), json!(" 30 ")] {
            let body = json!({ "name": "Ada", "email": "ada@example.com", "age": age });
            assert_eq!(NewUser::from_json(&body).unwrap().age, 30, "{age}");
        }
        for age in [json!(150.5), json!(151.0), json!("-1"), json!("151")] {
            assert_eq!(fields(&UserPatch::from_json(&json!({ "age": age })).unwrap_err()), ["age"], "{age}");
        }
    }

    #[test]
    fn reports_every_failing_field() {
        let body = json!({ "name": "", "email": "nope", "status": "banned", "role": "admin" });
        let errors = NewUser::from_json(&body).unwrap_err();
        assert_eq!(fields(&errors), ["role", "name", "email", "age", "status"]);
        assert_eq!(errors.errors()[3].message, "field required");
    }

    #[test]
    fn name_length_counts_characters() {
        let ok = "é".repeat(NAME_MAX_CHARS);
        let too_long = "a".repeat(NAME_MAX_CHARS + 1);
        assert!(UserPatch::from_json(&json!({ "name": ok })).is_ok());
        assert_eq!(fields(&UserPatch::from_json(&json!({ "name": too_long })).unwrap_err()), ["name"]);
    }

    #[test]
    fn email_syntax() {
        for ok in ["a@b.co", "first.last+tag@sub.example.org"] {
            assert!(parse_email(&json!(ok)).is_ok(), "{ok}");
        }
        for bad in ["plain", "a@b", "@b.com", "a@@b.com", "a b@c.com", "a..b@c.com", ".a@b.com"] {
            assert!(parse_email(&json!(bad)).is_err(), "{bad}");
        }
    }

    #[test]
    fn patch_ignores_unknown_keys_but_rejects_null() {
        let patch = UserPatch::from_json(&json!({ "age": 40, "nickname": "x" })).unwrap();
        assert_eq!(patch, UserPatch { age: Some(40), ..Default::default() });

        let errors = UserPatch::from_json(&json!({ "email": null })).unwrap_err();
        assert_eq!(fields(&errors), ["email"]);
    }

    #[test]
    fn body_must_be_an_object() {
        assert_eq!(fields(&UserPatch::from_json(&json!([1, 2])).unwrap_err()), ["body"]);
        assert_eq!(fields(&NewUser::from_json(&json!("x")).unwrap_err()), ["body"]);
    }

    #[test]
    fn apply_keeps_unset_fields() {
        let mut user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            age: 36,
            status: UserStatus::Pending,
        };
        user.apply(UserPatch { age: Some(37), ..Default::default() });
        assert_eq!(user.age, 37);
        assert_eq!(user.name, "Ada");
        assert_eq!(user.status, UserStatus::Pending);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(UserStatus::Inactive).unwrap(), json!("inactive"));
    }
}
