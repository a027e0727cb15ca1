//! # users-api
//!
//! A minimal HTTP service for managing user records held in memory.
//!
//! The crate has two layers:
//!
//! - A small HTTP core: radix-tree routing via [`matchit`], hyper for the
//!   wire, graceful shutdown on SIGTERM / Ctrl-C.
//! - The user API on top of it: a [`UserStore`] owning the records and the
//!   handlers in [`api`] that validate input and map store outcomes to
//!   status codes.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use users_api::{Server, UserStore, api};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), users_api::Error> {
//!     let store = Arc::new(UserStore::new());
//!     Server::bind("127.0.0.1:8000".parse().unwrap())
//!         .serve(api::routes(store))
//!         .await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod store;
pub mod user;

pub use error::Error;
pub use handler::{Handler, with_state};
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{Server, serve_with_shutdown};
pub use status::Status;
pub use store::UserStore;
pub use user::{NewUser, User, UserPatch, UserStatus, ValidationErrors};
