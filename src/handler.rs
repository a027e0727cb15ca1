//! Handler trait, type erasure and state injection.
//!
//! The router stores handlers of many concrete types in one table, so every
//! handler is boxed behind [`ErasedHandler`]:
//!
//! ```text
//! async fn get_user(store, req) -> Result<Json<User>, ApiError>
//!        ↓ with_state(store, get_user)
//! move |req| get_user(Arc::clone(&store), req)    ← plain Fn(Request)
//!        ↓ router.on(Method::Get, "/users/{id}", …)
//! Arc::new(FnHandler(closure))                   ← BoxedHandler
//!        ↓ at request time
//! Box::pin(async { fut.await.into_response() })  ← BoxFuture
//! ```
//!
//! A request costs one `Arc` clone of the handler and one virtual call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of
/// [`Handler::into_boxed_handler`].
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any `Fn(Request) -> impl Future<Output = impl IntoResponse>`.
/// Sealed: only the blanket impl below can provide it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Binds shared state to a two-argument handler, producing a [`Handler`].
///
/// The state is created once at startup and handed to every call; nothing
/// is stored in a global.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use users_api::{with_state, Method, Request, Router, Status};
///
/// struct Counter;
///
/// async fn ping(_counter: Arc<Counter>, _req: Request) -> Status {
///     Status::NoContent
/// }
///
/// let router = Router::new().on(Method::Get, "/ping", with_state(Arc::new(Counter), ping));
/// ```
pub fn with_state<S, F, Fut, R>(state: Arc<S>, f: F) -> impl Handler
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    move |req: Request| f(Arc::clone(&state), req)
}
