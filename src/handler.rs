//! Processing steps: handlers, middleware, and the chain that runs them.
//!
//! # How async steps are stored
//!
//! A route is an ordered list of steps of *different* concrete types:
//! a validation step, some user middleware, a handler. Rust collections hold
//! one concrete type, so every step is erased behind `dyn ErasedStep` and
//! stored uniformly as a [`Step`].
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ handler(hello)
//! hello.into_step()                                ← Handler blanket impl
//!        ↓
//! Step(Arc::new(FnHandler(hello)))                 ← heap-allocated wrapper
//!        ↓  stored in the route's Arc<[Step]>
//! step.call(req, next) at request time             ← one vtable dispatch
//! ```
//!
//! Middleware has the same shape with one extra argument, [`Next`], which
//! runs the rest of the chain. A middleware that returns without calling
//! [`Next::run`] short-circuits: nothing after it executes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it bounds the
/// public [`Step`] type. External crates cannot usefully interact with it.
#[doc(hidden)]
pub trait ErasedStep {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

/// What a [`Step`] was built from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepKind {
    /// A terminal handler; it never calls [`Next`].
    Handler,
    /// User middleware that may call [`Next`].
    Middleware,
    /// A schema validation step built by [`validate`](crate::validation::validate).
    Validation,
}

/// A type-erased processing step shared across concurrent requests.
///
/// Cloning is one atomic increment. Build one with [`handler`],
/// [`middleware`], or [`validate`](crate::validation::validate).
#[derive(Clone)]
pub struct Step {
    inner: Arc<dyn ErasedStep + Send + Sync + 'static>,
    kind: StepKind,
}

impl Step {
    pub(crate) fn new(kind: StepKind, inner: impl ErasedStep + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(inner), kind }
    }

    pub fn kind(&self) -> StepKind { self.kind }

    pub(crate) fn call(&self, req: Request, next: Next) -> BoxFuture {
        self.inner.call(req, next)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Step").field(&self.kind).finish()
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The rest of a route's chain, handed to each middleware.
///
/// Consumed by [`run`](Next::run), so it runs at most once. Running past the
/// last step (a chain whose final middleware calls `next`) answers
/// `404 Not Found`.
pub struct Next {
    chain: Arc<[Step]>,
    index: usize,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Step]>) -> Self {
        Self { chain, index: 0 }
    }

    /// Runs the next step with `req`.
    pub async fn run(self, req: Request) -> Response {
        let Some(step) = self.chain.get(self.index).cloned() else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        let next = Next { chain: self.chain, index: self.index + 1 };
        step.call(req, next).await
    }

    /// Steps left after this point, including the one `run` would execute.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

// ── Public Handler / Middleware traits ────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::SealedHandler + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_step(self) -> Step;
}

/// Implemented for every valid middleware function:
///
/// ```text
/// async fn name(req: Request, next: Next) -> impl IntoResponse
/// ```
///
/// Sealed, like [`Handler`].
pub trait Middleware: private::SealedMiddleware + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_step(self) -> Step;
}

mod private {
    pub trait SealedHandler {}
    pub trait SealedMiddleware {}
}

/// Wraps a handler function as a [`Step`] for registration.
pub fn handler(h: impl Handler) -> Step {
    h.into_step()
}

/// Wraps a middleware function as a [`Step`] for registration.
///
/// ```rust
/// use tsu_typed::{middleware, Next, Request, Response};
/// use http::StatusCode;
///
/// async fn require_token(req: Request, next: Next) -> Response {
///     match req.header("authorization") {
///         Some(_) => next.run(req).await,
///         None => Response::status(StatusCode::UNAUTHORIZED),
///     }
/// }
///
/// let step = middleware(require_token);
/// ```
pub fn middleware(m: impl Middleware) -> Step {
    m.into_step()
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::SealedHandler for F
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
    fn into_step(self) -> Step {
        Step::new(StepKind::Handler, FnHandler(self))
    }
}

impl<F, Fut, R> private::SealedMiddleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_step(self) -> Step {
        Step::new(StepKind::Middleware, FnMiddleware(self))
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

/// Holds a handler `F` and implements [`ErasedStep`], dropping `next`.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedStep for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, _next: Next) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut, R> ErasedStep for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok(_req: Request) -> &'static str { "ok" }

    async fn pass(req: Request, next: Next) -> Response { next.run(req).await }

    async fn stop(_req: Request, _next: Next) -> StatusCode { StatusCode::FORBIDDEN }

    fn run(steps: Vec<Step>) -> Response {
        let req = Request::builder().build().unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(Next::new(steps.into()).run(req))
    }

    #[test]
    fn middleware_hands_off_to_handler() {
        let res = run(vec![middleware(pass), handler(ok)]);
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"ok");
    }

    #[test]
    fn middleware_can_short_circuit() {
        let res = run(vec![middleware(stop), handler(ok)]);
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn running_off_the_end_is_not_found() {
        let res = run(vec![middleware(pass)]);
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn steps_remember_their_kind() {
        assert_eq!(handler(ok).kind(), StepKind::Handler);
        assert_eq!(middleware(pass).kind(), StepKind::Middleware);
    }
}
