//! Registration of route definitions alongside plain steps.
//!
//! [`TypedRouter`] replaces the five method registrations of [`Router`]
//! (`get`, `post`, `put`, `patch`, `delete`) with versions that accept any
//! left-to-right mix of [`RouteDefinition`]s and [`Step`]s. Definitions are
//! expanded into their steps in place; steps pass through untouched:
//!
//! ```text
//! .post(path, (def_a, mw_b, def_c, handler_d))
//!        ↓
//! [steps(def_a)…, mw_b, steps(def_c)…, handler_d]
//! ```
//!
//! Everything else defers to the wrapped [`Router`].

use std::ops::Deref;

use http::Method;

use crate::handler::{Handler, Step};
use crate::route::RouteDefinition;
use crate::router::Router;

/// One registration argument.
#[derive(Clone, Debug)]
pub enum RouteArg {
    /// Expands into the definition's steps, in order.
    Definition(RouteDefinition),
    /// Registered as-is.
    Step(Step),
    /// Registered as-is, in order. This is what a
    /// [`TypedRoute`](crate::TypedRoute) produces.
    Steps(Vec<Step>),
}

impl From<RouteDefinition> for RouteArg {
    fn from(def: RouteDefinition) -> Self { Self::Definition(def) }
}

impl From<Step> for RouteArg {
    fn from(step: Step) -> Self { Self::Step(step) }
}

impl From<Vec<Step>> for RouteArg {
    fn from(steps: Vec<Step>) -> Self { Self::Steps(steps) }
}

/// Anything that can stand in a registration call's argument position.
///
/// Implemented for a single [`RouteDefinition`] or [`Step`], for the
/// `Vec<Step>` a [`TypedRoute`](crate::TypedRoute) produces, for
/// `Vec<RouteArg>`, and for tuples of up to eight values convertible into
/// [`RouteArg`]. A builder's `Vec<Step>` can therefore sit inside a tuple
/// next to definitions and steps.
pub trait IntoRouteArgs {
    fn into_route_args(self) -> Vec<RouteArg>;
}

impl IntoRouteArgs for RouteArg {
    fn into_route_args(self) -> Vec<RouteArg> { vec![self] }
}

impl IntoRouteArgs for RouteDefinition {
    fn into_route_args(self) -> Vec<RouteArg> { vec![RouteArg::Definition(self)] }
}

impl IntoRouteArgs for Step {
    fn into_route_args(self) -> Vec<RouteArg> { vec![RouteArg::Step(self)] }
}

impl IntoRouteArgs for Vec<Step> {
    fn into_route_args(self) -> Vec<RouteArg> {
        self.into_iter().map(RouteArg::Step).collect()
    }
}

impl IntoRouteArgs for Vec<RouteArg> {
    fn into_route_args(self) -> Vec<RouteArg> { self }
}

macro_rules! impl_into_route_args_for_tuple {
    ($($ty:ident),+) => {
        impl<$($ty),+> IntoRouteArgs for ($($ty,)+)
        where
            $($ty: Into<RouteArg>,)+
        {
            #[allow(non_snake_case)]
            fn into_route_args(self) -> Vec<RouteArg> {
                let ($($ty,)+) = self;
                vec![$($ty.into()),+]
            }
        }
    };
}

impl_into_route_args_for_tuple!(A);
impl_into_route_args_for_tuple!(A, B);
impl_into_route_args_for_tuple!(A, B, C);
impl_into_route_args_for_tuple!(A, B, C, D);
impl_into_route_args_for_tuple!(A, B, C, D, E);
impl_into_route_args_for_tuple!(A, B, C, D, E, F);
impl_into_route_args_for_tuple!(A, B, C, D, E, F, G);
impl_into_route_args_for_tuple!(A, B, C, D, E, F, G, H);

/// Expands definitions into their steps, preserving argument order.
pub fn flatten(args: impl IntoRouteArgs) -> Vec<Step> {
    args.into_route_args()
        .into_iter()
        .fold(Vec::new(), |mut steps, arg| {
            match arg {
                RouteArg::Definition(def) => steps.extend(def.into_steps()),
                RouteArg::Step(step) => steps.push(step),
                RouteArg::Steps(more) => steps.extend(more),
            }
            steps
        })
}

// ── TypedRouter ───────────────────────────────────────────────────────────────

/// A [`Router`] whose method registrations understand route definitions.
///
/// ```rust
/// use tsu_typed::{define_route, handler, RouteSchemas, TypedRouter, Typed, Request};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize, Serialize)]
/// struct NewUser { email: String }
///
/// async fn create_user(req: Request) -> String {
///     let user: NewUser = req.body_as().unwrap();
///     user.email
/// }
///
/// let app = TypedRouter::new().post(
///     "/users",
///     (define_route(RouteSchemas::new().body(Typed::<NewUser>::new())), handler(create_user)),
/// );
/// ```
pub struct TypedRouter {
    inner: Router,
}

/// Starts an empty [`TypedRouter`].
pub fn create_typed_router() -> TypedRouter {
    TypedRouter::new()
}

impl TypedRouter {
    pub fn new() -> Self {
        Self { inner: Router::new() }
    }

    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with a registered path.
    pub fn get(self, path: &str, args: impl IntoRouteArgs) -> Self {
        self.register(Method::GET, path, args)
    }

    pub fn post(self, path: &str, args: impl IntoRouteArgs) -> Self {
        self.register(Method::POST, path, args)
    }

    pub fn put(self, path: &str, args: impl IntoRouteArgs) -> Self {
        self.register(Method::PUT, path, args)
    }

    pub fn patch(self, path: &str, args: impl IntoRouteArgs) -> Self {
        self.register(Method::PATCH, path, args)
    }

    pub fn delete(self, path: &str, args: impl IntoRouteArgs) -> Self {
        self.register(Method::DELETE, path, args)
    }

    fn register(self, method: Method, path: &str, args: impl IntoRouteArgs) -> Self {
        let steps = flatten(args);
        Self { inner: self.inner.route(method, path, steps) }
    }

    // ── Pass-through ──────────────────────────────────────────────────────────

    /// [`Router::on`], for methods other than the five above.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        Self { inner: self.inner.on(method, path, handler) }
    }

    /// [`Router::route`].
    pub fn route(self, method: Method, path: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        Self { inner: self.inner.route(method, path, steps) }
    }

    /// [`Router::middleware`].
    pub fn middleware(self, step: Step) -> Self {
        Self { inner: self.inner.middleware(step) }
    }

    pub fn into_inner(self) -> Router {
        self.inner
    }
}

impl Default for TypedRouter {
    fn default() -> Self { Self::new() }
}

impl From<Router> for TypedRouter {
    fn from(inner: Router) -> Self { Self { inner } }
}

impl From<TypedRouter> for Router {
    fn from(typed: TypedRouter) -> Self { typed.inner }
}

/// Read access, [`Router::handle`] in particular, goes straight through.
impl Deref for TypedRouter {
    type Target = Router;

    fn deref(&self) -> &Router { &self.inner }
}
