//! Access checks for views.

use crate::role::Role;
use crate::route::{Access, Route};
use crate::session::Session;

/// What the shell should do with a requested view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the view.
    Render,
    /// The session has not settled; show nothing yet.
    Defer,
    /// Nobody is signed in; go to the given route instead.
    Redirect(Route),
    /// Signed in, but without the role the view needs.
    Forbidden { required: Role },
}

/// Gates views on the current session.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_route: Route,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            login_route: Route::Login,
        }
    }
}

impl RouteGuard {
    /// Creates a guard redirecting to `/login`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the route anonymous users are sent to.
    #[must_use]
    pub fn login_route(&self) -> &Route {
        &self.login_route
    }

    /// Decides whether `route` may be shown for `session`.
    #[must_use]
    pub fn check(&self, session: &Session, route: &Route) -> GuardDecision {
        self.check_access(session, &route.access())
    }

    /// Decides whether a view with the given access rule may be shown.
    #[must_use]
    pub fn check_access(&self, session: &Session, access: &Access) -> GuardDecision {
        if session.is_loading() {
            return GuardDecision::Defer;
        }
        match access {
            Access::Public => GuardDecision::Render,
            _ if !session.is_authenticated() => GuardDecision::Redirect(self.login_route.clone()),
            Access::Authenticated => GuardDecision::Render,
            Access::Role(role) if session.has_role(role) => GuardDecision::Render,
            Access::Role(role) => GuardDecision::Forbidden {
                required: role.clone(),
            },
        }
    }
}
