//! The client's navigable views and who may open them.

use boxoffice_core::{EventId, ShowId};
use std::fmt;

use crate::role::Role;
use crate::session::SessionUser;

/// Who may open a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users holding the role.
    Role(Role),
}

/// A view of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/login`: the unauthenticated entry point.
    Login,
    /// `/register`
    Register,
    /// `/`: the event listing.
    Home,
    /// `/events/{id}/shows`
    EventShows(EventId),
    /// `/book/{showId}`
    Booking(ShowId),
    /// `/bookings`: the signed-in user's bookings.
    MyBookings,
    /// `/admin`: event and show management.
    Admin,
    /// Anything else; carries the normalized path.
    NotFound(String),
}

impl Route {
    /// Resolves a path. Query strings, fragments and a trailing slash are
    /// ignored; unknown paths and unparseable ids resolve to `NotFound`.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["bookings"] => Self::MyBookings,
            ["admin"] => Self::Admin,
            ["events", id, "shows"] => id
                .parse()
                .map_or_else(|_| Self::not_found(&segments), Self::EventShows),
            ["book", id] => id
                .parse()
                .map_or_else(|_| Self::not_found(&segments), Self::Booking),
            _ => Self::not_found(&segments),
        }
    }

    fn not_found(segments: &[&str]) -> Self {
        Self::NotFound(format!("/{}", segments.join("/")))
    }

    /// Returns the canonical path of the view.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Home => "/".to_string(),
            Self::EventShows(id) => format!("/events/{id}/shows"),
            Self::Booking(id) => format!("/book/{id}"),
            Self::MyBookings => "/bookings".to_string(),
            Self::Admin => "/admin".to_string(),
            Self::NotFound(path) => path.clone(),
        }
    }

    /// Returns who may open the view.
    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Self::Login | Self::Register | Self::NotFound(_) => Access::Public,
            Self::Home | Self::EventShows(_) | Self::Booking(_) | Self::MyBookings => {
                Access::Authenticated
            }
            Self::Admin => Access::Role(Role::Admin),
        }
    }

    /// Returns where a user lands after signing in.
    #[must_use]
    pub fn landing_for(user: &SessionUser) -> Self {
        if user.is_admin() {
            Self::Admin
        } else {
            Self::Home
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// An entry in the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub route: Route,
}

/// Returns the navigation entries for a signed-in user.
///
/// Administrators get the dashboard in place of their bookings.
#[must_use]
pub fn navigation(user: &SessionUser) -> Vec<NavItem> {
    let second = if user.is_admin() {
        NavItem {
            label: "Admin Dashboard",
            route: Route::Admin,
        }
    } else {
        NavItem {
            label: "My Bookings",
            route: Route::MyBookings,
        }
    };
    vec![
        NavItem {
            label: "Events",
            route: Route::Home,
        },
        second,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleSet;

    #[test]
    fn parses_known_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/register/"), Route::Register);
        assert_eq!(Route::parse("/bookings?page=2"), Route::MyBookings);
        assert_eq!(Route::parse("/admin#shows"), Route::Admin);
        assert_eq!(
            Route::parse("/events/12/shows"),
            Route::EventShows(EventId::new(12))
        );
        assert_eq!(Route::parse("/book/7"), Route::Booking(ShowId::new(7)));
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(
            Route::parse("/nowhere"),
            Route::NotFound("/nowhere".to_string())
        );
        assert_eq!(
            Route::parse("/book/abc"),
            Route::NotFound("/book/abc".to_string())
        );
        assert_eq!(
            Route::parse("/events/1"),
            Route::NotFound("/events/1".to_string())
        );
    }

    #[test]
    fn path_is_inverse_of_parse() {
        for route in [
            Route::Login,
            Route::Register,
            Route::Home,
            Route::EventShows(EventId::new(3)),
            Route::Booking(ShowId::new(9)),
            Route::MyBookings,
            Route::Admin,
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn access_table() {
        assert_eq!(Route::Login.access(), Access::Public);
        assert_eq!(Route::NotFound("/x".to_string()).access(), Access::Public);
        assert_eq!(Route::Home.access(), Access::Authenticated);
        assert_eq!(Route::Booking(ShowId::new(1)).access(), Access::Authenticated);
        assert_eq!(Route::Admin.access(), Access::Role(Role::Admin));
    }

    #[test]
    fn admins_land_on_dashboard() {
        let admin = SessionUser::new("root@b.com".to_string(), RoleSet::admin());
        let user = SessionUser::new("a@b.com".to_string(), RoleSet::user());
        assert_eq!(Route::landing_for(&admin), Route::Admin);
        assert_eq!(Route::landing_for(&user), Route::Home);
    }

    #[test]
    fn navigation_depends_on_role() {
        let admin = SessionUser::new("root@b.com".to_string(), RoleSet::admin());
        let labels: Vec<&str> = navigation(&admin).iter().map(|item| item.label).collect();
        assert_eq!(labels, ["Events", "Admin Dashboard"]);

        let user = SessionUser::new("a@b.com".to_string(), RoleSet::none());
        let items = navigation(&user);
        assert_eq!(items[1].route, Route::MyBookings);
    }
}
