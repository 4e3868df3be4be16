//! The top-level shell: navigation, commands and session reactions.
//!
//! The shell is the only consumer of the session manager in this binary. It
//! asks the route guard before every view or command and returns to the login
//! view when the session ends, whether by logout or by expiry.

use boxoffice_api::{ApiClient, ApiError, Booking, BookingRequest, Event, EventDraft, NewShow, Show};
use boxoffice_core::{EventId, ShowId};
use boxoffice_session::{
    GuardDecision, RegistrationProfile, Role, Route, RouteGuard, SessionEvent, SessionManager,
    SessionUser, Token,
};
use rootcause::Report;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// Outcome of opening a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// The view is shown.
    Show(Route),
    /// The session is still settling; nothing is shown.
    Waiting,
    /// The view needs a signed-in user; the shell moved to `to` instead.
    Redirected { from: Route, to: Route },
    /// The signed-in user lacks the role the view needs.
    Denied { route: Route, required: Role },
}

/// Drives views and commands against one session.
pub struct Shell {
    session: SessionManager,
    api: ApiClient,
    guard: RouteGuard,
    events: broadcast::Receiver<SessionEvent>,
    location: Route,
}

impl Shell {
    /// Creates a shell positioned at the home view.
    #[must_use]
    pub fn new(session: SessionManager, api: ApiClient) -> Self {
        let events = session.events();
        Self {
            session,
            api,
            guard: RouteGuard::new(),
            events,
            location: Route::Home,
        }
    }

    /// Returns the session manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Returns the view the shell is on.
    #[must_use]
    pub fn location(&self) -> &Route {
        &self.location
    }

    /// Returns the signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.session.snapshot().user().cloned()
    }

    /// Opens a view, subject to the route guard.
    pub fn navigate(&mut self, route: Route) -> Screen {
        let decision = self.guard.check(&self.session.snapshot(), &route);
        debug!(route = %route, ?decision, "navigation");
        match decision {
            GuardDecision::Render => {
                self.location = route.clone();
                Screen::Show(route)
            }
            GuardDecision::Defer => Screen::Waiting,
            GuardDecision::Redirect(to) => {
                self.location = to.clone();
                Screen::Redirected { from: route, to }
            }
            GuardDecision::Forbidden { required } => Screen::Denied { route, required },
        }
    }

    /// Opens the view at `path`.
    pub fn open(&mut self, path: &str) -> Screen {
        self.navigate(Route::parse(path))
    }

    /// Reacts to a session announcement. Returns the route the shell moved
    /// to, if it moved.
    pub fn handle_event(&mut self, event: &SessionEvent) -> Option<Route> {
        match event {
            SessionEvent::Expired { subject } => {
                info!(subject = %subject, "session expired; returning to login");
            }
            SessionEvent::LoggedOut => debug!("logged out; returning to login"),
            SessionEvent::LoggedIn { .. } => return None,
        }
        self.location = self.guard.login_route().clone();
        Some(self.location.clone())
    }

    /// Handles announcements that arrived since the last call.
    pub fn drain_events(&mut self) -> Vec<Route> {
        let mut moves = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => moves.extend(self.handle_event(&event)),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed session events");
                }
                Err(_) => return moves,
            }
        }
    }

    /// Waits for the next announcement that moves the shell and returns the
    /// new route.
    pub async fn next_move(&mut self) -> Option<Route> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    if let Some(route) = self.handle_event(&event) {
                        return Some(route);
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "missed session events"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Signs in and moves to the user's landing view.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::LoginFailed` for any failure.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Route, ClientError> {
        let user = self.session.login(email, password).await.map_err(|error| {
            debug!(%error, "login failed");
            ClientError::LoginFailed
        })?;
        let landing = Route::landing_for(&user);
        self.drain_events();
        self.location = landing.clone();
        Ok(landing)
    }

    /// Creates an account without signing in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RegistrationFailed` for any failure.
    pub async fn register(&self, profile: &RegistrationProfile) -> Result<(), ClientError> {
        self.session.register(profile).await.map_err(|error| {
            debug!(%error, "registration failed");
            ClientError::RegistrationFailed
        })
    }

    /// Signs out and moves to the login view.
    pub fn logout(&mut self) {
        self.session.logout();
        self.drain_events();
        self.location = self.guard.login_route().clone();
    }

    /// Opens `route` for a command and returns the bearer token to use.
    fn enter(&mut self, route: Route) -> Result<Option<Token>, ClientError> {
        match self.navigate(route) {
            Screen::Show(_) => Ok(self.session.bearer_token()),
            Screen::Waiting | Screen::Redirected { .. } => Err(ClientError::NotAuthenticated),
            Screen::Denied { required, .. } => Err(ClientError::AccessDenied { required }),
        }
    }

    /// Lists events, optionally in one city.
    ///
    /// # Errors
    ///
    /// Returns an error if not signed in or the request fails.
    pub async fn events(&mut self, city: Option<&str>) -> Result<Vec<Event>, ClientError> {
        let token = self.enter(Route::Home)?;
        self.api
            .list_events(city, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    /// Lists the shows of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if not signed in or the request fails.
    pub async fn shows(&mut self, event: EventId) -> Result<Vec<Show>, ClientError> {
        let token = self.enter(Route::EventShows(event))?;
        self.api
            .shows_for_event(event, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    /// Books seats for a show.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidRequest` for zero seats or more seats than
    /// are free, or another error if not signed in or the request fails.
    pub async fn book(&mut self, show: ShowId, seats: u32) -> Result<Booking, ClientError> {
        let token = self.enter(Route::Booking(show))?;
        let request = BookingRequest::new(show, seats).map_err(|error| self.api_error(error))?;
        let target = self
            .api
            .find_show(show, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))?;
        request
            .check_availability(&target)
            .map_err(|error| self.api_error(error))?;

        let booking = self
            .api
            .book(&request, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))?;
        info!(booking_id = %booking.id, show_id = %show, seats, "seats booked");
        self.location = Route::MyBookings;
        Ok(booking)
    }

    /// Lists the signed-in user's bookings.
    ///
    /// # Errors
    ///
    /// Returns an error if not signed in or the request fails.
    pub async fn bookings(&mut self) -> Result<Vec<Booking>, ClientError> {
        let token = self.enter(Route::MyBookings)?;
        self.api
            .my_bookings(token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    /// Creates an event.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccessDenied` unless signed in as an admin.
    pub async fn create_event(&mut self, draft: &EventDraft) -> Result<Event, ClientError> {
        let token = self.enter(Route::Admin)?;
        self.api
            .create_event(draft, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    /// Replaces an event's details.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccessDenied` unless signed in as an admin.
    pub async fn update_event(&mut self, id: EventId, draft: &EventDraft) -> Result<Event, ClientError> {
        let token = self.enter(Route::Admin)?;
        self.api
            .update_event(id, draft, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    /// Deletes an event with no remaining shows.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidRequest` if shows remain.
    pub async fn delete_event(&mut self, id: EventId) -> Result<(), ClientError> {
        let token = self.enter(Route::Admin)?;
        self.api
            .delete_event(id, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    /// Schedules a show starting after `now`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidRequest` if the show starts in the past.
    pub async fn create_show(
        &mut self,
        show: &NewShow,
        now: chrono::NaiveDateTime,
    ) -> Result<Show, ClientError> {
        let token = self.enter(Route::Admin)?;
        self.api
            .create_show(show, now, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    /// Cancels a show.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccessDenied` unless signed in as an admin.
    pub async fn delete_show(&mut self, id: ShowId) -> Result<(), ClientError> {
        let token = self.enter(Route::Admin)?;
        self.api
            .delete_show(id, token.as_ref())
            .await
            .map_err(|error| self.api_error(error))
    }

    fn api_error(&self, error: Report<ApiError>) -> ClientError {
        match error.current_context() {
            ApiError::InvalidRequest { reason } => ClientError::InvalidRequest {
                reason: reason.clone(),
            },
            ApiError::EventHasShows { .. } => ClientError::InvalidRequest {
                reason: error.current_context().to_string(),
            },
            context if context.is_unauthorized() => {
                warn!(%error, "service rejected the session credentials");
                ClientError::SessionRejected
            }
            _ => {
                warn!(%error, "request failed");
                ClientError::RequestFailed {
                    details: error.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_api::ApiConfig;
    use boxoffice_session::claims::testing::token_for;
    use boxoffice_session::{AuthApi, CredentialStore, MemoryCredentialStore};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    // Nothing listens here; tests below never reach the network.
    const OFFLINE: &str = "http://127.0.0.1:9";

    fn shell_with(token: Option<String>) -> (Shell, Arc<MemoryCredentialStore>) {
        let store = Arc::new(match token {
            Some(token) => MemoryCredentialStore::with_token(token),
            None => MemoryCredentialStore::new(),
        });
        let api = ApiClient::new(&ApiConfig::new(OFFLINE)).expect("client");
        let auth: Arc<dyn AuthApi> = Arc::new(api.clone());
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let session = SessionManager::new(credentials, auth);
        let shell = Shell::new(session, api);
        shell.session().initialize();
        (shell, store)
    }

    fn token(roles: &str, seconds: i64) -> String {
        token_for("a@b.com", Utc::now() + Duration::seconds(seconds), Some(roles))
    }

    #[tokio::test]
    async fn anonymous_is_sent_to_login() {
        let (mut shell, _) = shell_with(None);
        assert_eq!(
            shell.open("/bookings"),
            Screen::Redirected {
                from: Route::MyBookings,
                to: Route::Login
            }
        );
        assert_eq!(shell.location(), &Route::Login);
    }

    #[tokio::test]
    async fn user_is_denied_admin_view() {
        let (mut shell, _) = shell_with(Some(token("USER", 3600)));
        assert_eq!(
            shell.open("/admin"),
            Screen::Denied {
                route: Route::Admin,
                required: Role::Admin
            }
        );
        assert_eq!(shell.location(), &Route::Home);
    }

    #[tokio::test]
    async fn admin_sees_dashboard() {
        let (mut shell, _) = shell_with(Some(token("ADMIN,USER", 3600)));
        assert_eq!(shell.open("/admin/"), Screen::Show(Route::Admin));
    }

    #[tokio::test]
    async fn commands_require_a_session() {
        let (mut shell, _) = shell_with(None);
        assert_eq!(shell.bookings().await, Err(ClientError::NotAuthenticated));
        assert_eq!(shell.events(None).await, Err(ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn admin_commands_require_admin_role() {
        let (mut shell, _) = shell_with(Some(token("USER", 3600)));
        let result = shell.delete_show(ShowId::new(1)).await;
        assert_eq!(
            result,
            Err(ClientError::AccessDenied {
                required: Role::Admin
            })
        );
    }

    #[tokio::test]
    async fn updating_an_event_requires_admin_role() {
        let (mut shell, _) = shell_with(Some(token("USER", 3600)));
        let draft = EventDraft {
            title: "Hamlet".to_string(),
            city: "Pune".to_string(),
            language: "English".to_string(),
            genre: "Drama".to_string(),
            duration_minutes: 150,
            rating: "U".to_string(),
        };
        let result = shell.update_event(EventId::new(3), &draft).await;
        assert_eq!(
            result,
            Err(ClientError::AccessDenied {
                required: Role::Admin
            })
        );
    }

    #[tokio::test]
    async fn zero_seat_booking_is_refused_locally() {
        let (mut shell, _) = shell_with(Some(token("USER", 3600)));
        let result = shell.book(ShowId::new(1), 0).await;
        assert!(matches!(result, Err(ClientError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn logout_returns_to_login() {
        let (mut shell, store) = shell_with(Some(token("USER", 3600)));
        shell.logout();
        assert_eq!(shell.location(), &Route::Login);
        assert_eq!(store.peek(), None);
        assert!(shell.user().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_moves_shell_to_login() {
        let (mut shell, store) = shell_with(Some(token("USER", 2)));
        assert_eq!(shell.open("/"), Screen::Show(Route::Home));

        let moved = tokio::time::timeout(std::time::Duration::from_secs(10), shell.next_move())
            .await
            .expect("session should expire");

        assert_eq!(moved, Some(Route::Login));
        assert_eq!(shell.location(), &Route::Login);
        assert_eq!(store.peek(), None);
        assert_eq!(
            shell.open("/"),
            Screen::Redirected {
                from: Route::Home,
                to: Route::Login
            }
        );
    }

    #[tokio::test]
    async fn login_announcement_does_not_move() {
        let (mut shell, _) = shell_with(None);
        let event = SessionEvent::LoggedIn {
            subject: "a@b.com".to_string(),
        };
        assert_eq!(shell.handle_event(&event), None);
    }
}
