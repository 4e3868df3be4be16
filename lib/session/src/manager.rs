//! The session state machine.
//!
//! `SessionManager` owns the current [`Session`], the credential store and the
//! expiry timer. Every transition runs inside one short critical section over
//! the control block (generation counter plus timer handle); collaborator
//! calls happen outside it.
//!
//! Each transition bumps the generation and aborts the armed timer before
//! arming a new one. A timer only acts if the generation it was armed for is
//! still current, so a late timer can never tear down a newer session.

use chrono::{DateTime, Utc};
use rootcause::Report;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::auth::{AuthApi, LoginRequest, RegistrationProfile};
use crate::claims::{Claims, decode_unverified};
use crate::error::{CredentialError, SessionError};
use crate::session::{Session, SessionEvent, SessionUser, Token};
use crate::store::CredentialStore;

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 16;

/// Owns the client's session and its lifecycle.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    api: Arc<dyn AuthApi>,
    state: watch::Sender<Session>,
    events: broadcast::Sender<SessionEvent>,
    control: Mutex<Control>,
}

#[derive(Default)]
struct Control {
    generation: u64,
    expiry: Option<ExpiryTimer>,
}

struct ExpiryTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Control {
    /// Cancels the armed timer and starts a new generation.
    fn advance(&mut self) -> u64 {
        if let Some(timer) = self.expiry.take() {
            timer.handle.abort();
        }
        self.generation += 1;
        self.generation
    }
}

/// Marks a collaborator call as outstanding until dropped.
struct PendingCall<'a> {
    state: &'a watch::Sender<Session>,
    finish: fn(&mut Session),
}

impl<'a> PendingCall<'a> {
    fn start(
        state: &'a watch::Sender<Session>,
        begin: fn(&mut Session),
        finish: fn(&mut Session),
    ) -> Self {
        state.send_modify(begin);
        Self { state, finish }
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.state.send_modify(self.finish);
    }
}

impl Inner {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Drops the session and clears the store. Returns the user that was
    /// signed in, if any.
    fn reset(&self, control: &mut Control) -> Option<SessionUser> {
        control.advance();
        if let Err(error) = self.store.clear() {
            warn!(%error, "failed to clear stored credential");
        }
        let mut previous = None;
        self.state.send_modify(|session| previous = session.sign_out());
        previous
    }

    /// Adopts a decoded, unexpired token and arms its expiry timer.
    fn establish(
        self: &Arc<Self>,
        control: &mut Control,
        token: String,
        claims: &Claims,
        now: DateTime<Utc>,
    ) -> SessionUser {
        let generation = control.advance();
        let delay = claims.time_remaining(now);
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(generation);
            }
        });
        control.expiry = Some(ExpiryTimer { generation, handle });
        debug!(generation, delay_secs = delay.as_secs(), "expiry timer armed");

        self.state
            .send_modify(|session| session.sign_in(Token::new(token), claims));
        SessionUser::from_claims(claims)
    }

    fn expire(&self, generation: u64) {
        let mut control = self.lock_control();
        let current = control
            .expiry
            .as_ref()
            .is_some_and(|timer| timer.generation == generation);
        if !current {
            debug!(generation, "ignoring stale expiry timer");
            return;
        }
        // This task is the timer; detach rather than abort it.
        control.expiry = None;
        let previous = self.reset(&mut control);
        drop(control);

        if let Some(user) = previous {
            info!(subject = user.subject(), "session expired");
            self.emit(SessionEvent::Expired {
                subject: user.subject().to_string(),
            });
        }
    }
}

/// Decodes `token` and checks that it is still valid at `now`.
fn usable_claims(token: &str, now: DateTime<Utc>) -> Result<Claims, Report<CredentialError>> {
    let claims = decode_unverified(token)?;
    claims.ensure_unexpired(now)?;
    Ok(claims)
}

impl Drop for Inner {
    fn drop(&mut self) {
        let control = self
            .control
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = control.expiry.take() {
            timer.handle.abort();
        }
    }
}

impl SessionManager {
    /// Creates a manager in the `Uninitialized` state.
    ///
    /// Call [`initialize`](Self::initialize) to adopt any persisted token.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, api: Arc<dyn AuthApi>) -> Self {
        let (state, _) = watch::channel(Session::uninitialized());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                api,
                state,
                events,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Reads the persisted token and settles the session.
    ///
    /// An unreadable, undecodable or expired token is discarded and the
    /// session becomes anonymous. A valid token authenticates the session and
    /// arms its expiry timer. Calling this again re-reads the store.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn initialize(&self) {
        let mut control = self.inner.lock_control();
        self.inner.state.send_modify(Session::mark_loading);

        let stored = self.inner.store.read().unwrap_or_else(|error| {
            warn!(%error, "failed to read stored credential");
            None
        });

        let now = Utc::now();
        let dropped = match stored {
            None => {
                debug!("no stored credential");
                self.inner.reset(&mut control)
            }
            Some(raw) => match usable_claims(&raw, now) {
                Err(error) => {
                    info!(%error, "discarding stored credential");
                    self.inner.reset(&mut control)
                }
                Ok(claims) => {
                    let user = self.inner.establish(&mut control, raw, &claims, now);
                    info!(
                        subject = user.subject(),
                        roles = %user.roles(),
                        expires_at = %claims.expires_at(),
                        "session restored"
                    );
                    None
                }
            },
        };
        drop(control);

        if dropped.is_some() {
            self.inner.emit(SessionEvent::LoggedOut);
        }
    }

    /// Signs in with the service and adopts the returned token.
    ///
    /// The session is loading while the call is outstanding. On success the
    /// token is persisted, the expiry timer re-armed and the derived user
    /// returned. On any failure the prior session is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LoginFailed` if the service rejects the
    /// credentials or cannot be reached, the returned token is undecodable or
    /// already expired, or it cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, Report<SessionError>> {
        let request = LoginRequest::new(email, password);
        let pending = PendingCall::start(
            &self.inner.state,
            Session::begin_login,
            Session::finish_login,
        );

        let response = self.inner.api.login(&request).await.map_err(|error| {
            warn!(%error, "login request failed");
            SessionError::LoginFailed
        })?;

        let now = Utc::now();
        let claims = usable_claims(&response.token, now).map_err(|error| {
            warn!(%error, "service issued an unusable credential");
            SessionError::LoginFailed
        })?;

        let user = {
            let mut control = self.inner.lock_control();
            if let Err(error) = self.inner.store.save(&response.token) {
                warn!(%error, "failed to persist credential");
                return Err(SessionError::LoginFailed.into());
            }
            self.inner
                .establish(&mut control, response.token, &claims, now)
        };
        drop(pending);

        info!(subject = user.subject(), roles = %user.roles(), "logged in");
        self.inner.emit(SessionEvent::LoggedIn {
            subject: user.subject().to_string(),
        });
        Ok(user)
    }

    /// Creates an account. The current session is not affected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RegistrationFailed` if the service rejects the
    /// profile or cannot be reached.
    #[instrument(skip(self, profile), fields(email = profile.email()))]
    pub async fn register(
        &self,
        profile: &RegistrationProfile,
    ) -> Result<(), Report<SessionError>> {
        let _pending = PendingCall::start(
            &self.inner.state,
            Session::begin_registration,
            Session::finish_registration,
        );

        self.inner.api.register(profile).await.map_err(|error| {
            warn!(%error, "registration request failed");
            SessionError::RegistrationFailed
        })?;

        info!("account registered");
        Ok(())
    }

    /// Ends the session: cancels the expiry timer, clears the store and
    /// becomes anonymous. Calling it with no session is a no-op.
    pub fn logout(&self) {
        let previous = {
            let mut control = self.inner.lock_control();
            self.inner.reset(&mut control)
        };

        match previous {
            Some(user) => {
                info!(subject = user.subject(), "logged out");
                self.inner.emit(SessionEvent::LoggedOut);
            }
            None => debug!("logout without an active session"),
        }
    }

    /// Cancels the expiry timer without touching the session or the store.
    ///
    /// Dropping the last handle has the same effect.
    pub fn shutdown(&self) {
        let mut control = self.inner.lock_control();
        control.advance();
        debug!("session manager shut down");
    }

    /// Returns a copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver that observes every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Returns a receiver for login, logout and expiry announcements.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Returns the token to send as a bearer credential, if signed in.
    #[must_use]
    pub fn bearer_token(&self) -> Option<Token> {
        self.inner.state.borrow().token().cloned()
    }

    /// Returns true if an expiry timer is armed and has not fired.
    #[must_use]
    pub fn has_armed_expiry(&self) -> bool {
        self.inner
            .lock_control()
            .expiry
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}
