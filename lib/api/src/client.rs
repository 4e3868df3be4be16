//! HTTP client for the booking service.

use async_trait::async_trait;
use boxoffice_core::{EventId, Result, ShowId};
use boxoffice_session::{
    AuthApi, AuthApiError, LoginRequest, LoginResponse, RegistrationProfile, Token,
};
use chrono::NaiveDateTime;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::{Booking, BookingRequest, Event, EventDraft, NewShow, Show};

/// Client for the booking service's REST API.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Configuration {
                details: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
        })
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&Token>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::Unreachable {
            details: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "request rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
            }
            .into());
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let value = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse {
                details: e.to_string(),
            })?;
        Ok(value)
    }

    /// Lists events, optionally only those in `city`.
    #[instrument(skip(self, token))]
    pub async fn list_events(
        &self,
        city: Option<&str>,
        token: Option<&Token>,
    ) -> Result<Vec<Event>, ApiError> {
        let mut builder = self.request(Method::GET, "/api/events", token);
        if let Some(city) = city.map(str::trim).filter(|city| !city.is_empty()) {
            builder = builder.query(&[("city", city)]);
        }
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    /// Creates an event. Requires the admin role.
    #[instrument(skip(self, draft, token), fields(title = %draft.title))]
    pub async fn create_event(
        &self,
        draft: &EventDraft,
        token: Option<&Token>,
    ) -> Result<Event, ApiError> {
        draft.validate()?;
        let builder = self.request(Method::POST, "/api/events", token).json(draft);
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    /// Replaces an event's details. Requires the admin role.
    #[instrument(skip(self, draft, token), fields(event_id = %id))]
    pub async fn update_event(
        &self,
        id: EventId,
        draft: &EventDraft,
        token: Option<&Token>,
    ) -> Result<Event, ApiError> {
        draft.validate()?;
        let builder = self
            .request(Method::PUT, &format!("/api/events/{id}"), token)
            .json(draft);
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    /// Deletes an event that has no shows. Requires the admin role.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::EventHasShows` without contacting the delete
    /// endpoint if shows are still scheduled for the event.
    #[instrument(skip(self, token), fields(event_id = %id))]
    pub async fn delete_event(
        &self,
        id: EventId,
        token: Option<&Token>,
    ) -> Result<(), ApiError> {
        let remaining = self.shows_for_event(id, token).await?;
        ensure_event_deletable(&remaining)?;

        let builder = self.request(Method::DELETE, &format!("/api/events/{id}"), token);
        self.send(builder).await?;
        Ok(())
    }

    /// Lists every scheduled show.
    #[instrument(skip(self, token))]
    pub async fn list_shows(&self, token: Option<&Token>) -> Result<Vec<Show>, ApiError> {
        let response = self
            .send(self.request(Method::GET, "/api/shows", token))
            .await?;
        Self::read_json(response).await
    }

    /// Lists the shows of one event.
    pub async fn shows_for_event(
        &self,
        id: EventId,
        token: Option<&Token>,
    ) -> Result<Vec<Show>, ApiError> {
        let shows = self.list_shows(token).await?;
        Ok(shows
            .into_iter()
            .filter(|show| show.event_id() == Some(id))
            .collect())
    }

    /// Finds a show by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with status 404 if no such show exists.
    pub async fn find_show(&self, id: ShowId, token: Option<&Token>) -> Result<Show, ApiError> {
        self.list_shows(token)
            .await?
            .into_iter()
            .find(|show| show.id == id)
            .ok_or_else(|| ApiError::Rejected { status: 404 }.into())
    }

    /// Schedules a show. Requires the admin role.
    #[instrument(skip(self, show, token), fields(event_id = %show.event_id))]
    pub async fn create_show(
        &self,
        show: &NewShow,
        now: NaiveDateTime,
        token: Option<&Token>,
    ) -> Result<Show, ApiError> {
        show.validate(now)?;
        let builder = self.request(Method::POST, "/api/shows", token).json(show);
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    /// Cancels a show. Requires the admin role.
    #[instrument(skip(self, token), fields(show_id = %id))]
    pub async fn delete_show(&self, id: ShowId, token: Option<&Token>) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/api/shows/{id}"), token);
        self.send(builder).await?;
        Ok(())
    }

    /// Reserves seats for the signed-in user.
    #[instrument(skip(self, token), fields(show_id = %request.show_id, seats = request.seat_count))]
    pub async fn book(
        &self,
        request: &BookingRequest,
        token: Option<&Token>,
    ) -> Result<Booking, ApiError> {
        let builder = self
            .request(Method::POST, "/api/bookings", token)
            .json(request);
        let response = self.send(builder).await?;
        Self::read_json(response).await
    }

    /// Lists the signed-in user's bookings.
    #[instrument(skip(self, token))]
    pub async fn my_bookings(&self, token: Option<&Token>) -> Result<Vec<Booking>, ApiError> {
        let response = self
            .send(self.request(Method::GET, "/api/bookings", token))
            .await?;
        Self::read_json(response).await
    }

    async fn post_auth<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, AuthApiError> {
        let response = self
            .request(Method::POST, path, None)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthApiError::Unreachable {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthApiError::Rejected {
                status: status.as_u16(),
            }
            .into());
        }
        Ok(response)
    }
}

/// Refuses to delete an event while shows remain.
///
/// # Errors
///
/// Returns `ApiError::EventHasShows` if `remaining` is not empty.
pub fn ensure_event_deletable(remaining: &[Show]) -> Result<(), ApiError> {
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(ApiError::EventHasShows {
            count: remaining.len(),
        }
        .into())
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    #[instrument(skip(self, request), fields(email = request.email()))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthApiError> {
        let response = self.post_auth("/api/auth/login", request).await?;
        let body = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| AuthApiError::InvalidResponse {
                details: e.to_string(),
            })?;
        debug!("login accepted");
        Ok(body)
    }

    #[instrument(skip(self, profile), fields(email = profile.email()))]
    async fn register(&self, profile: &RegistrationProfile) -> Result<(), AuthApiError> {
        self.post_auth("/api/auth/register", profile).await?;
        debug!("registration accepted");
        Ok(())
    }
}
