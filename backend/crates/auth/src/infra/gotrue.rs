//! GoTrue Gateway
//!
//! [`AuthGateway`] over the hosted identity provider's REST API
//! (`/auth/v1/*`). Holds the current session in memory, refreshes it ahead
//! of expiry, and broadcasts every change to subscribers.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::{ProviderClient, ProviderSettings};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::application::config::AuthConfig;
use crate::domain::entity::{session::Session, user::User};
use crate::domain::gateway::{
    AuthGateway, Credentials, SessionEvent, SessionSubscription, SignUpOutcome,
};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Buffered change events per subscriber
const EVENT_CAPACITY: usize = 16;

// ============================================================================
// Provider payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    /// Seconds from now
    expires_in: Option<i64>,
    /// Unix seconds
    expires_at: Option<i64>,
    refresh_token: Option<String>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: UserId,
    email: Option<String>,
    email_confirmed_at: Option<DateTime<Utc>>,
    /// Older provider versions only send this one
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    provider: Option<String>,
}

/// Sign-up answers with a full session when accounts are auto-confirmed,
/// otherwise with the bare user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(GoTrueUser),
}

impl TokenResponse {
    fn into_parts(self) -> (Session, User) {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .map(|secs| Utc::now() + chrono::Duration::seconds(secs))
            });

        let user = User::from(self.user);
        let session = Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at,
            user_id: user.id,
        };
        (session, user)
    }
}

impl From<GoTrueUser> for User {
    fn from(raw: GoTrueUser) -> Self {
        User {
            id: raw.id,
            email: raw
                .email
                .filter(|e| !e.is_empty())
                .map(Email::from_provider),
            email_confirmed_at: raw.email_confirmed_at.or(raw.confirmed_at),
            created_at: raw.created_at,
            last_sign_in_at: raw.last_sign_in_at,
            provider: raw.app_metadata.provider,
        }
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Session held by the gateway
#[derive(Debug, Clone)]
struct HeldSession {
    session: Session,
    /// When the next refresh is due; `None` for sessions without expiry
    refresh_at: Option<DateTime<Utc>>,
}

impl HeldSession {
    /// Refresh point is `margin` before expiry, at most half the remaining lifetime.
    fn new(session: Session, margin: Duration) -> Self {
        let refresh_at = session.expires_at.map(|expires_at| {
            let lifetime = session.remaining().unwrap_or(Duration::ZERO);
            let margin = chrono::Duration::from_std(margin.min(lifetime / 2))
                .unwrap_or(chrono::Duration::zero());
            expires_at - margin
        });
        Self {
            session,
            refresh_at,
        }
    }

    fn refresh_due(&self) -> bool {
        self.refresh_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Identity provider gateway backed by GoTrue
pub struct GoTrueGateway {
    client: ProviderClient,
    session: RwLock<Option<HeldSession>>,
    events: broadcast::Sender<SessionEvent>,
    refresh_margin: Duration,
    /// Refresh tokens are single-use; only one refresh may be in flight
    refresh_lock: Mutex<()>,
}

impl GoTrueGateway {
    pub fn new(client: ProviderClient, refresh_margin: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            session: RwLock::new(None),
            events,
            refresh_margin,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn from_settings(settings: &ProviderSettings, config: &AuthConfig) -> AuthResult<Self> {
        let client = ProviderClient::new(settings)?;
        Ok(Self::new(client, config.refresh_margin))
    }

    /// Locally held session, without refreshing
    pub fn current_session(&self) -> Option<Session> {
        self.held().map(|held| held.session)
    }

    fn held(&self) -> Option<HeldSession> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Access token of the locally held session
    pub fn access_token(&self) -> Option<String> {
        self.current_session().map(|s| s.access_token)
    }

    /// Refresh ahead of expiry every `tick`, until the gateway is dropped.
    pub fn spawn_auto_refresh(self: &Arc<Self>, tick: Duration) -> JoinHandle<()> {
        let gateway = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(gateway) = gateway.upgrade() else {
                    break;
                };
                if let Err(e) = gateway.refresh_if_needed().await {
                    tracing::warn!(error = %e, "Background session refresh failed");
                }
            }
            tracing::debug!("Auto-refresh stopped");
        })
    }

    fn replace_session(&self, session: Option<Session>) {
        let session = session.map(|session| HeldSession::new(session, self.refresh_margin));
        self.replace_held(session);
    }

    fn replace_held(&self, session: Option<HeldSession>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    /// Subscribers may come and go; no receivers is not an error.
    fn emit(&self, event: SessionEvent) {
        tracing::debug!(kind = ?event.kind, subscribers = self.events.receiver_count(), "Session event");
        let _ = self.events.send(event);
    }

    fn store(&self, session: Session, event: fn(Session) -> SessionEvent) {
        self.replace_session(Some(session.clone()));
        self.emit(event(session));
    }

    fn clear(&self) {
        self.replace_session(None);
        self.emit(SessionEvent::signed_out());
    }

    /// Refresh the held session once its refresh point has passed.
    ///
    /// A rejected refresh token ends the session (`SignedOut`). A transient
    /// failure keeps a still-valid session and is an error otherwise.
    async fn refresh_if_needed(&self) -> AuthResult<Option<Session>> {
        let _guard = self.refresh_lock.lock().await;

        let Some(held) = self.held() else {
            return Ok(None);
        };
        if !held.refresh_due() {
            return Ok(Some(held.session));
        }
        let current = held.session;

        let Some(refresh_token) = current.refresh_token.clone() else {
            if current.is_expired() {
                tracing::info!(user_id = %current.user_id, "Session expired without refresh token");
                self.clear();
                return Ok(None);
            }
            return Ok(Some(current));
        };

        let request = self
            .client
            .request(Method::POST, "/auth/v1/token?grant_type=refresh_token", None)
            .json(&serde_json::json!({ "refresh_token": refresh_token }));

        match self.client.send_json::<TokenResponse>(request).await {
            Ok(response) => {
                let (session, _) = response.into_parts();
                tracing::debug!(user_id = %session.user_id, "Session refreshed");
                self.store(session.clone(), SessionEvent::token_refreshed);
                Ok(Some(session))
            }
            Err(e) if e.status().is_some() && !e.is_transient() => {
                tracing::info!(status = e.status(), error = %e, "Refresh token rejected; signing out");
                self.clear();
                Ok(None)
            }
            Err(e) if e.is_transient() && !current.is_expired() => {
                tracing::warn!(error = %e, "Session refresh failed; keeping current session");
                Ok(Some(current))
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %current.user_id, "Session refresh failed");
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for GoTrueGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueGateway")
            .field("client", &self.client)
            .field("session", &self.current_session())
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

impl AuthGateway for GoTrueGateway {
    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<Session> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token?grant_type=password", None)
            .json(&serde_json::json!({
                "email": credentials.email.as_str(),
                "password": credentials.password(),
            }));

        let (session, _) = self
            .client
            .send_json::<TokenResponse>(request)
            .await?
            .into_parts();

        self.store(session.clone(), SessionEvent::signed_in);
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> AuthResult<SignUpOutcome> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/signup", None)
            .json(&serde_json::json!({
                "email": credentials.email.as_str(),
                "password": credentials.password(),
            }));

        match self.client.send_json::<SignUpResponse>(request).await? {
            SignUpResponse::Session(response) => {
                let (session, user) = response.into_parts();
                self.store(session.clone(), SessionEvent::signed_in);
                Ok(SignUpOutcome {
                    user,
                    session: Some(session),
                })
            }
            SignUpResponse::User(user) => Ok(SignUpOutcome {
                user: user.into(),
                session: None,
            }),
        }
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let Some(token) = self.access_token() else {
            return Ok(());
        };

        let request = self
            .client
            .request(Method::POST, "/auth/v1/logout", Some(&token));
        let result = self.client.send_empty(request).await.map_err(AuthError::from);

        self.clear();
        result
    }

    async fn get_session(&self) -> AuthResult<Option<Session>> {
        self.refresh_if_needed().await
    }

    async fn get_user(&self) -> AuthResult<Option<User>> {
        let Some(session) = self.get_session().await? else {
            return Ok(None);
        };

        let request = self
            .client
            .request(Method::GET, "/auth/v1/user", Some(&session.access_token));
        let user = self.client.send_json::<GoTrueUser>(request).await?;
        Ok(Some(user.into()))
    }

    async fn resend_verification_email(&self, email: &Email) -> AuthResult<()> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/resend", None)
            .json(&serde_json::json!({ "type": "signup", "email": email.as_str() }));

        self.client.send_empty(request).await?;
        Ok(())
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway::SessionEventKind;
    use axum::Json;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    const USER_ID: &str = "5b0c1c7e-3f6a-4a8e-9d52-0f4f0a7c2b11";

    fn user_json() -> Value {
        json!({
            "id": USER_ID,
            "aud": "authenticated",
            "email": "agent@example.com",
            "email_confirmed_at": "2024-05-01T10:05:00Z",
            "created_at": "2024-05-01T10:00:00.123456Z",
            "last_sign_in_at": "2024-06-01T08:00:00Z",
            "app_metadata": { "provider": "email", "providers": ["email"] },
            "user_metadata": {}
        })
    }

    fn token_json(access_token: &str, expires_in: i64) -> Value {
        json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": expires_in,
            "refresh_token": "refresh-1",
            "user": user_json()
        })
    }

    async fn token(Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Response {
        match query.get("grant_type").map(String::as_str) {
            Some("password") if body["password"] == "correct horse" => {
                Json(token_json("access-1", 3600)).into_response()
            }
            Some("refresh_token") if body["refresh_token"] == "refresh-1" => {
                Json(token_json("refreshed", 3600)).into_response()
            }
            Some("refresh_token") if body["refresh_token"] == "short-lived" => {
                Json(token_json("short", 120)).into_response()
            }
            Some("refresh_token") if body["refresh_token"] == "throttled" => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "msg": "Request rate limit reached" })),
            )
                .into_response(),
            Some("refresh_token") => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_grant", "error_description": "Invalid Refresh Token" })),
            )
                .into_response(),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
            )
                .into_response(),
        }
    }

    async fn user(headers: HeaderMap) -> Response {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth == "Bearer access-1" || auth == "Bearer refreshed" {
            Json(user_json()).into_response()
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response()
        }
    }

    async fn resend(Json(body): Json<Value>) -> Response {
        if body["type"] != "signup" {
            return (StatusCode::BAD_REQUEST, Json(json!({ "msg": "bad type" }))).into_response();
        }
        if body["email"] == "limited@example.com" {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "code": 429, "msg": "Email rate limit exceeded" })),
            )
                .into_response();
        }
        Json(json!({})).into_response()
    }

    async fn signup(Json(body): Json<Value>) -> Response {
        if body["email"] == "auto@example.com" {
            Json(token_json("access-1", 3600)).into_response()
        } else {
            Json(user_json()).into_response()
        }
    }

    async fn gateway() -> Arc<GoTrueGateway> {
        gateway_with(&AuthConfig::default()).await
    }

    async fn gateway_with(config: &AuthConfig) -> Arc<GoTrueGateway> {
        let router = axum::Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/resend", post(resend))
            .route("/auth/v1/signup", post(signup))
            .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let settings = ProviderSettings::new(format!("http://{addr}"), "anon-key");
        Arc::new(GoTrueGateway::from_settings(&settings, config).unwrap())
    }

    /// Hold `session` with its refresh point already passed
    fn hold_due(gateway: &GoTrueGateway, session: Session) {
        gateway.replace_held(Some(HeldSession {
            session,
            refresh_at: Some(Utc::now() - chrono::Duration::seconds(1)),
        }));
    }

    fn credentials(password: &str) -> Credentials {
        Credentials::new(Email::new("agent@example.com").unwrap(), password)
    }

    #[test]
    fn test_token_response_parts() {
        let response: TokenResponse = serde_json::from_value(token_json("abc", 3600)).unwrap();
        let (session, user) = response.into_parts();

        assert_eq!(session.access_token, "abc");
        assert_eq!(session.user_id, user.id);
        assert_eq!(user.id.to_string(), USER_ID);
        assert!(user.is_email_verified());
        assert_eq!(user.provider_label(), "email");
        assert!(!session.is_expired());
        assert!(session.remaining().unwrap() > Duration::from_secs(3500));
    }

    #[test]
    fn test_expires_at_preferred_over_expires_in() {
        let mut raw = token_json("abc", 3600);
        raw["expires_at"] = json!(1_700_000_000);
        let response: TokenResponse = serde_json::from_value(raw).unwrap();
        let (session, _) = response.into_parts();
        assert_eq!(session.expires_at.unwrap().timestamp(), 1_700_000_000);
        assert!(session.is_expired());
    }

    #[test]
    fn test_signup_response_shapes() {
        let with_session: SignUpResponse = serde_json::from_value(token_json("abc", 60)).unwrap();
        assert!(matches!(with_session, SignUpResponse::Session(_)));

        let user_only: SignUpResponse = serde_json::from_value(user_json()).unwrap();
        assert!(matches!(user_only, SignUpResponse::User(_)));
    }

    #[tokio::test]
    async fn test_sign_in_stores_session_and_emits() {
        let gateway = gateway().await;
        let mut events = gateway.subscribe();

        let session = gateway.sign_in(&credentials("correct horse")).await.unwrap();
        assert_eq!(session.access_token, "access-1");
        assert_eq!(gateway.access_token().as_deref(), Some("access-1"));

        let event = events.next().await.unwrap();
        assert_eq!(event.kind, SessionEventKind::SignedIn);

        let user = gateway.get_user().await.unwrap().unwrap();
        assert_eq!(user.email.unwrap().as_str(), "agent@example.com");
    }

    #[tokio::test]
    async fn test_sign_in_rejected_keeps_provider_message() {
        let gateway = gateway().await;
        let err = gateway.sign_in(&credentials("wrong")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert!(gateway.current_session().is_none());
        assert!(gateway.get_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_session_refreshes_near_expiry() {
        let gateway = gateway().await;
        let mut session = gateway.sign_in(&credentials("correct horse")).await.unwrap();
        session.expires_at = Some(Utc::now() + chrono::Duration::seconds(5));
        hold_due(&gateway, session);

        let mut events = gateway.subscribe();
        let refreshed = gateway.get_session().await.unwrap().unwrap();
        assert_eq!(refreshed.access_token, "refreshed");
        assert_eq!(events.next().await.unwrap().kind, SessionEventKind::TokenRefreshed);
    }

    #[test]
    fn test_refresh_margin_capped_at_half_lifetime() {
        let response: TokenResponse = serde_json::from_value(token_json("abc", 3600)).unwrap();
        let (mut session, _) = response.into_parts();
        let margin = Duration::from_secs(60);

        let long = HeldSession::new(session.clone(), margin);
        let lead = session.expires_at.unwrap() - long.refresh_at.unwrap();
        assert_eq!(lead, chrono::Duration::seconds(60));

        session.expires_at = Some(Utc::now() + chrono::Duration::seconds(30));
        let short = HeldSession::new(session.clone(), margin);
        assert!(!short.refresh_due());
        let lead = session.expires_at.unwrap() - short.refresh_at.unwrap();
        assert!(lead <= chrono::Duration::seconds(15));

        session.expires_at = None;
        assert!(!HeldSession::new(session, margin).refresh_due());
    }

    #[tokio::test]
    async fn test_short_lived_token_is_not_refreshed_again() {
        let config = AuthConfig {
            refresh_margin: Duration::from_secs(7200),
            ..AuthConfig::default()
        };
        let gateway = gateway_with(&config).await;
        let mut session = gateway.sign_in(&credentials("correct horse")).await.unwrap();
        session.refresh_token = Some("short-lived".into());
        hold_due(&gateway, session);

        let mut events = gateway.subscribe();
        let refreshed = gateway.get_session().await.unwrap().unwrap();
        assert_eq!(refreshed.access_token, "short");
        assert_eq!(events.next().await.unwrap().kind, SessionEventKind::TokenRefreshed);

        // Two-hour margin against a two-minute token: the new token is not due yet.
        for _ in 0..3 {
            let again = gateway.get_session().await.unwrap().unwrap();
            assert_eq!(again.access_token, "short");
        }
        assert!(
            tokio::time::timeout(Duration::from_millis(100), events.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_throttled_refresh_keeps_valid_session() {
        let gateway = gateway().await;
        let mut session = gateway.sign_in(&credentials("correct horse")).await.unwrap();
        session.refresh_token = Some("throttled".into());
        hold_due(&gateway, session);

        let kept = gateway.get_session().await.unwrap().unwrap();
        assert_eq!(kept.access_token, "access-1");
        assert!(gateway.current_session().is_some());
    }

    #[tokio::test]
    async fn test_throttled_refresh_of_expired_session_is_an_error() {
        let gateway = gateway().await;
        let mut session = gateway.sign_in(&credentials("correct horse")).await.unwrap();
        session.refresh_token = Some("throttled".into());
        session.expires_at = Some(Utc::now() - chrono::Duration::seconds(5));
        gateway.replace_session(Some(session));

        let err = gateway.get_session().await.unwrap_err();
        assert!(matches!(err, AuthError::Provider { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_rejected_refresh_signs_out() {
        let gateway = gateway().await;
        let mut session = gateway.sign_in(&credentials("correct horse")).await.unwrap();
        session.expires_at = Some(Utc::now() - chrono::Duration::seconds(5));
        session.refresh_token = Some("revoked".into());
        gateway.replace_session(Some(session));

        let mut events = gateway.subscribe();
        assert!(gateway.get_session().await.unwrap().is_none());
        assert_eq!(events.next().await.unwrap().kind, SessionEventKind::SignedOut);
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let gateway = gateway().await;
        gateway.sign_in(&credentials("correct horse")).await.unwrap();

        let mut events = gateway.subscribe();
        gateway.sign_out().await.unwrap();
        assert!(gateway.current_session().is_none());
        assert_eq!(events.next().await.unwrap().kind, SessionEventKind::SignedOut);
    }

    #[tokio::test]
    async fn test_sign_up_shapes() {
        let gateway = gateway().await;

        let pending = gateway.sign_up(&credentials("pw")).await.unwrap();
        assert!(pending.needs_confirmation());
        assert!(gateway.current_session().is_none());

        let auto = Credentials::new(Email::new("auto@example.com").unwrap(), "pw");
        let confirmed = gateway.sign_up(&auto).await.unwrap();
        assert!(!confirmed.needs_confirmation());
        assert!(gateway.current_session().is_some());
    }

    #[tokio::test]
    async fn test_resend_verification() {
        let gateway = gateway().await;
        gateway
            .resend_verification_email(&Email::new("agent@example.com").unwrap())
            .await
            .unwrap();

        let err = gateway
            .resend_verification_email(&Email::new("limited@example.com").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider { status: 429, .. }));
        assert_eq!(err.to_string(), "Email rate limit exceeded");
    }

    #[tokio::test]
    async fn test_auto_refresh_stops_with_gateway() {
        let gateway = gateway().await;
        let handle = gateway.spawn_auto_refresh(Duration::from_millis(10));
        drop(gateway);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
