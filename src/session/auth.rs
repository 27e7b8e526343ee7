use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::common::{Credentials, TokenResponse, UserProfile};
use crate::error::{SyncError, SyncResult};
use crate::network::gateway::{Auth, Gateway};
use crate::network::transport::{Method, RequestBody};

pub const USERS_PATH: &str = "/users";
pub const TOKEN_PATH: &str = "/token";
pub const PROFILE_PATH: &str = "/users/me";

pub async fn register(
    gateway: &Gateway,
    credentials: &Credentials,
    cancel: &CancellationToken,
) -> SyncResult<UserProfile> {
    credentials.validate().map_err(SyncError::Validation)?;

    let body = json!({
        "username": credentials.username.trim(),
        "password": credentials.password,
    });
    let profile: UserProfile = gateway
        .request_json(
            Method::Post,
            USERS_PATH,
            RequestBody::Json(body),
            Auth::Anonymous,
            cancel,
        )
        .await?;
    log::info!("Registered user {}", profile.username);
    Ok(profile)
}

/// Exchanges credentials for a bearer token and stores it in the session.
pub async fn login(
    gateway: &Gateway,
    credentials: &Credentials,
    cancel: &CancellationToken,
) -> SyncResult<()> {
    credentials.validate().map_err(SyncError::Validation)?;

    let form = vec![
        ("username".to_string(), credentials.username.trim().to_string()),
        ("password".to_string(), credentials.password.clone()),
    ];
    let token: TokenResponse = gateway
        .request_json(
            Method::Post,
            TOKEN_PATH,
            RequestBody::Form(form),
            Auth::Anonymous,
            cancel,
        )
        .await?;
    if !token.token_type.eq_ignore_ascii_case("bearer") {
        log::warn!("Unexpected token type `{}`; using it as bearer", token.token_type);
    }

    gateway.session().set_token(token.access_token)?;
    log::info!("Logged in as {}", credentials.username.trim());
    Ok(())
}

pub fn logout(gateway: &Gateway) -> SyncResult<()> {
    gateway.session().clear()
}

pub async fn current_user(gateway: &Gateway, cancel: &CancellationToken) -> SyncResult<UserProfile> {
    gateway
        .request_json(
            Method::Get,
            PROFILE_PATH,
            RequestBody::Empty,
            Auth::Bearer,
            cancel,
        )
        .await
}

/// User-facing text for a failed login or registration.
pub fn describe_auth_error(err: &SyncError) -> String {
    match err {
        SyncError::Http { status: 401, .. } => "Incorrect username or password".to_string(),
        SyncError::Http { status: 400, .. } => "Username is already registered".to_string(),
        other => other.to_string(),
    }
}
