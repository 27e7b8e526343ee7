//! Single choke point for every outbound call.
//!
//! The gateway attaches the session's bearer token, bounds each call by the
//! configured timeout and the caller's cancellation token, and turns a 401
//! into a cleared session plus one call to the registered unauthorized
//! handler. Callers never need to check for an expired session themselves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::transport::{ApiRequest, ApiResponse, Method, RequestBody, Transport, TransportError};
use crate::error::{SyncError, SyncResult};
use crate::session::SessionStore;

pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Attach the session token; a 401 ends the session.
    Bearer,
    /// Login and registration: no token, and a 401 means bad credentials.
    Anonymous,
}

#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    timeout: Option<Duration>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            transport,
            session,
            timeout: None,
            on_unauthorized: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registers the application-level reaction to an expired session
    /// (typically: navigate to the login screen).
    pub fn on_unauthorized(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Authenticated request.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> SyncResult<ApiResponse> {
        self.send(method, path, body, Auth::Bearer, cancel).await
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        auth: Auth,
        cancel: &CancellationToken,
    ) -> SyncResult<T> {
        let response = self.send(method, path, body, auth, cancel).await?;
        serde_json::from_str(&response.body).map_err(|err| {
            log::warn!("Malformed response from {method} {path}: {err}");
            SyncError::from(err)
        })
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        auth: Auth,
        cancel: &CancellationToken,
    ) -> SyncResult<ApiResponse> {
        let request_id = Uuid::new_v4();
        let bearer = match auth {
            Auth::Bearer => self.session.token(),
            Auth::Anonymous => None,
        };
        let request = ApiRequest {
            method,
            path: path.to_string(),
            body,
            bearer,
        };

        log::debug!("[{request_id}] {method} {path}");
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            result = self.bounded(self.transport.dispatch(request)) => result,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                log::warn!("[{request_id}] {method} {path} failed: {err}");
                return Err(err);
            }
        };

        if response.status == 401 && auth == Auth::Bearer {
            log::warn!("[{request_id}] {method} {path} rejected the session token");
            self.expire_session();
            return Err(SyncError::Unauthorized);
        }
        if !response.is_success() {
            log::warn!(
                "[{request_id}] {method} {path} returned {}: {}",
                response.status,
                response.body
            );
            return Err(SyncError::Http {
                status: response.status,
                body: response.body,
            });
        }

        log::debug!("[{request_id}] {method} {path} -> {}", response.status);
        Ok(response)
    }

    async fn bounded<F>(&self, dispatch: F) -> SyncResult<ApiResponse>
    where
        F: Future<Output = Result<ApiResponse, TransportError>>,
    {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, dispatch)
                .await
                .map_err(|_| SyncError::Timeout(limit.as_secs()))?,
            None => dispatch.await,
        };
        result.map_err(|err| SyncError::Network(err.to_string()))
    }

    fn expire_session(&self) {
        if let Err(err) = self.session.clear() {
            log::warn!("Failed to remove persisted token: {err}");
        }
        if let Some(handler) = &self.on_unauthorized {
            handler();
        }
    }
}
