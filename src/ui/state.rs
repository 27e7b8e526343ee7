use crate::common::{Credentials, MutationKind};
use crate::conversation::{EditSession, HistoryState};
use crate::error::SyncError;
use crate::routing::Route;
use crate::session::auth::describe_auth_error;

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub pending: bool,
}

impl LoginForm {
    /// Credentials to submit, or `None` (with an inline error) when invalid.
    pub fn submit(&mut self) -> Option<Credentials> {
        let credentials = Credentials::new(self.username.trim(), self.password.clone());
        match credentials.validate() {
            Ok(()) => {
                self.error = None;
                self.notice = None;
                self.pending = true;
                Some(credentials)
            }
            Err(reason) => {
                self.error = Some(reason);
                None
            }
        }
    }

    pub fn failed(&mut self, err: &SyncError) {
        self.pending = false;
        self.error = Some(describe_auth_error(err));
    }

    pub fn clear(&mut self) {
        *self = LoginForm {
            username: std::mem::take(&mut self.username),
            ..LoginForm::default()
        };
    }
}

/// UI-local state. The history is a read-only copy of what the sync worker
/// last reported.
pub struct AppState {
    pub history: HistoryState,
    pub input_text: String,
    pub edit: EditSession,
    pub form: LoginForm,
    pub banner: Option<String>,
    pub username: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            history: HistoryState::Idle,
            input_text: String::new(),
            edit: EditSession::Idle,
            form: LoginForm::default(),
            banner: None,
            username: None,
        }
    }

    pub fn mutation_failed(&mut self, action: MutationKind, error: &SyncError) {
        self.banner = Some(format!("Could not {}: {error}", action.describe()));
    }

    pub fn registered(&mut self, username: String) {
        self.form.clear();
        self.form.username = username;
        self.form.notice = Some("Account created, please log in.".to_string());
    }

    /// Forget everything tied to the previous session.
    pub fn end_session(&mut self, reason: Option<&str>) {
        self.history = HistoryState::Idle;
        self.input_text.clear();
        self.edit.cancel();
        self.banner = None;
        self.username = None;
        self.form.clear();
        self.form.error = reason.map(str::to_string);
    }

    pub fn title(route: Route) -> &'static str {
        match route {
            Route::Login => "Log in",
            Route::Register => "Create account",
            Route::Conversation => "Chat",
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
