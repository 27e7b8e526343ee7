use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Conversation,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Conversation => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    DenyRedirect(&'static str),
}

/// Gates the conversation view on a present token. The token is not checked
/// with the server; a stale one is caught by the first 401.
pub struct RouteGuard;

impl RouteGuard {
    pub fn resolve(session: &SessionStore) -> Access {
        if session.is_authenticated() {
            Access::Allow
        } else {
            Access::DenyRedirect(Route::Login.path())
        }
    }
}

/// Current screen of the app. Every entry into the conversation view goes
/// through [`RouteGuard`].
#[derive(Debug)]
pub struct Navigator {
    current: Route,
}

impl Navigator {
    pub fn start(session: &SessionStore) -> Self {
        let mut navigator = Self {
            current: Route::Login,
        };
        navigator.navigate(Route::Conversation, session);
        navigator
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Returns the route actually reached.
    pub fn navigate(&mut self, target: Route, session: &SessionStore) -> Route {
        self.current = match target {
            Route::Conversation => match RouteGuard::resolve(session) {
                Access::Allow => Route::Conversation,
                Access::DenyRedirect(path) => {
                    log::debug!("Conversation view denied; redirecting to {path}");
                    Route::Login
                }
            },
            other => other,
        };
        self.current
    }

    /// Forced navigation after the session was rejected.
    pub fn force_login(&mut self) {
        self.current = Route::Login;
    }

    /// Leaves the conversation view once the token is gone, whether or not
    /// the rejection was reported. Returns true when it had to.
    pub fn recheck(&mut self, session: &SessionStore) -> bool {
        if self.current == Route::Conversation && !session.is_authenticated() {
            log::debug!("Session lost while in the conversation view");
            self.force_login();
            return true;
        }
        false
    }
}
