//! In-memory session state

use serde_json::Value;

/// The authenticated session: bearer token plus cached user object.
///
/// Invariant: a cached user is only held while a token is present. A token
/// may exist transiently without a cached user (e.g. right after renewal
/// before the user payload arrives), but never the other way around.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<Value>,
}

impl Session {
    /// Current token, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Cached user object, if any
    pub fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }

    /// Replace the token. Removing the token also drops the cached user so
    /// the user-implies-token invariant holds.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
        if self.token.is_none() {
            self.user = None;
        }
    }

    /// Replace the cached user; ignored while no token is held.
    pub fn set_user(&mut self, user: Option<Value>) {
        self.user = if self.token.is_some() { user } else { None };
    }

    /// Install a freshly issued token and user together (login/register/renew)
    pub fn install(&mut self, token: String, user: Value) {
        self.token = Some(token);
        self.user = Some(user);
    }

    /// Drop both token and user (logout or detected expiry)
    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removing_token_drops_user() {
        let mut session = Session::default();
        session.install("tok".into(), json!({"id": 1}));
        assert!(session.is_authenticated());

        session.set_token(None);
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn user_requires_token() {
        let mut session = Session::default();
        session.set_user(Some(json!({"id": 1})));
        assert!(session.user().is_none());

        session.set_token(Some("tok".into()));
        session.set_user(Some(json!({"id": 1})));
        assert!(session.is_authenticated());
    }

    #[test]
    fn token_without_user_is_not_authenticated() {
        let mut session = Session::default();
        session.set_token(Some("tok".into()));
        assert!(!session.is_authenticated());
    }
}
