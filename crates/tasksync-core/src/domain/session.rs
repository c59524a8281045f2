//! Session - セッションプロバイダが渡す認証済みの主体

use std::fmt;

use super::ids::UserId;

/// 認証済みユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
}

/// 確立済みセッション（ユーザー + データ API 用の bearer トークン）
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
}

impl Session {
    pub fn new(user: User, access_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: access_token.into(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

// access_token はログに出さない
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// AuthGate が購読するセッション状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Cleared,
    Established(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Established(session) => Some(session),
            SessionState::Cleared => None,
        }
    }

    pub fn is_established(&self) -> bool {
        matches!(self, SessionState::Established(_))
    }
}
