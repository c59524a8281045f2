//! InMemorySessionProvider - 開発用・テスト用のセッション
//!
//! 実際の認証（パスワード検証、トークン更新）は行いません。
//! `sign_in` / `sign_out` で状態を切り替え、購読者に遷移を配信します。

use tokio::sync::watch;
use tracing::info;

use crate::domain::{Session, SessionState};
use crate::ports::SessionProvider;

pub struct InMemorySessionProvider {
    state: watch::Sender<SessionState>,
}

impl InMemorySessionProvider {
    /// サインアウト状態で開始
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Cleared);
        Self { state }
    }

    pub fn signed_in(session: Session) -> Self {
        let provider = Self::new();
        provider.sign_in(session);
        provider
    }

    pub fn sign_in(&self, session: Session) {
        info!(user = %session.user.id, "session established");
        // 受信者がいなくても状態は更新する
        self.state.send_replace(SessionState::Established(session));
    }

    pub fn sign_out(&self) {
        info!("session cleared");
        self.state.send_replace(SessionState::Cleared);
    }
}

impl Default for InMemorySessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for InMemorySessionProvider {
    fn current(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserId};

    fn session(id: &str) -> Session {
        Session::new(
            User {
                id: UserId::new(id),
                email: None,
            },
            "token",
        )
    }

    #[test]
    fn sign_in_and_out_update_current() {
        let provider = InMemorySessionProvider::new();
        assert!(provider.current().is_none());

        provider.sign_in(session("alice"));
        assert_eq!(provider.current_user_id(), Some(UserId::new("alice")));

        provider.sign_out();
        assert!(provider.current_user_id().is_none());
    }

    #[test]
    fn blank_identity_is_not_a_user() {
        let provider = InMemorySessionProvider::signed_in(session("  "));
        assert!(provider.current().is_some());
        assert!(provider.current_user_id().is_none());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let provider = InMemorySessionProvider::new();
        let mut rx = provider.subscribe();
        assert!(!rx.borrow_and_update().is_established());

        provider.sign_in(session("alice"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_established());

        provider.sign_out();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::Cleared);
    }
}
