//! SessionProvider port - 認証サービス（外部）
//!
//! 認証そのもの（ログイン・登録・トークン更新）は外部サービスの責務です。
//! ここでは「いまのセッション」と「状態遷移の購読」だけを公開します。

use tokio::sync::watch;

use crate::domain::{Session, SessionState, UserId};

/// SessionProvider は現在のセッションと、その遷移ストリームを提供
///
/// # 設計原則
/// - `current()` は同期呼び出し（TaskSync が書き込み時に owner を引く）
/// - 遷移は `watch` で配信（Auth Gate が購読して画面スタックを切り替える）
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> Option<Session>;

    fn subscribe(&self) -> watch::Receiver<SessionState>;

    fn current_user_id(&self) -> Option<UserId> {
        self.current()
            .map(|session| session.user.id)
            .filter(|id| !id.is_empty())
    }
}
