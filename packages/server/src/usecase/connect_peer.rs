//! UseCase: ピア接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectPeerUseCase::execute() メソッド
//! - コネクションの登録（Open への遷移、重複チェック、接続イベントの発行）
//!
//! ### なぜこのテストが必要か
//! - 登録されたコネクションだけがブロードキャストを受け取る
//! - 重複 ID はトランスポートの不具合であり、既存の接続を壊してはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規コネクションの登録
//! - 異常系：重複した ID での登録試行

use std::sync::Arc;

use crate::{
    domain::{Connection, ConnectionId, ConnectionRegistry, RelayEvent},
    infrastructure::EventBus,
};

use super::error::ConnectError;

/// ピア接続のユースケース
pub struct ConnectPeerUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// ライフサイクルイベントの発行先
    events: EventBus,
}

impl ConnectPeerUseCase {
    /// 新しい ConnectPeerUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, events: EventBus) -> Self {
        Self { registry, events }
    }

    /// ピア接続を実行
    ///
    /// # Arguments
    ///
    /// * `connection` - 受け付けたばかりのコネクション（Connecting 状態）
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 登録成功
    /// * `Err(ConnectError)` - 登録失敗（Registry は変更されない）
    pub async fn execute(&self, connection: Connection) -> Result<ConnectionId, ConnectError> {
        let connection_id = connection.id.clone();
        let connected_at = connection.connected_at;

        self.registry.add(connection).await?;

        tracing::info!(
            connection_id = %connection_id,
            connected_at = %connected_at.to_rfc3339(),
            "connection opened"
        );
        self.events.publish(RelayEvent::ConnectionOpened {
            connection_id: connection_id.clone(),
            connected_at,
        });

        Ok(connection_id)
    }
}
