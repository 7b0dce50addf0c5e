//! UseCase: ピア切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectPeerUseCase::execute() メソッド
//! - DisconnectPeerUseCase::drain() メソッド（シャットダウン時の一括切断）
//!
//! ### なぜこのテストが必要か
//! - トランスポートの close は複数回観測されうるため、削除は冪等でなければならない
//! - 切断イベントはクローズ一回につきちょうど一回だけ発行される
//!
//! ### どのような状況を想定しているか
//! - 正常系：コネクションの切断と通知
//! - エッジケース：同じコネクションの二重切断、存在しないコネクションの切断
//! - シャットダウン：全コネクションの一括切断

use std::sync::Arc;

use crate::{
    domain::{CloseReason, ConnectionId, ConnectionRegistry, RelayEvent},
    infrastructure::EventBus,
};

/// ピア切断のユースケース
pub struct DisconnectPeerUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// ライフサイクルイベントの発行先
    events: EventBus,
}

impl DisconnectPeerUseCase {
    /// 新しい DisconnectPeerUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, events: EventBus) -> Self {
        Self { registry, events }
    }

    /// ピア切断を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断されたコネクションの ID
    ///
    /// # Returns
    ///
    /// この呼び出しで Registry から削除した場合は `true`。
    /// 既に削除済みの場合は何もせず `false` を返す。
    pub async fn execute(&self, connection_id: &ConnectionId) -> bool {
        let Some(connection) = self.registry.remove(connection_id).await else {
            tracing::debug!(connection_id = %connection_id, "connection already removed");
            return false;
        };

        tracing::info!(
            connection_id = %connection_id,
            state = %connection.state(),
            "connection closed and removed from registry"
        );
        self.events.publish(RelayEvent::ConnectionClosed {
            connection_id: connection_id.clone(),
            reason: CloseReason::PeerClosed,
        });
        true
    }

    /// 全コネクションを Closing にして Registry から外す
    ///
    /// outbound sender が破棄されることで各コネクションの writer が Close フレームを送る。
    ///
    /// # Returns
    ///
    /// 切断したコネクション数
    pub async fn drain(&self) -> usize {
        let drained = self.registry.drain().await;
        for connection in &drained {
            tracing::debug!(
                connection_id = %connection.id,
                state = %connection.state(),
                "closing connection for shutdown"
            );
            self.events.publish(RelayEvent::ConnectionClosed {
                connection_id: connection.id.clone(),
                reason: CloseReason::Shutdown,
            });
        }
        tracing::info!(count = drained.len(), "registry drained");
        drained.len()
    }

    /// 残りのコネクション数を取得
    pub async fn count_remaining_connections(&self) -> usize {
        self.registry.count().await
    }
}
