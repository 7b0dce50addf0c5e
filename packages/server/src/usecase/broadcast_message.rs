//! UseCase: メッセージのブロードキャスト処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - BroadcastMessageUseCase::execute() メソッド
//! - スナップショットに含まれる Open なコネクション全員への配送（送信者を含む）
//! - 送信失敗したコネクションの除去と、他の受信者への配送継続
//!
//! ### なぜこのテストが必要か
//! - 一つの壊れたクライアントが他のピアへの配送を妨げてはならない
//! - 送信者自身にもメッセージが届く（エコー）のは明示的な仕様であり、暗黙に変えてはならない
//! - 遅いクライアントのキューが無制限に伸びないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：三人への配送
//! - 異常系：受信側が切断済み、キューが満杯
//! - エッジケース：切断後のブロードキャスト、既に除去された送信者からのメッセージ

use std::sync::Arc;

use crate::{
    domain::{
        CloseReason, ConnectionId, ConnectionRegistry, Payload, RelayEvent, SendFailure,
    },
    infrastructure::EventBus,
};

/// Recipient selection for a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastMode {
    /// Every open connection receives the message, the originator included.
    #[default]
    EchoInclusive,
    /// Every open connection except the originator receives the message.
    ExcludeOriginator,
}

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the payload was queued for
    pub delivered: Vec<ConnectionId>,
    /// Connections removed because the send failed
    pub evicted: Vec<(ConnectionId, SendFailure)>,
}

/// メッセージブロードキャストのユースケース
pub struct BroadcastMessageUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// ライフサイクルイベントの発行先
    events: EventBus,
    /// 配送先の選び方
    mode: BroadcastMode,
}

impl BroadcastMessageUseCase {
    /// エコーありの BroadcastMessageUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, events: EventBus) -> Self {
        Self::with_mode(registry, events, BroadcastMode::EchoInclusive)
    }

    /// 配送モードを指定して作成
    pub fn with_mode(
        registry: Arc<dyn ConnectionRegistry>,
        events: EventBus,
        mode: BroadcastMode,
    ) -> Self {
        Self {
            registry,
            events,
            mode,
        }
    }

    /// ブロードキャストを実行
    ///
    /// エラーを返すことはありません。送信に失敗したコネクションは Registry から
    /// 除去され、`BroadcastReport::evicted` に記録されます。
    ///
    /// # Arguments
    ///
    /// * `originator` - メッセージを送ってきたコネクションの ID
    /// * `payload` - 中身を解釈しないテキスト
    pub async fn execute(&self, originator: &ConnectionId, payload: Payload) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        // 1. スナップショットを取得（ロックはここで解放される）
        let snapshot = self.registry.snapshot().await;

        if !snapshot
            .iter()
            .any(|connection| &connection.id == originator && connection.is_open())
        {
            tracing::debug!(
                originator = %originator,
                "dropping payload from a connection that is no longer open"
            );
            return report;
        }

        self.events.publish(RelayEvent::MessageReceived {
            originator: originator.clone(),
            payload: payload.clone(),
        });

        // 2. Open なコネクションそれぞれにノンブロッキングで送信
        for connection in snapshot.iter().filter(|c| c.is_open()) {
            if self.mode == BroadcastMode::ExcludeOriginator && &connection.id == originator {
                continue;
            }

            match connection.try_send(payload.clone()) {
                Ok(()) => report.delivered.push(connection.id.clone()),
                Err(failure) => {
                    tracing::warn!(
                        connection_id = %connection.id,
                        "failed to send message: {}",
                        failure
                    );
                    report.evicted.push((connection.id.clone(), failure));
                }
            }
        }

        // 3. 失敗したコネクションを除去（他の受信者への配送が終わった後）
        for (connection_id, failure) in &report.evicted {
            if self.registry.remove(connection_id).await.is_some() {
                let reason = match failure {
                    SendFailure::Closed => CloseReason::SendFailed,
                    SendFailure::QueueFull => CloseReason::QueueOverflow,
                };
                tracing::info!(connection_id = %connection_id, ?reason, "connection evicted");
                self.events.publish(RelayEvent::ConnectionClosed {
                    connection_id: connection_id.clone(),
                    reason,
                });
            }
        }

        tracing::debug!(
            originator = %originator,
            delivered = report.delivered.len(),
            evicted = report.evicted.len(),
            bytes = payload.len(),
            "broadcast complete"
        );

        report
    }
}
