//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! Mutex で保護した HashMap を唯一の共有可変状態として使用します。
//! 追加・削除・スナップショットはすべて同じロックの下で行われるため、
//! ブロードキャスト中に壊れた状態を観測することはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Connection, ConnectionId, ConnectionRegistry, ConnectionState, RegistryError};

/// インメモリ Connection Registry 実装
///
/// ドメイン層の ConnectionRegistry trait を実装します（依存性の逆転）。
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    /// 接続中のコネクション（outbound sender を含む）
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn add(&self, mut connection: Connection) -> Result<(), RegistryError> {
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&connection.id) {
            return Err(RegistryError::DuplicateIdentity(connection.id));
        }

        connection.open()?;
        connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    async fn remove(&self, id: &ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        connections.remove(id).map(|mut connection| {
            connection.close();
            connection
        })
    }

    async fn snapshot(&self) -> Vec<Connection> {
        let connections = self.connections.lock().await;
        connections.values().cloned().collect()
    }

    async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }

    async fn drain(&self) -> Vec<Connection> {
        let mut connections = self.connections.lock().await;
        connections
            .drain()
            .map(|(_, mut connection)| {
                if let Err(e) = connection.transition(ConnectionState::Closing) {
                    tracing::debug!(connection_id = %connection.id, "{}", e);
                }
                connection
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionIdFactory, Payload, Timestamp};
    use std::time::Duration;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryConnectionRegistry の Add / Remove / Snapshot / Drain
    // - 追加時に Open、削除時に Closed へ遷移すること
    // - Remove の冪等性、重複 ID の拒否
    //
    // 【なぜこのテストが必要か】
    // - Registry はリレーで唯一の共有可変状態
    // - Broadcast はスナップショットの内容と状態だけを頼りに配送先を決める
    // ========================================

    fn create_connection() -> (Connection, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(8);
        let connection = Connection::new(ConnectionIdFactory::generate(), tx, Timestamp::now());
        (connection, rx)
    }

    #[tokio::test]
    async fn test_add_connection_opens_it() {
        // テスト項目: 追加したコネクションは Open 状態でスナップショットに現れる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (connection, _rx) = create_connection();
        let id = connection.id.clone();

        // when (操作):
        let result = registry.add(connection).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(registry.count().await, 1);
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
        assert_eq!(snapshot[0].state(), ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_add_duplicate_identity_fails() {
        // テスト項目: 同じ ID の二重登録は DuplicateIdentity になり、既存エントリは残る
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (connection, _rx) = create_connection();
        let duplicate = connection.clone();
        let id = connection.id.clone();
        registry.add(connection).await.unwrap();

        // when (操作):
        let result = registry.add(duplicate).await;

        // then (期待する結果):
        assert_eq!(result, Err(RegistryError::DuplicateIdentity(id)));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_add_closed_connection_fails() {
        // テスト項目: Closed のコネクションは登録できない
        let registry = InMemoryConnectionRegistry::new();
        let (mut connection, _rx) = create_connection();
        connection.close();

        let result = registry.add(connection).await;

        assert!(matches!(result, Err(RegistryError::InvalidState(_))));
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_returns_closed_connection() {
        // テスト項目: 削除したコネクションは Closed 状態で返される
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (connection, _rx) = create_connection();
        let id = connection.id.clone();
        registry.add(connection).await.unwrap();

        // when (操作):
        let removed = registry.remove(&id).await;

        // then (期待する結果):
        assert_eq!(removed.unwrap().state(), ConnectionState::Closed);
        assert_eq!(registry.count().await, 0);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        // テスト項目: 同じ ID を二回削除してもエラーにならず、二回目は何もしない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (connection, _rx) = create_connection();
        let (other, _other_rx) = create_connection();
        let id = connection.id.clone();
        registry.add(connection).await.unwrap();
        registry.add(other).await.unwrap();

        // when (操作):
        let first = registry.remove(&id).await;
        let second = registry.remove(&id).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_later_mutation() {
        // テスト項目: スナップショット取得後の追加・削除はそのスナップショットに影響しない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (a, _rx_a) = create_connection();
        let (b, _rx_b) = create_connection();
        let a_id = a.id.clone();
        registry.add(a).await.unwrap();

        // when (操作):
        let snapshot = registry.snapshot().await;
        registry.add(b).await.unwrap();
        registry.remove(&a_id).await;

        // then (期待する結果):
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, a_id);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_drain_moves_everything_to_closing() {
        // テスト項目: drain で全コネクションが Closing になり Registry は空になる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (a, _rx_a) = create_connection();
        let (b, _rx_b) = create_connection();
        registry.add(a).await.unwrap();
        registry.add(b).await.unwrap();

        // when (操作):
        let drained = registry.drain().await;

        // then (期待する結果):
        assert_eq!(drained.len(), 2);
        assert!(
            drained
                .iter()
                .all(|c| c.state() == ConnectionState::Closing)
        );
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_fires_close_signal() {
        // テスト項目: remove でソケット側が待つクローズシグナルが発火する
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (connection, _rx) = create_connection();
        let id = connection.id.clone();
        let signal = connection.close_signal();
        registry.add(connection).await.unwrap();

        // when (操作):
        registry.remove(&id).await;

        // then (期待する結果):
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("close signal was not fired");
    }

    #[tokio::test]
    async fn test_drain_does_not_fire_close_signal() {
        // テスト項目: シャットダウンの drain はシグナルを発火せず、writer に Close 送信を任せる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (connection, mut rx) = create_connection();
        let signal = connection.close_signal();
        registry.add(connection).await.unwrap();

        // when (操作):
        let drained = registry.drain().await;
        drop(drained);

        // then (期待する結果):
        assert!(rx.recv().await.is_none());
        let waited = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(waited.is_err());
    }
}
