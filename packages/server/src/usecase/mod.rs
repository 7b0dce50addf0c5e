//! UseCase 層
//!
//! リレーのビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層の ConnectionRegistry を操作します。

pub mod broadcast_message;
pub mod connect_peer;
pub mod disconnect_peer;
pub mod error;

pub use broadcast_message::{BroadcastMessageUseCase, BroadcastMode, BroadcastReport};
pub use connect_peer::ConnectPeerUseCase;
pub use disconnect_peer::DisconnectPeerUseCase;
pub use error::ConnectError;
