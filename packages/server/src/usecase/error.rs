//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ConnectionStateError, RegistryError};

/// 接続処理のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// 同じ ID のコネクションが既に登録されている
    #[error("connection '{0}' is already registered")]
    DuplicateIdentity(String),

    /// コネクションの状態が登録に適さない
    #[error(transparent)]
    InvalidState(#[from] ConnectionStateError),
}

impl From<RegistryError> for ConnectError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::DuplicateIdentity(id) => Self::DuplicateIdentity(id.into_string()),
            RegistryError::InvalidState(e) => Self::InvalidState(e),
        }
    }
}
