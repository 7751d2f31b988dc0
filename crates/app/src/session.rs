//! Signed-in user session.
//!
//! Authentication happens elsewhere; only the minimal identity needed by checkout and messaging
//! is kept, and it is persisted so it survives restarts.

use marketplace::ids::UserUuid;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::storage::{LocalStorage, SESSION_KEY, StorageError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session storage")]
    Storage(#[from] StorageError),

    #[error("session could not be encoded")]
    Encode(#[source] serde_json::Error),
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserUuid,
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: UserUuid, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email: None,
        }
    }
}

/// Restore the stored session. An unreadable entry is treated as signed out.
///
/// # Errors
///
/// Returns [`SessionError::Storage`] when storage cannot be read.
pub async fn load(storage: &dyn LocalStorage) -> Result<Option<Session>, SessionError> {
    let Some(json) = storage.get_item(SESSION_KEY).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&json) {
        Ok(session) => Ok(Some(session)),
        Err(error) => {
            warn!(%error, "discarding malformed stored session");

            Ok(None)
        }
    }
}

/// Persist a session.
///
/// # Errors
///
/// Returns an error when the session cannot be encoded or written.
pub async fn save(storage: &dyn LocalStorage, session: &Session) -> Result<(), SessionError> {
    let json = serde_json::to_string(session).map_err(SessionError::Encode)?;

    storage.set_item(SESSION_KEY, &json).await?;

    Ok(())
}

/// Forget the stored session.
///
/// # Errors
///
/// Returns [`SessionError::Storage`] when storage cannot be written.
pub async fn clear(storage: &dyn LocalStorage) -> Result<(), SessionError> {
    storage.remove_item(SESSION_KEY).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::storage::MemoryStorage;

    use super::*;

    #[tokio::test]
    async fn saved_session_is_restored() -> TestResult {
        let storage = MemoryStorage::new();
        let session = Session::new(UserUuid::now_v7(), "Ada");

        save(&storage, &session).await?;

        assert_eq!(load(&storage).await?, Some(session));

        clear(&storage).await?;

        assert_eq!(load(&storage).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn malformed_session_reads_as_signed_out() -> TestResult {
        let storage = MemoryStorage::new();

        storage.set_item(SESSION_KEY, "{\"user_id\":42}").await?;

        assert_eq!(load(&storage).await?, None);

        Ok(())
    }
}
