use async_trait::async_trait;

use crate::post::Post;

/// Why a repository call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// No response reached us: connection refused, timeout, dropped stream.
    #[error("transport: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// The body was missing or did not have the expected shape.
    #[error("decode: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// 5xx response from the server.
    pub fn is_server_failure(&self) -> bool {
        matches!(self, Self::Server { status, .. } if (500..=599).contains(status))
    }
}

/// Remote post storage.
///
/// Every call is a single attempt and resolves exactly once. Implementations
/// log their own failures but must hand every one of them back to the caller.
#[async_trait]
pub trait PostRepository: Send + Sync + 'static {
    async fn list_all(&self) -> Result<Vec<Post>, RepositoryError>;

    async fn get_one(&self, id: i64) -> Result<Post, RepositoryError>;

    /// Saves `post` and returns the server's copy (real id, timestamp).
    async fn create(&self, post: &Post) -> Result<Post, RepositoryError>;

    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;

    async fn like(&self, id: i64) -> Result<Post, RepositoryError>;

    async fn unlike(&self, id: i64) -> Result<Post, RepositoryError>;

    async fn set_liked(&self, id: i64, liked: bool) -> Result<Post, RepositoryError> {
        if liked {
            self.like(id).await
        } else {
            self.unlike(id).await
        }
    }
}
