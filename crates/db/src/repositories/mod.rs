use async_trait::async_trait;
use thiserror::Error;

use goodday_core::calendar::TimeWindow;
use goodday_core::domain::reflection::Reflection;

pub mod memory;
pub mod reflection;

pub use memory::InMemoryReflectionRepository;
pub use reflection::SqlReflectionRepository;

/// Storage format of `submitted_at`; lexical order matches time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ReflectionRepository: Send + Sync {
    async fn save(&self, reflection: Reflection) -> Result<(), RepositoryError>;

    /// Reflections of one user submitted inside `window`, oldest first.
    async fn list_between(
        &self,
        team_id: &str,
        user_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Reflection>, RepositoryError>;

    async fn latest(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<Reflection>, RepositoryError>;
}
