use tokio::sync::RwLock;

use goodday_core::calendar::TimeWindow;
use goodday_core::domain::reflection::Reflection;

use super::{ReflectionRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryReflectionRepository {
    reflections: RwLock<Vec<Reflection>>,
}

#[async_trait::async_trait]
impl ReflectionRepository for InMemoryReflectionRepository {
    async fn save(&self, reflection: Reflection) -> Result<(), RepositoryError> {
        let mut reflections = self.reflections.write().await;
        reflections.push(reflection);
        Ok(())
    }

    async fn list_between(
        &self,
        team_id: &str,
        user_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Reflection>, RepositoryError> {
        let reflections = self.reflections.read().await;
        let mut found: Vec<Reflection> = reflections
            .iter()
            .filter(|row| row.team_id == team_id && row.user_id == user_id)
            .filter(|row| window.contains(row.submitted_at))
            .cloned()
            .collect();
        found.sort_by_key(|row| row.submitted_at);
        Ok(found)
    }

    async fn latest(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<Reflection>, RepositoryError> {
        let reflections = self.reflections.read().await;
        // max_by_key keeps the last maximum, so later insertions win ties.
        Ok(reflections
            .iter()
            .filter(|row| row.team_id == team_id && row.user_id == user_id)
            .max_by_key(|row| row.submitted_at)
            .cloned())
    }
}
