use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use goodday_core::calendar::TimeWindow;
use goodday_core::domain::reflection::{AnswerCode, Answers, Reflection, ReflectionField};

use super::{ReflectionRepository, RepositoryError, TIMESTAMP_FORMAT};
use crate::DbPool;

const INSERT_REFLECTION: &str = "INSERT INTO reflection (
        team_id, user_id, submitted_at,
        work_day_quality, work_other_people_amount, help_other_people_amount,
        interrupted_amount, progress_goals_amount, quality_work_amount,
        lot_of_work_amount, work_day_feeling, stressful_amount,
        breaks_amount, meeting_number, most_productive_time, least_productive_time
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const SELECT_BETWEEN: &str = "SELECT * FROM reflection
    WHERE team_id = ? AND user_id = ? AND submitted_at >= ? AND submitted_at < ?
    ORDER BY submitted_at ASC, id ASC";

const SELECT_LATEST: &str = "SELECT * FROM reflection
    WHERE team_id = ? AND user_id = ?
    ORDER BY submitted_at DESC, id DESC
    LIMIT 1";

pub struct SqlReflectionRepository {
    pool: DbPool,
}

impl SqlReflectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReflectionRepository for SqlReflectionRepository {
    async fn save(&self, reflection: Reflection) -> Result<(), RepositoryError> {
        let submitted_at = reflection.submitted_at.format(TIMESTAMP_FORMAT).to_string();
        let mut query = sqlx::query(INSERT_REFLECTION)
            .bind(reflection.team_id.as_str())
            .bind(reflection.user_id.as_str())
            .bind(submitted_at);
        for field in ReflectionField::ALL {
            query = query.bind(field.answer(&reflection.answers).as_str());
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn list_between(
        &self,
        team_id: &str,
        user_id: &str,
        window: TimeWindow,
    ) -> Result<Vec<Reflection>, RepositoryError> {
        let rows = sqlx::query(SELECT_BETWEEN)
            .bind(team_id)
            .bind(user_id)
            .bind(window.start.format(TIMESTAMP_FORMAT).to_string())
            .bind(window.end.format(TIMESTAMP_FORMAT).to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(reflection_from_row).collect()
    }

    async fn latest(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<Option<Reflection>, RepositoryError> {
        let row = sqlx::query(SELECT_LATEST)
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(reflection_from_row).transpose()
    }
}

fn reflection_from_row(row: &SqliteRow) -> Result<Reflection, RepositoryError> {
    let raw_submitted_at: String = row.try_get("submitted_at")?;
    let submitted_at = NaiveDateTime::parse_from_str(&raw_submitted_at, TIMESTAMP_FORMAT)
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid submitted_at `{raw_submitted_at}`: {error}"))
        })?
        .and_utc();

    let mut answers = Answers::default();
    for field in ReflectionField::ALL {
        let code: String = row.try_get(field.key())?;
        *field.answer_mut(&mut answers) = AnswerCode::new(code);
    }

    Ok(Reflection {
        team_id: row.try_get("team_id")?,
        user_id: row.try_get("user_id")?,
        submitted_at,
        answers,
    })
}
