//! SQLite implementation of the TaskRepository port.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use tandem_core::TaskRepository;
use tandem_domain::{
    Result, SyncError, Task, TaskDraft, TaskPatch, TaskPriority, TaskSource,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::DbPool;
use crate::errors::InfraError;

const TASK_COLUMNS: &str = "id, user_email, title, source, scheduled_date, scheduled_time,
       priority, estimated_minutes, actual_minutes, is_done, completed_at,
       google_calendar_id, google_event_id, created_at, updated_at";

/// SQLite implementation of TaskRepository
pub struct SqliteTaskRepository {
    pool: DbPool,
}

impl SqliteTaskRepository {
    /// Create a new task repository sharing the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>> {
        self.pool.get().map_err(|e| InfraError::from(e).into())
    }

    fn insert_draft(
        conn: &Connection,
        user_email: &str,
        draft: &TaskDraft,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO tasks (id, user_email, title, source, scheduled_date, scheduled_time,
                 priority, estimated_minutes, actual_minutes, is_done, completed_at,
                 google_calendar_id, google_event_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, ?11, ?12, ?13, ?13)",
            params![
                id,
                user_email,
                draft.title,
                draft.source.as_str(),
                draft.scheduled_date.map(date_to_sql),
                draft.scheduled_time.map(time_to_sql),
                draft.priority.as_str(),
                draft.estimated_minutes,
                draft.actual_minutes,
                draft.is_done,
                draft.google_calendar_id,
                draft.google_event_id,
                datetime_to_sql(now),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(id)
    }

    fn load_task(conn: &Connection, user_email: &str, task_id: &str) -> Result<Task> {
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_email = ?1 AND id = ?2"),
            params![user_email, task_id],
            row_to_task,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                SyncError::NotFound(format!("task {task_id}"))
            }
            other => InfraError::from(other).into(),
        })
    }

    fn apply_patch_tx(
        tx: &Transaction<'_>,
        user_email: &str,
        task_id: &str,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let mut task = Self::load_task(tx, user_email, task_id)?;
        merge_patch(&mut task, patch, now);
        tx.execute(
            "UPDATE tasks SET title = ?1, source = ?2, scheduled_date = ?3,
                 scheduled_time = ?4, priority = ?5, estimated_minutes = ?6,
                 actual_minutes = ?7, is_done = ?8, completed_at = ?9,
                 google_calendar_id = ?10, google_event_id = ?11, updated_at = ?12
             WHERE user_email = ?13 AND id = ?14",
            params![
                task.title,
                task.source.as_str(),
                task.scheduled_date.map(date_to_sql),
                task.scheduled_time.map(time_to_sql),
                task.priority.as_str(),
                task.estimated_minutes,
                task.actual_minutes,
                task.is_done,
                task.completed_at.map(datetime_to_sql),
                task.google_calendar_id,
                task.google_event_id,
                datetime_to_sql(now),
                user_email,
                task_id,
            ],
        )
        .map_err(InfraError::from)?;
        Ok(task)
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, ids), fields(user = %user_email, id_count = ids.len()))]
    async fn find_by_external_ids(
        &self,
        user_email: &str,
        calendar_id: &str,
        ids: &[String],
    ) -> Result<Vec<Task>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let placeholders = (3..ids.len() + 3)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_email = ?1 AND google_calendar_id = ?2
               AND google_event_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
        let mut bindings: Vec<String> = Vec::with_capacity(ids.len() + 2);
        bindings.push(user_email.to_string());
        bindings.push(calendar_id.to_string());
        bindings.extend(ids.iter().cloned());
        let rows = stmt
            .query_map(params_from_iter(bindings), row_to_task)
            .map_err(InfraError::from)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.map_err(InfraError::from)?);
        }
        Ok(tasks)
    }

    #[instrument(skip(self, creates, updates), fields(user = %user_email, creates = creates.len(), updates = updates.len()))]
    async fn upsert_batch(
        &self,
        user_email: &str,
        creates: Vec<TaskDraft>,
        updates: Vec<(String, TaskPatch)>,
    ) -> Result<usize> {
        let count = creates.len() + updates.len();
        if count == 0 {
            return Ok(0);
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(InfraError::from)?;
        let now = Utc::now();
        for draft in &creates {
            Self::insert_draft(&tx, user_email, draft, now)?;
        }
        for (task_id, patch) in &updates {
            Self::apply_patch_tx(&tx, user_email, task_id, patch, now)?;
        }
        tx.commit().map_err(InfraError::from)?;
        debug!(count, "task batch committed");
        Ok(count)
    }

    async fn list_in_range(
        &self,
        user_email: &str,
        start: NaiveDate,
        end: NaiveDate,
        include_unscheduled: bool,
    ) -> Result<Vec<Task>> {
        let conn = self.conn()?;
        let sql = if include_unscheduled {
            format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE user_email = ?1
                   AND (scheduled_date IS NULL
                        OR (scheduled_date >= ?2 AND scheduled_date <= ?3))
                 ORDER BY scheduled_date, scheduled_time, created_at"
            )
        } else {
            format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE user_email = ?1
                   AND scheduled_date >= ?2 AND scheduled_date <= ?3
                 ORDER BY scheduled_date, scheduled_time, created_at"
            )
        };
        let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
        let rows = stmt
            .query_map(
                params![user_email, date_to_sql(start), date_to_sql(end)],
                row_to_task,
            )
            .map_err(InfraError::from)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.map_err(InfraError::from)?);
        }
        Ok(tasks)
    }

    async fn get(&self, user_email: &str, task_id: &str) -> Result<Task> {
        let conn = self.conn()?;
        Self::load_task(&conn, user_email, task_id)
    }

    #[instrument(skip(self, draft), fields(user = %user_email, title = %draft.title))]
    async fn create(&self, user_email: &str, draft: TaskDraft) -> Result<Task> {
        let conn = self.conn()?;
        let now = Utc::now();
        let id = Self::insert_draft(&conn, user_email, &draft, now)?;
        Self::load_task(&conn, user_email, &id)
    }

    #[instrument(skip(self, patch), fields(user = %user_email, task = %task_id))]
    async fn update(&self, user_email: &str, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(InfraError::from)?;
        let task = Self::apply_patch_tx(&tx, user_email, task_id, &patch, Utc::now())?;
        tx.commit().map_err(InfraError::from)?;
        Ok(task)
    }

    #[instrument(skip(self), fields(user = %user_email, task = %task_id))]
    async fn delete(&self, user_email: &str, task_id: &str) -> Result<()> {
        let conn = self.conn()?;
        let affected = conn
            .execute(
                "DELETE FROM tasks WHERE user_email = ?1 AND id = ?2",
                params![user_email, task_id],
            )
            .map_err(InfraError::from)?;
        if affected == 0 {
            return Err(SyncError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }
}

fn merge_patch(task: &mut Task, patch: &TaskPatch, now: DateTime<Utc>) {
    if let Some(title) = &patch.title {
        task.title = title.clone();
    }
    if let Some(source) = patch.source {
        task.source = source;
    }
    if let Some(date) = patch.scheduled_date {
        task.scheduled_date = date;
    }
    if let Some(time) = patch.scheduled_time {
        task.scheduled_time = time;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(minutes) = patch.estimated_minutes {
        task.estimated_minutes = minutes;
    }
    if let Some(minutes) = patch.actual_minutes {
        task.actual_minutes = minutes;
    }
    if let Some(done) = patch.is_done {
        task.is_done = done;
        // Completion instant tracks the done flag unless the patch sets it.
        if patch.completed_at.is_none() {
            task.completed_at = done.then_some(now);
        }
    }
    if let Some(completed) = patch.completed_at {
        task.completed_at = completed;
    }
    if let Some(calendar_id) = &patch.google_calendar_id {
        task.google_calendar_id = calendar_id.clone();
    }
    if let Some(event_id) = &patch.google_event_id {
        task.google_event_id = event_id.clone();
    }
    task.updated_at = now;
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_email: row.get(1)?,
        title: row.get(2)?,
        source: TaskSource::from_str_lossy(&row.get::<_, String>(3)?),
        scheduled_date: row
            .get::<_, Option<String>>(4)?
            .map(|s| parse_date(&s, 4))
            .transpose()?,
        scheduled_time: row
            .get::<_, Option<String>>(5)?
            .map(|s| parse_time(&s, 5))
            .transpose()?,
        priority: TaskPriority::from_str_lossy(&row.get::<_, String>(6)?),
        estimated_minutes: row.get(7)?,
        actual_minutes: row.get(8)?,
        is_done: row.get(9)?,
        completed_at: row
            .get::<_, Option<String>>(10)?
            .map(|s| parse_datetime(&s, 10))
            .transpose()?,
        google_calendar_id: row.get(11)?,
        google_event_id: row.get(12)?,
        created_at: parse_datetime(&row.get::<_, String>(13)?, 13)?,
        updated_at: parse_datetime(&row.get::<_, String>(14)?, 14)?,
    })
}

fn date_to_sql(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn time_to_sql(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

fn datetime_to_sql(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_date(raw: &str, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_time(raw: &str, idx: usize) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_datetime(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
