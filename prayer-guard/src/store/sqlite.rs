//! SQLite-backed commitment store

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ActivityKind, CommitmentStore, PrayerActivity, PrayerCommitment};
use crate::error::{GuardError, Result};
use crate::spam::{CommitmentRecord, CommitmentStatus};

/// Commitment store over an sqlx SQLite pool
#[derive(Clone)]
pub struct SqliteCommitmentStore {
    db: SqlitePool,
}

impl SqliteCommitmentStore {
    /// Wrap an existing pool
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Connect to `database_url` and create the tables
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqlitePoolOptions::new();
        // Every in-memory connection is its own database, so keep exactly one alive
        let options = if database_url.contains(":memory:") {
            options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
        };

        let db = options.connect(database_url).await?;
        let store = Self::new(db);
        store.init_db().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Initialize database tables
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prayer_commitments (
                id TEXT PRIMARY KEY,
                request_id INTEGER NOT NULL,
                warrior TEXT NOT NULL,
                committed_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'committed',
                prayed_at TEXT,
                note TEXT,
                UNIQUE(request_id, warrior)
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_commitments_warrior ON prayer_commitments(warrior, committed_at)",
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prayer_activity (
                id TEXT PRIMARY KEY,
                request_id INTEGER NOT NULL,
                actor TEXT NOT NULL,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        info!("Commitment store initialized");
        Ok(())
    }

    /// Create or update a profile's creation time
    pub async fn upsert_profile(&self, user_id: &str, created_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, created_at) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET created_at = excluded.created_at
            "#,
        )
        .bind(user_id)
        .bind(format_ts(created_at))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Commit `warrior` to pray for `request_id`
    ///
    /// Re-committing resets the status to `committed` and keeps the original
    /// commit time.
    pub async fn upsert_commitment(
        &self,
        request_id: i64,
        warrior: &str,
        committed_at: DateTime<Utc>,
    ) -> Result<PrayerCommitment> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO prayer_commitments (id, request_id, warrior, committed_at, status)
            VALUES (?, ?, ?, ?, 'committed')
            ON CONFLICT(request_id, warrior) DO UPDATE SET status = 'committed'
            "#,
        )
        .bind(&id)
        .bind(request_id)
        .bind(warrior)
        .bind(format_ts(committed_at))
        .execute(&self.db)
        .await?;

        debug!("Commitment recorded: request {} by {}", request_id, warrior);

        self.get_commitment(request_id, warrior)
            .await?
            .ok_or_else(|| GuardError::NotFound(format!("commitment {}/{}", request_id, warrior)))
    }

    /// Mark a commitment as prayed
    pub async fn mark_prayed(
        &self,
        request_id: i64,
        warrior: &str,
        note: Option<&str>,
        prayed_at: DateTime<Utc>,
    ) -> Result<PrayerCommitment> {
        let note = note.map(str::trim).filter(|n| !n.is_empty());

        let result = sqlx::query(
            r#"
            UPDATE prayer_commitments
            SET status = 'prayed', prayed_at = ?, note = ?
            WHERE request_id = ? AND warrior = ?
            "#,
        )
        .bind(format_ts(prayed_at))
        .bind(note)
        .bind(request_id)
        .bind(warrior)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GuardError::NotFound(format!(
                "commitment {}/{}",
                request_id, warrior
            )));
        }

        self.get_commitment(request_id, warrior)
            .await?
            .ok_or_else(|| GuardError::NotFound(format!("commitment {}/{}", request_id, warrior)))
    }

    /// Remove a commitment; returns false when there was nothing to remove
    pub async fn delete_commitment(&self, request_id: i64, warrior: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM prayer_commitments WHERE request_id = ? AND warrior = ?")
            .bind(request_id)
            .bind(warrior)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a single commitment
    pub async fn get_commitment(
        &self,
        request_id: i64,
        warrior: &str,
    ) -> Result<Option<PrayerCommitment>> {
        let row = sqlx::query(
            r#"
            SELECT id, request_id, warrior, committed_at, status, prayed_at, note
            FROM prayer_commitments
            WHERE request_id = ? AND warrior = ?
            "#,
        )
        .bind(request_id)
        .bind(warrior)
        .fetch_optional(&self.db)
        .await?;

        row.map(row_to_commitment).transpose()
    }

    /// Append to the activity log
    pub async fn log_activity(&self, activity: &PrayerActivity) -> Result<()> {
        sqlx::query(
            "INSERT INTO prayer_activity (id, request_id, actor, kind, message, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(activity.request_id)
        .bind(&activity.actor)
        .bind(activity.kind.as_str())
        .bind(&activity.message)
        .bind(format_ts(activity.created_at))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Activity for one request, oldest first
    pub async fn list_activity(&self, request_id: i64) -> Result<Vec<PrayerActivity>> {
        let rows = sqlx::query_as::<_, (i64, String, String, String, String)>(
            "SELECT request_id, actor, kind, message, created_at FROM prayer_activity WHERE request_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(request_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(request_id, actor, kind, message, created_at)| -> Result<PrayerActivity> {
                Ok(PrayerActivity {
                    request_id,
                    actor,
                    kind: ActivityKind::parse(&kind).ok_or_else(|| {
                        GuardError::Parse(format!("Unknown activity kind: {}", kind))
                    })?,
                    message,
                    created_at: parse_ts(&created_at)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CommitmentStore for SqliteCommitmentStore {
    async fn account_created_at(&self, user_id: &str) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query_as::<_, (String,)>("SELECT created_at FROM profiles WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        row.map(|(created_at,)| parse_ts(&created_at)).transpose()
    }

    async fn list_commitments(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<CommitmentRecord>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(i64::from).unwrap_or(-1);

        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT committed_at, status FROM prayer_commitments WHERE warrior = ? ORDER BY committed_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(committed_at, status)| -> Result<CommitmentRecord> {
                Ok(CommitmentRecord::new(
                    parse_ts(&committed_at)?,
                    status.parse()?,
                ))
            })
            .collect()
    }

    async fn list_all_commitments(&self) -> Result<Vec<(String, CommitmentStatus)>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT warrior, status FROM prayer_commitments ORDER BY committed_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(warrior, status)| -> Result<(String, CommitmentStatus)> {
                Ok((warrior, status.parse()?))
            })
            .collect()
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| GuardError::Parse(format!("Invalid timestamp '{}': {}", s, e)))
}

fn row_to_commitment(row: SqliteRow) -> Result<PrayerCommitment> {
    let committed_at: String = row.try_get("committed_at")?;
    let status: String = row.try_get("status")?;
    let prayed_at: Option<String> = row.try_get("prayed_at")?;

    Ok(PrayerCommitment {
        id: row.try_get("id")?,
        request_id: row.try_get("request_id")?,
        warrior_id: row.try_get("warrior")?,
        committed_at: parse_ts(&committed_at)?,
        status: status.parse()?,
        prayed_at: prayed_at.as_deref().map(parse_ts).transpose()?,
        note: row.try_get("note")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn setup_store() -> SqliteCommitmentStore {
        SqliteCommitmentStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_profile_created_at() {
        let store = setup_store().await;
        let created = Utc::now() - Duration::days(3);

        assert!(store.account_created_at("alice").await.unwrap().is_none());

        store.upsert_profile("alice", created).await.unwrap();
        let loaded = store.account_created_at("alice").await.unwrap().unwrap();
        assert_eq!(loaded.timestamp_micros(), created.timestamp_micros());
    }

    #[tokio::test]
    async fn test_commitments_newest_first() {
        let store = setup_store().await;
        let now = Utc::now();

        store
            .upsert_commitment(1, "alice", now - Duration::minutes(10))
            .await
            .unwrap();
        store.upsert_commitment(2, "alice", now).await.unwrap();
        store
            .upsert_commitment(3, "alice", now - Duration::minutes(1))
            .await
            .unwrap();
        store.upsert_commitment(1, "bob", now).await.unwrap();

        let records = store.list_commitments("alice", None).await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].committed_at > records[1].committed_at);
        assert!(records[1].committed_at > records[2].committed_at);

        let limited = store.list_commitments("alice", Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].committed_at, records[0].committed_at);
    }

    #[tokio::test]
    async fn test_recommit_resets_status_and_keeps_time() {
        let store = setup_store().await;
        let first = Utc::now() - Duration::hours(1);

        let original = store.upsert_commitment(7, "alice", first).await.unwrap();
        store
            .mark_prayed(7, "alice", Some("  amen  "), Utc::now())
            .await
            .unwrap();

        let again = store.upsert_commitment(7, "alice", Utc::now()).await.unwrap();
        assert_eq!(again.id, original.id);
        assert_eq!(again.status, CommitmentStatus::Committed);
        assert_eq!(again.committed_at, original.committed_at);
    }

    #[tokio::test]
    async fn test_mark_prayed() {
        let store = setup_store().await;
        store.upsert_commitment(5, "alice", Utc::now()).await.unwrap();

        let prayed = store
            .mark_prayed(5, "alice", Some("  for healing "), Utc::now())
            .await
            .unwrap();
        assert_eq!(prayed.status, CommitmentStatus::Prayed);
        assert!(prayed.prayed_at.is_some());
        assert_eq!(prayed.note.as_deref(), Some("for healing"));

        let blank = store
            .mark_prayed(5, "alice", Some("   "), Utc::now())
            .await
            .unwrap();
        assert!(blank.note.is_none());
    }

    #[tokio::test]
    async fn test_mark_prayed_missing() {
        let store = setup_store().await;
        let result = store.mark_prayed(99, "alice", None, Utc::now()).await;
        assert!(matches!(result, Err(GuardError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_commitment() {
        let store = setup_store().await;
        store.upsert_commitment(5, "alice", Utc::now()).await.unwrap();

        assert!(store.delete_commitment(5, "alice").await.unwrap());
        assert!(!store.delete_commitment(5, "alice").await.unwrap());
        assert!(store.get_commitment(5, "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_commitments() {
        let store = setup_store().await;
        store.upsert_commitment(1, "alice", Utc::now()).await.unwrap();
        store.upsert_commitment(2, "bob", Utc::now()).await.unwrap();
        store.mark_prayed(2, "bob", None, Utc::now()).await.unwrap();

        let all = store.list_all_commitments().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&("bob".to_string(), CommitmentStatus::Prayed)));
        assert!(all.contains(&("alice".to_string(), CommitmentStatus::Committed)));
    }

    #[tokio::test]
    async fn test_unknown_status_is_parse_error() {
        let store = setup_store().await;
        sqlx::query(
            "INSERT INTO prayer_commitments (id, request_id, warrior, committed_at, status) VALUES ('x', 1, 'eve', ?, 'bogus')",
        )
        .bind(format_ts(Utc::now()))
        .execute(store.pool())
        .await
        .unwrap();

        let result = store.list_commitments("eve", None).await;
        assert!(matches!(result, Err(GuardError::Parse(_))));
    }

    #[tokio::test]
    async fn test_activity_log() {
        let store = setup_store().await;
        let now = Utc::now();

        for (kind, message) in [
            (ActivityKind::Commitment, "committed to pray"),
            (ActivityKind::PrayerCompleted, "completed prayer"),
        ] {
            store
                .log_activity(&PrayerActivity {
                    request_id: 3,
                    actor: "alice".to_string(),
                    kind,
                    message: message.to_string(),
                    created_at: now,
                })
                .await
                .unwrap();
        }

        let activity = store.list_activity(3).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].kind, ActivityKind::Commitment);
        assert_eq!(activity[1].kind, ActivityKind::PrayerCompleted);
        assert!(store.list_activity(4).await.unwrap().is_empty());
    }
}
