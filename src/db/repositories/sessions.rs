use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_i64, to_u64},
};
use crate::models::SessionRecord;

fn row_to_session(row: &Row) -> Result<SessionRecord> {
    let date: String = row.get("date")?;
    let duration_secs: i64 = row.get("duration_secs")?;
    let good_duration_secs: i64 = row.get("good_duration_secs")?;

    Ok(SessionRecord {
        id: row.get("id")?,
        date: parse_datetime(&date, "date")?,
        duration_secs: to_u64(duration_secs, "duration_secs")?,
        good_duration_secs: to_u64(good_duration_secs, "good_duration_secs")?,
    })
}

fn insert_session(conn: &mut Connection, record: &SessionRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO posture_sessions (id, date, duration_secs, good_duration_secs, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id,
            format_datetime(&record.date),
            to_i64(record.duration_secs)?,
            to_i64(record.good_duration_secs)?,
            format_datetime(&Utc::now()),
        ],
    )?;
    Ok(())
}

impl Database {
    /// Append a finished session.
    pub async fn append_session(&self, record: &SessionRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| insert_session(conn, &record)).await
    }

    /// Queue a session insert without waiting for the worker.
    pub fn append_session_detached(&self, record: &SessionRecord) -> Result<()> {
        let record = record.clone();
        self.execute_detached("append_session", move |conn| insert_session(conn, &record))
    }

    /// All sessions, oldest first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, duration_secs, good_duration_secs
                 FROM posture_sessions
                 ORDER BY date ASC, created_at ASC",
            )?;
            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Sessions dated at or after `cutoff`, oldest first.
    pub async fn list_sessions_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionRecord>> {
        let cutoff = format_datetime(&cutoff);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, duration_secs, good_duration_secs
                 FROM posture_sessions
                 WHERE date >= ?1
                 ORDER BY date ASC, created_at ASC",
            )?;
            let mut rows = stmt.query(params![cutoff])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Returns whether a session with `session_id` existed.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM posture_sessions WHERE id = ?1",
                params![session_id],
            )?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn record_at(day: u32, duration: u64, good: u64) -> SessionRecord {
        let date = Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
        SessionRecord::new(date, duration, good)
    }

    #[tokio::test]
    async fn append_then_list_round_trips_in_date_order() {
        let db = Database::in_memory().unwrap();
        let later = record_at(3, 300, 200);
        let earlier = record_at(1, 90, 60);
        db.append_session(&later).await.unwrap();
        db.append_session(&earlier).await.unwrap();

        let sessions = db.list_sessions().await.unwrap();
        assert_eq!(sessions, vec![earlier, later]);
    }

    #[tokio::test]
    async fn list_since_filters_by_date() {
        let db = Database::in_memory().unwrap();
        let old = record_at(1, 100, 50);
        let recent = record_at(10, 100, 80);
        db.append_session(&old).await.unwrap();
        db.append_session(&recent).await.unwrap();

        let cutoff = recent.date - Duration::days(1);
        let sessions = db.list_sessions_since(cutoff).await.unwrap();
        assert_eq!(sessions, vec![recent]);
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let db = Database::in_memory().unwrap();
        let record = record_at(2, 120, 120);
        db.append_session(&record).await.unwrap();

        assert!(db.delete_session(&record.id).await.unwrap());
        assert!(!db.delete_session(&record.id).await.unwrap());
        assert!(db.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let db = Database::in_memory().unwrap();
        let record = record_at(2, 120, 100);
        db.append_session(&record).await.unwrap();
        assert!(db.append_session(&record).await.is_err());
    }

    #[tokio::test]
    async fn detached_append_lands_before_later_queries() {
        let db = Database::in_memory().unwrap();
        let record = record_at(4, 600, 450);
        db.append_session_detached(&record).unwrap();

        assert_eq!(db.list_sessions().await.unwrap(), vec![record]);
    }
}
