//! Append-only text logs.
//!
//! Health-status notes and medical history are stored one row per entry and
//! rendered as a single newest-first string, which is what clients see.

use chrono::NaiveDate;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::StoreError;

/// Date format used for entry stamps
pub const STAMP_FORMAT: &str = "%Y-%m-%d";

/// One stored log entry. Entries without a date are seed text captured at
/// registration and render verbatim.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LogEntry {
    pub entry_date: Option<NaiveDate>,
    pub body: String,
}

/// Prepend a dated entry to the accumulated text.
///
/// Every dated entry is newline-terminated, so merging into empty text
/// yields just `"{date}: {entry}\n"`.
pub fn merge(entry: &str, stamp: NaiveDate, previous: &str) -> String {
    format!("{}: {}\n{}", stamp.format(STAMP_FORMAT), entry, previous)
}

/// Render entries (oldest first, as stored) into the newest-first view
pub fn render<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) -> String {
    entries.into_iter().fold(String::new(), |acc, entry| match entry.entry_date {
        Some(stamp) => merge(&entry.body, stamp, &acc),
        None if acc.is_empty() => entry.body.clone(),
        None => format!("{}\n{}", entry.body, acc),
    })
}

/// Which append-only log an entry belongs to
#[derive(Debug, Clone, Copy)]
pub enum LogOwner {
    HealthStatus(i64),
    MedicalHistory(Uuid),
}

pub async fn append(
    conn: &mut SqliteConnection,
    owner: LogOwner,
    stamp: Option<NaiveDate>,
    body: &str,
) -> Result<(), StoreError> {
    let query = match owner {
        LogOwner::HealthStatus(id) => sqlx::query(
            "INSERT INTO health_status_notes (health_status_id, entry_date, body) VALUES (?, ?, ?)",
        )
        .bind(id),
        LogOwner::MedicalHistory(patient_id) => sqlx::query(
            "INSERT INTO medical_history_entries (patient_id, entry_date, body) VALUES (?, ?, ?)",
        )
        .bind(patient_id),
    };

    query.bind(stamp).bind(body).execute(conn).await?;
    Ok(())
}

/// Load a log in storage order (oldest first)
pub async fn load(conn: &mut SqliteConnection, owner: LogOwner) -> Result<Vec<LogEntry>, StoreError> {
    let entries = match owner {
        LogOwner::HealthStatus(id) => {
            sqlx::query_as::<_, LogEntry>(
                "SELECT entry_date, body FROM health_status_notes
                 WHERE health_status_id = ? ORDER BY id",
            )
            .bind(id)
            .fetch_all(conn)
            .await?
        }
        LogOwner::MedicalHistory(patient_id) => {
            sqlx::query_as::<_, LogEntry>(
                "SELECT entry_date, body FROM medical_history_entries
                 WHERE patient_id = ? ORDER BY id",
            )
            .bind(patient_id)
            .fetch_all(conn)
            .await?
        }
    };

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, STAMP_FORMAT).unwrap()
    }

    fn dated(s: &str, body: &str) -> LogEntry {
        LogEntry {
            entry_date: Some(day(s)),
            body: body.to_string(),
        }
    }

    #[test]
    fn merge_prepends_dated_entry() {
        let merged = merge("Pain managed", day("2024-01-01"), "2023-12-01: Admitted\n");
        assert_eq!(merged, "2024-01-01: Pain managed\n2023-12-01: Admitted\n");
    }

    #[test]
    fn merge_into_empty_text_has_no_leading_separator() {
        let merged = merge("First visit", day("2024-02-03"), "");
        assert_eq!(merged, "2024-02-03: First visit\n");
        assert!(!merged.starts_with('\n'));
    }

    #[test]
    fn render_is_newest_first() {
        let entries = vec![
            dated("2024-01-01", "n1"),
            dated("2024-01-02", "n2"),
            dated("2024-01-03", "n3"),
        ];
        assert_eq!(
            render(&entries),
            "2024-01-03: n3\n2024-01-02: n2\n2024-01-01: n1\n"
        );
    }

    #[test]
    fn render_keeps_seed_text_at_the_tail() {
        let entries = vec![
            LogEntry {
                entry_date: None,
                body: "Diagnosed in 2019".to_string(),
            },
            dated("2024-05-05", "Started morphine"),
        ];
        assert_eq!(
            render(&entries),
            "2024-05-05: Started morphine\nDiagnosed in 2019"
        );
    }

    #[test]
    fn render_never_drops_earlier_entries() {
        let mut entries = Vec::new();
        let mut previous = String::new();
        for i in 1..=10 {
            entries.push(dated("2024-03-01", &format!("note {i}")));
            let current = render(&entries);
            assert!(current.ends_with(&previous));
            assert!(current.len() > previous.len());
            previous = current;
        }
    }

    #[test]
    fn render_of_nothing_is_empty() {
        assert_eq!(render(&Vec::<LogEntry>::new()), "");
    }
}
