//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::StoreError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                user_name TEXT NOT NULL,
                user_email TEXT NOT NULL,
                phone TEXT NOT NULL,
                user_issues TEXT NOT NULL,
                selected_issue TEXT NOT NULL,
                professional_id TEXT NOT NULL,
                professional_name TEXT NOT NULL,
                professional_kind TEXT NOT NULL,
                session_type TEXT NOT NULL,
                session_date TEXT NOT NULL,
                session_time TEXT NOT NULL,
                duration_minutes INTEGER,
                price TEXT NOT NULL,
                previous_therapy TEXT NOT NULL DEFAULT '',
                current_medication TEXT NOT NULL DEFAULT '',
                urgency TEXT,
                additional_notes TEXT NOT NULL DEFAULT '',
                has_rated INTEGER NOT NULL DEFAULT 0,
                rating_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bookings_user_email ON bookings(user_email);
            CREATE INDEX IF NOT EXISTS idx_bookings_professional ON bookings(professional_id);
            CREATE INDEX IF NOT EXISTS idx_bookings_created ON bookings(created_at);

            CREATE TABLE IF NOT EXISTS ratings (
                id TEXT PRIMARY KEY,
                booking_id TEXT NOT NULL UNIQUE,
                user_email TEXT NOT NULL,
                user_display_name TEXT NOT NULL,
                professional_id TEXT NOT NULL,
                professional_name TEXT NOT NULL,
                overall INTEGER NOT NULL,
                service_quality INTEGER NOT NULL,
                value_for_money INTEGER NOT NULL,
                would_recommend INTEGER NOT NULL,
                comments TEXT,
                is_anonymous INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_ratings_professional ON ratings(professional_id);

            CREATE TABLE IF NOT EXISTS rating_summaries (
                professional_id TEXT PRIMARY KEY,
                average_overall TEXT NOT NULL,
                average_service_quality TEXT NOT NULL,
                average_value_for_money TEXT NOT NULL,
                total_ratings INTEGER NOT NULL,
                recommendation_percentage TEXT NOT NULL,
                distribution TEXT NOT NULL,
                last_update TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "rating_reminders",
        sql: r#"
            ALTER TABLE bookings ADD COLUMN rating_reminder_sent INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE bookings ADD COLUMN last_reminder_date TEXT;
            CREATE INDEX IF NOT EXISTS idx_bookings_has_rated ON bookings(has_rated);
        "#,
    },
];

/// Run all pending migrations against the given connection.
///
/// Creates the `_migrations` table if it doesn't exist.
pub async fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| StoreError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = get_current_version(conn).await?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                StoreError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    let final_version = get_current_version(conn).await?;
    tracing::info!(version = final_version, "Database migrations complete");
    Ok(())
}

/// Get the highest applied migration version, or 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, StoreError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| StoreError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| StoreError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => {
            let version: i64 = row.get(0).map_err(|e| {
                StoreError::Migration(format!("Failed to parse migration version: {e}"))
            })?;
            Ok(version)
        }
        None => Ok(0),
    }
}

/// Insert a version record into `_migrations`.
async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| StoreError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        for table in &["bookings", "ratings", "rating_summaries", "_migrations"] {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    libsql::params![*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap().unwrap();
            let count: i64 = row.get(0).unwrap();
            assert_eq!(count, 1, "Table '{}' should exist", table);
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        // Running again should not fail
        run_migrations(&conn).await.unwrap();

        let version = get_current_version(&conn).await.unwrap();
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn version_tracking() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT version, name FROM _migrations ORDER BY version", ())
            .await
            .unwrap();

        let row1 = rows.next().await.unwrap().unwrap();
        let v1: i64 = row1.get(0).unwrap();
        let n1: String = row1.get(1).unwrap();
        assert_eq!(v1, 1);
        assert_eq!(n1, "initial_schema");

        let row2 = rows.next().await.unwrap().unwrap();
        let v2: i64 = row2.get(0).unwrap();
        let n2: String = row2.get(1).unwrap();
        assert_eq!(v2, 2);
        assert_eq!(n2, "rating_reminders");
    }

    #[tokio::test]
    async fn reminder_columns_are_writable() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        conn.execute(
            "INSERT INTO bookings (id, user_name, user_email, phone, user_issues,
                selected_issue, professional_id, professional_name, professional_kind,
                session_type, session_date, session_time, duration_minutes, price,
                has_rated, created_at, updated_at, rating_reminder_sent, last_reminder_date)
             VALUES ('b1', 'Maya', 'maya@rkgit.edu.in', '9876543210', '[\"Anxiety\"]',
                'Anxiety', 'cns-1', 'Priya Sharma', 'counsellor',
                'video', '2025-03-14', '10:30:00', 50, '120',
                0, '2025-03-01T10:00:00Z', '2025-03-01T10:00:00Z', 1, '2025-03-20T09:00:00Z')",
            (),
        )
        .await
        .unwrap();
    }
}
