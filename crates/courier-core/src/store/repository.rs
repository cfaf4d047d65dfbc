//! SQLite message store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_pdu::{APP_SMIL, CHARSET_UTF_8, MULTIPART_RELATED};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use super::Store;
use super::model::{
    Folder, LogicalMessage, OutboxRecord, RecordKind, SendRecord, SendStatus, StatusChange,
    StoreLocation,
};
use crate::{Error, Result};

/// X-Mms-Message-Type of a stored send request.
const MESSAGE_TYPE_SEND_REQ: i64 = 128;
/// Stored MMS version.
const MMS_VERSION: i64 = 19;
/// Stored X-Mms-Priority (normal).
const PRIORITY_NORMAL: i64 = 129;
/// Stored X-Mms-Response-Status for rows inserted by hand.
const RESPONSE_STATUS_OK: i64 = 128;
/// Address type of a `To` recipient.
const ADDRESS_TYPE_TO: i64 = 151;

/// SQLite-backed [`Store`].
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS threads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipients TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id INTEGER NOT NULL,
                address TEXT NOT NULL,
                body TEXT NOT NULL,
                date TEXT NOT NULL,
                folder TEXT NOT NULL,
                status TEXT NOT NULL,
                error_code INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS mms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                folder TEXT NOT NULL,
                status TEXT NOT NULL,
                error_code INTEGER,
                subject TEXT NOT NULL DEFAULT '',
                subject_charset INTEGER NOT NULL,
                content_type TEXT NOT NULL,
                message_class TEXT NOT NULL,
                message_type INTEGER NOT NULL,
                version INTEGER NOT NULL,
                priority INTEGER NOT NULL,
                message_size INTEGER NOT NULL,
                transaction_id TEXT NOT NULL,
                response_status INTEGER,
                grouped INTEGER NOT NULL DEFAULT 0,
                manual INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS mms_parts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mms_id INTEGER NOT NULL,
                seq INTEGER NOT NULL,
                name TEXT,
                content_type TEXT NOT NULL,
                content_id TEXT,
                content_location TEXT,
                text TEXT,
                data BLOB
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS mms_addrs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mms_id INTEGER NOT NULL,
                address TEXT NOT NULL,
                type INTEGER NOT NULL,
                charset INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Lookups by thread and by message
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sms_thread ON sms(thread_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_mms_parts_mms ON mms_parts(mms_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_mms_addrs_mms ON mms_addrs(mms_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Number of parts stored for an MMS, the manifest included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn part_count(&self, mms_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM mms_parts WHERE mms_id = ?")
            .bind(mms_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Whether an MMS row was written by the manual fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_manual(&self, mms_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT manual FROM mms WHERE id = ?")
            .bind(mms_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some_and(|r| r.get::<i64, _>("manual") != 0))
    }

    /// Whether an MMS row was stored as a group conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_group(&self, mms_id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT grouped FROM mms WHERE id = ?")
            .bind(mms_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some_and(|r| r.get::<i64, _>("grouped") != 0))
    }

    async fn sms_record(&self, id: i64) -> Result<Option<SendRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, thread_id, address, body, date, folder, status, error_code
            FROM sms
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let address: String = row.get("address");
            record_from_row(&row, StoreLocation::sms(id), vec![address], row.get("body"))
        })
        .transpose()
    }

    async fn mms_record(&self, id: i64) -> Result<Option<SendRecord>> {
        let Some(row) = sqlx::query(
            r"
            SELECT id, thread_id, date, folder, status, error_code
            FROM mms
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let addresses = sqlx::query("SELECT address FROM mms_addrs WHERE mms_id = ? ORDER BY id")
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|r| r.get::<String, _>("address"))
            .collect();

        let body: String = sqlx::query(
            r"
            SELECT text FROM mms_parts
            WHERE mms_id = ? AND content_type LIKE 'text/%'
            ORDER BY seq
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .filter_map(|r| r.get::<Option<String>, _>("text"))
        .collect();

        record_from_row(&row, StoreLocation::mms(id), addresses, body).map(Some)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_outbox_record(&self, record: &OutboxRecord) -> Result<StoreLocation> {
        let result = sqlx::query(
            r"
            INSERT INTO sms (thread_id, address, body, date, folder, status)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(record.thread_id)
        .bind(&record.address)
        .bind(&record.body)
        .bind(record.timestamp.to_rfc3339())
        .bind(Folder::Outbox.as_str())
        .bind(SendStatus::Queued.as_str())
        .execute(&self.pool)
        .await?;

        Ok(StoreLocation::sms(result.last_insert_rowid()))
    }

    async fn resolve_thread_id(&self, addresses: &[String]) -> Result<i64> {
        let key = thread_key(addresses)
            .ok_or_else(|| Error::Store("Cannot resolve a thread without addresses".into()))?;

        sqlx::query(
            r"
            INSERT INTO threads (recipients, created_at)
            VALUES (?, ?)
            ON CONFLICT(recipients) DO NOTHING
            ",
        )
        .bind(&key)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id FROM threads WHERE recipients = ?")
            .bind(&key)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("id"))
    }

    async fn persist_logical_message(&self, message: &LogicalMessage) -> Result<StoreLocation> {
        let thread_id = self.resolve_thread_id(&message.recipients).await?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            INSERT INTO mms
                (thread_id, date, folder, status, subject, subject_charset, content_type,
                 message_class, message_type, version, priority, message_size, transaction_id,
                 grouped, manual)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            ",
        )
        .bind(thread_id)
        .bind(message.timestamp.to_rfc3339())
        .bind(Folder::Outbox.as_str())
        .bind(SendStatus::Queued.as_str())
        .bind(message.subject.as_deref().unwrap_or_default())
        .bind(i64::from(CHARSET_UTF_8))
        .bind(MULTIPART_RELATED)
        .bind("personal")
        .bind(MESSAGE_TYPE_SEND_REQ)
        .bind(MMS_VERSION)
        .bind(PRIORITY_NORMAL)
        .bind(size_as_i64(message.data_size()))
        .bind(&message.transaction_id)
        .bind(message.group)
        .execute(&mut *tx)
        .await?;
        let mms_id = result.last_insert_rowid();

        let mut seq: i64 = 0;
        if let Some(manifest) = &message.manifest {
            sqlx::query(
                r"
                INSERT INTO mms_parts
                    (mms_id, seq, name, content_type, content_id, content_location, text)
                VALUES (?, ?, NULL, ?, '<smil>', 'smil.xml', ?)
                ",
            )
            .bind(mms_id)
            .bind(seq)
            .bind(APP_SMIL)
            .bind(manifest)
            .execute(&mut *tx)
            .await?;
            seq += 1;
        }

        for part in &message.parts {
            let (text, data) = if part.is_text() {
                (Some(String::from_utf8_lossy(&part.data).into_owned()), None)
            } else {
                (None, Some(part.data.as_slice()))
            };
            sqlx::query(
                r"
                INSERT INTO mms_parts
                    (mms_id, seq, name, content_type, content_id, content_location, text, data)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(mms_id)
            .bind(seq)
            .bind(&part.name)
            .bind(&part.mime_type)
            .bind(format!("<{}>", part.name))
            .bind(&part.name)
            .bind(text)
            .bind(data)
            .execute(&mut *tx)
            .await?;
            seq += 1;
        }

        for address in &message.recipients {
            insert_address(&mut tx, mms_id, address).await?;
        }

        tx.commit().await?;
        Ok(StoreLocation::mms(mms_id))
    }

    async fn insert_manual_fallback(&self, message: &LogicalMessage) -> Result<StoreLocation> {
        let thread_id = self.resolve_thread_id(&message.recipients).await?;
        let now = message.timestamp;

        let result = sqlx::query(
            r"
            INSERT INTO mms
                (thread_id, date, folder, status, subject, subject_charset, content_type,
                 message_class, message_type, version, priority, message_size, transaction_id,
                 response_status, grouped, manual)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
            ",
        )
        .bind(thread_id)
        .bind(now.to_rfc3339())
        .bind(Folder::Outbox.as_str())
        .bind(SendStatus::Queued.as_str())
        .bind(message.subject.as_deref().unwrap_or_default())
        .bind(i64::from(CHARSET_UTF_8))
        .bind(MULTIPART_RELATED)
        .bind("personal")
        .bind(MESSAGE_TYPE_SEND_REQ)
        .bind(MMS_VERSION)
        .bind(PRIORITY_NORMAL)
        .bind(size_as_i64(message.data_size()))
        .bind(&message.transaction_id)
        .bind(RESPONSE_STATUS_OK)
        .bind(message.group)
        .execute(&self.pool)
        .await?;
        let mms_id = result.last_insert_rowid();

        let content_id = format!("<{}>", now.timestamp_millis());
        for (seq, part) in message.parts.iter().enumerate() {
            let seq = size_as_i64(seq);
            if part.mime_type.starts_with("image") {
                sqlx::query(
                    r"
                    INSERT INTO mms_parts (mms_id, seq, name, content_type, content_id, data)
                    VALUES (?, ?, ?, ?, ?, ?)
                    ",
                )
                .bind(mms_id)
                .bind(seq)
                .bind(&part.name)
                .bind(&part.mime_type)
                .bind(&content_id)
                .bind(part.data.as_slice())
                .execute(&self.pool)
                .await?;
            } else if part.is_text() {
                sqlx::query(
                    r"
                    INSERT INTO mms_parts (mms_id, seq, name, content_type, content_id, text)
                    VALUES (?, ?, ?, 'text/plain', ?, ?)
                    ",
                )
                .bind(mms_id)
                .bind(seq)
                .bind(&part.name)
                .bind(&content_id)
                .bind(String::from_utf8_lossy(&part.data).into_owned())
                .execute(&self.pool)
                .await?;
            } else {
                tracing::debug!(
                    part = %part.name,
                    mime = %part.mime_type,
                    "Manual insert skips part"
                );
            }
        }

        for address in &message.recipients {
            sqlx::query(
                "INSERT INTO mms_addrs (mms_id, address, type, charset) VALUES (?, ?, ?, ?)",
            )
            .bind(mms_id)
            .bind(address)
            .bind(ADDRESS_TYPE_TO)
            .bind(i64::from(CHARSET_UTF_8))
            .execute(&self.pool)
            .await?;
        }

        Ok(StoreLocation::mms(mms_id))
    }

    async fn move_to_folder(&self, location: StoreLocation, change: &StatusChange) -> Result<bool> {
        let sql = match location.kind {
            RecordKind::Sms => {
                r"
                UPDATE sms
                SET status = ?, folder = ?, error_code = COALESCE(?, error_code)
                WHERE id = ? AND status = ?
                "
            }
            RecordKind::Mms => {
                r"
                UPDATE mms
                SET status = ?, folder = ?, error_code = COALESCE(?, error_code)
                WHERE id = ? AND status = ?
                "
            }
        };

        let result = sqlx::query(sql)
            .bind(change.to.as_str())
            .bind(change.folder.as_str())
            .bind(change.error_code)
            .bind(location.id)
            .bind(change.from.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record(&self, location: StoreLocation) -> Result<Option<SendRecord>> {
        match location.kind {
            RecordKind::Sms => self.sms_record(location.id).await,
            RecordKind::Mms => self.mms_record(location.id).await,
        }
    }
}

async fn insert_address(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    mms_id: i64,
    address: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO mms_addrs (mms_id, address, type, charset) VALUES (?, ?, ?, ?)")
        .bind(mms_id)
        .bind(address)
        .bind(ADDRESS_TYPE_TO)
        .bind(i64::from(CHARSET_UTF_8))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Thread key: the trimmed, sorted, de-duplicated recipients.
fn thread_key(addresses: &[String]) -> Option<String> {
    let mut keys: Vec<&str> = addresses
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    keys.sort_unstable();
    keys.dedup();
    (!keys.is_empty()).then(|| keys.join(" "))
}

fn size_as_i64(size: usize) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

fn record_from_row(
    row: &SqliteRow,
    location: StoreLocation,
    addresses: Vec<String>,
    body: String,
) -> Result<SendRecord> {
    let date: String = row.get("date");
    let timestamp = DateTime::parse_from_rfc3339(&date)
        .map_err(|e| Error::Store(format!("Bad date on {location}: {e}")))?
        .with_timezone(&Utc);
    let status = row
        .get::<String, _>("status")
        .parse::<SendStatus>()
        .map_err(Error::Store)?;
    let folder = row
        .get::<String, _>("folder")
        .parse::<Folder>()
        .map_err(Error::Store)?;

    Ok(SendRecord {
        location,
        thread_id: row.get("thread_id"),
        addresses,
        body,
        timestamp,
        status,
        folder,
        error_code: row.get("error_code"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use courier_pdu::Part;

    fn outbox(address: &str, thread_id: i64) -> OutboxRecord {
        OutboxRecord {
            address: address.to_string(),
            body: "Hello".to_string(),
            thread_id,
            timestamp: Utc::now(),
        }
    }

    fn logical() -> LogicalMessage {
        LogicalMessage {
            recipients: vec!["5551234".into(), "5555678".into()],
            subject: Some("Pics".into()),
            parts: vec![
                Part::new("image0", "image/jpeg", vec![0xFF, 0xD8]).unwrap(),
                Part::new("audio", "audio/amr", vec![1, 2, 3]).unwrap(),
                Part::text("text", "Hi"),
            ],
            manifest: Some("<smil/>".into()),
            transaction_id: "T1".into(),
            timestamp: Utc::now(),
            group: true,
        }
    }

    #[tokio::test]
    async fn test_thread_resolution_is_order_insensitive() {
        let store = SqliteStore::in_memory().await.unwrap();
        let a = store
            .resolve_thread_id(&["B".into(), "A".into()])
            .await
            .unwrap();
        let b = store
            .resolve_thread_id(&["A".into(), " B ".into(), "A".into()])
            .await
            .unwrap();
        let c = store.resolve_thread_id(&["A".into()]).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(store.resolve_thread_id(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_outbox_record_roundtrip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let location = store.insert_outbox_record(&outbox("A", 3)).await.unwrap();

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.addresses, vec!["A"]);
        assert_eq!(record.body, "Hello");
        assert_eq!(record.thread_id, 3);
        assert_eq!(record.status, SendStatus::Queued);
        assert_eq!(record.folder, Folder::Outbox);
        assert_eq!(record.error_code, None);
    }

    #[tokio::test]
    async fn test_conditional_move() {
        let store = SqliteStore::in_memory().await.unwrap();
        let location = store.insert_outbox_record(&outbox("A", 1)).await.unwrap();

        let to_sent = StatusChange {
            from: SendStatus::Queued,
            to: SendStatus::Sent,
            folder: Folder::Sent,
            error_code: None,
        };
        assert!(store.move_to_folder(location, &to_sent).await.unwrap());
        // Already moved: the precondition no longer holds.
        assert!(!store.move_to_folder(location, &to_sent).await.unwrap());

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.status, SendStatus::Sent);
        assert_eq!(record.folder, Folder::Sent);
    }

    #[tokio::test]
    async fn test_error_code_kept() {
        let store = SqliteStore::in_memory().await.unwrap();
        let location = store.insert_outbox_record(&outbox("A", 1)).await.unwrap();

        let transient = StatusChange {
            from: SendStatus::Queued,
            to: SendStatus::Queued,
            folder: Folder::Outbox,
            error_code: Some(4),
        };
        assert!(store.move_to_folder(location, &transient).await.unwrap());
        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.status, SendStatus::Queued);
        assert_eq!(record.error_code, Some(4));
    }

    #[tokio::test]
    async fn test_persist_logical_message() {
        let store = SqliteStore::in_memory().await.unwrap();
        let location = store.persist_logical_message(&logical()).await.unwrap();

        assert_eq!(location.kind, RecordKind::Mms);
        assert_eq!(store.part_count(location.id).await.unwrap(), 4);
        assert!(!store.is_manual(location.id).await.unwrap());
        assert!(store.is_group(location.id).await.unwrap());

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.addresses, vec!["5551234", "5555678"]);
        assert_eq!(record.body, "Hi");
        assert_eq!(record.status, SendStatus::Queued);
    }

    #[tokio::test]
    async fn test_manual_fallback_keeps_images_and_text() {
        let store = SqliteStore::in_memory().await.unwrap();
        let location = store.insert_manual_fallback(&logical()).await.unwrap();

        assert_eq!(store.part_count(location.id).await.unwrap(), 2);
        assert!(store.is_manual(location.id).await.unwrap());
        assert!(store.is_group(location.id).await.unwrap());

        let record = store.record(location).await.unwrap().unwrap();
        assert_eq!(record.addresses.len(), 2);
        assert_eq!(record.body, "Hi");
    }

    #[tokio::test]
    async fn test_single_recipient_is_not_group() {
        let store = SqliteStore::in_memory().await.unwrap();
        let message = LogicalMessage {
            recipients: vec!["5551234".into()],
            group: false,
            ..logical()
        };
        let location = store.persist_logical_message(&message).await.unwrap();

        assert!(!store.is_group(location.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_record() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(store.record(StoreLocation::sms(42)).await.unwrap().is_none());
        assert!(store.record(StoreLocation::mms(42)).await.unwrap().is_none());
    }
}
