/*!
 * SQLite-backed translation cache store.
 *
 * Provides async-safe access to the cache table using tokio's
 * spawn_blocking around a mutex-guarded connection. The schema is
 * created on open; WAL mode keeps concurrent readers cheap.
 */

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "cache.sqlite";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "doctrans";

/// Everything stored alongside a cached translation
#[derive(Debug, Clone)]
pub struct CacheRecord {
    /// Provider identifier
    pub provider_id: String,
    /// Model name
    pub model: String,
    /// Source language
    pub source_lang: String,
    /// Target language
    pub target_lang: String,
    /// Glossary digest active at translation time
    pub glossary_hash: String,
    /// Prompt identity active at translation time
    pub prompt_identity: String,
    /// Input chunk as sent to the provider
    pub original_text: String,
    /// Translated chunk
    pub translated_text: String,
}

/// Translation cache with thread-safe SQLite access
#[derive(Clone)]
pub struct TranslationCache {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl TranslationCache {
    /// Open the cache at the default per-user location
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_cache_path()?;
        Self::open(&db_path)
    }

    /// Open the cache at the specified path, creating it if needed
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {:?}", parent))?;
        }

        info!("Opening translation cache at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open cache database: {:?}", db_path))?;

        initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory cache (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory translation cache");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default cache database path
    pub fn default_cache_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation with the connection
    fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire cache lock: {}", e))?;

        f(&conn)
    }

    /// Execute a database operation asynchronously using spawn_blocking
    async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire cache lock: {}", e))?;

            f(&conn)
        })
        .await
        .context("Cache task panicked")?
    }

    /// Look up a translation by its cache key
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.execute(|conn| {
            conn.query_row(
                "SELECT translated_text FROM translation_cache WHERE cache_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query translation cache")
        })
    }

    /// Look up a translation by its cache key, without blocking the runtime
    pub async fn get_async(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute_async(move |conn| {
            conn.query_row(
                "SELECT translated_text FROM translation_cache WHERE cache_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query translation cache")
        })
        .await
    }

    /// Store or overwrite a translation
    pub fn set(&self, key: &str, record: &CacheRecord) -> Result<()> {
        let key = key.to_string();
        let record = record.clone();
        self.execute(move |conn| insert_record(conn, &key, &record))
    }

    /// Store or overwrite a translation, without blocking the runtime
    pub async fn set_async(&self, key: &str, record: CacheRecord) -> Result<()> {
        let key = key.to_string();
        self.execute_async(move |conn| insert_record(conn, &key, &record))
            .await
    }

    /// Number of cached translations
    pub fn count(&self) -> Result<u64> {
        self.execute(|conn| {
            conn.query_row("SELECT COUNT(*) FROM translation_cache", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as u64)
            .context("Failed to count cache entries")
        })
    }
}

/// Insert or replace one cache row
fn insert_record(conn: &Connection, key: &str, record: &CacheRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO translation_cache (
            cache_key, provider_id, model, source_lang, target_lang,
            glossary_hash, prompt_identity, original_text, translated_text, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            key,
            record.provider_id,
            record.model,
            record.source_lang,
            record.target_lang,
            record.glossary_hash,
            record.prompt_identity,
            record.original_text,
            record.translated_text,
            chrono::Utc::now().timestamp(),
        ],
    )
    .context("Failed to write translation cache entry")?;
    Ok(())
}

/// Create the cache schema if it does not exist yet
fn initialize_schema(conn: &Connection) -> Result<()> {
    // WAL mode for better concurrency and crash recovery
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .context("Failed to enable WAL mode")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS translation_cache (
            cache_key       TEXT PRIMARY KEY,
            provider_id     TEXT NOT NULL,
            model           TEXT NOT NULL,
            source_lang     TEXT NOT NULL,
            target_lang     TEXT NOT NULL,
            glossary_hash   TEXT NOT NULL,
            prompt_identity TEXT NOT NULL,
            original_text   TEXT NOT NULL,
            translated_text TEXT NOT NULL,
            created_at      INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cache_langpair
            ON translation_cache (source_lang, target_lang);",
    )
    .context("Failed to create cache schema")?;

    debug!("Translation cache schema ready");
    Ok(())
}
