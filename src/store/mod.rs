//! Conversation history storage
//!
//! [`ChatStore`] owns the ordered session list and persists it as one JSON
//! blob under a single key through an injected [`HistoryBackend`]. The list
//! is loaded once at startup ([`ChatStore::restore`]) and overwritten on
//! every recorded exchange. Sessions are created lazily on the first
//! exchange recorded against their id and are never deleted.

use crate::error::{RagChatError, Result};
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub mod types;
pub use types::{ChatMessage, ChatSession, Sender};

/// Storage key under which the whole session list is persisted.
const HISTORY_KEY: &str = "rag-chat-history";

/// Default maximum characters of the first question used for a title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Durable key-value storage for the serialized session list
///
/// The entire history is one JSON blob under one key, so implementations
/// only need load-at-startup and overwrite-on-update. Both methods take
/// `&mut self`: history mutation is single-writer by construction.
pub trait HistoryBackend {
    /// Read the persisted history blob, if any.
    fn load(&mut self) -> Result<Option<String>>;

    /// Overwrite the persisted history blob.
    fn save(&mut self, blob: &str) -> Result<()>;
}

/// Observer invoked when the shape of the session list changes.
type Observer = Box<dyn Fn(&[ChatSession]) + Send>;

/// Ordered chat-session store with injected persistence
///
/// Session order is most-recently-created-first: new sessions are inserted
/// at the front, and existing sessions keep their position when later
/// exchanges are recorded against them.
///
/// # Examples
///
/// ```
/// use ragchat::store::{ChatStore, MemoryBackend};
///
/// # fn main() -> ragchat::error::Result<()> {
/// let mut store = ChatStore::new(MemoryBackend::new());
/// let session_id = store.new_session();
/// store.record_exchange(&session_id, "What is RAG?", "Retrieval-augmented generation.")?;
/// assert_eq!(store.sessions().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct ChatStore<B> {
    backend: B,
    sessions: Vec<ChatSession>,
    active: String,
    title_max_chars: usize,
    observers: Vec<Observer>,
}

impl<B: HistoryBackend> ChatStore<B> {
    /// Create a store with the default title length.
    pub fn new(backend: B) -> Self {
        Self::with_title_limit(backend, TITLE_MAX_CHARS)
    }

    /// Create a store with a custom title length.
    pub fn with_title_limit(backend: B, title_max_chars: usize) -> Self {
        Self {
            backend,
            sessions: Vec::new(),
            active: new_session_id(),
            title_max_chars,
            observers: Vec::new(),
        }
    }

    /// Load persisted history into the store
    ///
    /// An absent blob leaves the list empty; an unparseable blob is logged
    /// and treated as empty history. Observers are notified when sessions
    /// were restored.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend itself fails to read.
    pub fn restore(&mut self) -> Result<()> {
        match self.backend.load()? {
            Some(blob) => match serde_json::from_str::<Vec<ChatSession>>(&blob) {
                Ok(sessions) => {
                    tracing::debug!("Restored {} stored sessions", sessions.len());
                    self.sessions = sessions;
                    self.notify();
                }
                Err(e) => {
                    tracing::warn!("Persisted history is unreadable, starting empty: {}", e);
                    self.sessions.clear();
                }
            },
            None => tracing::debug!("No persisted history found"),
        }
        Ok(())
    }

    /// Record one completed question/answer exchange
    ///
    /// If `session_id` has not been seen, a session titled from the
    /// question is inserted at the front of the list and observers are
    /// notified. The user message and the assistant message are appended
    /// and the full list is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails; the
    /// in-memory list keeps the appended exchange either way.
    pub fn record_exchange(&mut self, session_id: &str, question: &str, answer: &str) -> Result<()> {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            let session = ChatSession {
                id: session_id.to_string(),
                title: truncate_title(question, self.title_max_chars),
                messages: Vec::new(),
            };
            self.sessions.insert(0, session);
            self.notify();
        }

        // Existing sessions keep their list position on later activity.
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) {
            session.messages.push(ChatMessage::user(question));
            session.messages.push(ChatMessage::assistant(answer));
        }

        self.persist()
    }

    /// Look up a session for transcript replay.
    pub fn load_session(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Start a fresh session and make it active
    ///
    /// Nothing is persisted until an exchange is recorded against the new
    /// id; zero-exchange sessions never reach storage.
    pub fn new_session(&mut self) -> String {
        self.active = new_session_id();
        tracing::debug!("New active session {}", self.active);
        self.active.clone()
    }

    /// Make an explicit session id active (e.g. when resuming).
    pub fn set_active(&mut self, session_id: impl Into<String>) {
        self.active = session_id.into();
    }

    /// The currently active session id.
    pub fn active_session(&self) -> &str {
        &self.active
    }

    /// All sessions, most recently created first.
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// Register a callback for session-list shape changes
    ///
    /// Observers run on new-session creation and on restore; this is the
    /// seam a sidebar or other listing UI hangs off.
    pub fn subscribe(&mut self, observer: impl Fn(&[ChatSession]) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer(&self.sessions);
        }
    }

    fn persist(&mut self) -> Result<()> {
        let blob = serde_json::to_string(&self.sessions)?;
        self.backend.save(&blob)
    }
}

/// Derive a session title from the first question
///
/// Questions longer than `max_chars` characters are cut there and marked
/// with an ellipsis; shorter questions are used unchanged. Counting is
/// per character, not per byte.
pub fn truncate_title(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut title: String = text.chars().take(max_chars).collect();
        title.push_str("...");
        title
    }
}

/// Generate a practically unique session id
///
/// Millisecond-timestamp prefix plus a random 64-bit suffix, both base-36.
/// Uniqueness is probabilistic; nothing enforces it beyond the entropy.
///
/// # Examples
///
/// ```
/// use ragchat::store::new_session_id;
///
/// let id = new_session_id();
/// assert!(!id.is_empty());
/// ```
pub fn new_session_id() -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    format!(
        "{}{}",
        to_base36(millis),
        to_base36(rand::random::<u64>())
    )
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// SQLite-backed history storage
///
/// A one-row key-value table in a database file under the platform data
/// directory. The path can be overridden with the `RAGCHAT_HISTORY_DB`
/// environment variable (the CLI's `--storage-path` is mirrored into it).
pub struct SqliteBackend {
    db_path: PathBuf,
}

impl SqliteBackend {
    /// Open the default history database
    ///
    /// # Errors
    ///
    /// Returns `RagChatError::Storage` if the data directory cannot be
    /// determined or created, or the database cannot be initialized.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("RAGCHAT_HISTORY_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "xbcsmith", "ragchat")
            .ok_or_else(|| RagChatError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            RagChatError::Storage(format!("Failed to create data directory: {}", e))
        })?;

        Self::new_with_path(data_dir.join("history.db"))
    }

    /// Open a history database at an explicit path
    ///
    /// Primarily useful for tests pointing at a temporary directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::store::SqliteBackend;
    ///
    /// let backend = SqliteBackend::new_with_path("/tmp/ragchat_test_history.db").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RagChatError::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }

        let backend = Self { db_path };
        backend.init()?;
        Ok(backend)
    }

    /// The path of the underlying database file.
    pub fn path(&self) -> &std::path::Path {
        &self.db_path
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| RagChatError::Storage(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .map_err(|e| RagChatError::Storage(format!("Failed to open database: {}", e)).into())
    }
}

impl HistoryBackend for SqliteBackend {
    fn load(&mut self) -> Result<Option<String>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT value FROM history WHERE key = ?",
            params![HISTORY_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| RagChatError::Storage(format!("Failed to read history: {}", e)).into())
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO history (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![HISTORY_KEY, blob],
        )
        .map_err(|e| RagChatError::Storage(format!("Failed to write history: {}", e)))?;
        Ok(())
    }
}

/// In-memory history backend for tests and embedding
///
/// Clones share the underlying blob, so a test can hold one handle while a
/// store writes through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&mut self) -> Result<Option<String>> {
        let guard = self
            .blob
            .lock()
            .map_err(|_| RagChatError::Storage("History fake lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| RagChatError::Storage("History fake lock poisoned".into()))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}
