use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pdfqa_store::models::DocumentRecord;
use pdfqa_store::schema::make_storage_path;
use tokio::io::AsyncWriteExt;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::parsers::{PageExtractor, PdfParseError, PdfTextParser};

const DEFAULT_PARSE_WORKERS: usize = 4;

/// Failure while turning uploaded bytes into a stored record.
///
/// Whenever this is returned, no record was inserted and the raw bytes written
/// for the attempt have been removed.
#[derive(Debug)]
pub enum ProcessingError {
    Io(io::Error),
    Parse(PdfParseError),
    Timeout(Duration),
    Worker(String),
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to persist document bytes: {err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::Timeout(limit) => {
                write!(f, "document parsing exceeded {}ms", limit.as_millis())
            }
            Self::Worker(message) => write!(f, "parse worker failed: {message}"),
        }
    }
}

impl Error for ProcessingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Timeout(_) | Self::Worker(_) => None,
        }
    }
}

impl From<io::Error> for ProcessingError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<PdfParseError> for ProcessingError {
    fn from(err: PdfParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<tokio::task::JoinError> for ProcessingError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Configuration for the document store.
#[derive(Debug, Clone)]
pub struct DocStoreConfig {
    pub storage_dir: PathBuf,
    pub parse_workers: usize,
    pub parse_timeout: Option<Duration>,
}

impl DocStoreConfig {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            parse_workers: DEFAULT_PARSE_WORKERS,
            parse_timeout: None,
        }
    }

    #[must_use]
    pub const fn with_parse_workers(mut self, parse_workers: usize) -> Self {
        self.parse_workers = parse_workers;
        self
    }

    #[must_use]
    pub const fn with_parse_timeout(mut self, parse_timeout: Duration) -> Self {
        self.parse_timeout = Some(parse_timeout);
        self
    }
}

/// Append-only document store.
///
/// Records live in a lock-guarded map for the lifetime of the process; raw
/// bytes are kept in `storage_dir`, one file per document.
pub struct MemoryDocStore {
    inner: Arc<MemoryDocStoreInner>,
}

impl Clone for MemoryDocStore {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct MemoryDocStoreInner {
    records: RwLock<HashMap<String, Arc<DocumentRecord>>>,
    storage_dir: PathBuf,
    extractor: Arc<dyn PageExtractor>,
    workers: Arc<Semaphore>,
    parse_timeout: Option<Duration>,
}

impl MemoryDocStore {
    /// Opens a store that extracts text with [`PdfTextParser`].
    ///
    /// # Errors
    /// Returns an I/O error if the storage directory cannot be created.
    pub async fn open(config: DocStoreConfig) -> io::Result<Self> {
        Self::open_with_extractor(config, Arc::new(PdfTextParser)).await
    }

    /// Opens a store with a custom page extractor.
    ///
    /// # Errors
    /// Returns an I/O error if the storage directory cannot be created.
    pub async fn open_with_extractor(
        config: DocStoreConfig,
        extractor: Arc<dyn PageExtractor>,
    ) -> io::Result<Self> {
        tokio::fs::create_dir_all(&config.storage_dir).await?;
        let workers = config.parse_workers.max(1);
        debug!(
            storage_dir = %config.storage_dir.display(),
            workers,
            "document store opened"
        );
        Ok(Self {
            inner: Arc::new(MemoryDocStoreInner {
                records: RwLock::new(HashMap::new()),
                storage_dir: config.storage_dir,
                extractor,
                workers: Arc::new(Semaphore::new(workers)),
                parse_timeout: config.parse_timeout,
            }),
        })
    }

    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.inner.storage_dir
    }

    /// Path the raw bytes for `document_id` are persisted under.
    #[must_use]
    pub fn storage_path_for(&self, document_id: &str) -> PathBuf {
        make_storage_path(&self.inner.storage_dir, document_id)
    }

    /// Persists `content`, extracts its text, and stores the resulting record.
    ///
    /// The caller is expected to have validated type and size already.
    ///
    /// The write, parse and insert steps run on their own task, so dropping
    /// the returned future does not interrupt cleanup: the attempt still ends
    /// either as a stored record or with its raw bytes removed.
    ///
    /// # Errors
    /// Returns `ProcessingError` if the bytes cannot be written or parsed. In
    /// that case no record is stored and the written file is removed.
    pub async fn ingest(
        &self,
        filename: &str,
        content: &[u8],
    ) -> ProcessingResult<Arc<DocumentRecord>> {
        let store = self.clone();
        let filename = filename.to_string();
        let content = content.to_vec();
        tokio::spawn(async move { store.ingest_detached(&filename, &content).await }).await?
    }

    async fn ingest_detached(
        &self,
        filename: &str,
        content: &[u8],
    ) -> ProcessingResult<Arc<DocumentRecord>> {
        let document_id = Uuid::new_v4().to_string();
        let storage_path = self.storage_path_for(&document_id);

        if let Err(err) = write_new_file(&storage_path, content).await {
            discard_file(&storage_path).await;
            warn!(%document_id, filename, error = %err, "failed to persist document bytes");
            return Err(err.into());
        }

        let pages = match self.extract_pages(storage_path.clone()).await {
            Ok(pages) => pages,
            Err(err) => {
                discard_file(&storage_path).await;
                warn!(%document_id, filename, error = %err, "document extraction failed");
                return Err(err);
            }
        };

        let record = Arc::new(DocumentRecord {
            id: document_id.clone(),
            filename: filename.to_string(),
            page_count: pages.len(),
            text: DocumentRecord::join_pages(&pages),
            storage_path,
            ingested_at: Utc::now(),
        });

        self.inner
            .records
            .write()
            .await
            .insert(document_id.clone(), record.clone());

        info!(
            %document_id,
            filename,
            page_count = record.page_count,
            text_length = record.text_length(),
            "document ingested"
        );
        Ok(record)
    }

    /// Fetches a record by id.
    pub async fn lookup(&self, document_id: &str) -> Option<Arc<DocumentRecord>> {
        self.inner.records.read().await.get(document_id).cloned()
    }

    /// Fetches only the extracted text for a record.
    pub async fn get_text(&self, document_id: &str) -> Option<String> {
        self.lookup(document_id)
            .await
            .map(|record| record.text.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.records.read().await.is_empty()
    }

    /// Reads the persisted bytes and extracts pages on the blocking pool.
    ///
    /// The worker permit moves into the blocking task, so a timed out parse
    /// keeps its slot until the thread actually finishes.
    async fn extract_pages(&self, path: PathBuf) -> ProcessingResult<Vec<String>> {
        let permit = self
            .inner
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| ProcessingError::Worker(err.to_string()))?;
        let extractor = self.inner.extractor.clone();
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let bytes = std::fs::read(&path)?;
            extractor.extract_pages(&bytes)
        });

        let joined = match self.inner.parse_timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| ProcessingError::Timeout(limit))?,
            None => task.await,
        };
        Ok(joined??)
    }
}

async fn write_new_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(content).await?;
    file.sync_all().await
}

async fn discard_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed raw document bytes"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "failed to remove raw document bytes"),
    }
}
