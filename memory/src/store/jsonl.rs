use std::collections::HashSet;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::knn::top_k_cosine;
use super::{LoadReport, Record, SearchHit, StoreError, StoreMeta};

const INDEX_FILENAME: &str = "index.jsonl";
const META_FILENAME: &str = "meta.json";
const MAX_RETRIES: usize = 10;
const RETRY_MS: u64 = 100;

/// Append-only vector store backed by a directory holding `meta.json` and
/// `index.jsonl`.
///
/// The embedding dimension and model name are read (or written) once when
/// the store is constructed and never change afterwards. Every record held in
/// memory has been durably appended to the log first.
#[derive(Debug, Clone)]
pub struct JsonlVectorStore {
    dir: PathBuf,
    index_path: PathBuf,
    meta: StoreMeta,
    items: Vec<Record>,
    last_load: LoadReport,
}

impl JsonlVectorStore {
    /// Open the store in `dir`, creating it when no metadata exists yet.
    ///
    /// Existing metadata always wins: `requested_dim` and `requested_model`
    /// are only used for a brand-new store.
    pub fn init_or_load(dir: &Path, requested_dim: usize, requested_model: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let meta_path = dir.join(META_FILENAME);
        let meta = match read_meta(&meta_path)? {
            Some(meta) => {
                if meta.embedding_dim != requested_dim || meta.embed_model != requested_model {
                    debug!(
                        "store {} keeps dim={} model={:?} (requested dim={} model={:?})",
                        dir.display(),
                        meta.embedding_dim,
                        meta.embed_model,
                        requested_dim,
                        requested_model
                    );
                }
                meta
            }
            None => {
                if requested_dim == 0 {
                    return Err(StoreError::InvalidDimension(requested_dim));
                }
                let meta = StoreMeta { embedding_dim: requested_dim, embed_model: requested_model.to_string() };
                write_meta(&meta_path, &meta)?;
                info!("created vector store at {} (dim={}, model={})", dir.display(), meta.embedding_dim, meta.embed_model);
                meta
            }
        };
        let mut store = Self::with_meta(dir, meta);
        store.reload()?;
        Ok(store)
    }

    /// Load an existing store. Never creates anything on disk.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let meta_path = dir.join(META_FILENAME);
        let Some(meta) = read_meta(&meta_path)? else {
            return Err(StoreError::NotInitialized(dir.to_path_buf()));
        };
        let mut store = Self::with_meta(dir, meta);
        store.reload()?;
        Ok(store)
    }

    fn with_meta(dir: &Path, meta: StoreMeta) -> Self {
        Self { dir: dir.to_path_buf(), index_path: dir.join(INDEX_FILENAME), meta, items: Vec::new(), last_load: LoadReport::default() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn embedding_dim(&self) -> usize { self.meta.embedding_dim }

    pub fn embed_model(&self) -> &str { &self.meta.embed_model }

    /// Outcome of the most recent replay of the log.
    pub fn load_report(&self) -> LoadReport { self.last_load }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn records(&self) -> &[Record] { &self.items }

    /// Distinct record sources in first-seen order.
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(|r| r.source.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Rebuild the in-memory set by replaying the log from the start.
    ///
    /// Blank lines are ignored. Unparsable lines (including a torn trailing
    /// write) and records whose embedding length differs from the store's
    /// dimension are skipped and counted in the report.
    pub fn reload(&mut self) -> Result<LoadReport, StoreError> {
        self.items.clear();
        let mut file = match OpenOptions::new().read(true).open(&self.index_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadReport::default()),
            Err(e) => return Err(e.into()),
        };
        lock_shared_with_retry(&file, &self.index_path)?;
        let mut buf = Vec::new();
        let read = file.read_to_end(&mut buf);
        let _ = fs2::FileExt::unlock(&file);
        read?;

        let mut report = LoadReport::default();
        for (lineno, line) in buf.split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) { continue; }
            let rec = match serde_json::from_slice::<Record>(line) {
                Ok(rec) => rec,
                Err(e) => {
                    debug!("{}:{}: skipping malformed record: {e}", self.index_path.display(), lineno + 1);
                    report.skipped += 1;
                    continue;
                }
            };
            if rec.embedding.len() != self.meta.embedding_dim {
                debug!(
                    "{}:{}: skipping record {} with dim {} (store dim {})",
                    self.index_path.display(),
                    lineno + 1,
                    rec.id,
                    rec.embedding.len(),
                    self.meta.embedding_dim
                );
                report.skipped += 1;
                continue;
            }
            self.items.push(rec);
        }
        report.loaded = self.items.len();
        if report.skipped > 0 {
            warn!("{}: skipped {} unusable line(s)", self.index_path.display(), report.skipped);
        }
        info!("loaded {} record(s) from {}", report.loaded, self.dir.display());
        self.last_load = report;
        Ok(report)
    }

    /// Durably append `rec` and then add it to the in-memory set.
    ///
    /// Returns `Ok(false)` without touching disk when the embedding length
    /// differs from the store dimension or any component is NaN or infinite.
    /// JSON has no encoding for non-finite floats, so such a record could not
    /// be read back.
    pub fn append(&mut self, rec: Record) -> Result<bool, StoreError> {
        if rec.embedding.len() != self.meta.embedding_dim {
            debug!("rejecting record {}: dim {} != {}", rec.id, rec.embedding.len(), self.meta.embedding_dim);
            return Ok(false);
        }
        if rec.embedding.iter().any(|v| !v.is_finite()) {
            debug!("rejecting record {}: non-finite embedding component", rec.id);
            return Ok(false);
        }
        let mut line = serde_json::to_string(&rec)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).read(true).open(&self.index_path)?;
        lock_exclusive_with_retry(&file, &self.index_path)?;
        let written = write_line(&mut file, &self.index_path, line.as_bytes());
        let _ = fs2::FileExt::unlock(&file);
        written?;

        self.items.push(rec);
        Ok(true)
    }

    /// Brute-force cosine search over every record.
    ///
    /// Empty when the query dimension is wrong, the store is empty or the
    /// query has zero magnitude. Equal scores rank in insertion order.
    pub fn query(&self, query_vec: &[f32], top_k: usize) -> Vec<SearchHit> {
        if query_vec.len() != self.meta.embedding_dim || self.items.is_empty() { return Vec::new(); }
        let hay: Vec<&[f32]> = self.items.iter().map(|r| r.embedding.as_slice()).collect();
        top_k_cosine(&hay, query_vec, top_k)
            .into_iter()
            .map(|s| {
                let r = &self.items[s.idx];
                SearchHit { id: r.id.clone(), source: r.source.clone(), text: r.text.clone(), score: s.score }
            })
            .collect()
    }
}

fn write_line(file: &mut File, path: &Path, line: &[u8]) -> Result<(), StoreError> {
    // A previous writer may have died mid-line; start on a fresh one.
    if file.metadata()?.len() > 0 {
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            warn!("{}: terminating torn trailing line", path.display());
            file.write_all(b"\n")?;
        }
    }
    file.write_all(line)?;
    file.flush()?;
    file.sync_data()?;
    Ok(())
}

fn read_meta(path: &Path) -> Result<Option<StoreMeta>, StoreError> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let meta: StoreMeta = serde_json::from_str(&s).map_err(|e| StoreError::InvalidMetadata {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if meta.embedding_dim == 0 {
        return Err(StoreError::InvalidMetadata { path: path.to_path_buf(), reason: "embedding_dim is 0".to_string() });
    }
    Ok(Some(meta))
}

fn write_meta(path: &Path, meta: &StoreMeta) -> Result<(), StoreError> {
    let data = serde_json::to_string(meta)?;
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut out = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_path)?;
        out.write_all(data.as_bytes())?;
        out.flush()?;
        out.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn lock_exclusive_with_retry(file: &File, path: &Path) -> Result<(), StoreError> {
    for _ in 0..MAX_RETRIES {
        match fs2::FileExt::try_lock_exclusive(file) {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(RETRY_MS));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(StoreError::LockTimeout(path.to_path_buf()))
}

fn lock_shared_with_retry(file: &File, path: &Path) -> Result<(), StoreError> {
    for _ in 0..MAX_RETRIES {
        match fs2::FileExt::try_lock_shared(file) {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(RETRY_MS));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(StoreError::LockTimeout(path.to_path_buf()))
}
