//! Lookups in `key:\tvalue` status blocks such as `/proc/self/status`.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::fs::FileSystem;

pub const PROC_SELF_STATUS: &str = "/proc/self/status";

const KB: f64 = 1024.0;

/// Numeric lookup by key; `0.0` whenever the value cannot be produced.
pub trait StatusSource: Send + Sync {
    fn lookup(&self, key: &str) -> f64;
}

pub struct StatusParser<'a> {
    status: &'a str,
}

impl<'a> StatusParser<'a> {
    pub fn new(status: &'a str) -> Self {
        Self { status }
    }

    /// Value of `key` converted from `<n> kB` to bytes.
    ///
    /// A trailing `:` on `key` is optional. Missing keys, values without a
    /// `kB` suffix and non-numeric amounts all yield `0.0`.
    pub fn value(&self, key: &str) -> f64 {
        let key = key.strip_suffix(':').unwrap_or(key);
        let Some(raw) = self.raw_value(key) else {
            debug!(key, "status key not found");
            return 0.0;
        };

        let Some(amount) = raw.strip_suffix("kB") else {
            debug!(key, value = raw, "status value has no kB suffix");
            return 0.0;
        };

        match amount.trim().parse::<f64>() {
            Ok(kb) => kb * KB,
            Err(err) => {
                debug!(key, value = raw, error = %err, "status value is not numeric");
                0.0
            }
        }
    }

    fn raw_value(&self, key: &str) -> Option<&'a str> {
        self.status.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            (name.trim() == key).then(|| value.trim())
        })
    }
}

/// Re-reads the status file on every lookup so values are never stale.
pub struct ProcStatusReader<F> {
    fs: Arc<F>,
    path: PathBuf,
}

impl<F: FileSystem> ProcStatusReader<F> {
    pub fn new(fs: Arc<F>) -> Self {
        Self::with_path(fs, PROC_SELF_STATUS)
    }

    pub fn with_path(fs: Arc<F>, path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl<F: FileSystem> StatusSource for ProcStatusReader<F> {
    fn lookup(&self, key: &str) -> f64 {
        match self.fs.read_to_string(&self.path) {
            Ok(status) => StatusParser::new(&status).value(key),
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "failed to read status file");
                0.0
            }
        }
    }
}
