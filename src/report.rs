use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context as _;

pub const ERRORS_FILE: &str = "errors.txt";
pub const DUPLICATES_FILE: &str = "duplicates.txt";

/// Sink for per-item failures and duplicates. Recording never fails the
/// caller.
pub trait Reporter: Send + Sync {
    fn record_error(&self, context: &str, message: &str);
    fn record_duplicate(&self, context: &str, message: &str);
}

/// Appends `<context>: <message>` lines to `errors.txt` and `duplicates.txt`
/// in a log directory. Existing content is kept across runs.
#[derive(Debug)]
pub struct FileReporter {
    errors: File,
    errors_path: PathBuf,
    duplicates: File,
    duplicates_path: PathBuf,
}

impl FileReporter {
    pub fn open(log_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("create log dir: {}", log_dir.display()))?;

        let errors_path = log_dir.join(ERRORS_FILE);
        let duplicates_path = log_dir.join(DUPLICATES_FILE);
        Ok(Self {
            errors: open_append(&errors_path)?,
            errors_path,
            duplicates: open_append(&duplicates_path)?,
            duplicates_path,
        })
    }
}

fn open_append(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log: {}", path.display()))
}

/// Line breaks inside `text` become spaces so each event stays on one line.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

fn append_line(mut file: &File, path: &Path, context: &str, message: &str) {
    let line = format!("{}: {}\n", single_line(context), single_line(message));
    if let Err(err) = file.write_all(line.as_bytes()).and_then(|()| file.flush()) {
        tracing::error!(path = %path.display(), ?err, "append log line failed");
    }
}

impl Reporter for FileReporter {
    fn record_error(&self, context: &str, message: &str) {
        append_line(&self.errors, &self.errors_path, context, message);
    }

    fn record_duplicate(&self, context: &str, message: &str) {
        append_line(&self.duplicates, &self.duplicates_path, context, message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub context: String,
    pub message: String,
}

/// In-memory reporter for callers that inspect entries directly.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    errors: Mutex<Vec<Entry>>,
    duplicates: Mutex<Vec<Entry>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<Entry> {
        self.errors.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn duplicates(&self) -> Vec<Entry> {
        self.duplicates.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

fn push(entries: &Mutex<Vec<Entry>>, context: &str, message: &str) {
    if let Ok(mut entries) = entries.lock() {
        entries.push(Entry {
            context: context.to_owned(),
            message: message.to_owned(),
        });
    }
}

impl Reporter for MemoryReporter {
    fn record_error(&self, context: &str, message: &str) {
        push(&self.errors, context, message);
    }

    fn record_duplicate(&self, context: &str, message: &str) {
        push(&self.duplicates, context, message);
    }
}
