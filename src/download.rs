//! Per-file download steps shared by the case and series crawlers.
//!
//! Every failure here is converted into a [`Reporter`] entry plus an
//! [`Outcome::Failed`]; nothing propagates past a single file.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_DISPOSITION;
use url::Url;

use crate::formats::RunSummary;
use crate::report::Reporter;

pub const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Downloaded(PathBuf),
    /// Target file already present; nothing written.
    Skipped(PathBuf),
    /// URL already handled earlier in this run.
    Duplicate,
    Failed,
}

impl Outcome {
    pub fn tally(&self, summary: &mut RunSummary) {
        match self {
            Outcome::Downloaded(_) => summary.downloaded += 1,
            Outcome::Skipped(_) => summary.skipped += 1,
            Outcome::Duplicate => summary.duplicates += 1,
            Outcome::Failed => summary.failed += 1,
        }
    }
}

/// Filename from a `Content-Disposition` value: the first
/// `filename="<name>"` or `filename=<name>`, reduced to its last path
/// component.
pub fn parse_content_disposition_filename(header: &str) -> Option<String> {
    let start = header.find("filename=")? + "filename=".len();
    let rest = &header[start..];
    let rest = rest.strip_prefix('"').unwrap_or(rest);
    let name = rest.split(['"', ';']).next()?.trim();

    let name = Path::new(name).file_name()?.to_str()?;
    if name.is_empty() {
        return None;
    }
    Some(name.to_owned())
}

/// Replaces every character outside `[A-Za-z0-9_-]` (Unicode letters and
/// digits included) with `_`.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Last non-empty segment of the URL path, query and fragment excluded.
pub fn url_basename(file_url: &str) -> Option<String> {
    let segment = match Url::parse(file_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_owned),
        Err(_) => file_url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_owned),
    };
    segment.filter(|s| !s.is_empty())
}

/// `<sanitized label>_<basename>` for a series instance.
pub fn instance_file_name(label: &str, file_url: &str) -> Option<String> {
    let basename = url_basename(file_url)?;
    Some(format!("{}_{basename}", sanitize_label(label)))
}

/// Downloads case archives into a destination folder, naming them from the
/// server's `Content-Disposition` header.
pub struct CaseDownloader<'a> {
    client: &'a Client,
    reporter: &'a dyn Reporter,
    destination: PathBuf,
}

impl<'a> CaseDownloader<'a> {
    pub fn new(client: &'a Client, reporter: &'a dyn Reporter, destination: PathBuf) -> Self {
        Self {
            client,
            reporter,
            destination,
        }
    }

    pub fn download(&self, url: &str, case_title: &str) -> Outcome {
        tracing::info!(case = case_title, url, "downloading");

        let response = match crate::http::get(self.client, url) {
            Ok(response) => response,
            Err(err) => {
                let message = crate::http::describe_error("during download", &err);
                tracing::warn!(case = case_title, %message, "download failed");
                self.reporter.record_error(case_title, &message);
                return Outcome::Failed;
            }
        };

        let Some(filename) = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_disposition_filename)
        else {
            tracing::warn!(case = case_title, "no content-disposition filename; skipping");
            self.reporter.record_error(
                case_title,
                "Missing Content-Disposition header. Skipped download.",
            );
            return Outcome::Failed;
        };

        let path = self.destination.join(&filename);
        if path.exists() {
            tracing::info!(path = %path.display(), "file already exists; skipping");
            return Outcome::Skipped(path);
        }

        match write_streamed(response, &self.destination, &path) {
            Ok(bytes) => {
                tracing::info!(path = %path.display(), bytes, "download complete");
                Outcome::Downloaded(path)
            }
            Err(err) => {
                let message = format!("Error writing {}: {err:#}", path.display());
                tracing::warn!(case = case_title, %message, "download failed");
                self.reporter.record_error(case_title, &message);
                Outcome::Failed
            }
        }
    }
}

fn write_streamed(mut response: Response, dir: &Path, path: &Path) -> anyhow::Result<u64> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create destination dir: {}", dir.display()))?;

    let file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .with_context(|| format!("create file: {}", path.display()))?;

    let result = copy_chunks(&mut response, file);
    if result.is_err() {
        let _ = std::fs::remove_file(path);
    }
    result
}

fn copy_chunks(reader: &mut impl Read, file: File) -> anyhow::Result<u64> {
    let mut writer = BufWriter::new(file);
    let mut buf = [0_u8; CHUNK_SIZE];
    let mut total = 0_u64;
    loop {
        let n = reader.read(&mut buf).context("read response body")?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).context("write chunk")?;
        total += n as u64;
    }
    writer.flush().context("flush file")?;
    Ok(total)
}

/// Downloads series instances into one directory, skipping any file URL
/// already seen by this downloader.
///
/// The seen-set lives as long as the downloader, so one downloader should
/// be created per run. Different URLs that map to the same file name
/// overwrite each other.
pub struct InstanceDownloader<'a> {
    client: &'a Client,
    reporter: &'a dyn Reporter,
    save_dir: PathBuf,
    seen: HashSet<String>,
}

impl<'a> InstanceDownloader<'a> {
    pub fn new(client: &'a Client, reporter: &'a dyn Reporter, save_dir: PathBuf) -> Self {
        Self {
            client,
            reporter,
            save_dir,
            seen: HashSet::new(),
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn download(&mut self, file_url: &str, label: &str, page_link: &str) -> Outcome {
        if !self.seen.insert(file_url.to_owned()) {
            tracing::info!(url = file_url, page = page_link, "file url already processed");
            self.reporter
                .record_duplicate(page_link, &format!("Duplicate file URL found: {file_url}"));
            return Outcome::Duplicate;
        }

        let Some(file_name) = instance_file_name(label, file_url) else {
            tracing::warn!(url = file_url, "no file name in url path");
            self.reporter.record_error(
                page_link,
                &format!("Error downloading {file_url}: no file name in URL path"),
            );
            return Outcome::Failed;
        };
        let path = self.save_dir.join(file_name);
        tracing::info!(url = file_url, path = %path.display(), "downloading");

        let action = format!("downloading {file_url}");
        let body = match crate::http::get(self.client, file_url).and_then(|r| r.bytes()) {
            Ok(body) => body,
            Err(err) => {
                let message = crate::http::describe_error(&action, &err);
                tracing::warn!(%message, "download failed");
                self.reporter.record_error(page_link, &message);
                return Outcome::Failed;
            }
        };

        let written = std::fs::create_dir_all(&self.save_dir)
            .with_context(|| format!("create save dir: {}", self.save_dir.display()))
            .and_then(|()| {
                std::fs::write(&path, &body)
                    .with_context(|| format!("write file: {}", path.display()))
            });
        match written {
            Ok(()) => Outcome::Downloaded(path),
            Err(err) => {
                let message = format!("Error {action}: {err:#}");
                tracing::warn!(%message, "download failed");
                self.reporter.record_error(page_link, &message);
                Outcome::Failed
            }
        }
    }
}
