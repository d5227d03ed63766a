//! Series pipeline: index page -> redirector links -> study pages with an
//! embedded study object -> one file per series instance.

use std::path::PathBuf;

use anyhow::Context as _;
use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::cli::SeriesArgs;
use crate::download::InstanceDownloader;
use crate::embedded::EmbeddedError;
use crate::formats::RunSummary;
use crate::redirect::UnwrapRules;
use crate::report::{FileReporter, Reporter};

pub const INDEX_CONTEXT: &str = "Main page";

#[derive(Debug, Clone)]
pub struct SeriesConfig {
    pub index_url: String,
    pub save_dir: PathBuf,
    pub rules: UnwrapRules,
    pub variable: String,
}

impl From<&SeriesArgs> for SeriesConfig {
    fn from(args: &SeriesArgs) -> Self {
        Self {
            index_url: args.index_url.clone(),
            save_dir: PathBuf::from(&args.out),
            rules: UnwrapRules {
                redirector: args.redirector.clone(),
                target_host: args.target_host.clone(),
            },
            variable: args.variable.clone(),
        }
    }
}

pub fn run(args: SeriesArgs) -> anyhow::Result<RunSummary> {
    let reporter = FileReporter::open(&PathBuf::from(&args.log_dir)).context("open run logs")?;
    let client = crate::http::build_client()?;

    let summary = crawl(&client, &reporter, &SeriesConfig::from(&args))?;
    tracing::info!(?summary, "series run complete");
    Ok(summary)
}

/// One run over every study linked from the index. File URLs are
/// deduplicated across the whole run.
pub fn crawl(
    client: &Client,
    reporter: &dyn Reporter,
    config: &SeriesConfig,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();

    let index_html = match crate::http::get_page(client, &config.index_url) {
        Ok(html) => html,
        Err(err) => {
            let message = crate::http::describe_error("accessing the main page", &err);
            tracing::error!(url = %config.index_url, %message, "index fetch failed");
            reporter.record_error(INDEX_CONTEXT, &message);
            return Ok(summary);
        }
    };

    let hrefs = anchor_hrefs(&index_html)?;
    let links = config.rules.unwrap_all(hrefs.iter().map(String::as_str));
    tracing::info!(count = links.len(), "found links to process");

    let mut downloader = InstanceDownloader::new(client, reporter, config.save_dir.clone());
    for (idx, link) in links.iter().enumerate() {
        tracing::info!(n = idx + 1, total = links.len(), %link, "processing link");
        process_link(client, reporter, &mut downloader, config, link, &mut summary);
    }

    tracing::debug!(unique_urls = downloader.seen_count(), "run dedup set");
    Ok(summary)
}

fn process_link(
    client: &Client,
    reporter: &dyn Reporter,
    downloader: &mut InstanceDownloader<'_>,
    config: &SeriesConfig,
    link: &str,
    summary: &mut RunSummary,
) {
    let page = match crate::http::get_page(client, link) {
        Ok(page) => page,
        Err(err) => {
            let message = crate::http::describe_error("accessing page", &err);
            tracing::warn!(%link, %message, "study page fetch failed");
            reporter.record_error(link, &message);
            summary.failed += 1;
            return;
        }
    };

    let study = match crate::embedded::parse_embedded_object(&page, &config.variable) {
        Ok(study) => study,
        Err(err @ EmbeddedError::NotFound { .. }) => {
            tracing::warn!(%link, %err, "no study object on page");
            reporter.record_error(link, &format!("Could not find {}: {err}", config.variable));
            summary.failed += 1;
            return;
        }
        Err(err @ EmbeddedError::Parse { .. }) => {
            tracing::warn!(%link, %err, "study object did not parse");
            reporter.record_error(link, &format!("Error parsing {}: {err}", config.variable));
            summary.failed += 1;
            return;
        }
    };

    for series in &study.series {
        let label = series.label_or_placeholder();
        for instance in &series.instances {
            if instance.url.trim().is_empty() {
                tracing::warn!(%link, label, "instance without url");
                reporter.record_error(link, &format!("Instance without url in series {label}"));
                summary.failed += 1;
                continue;
            }
            let file_url = crate::http::resolve_href(link, instance.url.trim());
            downloader.download(&file_url, label, link).tally(summary);
        }
    }
}

fn anchor_hrefs(html: &str) -> anyhow::Result<Vec<String>> {
    let document = Html::parse_document(html);
    let anchors =
        Selector::parse("a[href]").map_err(|err| anyhow::anyhow!("parse selector: {err:?}"))?;
    Ok(document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_owned)
        .collect())
}
