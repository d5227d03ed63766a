//! Case pipeline: index listing -> case page -> `.zip` link -> archive.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::cli::CasesArgs;
use crate::download::{CaseDownloader, Outcome};
use crate::formats::{CaseLink, RunSummary};
use crate::report::{FileReporter, Reporter};

const CASE_LIST_SELECTOR: &str = "ul.lcp_catlist#lcp_instance_0";
const DOWNLOAD_LINK_MARKER: &str = ".zip";
pub const INDEX_CONTEXT: &str = "Main page";

pub fn run(args: CasesArgs) -> anyhow::Result<RunSummary> {
    let reporter = FileReporter::open(&PathBuf::from(&args.log_dir)).context("open run logs")?;
    let client = crate::http::build_client()?;

    let summary = crawl(
        &client,
        &reporter,
        &args.index_url,
        PathBuf::from(&args.out),
        Duration::from_millis(args.delay_ms),
    )?;
    tracing::info!(?summary, "cases run complete");
    Ok(summary)
}

/// Walks every case listed on `index_url`. Only selector setup errors are
/// returned; everything else ends up in `reporter`.
pub fn crawl(
    client: &Client,
    reporter: &dyn Reporter,
    index_url: &str,
    destination: PathBuf,
    delay: Duration,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();

    let index_html = match crate::http::get_page(client, index_url) {
        Ok(html) => html,
        Err(err) => {
            let message = crate::http::describe_error("accessing the main page", &err);
            tracing::error!(url = index_url, %message, "index fetch failed");
            reporter.record_error(INDEX_CONTEXT, &message);
            return Ok(summary);
        }
    };

    let Some(cases) = parse_case_links(&index_html, index_url)? else {
        tracing::error!(url = index_url, "no case list found");
        reporter.record_error(INDEX_CONTEXT, "No case list found on the main page.");
        return Ok(summary);
    };
    tracing::info!(count = cases.len(), "found cases");

    let downloader = CaseDownloader::new(client, reporter, destination);
    for (idx, case) in cases.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            std::thread::sleep(delay);
        }
        process_case(client, reporter, &downloader, case)?.tally(&mut summary);
    }

    Ok(summary)
}

fn process_case(
    client: &Client,
    reporter: &dyn Reporter,
    downloader: &CaseDownloader<'_>,
    case: &CaseLink,
) -> anyhow::Result<Outcome> {
    tracing::info!(case = %case.title, url = %case.url, "processing case");

    let html = match crate::http::get_page(client, &case.url) {
        Ok(html) => html,
        Err(err) => {
            let message = crate::http::describe_error("accessing case page", &err);
            tracing::warn!(case = %case.title, %message, "case page fetch failed");
            reporter.record_error(&case.title, &message);
            return Ok(Outcome::Failed);
        }
    };

    let Some(download_url) = find_download_link(&html, &case.url)? else {
        tracing::warn!(case = %case.title, "no download link found");
        reporter.record_error(&case.title, "No download link found.");
        return Ok(Outcome::Failed);
    };

    Ok(downloader.download(&download_url, &case.title))
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow::anyhow!("parse selector {css:?}: {err:?}"))
}

/// Anchors inside the case listing, or `None` when the listing is absent.
pub fn parse_case_links(html: &str, page_url: &str) -> anyhow::Result<Option<Vec<CaseLink>>> {
    let document = Html::parse_document(html);
    let Some(list) = document.select(&selector(CASE_LIST_SELECTOR)?).next() else {
        return Ok(None);
    };

    let anchors = selector("a[href]")?;
    let links = list
        .select(&anchors)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            Some(CaseLink {
                title: a
                    .text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" "),
                url: crate::http::resolve_href(page_url, href),
            })
        })
        .collect();
    Ok(Some(links))
}

/// First anchor whose href mentions `.zip`.
pub fn find_download_link(html: &str, page_url: &str) -> anyhow::Result<Option<String>> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]")?;
    Ok(document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(DOWNLOAD_LINK_MARKER))
        .map(|href| crate::http::resolve_href(page_url, href)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_links_come_from_the_listing_only() -> anyhow::Result<()> {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <ul class="other">
              <li><a href="/cases/nope/">Nope</a></li>
            </ul>
            <ul class="lcp_catlist wide" id="lcp_instance_0">
              <li><a href="/cases/one/"> Case
                 <b>One</b> </a></li>
              <li><a>No href</a></li>
              <li><a href="https://other.test/two/">Case Two</a></li>
            </ul>
        </body></html>"#;

        let links = parse_case_links(html, "https://site.test/cases/")?.unwrap_or_default();
        assert_eq!(
            links,
            vec![
                CaseLink {
                    title: "Case One".to_owned(),
                    url: "https://site.test/cases/one/".to_owned(),
                },
                CaseLink {
                    title: "Case Two".to_owned(),
                    url: "https://other.test/two/".to_owned(),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_listing_is_none() -> anyhow::Result<()> {
        let html = r#"<ul class="lcp_catlist" id="lcp_instance_1"><li><a href="/x">x</a></li></ul>"#;
        assert_eq!(parse_case_links(html, "https://site.test/")?, None);
        Ok(())
    }

    #[test]
    fn first_zip_link_wins() -> anyhow::Result<()> {
        let html = r#"<p>
            <a href="/viewer">Viewer</a>
            <a href="/files/case1.zip?dl=1">Download</a>
            <a href="/files/case1-b.zip">Mirror</a>
        </p>"#;
        assert_eq!(
            find_download_link(html, "https://site.test/cases/one/")?.as_deref(),
            Some("https://site.test/files/case1.zip?dl=1")
        );
        assert_eq!(find_download_link("<a href='/x.pdf'>x</a>", "https://site.test/")?, None);
        Ok(())
    }
}
