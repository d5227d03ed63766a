use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

const USER_AGENT_VALUE: &str = "caseharvest/0.1";

pub fn build_client() -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build http client")
}

/// GET `url`, turning non-2xx statuses into errors. The body is left
/// unread so callers can stream it.
pub fn get(client: &Client, url: &str) -> reqwest::Result<Response> {
    client
        .get(url)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .send()?
        .error_for_status()
}

/// GET `url` and return the body as text.
pub fn get_page(client: &Client, url: &str) -> reqwest::Result<String> {
    client
        .get(url)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .send()?
        .error_for_status()?
        .text()
}

/// Human-readable message for a failed request, distinguishing HTTP status
/// failures from transport failures.
pub fn describe_error(action: &str, err: &reqwest::Error) -> String {
    if err.is_status() {
        format!("HTTP error {action}: {err}")
    } else {
        format!("Error {action}: {err}")
    }
}

/// Resolves `href` against `base`; absolute hrefs are returned as-is.
pub fn resolve_href(base: &str, href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.to_string(),
        Err(_) => Url::parse(base)
            .and_then(|base| base.join(href))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_owned()),
    }
}
