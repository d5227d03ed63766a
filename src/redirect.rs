//! Recovering real resource URLs from redirector-wrapped anchors such as
//! `https://www.google.com/url?q=https%3A%2F%2F...&sa=D`.

pub const DEFAULT_REDIRECTOR: &str = "www.google.com/url?";
pub const DEFAULT_TARGET_HOST: &str = "pacsbin.com";

#[derive(Debug, Clone)]
pub struct UnwrapRules {
    /// Substring an href must contain to be treated as a redirector link.
    pub redirector: String,
    /// Substring the decoded target must contain to be kept.
    pub target_host: String,
}

impl Default for UnwrapRules {
    fn default() -> Self {
        Self {
            redirector: DEFAULT_REDIRECTOR.to_owned(),
            target_host: DEFAULT_TARGET_HOST.to_owned(),
        }
    }
}

impl UnwrapRules {
    /// Unwraps one href; `None` when it is not a redirector link, carries no
    /// `q` parameter, or points outside the target host.
    pub fn unwrap_one(&self, href: &str) -> Option<String> {
        if !href.contains(&self.redirector) {
            return None;
        }

        let target = query_param(href, "q")?;
        if !target.contains(&self.target_host) {
            tracing::debug!(href, %target, "redirect target outside allowlist");
            return None;
        }
        Some(target)
    }

    /// Stable filter-map over `hrefs`. Repeated targets are kept.
    pub fn unwrap_all<'a, I>(&self, hrefs: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        hrefs
            .into_iter()
            .filter_map(|href| self.unwrap_one(href))
            .collect()
    }
}

fn query_param(href: &str, name: &str) -> Option<String> {
    let without_fragment = href.split('#').next().unwrap_or(href);
    let (_, query) = without_fragment.split_once('?')?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_allowlisted_targets_in_order() {
        let rules = UnwrapRules::default();
        let hrefs = [
            "https://www.google.com/url?q=https%3A%2F%2Fwww.pacsbin.com%2Fc%2Fa&sa=D&ust=1",
            "https://www.learnabdominal.com/about",
            "https://www.google.com/url?q=https%3A%2F%2Fyoutube.com%2Fwatch&sa=D",
            "https://www.google.com/url?sa=D&q=https://pacsbin.com/c/b",
            "https://www.google.com/url?sa=D",
            "https://www.google.com/url?q=https%3A%2F%2Fwww.pacsbin.com%2Fc%2Fa&sa=D&ust=2",
        ];

        let targets = rules.unwrap_all(hrefs);
        assert_eq!(
            targets,
            vec![
                "https://www.pacsbin.com/c/a".to_owned(),
                "https://pacsbin.com/c/b".to_owned(),
                "https://www.pacsbin.com/c/a".to_owned(),
            ]
        );
    }

    #[test]
    fn decodes_percent_encoded_query_in_target() {
        let rules = UnwrapRules::default();
        let href = "https://www.google.com/url?q=https://pacsbin.com/c/x%3Fid%3D7%26v%3D2&sa=D";
        assert_eq!(
            rules.unwrap_one(href).as_deref(),
            Some("https://pacsbin.com/c/x?id=7&v=2")
        );
    }

    #[test]
    fn target_host_is_checked_after_decoding() {
        let rules = UnwrapRules::default();
        let href = "https://www.google.com/url?q=https%3A%2F%2Fexample.com%2F&pacsbin.com=1";
        assert_eq!(rules.unwrap_one(href), None);
    }

    #[test]
    fn custom_rules_apply() {
        let rules = UnwrapRules {
            redirector: "/out?".to_owned(),
            target_host: "files.test".to_owned(),
        };
        assert_eq!(
            rules.unwrap_one("/out?q=http%3A%2F%2Ffiles.test%2F1#frag").as_deref(),
            Some("http://files.test/1")
        );
    }
}
