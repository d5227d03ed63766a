//! Locating and decoding object literals assigned to a script variable,
//! e.g. `var studydata = { series: [...] };` inside a page body.

use regex::Regex;

use crate::formats::EmbeddedObject;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddedError {
    #[error("no `var {variable} = {{...}}` assignment found")]
    NotFound { variable: String },

    #[error("parse `{variable}` literal: {detail}")]
    Parse {
        variable: String,
        /// Single-line summary of `source`.
        detail: String,
        #[source]
        source: json5::Error,
    },
}

/// Returns the literal assigned to `var <variable> = {`, from the opening
/// brace through its matching closing brace.
///
/// Braces are counted without regard to string quoting, so a `}` inside a
/// quoted value ends the literal early. Returns `None` when the assignment
/// is absent or the braces never balance.
pub fn extract_object_literal<'a>(text: &'a str, variable: &str) -> Option<&'a str> {
    let pattern = format!(r"var\s+{}\s*=\s*\{{", regex::escape(variable));
    let re = Regex::new(&pattern).ok()?;
    let found = re.find(text)?;
    let start = found.end() - 1;

    let mut depth = 0_usize;
    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extracts the `variable` literal from `text` and decodes it with relaxed
/// (JSON5) syntax into an [`EmbeddedObject`].
pub fn parse_embedded_object(text: &str, variable: &str) -> Result<EmbeddedObject, EmbeddedError> {
    let literal =
        extract_object_literal(text, variable).ok_or_else(|| EmbeddedError::NotFound {
            variable: variable.to_owned(),
        })?;
    tracing::debug!(variable, len = literal.len(), "extracted object literal");

    json5::from_str(literal).map_err(|source| EmbeddedError::Parse {
        variable: variable.to_owned(),
        detail: one_line_detail(&source.to_string()),
        source,
    })
}

/// Collapses a parser report (possibly a multi-line `--> line:col` /
/// `= expected ...` block) into `line:col: reason`, or its last line.
fn one_line_detail(report: &str) -> String {
    let lines = report
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "|")
        .collect::<Vec<_>>();

    let location = lines
        .iter()
        .find_map(|line| line.strip_prefix("-->"))
        .map(str::trim);
    let reason = lines
        .last()
        .map(|line| line.strip_prefix('=').unwrap_or(*line).trim())
        .unwrap_or_default();

    match location {
        Some(location) if lines.len() > 1 => format!("{location}: {reason}"),
        _ => reason.to_owned(),
    }
}
