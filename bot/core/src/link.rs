//! Share-link parsing and formatting.
//!
//! Every accepted spelling of a link (bare code, `batch_<code>`, a full URL
//! ending in `/<code>` or `/batch_<code>`, or a deep-link `start=` payload)
//! resolves to the same [`LinkTarget`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::code::is_valid_code;

/// Link prefix that marks a batch code.
pub const BATCH_PREFIX: &str = "batch_";

/// A parsed share target. Batch codes live in their own namespace; the
/// prefix convention is decided here, at the link layer, so the registry
/// never has to guess which table a code belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Single(String),
    Batch(String),
}

impl LinkTarget {
    pub fn code(&self) -> &str {
        match self {
            LinkTarget::Single(code) | LinkTarget::Batch(code) => code,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, LinkTarget::Batch(_))
    }

    /// The deep-link / URL-path spelling: `<code>` or `batch_<code>`.
    pub fn payload(&self) -> String {
        match self {
            LinkTarget::Single(code) => code.clone(),
            LinkTarget::Batch(code) => format!("{BATCH_PREFIX}{code}"),
        }
    }
}

static DEEP_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"start=(batch_)?([0-9a-z]+)").unwrap());

static PATH_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(batch_)?([0-9a-z]+)/?$").unwrap());

/// Parse any accepted link spelling into a [`LinkTarget`].
///
/// Returns `None` for anything that does not carry a well-formed code.
pub fn parse_link(input: &str) -> Option<LinkTarget> {
    let input = input.trim();

    if let Some(code) = input.strip_prefix(BATCH_PREFIX) {
        if is_valid_code(code) {
            return Some(LinkTarget::Batch(code.to_string()));
        }
    }
    if is_valid_code(input) {
        return Some(LinkTarget::Single(input.to_string()));
    }

    for pattern in [&DEEP_LINK, &PATH_LINK] {
        if let Some(caps) = pattern.captures(input) {
            let code = caps.get(2).map(|m| m.as_str())?;
            if !is_valid_code(code) {
                continue;
            }
            return Some(if caps.get(1).is_some() {
                LinkTarget::Batch(code.to_string())
            } else {
                LinkTarget::Single(code.to_string())
            });
        }
    }
    None
}

/// Render the permanent share link for a target under the worker base URL.
pub fn share_link(base_url: &str, target: &LinkTarget) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), target.payload())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "k3x9qa2f";

    #[test]
    fn all_single_spellings_resolve_identically() {
        let expected = LinkTarget::Single(CODE.to_string());
        for spelling in [
            CODE.to_string(),
            format!("https://share.example.dev/{CODE}"),
            format!("https://t.me/somebot?start={CODE}"),
            format!("start={CODE}"),
        ] {
            assert_eq!(parse_link(&spelling).as_ref(), Some(&expected), "{spelling}");
        }
    }

    #[test]
    fn all_batch_spellings_resolve_identically() {
        let expected = LinkTarget::Batch(CODE.to_string());
        for spelling in [
            format!("batch_{CODE}"),
            format!("https://share.example.dev/batch_{CODE}"),
            format!("https://t.me/somebot?start=batch_{CODE}"),
            format!("start=batch_{CODE}"),
        ] {
            assert_eq!(parse_link(&spelling).as_ref(), Some(&expected), "{spelling}");
        }
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        for bad in ["", "not a link", "https://share.example.dev/", "batch_", "batch_SHOUT123"] {
            assert_eq!(parse_link(bad), None, "{bad}");
        }
    }

    #[test]
    fn share_link_joins_without_duplicate_slashes() {
        let single = LinkTarget::Single(CODE.to_string());
        let batch = LinkTarget::Batch(CODE.to_string());
        assert_eq!(
            share_link("https://share.example.dev/", &single),
            format!("https://share.example.dev/{CODE}")
        );
        assert_eq!(
            share_link("https://share.example.dev", &batch),
            format!("https://share.example.dev/batch_{CODE}")
        );
    }

    #[test]
    fn payload_round_trips_through_parse() {
        let batch = LinkTarget::Batch(CODE.to_string());
        assert_eq!(parse_link(&batch.payload()), Some(batch));
    }
}
