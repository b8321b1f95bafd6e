/// Fallback line used when a file has neither caption nor name to show.
pub const FALLBACK_LINE: &str = "Here's your file!";

/// Build the outgoing HTML caption.
///
/// The effective text is the cleaned caption when non-empty, otherwise the
/// display name. With text: `"{prefix} - {text}"`; without:
/// `"{prefix}\n<b>Here's your file!</b>"`. Either way the whole result is
/// wrapped in one bold tag, matching what the transport renders as HTML.
pub fn decorate_caption(
    cleaned: Option<&str>,
    display_name: Option<&str>,
    prefix: &str,
) -> String {
    let effective = [cleaned, display_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|text| !text.is_empty());

    let body = match effective {
        Some(text) => format!("{prefix} - {text}"),
        None => format!("{prefix}\n<b>{FALLBACK_LINE}</b>"),
    };
    format!("<b>{body}</b>")
}
