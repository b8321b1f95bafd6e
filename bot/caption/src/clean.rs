use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of two or more spaces (newlines are left alone).
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

/// Bracket pairs holding nothing but whitespace.
static EMPTY_BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*\]|\(\s*\)|\{\s*\}").unwrap());

/// URLs and t.me references, for captions saved with link saving disabled.
static LINKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://\S+|\bt\.me/\S+)").unwrap());

/// Excise configured terms from a raw caption.
///
/// One pass over `remove_names` in list order; each term has its first
/// case-insensitive occurrence removed while the rest of the text keeps its
/// original casing. Bracket pairs emptied by a removal are dropped, space
/// runs collapse to one space, and the result is trimmed. There is no
/// fixed-point iteration: a removal that splices a new match into existence
/// is left in place.
pub fn clean_caption(raw: Option<&str>, remove_names: &[String]) -> Option<String> {
    let raw = raw?;
    let mut text = raw.to_string();
    let mut removed_any = false;

    for name in remove_names {
        if name.is_empty() {
            continue;
        }
        if let Some((start, end)) = find_case_insensitive(&text, name) {
            text.replace_range(start..end, "");
            removed_any = true;
        }
    }

    if removed_any {
        text = EMPTY_BRACKETS.replace_all(&text, "").into_owned();
    }
    Some(collapse(&text))
}

/// Remove URLs from a caption, with the same collapse-and-trim finish.
pub fn strip_links(text: &str) -> String {
    collapse(&LINKS.replace_all(text, ""))
}

fn collapse(text: &str) -> String {
    SPACE_RUNS.replace_all(text, " ").trim().to_string()
}

/// Byte range of the first case-insensitive occurrence of `needle` in
/// `haystack`, compared char-by-char so multi-byte text stays intact.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let chars: Vec<(usize, char)> = haystack.char_indices().collect();
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() || needle_chars.len() > chars.len() {
        return None;
    }

    for start in 0..=chars.len() - needle_chars.len() {
        let window = &chars[start..start + needle_chars.len()];
        let matched = window
            .iter()
            .zip(&needle_chars)
            .all(|((_, h), n)| h.to_lowercase().eq(n.to_lowercase()));
        if matched {
            let begin = window[0].0;
            let end = chars
                .get(start + needle_chars.len())
                .map(|(i, _)| *i)
                .unwrap_or_else(|| haystack.len());
            return Some((begin, end));
        }
    }
    None
}
