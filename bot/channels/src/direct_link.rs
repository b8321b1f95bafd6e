//! `/gdirect`: turn a Google Drive share link into a worker direct link.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;

static DRIVE_FILE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/file/d/([a-zA-Z0-9_-]+)").unwrap());

/// Extract the file id from a Drive share link.
pub fn drive_file_id(link: &str) -> Option<&str> {
    DRIVE_FILE_ID
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Build the worker direct link: base64url-encoded file id and issue
/// timestamp (milliseconds), unpadded.
pub fn build_direct_link(worker_url: &str, file_id: &str, timestamp_ms: i64) -> String {
    let encoded_id = URL_SAFE_NO_PAD.encode(file_id.as_bytes());
    let encoded_ts = URL_SAFE_NO_PAD.encode(timestamp_ms.to_string().as_bytes());
    format!(
        "{}/gdirect/{encoded_id}/{encoded_ts}",
        worker_url.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_file_id_from_a_share_link() {
        let link = "https://drive.google.com/file/d/1AbC_dEf-234/view?usp=sharing";
        assert_eq!(drive_file_id(link), Some("1AbC_dEf-234"));
        assert_eq!(drive_file_id("https://example.com/nope"), None);
    }

    #[test]
    fn direct_links_encode_id_and_timestamp() {
        let link = build_direct_link("https://w.example.dev/", "abc123", 1_700_000_000_000);
        assert_eq!(
            link,
            format!(
                "https://w.example.dev/gdirect/{}/{}",
                URL_SAFE_NO_PAD.encode("abc123"),
                URL_SAFE_NO_PAD.encode("1700000000000"),
            )
        );
    }
}
