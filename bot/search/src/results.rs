//! Scan, score, rank, and page search results.

use filelink_core::{BatchEntry, BatchFile, StoredFile};

use crate::similarity::partial_ratio;

/// A candidate matches when its best field score exceeds this.
pub const MATCH_THRESHOLD: u8 = 70;

/// Combined single-file and batch items per result page.
pub const PAGE_SIZE: usize = 5;

/// Which result kinds a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    SinglesOnly,
    BatchesOnly,
}

impl ViewFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewFilter::All => "all",
            ViewFilter::SinglesOnly => "single",
            ViewFilter::BatchesOnly => "batch",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all" => Some(ViewFilter::All),
            "single" => Some(ViewFilter::SinglesOnly),
            "batch" => Some(ViewFilter::BatchesOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFile {
    pub file: StoredFile,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub file: BatchFile,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBatch {
    pub batch: BatchEntry,
    /// Best score among the matching members.
    pub score: u8,
    /// Matching members, best first (page previews show the top few).
    pub matching: Vec<ScoredMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub files: Vec<ScoredFile>,
    pub batches: Vec<ScoredBatch>,
}

/// One rendered page of combined results.
pub struct Page<'a> {
    pub items: Vec<PageItem<'a>>,
    pub number: usize,
    pub total_pages: usize,
}

pub enum PageItem<'a> {
    File(&'a ScoredFile),
    Batch(&'a ScoredBatch),
}

/// Score every file and batch against the query.
///
/// Sorting is stable, so equal scores keep their encounter order.
pub fn search(query: &str, files: &[StoredFile], batches: &[BatchEntry]) -> SearchResults {
    let query = query.trim().to_lowercase();

    let mut scored_files: Vec<ScoredFile> = files
        .iter()
        .filter_map(|file| {
            let score = best_field_score(&query, file.display_name.as_deref(), file.caption.as_deref());
            (score > MATCH_THRESHOLD).then(|| ScoredFile {
                file: file.clone(),
                score,
            })
        })
        .collect();
    scored_files.sort_by(|x, y| y.score.cmp(&x.score));

    let mut scored_batches: Vec<ScoredBatch> = batches
        .iter()
        .filter_map(|batch| {
            let mut matching: Vec<ScoredMember> = batch
                .files
                .iter()
                .filter_map(|member| {
                    let score = best_field_score(
                        &query,
                        member.display_name.as_deref(),
                        member.caption.as_deref(),
                    );
                    (score > MATCH_THRESHOLD).then(|| ScoredMember {
                        file: member.clone(),
                        score,
                    })
                })
                .collect();
            if matching.is_empty() {
                return None;
            }
            matching.sort_by(|x, y| y.score.cmp(&x.score));
            let score = matching.iter().map(|m| m.score).max().unwrap_or(0);
            Some(ScoredBatch {
                batch: batch.clone(),
                score,
                matching,
            })
        })
        .collect();
    scored_batches.sort_by(|x, y| y.score.cmp(&x.score));

    SearchResults {
        query,
        files: scored_files,
        batches: scored_batches,
    }
}

fn best_field_score(query: &str, display_name: Option<&str>, caption: Option<&str>) -> u8 {
    [display_name, caption]
        .into_iter()
        .flatten()
        .map(|field| partial_ratio(query, field))
        .max()
        .unwrap_or(0)
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.batches.is_empty()
    }

    fn filtered_counts(&self, filter: ViewFilter) -> (usize, usize) {
        match filter {
            ViewFilter::All => (self.files.len(), self.batches.len()),
            ViewFilter::SinglesOnly => (self.files.len(), 0),
            ViewFilter::BatchesOnly => (0, self.batches.len()),
        }
    }

    pub fn total_pages(&self, filter: ViewFilter) -> usize {
        let (files, batches) = self.filtered_counts(filter);
        ((files + batches).max(1) + PAGE_SIZE - 1) / PAGE_SIZE
    }

    /// Slice out one page: single files first, then batches, the original
    /// presentation order. Out-of-range page numbers clamp to the last page.
    pub fn page(&self, number: usize, filter: ViewFilter) -> Page<'_> {
        let (file_count, batch_count) = self.filtered_counts(filter);
        let total_pages = self.total_pages(filter);
        let number = number.min(total_pages.saturating_sub(1));

        let start = number * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(file_count + batch_count);

        let mut items = Vec::with_capacity(end.saturating_sub(start));
        for index in start..end {
            if index < file_count {
                items.push(PageItem::File(&self.files[index]));
            } else {
                items.push(PageItem::Batch(&self.batches[index - file_count]));
            }
        }
        Page {
            items,
            number,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use filelink_core::FileKind;

    fn file(name: &str, caption: Option<&str>) -> StoredFile {
        StoredFile {
            file_ref: format!("ref-{name}"),
            code: "abc123de".into(),
            kind: FileKind::Document,
            display_name: Some(name.to_string()),
            mime_type: None,
            file_size: None,
            caption: caption.map(str::to_string),
            owner_id: 1,
            created_at: Utc::now(),
        }
    }

    fn batch(code: &str, names: &[&str]) -> BatchEntry {
        BatchEntry {
            code: code.into(),
            files: names
                .iter()
                .map(|name| BatchFile {
                    file_ref: format!("ref-{name}"),
                    kind: FileKind::Video,
                    display_name: Some(name.to_string()),
                    mime_type: None,
                    file_size: None,
                    caption: None,
                })
                .collect(),
            owner_id: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ranking_keeps_matches_and_drops_unrelated_titles() {
        let files = vec![
            file("Avengers Endgame", None),
            file("The Avengers", None),
            file("Iron Man", None),
        ];
        let results = search("avenger", &files, &[]);

        let names: Vec<&str> = results
            .files
            .iter()
            .filter_map(|f| f.file.display_name.as_deref())
            .collect();
        assert!(names.contains(&"Avengers Endgame"));
        assert!(names.contains(&"The Avengers"));
        assert!(!names.contains(&"Iron Man"));

        // Descending by score; ties keep encounter order.
        assert!(results.files.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.files.iter().all(|f| f.score > MATCH_THRESHOLD));
    }

    #[test]
    fn captions_count_as_a_match_field() {
        let files = vec![file("randomly-named.mkv", Some("Avengers Endgame 1080p"))];
        let results = search("avengers", &files, &[]);
        assert_eq!(results.files.len(), 1);
    }

    #[test]
    fn batch_score_is_the_best_member_score() {
        let batches = vec![batch("b1", &["Avengers Endgame", "Some Extras"])];
        let results = search("avengers", &[], &batches);

        assert_eq!(results.batches.len(), 1);
        assert_eq!(results.batches[0].score, 100);
        assert_eq!(results.batches[0].matching.len(), 1);
    }

    #[test]
    fn batches_without_matching_members_drop_out() {
        let batches = vec![batch("b1", &["Iron Man", "Thor"])];
        let results = search("avengers", &[], &batches);
        assert!(results.is_empty());
    }

    #[test]
    fn pages_slice_files_before_batches() {
        let files: Vec<StoredFile> = (0..4).map(|i| file(&format!("Avengers {i}"), None)).collect();
        let batches = vec![
            batch("b1", &["Avengers Extra 1"]),
            batch("b2", &["Avengers Extra 2"]),
        ];
        let results = search("avengers", &files, &batches);

        assert_eq!(results.total_pages(ViewFilter::All), 2);
        let first = results.page(0, ViewFilter::All);
        assert_eq!(first.items.len(), PAGE_SIZE);
        assert!(matches!(first.items[0], PageItem::File(_)));
        assert!(matches!(first.items[4], PageItem::Batch(_)));

        let second = results.page(1, ViewFilter::All);
        assert_eq!(second.items.len(), 1);
        assert!(matches!(second.items[0], PageItem::Batch(_)));
    }

    #[test]
    fn filters_narrow_the_combined_list() {
        let files = vec![file("Avengers", None)];
        let batches = vec![batch("b1", &["Avengers Extra"])];
        let results = search("avengers", &files, &batches);

        let singles = results.page(0, ViewFilter::SinglesOnly);
        assert_eq!(singles.items.len(), 1);
        assert!(matches!(singles.items[0], PageItem::File(_)));

        let batches_page = results.page(0, ViewFilter::BatchesOnly);
        assert_eq!(batches_page.items.len(), 1);
        assert!(matches!(batches_page.items[0], PageItem::Batch(_)));
    }

    #[test]
    fn out_of_range_pages_clamp_to_the_last() {
        let files = vec![file("Avengers", None)];
        let results = search("avengers", &files, &[]);
        let page = results.page(9, ViewFilter::All);
        assert_eq!(page.number, 0);
        assert_eq!(page.items.len(), 1);
    }
}
