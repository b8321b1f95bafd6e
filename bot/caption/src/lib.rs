//! Caption pipeline.
//!
//! Two pure stages: [`clean_caption`] strips configured terms (and, when
//! link saving is off, [`strip_links`] removes URLs) before a caption is
//! stored; [`decorate_caption`] rebuilds the outgoing HTML caption from the
//! stored text and the current prefix at delivery time.

mod clean;
mod decorate;

pub use clean::{clean_caption, strip_links};
pub use decorate::{decorate_caption, FALLBACK_LINE};
