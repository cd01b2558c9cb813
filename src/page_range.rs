use crate::error::{Result, SidecarError};
use serde::Serialize;
use std::collections::BTreeSet;

/// Zero-based page indices: unique, ascending, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageSelection(Vec<u32>);

impl PageSelection {
    /// Normalize arbitrary indices. Returns `None` when nothing is selected.
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Option<Self> {
        let set: BTreeSet<u32> = indices.into_iter().collect();
        if set.is_empty() {
            None
        } else {
            Some(Self(set.into_iter().collect()))
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined form passed to the extraction worker, e.g. `0,1,7`.
    pub fn to_arg(&self) -> String {
        self.0
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Turn user text like `"1-5, 8, 11-13"` into sorted zero-based indices.
///
/// Pages are 1-based in the input and must fall within `1..=page_count`.
/// Reversed ranges are normalized; unparseable segments are skipped.
/// In a hyphenated segment only the first two pieces count and an empty piece
/// reads as 0, so `"-3"` selects pages 1 to 3 and `"1-3-5"` reads as `"1-3"`.
pub fn parse_range(text: &str, page_count: u32) -> Vec<u32> {
    let max = i64::from(page_count);
    let mut pages = BTreeSet::new();

    for segment in text.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        if segment.contains('-') {
            let mut pieces = segment.split('-').map(range_end);
            let (Some(Some(a)), Some(Some(b))) = (pieces.next(), pieces.next()) else {
                continue;
            };
            let low = a.min(b).max(1);
            let high = a.max(b).min(max);
            for page in low..=high {
                pages.insert((page - 1) as u32);
            }
        } else if let Ok(page) = segment.parse::<i64>() {
            if (1..=max).contains(&page) {
                pages.insert((page - 1) as u32);
            }
        }
    }

    pages.into_iter().collect()
}

fn range_end(piece: &str) -> Option<i64> {
    let piece = piece.trim();
    if piece.is_empty() {
        Some(0)
    } else {
        piece.parse().ok()
    }
}

/// Like [`parse_range`], but an empty result is an error so extraction is never
/// dispatched with zero pages.
pub fn parse_selection(text: &str, page_count: u32) -> Result<PageSelection> {
    PageSelection::from_indices(parse_range(text, page_count)).ok_or_else(|| {
        SidecarError::InvalidRange {
            input: text.to_string(),
            page_count,
        }
    })
}

