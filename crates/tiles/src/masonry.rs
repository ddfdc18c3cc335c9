//! Shortest-column masonry packing.

use crate::grid::{GridSurface, LayoutEngine};

/// Column count used when mounting through the [`LayoutEngine`] trait.
pub const DEFAULT_COLUMN_COUNT: usize = 3;

/// A masonry arrangement of grid items.
///
/// Items are taken in surface order and each is placed into the currently
/// shortest column, so variable-height tiles pack without large gaps. Heights
/// are estimated from the item markup's line count. The arrangement is a
/// snapshot: it does not track later surface changes.
#[derive(Debug, Clone)]
pub struct MasonryLayout {
    columns: Vec<Vec<usize>>,
    heights: Vec<usize>,
}

impl MasonryLayout {
    /// Packs the surface's matching items into `column_count` columns.
    pub fn pack(surface: &GridSurface, item_selector: &str, column_count: usize) -> Self {
        let column_count = column_count.max(1);
        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); column_count];
        let mut heights: Vec<usize> = vec![0; column_count];

        for (index, item) in surface.matching(item_selector) {
            let shortest = heights
                .iter()
                .enumerate()
                .min_by_key(|(_, height)| **height)
                .map(|(column, _)| column)
                .unwrap_or(0);
            columns[shortest].push(index);
            heights[shortest] += estimate_height(item.html());
        }

        Self { columns, heights }
    }

    /// Item indices per column, in placement order.
    pub fn columns(&self) -> &[Vec<usize>] {
        &self.columns
    }

    /// Estimated height per column.
    pub fn column_heights(&self) -> &[usize] {
        &self.heights
    }

    /// Total number of placed items.
    pub fn item_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }
}

impl LayoutEngine for MasonryLayout {
    fn mount(surface: &GridSurface, item_selector: &str) -> Self {
        Self::pack(surface, item_selector, DEFAULT_COLUMN_COUNT)
    }
}

/// Estimates an item's rendered height in lines from its markup: one line per
/// explicit break or closed paragraph, plus one for the card chrome.
fn estimate_height(html: &str) -> usize {
    html.matches("<br>").count() + html.matches("</p>").count() + 1
}
