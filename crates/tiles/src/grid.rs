//! Grid surface and layout lifecycle.
//!
//! The surface owns the rendered tiles in insertion order; a layout engine is
//! mounted against a snapshot of the surface and must be disposed of and
//! remounted after the contents change.

use crate::record::Record;
use crate::tile::render_tile;

/// Class carried by every appended grid item.
pub const GRID_ITEM_CLASS: &str = "grid-item";

/// Selector the layout engine matches items against.
pub const GRID_ITEM_SELECTOR: &str = ".grid-item";

/// Identifier of the rendering surface's container element.
pub const GRID_CONTAINER_ID: &str = "result";

/// One element of the rendering surface: a class name plus inner markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItem {
    class_name: String,
    html: String,
}

impl GridItem {
    pub fn new(class_name: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            html: html.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// The item's full markup, wrapped in its class-carrying container.
    pub fn to_html(&self) -> String {
        format!("<div class=\"{}\">{}</div>", self.class_name, self.html)
    }
}

/// The rendering surface: an ordered container of grid items.
#[derive(Debug, Clone, Default)]
pub struct GridSurface {
    items: Vec<GridItem>,
}

impl GridSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item at the end of the surface.
    pub fn append(&mut self, item: GridItem) {
        self.items.push(item);
    }

    /// Removes every item from the surface.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[GridItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose class matches a `.class` selector, with their indices.
    pub fn matching<'a>(
        &'a self,
        selector: &'a str,
    ) -> impl Iterator<Item = (usize, &'a GridItem)> + 'a {
        let class = selector.strip_prefix('.').unwrap_or(selector);
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, item)| item.class_name() == class)
    }

    /// The full container markup, items in insertion order.
    pub fn to_html(&self) -> String {
        let mut out = format!("<div class=\"grid\" id=\"{GRID_CONTAINER_ID}\">");
        for item in &self.items {
            out.push_str(&item.to_html());
        }
        out.push_str("</div>");
        out
    }
}

/// A layout engine arranges the items of a grid surface.
///
/// An engine snapshots the surface's matching items when mounted; it does not
/// observe later content changes. After any batch of insertions or removals
/// the current engine must be dropped and a fresh one mounted.
pub trait LayoutEngine: Sized {
    fn mount(surface: &GridSurface, item_selector: &str) -> Self;
}

/// A grid of rendered tiles with an explicitly managed layout engine handle.
#[derive(Debug)]
pub struct GridView<E: LayoutEngine> {
    surface: GridSurface,
    engine: Option<E>,
}

impl<E: LayoutEngine> Default for GridView<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: LayoutEngine> GridView<E> {
    /// Creates an empty view with no mounted engine.
    pub fn new() -> Self {
        Self {
            surface: GridSurface::new(),
            engine: None,
        }
    }

    /// Renders a record as a tile and appends it to the surface. Tiles appear
    /// in push order; the mounted engine (if any) is now stale until
    /// [`GridView::relayout`] is called.
    pub fn push_record(&mut self, record: &Record) {
        self.surface
            .append(GridItem::new(GRID_ITEM_CLASS, render_tile(record)));
    }

    /// Clears the surface. The engine is left in place until the next
    /// relayout, mirroring the destroy-on-relayout lifecycle.
    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Disposes of the current engine and mounts a new one over the current
    /// items. Exactly one engine is constructed per call.
    pub fn relayout(&mut self) {
        self.engine = None;
        self.engine = Some(E::mount(&self.surface, GRID_ITEM_SELECTOR));
    }

    pub fn surface(&self) -> &GridSurface {
        &self.surface
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// The full container markup for the current surface.
    pub fn to_html(&self) -> String {
        self.surface.to_html()
    }
}
