//! # Mosaic Tiles
//!
//! Renders nested key/value records as card-styled HTML tiles on a masonry
//! grid surface.
//!
//! The crate is pure assembly: records flatten to labelled HTML fragments,
//! fragments wrap into cards, cards land on a [`GridSurface`] in insertion
//! order, and a [`LayoutEngine`] is mounted over the result on demand. There
//! is no I/O and no shared state; every render call works on data it owns.
//!
//! **No HTML escaping is performed anywhere in this crate.** Keys and values
//! are inserted into the output verbatim, so records built from untrusted
//! input can inject arbitrary markup. Callers that render third-party data
//! accept that data's markup as-is.

pub mod flatten;
pub mod grid;
pub mod masonry;
pub mod record;
pub mod tile;

pub use flatten::flatten;
pub use grid::{
    GridItem, GridSurface, GridView, LayoutEngine, GRID_CONTAINER_ID, GRID_ITEM_CLASS,
    GRID_ITEM_SELECTOR,
};
pub use masonry::MasonryLayout;
pub use record::{Record, Scalar, Value, METADATA_KEY};
pub use tile::render_tile;
