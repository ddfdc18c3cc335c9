//! Card markup assembly for a single record.

use crate::flatten::flatten;
use crate::record::{Record, Value};

/// Metadata field naming the tile's title.
const TILE_FIELD: &str = "tile";

/// Metadata field naming the tile's creator.
const CREATOR_FIELD: &str = "creator";

/// Renders a record as a card: title from `_metadata.tile`, body from the
/// flattened record, footer from `_metadata.creator`.
///
/// Absent metadata, or absent title/creator fields, render as the empty
/// string rather than failing; a present `null` renders as literal `null`
/// like any other scalar. Like the flattener, nothing is escaped.
pub fn render_tile(record: &Record) -> String {
    let title = metadata_text(record, TILE_FIELD);
    let creator = metadata_text(record, CREATOR_FIELD);
    format!(
        "<div class=\"card\"><div class=\"card-body\"><h5 class=\"card-title\">{title}</h5>\
         <p class=\"card-text\">{body}</p>\
         <p class=\"card-text\"><small class=\"text-muted\">Created by {creator}</small></p>\
         </div></div>",
        body = flatten(record),
    )
}

/// Looks up a scalar metadata field, defaulting to empty text when the
/// metadata record or the field is missing or not a scalar.
fn metadata_text(record: &Record, field: &str) -> String {
    record
        .metadata()
        .and_then(|meta| meta.get(field))
        .and_then(Value::as_scalar)
        .map(|scalar| scalar.to_string())
        .unwrap_or_default()
}
