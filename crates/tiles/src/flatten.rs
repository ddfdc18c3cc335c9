//! Recursive record-to-markup flattening.

use std::fmt::Write;

use crate::record::{Record, Value, METADATA_KEY};

/// Flattens a record into a single HTML fragment, one labelled line per
/// entry, in insertion order.
///
/// Scalar entries render as `<b>key:</b> value<br>`. Nested entries render
/// their label on its own line followed by the recursively flattened
/// sub-record inside an indented `<p class="tab">` block. Entries under
/// [`METADATA_KEY`] are skipped; they are consumed by the tile builder, not
/// rendered as fields. An empty record flattens to the empty string.
///
/// Keys and values are inserted verbatim, without HTML escaping, so the
/// output is only as trustworthy as the record supplied. Recursion depth is
/// unbounded; record ownership makes cyclic inputs unrepresentable.
pub fn flatten(record: &Record) -> String {
    let mut out = String::new();
    for (key, value) in record.iter() {
        if key == METADATA_KEY {
            continue;
        }
        match value {
            Value::Scalar(scalar) => {
                let _ = write!(out, "<b>{key}:</b> {scalar}<br>");
            }
            Value::Nested(sub) => {
                let _ = write!(out, "<b>{key}:</b><br><p class=\"tab\">{}</p>", flatten(sub));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(tile: &str, creator: &str) -> Value {
        let mut meta = Record::new();
        meta.insert("tile", Value::text(tile));
        meta.insert("creator", Value::text(creator));
        Value::Nested(meta)
    }

    #[test]
    fn empty_record_flattens_to_empty_string() {
        assert_eq!(flatten(&Record::new()), "");
    }

    #[test]
    fn flat_record_renders_one_line_per_key_in_order() {
        let mut record = Record::new();
        record.insert("wind", Value::text("12 km/h"));
        record.insert("humidity", Value::integer(81));
        record.insert("raining", Value::bool(false));
        assert_eq!(
            flatten(&record),
            "<b>wind:</b> 12 km/h<br><b>humidity:</b> 81<br><b>raining:</b> false<br>"
        );
    }

    #[test]
    fn scalar_entry_with_metadata_sibling() {
        let mut record = Record::new();
        record.insert("name", Value::text("Alice"));
        record.insert(METADATA_KEY, metadata("T", "C"));
        assert_eq!(flatten(&record), "<b>name:</b> Alice<br>");
    }

    #[test]
    fn nested_entry_renders_an_indented_block() {
        let mut inner = Record::new();
        inner.insert("b", Value::text("x"));
        let mut record = Record::new();
        record.insert("a", Value::Nested(inner));
        record.insert(METADATA_KEY, metadata("T", "C"));
        assert_eq!(
            flatten(&record),
            "<b>a:</b><br><p class=\"tab\"><b>b:</b> x<br></p>"
        );
    }

    #[test]
    fn nesting_recurses_to_arbitrary_depth() {
        let record: Record =
            serde_json::from_str(r#"{"a":{"b":{"c":"deep"}}}"#).expect("parse");
        assert_eq!(
            flatten(&record),
            "<b>a:</b><br><p class=\"tab\"><b>b:</b><br><p class=\"tab\"><b>c:</b> deep<br></p></p>"
        );
    }

    #[test]
    fn metadata_key_is_skipped_wherever_it_appears() {
        let mut record = Record::new();
        record.insert(METADATA_KEY, metadata("T", "C"));
        record.insert("after", Value::text("still here"));
        assert_eq!(flatten(&record), "<b>after:</b> still here<br>");

        // A scalar under the reserved key is skipped too.
        let mut record = Record::new();
        record.insert(METADATA_KEY, Value::text("stray"));
        assert_eq!(flatten(&record), "");
    }

    #[test]
    fn null_renders_as_literal_text() {
        let mut record = Record::new();
        record.insert("absent", Value::null());
        assert_eq!(flatten(&record), "<b>absent:</b> null<br>");
    }

    #[test]
    fn values_are_not_escaped() {
        let mut record = Record::new();
        record.insert("markup", Value::text("<i>raw</i>"));
        assert_eq!(flatten(&record), "<b>markup:</b> <i>raw</i><br>");
    }
}
