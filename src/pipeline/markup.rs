//! Turn detected PII entities into a redaction markup layer.
//!
//! Each entity carries one or more line groups; each group lists the
//! bounding rectangles of the text lines it covers plus the page coordinate
//! descriptor (`pageData`) those rectangles are expressed in. Every
//! rectangle of an entity's **first** line group becomes one opaque black
//! rectangle annotation. Further line groups (an entity wrapping onto a new
//! line block) are not rendered; they are logged at `warn` so the gap is
//! visible in a run's output.
//!
//! Synthesis is pure. [`upload_markup`] stores the serialised layer as a
//! work file with a generic binary content type and a `json` extension, which
//! is what makes the server parse it as markup.

use crate::error::RedactError;
use crate::pipeline::workfile::WorkFileStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// Timestamp stamped on every generated mark. Not meaningful.
pub const MARK_TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

const MARK_COLOR: &str = "#000000";
const MARK_BORDER_THICKNESS: u32 = 4;
const MARK_OPACITY: u8 = 255;

/// A span of personally identifiable information found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiiEntity {
    /// 0-based page index.
    pub page_index: u32,
    #[serde(default)]
    pub line_groups: Vec<LineGroup>,
    /// Fields the detector reports that redaction does not use (text, type…).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineGroup {
    #[serde(default)]
    pub lines: Vec<Rectangle>,
    /// Page coordinate space; echoed verbatim into each mark.
    #[serde(default)]
    pub page_data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One filled rectangle annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionMark {
    pub uid: String,
    pub interaction_mode: &'static str,
    /// 1-based page number.
    pub page_number: u32,
    #[serde(rename = "type")]
    pub mark_type: &'static str,
    pub creation_date_time: &'static str,
    pub modification_date_time: &'static str,
    pub data: Map<String, Value>,
    pub rectangle: Rectangle,
    pub page_data: Value,
    pub border_color: &'static str,
    pub border_thickness: u32,
    pub fill_color: &'static str,
    pub opacity: u8,
}

impl RedactionMark {
    fn cover(uid: String, page_number: u32, rectangle: Rectangle, page_data: Value) -> Self {
        Self {
            uid,
            interaction_mode: "SelectionDisabled",
            page_number,
            mark_type: "RectangleAnnotation",
            creation_date_time: MARK_TIMESTAMP,
            modification_date_time: MARK_TIMESTAMP,
            data: Map::new(),
            rectangle,
            page_data,
            border_color: MARK_COLOR,
            border_thickness: MARK_BORDER_THICKNESS,
            fill_color: MARK_COLOR,
            opacity: MARK_OPACITY,
        }
    }
}

/// An ordered collection of marks, serialised as `{"marks": [...]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MarkupLayer {
    pub marks: Vec<RedactionMark>,
}

impl MarkupLayer {
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Pretty-printed UTF-8 JSON.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, RedactError> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| RedactError::Internal(format!("Failed to serialise markup: {}", e)))
    }
}

/// Build the markup layer for `entities`, giving each mark a random UUID.
pub fn synthesize_markup(entities: &[PiiEntity]) -> MarkupLayer {
    synthesize_markup_with(entities, || Uuid::new_v4().to_string())
}

/// Build the markup layer, drawing mark identifiers from `next_uid`.
pub fn synthesize_markup_with(
    entities: &[PiiEntity],
    mut next_uid: impl FnMut() -> String,
) -> MarkupLayer {
    let mut marks = Vec::new();

    for (i, entity) in entities.iter().enumerate() {
        let Some(group) = entity.line_groups.first() else {
            warn!("PII entity {} on page index {} has no line groups; skipped", i, entity.page_index);
            continue;
        };
        if entity.line_groups.len() > 1 {
            warn!(
                "PII entity {} on page index {}: only the first of {} line groups is redacted",
                i,
                entity.page_index,
                entity.line_groups.len()
            );
        }

        let page_number = entity.page_index.saturating_add(1);
        marks.extend(group.lines.iter().map(|rect| {
            RedactionMark::cover(next_uid(), page_number, *rect, group.page_data.clone())
        }));
    }

    debug!("Synthesised {} marks from {} entities", marks.len(), entities.len());
    MarkupLayer { marks }
}

/// Store `layer` as a work file and return its id.
pub async fn upload_markup(store: &WorkFileStore, layer: &MarkupLayer) -> Result<String, RedactError> {
    let bytes = layer.to_json_bytes()?;
    store.upload(bytes, "application/octet-stream", "json").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn rect(x: f64) -> Rectangle {
        Rectangle {
            x,
            y: 10.0,
            width: 50.0,
            height: 12.0,
        }
    }

    fn entity(page_index: u32, groups: Vec<Vec<Rectangle>>) -> PiiEntity {
        PiiEntity {
            page_index,
            line_groups: groups
                .into_iter()
                .map(|lines| LineGroup {
                    lines,
                    page_data: json!({ "width": 612, "height": 792 }),
                })
                .collect(),
            extra: Map::new(),
        }
    }

    #[test]
    fn counts_and_page_numbers() {
        let entities = vec![
            entity(0, vec![vec![rect(1.0), rect(2.0)]]),
            entity(3, vec![vec![rect(3.0)]]),
        ];
        let layer = synthesize_markup(&entities);

        assert_eq!(layer.len(), 3);
        let pages: Vec<u32> = layer.marks.iter().map(|m| m.page_number).collect();
        assert_eq!(pages, vec![1, 1, 4]);
        assert_eq!(layer.marks[2].rectangle, rect(3.0));
    }

    #[test]
    fn only_first_line_group_is_used() {
        let entities = vec![entity(1, vec![vec![rect(1.0)], vec![rect(2.0), rect(3.0)]])];
        let layer = synthesize_markup(&entities);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.marks[0].rectangle, rect(1.0));
    }

    #[test]
    fn entities_without_groups_are_skipped() {
        let entities = vec![entity(0, vec![]), entity(5, vec![vec![rect(1.0)]])];
        let layer = synthesize_markup(&entities);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.marks[0].page_number, 6);
    }

    #[test]
    fn last_page_index_does_not_overflow() {
        let layer = synthesize_markup(&[entity(u32::MAX, vec![vec![rect(1.0)]])]);
        assert_eq!(layer.marks[0].page_number, u32::MAX);
    }

    #[test]
    fn styling_is_identical_and_uids_unique() {
        let entities = vec![
            entity(0, vec![vec![rect(1.0), rect(2.0)]]),
            entity(2, vec![vec![rect(3.0), rect(4.0), rect(5.0)]]),
        ];
        let layer = synthesize_markup(&entities);

        for m in &layer.marks {
            assert_eq!(m.mark_type, "RectangleAnnotation");
            assert_eq!(m.interaction_mode, "SelectionDisabled");
            assert_eq!(m.fill_color, "#000000");
            assert_eq!(m.border_color, "#000000");
            assert_eq!(m.border_thickness, 4);
            assert_eq!(m.opacity, 255);
            assert_eq!(m.creation_date_time, MARK_TIMESTAMP);
            assert_eq!(m.modification_date_time, MARK_TIMESTAMP);
        }
        let uids: HashSet<&str> = layer.marks.iter().map(|m| m.uid.as_str()).collect();
        assert_eq!(uids.len(), layer.len());
    }

    #[test]
    fn serialised_shape_matches_markup_format() {
        let entities = vec![entity(0, vec![vec![rect(7.0)]])];
        let layer = synthesize_markup_with(&entities, || "uid-1".to_string());
        let value: Value = serde_json::from_slice(&layer.to_json_bytes().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "marks": [{
                    "uid": "uid-1",
                    "interactionMode": "SelectionDisabled",
                    "pageNumber": 1,
                    "type": "RectangleAnnotation",
                    "creationDateTime": MARK_TIMESTAMP,
                    "modificationDateTime": MARK_TIMESTAMP,
                    "data": {},
                    "rectangle": { "x": 7.0, "y": 10.0, "width": 50.0, "height": 12.0 },
                    "pageData": { "width": 612, "height": 792 },
                    "borderColor": "#000000",
                    "borderThickness": 4,
                    "fillColor": "#000000",
                    "opacity": 255
                }]
            })
        );
    }

    #[test]
    fn entity_keeps_unknown_fields() {
        let e: PiiEntity = serde_json::from_value(json!({
            "pageIndex": 0,
            "text": "555-12-3456",
            "lineGroups": []
        }))
        .unwrap();
        assert_eq!(e.extra.get("text"), Some(&json!("555-12-3456")));
    }

    #[test]
    fn empty_input_gives_empty_layer() {
        let layer = synthesize_markup(&[]);
        assert!(layer.is_empty());
        let value: Value = serde_json::from_slice(&layer.to_json_bytes().unwrap()).unwrap();
        assert_eq!(value, json!({ "marks": [] }));
    }
}
