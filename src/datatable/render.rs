use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::database::{row_id, RelatedRow, Row};
use crate::entity::{Entity, FieldLink};
use crate::views::escape;

/// Longer strings are cut and suffixed with `..`
pub const MAX_TEXT_CHARS: usize = 120;

/// Link to another row, shown as a badge
pub fn badge(entity: &str, id: i64, label: &str) -> String {
    format!(
        "<a class=\"m-1 py-1 px-2 badge bg-blue-lt lead\" href=\"/{}/{}\">{}</a>",
        escape(entity),
        id,
        escape(label)
    )
}

pub fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((cut, _)) => format!("{}..", &text[..cut]),
        None => text.to_string(),
    }
}

/// Lookups resolved for one page of rows
#[derive(Debug, Default)]
pub struct PageContext {
    /// field -> (referenced id -> label)
    pub labels: HashMap<String, IndexMap<i64, String>>,
    /// field -> (owner id -> related rows)
    pub related: HashMap<String, HashMap<i64, Vec<RelatedRow>>>,
}

/// Table cells of one row, keyed by schema field
pub fn render_row(entity: &Entity, row: &Row, context: &PageContext) -> Map<String, Value> {
    let mut out = Map::new();
    for name in entity.schema.fields.keys() {
        let value = row.get(name);
        let cell = match (name.as_str(), entity.link(name)) {
            ("id", _) => match value.and_then(Value::as_i64) {
                Some(id) => Value::String(badge(&entity.name, id, &id.to_string())),
                None => value.cloned().unwrap_or(Value::Null),
            },
            (_, Some(FieldLink::Reference { target })) => match value.and_then(Value::as_i64) {
                Some(id) => {
                    let label = context
                        .labels
                        .get(name)
                        .and_then(|labels| labels.get(&id))
                        .cloned()
                        .unwrap_or_else(|| id.to_string());
                    Value::String(badge(target, id, &label))
                }
                None => Value::Null,
            },
            (_, Some(FieldLink::Reverse { target, .. })) => {
                let badges: Vec<String> = row_id(row)
                    .and_then(|id| context.related.get(name).and_then(|by_owner| by_owner.get(&id)))
                    .map(|rows| rows.iter().map(|r| badge(target, r.id, &r.label)).collect())
                    .unwrap_or_default();
                Value::String(badges.join(" "))
            }
            (_, None) => match value {
                Some(Value::String(text)) => Value::String(escape(&truncate(text))),
                Some(other) => other.clone(),
                None => Value::Null,
            },
        };
        out.insert(name.clone(), cell);
    }
    out
}
