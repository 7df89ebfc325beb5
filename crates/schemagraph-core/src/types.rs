//! Graph value types shared by pieces and the assembler

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

/// The vocabulary every emitted graph is written against.
pub const SCHEMA_CONTEXT: &str = "https://schema.org";

/// A node in the output graph
///
/// Fields keep insertion order, so a node serializes the same way every time
/// it is built from the same input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaNode(Map<String, JsonValue>);

impl SchemaNode {
    /// Start a node with its `@type`.
    pub fn new(schema_type: impl Into<JsonValue>) -> Self {
        let mut fields = Map::new();
        fields.insert("@type".to_string(), schema_type.into());
        Self(fields)
    }

    /// Builder-style [`SchemaNode::set`].
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Set `key` only when `value` is a non-empty string.
    pub fn set_non_empty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.set(key, value);
        }
    }

    /// Append to a list field, creating it on first use.
    pub fn push(&mut self, key: &str, value: impl Into<JsonValue>) {
        let entry = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Array(Vec::new()));
        match entry {
            JsonValue::Array(items) => items.push(value.into()),
            existing => {
                let old = existing.take();
                *existing = JsonValue::Array(vec![old, value.into()]);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The node's `@id`, if it has one.
    pub fn id(&self) -> Option<&str> {
        self.0.get("@id").and_then(JsonValue::as_str)
    }

    /// Whether `@type` is `schema_type` or a list containing it.
    pub fn has_type(&self, schema_type: &str) -> bool {
        match self.0.get("@type") {
            Some(JsonValue::String(t)) => t == schema_type,
            Some(JsonValue::Array(types)) => types.iter().any(|t| t.as_str() == Some(schema_type)),
            _ => false,
        }
    }

    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }
}

impl From<SchemaNode> for JsonValue {
    fn from(node: SchemaNode) -> Self {
        node.into_value()
    }
}

/// A by-reference link to another node: `{"@id": "..."}`.
pub fn reference(id: &str) -> JsonValue {
    json!({ "@id": id })
}

/// A piece that failed during a build and was left out of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieceFailure {
    pub piece: String,
    pub message: String,
}

/// The result of one graph build
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    pub nodes: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PieceFailure>,
    /// `@id`s emitted more than once; only the first node was kept.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_ids: Vec<String>,
    /// Referenced `@id`s that no node in the graph carries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dangling_references: Vec<String>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by `@id`.
    pub fn node(&self, id: &str) -> Option<&SchemaNode> {
        self.nodes.iter().find(|node| node.id() == Some(id))
    }

    pub fn nodes_of_type<'a>(&'a self, schema_type: &'a str) -> impl Iterator<Item = &'a SchemaNode> {
        self.nodes.iter().filter(move |node| node.has_type(schema_type))
    }

    /// Render the graph as a JSON-LD document.
    pub fn to_json_ld(&self) -> JsonValue {
        let graph: Vec<JsonValue> = self.nodes.iter().cloned().map(SchemaNode::into_value).collect();
        json!({
            "@context": SCHEMA_CONTEXT,
            "@graph": graph,
        })
    }

    /// Render the graph as a `<script type="application/ld+json">` element.
    ///
    /// Returns an empty string for an empty graph so callers can skip the tag.
    pub fn to_script_tag(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let payload = self.to_json_ld().to_string().replace("</", "<\\/");
        format!("<script type=\"application/ld+json\">{payload}</script>")
    }
}
