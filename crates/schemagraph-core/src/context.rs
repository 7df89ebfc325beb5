//! The read-only page snapshot every piece works from

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Identifier of the page entity, or of an author-supplied anchor.
///
/// Content sources hand these out either as numbers or as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Numeric(n) => write!(f, "{n}"),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        EntityId::Numeric(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

/// One inline rich-text token: plain text or a typed element such as an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InlineToken {
    Text(String),
    Element {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        props: Map<String, JsonValue>,
    },
    Other(JsonValue),
}

impl InlineToken {
    fn is_blank(&self) -> bool {
        match self {
            InlineToken::Text(text) => text.is_empty(),
            InlineToken::Other(value) => is_empty_value(value),
            InlineToken::Element { .. } => false,
        }
    }

    /// The `src` of an `img` element token.
    pub fn image_src(&self) -> Option<&str> {
        match self {
            InlineToken::Element { kind, props } if kind == "img" => {
                props.get("src").and_then(JsonValue::as_str)
            }
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRichText {
    Tokens(Vec<InlineToken>),
    Single(InlineToken),
}

/// A sequence of inline tokens.
///
/// Accepts a list of tokens or a single string/element when deserialized.
/// Blank tokens (empty strings, nulls) are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRichText")]
pub struct RichText(Vec<InlineToken>);

impl From<RawRichText> for RichText {
    fn from(raw: RawRichText) -> Self {
        let tokens = match raw {
            RawRichText::Tokens(tokens) => tokens,
            RawRichText::Single(token) => vec![token],
        };
        RichText::new(tokens)
    }
}

impl RichText {
    pub fn new(tokens: Vec<InlineToken>) -> Self {
        Self(tokens.into_iter().filter(|token| !token.is_blank()).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[InlineToken] {
        &self.0
    }

    /// The last image in the sequence, when there is one.
    pub fn last_image_src(&self) -> Option<&str> {
        self.0.iter().rev().find_map(InlineToken::image_src)
    }
}

/// A structured unit of page content (one how-to, one FAQ, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "blockName", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub attrs: Map<String, JsonValue>,
    #[serde(default)]
    pub inline: RichText,
}

impl ContentBlock {
    /// Build a block from a JSON object of attributes; non-objects give no attributes.
    pub fn new(name: impl Into<String>, attrs: JsonValue) -> Self {
        let attrs = match attrs {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            name: name.into(),
            attrs,
            inline: RichText::default(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&JsonValue> {
        self.attrs.get(key)
    }

    /// String attribute; numbers are rendered, other types read as absent.
    pub fn attr_text(&self, key: &str) -> Option<String> {
        self.attr(key).and_then(value_text)
    }

    /// Whether the attribute holds a non-empty value.
    pub fn attr_truthy(&self, key: &str) -> bool {
        self.attr(key).is_some_and(|value| !is_empty_value(value))
    }

    pub fn attr_list(&self, key: &str) -> Option<&Vec<JsonValue>> {
        self.attr(key).and_then(JsonValue::as_array)
    }
}

/// Loose emptiness as content sources use it: absent-like values, `false`,
/// zero, `""`, `"0"` and empty collections are all empty.
pub fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty() || s == "0",
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
    }
}

/// Scalar value as text; collections and null have none.
pub fn value_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(true) => Some("1".to_string()),
        JsonValue::Bool(false) => Some(String::new()),
        _ => None,
    }
}

/// Read a typed attribute field with the same leniency as [`value_text`].
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(value_text(&JsonValue::deserialize(deserializer)?))
}

/// Snapshot of everything known about the page being described.
///
/// Built by the caller before assembly and never changed while a graph is
/// being built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub canonical: String,
    pub id: EntityId,
    #[serde(alias = "mainSchemaId")]
    pub main_schema_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub blocks: HashMap<String, Vec<ContentBlock>>,
}

impl Context {
    pub fn new(
        canonical: impl Into<String>,
        id: impl Into<EntityId>,
        main_schema_id: impl Into<String>,
    ) -> Self {
        Self {
            canonical: canonical.into(),
            id: id.into(),
            main_schema_id: main_schema_id.into(),
            title: String::new(),
            language: None,
            blocks: HashMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Append a block under its own name, after any block already there.
    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.blocks.entry(block.name.clone()).or_default().push(block);
        self
    }

    /// Blocks of one type in discovery order.
    pub fn blocks(&self, kind: &str) -> &[ContentBlock] {
        self.blocks.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_blocks(&self, kind: &str) -> bool {
        !self.blocks(kind).is_empty()
    }

    /// Parse a context from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check the facts every piece relies on.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.canonical).map_err(|source| Error::InvalidCanonical {
            url: self.canonical.clone(),
            source,
        })?;

        if self.main_schema_id.trim().is_empty() {
            return Err(Error::MissingMainSchemaId);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_from_json() {
        let context: Context = serde_json::from_value(json!({
            "canonical": "https://x.test/p",
            "id": 42,
            "mainSchemaId": "https://x.test/p#webpage",
            "title": "Bread",
            "blocks": {
                "how-to": [
                    {"blockName": "how-to", "attrs": {"hasDuration": true}}
                ]
            }
        }))
        .unwrap();

        assert_eq!(context.id, EntityId::Numeric(42));
        assert_eq!(context.main_schema_id, "https://x.test/p#webpage");
        assert_eq!(context.blocks("how-to").len(), 1);
        assert!(context.blocks("faq").is_empty());
        assert!(context.validate().is_ok());
    }

    #[test]
    fn test_from_json_reports_json_errors() {
        assert!(matches!(Context::from_json("{"), Err(Error::Json(_))));
        let context = Context::from_json(
            r#"{"canonical": "https://x.test/", "id": "home", "main_schema_id": "https://x.test/#webpage"}"#,
        )
        .unwrap();
        assert_eq!(context.id, EntityId::from("home"));
        assert!(context.blocks.is_empty());
    }

    #[test]
    fn test_validate_rejects_relative_canonical() {
        let context = Context::new("/p", 1u64, "#webpage");
        assert!(matches!(
            context.validate(),
            Err(Error::InvalidCanonical { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_main_schema_id() {
        let context = Context::new("https://x.test/p", "page-1", " ");
        assert!(matches!(context.validate(), Err(Error::MissingMainSchemaId)));
    }

    #[test]
    fn test_with_block_keeps_discovery_order() {
        let context = Context::new("https://x.test/p", 1u64, "https://x.test/p#webpage")
            .with_block(ContentBlock::new("faq", json!({"order": 1})))
            .with_block(ContentBlock::new("faq", json!({"order": 2})));

        let orders: Vec<_> = context
            .blocks("faq")
            .iter()
            .map(|block| block.attr_text("order"))
            .collect();
        assert_eq!(orders, vec![Some("1".to_string()), Some("2".to_string())]);
    }

    #[test]
    fn test_empty_values() {
        for value in [json!(null), json!(false), json!(0), json!(""), json!("0"), json!([]), json!({})] {
            assert!(is_empty_value(&value), "{value} should be empty");
        }
        for value in [json!(true), json!(1), json!("a"), json!([0])] {
            assert!(!is_empty_value(&value), "{value} should not be empty");
        }
    }

    #[test]
    fn test_rich_text_from_string_or_tokens() {
        let single: RichText = serde_json::from_value(json!("Knead the dough")).unwrap();
        assert_eq!(single.tokens(), &[InlineToken::Text("Knead the dough".to_string())]);

        let tokens: RichText = serde_json::from_value(json!([
            "Look: ",
            {"type": "img", "props": {"src": "https://x.test/a.png"}},
            {"type": "strong", "props": {"children": ["here"]}},
            {"type": "img", "props": {"src": "https://x.test/b.png"}}
        ]))
        .unwrap();
        assert_eq!(tokens.tokens().len(), 4);
        assert_eq!(tokens.last_image_src(), Some("https://x.test/b.png"));
    }

    #[test]
    fn test_rich_text_drops_blank_tokens() {
        let text: RichText = serde_json::from_value(json!(["", null])).unwrap();
        assert!(text.is_empty());

        let null: RichText = serde_json::from_value(json!(null)).unwrap();
        assert!(null.is_empty());
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::from(7u64).to_string(), "7");
        assert_eq!(EntityId::from("step-1").to_string(), "step-1");
    }
}
