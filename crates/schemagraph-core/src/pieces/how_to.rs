//! `HowTo` nodes from how-to blocks

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use super::SchemaPiece;
use crate::context::{ContentBlock, Context, EntityId, RichText, is_empty_value, lenient_text};
use crate::error::{Error, Result};
use crate::image::ImageResolver;
use crate::sanitizer::{HtmlSanitizer, escape_attr, strip_tags_smart};
use crate::types::{SchemaNode, reference};
use crate::url_utils::{anchor_id, fragment_id, resolve_image_url};

/// Block type the piece reads.
pub const HOW_TO_BLOCK: &str = "how-to";

/// Emits one `HowTo` node per how-to block, with its steps inline.
#[derive(Debug, Clone, Default)]
pub struct HowTo {
    html: HtmlSanitizer,
    images: ImageResolver,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepAttrs {
    id: EntityId,
    #[serde(default, deserialize_with = "lenient_text")]
    json_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    json_text: Option<String>,
    #[serde(default)]
    text: RichText,
}

impl HowTo {
    pub fn new(html: HtmlSanitizer, images: ImageResolver) -> Self {
        Self { html, images }
    }

    fn how_to_node(
        &self,
        context: &Context,
        name: &str,
        index: usize,
        block: &ContentBlock,
    ) -> SchemaNode {
        let mut node = SchemaNode::new("HowTo")
            .with(
                "@id",
                fragment_id(&context.canonical, &format!("howto-{}", index + 1)),
            )
            .with("name", name)
            .with("mainEntityOfPage", reference(&context.main_schema_id));

        let description = block
            .attr_text("jsonDescription")
            .map(|raw| self.html.sanitize(&raw))
            .unwrap_or_default();
        node.set("description", description);

        if let Some(language) = context.language.as_deref() {
            node.set("inLanguage", language);
        }

        if let Some(total_time) = total_time(block) {
            node.set("totalTime", total_time);
        }

        for step in self.steps(context, block) {
            node.push("step", step);
        }

        node
    }

    fn steps(&self, context: &Context, block: &ContentBlock) -> Vec<SchemaNode> {
        let Some(raw_steps) = block.attr_list("steps") else {
            if block.attr("steps").is_some() {
                let err = Error::malformed(HOW_TO_BLOCK, "steps is not a list");
                tracing::debug!(page = %context.id, error = %err, "ignoring how-to steps");
            }
            return Vec::new();
        };

        raw_steps
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| match StepAttrs::deserialize(raw) {
                Ok(step) => self.step_node(context, &step),
                Err(err) => {
                    let err = Error::malformed(HOW_TO_BLOCK, format!("step {position}: {err}"));
                    tracing::debug!(page = %context.id, error = %err, "skipping unreadable how-to step");
                    None
                }
            })
            .collect()
    }

    fn step_node(&self, context: &Context, step: &StepAttrs) -> Option<SchemaNode> {
        let mut node = SchemaNode::new("HowToStep")
            .with("url", anchor_id(&context.canonical, &step.id.to_string()));

        let json_text = step
            .json_text
            .as_deref()
            .map(|raw| self.html.sanitize(raw))
            .unwrap_or_default();
        let json_name = step
            .json_name
            .as_deref()
            .map(strip_tags_smart)
            .unwrap_or_default();

        if json_name.is_empty() {
            if step.text.is_empty() {
                return None;
            }

            let image = self.step_image(context, &step.text);
            if json_text.is_empty() && image.is_none() {
                return None;
            }

            node.set_non_empty("text", &json_text);
            if let Some(image) = image {
                node.set("image", image);
            }
        } else if json_text.is_empty() {
            node.set("text", json_name);
        } else {
            node.set("name", json_name);
            node.set(
                "itemListElement",
                json!([{ "@type": "HowToDirection", "text": json_text }]),
            );
            if let Some(image) = self.step_image(context, &step.text) {
                node.set("image", image);
            }
        }

        Some(node)
    }

    fn step_image(&self, context: &Context, text: &RichText) -> Option<SchemaNode> {
        let src = text.last_image_src()?;
        let Some(url) = resolve_image_url(&context.canonical, src) else {
            tracing::debug!(page = %context.id, src, "step image source is not a usable URL");
            return None;
        };

        let schema_id = ImageResolver::schema_id_for(&context.canonical, &url);
        Some(
            self.images
                .generate_from_url(&schema_id, &url, context.language.as_deref()),
        )
    }
}

impl SchemaPiece for HowTo {
    fn name(&self) -> &'static str {
        "HowTo"
    }

    fn is_needed(&self, context: &Context) -> bool {
        context.has_blocks(HOW_TO_BLOCK)
    }

    fn generate(&self, context: &Context) -> Result<Vec<SchemaNode>> {
        let name = strip_tags_smart(&context.title);
        Ok(context
            .blocks(HOW_TO_BLOCK)
            .iter()
            .enumerate()
            .map(|(index, block)| self.how_to_node(context, &name, index, block))
            .collect())
    }
}

/// `P<d>DT<h>H<m>M` when the block has a duration adding up to more than zero.
///
/// Values go into the template as written; 90 minutes stays `90M`.
fn total_time(block: &ContentBlock) -> Option<String> {
    if !block.attr_truthy("hasDuration") {
        return None;
    }

    let days = DurationPart::read(block, "days");
    let hours = DurationPart::read(block, "hours");
    let minutes = DurationPart::read(block, "minutes");

    if days.amount + hours.amount + minutes.amount > 0.0 {
        Some(escape_attr(&format!(
            "P{}DT{}H{}M",
            days.literal, hours.literal, minutes.literal
        )))
    } else {
        None
    }
}

struct DurationPart {
    literal: String,
    amount: f64,
}

impl DurationPart {
    fn zero() -> Self {
        Self {
            literal: "0".to_string(),
            amount: 0.0,
        }
    }

    /// Numbers and numeric strings count; anything else reads as zero.
    fn read(block: &ContentBlock, key: &str) -> Self {
        let Some(value) = block.attr(key).filter(|value| !is_empty_value(value)) else {
            return Self::zero();
        };

        match value {
            JsonValue::Number(n) => Self {
                literal: n.to_string(),
                amount: n.as_f64().unwrap_or_default(),
            },
            JsonValue::String(s) => match s.trim().parse::<f64>() {
                Ok(amount) => Self {
                    literal: s.trim().to_string(),
                    amount,
                },
                Err(_) => Self::zero(),
            },
            _ => Self::zero(),
        }
    }
}
