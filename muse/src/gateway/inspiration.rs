//! Search-grounded design inspiration.
//!
//! The text model is asked for a JSON array of ideas under a response schema,
//! with web search enabled. Models still occasionally wrap the array in a code
//! fence or a sentence of preamble, so parsing falls back to scanning for the
//! first embedded JSON array of objects before giving up.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::{ModelRole, Studio};
use crate::credential::Requirement;
use crate::error::{Error, Result};
use crate::providers::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GroundingChunk,
    Part, Tool,
};
use crate::providers::{Connector, GenerationService};

/// Number of ideas requested per search.
pub const INSPIRATION_IDEA_COUNT: usize = 3;

/// One creative concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspirationItem {
    /// Short title.
    pub title: String,
    /// Description of the concept.
    pub content: String,
}

/// A web page the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReference {
    /// Page title, or the URI when the service gave none.
    pub title: String,
    /// Page URI.
    pub uri: String,
}

/// Result of an inspiration search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspiration {
    /// The ideas, in the order returned.
    pub ideas: Vec<InspirationItem>,
    /// Grounding sources; may be empty.
    pub sources: Vec<SourceReference>,
}

impl<C: Connector> Studio<C> {
    /// Ask for design ideas on a topic, grounded in web search.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if no credential resolves
    /// - [`Error::GenerationRequest`] if the service rejects the request
    /// - [`Error::MalformedResponse`] if the answer is missing or is not a
    ///   list of `{title, content}` objects
    #[instrument(skip(self))]
    pub async fn search_inspiration(&self, query: &str) -> Result<Inspiration> {
        let service = self.connect(Requirement::Configured).await?;

        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(inspiration_prompt(query))])],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_schema: Some(inspiration_schema()),
                image_config: None,
            }),
            tools: vec![Tool::google_search()],
        };

        let response = service
            .generate_content(self.model(ModelRole::Text), &request)
            .await?;
        let inspiration = parse_inspiration(&response)?;
        info!(
            ideas = inspiration.ideas.len(),
            sources = inspiration.sources.len(),
            "inspiration found"
        );
        Ok(inspiration)
    }
}

fn inspiration_prompt(query: &str) -> String {
    format!(
        "Please provide {INSPIRATION_IDEA_COUNT} creative graphic design or video concept ideas \
         based on this topic: \"{query}\".\n\
         Format the output as a JSON array of objects with 'title' and 'content' fields.\n\
         Focus on visual style, color palettes, and composition."
    )
}

fn inspiration_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "content": { "type": "STRING" }
            },
            "required": ["title", "content"]
        }
    })
}

fn parse_inspiration(response: &GenerateContentResponse) -> Result<Inspiration> {
    let text = response.text().ok_or_else(|| {
        Error::malformed(match response.stop_reason() {
            Some(reason) => format!("no text in inspiration response ({reason})"),
            None => "no text in inspiration response".to_string(),
        })
    })?;

    let ideas = parse_ideas(&text)?;
    if ideas.len() != INSPIRATION_IDEA_COUNT {
        warn!(count = ideas.len(), "unexpected number of ideas");
    }

    Ok(Inspiration {
        ideas,
        sources: sources(response.grounding_chunks()),
    })
}

/// Strict JSON first, then the first array embedded in the text.
fn parse_ideas(text: &str) -> Result<Vec<InspirationItem>> {
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(strict) => {
            let value = embedded_array(text).ok_or_else(|| {
                Error::malformed(format!("inspiration is not a JSON array: {strict}"))
            })?;
            debug!("falling back to embedded array");
            value
        }
    };

    let Value::Array(entries) = value else {
        return Err(Error::malformed("inspiration is not a JSON array"));
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let field = |name: &str| {
                entry
                    .get(name)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .ok_or_else(|| Error::malformed(format!("idea {i} has no {name}")))
            };
            Ok(InspirationItem {
                title: field("title")?,
                content: field("content")?,
            })
        })
        .collect()
}

/// Parse one value at each `[` in turn. An array of objects wins over an
/// earlier array of anything else, such as a `[1]` citation marker.
fn embedded_array(text: &str) -> Option<Value> {
    let mut first_array = None;
    for (start, _) in text.match_indices('[') {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(value @ Value::Array(_))) = values.next() else {
            continue;
        };
        if value.as_array().is_some_and(|items| items.iter().all(Value::is_object)) {
            return Some(value);
        }
        if first_array.is_none() {
            first_array = Some(value);
        }
    }
    first_array
}

fn sources(chunks: &[GroundingChunk]) -> Vec<SourceReference> {
    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.web.as_ref()?;
            let uri = web.uri.as_ref().filter(|u| !u.is_empty())?;
            Some(SourceReference {
                title: web.title.clone().unwrap_or_else(|| uri.clone()),
                uri: uri.clone(),
            })
        })
        .collect()
}
