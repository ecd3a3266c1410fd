//! Wire types for the Gemini REST API.
//!
//! Only the fields the studio reads or writes are modelled; unknown fields in
//! responses are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Content
// ============================================================================

/// A turn of content: an ordered list of parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// `user` or `model`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// The parts, in order.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn with the given parts.
    #[must_use]
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".into()),
            parts,
        }
    }
}

/// Inline binary data, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// Media type of the data.
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

/// One part of a [`Content`].
///
/// Responses mix text and inline media freely; anything else the service
/// sends (function calls, executable code, ...) lands in [`Part::Other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Inline binary data such as a generated image.
    InlineData {
        /// The blob.
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: Blob,
    },
    /// Plain text.
    Text {
        /// The text.
        text: String,
        /// Set on reasoning parts that are not part of the answer.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        thought: bool,
    },
    /// Any other part kind.
    Other(Value),
}

impl Part {
    /// A text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            thought: false,
        }
    }

    /// An inline-data part.
    #[must_use]
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    /// The blob, if this is an inline-data part.
    #[must_use]
    pub const fn as_inline_data(&self) -> Option<&Blob> {
        match self {
            Self::InlineData { inline_data } => Some(inline_data),
            _ => None,
        }
    }

    /// The text, if this is a non-thought text part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text {
                text,
                thought: false,
            } => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// generateContent
// ============================================================================

/// Body of `models/{model}:generateContent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation; the studio always sends a single user turn.
    pub contents: Vec<Content>,
    /// Output configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    /// Tools the model may use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

/// Output configuration for `generateContent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Requested output media type, e.g. `application/json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// Schema the structured output must satisfy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// Image output settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

/// Image output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Aspect ratio such as `1:1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Output resolution tier such as `2K`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

/// A tool declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Web search grounding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl Tool {
    /// The web search grounding tool.
    #[must_use]
    pub const fn google_search() -> Self {
        Self {
            google_search: Some(GoogleSearch {}),
        }
    }
}

/// Marker for the web search tool; serialises as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSearch {}

/// Response of `generateContent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate answers; the studio only reads the first.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Set when the prompt itself was blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One candidate answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Why generation stopped (`STOP`, `SAFETY`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Search grounding metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Feedback about the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason, if the prompt was blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Search grounding metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Cited sources.
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// A cited source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// A web page, when the source is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

/// A cited web page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    /// Page URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Page title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Parts of the first candidate, in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        self.first_candidate()
            .and_then(|c| c.content.as_ref())
            .map_or(&[], |c| c.parts.as_slice())
    }

    /// The first inline-data part of the first candidate.
    #[must_use]
    pub fn first_inline_data(&self) -> Option<&Blob> {
        self.parts().iter().find_map(Part::as_inline_data)
    }

    /// Concatenated answer text of the first candidate, if it has any.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let text: String = self.parts().iter().filter_map(Part::as_text).collect();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Grounding chunks of the first candidate.
    #[must_use]
    pub fn grounding_chunks(&self) -> &[GroundingChunk] {
        self.first_candidate()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map_or(&[], |g| g.grounding_chunks.as_slice())
    }

    /// Why nothing useful came back, if the service said so.
    #[must_use]
    pub fn stop_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Some(format!("prompt blocked: {reason}"));
        }
        self.first_candidate()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| *r != "STOP")
            .map(|r| format!("finish reason: {r}"))
    }
}

// ============================================================================
// predictLongRunning (video)
// ============================================================================

/// Body of `models/{model}:predictLongRunning`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateVideosRequest {
    /// One instance per requested generation.
    pub instances: Vec<VideoInstance>,
    /// Output parameters.
    pub parameters: VideoParameters,
}

/// Prompt and source image for a video job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInstance {
    /// Text prompt.
    pub prompt: String,
    /// First frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<VideoImage>,
}

/// Source image for a video job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoImage {
    /// Base64 image bytes.
    pub bytes_base64_encoded: String,
    /// Image media type.
    pub mime_type: String,
}

/// Video output parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    /// `16:9` or `9:16`.
    pub aspect_ratio: String,
    /// Resolution tier, e.g. `720p`.
    pub resolution: String,
    /// Number of videos to generate.
    pub sample_count: u32,
}

/// A long-running operation as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteOperation {
    /// Provider-issued handle, e.g. `models/veo/operations/abc`.
    pub name: String,
    /// Whether the job reached a terminal state.
    #[serde(default)]
    pub done: bool,
    /// Set when the job failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
    /// Set when the job succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<OperationResponse>,
}

/// Failure details of a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// `google.rpc.Code` status, not an HTTP status.
    #[serde(default)]
    pub code: Option<i32>,
    /// Message.
    #[serde(default)]
    pub message: String,
}

/// Result payload of a finished video operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// REST shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_video_response: Option<VideoResponse>,
    /// SDK shape, where the videos sit directly in the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated_videos: Vec<GeneratedVideo>,
}

/// Generated samples of a video job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    /// The videos.
    #[serde(default, alias = "generatedVideos")]
    pub generated_samples: Vec<GeneratedVideo>,
    /// Why samples were withheld, if any were.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rai_media_filtered_reasons: Vec<String>,
}

/// A generated video entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    /// Download reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoFile>,
}

/// Download reference of a generated video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    /// Download URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl RemoteOperation {
    /// A pending operation with the given name.
    #[must_use]
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A finished operation whose first video lives at `uri`.
    #[must_use]
    pub fn completed(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            error: None,
            response: Some(OperationResponse {
                generate_video_response: Some(VideoResponse {
                    generated_samples: vec![GeneratedVideo {
                        video: Some(VideoFile {
                            uri: Some(uri.into()),
                        }),
                    }],
                    rai_media_filtered_reasons: Vec::new(),
                }),
                generated_videos: Vec::new(),
            }),
        }
    }

    fn videos(&self) -> impl Iterator<Item = &GeneratedVideo> {
        self.response.iter().flat_map(|r| {
            r.generate_video_response
                .iter()
                .flat_map(|v| v.generated_samples.iter())
                .chain(r.generated_videos.iter())
        })
    }

    /// URI of the first generated video.
    #[must_use]
    pub fn video_uri(&self) -> Option<&str> {
        self.videos()
            .find_map(|v| v.video.as_ref().and_then(|f| f.uri.as_deref()))
    }

    /// Content-filter reasons reported for withheld samples.
    #[must_use]
    pub fn filtered_reasons(&self) -> Option<String> {
        let reasons = &self
            .response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .rai_media_filtered_reasons;
        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parts_deserialize_into_variants() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "thinking...", "thought": true },
                        { "text": "Here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0=" } },
                        { "functionCall": { "name": "noop" } }
                    ]
                },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let parts = response.parts();
        assert_eq!(parts.len(), 4);
        assert!(matches!(parts[0], Part::Text { thought: true, .. }));
        assert_eq!(parts[1].as_text(), Some("Here you go"));
        assert_eq!(response.first_inline_data().unwrap().data, "iVBORw0=");
        assert!(matches!(parts[3], Part::Other(_)));
        assert_eq!(response.text().as_deref(), Some("Here you go"));
        assert!(response.stop_reason().is_none());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline("image/jpeg", "AAAA"),
                Part::text("make it blue"),
            ])],
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: Some("1:1".into()),
                    image_size: Some("2K".into()),
                }),
                ..GenerationConfig::default()
            }),
            tools: vec![Tool::google_search()],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "inlineData": { "mimeType": "image/jpeg", "data": "AAAA" } },
                        { "text": "make it blue" }
                    ]
                }],
                "generationConfig": { "imageConfig": { "aspectRatio": "1:1", "imageSize": "2K" } },
                "tools": [{ "googleSearch": {} }]
            })
        );
    }

    #[test]
    fn test_stop_reason_prefers_prompt_feedback() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" },
            "candidates": [{ "finishReason": "OTHER" }]
        }))
        .unwrap();
        assert_eq!(response.stop_reason().as_deref(), Some("prompt blocked: SAFETY"));
    }

    #[test]
    fn test_operation_video_uri_shapes() {
        let rest: RemoteOperation = serde_json::from_value(json!({
            "name": "models/veo/operations/1",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": "https://files/v1:download?alt=media" } }]
                }
            }
        }))
        .unwrap();
        assert_eq!(rest.video_uri(), Some("https://files/v1:download?alt=media"));

        let sdk: RemoteOperation = serde_json::from_value(json!({
            "name": "operations/2",
            "done": true,
            "response": { "generatedVideos": [{ "video": { "uri": "https://files/v2" } }] }
        }))
        .unwrap();
        assert_eq!(sdk.video_uri(), Some("https://files/v2"));

        let pending: RemoteOperation =
            serde_json::from_value(json!({ "name": "operations/3" })).unwrap();
        assert!(!pending.done);
        assert!(pending.video_uri().is_none());
    }

    #[test]
    fn test_operation_filtered_reasons() {
        let op: RemoteOperation = serde_json::from_value(json!({
            "name": "operations/4",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "raiMediaFilteredCount": 1,
                    "raiMediaFilteredReasons": ["contains a celebrity likeness"]
                }
            }
        }))
        .unwrap();
        assert!(op.video_uri().is_none());
        assert_eq!(
            op.filtered_reasons().as_deref(),
            Some("contains a celebrity likeness")
        );
    }
}
