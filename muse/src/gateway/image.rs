//! Text-to-image and image editing.

use tracing::{info, instrument};

use super::{ImageSize, ModelRole, Studio};
use crate::codec::{EncodedImage, strip_data_url, to_data_url};
use crate::credential::Requirement;
use crate::error::{Error, Result};
use crate::providers::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageConfig, Part,
};
use crate::providers::{Connector, GenerationService};

/// Generated images are always labelled PNG.
const IMAGE_MIME_TYPE: &str = "image/png";

/// Design assets are generated square.
const SQUARE: &str = "1:1";

impl<C: Connector> Studio<C> {
    /// Generate an image from a prompt.
    ///
    /// Sizes above 1K run the key-selection precondition first. Returns a
    /// `data:image/png;base64,...` URI.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if no credential resolves
    /// - [`Error::GenerationRequest`] if the service rejects the request
    /// - [`Error::EmptyResult`] if the response carries no image
    #[instrument(skip(self, prompt), fields(size = %size))]
    pub async fn generate_image(&self, prompt: &str, size: ImageSize) -> Result<String> {
        let service = self.connect(size.requirement()).await?;

        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: Some(SQUARE.into()),
                    image_size: Some(size.to_string()),
                }),
                ..GenerationConfig::default()
            }),
            tools: Vec::new(),
        };

        let response = service
            .generate_content(self.model(ModelRole::Image), &request)
            .await?;
        let data_url = image_data_url(&response)?;
        info!("image generated");
        Ok(data_url)
    }

    /// Apply a natural-language edit to an image.
    ///
    /// The image part precedes the instruction. Returns a
    /// `data:image/png;base64,...` URI.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if no credential resolves
    /// - [`Error::GenerationRequest`] if the service rejects the request
    /// - [`Error::EmptyResult`] if the response carries no image
    #[instrument(skip(self, image, instruction), fields(mime_type = %image.mime_type))]
    pub async fn edit_image(&self, image: &EncodedImage, instruction: &str) -> Result<String> {
        let service = self.connect(Requirement::Configured).await?;

        let (data, declared) = strip_data_url(&image.data);
        let mime_type = declared.unwrap_or(&image.mime_type);
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(mime_type, data),
                Part::text(instruction),
            ])],
            generation_config: None,
            tools: Vec::new(),
        };

        let response = service
            .generate_content(self.model(ModelRole::Edit), &request)
            .await?;
        let data_url = image_data_url(&response)?;
        info!("image edited");
        Ok(data_url)
    }
}

/// First inline image of the first candidate, as a PNG data URI.
fn image_data_url(response: &GenerateContentResponse) -> Result<String> {
    let blob = response
        .first_inline_data()
        .ok_or_else(|| Error::empty("image", response.stop_reason()))?;
    Ok(to_data_url(IMAGE_MIME_TYPE, &blob.data))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use super::super::test_support::{studio, studio_with_selector};
    use super::*;
    use crate::providers::gemini::{Candidate, PromptFeedback};
    use crate::providers::mock::{MockCall, MockService};
    use crate::state::{AppState, NewWork, WorkKind};

    fn sent_request(service: &MockService) -> (String, GenerateContentRequest) {
        match service.calls().into_iter().next().unwrap() {
            MockCall::GenerateContent { model, request } => (model, request),
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_image_returns_png_data_url() {
        let service = MockService::new();
        service.push_content(Ok(MockService::response_with_parts(vec![
            Part::text("Here is your image."),
            Part::inline("image/jpeg", "iVBORw0KGgoAAAANSUhEUg=="),
            Part::inline("image/jpeg", "c2Vjb25k"),
        ])));
        let (studio, _) = studio(&service);

        let url = studio
            .generate_image("a minimalist poster", ImageSize::OneK)
            .await
            .unwrap();

        let payload = url.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(payload, "iVBORw0KGgoAAAANSUhEUg==");
        assert!(STANDARD.decode(payload).is_ok());

        let (model, request) = sent_request(&service);
        assert_eq!(model, "gemini-3-pro-image-preview");
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].parts, vec![Part::text("a minimalist poster")]);
        let image_config = request.generation_config.unwrap().image_config.unwrap();
        assert_eq!(image_config.aspect_ratio.as_deref(), Some("1:1"));
        assert_eq!(image_config.image_size.as_deref(), Some("1K"));
    }

    #[tokio::test]
    async fn test_four_k_requests_selection_once() {
        let service = MockService::new();
        service.push_content(Ok(MockService::image_response("AAAA")));
        let (studio, selector) = studio_with_selector(&service);

        studio
            .generate_image("a ceramic vase", ImageSize::FourK)
            .await
            .unwrap();
        assert_eq!(selector.count(), 1);
        let (_, request) = sent_request(&service);
        assert_eq!(
            request.generation_config.unwrap().image_config.unwrap().image_size.as_deref(),
            Some("4K")
        );
    }

    #[tokio::test]
    async fn test_one_k_never_requests_selection() {
        let service = MockService::new();
        let (studio, selector) = studio_with_selector(&service);

        // No key stored and no selection requested: fails before any call.
        let err = studio
            .generate_image("a ceramic vase", ImageSize::OneK)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(selector.count(), 0);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_text_only_response_is_empty_result_and_saves_nothing() {
        let service = MockService::new();
        service.push_content(Ok(MockService::response_with_parts(vec![Part::text(
            "I can't draw that.",
        )])));
        let (studio, _) = studio(&service);
        let mut state = AppState::new();

        let result = studio.generate_image("anything", ImageSize::OneK).await;
        if let Ok(url) = &result {
            state.add_work(NewWork::new(WorkKind::Image, url.clone(), "anything"));
        }

        assert!(matches!(result, Err(Error::EmptyResult { what: "image", .. })));
        assert_eq!(state.works().len(), 0);
    }

    #[tokio::test]
    async fn test_blocked_prompt_reason_is_reported() {
        let service = MockService::new();
        service.push_content(Ok(GenerateContentResponse {
            candidates: vec![Candidate::default()],
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("SAFETY".into()),
            }),
        }));
        let (studio, _) = studio(&service);

        let err = studio
            .generate_image("anything", ImageSize::OneK)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no image was produced, please retry (prompt blocked: SAFETY)"
        );
    }

    #[tokio::test]
    async fn test_edit_image_sends_image_then_instruction() {
        let service = MockService::new();
        service.push_content(Ok(MockService::image_response("ZWRpdGVk")));
        let (studio, _) = studio(&service);
        let image = EncodedImage {
            data: "data:image/webp;base64,d2VicA==".into(),
            mime_type: "application/octet-stream".into(),
        };

        let url = studio.edit_image(&image, "make it blue").await.unwrap();
        assert_eq!(url, "data:image/png;base64,ZWRpdGVk");

        let (model, request) = sent_request(&service);
        assert_eq!(model, "gemini-2.5-flash-image");
        assert_eq!(
            request.contents[0].parts,
            vec![
                Part::inline("image/webp", "d2VicA=="),
                Part::text("make it blue"),
            ]
        );
        assert!(request.generation_config.is_none());
    }

    #[tokio::test]
    async fn test_edit_never_requests_selection() {
        let service = MockService::new();
        let (studio, selector) = studio_with_selector(&service);
        let image = EncodedImage {
            data: "AAAA".into(),
            mime_type: "image/png".into(),
        };

        let err = studio.edit_image(&image, "add a hat").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(selector.count(), 0);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn test_edit_rejection_propagates() {
        let service = MockService::new();
        service.push_content(Err(Error::request(Some(400), "Unsupported MIME type")));
        let (studio, _) = studio(&service);
        let image = EncodedImage {
            data: "AAAA".into(),
            mime_type: "image/tiff".into(),
        };

        let err = studio.edit_image(&image, "crop").await.unwrap_err();
        assert!(matches!(err, Error::GenerationRequest { status: Some(400), .. }));
    }
}
