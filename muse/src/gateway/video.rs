//! Image-to-video.

use tracing::{info, instrument};

use super::{AspectRatio, ModelRole, Studio};
use crate::codec::{EncodedImage, strip_data_url};
use crate::credential::Requirement;
use crate::error::Result;
use crate::media::PlayableVideo;
use crate::poller::OperationPoller;
use crate::providers::gemini::{
    GenerateVideosRequest, RemoteOperation, VideoImage, VideoInstance, VideoParameters,
};
use crate::providers::{Connector, GenerationService};

/// Motion prompt used when none (or a blank one) is given.
pub const DEFAULT_VIDEO_PROMPT: &str = "Animate this image naturally";

const VIDEO_RESOLUTION: &str = "720p";

impl<C: Connector> Studio<C> {
    /// Submit a video job and return its operation without waiting.
    ///
    /// Always runs the key-selection precondition.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`](crate::Error::Configuration) if no credential resolves
    /// - [`Error::GenerationRequest`](crate::Error::GenerationRequest) if the job is rejected
    pub async fn start_video(
        &self,
        image: &EncodedImage,
        aspect_ratio: AspectRatio,
        prompt: Option<&str>,
    ) -> Result<RemoteOperation> {
        let service = self.connect(Requirement::Selected).await?;
        self.submit_video(&service, image, aspect_ratio, prompt).await
    }

    /// Wait for a previously started job and register its video.
    ///
    /// # Errors
    ///
    /// See [`OperationPoller::resolve`].
    pub async fn resume_video(&self, operation: RemoteOperation) -> Result<PlayableVideo> {
        let service = self.connect(Requirement::Configured).await?;
        OperationPoller::new(&service, self.config.poll_policy())
            .resolve(operation, &self.media)
            .await
    }

    /// Animate an image and wait for the result.
    ///
    /// The returned handle lives in [`media`](Self::media) until revoked.
    ///
    /// # Errors
    ///
    /// The errors of [`start_video`](Self::start_video) and
    /// [`OperationPoller::resolve`].
    #[instrument(skip(self, image, prompt), fields(aspect_ratio = %aspect_ratio))]
    pub async fn generate_video(
        &self,
        image: &EncodedImage,
        aspect_ratio: AspectRatio,
        prompt: Option<&str>,
    ) -> Result<PlayableVideo> {
        let service = self.connect(Requirement::Selected).await?;
        let operation = self
            .submit_video(&service, image, aspect_ratio, prompt)
            .await?;

        let video = OperationPoller::new(&service, self.config.poll_policy())
            .resolve(operation, &self.media)
            .await?;
        info!(url = %video.url, size = video.size, "video ready");
        Ok(video)
    }

    async fn submit_video(
        &self,
        service: &C::Service,
        image: &EncodedImage,
        aspect_ratio: AspectRatio,
        prompt: Option<&str>,
    ) -> Result<RemoteOperation> {
        let (data, declared) = strip_data_url(&image.data);
        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_VIDEO_PROMPT);

        let request = GenerateVideosRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: Some(VideoImage {
                    bytes_base64_encoded: data.to_string(),
                    mime_type: declared.unwrap_or(&image.mime_type).to_string(),
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: aspect_ratio.to_string(),
                resolution: VIDEO_RESOLUTION.into(),
                sample_count: 1,
            },
        };

        let operation = service
            .generate_videos(self.model(ModelRole::Video), &request)
            .await?;
        info!(operation = %operation.name, "video job submitted");
        Ok(operation)
    }
}
