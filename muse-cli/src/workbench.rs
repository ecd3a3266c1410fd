//! Runs studio operations and files the results.
//!
//! A [`Workbench`] pairs a [`Studio`] with the [`AppState`] feed. Every
//! successful generation is written to disk and saved to the feed; a failed
//! one leaves both untouched.

use std::path::{Path, PathBuf};

use anyhow::Context;
use muse::codec::{decode_data_url, encode_file};
use muse::gateway::{AspectRatio, DEFAULT_VIDEO_PROMPT, ImageSize, Inspiration};
use muse::providers::Connector;
use muse::state::{AppState, CreativeWork, NewWork, WorkKind};
use muse::Studio;
use tracing::info;

/// A studio plus the feed it saves into.
#[derive(Debug)]
pub struct Workbench<C> {
    studio: Studio<C>,
    state: AppState,
}

impl<C: Connector> Workbench<C> {
    /// Pair a studio with application state.
    #[must_use]
    pub const fn new(studio: Studio<C>, state: AppState) -> Self {
        Self { studio, state }
    }

    /// The application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Generate an image, write it to `output` and save it.
    ///
    /// # Errors
    ///
    /// Fails if generation fails or the file cannot be written.
    pub async fn image(
        &mut self,
        prompt: &str,
        size: ImageSize,
        output: &Path,
    ) -> anyhow::Result<&CreativeWork> {
        let data_url = self.studio.generate_image(prompt, size).await?;
        write_data_url(&data_url, output).await?;
        Ok(self
            .state
            .add_work(NewWork::new(WorkKind::Image, data_url, prompt)))
    }

    /// Edit the image at `input`, write the result to `output` and save it.
    ///
    /// # Errors
    ///
    /// Fails if `input` cannot be read, the edit fails, or the file cannot be
    /// written.
    pub async fn edit(
        &mut self,
        input: &Path,
        instruction: &str,
        output: &Path,
    ) -> anyhow::Result<&CreativeWork> {
        let image = encode_file(input).await?;
        let data_url = self.studio.edit_image(&image, instruction).await?;
        write_data_url(&data_url, output).await?;
        Ok(self
            .state
            .add_work(NewWork::new(WorkKind::Image, data_url, instruction)))
    }

    /// Animate the image at `input`, write the clip to `output` and save it.
    ///
    /// The in-memory handle is released once the clip is on disk; the saved
    /// work points at the file.
    ///
    /// # Errors
    ///
    /// Fails if `input` cannot be read, the video job fails, or the file
    /// cannot be written.
    pub async fn video(
        &mut self,
        input: &Path,
        aspect_ratio: AspectRatio,
        prompt: Option<&str>,
        output: &Path,
    ) -> anyhow::Result<&CreativeWork> {
        let image = encode_file(input).await?;
        let video = self
            .studio
            .generate_video(&image, aspect_ratio, prompt)
            .await?;

        let media = self.studio.media();
        let object = media
            .get(&video.url)
            .await
            .with_context(|| format!("video handle {} was already released", video.url))?;
        let written = tokio::fs::write(output, &object.bytes).await;
        media.revoke(&video.url).await;
        written.with_context(|| format!("failed to write {}", output.display()))?;
        info!(path = %output.display(), size = video.size, "video written");

        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_VIDEO_PROMPT);
        Ok(self.state.add_work(
            NewWork::new(WorkKind::Video, file_url(output), prompt)
                .with_aspect_ratio(aspect_ratio.to_string()),
        ))
    }

    /// Search for inspiration. Nothing is saved.
    ///
    /// # Errors
    ///
    /// Fails if the search fails.
    pub async fn inspire(&self, query: &str) -> anyhow::Result<Inspiration> {
        Ok(self.studio.search_inspiration(query).await?)
    }
}

async fn write_data_url(data_url: &str, output: &Path) -> anyhow::Result<()> {
    let (_, bytes) = decode_data_url(data_url)?;
    tokio::fs::write(output, bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), "image written");
    Ok(())
}

fn file_url(path: &Path) -> String {
    let path: PathBuf = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", path.display())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use muse::StudioConfig;
    use muse::credential::{CredentialGate, KeyStore};
    use muse::providers::gemini::RemoteOperation;
    use muse::providers::mock::{MockConnector, MockService, video_artifact};
    use tempfile::TempDir;

    fn workbench(service: &MockService) -> Workbench<MockConnector> {
        let store = KeyStore::new();
        store.set("test-key");
        let studio = Studio::new(
            MockConnector::new(service.clone()),
            CredentialGate::new(store),
            StudioConfig::default(),
        );
        Workbench::new(studio, AppState::new())
    }

    #[tokio::test]
    async fn test_image_is_written_and_saved() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.png");
        let service = MockService::new();
        service.push_content(Ok(MockService::image_response("iVBORw0KGgo=")));
        let mut bench = workbench(&service);

        let work = bench
            .image("a fox", ImageSize::OneK, &output)
            .await
            .unwrap()
            .clone();

        assert_eq!(work.kind, WorkKind::Image);
        assert!(work.url.starts_with("data:image/png;base64,"));
        assert_eq!(std::fs::read(&output).unwrap(), b"\x89PNG\r\n\x1a\n");
        assert_eq!(bench.state().works().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_generation_saves_nothing() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.png");
        let service = MockService::new();
        service.push_content(Ok(MockService::response_with_parts(Vec::new())));
        let mut bench = workbench(&service);

        assert!(bench.image("a fox", ImageSize::OneK, &output).await.is_err());
        assert!(bench.state().works().is_empty());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_edit_reads_input() {
        let temp = TempDir::new().unwrap();
        let service = MockService::new();
        let mut bench = workbench(&service);

        let err = bench
            .edit(&temp.path().join("missing.jpg"), "make it blue", &temp.path().join("o.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing.jpg"));
        assert!(service.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_is_written_and_handle_released() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("still.png");
        let output = temp.path().join("clip.mp4");
        std::fs::write(&input, b"\x89PNG\r\n\x1a\n").unwrap();

        let service = MockService::new();
        service.push_video(Ok(RemoteOperation::pending("operations/v")));
        service.push_operation(Ok(RemoteOperation::completed(
            "operations/v",
            "https://files.example/clip?alt=media",
        )));
        service.push_artifact(Ok(video_artifact(b"mp4")));
        let mut bench = workbench(&service);

        let work = bench
            .video(&input, AspectRatio::Portrait, None, &output)
            .await
            .unwrap()
            .clone();

        assert_eq!(std::fs::read(&output).unwrap(), b"mp4");
        assert_eq!(work.kind, WorkKind::Video);
        assert_eq!(work.aspect_ratio.as_deref(), Some("9:16"));
        assert_eq!(work.prompt, DEFAULT_VIDEO_PROMPT);
        assert!(work.url.starts_with("file://"));
        assert!(bench.studio.media().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_handle_released_when_write_fails() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("still.png");
        let output = temp.path().join("no-such-dir").join("clip.mp4");
        std::fs::write(&input, b"\x89PNG\r\n\x1a\n").unwrap();

        let service = MockService::new();
        service.push_video(Ok(RemoteOperation::completed(
            "operations/v",
            "https://files.example/clip?alt=media",
        )));
        service.push_artifact(Ok(video_artifact(b"mp4")));
        let mut bench = workbench(&service);

        let err = bench
            .video(&input, AspectRatio::Landscape, Some("drift"), &output)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed to write"));
        assert!(bench.studio.media().is_empty().await);
        assert!(bench.state().works().is_empty());
    }
}
