//! Typed generation requests and their results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::inspiration::Inspiration;
use crate::codec::EncodedImage;
use crate::credential::Requirement;
use crate::error::{Error, Result};
use crate::media::PlayableVideo;

/// Output resolution tier for text-to-image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSize {
    /// 1K, the default.
    #[default]
    #[serde(rename = "1K")]
    OneK,
    /// 2K.
    #[serde(rename = "2K")]
    TwoK,
    /// 4K.
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }

    /// Credential requirement of generating at this size.
    ///
    /// Anything above 1K needs an explicitly selected key.
    #[must_use]
    pub const fn requirement(self) -> Requirement {
        match self {
            Self::OneK => Requirement::Configured,
            Self::TwoK | Self::FourK => Requirement::Selected,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(Self::OneK),
            "2K" => Ok(Self::TwoK),
            "4K" => Ok(Self::FourK),
            other => Err(Error::configuration(format!(
                "unsupported image size {other:?}, expected 1K, 2K or 4K"
            ))),
        }
    }
}

/// Frame shape of a generated video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9, the default.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            other => Err(Error::configuration(format!(
                "unsupported aspect ratio {other:?}, expected 16:9 or 9:16"
            ))),
        }
    }
}

/// Which configured model an operation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Text-to-image.
    Image,
    /// Image editing.
    Edit,
    /// Image-to-video.
    Video,
    /// Grounded text.
    Text,
}

/// One of the four generation operations, with its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRequest {
    /// Generate an image from a prompt.
    TextToImage {
        /// The prompt.
        prompt: String,
        /// Output resolution.
        #[serde(default)]
        size: ImageSize,
    },
    /// Edit an image with an instruction.
    EditImage {
        /// The source image.
        image: EncodedImage,
        /// What to change.
        instruction: String,
    },
    /// Animate a still image.
    ImageToVideo {
        /// The first frame.
        image: EncodedImage,
        /// Output frame shape.
        #[serde(default)]
        aspect_ratio: AspectRatio,
        /// Motion prompt.
        #[serde(default)]
        prompt: Option<String>,
    },
    /// Search-grounded design inspiration.
    Inspiration {
        /// The topic.
        query: String,
    },
}

impl GenerationRequest {
    /// Credential requirement of this request.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        match self {
            Self::TextToImage { size, .. } => size.requirement(),
            Self::ImageToVideo { .. } => Requirement::Selected,
            Self::EditImage { .. } | Self::Inspiration { .. } => Requirement::Configured,
        }
    }

    /// The model role this request runs on.
    #[must_use]
    pub const fn model_role(&self) -> ModelRole {
        match self {
            Self::TextToImage { .. } => ModelRole::Image,
            Self::EditImage { .. } => ModelRole::Edit,
            Self::ImageToVideo { .. } => ModelRole::Video,
            Self::Inspiration { .. } => ModelRole::Text,
        }
    }
}

/// Output of [`Studio::execute`](super::Studio::execute).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generated {
    /// A `data:image/png;base64,...` URI.
    Image {
        /// The data URI.
        data_url: String,
    },
    /// A registered video.
    Video(PlayableVideo),
    /// Ideas and their sources.
    Inspiration(Inspiration),
}
