//! Commonly used types.

pub use crate::codec::{EncodedImage, decode_data_url, encode_bytes, encode_file};
pub use crate::config::{ModelSet, StudioConfig};
pub use crate::credential::{
    Credential, CredentialChain, CredentialGate, CredentialSource, KeySelector, KeyStore,
    Requirement,
};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::gateway::{
    AspectRatio, Generated, GenerationRequest, ImageSize, Inspiration, InspirationItem,
    SourceReference, Studio,
};
pub use crate::media::{MediaStore, ObjectUrl, PlayableVideo};
pub use crate::poller::{OperationPoller, PollPolicy};
pub use crate::providers::{Connector, GenerationService};
pub use crate::state::{AppState, CreativeWork, NewWork, User, WorkKind};
