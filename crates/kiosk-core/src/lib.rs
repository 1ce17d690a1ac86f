pub mod ai;
pub mod config;
pub mod error;
pub mod media;
pub mod state;

// Re-export main types for convenience
pub use ai::{GeminiClient, PromptContents, TextGenerator};
pub use config::Config;
pub use error::{ConfigError, GenerateError, MediaError};
pub use media::{MediaAttachment, MediaKind};
pub use state::{Phase, RequestState, Submission};
