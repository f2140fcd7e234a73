pub mod metrics;
pub mod prompts;
pub mod providers;

pub use providers::gemini::GeminiVisionProvider;
pub use providers::{InlineImage, ProviderError, VisionProvider};
