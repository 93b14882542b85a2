pub mod composer;
pub mod models;
pub mod synthesizer;

pub use composer::Composer;
pub use models::claude::ClaudeModel;
pub use models::offline::OfflineModel;
pub use synthesizer::Synthesizer;

pub mod prelude {
    pub use super::composer::Composer;
    pub use super::synthesizer::Synthesizer;
    pub use brief_core::{BriefLength, LanguageModel, Result, SynthesisResult};
}
