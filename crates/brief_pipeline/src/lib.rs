pub mod batch;
pub mod generator;
pub mod render;

pub use batch::BriefPipeline;
pub use generator::BriefGenerator;
