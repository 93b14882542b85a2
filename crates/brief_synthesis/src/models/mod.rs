pub mod claude;
pub mod offline;

pub use claude::ClaudeModel;
pub use offline::OfflineModel;
