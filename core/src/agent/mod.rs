pub mod conversation;
pub mod loop_;
pub mod registry;

pub use conversation::Conversation;
pub use loop_::{AgentLoop, RunReport, StopReason};
pub use registry::ToolRegistry;
