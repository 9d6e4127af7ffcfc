pub mod provider;
pub mod tool;

pub use provider::{
    ChatMessage, ChatRequest, Completion, Provider, Role, ToolCall, ToolCallResult,
};
pub use tool::{Tool, ToolSpec};
