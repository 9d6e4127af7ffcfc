pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod schema;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, Conversation, RunReport, StopReason, ToolRegistry};
pub use config::*;
pub use error::{AgentError, CompletionError, SchemaError, ToolError};
pub use providers::*;
pub use schema::{Arguments, CapabilityDescriptor, ParamType, ParameterSpec, Signature, describe};
pub use tools::*;
pub use traits::*;

pub use tokio_util::sync::CancellationToken;
