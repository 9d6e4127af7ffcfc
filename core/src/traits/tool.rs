use crate::schema::{Arguments, Signature};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Wire form of a tool description handed to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared name, documentation and typed parameters. Read once at
    /// registration; never causes the tool to run.
    fn signature(&self) -> Signature;

    /// Runs the tool with arguments already coerced to the declared types.
    async fn call(&self, args: Arguments) -> anyhow::Result<String>;
}
