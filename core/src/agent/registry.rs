use crate::error::{SchemaError, ToolError};
use crate::schema::{Arguments, CapabilityDescriptor, describe};
use crate::traits::{Tool, ToolCall, ToolCallResult, ToolSpec};
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

struct Entry {
    descriptor: CapabilityDescriptor,
    tool: Arc<dyn Tool>,
}

/// Name-keyed tool table.
///
/// Registering a name that already exists replaces the earlier tool (last
/// registration wins); the replacement keeps the earlier entry's position in
/// [`ToolRegistry::all`].
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools<I>(tools: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), SchemaError> {
        let descriptor = describe(&tool.signature())?;
        let name = descriptor.name.clone();
        let entry = Entry { descriptor, tool };

        match self.index.get(&name) {
            Some(&slot) => {
                tracing::warn!(tool = %name, "Replacing previously registered tool");
                self.entries[slot] = entry;
            }
            None => {
                tracing::debug!(tool = %name, "Registered tool");
                self.index.insert(name, self.entries.len());
                self.entries.push(entry);
            }
        }

        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index
            .get(name)
            .map(|&slot| Arc::clone(&self.entries[slot].tool))
    }

    pub fn descriptor(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.index
            .get(name)
            .map(|&slot| &self.entries[slot].descriptor)
    }

    pub fn all(&self) -> Vec<CapabilityDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries.iter().map(|e| e.descriptor.spec()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.descriptor.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs one requested call. Every failure is folded into the result
    /// text so the model always gets an answer for the call id.
    pub async fn execute(&self, call: &ToolCall) -> ToolCallResult {
        let content = match self.invoke(call).await {
            Ok(output) => {
                tracing::debug!(tool = %call.name, call_id = %call.id, "Tool call succeeded");
                output
            }
            Err(err) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %err, "Tool call failed");
                format!("Error: {}", err)
            }
        };

        ToolCallResult::new(call.id.clone(), content)
    }

    async fn invoke(&self, call: &ToolCall) -> Result<String, ToolError> {
        let slot = *self
            .index
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        let entry = &self.entries[slot];

        let args = Arguments::coerce(&entry.descriptor, &call.arguments)?;
        match AssertUnwindSafe(entry.tool.call(args)).catch_unwind().await {
            Ok(outcome) => Ok(outcome?),
            Err(payload) => Err(ToolError::Execution(anyhow::anyhow!(
                "tool '{}' panicked: {}",
                call.name,
                panic_message(payload.as_ref())
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
