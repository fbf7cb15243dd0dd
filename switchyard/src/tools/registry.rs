use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::state::{ToolCall, ToolResult};

use super::{Tool, ToolError, ToolSpec};

/// Text recorded as the result of a call to an unregistered tool.
pub const TOOL_NOT_FOUND: &str = "Tool not found.";

/// Tools keyed by lowercase name.
///
/// Registering a second tool whose name differs only in case replaces the first.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> &mut Self {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let key = tool.name().to_lowercase();
        if self.tools.insert(key, tool).is_some() {
            debug!("tool replaced in registry");
        }
        self
    }

    /// Looks a tool up ignoring case.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(&name.trim().to_lowercase()).cloned()
    }

    /// Specs of every tool, sorted by name.
    pub fn list(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn call_by_name(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.call(args).await
    }

    pub async fn call(&self, call: &ToolCall) -> Result<String, ToolError> {
        info!(tool = %call.name, args = %call.arguments, "calling tool");
        let result = self.call_by_name(&call.name, call.arguments.clone()).await;
        match &result {
            Ok(out) => debug!(tool = %call.name, output = %out, "tool returned"),
            Err(e) => warn!(tool = %call.name, error = %e, "tool call failed"),
        }
        result
    }

    /// Runs every call in order. Failures become error results; nothing is propagated.
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let result = match self.call(call).await {
                Ok(content) => ToolResult::ok(call, content),
                Err(ToolError::NotFound(_)) => ToolResult::error(call, TOOL_NOT_FOUND),
                Err(e) => ToolResult::error(call, e.to_string()),
            };
            results.push(result);
        }
        results
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
