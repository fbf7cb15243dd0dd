//! Tool built from a synchronous closure over string arguments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{Tool, ToolError, ToolSpec};

type ToolFn = Arc<dyn Fn(&HashMap<String, String>) -> Result<String, ToolError> + Send + Sync>;

#[derive(Debug, Clone)]
struct Param {
    name: String,
    description: String,
    required: bool,
    default: Option<String>,
}

/// Closure-backed tool with declared string parameters.
///
/// The schema sent to the model is generated from the parameters. Before the closure runs,
/// defaults are filled in and required parameters are checked.
///
/// ```
/// use switchyard::tools::{FnTool, Tool};
///
/// let echo = FnTool::new("echo", "Repeat the text", |args| {
///     Ok(args.get("text").cloned().unwrap_or_default())
/// })
/// .param("text", "Text to repeat", true);
/// assert_eq!(echo.spec().input_schema["required"][0], "text");
/// ```
#[derive(Clone)]
pub struct FnTool {
    name: String,
    description: String,
    params: Vec<Param>,
    f: ToolFn,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&HashMap<String, String>) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            f: Arc::new(f),
        }
    }

    pub fn param(mut self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.params.push(Param {
            name: name.into(),
            description: description.into(),
            required,
            default: None,
        });
        self
    }

    /// Optional parameter that takes `default` when the model leaves it out.
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.params.push(Param {
            name: name.into(),
            description: description.into(),
            required: false,
            default: Some(default.into()),
        });
        self
    }

    fn schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            properties.insert(
                p.name.clone(),
                json!({"type": "string", "description": p.description}),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Flattens the argument object to strings, applies defaults, checks required keys.
    fn prepare_args(&self, args: &Value) -> Result<HashMap<String, String>, ToolError> {
        let mut out = HashMap::new();
        match args {
            Value::Object(map) => {
                for (k, v) in map {
                    let s = match v {
                        Value::Null => continue,
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    out.insert(k.clone(), s);
                }
            }
            Value::Null => {}
            other => {
                return Err(ToolError::InvalidInput(format!(
                    "expected an argument object, got {}",
                    other
                )))
            }
        }
        for p in &self.params {
            if out.get(&p.name).map(|v| v.trim().is_empty()).unwrap_or(true) {
                if let Some(d) = &p.default {
                    out.insert(p.name.clone(), d.clone());
                } else if p.required {
                    return Err(ToolError::InvalidInput(format!(
                        "missing required argument: {}",
                        p.name
                    )));
                }
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: self.schema(),
        }
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let args = self.prepare_args(&args)?;
        (self.f)(&args)
    }
}
