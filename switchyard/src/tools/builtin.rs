//! Weather and system time stubs. Each call picks one fixed answer at random.

use rand::seq::SliceRandom;

use super::{FnTool, ToolRegistry};

pub const TOOL_GET_CURRENT_WEATHER: &str = "get_current_weather";
pub const TOOL_GET_SYSTEM_TIME: &str = "get_system_time";

pub const WEATHER_OUTCOMES: [&str; 3] = ["Sunny, 78F", "Cold, 22F", "Rainy, 60F"];
pub const TIME_OUTCOMES: [&str; 3] = ["2:00 AM", "3:00 PM", "6:15 PM"];

/// Location assumed by the time tool when none is given.
pub const DEFAULT_TIME_LOCATION: &str = "Minnesota";

fn pick(options: &[&'static str]) -> String {
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

pub fn weather_tool() -> FnTool {
    FnTool::new(
        TOOL_GET_CURRENT_WEATHER,
        "Check the weather in the specified location",
        |args| {
            tracing::debug!(location = ?args.get("location"), "weather stub");
            Ok(pick(&WEATHER_OUTCOMES))
        },
    )
    .param("location", "City or region to check, e.g. Munich", true)
}

pub fn system_time_tool() -> FnTool {
    FnTool::new(
        TOOL_GET_SYSTEM_TIME,
        "Get current system time, if no location is provided then pick location as Minnesota",
        |args| {
            tracing::debug!(location = ?args.get("location"), "system time stub");
            Ok(pick(&TIME_OUTCOMES))
        },
    )
    .param_with_default("location", "Location to report the time for", DEFAULT_TIME_LOCATION)
}

/// Registry with both stubs.
pub fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(weather_tool()).register(system_time_tool());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolError};
    use serde_json::json;

    #[tokio::test]
    async fn weather_returns_a_fixed_outcome() {
        let tool = weather_tool();
        for _ in 0..20 {
            let out = tool.call(json!({"location": "Munich"})).await.unwrap();
            assert!(WEATHER_OUTCOMES.contains(&out.as_str()), "{}", out);
        }
    }

    #[tokio::test]
    async fn weather_requires_location() {
        let err = weather_tool().call(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn time_works_without_location() {
        let tool = system_time_tool();
        for args in [json!({}), json!({"location": "Tokyo"}), json!(null)] {
            let out = tool.call(args).await.unwrap();
            assert!(TIME_OUTCOMES.contains(&out.as_str()), "{}", out);
        }
    }

    #[test]
    fn builtin_registry_has_both_stubs() {
        let r = builtin_registry();
        let names: Vec<String> = r.list().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec![TOOL_GET_CURRENT_WEATHER, TOOL_GET_SYSTEM_TIME]);
    }
}
