use crate::schema::{Arguments, Signature};
use crate::traits::Tool;
use async_trait::async_trait;

/// Simulated thermometer reading, consistent with [`super::WeatherTool`].
pub struct TemperatureTool;

impl TemperatureTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TemperatureTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for TemperatureTool {
    fn signature(&self) -> Signature {
        Signature::new("get_current_temperature")
            .doc("Get the current temperature in a city")
            .param("city", "string")
    }

    async fn call(&self, args: Arguments) -> anyhow::Result<String> {
        let city = args.str("city")?.trim();
        anyhow::ensure!(!city.is_empty(), "city must not be empty");
        Ok(format!("Current temperature in {}: 25°C (simulated)", city))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::describe;

    async fn run(raw: &str) -> anyhow::Result<String> {
        let tool = TemperatureTool::new();
        let descriptor = describe(&tool.signature())?;
        tool.call(Arguments::coerce(&descriptor, raw)?).await
    }

    #[tokio::test]
    async fn reads_temperature_for_city() {
        let out = run(r#"{"city": " Shanghai "}"#).await.unwrap();
        assert_eq!(out, "Current temperature in Shanghai: 25°C (simulated)");
    }

    #[tokio::test]
    async fn blank_city_is_an_error() {
        assert!(run(r#"{"city": "  "}"#).await.is_err());
        assert!(run("{}").await.is_err());
    }
}
