use crate::schema::{Arguments, Signature};
use crate::traits::Tool;
use async_trait::async_trait;

/// Canned weather report. There is no weather backend behind it.
pub struct WeatherTool;

impl WeatherTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn signature(&self) -> Signature {
        Signature::new("fetch_weather")
            .doc("Fetch current weather for a city")
            .param("city", "string")
    }

    async fn call(&self, args: Arguments) -> anyhow::Result<String> {
        let city = args.str("city")?.trim();
        anyhow::ensure!(!city.is_empty(), "city must not be empty");
        Ok(format!("{}: sunny, 25°C, humidity 60% (simulated)", city))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::describe;

    #[tokio::test]
    async fn reports_for_city() {
        let tool = WeatherTool::new();
        let descriptor = describe(&tool.signature()).unwrap();
        let args = Arguments::coerce(&descriptor, r#"{"city": "Beijing"}"#).unwrap();
        let out = tool.call(args).await.unwrap();
        assert!(out.starts_with("Beijing: sunny"));
    }
}
