use crate::traits::Tool;
use std::sync::Arc;

pub mod bmi;
pub mod datetime;
pub mod function;
pub mod temperature;
pub mod weather;
pub mod wikipedia;

pub use bmi::BmiTool;
pub use datetime::DateTimeTool;
pub use function::FunctionTool;
pub use temperature::TemperatureTool;
pub use weather::WeatherTool;
pub use wikipedia::WikipediaSearchTool;

pub fn builtin_tools() -> anyhow::Result<Vec<Arc<dyn Tool>>> {
    Ok(vec![
        Arc::new(DateTimeTool::new()),
        Arc::new(WikipediaSearchTool::new()?),
        Arc::new(TemperatureTool::new()),
        Arc::new(BmiTool::new()),
        Arc::new(WeatherTool::new()),
    ])
}
