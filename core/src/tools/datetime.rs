use crate::schema::{Arguments, Signature};
use crate::traits::Tool;
use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};

pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct DateTimeTool;

impl DateTimeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DateTimeTool {
    fn signature(&self) -> Signature {
        Signature::new("get_current_datetime")
            .doc("Get the current local date and time, formatted with a strftime pattern")
            .optional("format", "string", DEFAULT_DATETIME_FORMAT)
    }

    async fn call(&self, args: Arguments) -> anyhow::Result<String> {
        let format = args.str("format")?;

        // chrono panics on Display for an invalid pattern, so check up front.
        let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
        anyhow::ensure!(
            !items.iter().any(|item| matches!(item, Item::Error)),
            "invalid datetime format '{}'",
            format
        );

        Ok(chrono::Local::now()
            .format_with_items(items.into_iter())
            .to_string())
    }
}
