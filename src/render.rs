use crate::event::EventObject;
use crate::value::Value;

/// Produces the human readable message for an event.
///
/// Implementations typically dispatch on the `data_type` attribute. The crate
/// ships none; this is the seam output layers plug their formatters into.
pub trait MessageFormatter {
    /// Returns the message, or `None` when the event cannot be described.
    fn format_message(&self, event: &EventObject) -> Option<String>;
}

const NO_FORMATTER_FALLBACK: &str = "Unable to print event, no formatter defined.";

impl EventObject {
    /// Renders `[timestamp] source_short/source_long - message`.
    ///
    /// A missing timestamp renders as 0 and missing or non-string sources as
    /// empty strings, so partially populated events still render.
    pub fn render(&self, formatter: &dyn MessageFormatter) -> String {
        let Some(message) = formatter.format_message(self) else {
            return NO_FORMATTER_FALLBACK.to_owned();
        };

        let time = self.timestamp().unwrap_or(0);
        let short = self.get_value("source_short").ok();
        let long = self.get_value("source_long").ok();
        let short = short.as_ref().and_then(Value::as_str).unwrap_or("");
        let long = long.as_ref().and_then(Value::as_str).unwrap_or("");

        format!("[{time}] {short}/{long} - {message}")
    }
}
