use std::time::Duration;

pub const BAR_WIDTH: u16 = 40;
pub const SPINNER_TICK: Duration = Duration::from_millis(120);
pub const FORM_ERROR_TEXT: &str = "Select a file before compressing.";
