use std::f64::consts::PI;

pub const TIME_LEFT_PLACEHOLDER: &str = "Time left: --:--";

/// Round and clamp a reported percentage into `0..=100`. Non-finite input maps to 0.
pub fn clamp_percent(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

pub fn percent_label(percent: u8) -> String {
    format!("{percent}%")
}

/// Both indicators are tinted once any progress has been reported.
pub fn is_tinted(percent: u8) -> bool {
    percent > 0
}

/// Whole seconds from a reported `time_left`, floored; negative or non-finite is 0.
pub fn time_left_seconds(raw: f64) -> u64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.floor() as u64
}

/// `Time left: MM:SS`, or the placeholder when nothing has been reported.
pub fn format_time_left(seconds: Option<u64>) -> String {
    match seconds {
        Some(s) => format!("Time left: {:02}:{:02}", s / 60, s % 60),
        None => TIME_LEFT_PLACEHOLDER.to_string(),
    }
}

/// Circular progress indicator drawn as a stroked arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRing {
    radius: f64,
}

impl ProgressRing {
    pub fn new(radius: f64) -> Self {
        Self {
            radius: radius.max(0.0),
        }
    }

    pub fn circumference(&self) -> f64 {
        2.0 * PI * self.radius
    }

    /// Dash offset hiding the unfinished part of the arc.
    pub fn stroke_offset(&self, percent: u8) -> f64 {
        let circumference = self.circumference();
        let clamped = f64::from(percent.min(100));
        circumference - (clamped / 100.0) * circumference
    }
}

impl Default for ProgressRing {
    fn default() -> Self {
        Self::new(54.0)
    }
}
