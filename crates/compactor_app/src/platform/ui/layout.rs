use indicatif::{ProgressBar, ProgressStyle};

use super::constants::BAR_WIDTH;

/// Hidden bar with the shared style; drawn only while the overlay is shown.
pub fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::hidden();
    bar.set_length(100);
    bar.set_style(progress_style(false));
    bar
}

/// The tint turns the bar green once any progress has been reported.
pub fn progress_style(tinted: bool) -> ProgressStyle {
    let color = if tinted { "green" } else { "white" };
    let template =
        format!("{{spinner}} {{bar:{BAR_WIDTH}.{color}/white}} {{prefix:>4}}  {{msg}}");
    match ProgressStyle::with_template(&template) {
        Ok(style) => style.progress_chars("█▓░"),
        Err(_) => ProgressStyle::default_bar(),
    }
}
