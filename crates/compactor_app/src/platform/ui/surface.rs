use compactor_core::{PreviewView, ProgressView};
use compactor_logging::{compactor_debug, compactor_trace};
use indicatif::{ProgressBar, ProgressDrawTarget};

use super::constants::{FORM_ERROR_TEXT, SPINNER_TICK};
use super::layout::{progress_bar, progress_style};

/// Button and indicator visibility derived from the view model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub submit_enabled: bool,
    pub cancel_visible: bool,
    pub delete_visible: bool,
    pub form_error_visible: bool,
    pub drop_highlighted: bool,
}

/// Narrow rendering interface the controller draws onto.
pub trait Surface {
    fn set_percent(&mut self, progress: &ProgressView, stroke_offset: f64);
    fn set_time_left(&mut self, text: &str);
    fn set_busy(&mut self, busy: bool);
    fn set_overlay(&mut self, visible: bool);
    fn set_file(&mut self, name: Option<&str>, preview: &PreviewView);
    fn set_controls(&mut self, controls: Controls);
    fn set_page(&mut self, nav_scrolled: bool, panel_revealed: bool);
    fn alert(&mut self, message: &str);
    fn focus_submit(&mut self);
    fn scroll_to_form(&mut self, margin: u32);
}

/// Draws the overlay as an indicatif bar on stderr; other state is logged or printed once.
pub struct TerminalSurface {
    bar: ProgressBar,
    overlay: bool,
    busy: bool,
    tinted: bool,
    file: Option<(String, PreviewView)>,
    controls: Controls,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            bar: progress_bar(),
            overlay: false,
            busy: false,
            tinted: false,
            file: None,
            controls: Controls::default(),
        }
    }

    fn line(&self, text: &str) {
        if self.overlay {
            self.bar.println(text);
        } else {
            eprintln!("{text}");
        }
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for TerminalSurface {
    fn set_percent(&mut self, progress: &ProgressView, stroke_offset: f64) {
        if progress.tinted != self.tinted {
            self.tinted = progress.tinted;
            self.bar.set_style(progress_style(progress.tinted));
        }
        self.bar.set_position(u64::from(progress.percent));
        self.bar.set_prefix(progress.label.clone());
        compactor_trace!("ring offset {:.2} at {}", stroke_offset, progress.label);
    }

    fn set_time_left(&mut self, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn set_busy(&mut self, busy: bool) {
        if busy == self.busy {
            return;
        }
        self.busy = busy;
        if busy {
            self.bar.enable_steady_tick(SPINNER_TICK);
        } else {
            self.bar.disable_steady_tick();
        }
    }

    fn set_overlay(&mut self, visible: bool) {
        if visible == self.overlay {
            return;
        }
        self.overlay = visible;
        if visible {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
        } else {
            self.bar.finish_and_clear();
            self.bar = progress_bar();
            self.tinted = false;
            self.busy = false;
        }
    }

    fn set_file(&mut self, name: Option<&str>, preview: &PreviewView) {
        let Some(name) = name else {
            self.file = None;
            return;
        };
        let unchanged = self
            .file
            .as_ref()
            .is_some_and(|(current, shown)| current == name && shown == preview);
        if unchanged {
            return;
        }
        match preview {
            PreviewView::Hidden => self.line(&format!("File: {name}")),
            PreviewView::Decoding => self.line(&format!("File: {name} (loading preview)")),
            PreviewView::Image { data_url } => self.line(&format!(
                "File: {name} (image preview ready, {} bytes encoded)",
                data_url.len()
            )),
        }
        self.file = Some((name.to_string(), preview.clone()));
    }

    fn set_controls(&mut self, controls: Controls) {
        if controls == self.controls {
            return;
        }
        if controls.form_error_visible && !self.controls.form_error_visible {
            self.line(FORM_ERROR_TEXT);
        }
        compactor_debug!("Controls {:?}", controls);
        self.controls = controls;
    }

    fn set_page(&mut self, nav_scrolled: bool, panel_revealed: bool) {
        compactor_trace!(
            "Page nav_scrolled={} panel_revealed={}",
            nav_scrolled,
            panel_revealed
        );
    }

    fn alert(&mut self, message: &str) {
        self.line(&format!("error: {message}"));
    }

    fn focus_submit(&mut self) {
        compactor_debug!("Focus moved to submit");
    }

    fn scroll_to_form(&mut self, margin: u32) {
        compactor_debug!("Scroll to form with {}px margin", margin);
    }
}
