use compactor_core::{AppViewModel, ProgressRing};

use super::surface::{Controls, Surface};

pub fn render(view: &AppViewModel, ring: &ProgressRing, surface: &mut dyn Surface) {
    surface.set_file(view.file_name.as_deref(), &view.preview);
    surface.set_controls(Controls {
        submit_enabled: view.submit_enabled,
        cancel_visible: view.cancel_visible,
        delete_visible: view.delete_visible,
        form_error_visible: view.form_error_visible,
        drop_highlighted: view.drop_highlighted,
    });
    surface.set_overlay(view.overlay_visible);
    surface.set_percent(&view.progress, ring.stroke_offset(view.progress.percent));
    surface.set_time_left(&view.time_left);
    surface.set_busy(view.submit_busy);
    surface.set_page(view.nav_scrolled, view.panel_revealed);
}
