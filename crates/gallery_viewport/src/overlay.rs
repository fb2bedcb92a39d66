//! egui overlay drawn on top of the gallery: controls help, auto-rotate
//! toggle and a status line.

use egui::{Align2, Color32, RichText};

/// Seconds the controls help stays fully visible
pub const HELP_VISIBLE_SECS: f32 = 12.0;
const HELP_FADE_SECS: f32 = 0.5;

const HELP_LINES: [(&str, &str); 4] = [
    ("Mouse:", "Click + Drag to Orbit | Scroll to Zoom"),
    ("Touchpad:", "Two-finger Drag to Pan | Pinch to Zoom"),
    ("Right-click + Drag:", "Pan the Camera"),
    ("Keyboard:", "Arrow keys to Rotate | +/- to Zoom"),
];

const TOGGLE_ON: Color32 = Color32::from_rgba_premultiplied(0, 102, 0, 204);
const TOGGLE_OFF: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 204);

/// What the overlay reports about the current frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlayStatus {
    pub auto_rotate: bool,
    pub loads_done: usize,
    pub loads_total: usize,
    pub paintings: usize,
    pub placeholders: usize,
}

/// User actions taken in the overlay this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlayResponse {
    pub toggle_auto_rotate: bool,
}

pub fn auto_rotate_label(on: bool) -> &'static str {
    if on {
        "⟳ Auto-rotate: ON"
    } else {
        "⟳ Auto-rotate: OFF"
    }
}

pub struct Overlay {
    pub show_ui: bool,
    pub fps: f32,
    elapsed: f32,
    frame_count: u32,
    fps_update_timer: f32,
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Overlay {
    pub fn new() -> Self {
        Self {
            show_ui: true,
            fps: 0.0,
            elapsed: 0.0,
            frame_count: 0,
            fps_update_timer: 0.0,
        }
    }

    /// Advance timers (call each frame with delta_time)
    pub fn update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        self.frame_count += 1;
        self.fps_update_timer += delta_time;

        // Update FPS every 0.5 seconds
        if self.fps_update_timer >= 0.5 {
            self.fps = self.frame_count as f32 / self.fps_update_timer;
            self.frame_count = 0;
            self.fps_update_timer = 0.0;
        }
    }

    /// Opacity of the controls help: opaque, then a short fade to zero.
    pub fn help_opacity(&self) -> f32 {
        (1.0 - (self.elapsed - HELP_VISIBLE_SECS) / HELP_FADE_SECS).clamp(0.0, 1.0)
    }

    pub fn show(&mut self, ctx: &egui::Context, status: &OverlayStatus) -> OverlayResponse {
        let mut response = OverlayResponse::default();
        if !self.show_ui {
            return response;
        }

        let opacity = self.help_opacity();
        if opacity > 0.0 {
            let text = Color32::WHITE.gamma_multiply(opacity);
            egui::Area::new(egui::Id::new("controls_help"))
                .anchor(Align2::RIGHT_BOTTOM, [-20.0, -20.0])
                .interactable(false)
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(Color32::from_black_alpha(204).gamma_multiply(opacity))
                        .rounding(8.0)
                        .inner_margin(egui::Margin::symmetric(16.0, 12.0))
                        .show(ui, |ui| {
                            ui.vertical_centered(|ui| {
                                ui.label(RichText::new("Gallery Controls").strong().color(text));
                            });
                            ui.add_space(8.0);
                            for (title, body) in HELP_LINES {
                                ui.horizontal(|ui| {
                                    ui.label(RichText::new(title).strong().color(text));
                                    ui.label(RichText::new(body).color(text));
                                });
                            }
                        });
                });
        }

        egui::Area::new(egui::Id::new("auto_rotate_toggle"))
            .anchor(Align2::LEFT_BOTTOM, [20.0, -20.0])
            .show(ctx, |ui| {
                let fill = if status.auto_rotate { TOGGLE_ON } else { TOGGLE_OFF };
                let button = egui::Button::new(
                    RichText::new(auto_rotate_label(status.auto_rotate)).color(Color32::WHITE),
                )
                .fill(fill)
                .rounding(4.0);
                if ui.add(button).clicked() {
                    response.toggle_auto_rotate = true;
                }
            });

        egui::Area::new(egui::Id::new("status_line"))
            .anchor(Align2::LEFT_TOP, [12.0, 12.0])
            .interactable(false)
            .show(ctx, |ui| {
                let mut line = format!("FPS: {:.1}", self.fps);
                if status.loads_total > 0 {
                    line.push_str(&format!(
                        " | Textures: {}/{}",
                        status.loads_done, status.loads_total
                    ));
                }
                line.push_str(&format!(
                    " | Paintings: {} | Open frames: {}",
                    status.paintings, status.placeholders
                ));
                ui.label(RichText::new(line).color(Color32::from_gray(60)).small());
            });

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_fades_after_twelve_seconds() {
        let mut overlay = Overlay::new();
        assert_eq!(overlay.help_opacity(), 1.0);

        overlay.update(11.9);
        assert_eq!(overlay.help_opacity(), 1.0);

        overlay.update(0.35);
        let fading = overlay.help_opacity();
        assert!(fading > 0.0 && fading < 1.0);

        overlay.update(1.0);
        assert_eq!(overlay.help_opacity(), 0.0);
    }

    #[test]
    fn test_fps_counter() {
        let mut overlay = Overlay::new();
        for _ in 0..40 {
            overlay.update(1.0 / 60.0);
        }
        assert!((overlay.fps - 60.0).abs() < 1.0);
    }

    #[test]
    fn test_toggle_labels() {
        assert_eq!(auto_rotate_label(true), "⟳ Auto-rotate: ON");
        assert_eq!(auto_rotate_label(false), "⟳ Auto-rotate: OFF");
    }

    #[test]
    fn test_overlay_runs_headless() {
        let ctx = egui::Context::default();
        let mut overlay = Overlay::new();
        let status = OverlayStatus {
            auto_rotate: true,
            loads_done: 1,
            loads_total: 3,
            paintings: 3,
            placeholders: 4,
        };

        let mut response = OverlayResponse::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            response = overlay.show(ctx, &status);
        });
        assert!(!response.toggle_auto_rotate);
    }
}
