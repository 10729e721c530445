use std::fmt::Write;

/// Top-left corner of the help overlay, in logical pixels.
pub const HELP_POSITION: egui::Pos2 = egui::pos2(25.0, 15.0);

/// Key and mouse help shown over the scene.
pub fn help_text(fps: f32, animation_count: usize) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "FPS: {:.0}", fps);
    let _ = writeln!(text);
    let _ = writeln!(text, "(keys 1-4): load and display the 4 models");
    let _ = writeln!(text, "num of animations in this model: {animation_count}");
    let _ = writeln!(text, "(Spacebar): toggle animation");
    let _ = write!(text, "(LEFT MOUSE BUTTON DRAG in y-axis): control animation.");
    text
}

/// Draw the help overlay when `visible` is set.
pub fn show(ctx: &egui::Context, visible: bool, fps: f32, animation_count: usize) {
    if !visible {
        return;
    }

    egui::Area::new(egui::Id::new("help_text"))
        .fixed_pos(HELP_POSITION)
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(help_text(fps, animation_count))
                    .monospace()
                    .color(egui::Color32::BLACK),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_keys_and_animation_count() {
        let text = help_text(59.6, 3);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "FPS: 60");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "(keys 1-4): load and display the 4 models");
        assert_eq!(lines[3], "num of animations in this model: 3");
        assert_eq!(lines[4], "(Spacebar): toggle animation");
        assert_eq!(lines[5], "(LEFT MOUSE BUTTON DRAG in y-axis): control animation.");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn hidden_overlay_draws_nothing() {
        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| show(ctx, false, 60.0, 1));
        assert!(output.shapes.is_empty());
    }

    #[test]
    fn visible_overlay_draws_text() {
        let ctx = egui::Context::default();
        // New areas are measured on their first frame
        let _ = ctx.run(egui::RawInput::default(), |ctx| show(ctx, true, 60.0, 1));
        let output = ctx.run(egui::RawInput::default(), |ctx| show(ctx, true, 60.0, 1));
        assert!(!output.shapes.is_empty());
    }

    #[test]
    fn overlay_follows_the_help_key() {
        let mut viewer = crate::viewer::Viewer::new(
            crate::settings::ViewerSettings::default(),
            [800.0, 600.0],
        );
        viewer.key_pressed('h');

        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            show(ctx, viewer.show_help(), 60.0, 0)
        });
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            show(ctx, viewer.show_help(), 60.0, 0)
        });
        assert!(output.shapes.is_empty());
    }
}
