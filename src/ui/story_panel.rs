use eframe::egui;

use super::app::{PanelView, PreviewState, StoryApp, TITLE};
use crate::model::panel::PanelStatus;
use crate::ui::settings::UiSettings;

const INSTRUCTIONS: &str =
    "Enter your story prompt or topic and generate images for each panel of the story.";
const IDLE_HINT: &str = "Click the 'Generate story' button to create your story panels.";
const NOTE: &str = "Note: The story generation process might take a few moments.";

pub fn draw_story_panel(ctx: &egui::Context, app: &mut StoryApp) {
    let input_id = egui::Id::new("story_prompt_input");

    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading(TITLE);
            ui.label(INSTRUCTIONS);
            ui.add_space(8.0);

            // ---------- Prompt ----------
            ui.label("Enter the story prompt or topic:");
            ui.add(
                egui::TextEdit::multiline(&mut app.ui.prompt_input)
                    .id(input_id)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY)
                    .hint_text("A cat finds a key…"),
            );

            let clicked = ui
                .add_enabled(!app.ui.busy, egui::Button::new("Generate story"))
                .clicked();

            if clicked {
                if let Some(cmd) = app.ui.submit() {
                    app.send_command(cmd);
                }
            }

            ui.add_space(8.0);

            // ---------- Status ----------
            let settings = &app.ui.settings;

            if let Some(warning) = &app.ui.warning {
                ui.colored_label(settings.color("Warning"), warning.as_str());
            } else if !app.ui.has_generated {
                ui.colored_label(settings.color("Info"), IDLE_HINT);
            }

            if app.ui.busy {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Generating story...");
                });
            }

            // ---------- Panels ----------
            for view in &app.ui.panels {
                draw_panel(ui, settings, view);
            }

            if let Some(err) = &app.ui.error {
                ui.colored_label(settings.color("Error"), format!("An error occurred: {err}"));
            }

            ui.separator();
            ui.label(NOTE);
        });
    });
}

fn draw_panel(ui: &mut egui::Ui, settings: &UiSettings, view: &PanelView) {
    let n = view.panel.ordinal;

    match &view.panel.status {
        PanelStatus::Illustrated { text, image_url } => {
            ui.add_space(12.0);
            ui.heading(format!("Panel {n}:"));
            ui.label(text.as_str());

            match &view.preview {
                PreviewState::Ready(texture) => {
                    ui.add(egui::Image::new(texture).max_width(settings.preview_width));
                }
                PreviewState::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.weak("Loading image…");
                    });
                }
                PreviewState::Unavailable(reason) => {
                    ui.hyperlink_to("Open generated image", image_url);
                    ui.weak(format!("Preview unavailable: {reason}"));
                }
            }

            ui.small(format!("Generated image for panel {n}"));
        }

        PanelStatus::ImageFailed { text } => {
            ui.add_space(12.0);
            ui.heading(format!("Panel {n}:"));
            ui.label(text.as_str());
            ui.colored_label(
                settings.color("Error"),
                format!("Failed to generate image for panel {n}."),
            );
        }

        PanelStatus::NoText => {
            ui.colored_label(settings.color("Warning"), format!("Panel {n} has no text."));
        }
    }
}
