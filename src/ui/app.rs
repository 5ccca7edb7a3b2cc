use std::sync::mpsc;

use anyhow::{Context, Result};
use eframe::egui;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::engine::engine::Engine;
use crate::engine::image_client::ReplicateClient;
use crate::engine::narrative_client::{GeminiClient, Storyteller};
use crate::engine::preview::HttpPreviewLoader;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::panel::Panel;
use crate::model::prompt::Prompt;
use crate::ui::settings::UiSettings;
use crate::ui::settings_io::{load_settings, save_settings};
use crate::ui::story_panel::draw_story_panel;

pub const TITLE: &str = "Story Generator with Gemini and Replicate";
pub const EMPTY_PROMPT_WARNING: &str = "Please enter a story prompt to generate the story.";

/* =========================
   Panel view state
   ========================= */

pub enum PreviewState {
    Loading,
    Ready(egui::TextureHandle),
    Unavailable(String),
}

pub struct PanelView {
    pub panel: Panel,
    pub preview: PreviewState,
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub prompt_input: String,
    pub panels: Vec<PanelView>,
    pub busy: bool,
    pub has_generated: bool,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub settings: UiSettings,
}

impl UiState {
    /// Validates the prompt and starts a fresh generation. Returns `None`
    /// when nothing should reach the engine.
    pub fn submit(&mut self) -> Option<EngineCommand> {
        if self.busy {
            return None;
        }

        self.error = None;
        self.panels.clear();

        let Some(prompt) = Prompt::parse(&self.prompt_input) else {
            self.warning = Some(EMPTY_PROMPT_WARNING.into());
            return None;
        };

        self.warning = None;
        self.busy = true;
        self.has_generated = true;

        Some(EngineCommand::GenerateStory(prompt))
    }

    pub fn apply(&mut self, ctx: &egui::Context, resp: EngineResponse) {
        match resp {
            EngineResponse::GenerationStarted => {
                self.busy = true;
            }

            EngineResponse::PanelReady(panel) => {
                self.panels.push(PanelView {
                    panel,
                    preview: PreviewState::Loading,
                });
            }

            EngineResponse::PreviewReady { ordinal, image } => {
                if let Some(view) = self.panel_mut(ordinal) {
                    let texture = ctx.load_texture(
                        format!("panel-{ordinal}"),
                        image,
                        egui::TextureOptions::LINEAR,
                    );
                    view.preview = PreviewState::Ready(texture);
                }
            }

            EngineResponse::PreviewFailed { ordinal, reason } => {
                if let Some(view) = self.panel_mut(ordinal) {
                    view.preview = PreviewState::Unavailable(reason);
                }
            }

            EngineResponse::GenerationFailed(msg) => {
                self.error = Some(msg);
            }

            EngineResponse::GenerationFinished { panels } => {
                debug!(panels, "generation finished");
                self.busy = false;
            }
        }
    }

    fn panel_mut(&mut self, ordinal: usize) -> Option<&mut PanelView> {
        self.panels.iter_mut().find(|v| v.panel.ordinal == ordinal)
    }
}

/* =========================
   App
   ========================= */

pub struct StoryApp {
    pub(crate) ui: UiState,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl StoryApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &AppConfig) -> Result<Self> {
        let creds = &config.credentials;

        let storyteller = Storyteller::new(
            GeminiClient::new(&creds.gemini_api_key, &config.gemini_base_url)?,
            &config.gemini_model,
        );
        let images = ReplicateClient::new(
            &creds.replicate_api_token,
            &config.replicate_base_url,
            &config.replicate_model_version,
            config.poll_interval,
        )?;
        let previews = HttpPreviewLoader::new()?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let mut engine = Engine::new(
            cmd_rx,
            resp_tx,
            Box::new(storyteller),
            Box::new(images),
            Box::new(previews),
        )
        .with_repaint(cc.egui_ctx.clone());

        std::thread::Builder::new()
            .name("story-engine".into())
            .spawn(move || engine.run())
            .context("spawning engine thread")?;

        info!(model = %config.gemini_model, "engine started");

        Ok(Self {
            ui: UiState {
                settings: load_settings(),
                ..Default::default()
            },
            cmd_tx,
            resp_rx,
        })
    }

    pub(crate) fn send_command(&mut self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            error!("engine thread is gone");
            self.ui.busy = false;
            self.ui.error = Some("The story engine stopped unexpectedly.".into());
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for StoryApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.ui.settings.ui_scale);

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.ui.apply(ctx, resp);
        }

        egui::SidePanel::left("settings")
            .resizable(false)
            .default_width(160.0)
            .show(ctx, |ui| {
                ui.heading("Settings");
                ui.separator();

                ui.label("UI Scale");
                let scale = ui.add(egui::Slider::new(&mut self.ui.settings.ui_scale, 0.75..=2.0));

                ui.label("Image width");
                let width = ui.add(egui::Slider::new(
                    &mut self.ui.settings.preview_width,
                    128.0..=1024.0,
                ));

                if scale.drag_stopped() || width.drag_stopped() {
                    save_settings(&self.ui.settings);
                }
            });

        draw_story_panel(ctx, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::panel::PanelStatus;

    fn illustrated(ordinal: usize) -> Panel {
        Panel {
            ordinal,
            status: PanelStatus::Illustrated {
                text: format!("text {ordinal}"),
                image_url: format!("https://img.test/{ordinal}.png"),
            },
        }
    }

    #[test]
    fn empty_prompt_warns_and_sends_nothing() {
        let mut state = UiState::default();
        state.prompt_input = "   ".into();

        assert!(state.submit().is_none());
        assert_eq!(state.warning.as_deref(), Some(EMPTY_PROMPT_WARNING));
        assert!(!state.busy);
        assert!(!state.has_generated);
    }

    #[test]
    fn submit_clears_previous_story() {
        let ctx = egui::Context::default();
        let mut state = UiState::default();
        state.apply(&ctx, EngineResponse::PanelReady(illustrated(1)));
        state.error = Some("old".into());
        state.warning = Some(EMPTY_PROMPT_WARNING.into());
        state.prompt_input = "A cat finds a key".into();

        let cmd = state.submit();

        assert!(matches!(
            cmd,
            Some(EngineCommand::GenerateStory(ref p)) if p.as_str() == "A cat finds a key"
        ));
        assert!(state.panels.is_empty());
        assert!(state.error.is_none());
        assert!(state.warning.is_none());
        assert!(state.busy);
    }

    #[test]
    fn empty_prompt_after_failed_run_shows_only_the_warning() {
        let ctx = egui::Context::default();
        let mut state = UiState::default();
        state.prompt_input = "A cat finds a key".into();
        state.submit();
        state.apply(&ctx, EngineResponse::PanelReady(illustrated(1)));
        state.apply(
            &ctx,
            EngineResponse::GenerationFailed("Replicate returned HTTP 401: Unauthenticated".into()),
        );
        state.apply(&ctx, EngineResponse::GenerationFinished { panels: 1 });

        state.prompt_input = String::new();
        let cmd = state.submit();

        assert!(cmd.is_none());
        assert!(state.panels.is_empty());
        assert!(state.error.is_none());
        assert_eq!(state.warning.as_deref(), Some(EMPTY_PROMPT_WARNING));
        assert!(state.has_generated);
        assert!(!state.busy);
    }

    #[test]
    fn no_second_submit_while_busy() {
        let mut state = UiState::default();
        state.prompt_input = "prompt".into();

        assert!(state.submit().is_some());
        assert!(state.submit().is_none());
    }

    #[test]
    fn panels_keep_arrival_order_and_survive_errors() {
        let ctx = egui::Context::default();
        let mut state = UiState::default();
        state.prompt_input = "prompt".into();
        state.submit();

        state.apply(&ctx, EngineResponse::GenerationStarted);
        state.apply(&ctx, EngineResponse::PanelReady(illustrated(1)));
        state.apply(
            &ctx,
            EngineResponse::PanelReady(Panel {
                ordinal: 2,
                status: PanelStatus::NoText,
            }),
        );
        state.apply(&ctx, EngineResponse::GenerationFailed("boom".into()));
        state.apply(&ctx, EngineResponse::GenerationFinished { panels: 2 });

        let ordinals: Vec<usize> = state.panels.iter().map(|v| v.panel.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(!state.busy);
    }

    #[test]
    fn previews_attach_to_their_panel() {
        let ctx = egui::Context::default();
        let mut state = UiState::default();
        state.apply(&ctx, EngineResponse::PanelReady(illustrated(1)));
        state.apply(&ctx, EngineResponse::PanelReady(illustrated(2)));

        state.apply(
            &ctx,
            EngineResponse::PreviewFailed {
                ordinal: 2,
                reason: "404".into(),
            },
        );
        state.apply(
            &ctx,
            EngineResponse::PreviewReady {
                ordinal: 1,
                image: egui::ColorImage::from_rgba_unmultiplied([1, 1], &[0, 0, 0, 255]),
            },
        );

        assert!(matches!(state.panels[0].preview, PreviewState::Ready(_)));
        assert!(matches!(
            state.panels[1].preview,
            PreviewState::Unavailable(ref r) if r == "404"
        ));
    }
}
