use std::sync::mpsc::{Receiver, Sender};

use tracing::{error, info, warn};

use crate::engine::image_client::ImageGenerator;
use crate::engine::narrative_client::NarrativeSource;
use crate::engine::pipeline::build_panels;
use crate::engine::preview::PreviewLoader;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::image::ImageParams;
use crate::model::prompt::Prompt;

/// Worker that owns both service clients and the chat session. Commands
/// are handled one at a time, so no two generations ever overlap.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    narrative: Box<dyn NarrativeSource + Send>,
    images: Box<dyn ImageGenerator + Send>,
    previews: Box<dyn PreviewLoader + Send>,
    params: ImageParams,
    repaint: Option<egui::Context>,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        narrative: Box<dyn NarrativeSource + Send>,
        images: Box<dyn ImageGenerator + Send>,
        previews: Box<dyn PreviewLoader + Send>,
    ) -> Self {
        Self {
            rx,
            tx,
            narrative,
            images,
            previews,
            params: ImageParams::FIXED,
            repaint: None,
        }
    }

    /// Wake the UI after every response instead of waiting for input.
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::GenerateStory(prompt) => self.generate(&prompt),
            }
        }
        info!("engine stopped");
    }

    fn generate(&mut self, prompt: &Prompt) {
        info!(prompt_len = prompt.as_str().len(), "generating story");
        send(&self.tx, &self.repaint, EngineResponse::GenerationStarted);

        let tx = &self.tx;
        let repaint = &self.repaint;
        let previews = &self.previews;

        let run = build_panels(
            self.narrative.as_mut(),
            self.images.as_ref(),
            &self.params,
            prompt,
            |panel| {
                send(tx, repaint, EngineResponse::PanelReady(panel.clone()));

                let Some(url) = panel.image_url() else {
                    return;
                };
                let resp = match previews.load(url) {
                    Ok(image) => EngineResponse::PreviewReady {
                        ordinal: panel.ordinal,
                        image,
                    },
                    Err(e) => {
                        warn!(ordinal = panel.ordinal, error = %format!("{e:#}"), "preview failed");
                        EngineResponse::PreviewFailed {
                            ordinal: panel.ordinal,
                            reason: format!("{e:#}"),
                        }
                    }
                };
                send(tx, repaint, resp);
            },
        );

        if let Some(e) = run.error {
            error!(service = %e.service(), error = %e, "story generation aborted");
            send(tx, repaint, EngineResponse::GenerationFailed(e.to_string()));
        }

        send(
            tx,
            repaint,
            EngineResponse::GenerationFinished {
                panels: run.panels.len(),
            },
        );
    }
}

fn send(tx: &Sender<EngineResponse>, repaint: &Option<egui::Context>, resp: EngineResponse) {
    let _ = tx.send(resp);
    if let Some(ctx) = repaint {
        ctx.request_repaint();
    }
}
