use tracing::{debug, info, warn};

use crate::engine::image_client::ImageGenerator;
use crate::engine::narrative_client::NarrativeSource;
use crate::error::ServiceError;
use crate::model::image::{ImageOutcome, ImageParams};
use crate::model::panel::{Panel, PanelStatus};
use crate::model::prompt::Prompt;
use crate::model::story_chunk::StoryChunk;

/// Everything one generation produced. Panels completed before an error are
/// kept.
#[derive(Debug, Default)]
pub struct PipelineRun {
    pub panels: Vec<Panel>,
    pub error: Option<ServiceError>,
}

/// Streams the story and illustrates each chunk, one at a time and in
/// order. The first service error stops the run.
pub fn build_panels<N, I>(
    narrative: &mut N,
    images: &I,
    params: &ImageParams,
    prompt: &Prompt,
    mut on_panel: impl FnMut(&Panel),
) -> PipelineRun
where
    N: NarrativeSource + ?Sized,
    I: ImageGenerator + ?Sized,
{
    let mut run = PipelineRun::default();

    let stream = match narrative.generate_story(prompt) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "story request failed");
            run.error = Some(e);
            return run;
        }
    };

    for (index, chunk) in stream.enumerate() {
        let ordinal = index + 1;

        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(ordinal, error = %e, "story stream failed");
                run.error = Some(e);
                break;
            }
        };

        let status = match chunk {
            StoryChunk::NoText => PanelStatus::NoText,
            StoryChunk::HasText(text) => match images.generate_image(&text, params) {
                Ok(ImageOutcome::HasImage(image_url)) => PanelStatus::Illustrated { text, image_url },
                Ok(ImageOutcome::NoImage) => PanelStatus::ImageFailed { text },
                Err(e) => {
                    warn!(ordinal, error = %e, "image request failed");
                    run.error = Some(e);
                    break;
                }
            },
        };

        let panel = Panel { ordinal, status };
        debug!(
            ordinal,
            has_text = panel.text().is_some(),
            has_image = panel.image_url().is_some(),
            "panel ready"
        );
        on_panel(&panel);
        run.panels.push(panel);
    }

    info!(
        panels = run.panels.len(),
        failed = run.error.is_some(),
        "story generation finished"
    );
    run
}

/* =========================
   Test doubles
   ========================= */
