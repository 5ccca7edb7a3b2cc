use egui::ColorImage;

use crate::model::panel::Panel;
use crate::model::prompt::Prompt;

pub enum EngineCommand {
    GenerateStory(Prompt),
}

pub enum EngineResponse {
    GenerationStarted,

    PanelReady(Panel),

    PreviewReady {
        ordinal: usize,
        image: ColorImage,
    },

    PreviewFailed {
        ordinal: usize,
        reason: String,
    },

    /// The run stopped early. Panels already sent stay valid.
    GenerationFailed(String),

    GenerationFinished {
        panels: usize,
    },
}
