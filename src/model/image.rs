use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Refiner {
    ExpertEnsembleRefiner,
}

/// Generation settings sent alongside every panel prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageParams {
    pub width: u32,
    pub height: u32,
    pub refine: Refiner,
    pub apply_watermark: bool,
    pub num_inference_steps: u32,
}

impl ImageParams {
    pub const FIXED: ImageParams = ImageParams {
        width: 512,
        height: 512,
        refine: Refiner::ExpertEnsembleRefiner,
        apply_watermark: false,
        num_inference_steps: 25,
    };
}

/// Result of one image request that reached the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    HasImage(String),
    NoImage,
}
