#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelStatus {
    Illustrated { text: String, image_url: String },
    ImageFailed { text: String },
    NoText,
}

/// One unit of generated output. `ordinal` starts at 1 and follows the
/// order chunks arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub ordinal: usize,
    pub status: PanelStatus,
}

impl Panel {
    pub fn text(&self) -> Option<&str> {
        match &self.status {
            PanelStatus::Illustrated { text, .. } | PanelStatus::ImageFailed { text } => Some(text),
            PanelStatus::NoText => None,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match &self.status {
            PanelStatus::Illustrated { image_url, .. } => Some(image_url),
            _ => None,
        }
    }
}
