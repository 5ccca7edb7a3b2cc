/// One fragment of the streamed story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryChunk {
    HasText(String),
    NoText,
}

impl StoryChunk {
    pub fn from_text(text: String) -> Self {
        if text.is_empty() {
            StoryChunk::NoText
        } else {
            StoryChunk::HasText(text)
        }
    }
}
