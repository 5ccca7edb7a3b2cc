pub mod image;
pub mod panel;
pub mod prompt;
pub mod story_chunk;
