pub mod app;
pub mod settings;
pub mod settings_io;
pub mod story_panel;
