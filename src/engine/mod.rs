pub mod engine;
pub mod http;
pub mod image_client;
pub mod narrative_client;
pub mod pipeline;
pub mod preview;
pub mod protocol;

#[cfg(test)]
mod test_server;
