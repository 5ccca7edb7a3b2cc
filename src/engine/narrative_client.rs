use std::io::{BufRead, BufReader, Lines};

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::http::{build_client, check_status, transport};
use crate::error::{Service, ServiceError};
use crate::model::prompt::Prompt;
use crate::model::story_chunk::StoryChunk;

/* =========================
   Wire format
   ========================= */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Content {
    fn text(role: &str, text: String) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part { text: Some(text) }],
        }
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
}

impl GenerateContentResponse {
    /// Joined text parts of the first candidate.
    pub fn into_chunk(self) -> StoryChunk {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        StoryChunk::from_text(text)
    }
}

/// Payload of an SSE `data:` line. Blank lines, comments and other
/// fields yield `None`.
pub fn sse_payload(line: &str) -> Option<&str> {
    let line = line.trim_end_matches('\r');
    line.strip_prefix("data:").map(str::trim_start)
}

pub fn decode_event(payload: &str) -> Result<StoryChunk, ServiceError> {
    let resp: GenerateContentResponse =
        serde_json::from_str(payload).map_err(|source| ServiceError::Decode {
            service: Service::Gemini,
            source,
        })?;

    if let Some(err) = resp.error {
        return Err(ServiceError::Stream {
            service: Service::Gemini,
            message: err.message,
        });
    }

    Ok(resp.into_chunk())
}

/* =========================
   Chat session
   ========================= */

/// Conversation history for one model. Owned by the engine and lent to each
/// request, so only one request can use it at a time.
#[derive(Debug, Clone)]
pub struct ChatSession {
    model: String,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            history: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    fn contents_with(&self, prompt: &str) -> Vec<Content> {
        let mut contents = self.history.clone();
        contents.push(Content::text("user", prompt.to_string()));
        contents
    }

    fn record_exchange(&mut self, prompt: String, reply: String) {
        // Gemini rejects turns without text, so keep user/model pairs intact.
        if reply.is_empty() {
            return;
        }
        self.history.push(Content::text("user", prompt));
        self.history.push(Content::text("model", reply));
    }
}

/* =========================
   Streaming reply
   ========================= */

/// Lazy, single-pass stream of chunks. The exchange is written to the
/// session only once the stream ends cleanly.
pub struct StoryStream<'s, R: BufRead> {
    lines: Lines<R>,
    session: &'s mut ChatSession,
    prompt: String,
    reply: String,
    finished: bool,
}

impl<'s, R: BufRead> StoryStream<'s, R> {
    pub fn new(reader: R, session: &'s mut ChatSession, prompt: &str) -> Self {
        Self {
            lines: reader.lines(),
            session,
            prompt: prompt.to_string(),
            reply: String::new(),
            finished: false,
        }
    }

    fn fail(&mut self, err: ServiceError) -> Option<Result<StoryChunk, ServiceError>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for StoryStream<'_, R> {
    type Item = Result<StoryChunk, ServiceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                None => {
                    self.finished = true;
                    let prompt = std::mem::take(&mut self.prompt);
                    let reply = std::mem::take(&mut self.reply);
                    debug!(reply_len = reply.len(), "story stream complete");
                    self.session.record_exchange(prompt, reply);
                    return None;
                }
                Some(Err(e)) => {
                    return self.fail(ServiceError::Stream {
                        service: Service::Gemini,
                        message: e.to_string(),
                    });
                }
                Some(Ok(line)) => line,
            };

            let Some(payload) = sse_payload(&line) else {
                continue;
            };

            match decode_event(payload) {
                Ok(chunk) => {
                    if let StoryChunk::HasText(text) = &chunk {
                        self.reply.push_str(text);
                    }
                    return Some(Ok(chunk));
                }
                Err(e) => return self.fail(e),
            }
        }
    }
}

/* =========================
   Client
   ========================= */

pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ServiceError> {
        Ok(Self::with_http(build_client(Service::Gemini)?, api_key, base_url))
    }

    pub fn with_http(http: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn start_chat(&self, model: impl Into<String>) -> ChatSession {
        ChatSession::new(model)
    }

    /// Sends one user turn and returns the reply as it streams in.
    pub fn send_message_stream<'s>(
        &self,
        session: &'s mut ChatSession,
        prompt: &str,
    ) -> Result<StoryStream<'s, BufReader<Response>>, ServiceError> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url,
            session.model()
        );
        let contents = session.contents_with(prompt);

        info!(
            model = session.model(),
            history = session.history().len(),
            "sending story prompt"
        );

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest { contents: &contents })
            .send()
            .map_err(transport(Service::Gemini))?;

        let resp = check_status(Service::Gemini, resp)?;

        Ok(StoryStream::new(BufReader::new(resp), session, prompt))
    }
}

/* =========================
   Narrative source
   ========================= */

pub type ChunkStream<'a> = Box<dyn Iterator<Item = Result<StoryChunk, ServiceError>> + 'a>;

/// Anything that turns a prompt into a stream of story chunks.
pub trait NarrativeSource {
    fn generate_story<'a>(&'a mut self, prompt: &Prompt) -> Result<ChunkStream<'a>, ServiceError>;
}

/// Gemini client plus the one chat session it keeps for the process lifetime.
pub struct Storyteller {
    client: GeminiClient,
    session: ChatSession,
}

impl Storyteller {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        let session = client.start_chat(model);
        Self { client, session }
    }
}

impl NarrativeSource for Storyteller {
    fn generate_story<'a>(&'a mut self, prompt: &Prompt) -> Result<ChunkStream<'a>, ServiceError> {
        let stream = self
            .client
            .send_message_stream(&mut self.session, prompt.as_str())?;
        Ok(Box::new(stream))
    }
}
