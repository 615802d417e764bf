use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, trace, error};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::action::{
  file_label, Action, ChatCompletion, ChatMessage, CreateImage,
  CreateImageEdit, CreateImageVariation, CreateTranscription,
  CreateTranslation, EditCompletion, Embeddings, Moderation, TextCompletion,
};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::response::{
  ChatCompletionResult, EmbeddingResult, ImageResult, ModelList,
  ModerationResult, TextCompletionResult, TextResult,
};
use crate::{Reply, ReplySender};

const IMAGE_MIME: &str = "image/*";
const AUDIO_MIME: &str = "audio/*";

// ===== Wire Types =====

#[derive(Debug, Clone, Serialize)]
pub struct TextCompletionRequest
{   pub model: String
  , pub prompt: Vec<String>
  , pub max_tokens: u32
  , pub temperature: f64
  , pub top_p: f64
  , pub stream: bool
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>
}

impl From<&TextCompletion> for TextCompletionRequest
{   fn from(action: &TextCompletion) -> Self
    {   TextCompletionRequest
        {   model: action.model.clone()
          , prompt: vec![action.prompt.clone()]
          , max_tokens: action.max_tokens
          , temperature: action.temperature
          , top_p: action.top_p
          , stream: action.stream
          , logprobs: action.logprobs
          , stop: action.stop.clone()
        }
    }
}

impl From<&EditCompletion> for TextCompletionRequest
{   fn from(action: &EditCompletion) -> Self
    {   let completion = TextCompletion
        {   model: action.model.clone()
          , ..TextCompletion::new(action.combined_prompt())
        };
        TextCompletionRequest::from(&completion)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest
{   pub model: String
  , pub input: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationRequest
{   pub input: String
  , pub model: String
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateImageRequest
{   pub prompt: String
  , pub n: u32
  , pub size: String
}

// ===== Executor =====

/// Shared transport state; one connection pool for every call
pub struct OpenAiState
{   config: ClientConfig
  , http_client: reqwest::Client
}

impl OpenAiState
{   pub fn new(config: ClientConfig)
      -> Result<Self, Error>
    {   debug!("Creating OpenAiState for {}", config.base_url);
        let timeout = Duration::from_secs(config.timeout_secs);
        let http_client = reqwest::Client::builder()
          .connect_timeout(timeout)
          .read_timeout(timeout)
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::InvalidConfiguration(e.to_string())
          })?;

        Ok(OpenAiState
        {   config
          , http_client
        })
    }

    /// Run one action and deliver its single reply
    pub async fn execute(&self, action: Action)
    {   debug!("Executing {}", action.name());
        match action
        {   Action::TextCompletion { request, reply } => {
              deliver(&reply, self.handle_text_completion(&request).await);
            }
          , Action::ChatCompletion { request, reply } => {
              deliver(&reply, self.handle_chat_completion(&request).await);
            }
          , Action::EditCompletion { request, reply } => {
              deliver(&reply, self.handle_edit_completion(&request).await);
            }
          , Action::Embeddings { request, reply } => {
              deliver(&reply, self.handle_embeddings(&request).await);
            }
          , Action::CreateImage { request, reply } => {
              deliver(&reply, self.handle_create_image(&request).await);
            }
          , Action::CreateImageEdit { request, reply } => {
              deliver(&reply, self.handle_image_edit(&request).await);
            }
          , Action::CreateImageVariation { request, reply } => {
              deliver(&reply, self.handle_image_variation(&request).await);
            }
          , Action::Moderation { request, reply } => {
              deliver(&reply, self.handle_moderation(&request).await);
            }
          , Action::CreateTranscription { request, reply } => {
              deliver(&reply, self.handle_transcription(&request).await);
            }
          , Action::CreateTranslation { request, reply } => {
              deliver(&reply, self.handle_translation(&request).await);
            }
        }
    }

    async fn handle_text_completion(
      &self
    , action: &TextCompletion
    ) -> Reply<TextCompletionResult>
    {   self.post_json(
          "completions",
          &TextCompletionRequest::from(action)
        ).await
    }

    /// The edits endpoint is bypassed; the edit runs as a completion
    async fn handle_edit_completion(
      &self
    , action: &EditCompletion
    ) -> Reply<TextCompletionResult>
    {   self.post_json(
          "completions",
          &TextCompletionRequest::from(action)
        ).await
    }

    async fn handle_chat_completion(
      &self
    , action: &ChatCompletion
    ) -> Reply<ChatCompletionResult>
    {   let request = ChatCompletionRequest
        {   model: action.model.clone()
          , messages: action.messages.clone()
        };
        self.post_json("chat/completions", &request).await
    }

    async fn handle_embeddings(
      &self
    , action: &Embeddings
    ) -> Reply<EmbeddingResult>
    {   let request = EmbeddingRequest
        {   model: action.model.clone()
          , input: action.input.clone()
        };
        self.post_json("embeddings", &request).await
    }

    async fn handle_moderation(
      &self
    , action: &Moderation
    ) -> Reply<ModerationResult>
    {   let request = ModerationRequest
        {   input: action.input.clone()
          , model: action.model.clone()
        };
        self.post_json("moderations", &request).await
    }

    async fn handle_create_image(
      &self
    , action: &CreateImage
    ) -> Reply<ImageResult>
    {   let request = CreateImageRequest
        {   prompt: action.prompt.clone()
          , n: action.n
          , size: action.size.clone()
        };
        self.post_json("images/generations", &request).await
    }

    async fn handle_image_edit(
      &self
    , action: &CreateImageEdit
    ) -> Reply<ImageResult>
    {   let mut form = Form::new()
          .part("image", file_part(&action.image, IMAGE_MIME).await?);
        if let Some(mask) = &action.mask
        {   form = form.part("mask", file_part(mask, IMAGE_MIME).await?);
        }
        let form = form
          .text("prompt", action.prompt.clone())
          .text("n", action.n.to_string())
          .text("size", action.size.clone());

        self.post_multipart("images/edits", form).await
    }

    async fn handle_image_variation(
      &self
    , action: &CreateImageVariation
    ) -> Reply<ImageResult>
    {   let form = Form::new()
          .part("image", file_part(&action.image, IMAGE_MIME).await?)
          .text("n", action.n.to_string())
          .text("size", action.size.clone());

        self.post_multipart("images/variations", form).await
    }

    async fn handle_transcription(
      &self
    , action: &CreateTranscription
    ) -> Reply<TextResult>
    {   let form = audio_form(&action.file, &action.model).await?;
        self.post_multipart("audio/transcriptions", form).await
    }

    async fn handle_translation(
      &self
    , action: &CreateTranslation
    ) -> Reply<TextResult>
    {   let form = audio_form(&action.file, &action.model).await?;
        self.post_multipart("audio/translations", form).await
    }

    pub async fn handle_list_models(&self) -> Reply<ModelList>
    {   let url = self.config.endpoint("models");
        let request = self.http_client
          .get(&url)
          .header("Authorization", self.bearer());
        self.send(request, "GET", &url).await
    }

    fn bearer(&self) -> String
    {   format!("Bearer {}", self.config.api_key)
    }

    async fn post_json<B, T>(
      &self
    , path: &str
    , body: &B
    ) -> Reply<T>
    where
      B: Serialize + Debug
    , T: DeserializeOwned
    {   let url = self.config.endpoint(path);
        if self.config.verbose
        {   trace!("Request body: {:?}", body);
        }

        let request = self.http_client
          .post(&url)
          .header("Authorization", self.bearer())
          .header("Content-Type", "application/json")
          .json(body);
        self.send(request, "POST", &url).await
    }

    /// The form sets its own multipart content type
    async fn post_multipart<T>(
      &self
    , path: &str
    , form: Form
    ) -> Reply<T>
    where
      T: DeserializeOwned
    {   let url = self.config.endpoint(path);
        let request = self.http_client
          .post(&url)
          .header("Authorization", self.bearer())
          .multipart(form);
        self.send(request, "POST", &url).await
    }

    async fn send<T>(
      &self
    , request: reqwest::RequestBuilder
    , method: &str
    , url: &str
    ) -> Reply<T>
    where
      T: DeserializeOwned
    {   if self.config.verbose
        {   debug!("--> {} {}", method, url);
        }
        let started = Instant::now();

        let response = request
          .send()
          .await
          .map_err(|e| {
            error!("Transport error on {}: {}", url, e);
            Error::Transport(e.to_string())
          })?;

        let status = response.status();
        if self.config.verbose
        {   debug!(
              "<-- {} {} ({} ms)",
              status.as_u16(),
              url,
              started.elapsed().as_millis()
            );
        }

        if !status.is_success()
        {   let body = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("API error {} on {}: {}", status, url, body);
            return Err(Error::Http
            {   status: status.as_u16()
              , body
            });
        }

        let body = response.text().await.map_err(|e| {
          error!("Failed to read body from {}: {}", url, e);
          Error::Transport(e.to_string())
        })?;
        if self.config.verbose
        {   trace!("Response body: {}", body);
        }

        serde_json::from_str(&body).map_err(|e| {
          error!("Parse error: {}", e);
          Error::Parse(e.to_string())
        })
    }
}

/// Hand a result to its reply channel; the receiver may already be gone
fn deliver<T>(reply: &ReplySender<T>, result: Reply<T>)
{   if let Err(e) = &result
    {   debug!("Delivering failure: {}", e);
    }
    if reply.send(result).is_err()
    {   debug!("Reply receiver dropped before delivery");
    }
}

async fn file_part(path: &Path, mime: &str) -> Reply<Part>
{   let bytes = tokio::fs::read(path).await.map_err(|e| {
      error!("Failed to read {}: {}", path.display(), e);
      Error::File(format!("{}: {}", path.display(), e))
    })?;
    trace!("Attaching {} ({} bytes)", path.display(), bytes.len());

    Part::bytes(bytes)
      .file_name(file_label(path))
      .mime_str(mime)
      .map_err(|e| Error::File(e.to_string()))
}

async fn audio_form(file: &Path, model: &str) -> Reply<Form>
{   Ok(Form::new()
      .part("file", file_part(file, AUDIO_MIME).await?)
      .text("model", model.to_string()))
}
