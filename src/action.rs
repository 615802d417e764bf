//! Action model: one immutable request descriptor per remote operation
//!
//! A descriptor is built once, turned into an [`Action`] together with its
//! typed reply channel, dispatched once and then dropped.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::response::{
  ChatCompletionResult, EmbeddingResult, ImageResult, ModerationResult,
  TextCompletionResult, TextResult, ToStepOutput,
};
use crate::ReplySender;

pub const TEXT_COMPLETION_MODEL: &str = "text-davinci-003";
pub const CHAT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";
pub const EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const MODERATION_MODEL: &str = "text-moderation-latest";
pub const AUDIO_MODEL: &str = "whisper-1";

/// Inclusive bounds on the number of generated images
pub const IMAGE_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

// ===== Shared pieces =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl ChatMessage
{   pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: role.into()
          , content: content.into()
        }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self
    {   Self::new("system", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   Self::new("assistant", content)
    }
}

/// Output sizes accepted by the image endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSize
{   Small
  , Medium
  , Large
}

impl ImageSize
{   pub const ALL: [ImageSize; 3]
      = [ImageSize::Small, ImageSize::Medium, ImageSize::Large];

    pub fn as_str(&self) -> &'static str
    {   match self
        {   ImageSize::Small => "256x256"
          , ImageSize::Medium => "512x512"
          , ImageSize::Large => "1024x1024"
        }
    }

    /// Whether `size` is one of the accepted size strings
    pub fn is_valid(size: &str) -> bool
    {   Self::ALL.iter().any(|s| s.as_str() == size)
    }
}

impl From<ImageSize> for String
{   fn from(size: ImageSize) -> Self
    {   size.as_str().to_string()
    }
}

pub(crate) fn file_label(path: &Path) -> String
{   path.file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string())
}

// ===== Operation =====

/// A remote operation with a fixed response shape
pub trait Operation: Sized + Send + 'static
{   /// Typed result delivered through the reply channel
    type Output: DeserializeOwned + ToStepOutput + Send + 'static;

    /// Model id sent with the request; image endpoints carry none
    fn model(&self) -> Option<&str>;

    /// Human-readable summary shown in transcripts
    fn prompt(&self) -> String;

    /// Replace the text prompt with one derived from a previous step.
    /// Operations without a text prompt are returned unchanged.
    fn with_prompt(self, _prompt: String) -> Self
    {   self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action;
}

// ===== Descriptors =====

#[derive(Debug, Clone, PartialEq)]
pub struct TextCompletion
{   pub model: String
  , pub prompt: String
  , pub max_tokens: u32
  , pub temperature: f64
  , pub top_p: f64
  , pub stream: bool
  , pub logprobs: Option<u32>
  , pub stop: Option<String>
}

impl TextCompletion
{   pub fn new(prompt: impl Into<String>) -> Self
    {   TextCompletion
        {   model: TEXT_COMPLETION_MODEL.to_string()
          , prompt: prompt.into()
          , max_tokens: 16
          , temperature: 1.0
          , top_p: 1.0
          , stream: false
          , logprobs: None
          , stop: None
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self
    {   self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self
    {   self.top_p = top_p;
        self
    }

    /// Forwarded as-is; the response is still read as a single document
    pub fn with_stream(mut self, stream: bool) -> Self
    {   self.stream = stream;
        self
    }

    pub fn with_logprobs(mut self, logprobs: u32) -> Self
    {   self.logprobs = Some(logprobs);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self
    {   self.stop = Some(stop.into());
        self
    }
}

impl Operation for TextCompletion
{   type Output = TextCompletionResult;

    fn model(&self) -> Option<&str>
    {   Some(&self.model)
    }

    fn prompt(&self) -> String
    {   self.prompt.clone()
    }

    fn with_prompt(mut self, prompt: String) -> Self
    {   self.prompt = prompt;
        self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::TextCompletion { request: self, reply }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion
{   pub model: String
  , pub messages: Vec<ChatMessage>
}

impl ChatCompletion
{   pub fn new(messages: Vec<ChatMessage>) -> Self
    {   ChatCompletion
        {   model: CHAT_COMPLETION_MODEL.to_string()
          , messages
        }
    }
}

impl Operation for ChatCompletion
{   type Output = ChatCompletionResult;

    fn model(&self) -> Option<&str>
    {   Some(&self.model)
    }

    fn prompt(&self) -> String
    {   self.messages
          .first()
          .map(|m| m.content.clone())
          .unwrap_or_default()
    }

    /// Rewrites the last message, or starts the conversation
    fn with_prompt(mut self, prompt: String) -> Self
    {   match self.messages.last_mut()
        {   Some(last) => last.content = prompt
          , None => self.messages.push(ChatMessage::user(prompt))
        }
        self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::ChatCompletion { request: self, reply }
    }
}

/// Edit expressed as a plain completion over `input` and `instruction`
#[derive(Debug, Clone, PartialEq)]
pub struct EditCompletion
{   pub model: String
  , pub input: String
  , pub instruction: String
}

impl EditCompletion
{   pub fn new(
      input: impl Into<String>
    , instruction: impl Into<String>
    ) -> Self
    {   EditCompletion
        {   model: TEXT_COMPLETION_MODEL.to_string()
          , input: input.into()
          , instruction: instruction.into()
        }
    }

    /// Single prompt sent to the completions endpoint
    pub fn combined_prompt(&self) -> String
    {   format!("{}. {}", self.input, self.instruction)
    }
}

impl Operation for EditCompletion
{   type Output = TextCompletionResult;

    fn model(&self) -> Option<&str>
    {   Some(&self.model)
    }

    fn prompt(&self) -> String
    {   self.input.clone()
    }

    fn with_prompt(mut self, prompt: String) -> Self
    {   self.input = prompt;
        self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::EditCompletion { request: self, reply }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embeddings
{   pub model: String
  , pub input: String
}

impl Embeddings
{   pub fn new(input: impl Into<String>) -> Self
    {   Embeddings
        {   model: EMBEDDING_MODEL.to_string()
          , input: input.into()
        }
    }
}

impl Operation for Embeddings
{   type Output = EmbeddingResult;

    fn model(&self) -> Option<&str>
    {   Some(&self.model)
    }

    fn prompt(&self) -> String
    {   self.input.clone()
    }

    fn with_prompt(mut self, prompt: String) -> Self
    {   self.input = prompt;
        self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::Embeddings { request: self, reply }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateImage
{   pub prompt: String
  , pub n: u32
  , pub size: String
}

impl CreateImage
{   pub fn new(prompt: impl Into<String>) -> Self
    {   CreateImage
        {   prompt: prompt.into()
          , n: 2
          , size: ImageSize::Large.into()
        }
    }

    pub fn with_count(mut self, n: u32) -> Self
    {   self.n = n;
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self
    {   self.size = size.into();
        self
    }

    /// Pre-flight check on count and size
    pub fn validate(&self) -> Result<(), Error>
    {   if !IMAGE_COUNT_RANGE.contains(&self.n)
        {   return Err(Error::Validation(format!(
              "n (number of images to generate) must be between 1 and 10, got {}",
              self.n
            )));
        }
        if !ImageSize::is_valid(&self.size)
        {   return Err(Error::Validation(format!(
              "image size must be one of 256x256, 512x512 or 1024x1024, got {}",
              self.size
            )));
        }
        Ok(())
    }
}

impl Operation for CreateImage
{   type Output = ImageResult;

    fn model(&self) -> Option<&str>
    {   None
    }

    fn prompt(&self) -> String
    {   self.prompt.clone()
    }

    fn with_prompt(mut self, prompt: String) -> Self
    {   self.prompt = prompt;
        self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::CreateImage { request: self, reply }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateImageEdit
{   pub image: PathBuf
  , pub prompt: String
  , pub mask: Option<PathBuf>
  , pub n: u32
  , pub size: String
}

impl CreateImageEdit
{   pub fn new(
      image: impl Into<PathBuf>
    , prompt: impl Into<String>
    ) -> Self
    {   CreateImageEdit
        {   image: image.into()
          , prompt: prompt.into()
          , mask: None
          , n: 1
          , size: ImageSize::Large.into()
        }
    }

    pub fn with_mask(mut self, mask: impl Into<PathBuf>) -> Self
    {   self.mask = Some(mask.into());
        self
    }

    pub fn with_count(mut self, n: u32) -> Self
    {   self.n = n;
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self
    {   self.size = size.into();
        self
    }
}

impl Operation for CreateImageEdit
{   type Output = ImageResult;

    fn model(&self) -> Option<&str>
    {   None
    }

    fn prompt(&self) -> String
    {   self.prompt.clone()
    }

    fn with_prompt(mut self, prompt: String) -> Self
    {   self.prompt = prompt;
        self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::CreateImageEdit { request: self, reply }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateImageVariation
{   pub image: PathBuf
  , pub n: u32
  , pub size: String
}

impl CreateImageVariation
{   pub fn new(image: impl Into<PathBuf>) -> Self
    {   CreateImageVariation
        {   image: image.into()
          , n: 1
          , size: ImageSize::Large.into()
        }
    }

    pub fn with_count(mut self, n: u32) -> Self
    {   self.n = n;
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self
    {   self.size = size.into();
        self
    }
}

impl Operation for CreateImageVariation
{   type Output = ImageResult;

    fn model(&self) -> Option<&str>
    {   None
    }

    fn prompt(&self) -> String
    {   file_label(&self.image)
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::CreateImageVariation { request: self, reply }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Moderation
{   pub model: String
  , pub input: String
}

impl Moderation
{   pub fn new(input: impl Into<String>) -> Self
    {   Moderation
        {   model: MODERATION_MODEL.to_string()
          , input: input.into()
        }
    }
}

impl Operation for Moderation
{   type Output = ModerationResult;

    fn model(&self) -> Option<&str>
    {   Some(&self.model)
    }

    fn prompt(&self) -> String
    {   self.input.clone()
    }

    fn with_prompt(mut self, prompt: String) -> Self
    {   self.input = prompt;
        self
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::Moderation { request: self, reply }
    }
}

/// Speech to text in the spoken language
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTranscription
{   pub model: String
  , pub file: PathBuf
}

impl CreateTranscription
{   pub fn new(file: impl Into<PathBuf>) -> Self
    {   CreateTranscription
        {   model: AUDIO_MODEL.to_string()
          , file: file.into()
        }
    }
}

impl Operation for CreateTranscription
{   type Output = TextResult;

    fn model(&self) -> Option<&str>
    {   Some(&self.model)
    }

    fn prompt(&self) -> String
    {   file_label(&self.file)
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::CreateTranscription { request: self, reply }
    }
}

/// Speech to English text
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTranslation
{   pub model: String
  , pub file: PathBuf
}

impl CreateTranslation
{   pub fn new(file: impl Into<PathBuf>) -> Self
    {   CreateTranslation
        {   model: AUDIO_MODEL.to_string()
          , file: file.into()
        }
    }
}

impl Operation for CreateTranslation
{   type Output = TextResult;

    fn model(&self) -> Option<&str>
    {   Some(&self.model)
    }

    fn prompt(&self) -> String
    {   file_label(&self.file)
    }

    fn into_action(self, reply: ReplySender<Self::Output>) -> Action
    {   Action::CreateTranslation { request: self, reply }
    }
}

// ===== Action =====

/// Closed set of dispatchable operations, each with its typed reply
#[derive(Debug)]
pub enum Action
{   TextCompletion
    {   request: TextCompletion
      , reply: ReplySender<TextCompletionResult>
    }
  , ChatCompletion
    {   request: ChatCompletion
      , reply: ReplySender<ChatCompletionResult>
    }
  , EditCompletion
    {   request: EditCompletion
      , reply: ReplySender<TextCompletionResult>
    }
  , Embeddings
    {   request: Embeddings
      , reply: ReplySender<EmbeddingResult>
    }
  , CreateImage
    {   request: CreateImage
      , reply: ReplySender<ImageResult>
    }
  , CreateImageEdit
    {   request: CreateImageEdit
      , reply: ReplySender<ImageResult>
    }
  , CreateImageVariation
    {   request: CreateImageVariation
      , reply: ReplySender<ImageResult>
    }
  , Moderation
    {   request: Moderation
      , reply: ReplySender<ModerationResult>
    }
  , CreateTranscription
    {   request: CreateTranscription
      , reply: ReplySender<TextResult>
    }
  , CreateTranslation
    {   request: CreateTranslation
      , reply: ReplySender<TextResult>
    }
}

macro_rules! with_request {
  ($action:expr, $req:ident => $body:expr) => {
    match $action
    {   Action::TextCompletion { request: $req, .. } => $body
      , Action::ChatCompletion { request: $req, .. } => $body
      , Action::EditCompletion { request: $req, .. } => $body
      , Action::Embeddings { request: $req, .. } => $body
      , Action::CreateImage { request: $req, .. } => $body
      , Action::CreateImageEdit { request: $req, .. } => $body
      , Action::CreateImageVariation { request: $req, .. } => $body
      , Action::Moderation { request: $req, .. } => $body
      , Action::CreateTranscription { request: $req, .. } => $body
      , Action::CreateTranslation { request: $req, .. } => $body
    }
  };
}

impl Action
{   /// Operation name for diagnostics
    pub fn name(&self) -> &'static str
    {   match self
        {   Action::TextCompletion { .. } => "TextCompletion"
          , Action::ChatCompletion { .. } => "ChatCompletion"
          , Action::EditCompletion { .. } => "EditCompletion"
          , Action::Embeddings { .. } => "Embeddings"
          , Action::CreateImage { .. } => "CreateImage"
          , Action::CreateImageEdit { .. } => "CreateImageEdit"
          , Action::CreateImageVariation { .. } => "CreateImageVariation"
          , Action::Moderation { .. } => "Moderation"
          , Action::CreateTranscription { .. } => "CreateTranscription"
          , Action::CreateTranslation { .. } => "CreateTranslation"
        }
    }

    pub fn model(&self) -> Option<&str>
    {   with_request!(self, r => r.model())
    }

    pub fn prompt(&self) -> String
    {   with_request!(self, r => r.prompt())
    }

    /// Client-side checks run before any network call.
    /// Only image generation is checked; everything else is left to the API.
    pub fn validate(&self) -> Result<(), Error>
    {   match self
        {   Action::CreateImage { request, .. } => request.validate()
          , _ => Ok(())
        }
    }
}
