//! Typed action dispatch over the OpenAI HTTP API.
//!
//! Callers describe one remote operation as an [`action::Action`], hand it
//! to an [`OpenAiClient`] and receive exactly one typed `Result` on the
//! action's reply channel. A [`Pipeline`] runs queued actions one at a time
//! and chains plain-text results into follow-up prompts.

pub mod error;
pub mod config;
pub mod action;
pub mod response;
pub mod providers;
pub mod client;
pub mod transcript;
pub mod pipeline;

pub use action::{
  Action, ChatCompletion, ChatMessage, CreateImage, CreateImageEdit,
  CreateImageVariation, CreateTranscription, CreateTranslation,
  EditCompletion, Embeddings, ImageSize, Moderation, Operation,
  TextCompletion,
};
pub use client::OpenAiClient;
pub use config::ClientConfig;
pub use error::Error;
pub use pipeline::{Pipeline, PipelineState, PipelineStep};
pub use response::{StepOutput, ToStepOutput};
pub use transcript::{Speaker, Transcript, TranscriptEntry};

/// CLIENT API INTERFACE:

// ===== Reply =====

pub type Reply<T> = Result<T, crate::error::Error>;
pub type ReplySender<T>
  = tokio::sync::mpsc::UnboundedSender<Reply<T>>;
pub type ReplyReceiver<T>
  = tokio::sync::mpsc::UnboundedReceiver<Reply<T>>;

// ===== ListModels =====

pub type ListModelsReply = Reply<crate::response::ModelList>;

pub struct ListModelsArgs
{   pub reply: ReplySender<crate::response::ModelList>
}

// ===== Shutdown =====

pub type ShutdownReply = Reply<()>;

pub struct ShutdownArgs
{   pub reply: ReplySender<()>
}

// ===== ClientHand (sender side) =====

#[derive(Debug)]
pub struct ClientHand
{   pub dispatch_tx
      : tokio::sync::mpsc::UnboundedSender<Action>
  , pub list_models_tx
      : tokio::sync::mpsc::UnboundedSender<ListModelsArgs>
  , pub shutdown_tx
      : tokio::sync::mpsc::UnboundedSender<ShutdownArgs>
}

// ===== ClientFoot (receiver side) =====

pub struct ClientFoot
{   pub dispatch_rx
      : tokio::sync::mpsc::UnboundedReceiver<Action>
  , pub list_models_rx
      : tokio::sync::mpsc::UnboundedReceiver<ListModelsArgs>
  , pub shutdown_rx
      : tokio::sync::mpsc::UnboundedReceiver<ShutdownArgs>
}
