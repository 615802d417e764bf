//! Typed response shapes, one per remote operation

use serde::{Deserialize, Serialize};

use crate::action::ChatMessage;

// ===== Shared =====

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage
{   #[serde(default)]
    pub prompt_tokens: u32
  , #[serde(default)]
    pub completion_tokens: u32
  , #[serde(default)]
    pub total_tokens: u32
}

// ===== Completions =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChoice
{   pub text: String
  , #[serde(default)]
    pub index: u32
  , #[serde(default)]
    pub logprobs: Option<serde_json::Value>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

/// Result of `completions`, also surfaced for edit completions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCompletionResult
{   #[serde(default)]
    pub id: String
  , #[serde(default)]
    pub object: String
  , #[serde(default)]
    pub created: u64
  , #[serde(default)]
    pub model: String
  , pub choices: Vec<TextChoice>
  , #[serde(default)]
    pub usage: Option<Usage>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice
{   #[serde(default)]
    pub index: u32
  , pub message: ChatMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

/// Result of `chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResult
{   #[serde(default)]
    pub id: String
  , #[serde(default)]
    pub object: String
  , #[serde(default)]
    pub created: u64
  , #[serde(default)]
    pub model: String
  , pub choices: Vec<ChatChoice>
  , #[serde(default)]
    pub usage: Option<Usage>
}

// ===== Embeddings =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding
{   #[serde(default)]
    pub index: u32
  , pub embedding: Vec<f32>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult
{   #[serde(default)]
    pub object: String
  , #[serde(default)]
    pub model: String
  , pub data: Vec<Embedding>
  , #[serde(default)]
    pub usage: Option<Usage>
}

// ===== Images =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData
{   pub url: String
}

/// Result of image generation, edit and variation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult
{   #[serde(default)]
    pub created: u64
  , pub data: Vec<ImageData>
}

impl ImageResult
{   pub fn urls(&self) -> Vec<&str>
    {   self.data.iter().map(|d| d.url.as_str()).collect()
    }
}

// ===== Moderation =====

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Categories
{   #[serde(default)]
    pub hate: bool
  , #[serde(default, rename = "hate/threatening")]
    pub hate_threatening: bool
  , #[serde(default, rename = "self-harm")]
    pub self_harm: bool
  , #[serde(default)]
    pub sexual: bool
  , #[serde(default, rename = "sexual/minors")]
    pub sexual_minors: bool
  , #[serde(default)]
    pub violence: bool
  , #[serde(default, rename = "violence/graphic")]
    pub violence_graphic: bool
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryScores
{   #[serde(default)]
    pub hate: f64
  , #[serde(default, rename = "hate/threatening")]
    pub hate_threatening: f64
  , #[serde(default, rename = "self-harm")]
    pub self_harm: f64
  , #[serde(default)]
    pub sexual: f64
  , #[serde(default, rename = "sexual/minors")]
    pub sexual_minors: f64
  , #[serde(default)]
    pub violence: f64
  , #[serde(default, rename = "violence/graphic")]
    pub violence_graphic: f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationCategories
{   #[serde(default)]
    pub flagged: bool
  , pub categories: Categories
  , pub category_scores: CategoryScores
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult
{   #[serde(default)]
    pub id: String
  , #[serde(default)]
    pub model: String
  , pub results: Vec<ModerationCategories>
}

// ===== Audio =====

/// Result of transcription and translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextResult
{   pub text: String
}

// ===== Models =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor
{   pub id: String
  , #[serde(default)]
    pub object: String
  , #[serde(default)]
    pub created: u64
  , #[serde(default)]
    pub owned_by: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList
{   #[serde(default)]
    pub object: String
  , pub data: Vec<ModelDescriptor>
}

// ===== Step output =====

/// What a finished action contributes to a pipeline transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutput
{   /// Plain text, eligible for prompt chaining
    Text(String)
  , /// Generated image location, shown but never chained
    ImageUrl(String)
  , /// Response carried nothing displayable
    Nothing
}

/// Reduce a result to its pipeline-visible output
pub trait ToStepOutput
{   fn to_step_output(&self) -> StepOutput;
}

fn text_or_nothing(text: Option<&str>) -> StepOutput
{   match text
    {   Some(t) => StepOutput::Text(t.to_string())
      , None => StepOutput::Nothing
    }
}

impl ToStepOutput for TextCompletionResult
{   fn to_step_output(&self) -> StepOutput
    {   text_or_nothing(self.choices.first().map(|c| c.text.as_str()))
    }
}

impl ToStepOutput for ChatCompletionResult
{   fn to_step_output(&self) -> StepOutput
    {   text_or_nothing(
          self.choices.first().map(|c| c.message.content.as_str())
        )
    }
}

impl ToStepOutput for EmbeddingResult
{   fn to_step_output(&self) -> StepOutput
    {   match self.data.first()
        {   Some(e) => StepOutput::Text(e.embedding.len().to_string())
          , None => StepOutput::Nothing
        }
    }
}

impl ToStepOutput for ImageResult
{   fn to_step_output(&self) -> StepOutput
    {   match self.data.first()
        {   Some(d) => StepOutput::ImageUrl(d.url.clone())
          , None => StepOutput::Nothing
        }
    }
}

impl ToStepOutput for ModerationResult
{   fn to_step_output(&self) -> StepOutput
    {   match self.results.first()
        {   Some(r) => StepOutput::Text(r.categories.hate.to_string())
          , None => StepOutput::Nothing
        }
    }
}

impl ToStepOutput for TextResult
{   fn to_step_output(&self) -> StepOutput
    {   StepOutput::Text(self.text.clone())
    }
}
