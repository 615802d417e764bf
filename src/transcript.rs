//! Append-only conversation log with subscriber notification

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker
{   User
  , Ai
  , Error
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry
{   pub speaker: Speaker
  , pub content: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>
}

impl TranscriptEntry
{   pub fn user(content: impl Into<String>) -> Self
    {   TranscriptEntry
        {   speaker: Speaker::User
          , content: content.into()
          , image_url: None
        }
    }

    pub fn ai(content: impl Into<String>) -> Self
    {   TranscriptEntry
        {   speaker: Speaker::Ai
          , content: content.into()
          , image_url: None
        }
    }

    pub fn image(url: impl Into<String>) -> Self
    {   TranscriptEntry
        {   speaker: Speaker::Ai
          , content: String::new()
          , image_url: Some(url.into())
        }
    }

    pub fn error(content: impl Into<String>) -> Self
    {   TranscriptEntry
        {   speaker: Speaker::Error
          , content: content.into()
          , image_url: None
        }
    }
}

#[derive(Debug, Default)]
pub struct Transcript
{   entries: Vec<TranscriptEntry>
  , subscribers: Vec<mpsc::UnboundedSender<TranscriptEntry>>
}

impl Transcript
{   pub fn new() -> Self
    {   Self::default()
    }

    /// Append and notify every live subscriber
    pub fn push(&mut self, entry: TranscriptEntry)
    {   trace!("Transcript {:?}: {}", entry.speaker, entry.content);
        self.subscribers
          .retain(|tx| tx.send(entry.clone()).is_ok());
        self.entries.push(entry);
    }

    /// Receive every entry appended from now on
    pub fn subscribe(&mut self)
      -> mpsc::UnboundedReceiver<TranscriptEntry>
    {   let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn entries(&self) -> &[TranscriptEntry]
    {   &self.entries
    }

    pub fn len(&self) -> usize
    {   self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.entries.is_empty()
    }

    /// Drop all entries; subscribers stay attached
    pub fn clear(&mut self)
    {   self.entries.clear();
    }
}
