//! Sequential driver over a FIFO queue of actions
//!
//! One action is in flight at a time. Each completion is appended to the
//! transcript before the next queued action is dispatched. Plain-text
//! output is carried into the next step only when that step was queued
//! with [`PipelineStep::chained`]; image URLs are shown but never carried,
//! and a failed step carries nothing.

use std::collections::VecDeque;
use tokio::sync::mpsc;
use log::{debug, error, info};

use crate::action::{Action, Operation};
use crate::client::OpenAiClient;
use crate::error::Error;
use crate::response::{StepOutput, ToStepOutput};
use crate::transcript::{Transcript, TranscriptEntry};
use crate::{Reply, ReplySender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState
{   /// Nothing in flight
    Idle
  , /// One action dispatched, waiting for its reply
    Dispatching
}

/// Type-erased operation waiting in the queue
trait QueuedOperation: Send
{   fn prompt(&self) -> String;

    fn into_action(
      self: Box<Self>
    , prompt: Option<String>
    , outputs: ReplySender<StepOutput>
    ) -> Action;
}

struct Queued<O>
{   operation: O
}

impl<O: Operation> QueuedOperation for Queued<O>
{   fn prompt(&self) -> String
    {   self.operation.prompt()
    }

    fn into_action(
      self: Box<Self>
    , prompt: Option<String>
    , outputs: ReplySender<StepOutput>
    ) -> Action
    {   let operation = match prompt
        {   Some(p) => self.operation.with_prompt(p)
          , None => self.operation
        };
        operation.into_action(forward_output(outputs))
    }
}

/// Typed reply channel whose single result is reduced to a step output
fn forward_output<T>(outputs: ReplySender<StepOutput>) -> ReplySender<T>
where
  T: ToStepOutput + Send + 'static
{   let (reply_tx, mut reply_rx)
      = mpsc::unbounded_channel::<Reply<T>>();
    tokio::spawn(async move {
      if let Some(result) = reply_rx.recv().await
      {   let _ = outputs.send(result.map(|r| r.to_step_output()));
      }
    });
    reply_tx
}

pub struct PipelineStep
{   operation: Box<dyn QueuedOperation>
  , chained: bool
}

impl PipelineStep
{   /// Step submitted with its own prompt
    pub fn new<O: Operation>(operation: O) -> Self
    {   PipelineStep
        {   operation: Box::new(Queued { operation })
          , chained: false
        }
    }

    /// Step whose prompt is replaced by the previous plain-text output,
    /// when there is one
    pub fn chained<O: Operation>(operation: O) -> Self
    {   PipelineStep
        {   operation: Box::new(Queued { operation })
          , chained: true
        }
    }

    pub fn prompt(&self) -> String
    {   self.operation.prompt()
    }

    pub fn is_chained(&self) -> bool
    {   self.chained
    }
}

pub struct Pipeline<'c>
{   client: &'c OpenAiClient
  , queue: VecDeque<PipelineStep>
  , transcript: Transcript
  , state: PipelineState
  , carried: Option<String>
}

impl<'c> Pipeline<'c>
{   pub fn new(client: &'c OpenAiClient) -> Self
    {   Pipeline
        {   client
          , queue: VecDeque::new()
          , transcript: Transcript::new()
          , state: PipelineState::Idle
          , carried: None
        }
    }

    pub fn push(&mut self, step: PipelineStep)
    {   self.queue.push_back(step);
    }

    /// Steps not yet dispatched
    pub fn remaining(&self) -> usize
    {   self.queue.len()
    }

    pub fn state(&self) -> PipelineState
    {   self.state
    }

    pub fn transcript(&self) -> &Transcript
    {   &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript
    {   &mut self.transcript
    }

    pub fn into_transcript(self) -> Transcript
    {   self.transcript
    }

    /// Dispatch the next queued step and wait for its reply.
    /// Returns `None` once the queue is empty.
    pub async fn step(&mut self) -> Option<Reply<StepOutput>>
    {   let step = match self.queue.pop_front()
        {   Some(step) => step
          , None => {
              debug!("Pipeline queue empty");
              return None;
            }
        };

        let carried = self.carried.take();
        let derived = if step.chained { carried } else { None };
        let submitted = derived
          .clone()
          .unwrap_or_else(|| step.operation.prompt());
        self.transcript.push(TranscriptEntry::user(submitted));

        let (outputs_tx, mut outputs_rx)
          = mpsc::unbounded_channel();
        let action = step.operation.into_action(derived, outputs_tx);
        debug!(
          "Pipeline dispatching {} ({} remaining)",
          action.name(),
          self.queue.len()
        );

        self.state = PipelineState::Dispatching;
        let result = match self.client.dispatch(action)
        {   Ok(()) => outputs_rx
              .recv()
              .await
              .unwrap_or(Err(Error::Disconnected))
          , Err(e) => Err(e)
        };
        self.state = PipelineState::Idle;

        self.record(&result);
        Some(result)
    }

    /// Run until the queue is empty; failed steps do not stop the run
    pub async fn run(&mut self)
    {   while let Some(result) = self.step().await
        {   if let Err(e) = result
            {   error!("Pipeline step failed: {}", e);
            }
        }
        info!("Pipeline finished with {} transcript entries", self.transcript.len());
    }

    fn record(&mut self, result: &Reply<StepOutput>)
    {   match result
        {   Ok(StepOutput::Text(text)) => {
              self.transcript.push(TranscriptEntry::ai(text.clone()));
              self.carried = Some(text.clone());
            }
          , Ok(StepOutput::ImageUrl(url)) => {
              self.transcript.push(TranscriptEntry::image(url.clone()));
            }
          , Ok(StepOutput::Nothing) => {
              debug!("Step produced no output");
            }
          , Err(e) => {
              self.transcript.push(TranscriptEntry::error(e.to_string()));
            }
        }
    }
}
