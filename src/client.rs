use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info};

use crate::action::{Action, Operation};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::providers::OpenAiState;
use crate::response::ModelList;
use crate::{ClientFoot, ClientHand, ReplyReceiver};

/// Public API for the dispatch client - owns the task
#[derive(Debug)]
pub struct OpenAiClient
{   hand: ClientHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl OpenAiClient
{   /// Create and spawn a new dispatch client
    /// Returns immediately - spawns background task
    pub fn new(config: ClientConfig) -> Result<Self, Error>
    {   debug!("Creating OpenAiClient with task ownership");
        if config.api_key.trim().is_empty()
        {   error!("Empty API key");
            return Err(Error::MissingApiKey("api_key".to_string()));
        }
        let state = Arc::new(OpenAiState::new(config)?);

        let (dispatch_tx, dispatch_rx)
          = mpsc::unbounded_channel();
        let (list_models_tx, list_models_rx)
          = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx)
          = mpsc::unbounded_channel();

        let hand = ClientHand
        {   dispatch_tx
          , list_models_tx
          , shutdown_tx
        };

        let foot = ClientFoot
        {   dispatch_rx
          , list_models_rx
          , shutdown_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_client_loop(foot, state).await
        });

        Ok(OpenAiClient
        {   hand
          , _task_handle
        })
    }

    /// Dispatch an action - returns almost immediately.
    /// The result arrives on the action's own reply channel.
    /// Validation failures are returned here and no reply is sent.
    pub fn dispatch(&self, action: Action) -> Result<(), Error>
    {   debug!("dispatch queuing {}", action.name());
        if let Err(e) = action.validate()
        {   error!("{} rejected: {}", action.name(), e);
            return Err(e);
        }

        self.hand.dispatch_tx
          .send(action)
          .map_err(|_| {
            error!("Client channel closed");
            Error::Disconnected
          })
    }

    /// Build the reply channel for `operation` and dispatch it
    pub fn submit<O>(
      &self
    , operation: O
    ) -> Result<ReplyReceiver<O::Output>, Error>
    where
      O: Operation
    {   let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();
        self.dispatch(operation.into_action(reply_tx))?;
        Ok(reply_rx)
    }

    /// List available models - returns almost immediately
    pub fn list_models(&self)
      -> Result<ReplyReceiver<ModelList>, Error>
    {   debug!("list_models queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.list_models_tx
          .send(crate::ListModelsArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Client channel closed");
            Error::Disconnected
          })?;

        Ok(reply_rx)
    }

    /// Stop accepting actions; calls already in flight still complete
    pub async fn shutdown(self)
      -> Result<(), Error>
    {   debug!("Shutting down OpenAiClient");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        self.hand.shutdown_tx
          .send(crate::ShutdownArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Client channel already closed");
            Error::Disconnected
          })?;

        // Wait for shutdown confirmation
        match reply_rx.recv().await
        {   Some(result) => {
              debug!("Client shutdown confirmed");
              result
            }
          , None => {
              error!("Client loop exited without confirming shutdown");
              Err(Error::Disconnected)
            }
        }
    }
}

/// Main client event loop
///
/// tokio::select! is ONLY for fast queueing.
/// Each arm spawns the HTTP work onto its own task and returns,
/// so outstanding calls are never serialized behind each other.
async fn run_client_loop(
  foot: ClientFoot
, state: Arc<OpenAiState>
)
{   debug!("Starting OpenAiClient event loop");
    let ClientFoot
    {   mut dispatch_rx
      , mut list_models_rx
      , mut shutdown_rx
    } = foot;

    loop
    { tokio::select!
      { Some(action) = dispatch_rx.recv() => {
          debug!("Received {}", action.name());
          let state = state.clone();
          tokio::spawn(async move {
            state.execute(action).await
          });
        }
      , Some(cmd) = list_models_rx.recv() => {
          debug!("Received ListModels");
          let state = state.clone();
          tokio::spawn(async move {
            let result = state.handle_list_models().await;
            let _ = cmd.reply.send(result);
          });
        }
      , Some(cmd) = shutdown_rx.recv() => {
          // Actions accepted before shutdown still get their reply
          while let Ok(action) = dispatch_rx.try_recv()
          {   let state = state.clone();
              tokio::spawn(async move {
                state.execute(action).await
              });
          }
          let _ = cmd.reply.send(Ok(()));
          info!("OpenAiClient shutting down");
          break;
        }
      , else => {
          debug!("All command channels closed");
          break;
        }
      }
    }
}
