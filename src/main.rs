use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use openai_actions::{
  ChatCompletion, ChatMessage, ClientConfig, CreateImage, CreateImageEdit,
  CreateImageVariation, CreateTranscription, CreateTranslation,
  EditCompletion, Embeddings, Moderation, OpenAiClient, Pipeline,
  PipelineStep, Speaker, TextCompletion,
};

/// Run the full action sequence against the OpenAI API and print the
/// resulting transcript. The key is read from OPENAI_API_KEY.
#[derive(Debug, Parser)]
#[command(name = "openai-actions", version)]
struct Cli
{   /// PNG used for image edit and variation steps
    #[arg(long)]
    image: Option<PathBuf>
  , /// Audio clip used for transcription and translation steps
    #[arg(long)]
    audio: Option<PathBuf>
  , /// Print available models and exit
    #[arg(long)]
    list_models: bool
}

#[tokio::main]
async fn main()
{   env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await
    {   error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), openai_actions::Error>
{   let client = OpenAiClient::new(ClientConfig::from_env()?)?;

    if cli.list_models
    {   let mut rx = client.list_models()?;
        if let Some(result) = rx.recv().await
        {   for model in result?.data
            {   println!("{}", model.id);
            }
        }
        return client.shutdown().await;
    }

    let mut pipeline = Pipeline::new(&client);
    pipeline.push(PipelineStep::new(TextCompletion::new(
      "Hello chat gpt! what is the meaning of life?"
    )));
    pipeline.push(PipelineStep::new(ChatCompletion::new(vec![
      ChatMessage::user("What is the update with your weekly PR review")
    ])));
    pipeline.push(PipelineStep::new(EditCompletion::new(
      "What day of the wek is it?",
      "Fix the spelling mistakes"
    )));
    pipeline.push(PipelineStep::new(Embeddings::new(
      "Hello chat gpt! what is the meaning of life?"
    )));
    pipeline.push(PipelineStep::new(CreateImage::new(
      "A cute baby sea otter"
    )));
    pipeline.push(PipelineStep::new(Moderation::new(
      "I want to kill them."
    )));
    if let Some(image) = &cli.image
    {   pipeline.push(PipelineStep::new(
          CreateImageEdit::new(image, "A cute cat sitting on a white table")
            .with_mask(image)
        ));
        pipeline.push(PipelineStep::new(CreateImageVariation::new(image)));
    }
    if let Some(audio) = &cli.audio
    {   pipeline.push(PipelineStep::new(CreateTranscription::new(audio)));
        pipeline.push(PipelineStep::new(CreateTranslation::new(audio)));
    }

    info!("Running {} queued actions", pipeline.remaining());
    let mut entries = pipeline.transcript_mut().subscribe();
    let printer = tokio::spawn(async move {
      while let Some(entry) = entries.recv().await
      {   let tag = match entry.speaker
          {   Speaker::User => "you"
            , Speaker::Ai => "ai"
            , Speaker::Error => "error"
          };
          match entry.image_url
          {   Some(url) => println!("[{}] <image> {}", tag, url)
            , None => println!("[{}] {}", tag, entry.content.trim())
          }
      }
    });

    pipeline.run().await;
    drop(pipeline);
    let _ = printer.await;

    client.shutdown().await
}
