mod common;

use common::*;
use openai_actions::{
  CreateImage, Embeddings, Error, Moderation, Pipeline, PipelineState,
  PipelineStep, Speaker, StepOutput, TextCompletion, TranscriptEntry,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_completion(server: &MockServer, prompt: &str, text: &str)
{   Mock::given(method("POST"))
      .and(path("/completions"))
      .and(body_partial_json(json!({ "prompt": [prompt] })))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(text_completion_body(text))
      )
      .expect(1)
      .mount(server)
      .await;
}

async fn mount_moderation(server: &MockServer, input: &str)
{   Mock::given(method("POST"))
      .and(path("/moderations"))
      .and(body_partial_json(json!({ "input": input })))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(moderation_body(false, false))
      )
      .expect(1)
      .mount(server)
      .await;
}

#[tokio::test]
async fn test_chained_step_receives_previous_text()
{   let server = MockServer::start().await;
    mount_completion(&server, "Say hi", "hello").await;
    mount_moderation(&server, "hello").await;

    let client = client_for(&server);
    let mut pipeline = Pipeline::new(&client);
    pipeline.push(PipelineStep::new(TextCompletion::new("Say hi")));
    pipeline.push(PipelineStep::chained(Moderation::new("placeholder")));
    assert_eq!(pipeline.remaining(), 2);
    assert_eq!(pipeline.state(), PipelineState::Idle);

    let first = pipeline.step().await.expect("first step");
    assert_eq!(assert_ok!(first), StepOutput::Text("hello".to_string()));
    assert_eq!(pipeline.remaining(), 1);
    assert_eq!(pipeline.state(), PipelineState::Idle);

    let second = pipeline.step().await.expect("second step");
    assert_eq!(assert_ok!(second), StepOutput::Text("false".to_string()));
    assert_eq!(pipeline.remaining(), 0);

    assert!(pipeline.step().await.is_none());
    assert_eq!(pipeline.state(), PipelineState::Idle);

    assert_eq!(pipeline.transcript().entries(), &[
      TranscriptEntry::user("Say hi"),
      TranscriptEntry::ai("hello"),
      TranscriptEntry::user("hello"),
      TranscriptEntry::ai("false"),
    ]);
}

#[tokio::test]
async fn test_unchained_step_keeps_its_own_prompt()
{   let server = MockServer::start().await;
    mount_completion(&server, "Say hi", "hello").await;
    Mock::given(method("POST"))
      .and(path("/embeddings"))
      .and(body_partial_json(json!({ "input": "own input" })))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(embedding_body(&[0.1, 0.2, 0.3, 0.4]))
      )
      .expect(1)
      .mount(&server)
      .await;

    let client = client_for(&server);
    let mut pipeline = Pipeline::new(&client);
    pipeline.push(PipelineStep::new(TextCompletion::new("Say hi")));
    pipeline.push(PipelineStep::new(Embeddings::new("own input")));
    pipeline.run().await;

    assert_eq!(pipeline.remaining(), 0);
    let entries = pipeline.transcript().entries();
    assert_eq!(entries[2], TranscriptEntry::user("own input"));
    // Embedding output is the vector length
    assert_eq!(entries[3], TranscriptEntry::ai("4"));
}

#[tokio::test]
async fn test_failed_step_does_not_halt_pipeline()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/completions"))
      .respond_with(
        ResponseTemplate::new(500).set_body_string("upstream exploded")
      )
      .expect(1)
      .mount(&server)
      .await;
    mount_moderation(&server, "original prompt").await;

    let client = client_for(&server);
    let mut pipeline = Pipeline::new(&client);
    pipeline.push(PipelineStep::new(TextCompletion::new("Say hi")));
    pipeline.push(PipelineStep::chained(Moderation::new("original prompt")));

    let first = pipeline.step().await.expect("first step");
    let err = assert_err!(first);
    assert_eq!(err.status(), Some(500));
    assert_eq!(pipeline.remaining(), 1);

    let second = pipeline.step().await.expect("second step");
    assert_ok!(second);

    let entries = pipeline.transcript().entries();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[1].speaker, Speaker::Error);
    assert!(entries[1].content.contains("500"));
    assert_eq!(entries[2], TranscriptEntry::user("original prompt"));
}

#[tokio::test]
async fn test_image_url_is_shown_but_not_chained()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/images/generations"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(image_body(&["https://images.example/otter.png"]))
      )
      .expect(1)
      .mount(&server)
      .await;
    mount_completion(&server, "Describe an otter", "An otter is a mammal").await;

    let client = client_for(&server);
    let mut pipeline = Pipeline::new(&client);
    pipeline.push(PipelineStep::new(CreateImage::new("A cute baby sea otter")));
    pipeline.push(PipelineStep::chained(TextCompletion::new("Describe an otter")));
    pipeline.run().await;

    assert_eq!(pipeline.transcript().entries(), &[
      TranscriptEntry::user("A cute baby sea otter"),
      TranscriptEntry::image("https://images.example/otter.png"),
      TranscriptEntry::user("Describe an otter"),
      TranscriptEntry::ai("An otter is a mammal"),
    ]);
}

#[tokio::test]
async fn test_validation_failure_is_recorded_and_pipeline_continues()
{   let server = MockServer::start().await;
    Mock::given(path("/images/generations"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;
    mount_completion(&server, "Still here?", "yes").await;

    let client = client_for(&server);
    let mut pipeline = Pipeline::new(&client);
    pipeline.push(PipelineStep::new(
      CreateImage::new("otter").with_count(11)
    ));
    pipeline.push(PipelineStep::new(TextCompletion::new("Still here?")));

    let first = pipeline.step().await.expect("first step");
    assert!(matches!(assert_err!(first), Error::Validation(_)));

    let second = pipeline.step().await.expect("second step");
    assert_eq!(assert_ok!(second), StepOutput::Text("yes".to_string()));

    let speakers: Vec<_> = pipeline.transcript()
      .entries()
      .iter()
      .map(|e| e.speaker)
      .collect();
    assert_eq!(speakers, vec![
      Speaker::User, Speaker::Error, Speaker::User, Speaker::Ai,
    ]);
}

#[tokio::test]
async fn test_subscribers_see_every_entry()
{   let server = MockServer::start().await;
    mount_completion(&server, "Say hi", "hello").await;

    let client = client_for(&server);
    let mut pipeline = Pipeline::new(&client);
    let mut entries = pipeline.transcript_mut().subscribe();
    pipeline.push(PipelineStep::new(TextCompletion::new("Say hi")));
    pipeline.run().await;

    let transcript = pipeline.into_transcript();
    let mut seen = Vec::new();
    while let Ok(entry) = entries.try_recv()
    {   seen.push(entry);
    }
    assert_eq!(seen, transcript.entries().to_vec());
    assert_eq!(seen.len(), 2);
}

#[tokio::test]
async fn test_empty_pipeline_makes_no_calls()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let client = client_for(&server);
    let mut pipeline = Pipeline::new(&client);
    assert!(pipeline.step().await.is_none());
    pipeline.run().await;

    assert!(pipeline.transcript().is_empty());
    assert_eq!(pipeline.state(), PipelineState::Idle);
}
