#![allow(dead_code)]

use std::time::Duration;

use openai_actions::{ClientConfig, OpenAiClient, Reply, ReplyReceiver};
use serde_json::json;
use wiremock::MockServer;

pub const TEST_KEY: &str = "test-key";

/// Client pointed at the mock server
pub fn client_for(server: &MockServer) -> OpenAiClient
{   let config = ClientConfig::new(TEST_KEY)
      .with_base_url(server.uri())
      .with_verbose(true);
    OpenAiClient::new(config).expect("client should build")
}

/// Wait for the single reply and check that nothing follows it
pub async fn recv_once<T>(mut rx: ReplyReceiver<T>) -> Reply<T>
{   let first = tokio::time::timeout(Duration::from_secs(10), rx.recv())
      .await
      .expect("timed out waiting for reply")
      .expect("reply channel closed without a result");
    let second = tokio::time::timeout(Duration::from_secs(10), rx.recv())
      .await
      .expect("reply channel never closed");
    assert!(second.is_none(), "more than one reply delivered");
    first
}

pub fn text_completion_body(text: &str) -> serde_json::Value
{   json!({
      "id": "cmpl-1",
      "object": "text_completion",
      "created": 1677652288,
      "model": "text-davinci-003",
      "choices": [{
        "text": text,
        "index": 0,
        "logprobs": null,
        "finish_reason": "length"
      }],
      "usage": {
        "prompt_tokens": 5,
        "completion_tokens": 7,
        "total_tokens": 12
      }
    })
}

pub fn chat_completion_body(content: &str) -> serde_json::Value
{   json!({
      "id": "chatcmpl-1",
      "object": "chat.completion",
      "created": 1677652288,
      "model": "gpt-3.5-turbo",
      "choices": [{
        "index": 0,
        "message": { "role": "assistant", "content": content },
        "finish_reason": "stop"
      }]
    })
}

pub fn embedding_body(values: &[f32]) -> serde_json::Value
{   json!({
      "object": "list",
      "data": [{
        "object": "embedding",
        "index": 0,
        "embedding": values
      }],
      "model": "text-embedding-ada-002",
      "usage": { "prompt_tokens": 8, "total_tokens": 8 }
    })
}

pub fn image_body(urls: &[&str]) -> serde_json::Value
{   let data: Vec<_> = urls.iter().map(|u| json!({ "url": u })).collect();
    json!({ "created": 1589478378, "data": data })
}

pub fn moderation_body(hate: bool, violence: bool) -> serde_json::Value
{   json!({
      "id": "modr-1",
      "model": "text-moderation-004",
      "results": [{
        "flagged": hate || violence,
        "categories": {
          "hate": hate,
          "hate/threatening": false,
          "self-harm": false,
          "sexual": false,
          "sexual/minors": false,
          "violence": violence,
          "violence/graphic": false
        },
        "category_scores": {
          "hate": 0.12,
          "hate/threatening": 0.01,
          "self-harm": 0.0,
          "sexual": 0.0,
          "sexual/minors": 0.0,
          "violence": 0.93,
          "violence/graphic": 0.02
        }
      }]
    })
}
