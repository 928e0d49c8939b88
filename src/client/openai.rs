//! OpenAI-compatible chat-completions client used to reach Cerebras (or any other
//! OpenAI-compatible inference endpoint) with a genuinely lazy token stream.

use std::error::Error;

use async_trait::async_trait;
use futures_util::stream::StreamExt;
use openai_rust::chat;
use openai_rust2 as openai_rust;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::client::common::{get_shared_http_client, StreamError};
use crate::client::wrapper::{ChatStreamClient, MessageChunk, MessageChunkStream, MessageStreamFuture};
use crate::error::{EngineError, EngineResult};

/// Default bound on the per-stream chunk channel. Large enough that a fast upstream
/// never visibly stalls on a consumer doing real work, small enough to cap memory if
/// the consumer falls behind.
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// Chat-completions client pointed at an OpenAI-compatible base URL.
///
/// One instance is shared (via `Arc`) across every agent in a debate; `model` is not
/// fixed on the client itself because the round executor may switch an individual
/// agent to its fallback model on retry, so the model id is supplied per call instead.
pub struct OpenAIChatClient {
    client: openai_rust::Client,
    base_url: String,
}

impl OpenAIChatClient {
    /// Construct a client targeting a custom OpenAI-compatible base URL.
    ///
    /// `base_url` should not have a trailing slash, e.g. `"https://api.cerebras.ai/v1"`.
    /// Returns a configuration error (§7) for a blank key or base URL rather than
    /// constructing a client that would only fail on its first request.
    pub fn new(api_key: &str, base_url: &str) -> EngineResult<Self> {
        if api_key.trim().is_empty() {
            return Err(EngineError::Config("upstream API key is blank".to_string()));
        }
        let normalized = base_url.trim().trim_end_matches('/');
        if normalized.is_empty() {
            return Err(EngineError::Config("upstream base URL is blank".to_string()));
        }
        Ok(OpenAIChatClient {
            client: openai_rust::Client::new_with_client_and_base_url(
                api_key,
                get_shared_http_client().clone(),
                &format!("{}/", normalized),
            ),
            base_url: normalized.to_string(),
        })
    }
}

#[async_trait]
impl ChatStreamClient for OpenAIChatClient {
    fn stream_chat<'a>(
        &'a self,
        model: &'a str,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> MessageStreamFuture<'a> {
        Box::pin(async move {
            let messages = vec![
                chat::Message {
                    role: "system".to_owned(),
                    content: system_prompt.to_owned(),
                },
                chat::Message {
                    role: "user".to_owned(),
                    content: user_prompt.to_owned(),
                },
            ];
            let chat_arguments = chat::ChatArguments::new(model, messages);

            let mut upstream = self
                .client
                .create_chat_stream(chat_arguments, Some("/v1/chat/completions".to_string()))
                .await
                .map_err(|e| -> Box<dyn Error + Send + Sync> {
                    log::error!("OpenAIChatClient::stream_chat: failed to open stream: {}", e);
                    Box::new(StreamError(format!("failed to open upstream stream: {}", e)))
                })?;

            // Hand iteration off to a dedicated task so a slow consumer never blocks
            // the caller's poll, and so the per-chunk suspension the caller observes
            // is a genuine channel recv rather than driving the upstream SDK inline.
            let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
            tokio::spawn(async move {
                while let Some(chunk_result) = upstream.next().await {
                    let mapped: Result<MessageChunk, Box<dyn Error + Send + Sync>> = match chunk_result {
                        Ok(chunk) => {
                            let content = chunk
                                .choices
                                .first()
                                .and_then(|choice| choice.delta.content.clone())
                                .unwrap_or_default();
                            let finish_reason = chunk
                                .choices
                                .first()
                                .and_then(|choice| choice.finish_reason.clone());
                            Ok(MessageChunk {
                                content,
                                finish_reason,
                                usage: None,
                                completion_time_secs: None,
                            })
                        }
                        Err(err) => {
                            log::error!("OpenAIChatClient::stream_chat: chunk error: {}", err);
                            Err(Box::new(StreamError(format!("stream chunk error: {}", err)))
                                as Box<dyn Error + Send + Sync>)
                        }
                    };
                    let is_err = mapped.is_err();
                    if tx.send(mapped).await.is_err() {
                        // Consumer dropped the stream (cancellation); stop driving upstream.
                        break;
                    }
                    if is_err {
                        break;
                    }
                }
            });

            let stream: MessageChunkStream = Box::pin(ReceiverStream::new(rx));
            Ok(stream)
        })
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
