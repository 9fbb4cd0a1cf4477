//! `BackoffLlmClient<L>`: retries a wrapped [`LlmClient`] on transient
//! (429/5xx) failures only, with `1s, 10s, 20s` backoff plus up to 100 ms of
//! jitter (spec.md §6).

use rand::Rng;
use tracing::warn;

use crate::error::{LlmError, LlmResult};
use crate::llm::{ChatRequest, ChatResponse, LlmClient};

const BACKOFFS_MS: [u64; 3] = [1_000, 10_000, 20_000];

fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Wraps any `LlmClient` with the retry policy. Non-retryable errors (4xx
/// other than 429, or any non-HTTP error) propagate immediately.
pub struct BackoffLlmClient<L> {
    inner: L,
}

impl<L: LlmClient> BackoffLlmClient<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    async fn with_retry<T, F, Fut>(&self, mut op: F) -> LlmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = LlmResult<T>>,
    {
        let mut attempt = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(LlmError::Http { status, message }) if is_retryable(status) && attempt < BACKOFFS_MS.len() => {
                    let jitter_ms: u64 = rand::thread_rng().gen_range(0..100);
                    let delay_ms = BACKOFFS_MS[attempt] + jitter_ms;
                    warn!(status, attempt, delay_ms, %message, "llm call failed; retrying after backoff");
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<L: LlmClient> LlmClient for BackoffLlmClient<L> {
    async fn chat(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        self.with_retry(|| self.inner.chat(request.clone())).await
    }

    async fn embed(&self, texts: &[String]) -> LlmResult<Vec<Vec<f32>>> {
        self.with_retry(|| self.inner.embed(texts)).await
    }

    async fn moderate(&self, text: &str) -> LlmResult<bool> {
        self.with_retry(|| self.inner.moderate(text)).await
    }
}
