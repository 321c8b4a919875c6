#![allow(dead_code)]

use async_trait::async_trait;
use llm_eval_core::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Deterministic backend: answers every prompt with `echo: <last message>`.
#[derive(Default)]
pub struct EchoBackend {
    pub calls: AtomicUsize,
    pub batch_sizes: Mutex<Vec<usize>>,
    pub delay: Option<Duration>,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for EchoBackend {
    async fn infer_batch(
        &self,
        conversations: &[Vec<Message>],
        params: &GenerationParams,
    ) -> Result<Vec<Completion>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(conversations.len());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(conversations
            .iter()
            .map(|c| {
                let last = c.last().map(|m| m.content.as_str()).unwrap_or_default();
                if params.temperature > 0.0 {
                    Completion::new(format!("echo({}): {}", params.temperature, last))
                } else {
                    Completion::new(format!("echo: {}", last))
                }
            })
            .collect())
    }
}

pub fn labeled(question: &str, answer: &str) -> DatasetExample {
    DatasetExample::new(vec![
        Message::system("Answer briefly."),
        Message::user(question),
        Message::assistant(answer),
    ])
}

/// `n` examples whose reference equals what [`EchoBackend`] answers for
/// every even index.
pub fn echo_dataset(n: usize) -> InMemoryDataset {
    InMemoryDataset::new(
        (0..n)
            .map(|i| {
                let question = format!("question {}", i);
                let answer = if i % 2 == 0 {
                    format!("echo: {}", question)
                } else {
                    format!("answer {}", i)
                };
                labeled(&question, &answer)
            })
            .collect(),
    )
}
