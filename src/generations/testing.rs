//! Scripted generator for board and scheduler tests

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::ConceptGenerator;
use crate::cards::Concept;
use crate::error::AppError;

/// Deterministic generator
///
/// `create` echoes the prompt, `mix` joins names with `+`, `split` yields
/// `"<name> A"` and `"<name> B"`. With a gate installed every call waits for a
/// permit first, which lets tests hold actions in flight.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub fail_create: AtomicBool,
    pub fail_mix: AtomicBool,
    /// Split emits its first half and then fails
    pub fail_split: AtomicBool,
    pub calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call blocks until a permit is added to the returned semaphore
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let generator = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (generator, gate)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn pass_gate(gate: Option<Arc<Semaphore>>) {
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl ConceptGenerator for ScriptedGenerator {
    async fn create_concept(&self, _api_key: &str, prompt: &str) -> Result<Concept, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Self::pass_gate(self.gate.clone()).await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::generation_failed("scripted create failure"));
        }
        Ok(Concept::new(prompt, format!("All about {}.", prompt), "✨"))
    }

    async fn mix_concepts(&self, _api_key: &str, concepts: &[Concept]) -> Result<Concept, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Self::pass_gate(self.gate.clone()).await;
        if self.fail_mix.load(Ordering::SeqCst) {
            return Err(AppError::generation_failed("scripted mix failure"));
        }
        let name = concepts
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join("+");
        Ok(Concept::new(name.clone(), format!("A blend: {}.", name), "🌀"))
    }

    fn split_concept(
        &self,
        _api_key: &str,
        concept: &Concept,
    ) -> BoxStream<'static, Result<Concept, AppError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.clone();
        let first = Concept::new(format!("{} A", concept.name), "First half.", "🅰️");
        let second = if self.fail_split.load(Ordering::SeqCst) {
            Err(AppError::generation_failed("scripted split failure"))
        } else {
            Ok(Concept::new(format!("{} B", concept.name), "Second half.", "🅱️"))
        };

        stream::once(async move {
            Self::pass_gate(gate).await;
            stream::iter(vec![Ok(first), second])
        })
        .flatten()
        .boxed()
    }
}
