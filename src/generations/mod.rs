//! Concept generation service
//!
//! [`ConceptGenerator`] is the seam between the board and whatever produces
//! concepts. [`GeminiClient`] implements it with structured JSON output; splits
//! are streamed so each half shows up as soon as the model finishes writing it.

pub mod scanner;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;

use crate::cards::Concept;
use crate::error::AppError;
use crate::gemini::{GeminiClient, GenerateContentRequest, GenerationConfig};
use scanner::ArrayItemScanner;

const CREATE_INSTRUCTION: &str = "Capture the user provided concept. Respond in JSON format with the following fields: emoji (string), name (string), description (string). Example response: {\"emoji\":\"🔥\",\"name\":\"Fire\",\"description\":\"A fiery creature that burns everything in its path.\"}.";

const MIX_INSTRUCTION: &str = "Create a new concept by mixing the provided concepts. Focus on deep conceptual blending rather than shallow semantic mixing. The result concept name should not increase in length but instead, align with established concepts. Respond in JSON format with the following fields: emoji (string), name (string), description (string). Example response: {\"emoji\":\"🌪️\",\"name\":\"Storm\",\"description\":\"A swirling entity that commands wind and rain.\"}.";

const SPLIT_INSTRUCTION: &str = "Decompose the provided concept into two component concepts that could logically combine to form it. Focus on fundamental components. Respond in JSON format as an array of exactly two objects, each with the following fields: emoji (string), name (string), description (string). Example response: [{\"emoji\":\"🔥\",\"name\":\"Fire\",\"description\":\"A hot, glowing body of ignited gas.\"},{\"emoji\":\"💧\",\"name\":\"Water\",\"description\":\"A clear, colorless, odorless liquid.\"}].";

/// Produces concepts from prompts, mixtures and splits
#[async_trait]
pub trait ConceptGenerator: Send + Sync {
    async fn create_concept(&self, api_key: &str, prompt: &str) -> Result<Concept, AppError>;

    async fn mix_concepts(&self, api_key: &str, concepts: &[Concept]) -> Result<Concept, AppError>;

    /// Decompose a concept into two; results are emitted as they complete
    fn split_concept(
        &self,
        api_key: &str,
        concept: &Concept,
    ) -> BoxStream<'static, Result<Concept, AppError>>;
}

/// JSON schema for a single concept
pub fn concept_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "description": {
                "type": "string",
                "description": "One short sentence summarize the concept"
            },
            "name": {
                "type": "string",
                "description": "A short name for the concept"
            },
            "emoji": {
                "type": "string",
                "description": "A single emoji representing the concept"
            }
        },
        "required": ["description", "name", "emoji"],
        "additionalProperties": false
    })
}

/// JSON schema for the two halves of a split
pub fn concept_pair_schema() -> Value {
    json!({
        "type": "array",
        "items": concept_schema(),
        "minItems": 2,
        "maxItems": 2
    })
}

/// Prompt text describing the concepts to mix
pub fn mix_prompt(concepts: &[Concept]) -> String {
    concepts
        .iter()
        .enumerate()
        .map(|(i, c)| format!("Concept {}: {} - {}", i + 1, c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn split_prompt(concept: &Concept) -> String {
    format!("Concept: {} - {}", concept.name, concept.description)
}

fn parse_concept(text: &str) -> Result<Concept, AppError> {
    serde_json::from_str(text).map_err(|e| {
        AppError::parse_error("Failed to parse concept blueprint from response.")
            .with_details(e.to_string())
    })
}

/// Streamed items may be missing fields; only complete ones are kept
#[derive(Debug, Deserialize)]
struct PartialConcept {
    name: Option<String>,
    description: Option<String>,
    emoji: Option<String>,
}

impl PartialConcept {
    fn complete(self) -> Option<Concept> {
        match (self.name, self.description, self.emoji) {
            (Some(name), Some(description), Some(emoji))
                if !name.is_empty() && !description.is_empty() && !emoji.is_empty() =>
            {
                Some(Concept {
                    name,
                    description,
                    emoji,
                })
            }
            _ => None,
        }
    }
}

/// Turn a stream of JSON text deltas into the concepts of the array it spells
pub fn concepts_from_text(
    text: BoxStream<'static, Result<String, AppError>>,
) -> BoxStream<'static, Result<Concept, AppError>> {
    let state = (text, ArrayItemScanner::new(), VecDeque::new());

    stream::unfold(state, |(mut text, mut scanner, mut ready)| async move {
        loop {
            if let Some(concept) = ready.pop_front() {
                return Some((Ok(concept), (text, scanner, ready)));
            }
            match text.next().await? {
                Ok(delta) => {
                    for item in scanner.push(&delta) {
                        if let Some(concept) = serde_json::from_str::<PartialConcept>(&item)
                            .ok()
                            .and_then(PartialConcept::complete)
                        {
                            ready.push_back(concept);
                        }
                    }
                }
                Err(e) => return Some((Err(e), (stream::empty().boxed(), scanner, ready))),
            }
        }
    })
    .boxed()
}

#[async_trait]
impl ConceptGenerator for GeminiClient {
    async fn create_concept(&self, api_key: &str, prompt: &str) -> Result<Concept, AppError> {
        let request = GenerateContentRequest::user_text(prompt)
            .with_system_instruction(CREATE_INSTRUCTION)
            .with_generation_config(GenerationConfig::json(concept_schema()));
        let text = self.generate(api_key, &self.config().model, &request).await?;
        parse_concept(&text)
    }

    async fn mix_concepts(&self, api_key: &str, concepts: &[Concept]) -> Result<Concept, AppError> {
        let request = GenerateContentRequest::user_text(mix_prompt(concepts))
            .with_system_instruction(MIX_INSTRUCTION)
            .with_generation_config(GenerationConfig::json(concept_schema()));
        let text = self.generate(api_key, &self.config().model, &request).await?;
        parse_concept(&text)
    }

    fn split_concept(
        &self,
        api_key: &str,
        concept: &Concept,
    ) -> BoxStream<'static, Result<Concept, AppError>> {
        let client = self.clone();
        let api_key = api_key.to_string();
        let request = GenerateContentRequest::user_text(split_prompt(concept))
            .with_system_instruction(SPLIT_INSTRUCTION)
            .with_generation_config(GenerationConfig::json(concept_pair_schema()));

        stream::once(async move {
            let model = client.config().model.clone();
            client.stream_generate(&api_key, &model, &request).await
        })
        .map(|opened| match opened {
            Ok(text) => concepts_from_text(text),
            Err(e) => stream::iter([Err(e)]).boxed(),
        })
        .flatten()
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(parts: &[&str]) -> BoxStream<'static, Result<String, AppError>> {
        let items: Vec<Result<String, AppError>> =
            parts.iter().map(|p| Ok(p.to_string())).collect();
        stream::iter(items).boxed()
    }

    #[test]
    fn test_mix_prompt_numbers_concepts() {
        let prompt = mix_prompt(&[
            Concept::new("Fire", "Hot.", "🔥"),
            Concept::new("Water", "Wet.", "💧"),
        ]);
        assert_eq!(prompt, "Concept 1: Fire - Hot.\nConcept 2: Water - Wet.");
    }

    #[test]
    fn test_parse_concept_rejects_garbage() {
        let err = parse_concept("not json").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ParseError);

        let concept = parse_concept(r#"{"emoji":"🔥","name":"Fire","description":"Hot."}"#).unwrap();
        assert_eq!(concept, Concept::new("Fire", "Hot.", "🔥"));
    }

    #[tokio::test]
    async fn test_concepts_stream_incrementally() {
        let mut concepts = concepts_from_text(deltas(&[
            "[{\"emoji\":\"🔥\",\"name\":\"Fi",
            "re\",\"description\":\"Hot.\"},",
            "{\"emoji\":\"💧\",\"name\":\"Water\",\"description\":\"Wet.\"}]",
        ]));

        let first = concepts.next().await.unwrap().unwrap();
        assert_eq!(first.name, "Fire");
        let second = concepts.next().await.unwrap().unwrap();
        assert_eq!(second.name, "Water");
        assert!(concepts.next().await.is_none());
    }

    #[tokio::test]
    async fn test_incomplete_items_are_skipped() {
        let concepts: Vec<_> = concepts_from_text(deltas(&[
            "[{\"name\":\"Half\"},{\"emoji\":\"💧\",\"name\":\"Water\",\"description\":\"Wet.\"}]",
        ]))
        .collect()
        .await;
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].as_ref().unwrap().name, "Water");
    }

    #[tokio::test]
    async fn test_stream_error_ends_output() {
        let items: Vec<Result<String, AppError>> = vec![
            Ok("[{\"emoji\":\"🔥\",\"name\":\"Fire\",\"description\":\"Hot.\"},".to_string()),
            Err(AppError::generation_failed("connection reset")),
            Ok("{\"emoji\":\"💧\",\"name\":\"Water\",\"description\":\"Wet.\"}]".to_string()),
        ];
        let results: Vec<_> = concepts_from_text(stream::iter(items).boxed()).collect().await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
