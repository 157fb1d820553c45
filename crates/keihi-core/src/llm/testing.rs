//! Scripted model for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ContentPart, ModelClient};
use crate::error::ModelError;

/// Answers by exact instruction text and records every request.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    answers: HashMap<String, String>,
    failing: Option<String>,
    calls: Mutex<Vec<Vec<ContentPart>>>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn answer(mut self, instruction: impl Into<String>, answer: impl Into<String>) -> Self {
        self.answers.insert(instruction.into(), answer.into());
        self
    }

    /// Fail with a provider error when this instruction is sent.
    pub(crate) fn fail_on(mut self, instruction: impl Into<String>) -> Self {
        self.failing = Some(instruction.into());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<ContentPart>> {
        self.calls.lock().unwrap().clone()
    }
}

/// Instruction text of a request, without any inlined document.
pub(crate) fn instruction_of(parts: &[ContentPart]) -> String {
    match parts.first() {
        Some(ContentPart::Text(text)) => text
            .rsplit_once("\"\"\"\n")
            .map(|(_, instruction)| instruction)
            .unwrap_or(text.as_str())
            .to_string(),
        _ => String::new(),
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn invoke(&self, parts: &[ContentPart]) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(parts.to_vec());
        let instruction = instruction_of(parts);

        if self.failing.as_deref() == Some(instruction.as_str()) {
            return Err(ModelError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            });
        }
        Ok(self.answers.get(&instruction).cloned().unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
