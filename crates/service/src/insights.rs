//! Advisory insight generation and display state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use perkfinder_advisory::{build_prompt, parse_with, ParseMode, PromptConfig, SYSTEM_INSTRUCTION};
use perkfinder_backend::{AdvisoryGenerator, GenerationError, GenerationRequest};
use perkfinder_model::{InsightRecord, UserProfile};
use serde::{Deserialize, Serialize};

/// Sampling knobs forwarded to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

/// Turns a user profile into segmented advice with one generator call.
#[derive(Clone)]
pub struct InsightService {
    generator: Arc<dyn AdvisoryGenerator>,
    prompt: PromptConfig,
    params: GenerationParams,
    mode: ParseMode,
}

impl InsightService {
    pub fn new(generator: Arc<dyn AdvisoryGenerator>) -> Self {
        Self {
            generator,
            prompt: PromptConfig::default(),
            params: GenerationParams::default(),
            mode: ParseMode::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptConfig) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn request_for(&self, profile: &UserProfile) -> GenerationRequest {
        GenerationRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(profile, &self.prompt),
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
        }
    }

    /// Generate and parse advice. Generator errors are returned untouched.
    pub async fn generate(&self, profile: &UserProfile) -> Result<InsightRecord, GenerationError> {
        let request = self.request_for(profile);
        let raw = self.generator.generate(&request).await?;
        let record = parse_with(&raw, self.mode);

        if record.is_unstructured() {
            tracing::warn!(
                generator = self.generator.name(),
                "Advisory text had no numbered sections"
            );
        }
        Ok(record)
    }

    /// Run one generation against `slot`; returns whether the result was applied.
    pub async fn refresh(&self, slot: &InsightSlot, profile: &UserProfile) -> bool {
        let ticket = slot.begin();
        let result = self.generate(profile).await;
        slot.finish(ticket, result)
    }
}

/// What a display shows for the insight panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightState {
    pub insights: Option<InsightRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Insight display state where only the most recent request may land.
///
/// Each `begin` issues a new ticket; `finish` with an older ticket is dropped.
#[derive(Debug, Default)]
pub struct InsightSlot {
    latest: AtomicU64,
    state: Mutex<InsightState>,
}

impl InsightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InsightState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a request and mark the slot as loading.
    pub fn begin(&self) -> u64 {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state();
        state.loading = true;
        state.error = None;
        ticket
    }

    /// Apply a result if `ticket` is still the latest request.
    pub fn finish(&self, ticket: u64, result: Result<InsightRecord, GenerationError>) -> bool {
        let mut state = self.state();
        if ticket != self.latest.load(Ordering::SeqCst) {
            tracing::debug!(ticket, "Discarding stale insight result");
            return false;
        }

        state.loading = false;
        match result {
            Ok(record) => {
                state.insights = Some(record);
                state.error = None;
            }
            Err(e) => state.error = Some(e.to_string()),
        }
        true
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    pub fn snapshot(&self) -> InsightState {
        self.state().clone()
    }
}
