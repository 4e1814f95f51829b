//! Conversion and analysis services on top of a completion client

use crate::archive::Extraction;
use crate::completion::{CompletionClient, CompletionRequest, HttpCompletionClient};
use crate::config::AppConfig;
use crate::error::{CoreError, Result};
use crate::interpreter::{interpret, try_interpret};
use crate::prompts;
use crate::suffix::SuffixMap;
use crate::types::{
    AnalysisResult, ConversionBatch, ConversionOptions, ConversionResult, ConversionStats,
    SourceUnit,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Token budget for conversions that carry project context
pub const CONTEXT_CONVERSION_MAX_TOKENS: u32 = 5000;
/// Token budget for the project-context pass
pub const PROJECT_CONTEXT_MAX_TOKENS: u32 = 3000;

/// Batch progress, reported after each item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Name of the unit just finished
    pub current: String,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

fn empty_project_context() -> Value {
    json!({
        "namespaces": [],
        "interfaces": [],
        "base_classes": [],
        "custom_types": [],
        "dependencies": [],
    })
}

pub struct Converter {
    client: Arc<dyn CompletionClient>,
    suffixes: SuffixMap,
    max_tokens: u32,
    temperature: f32,
}

impl Converter {
    pub fn new(client: Arc<dyn CompletionClient>, suffixes: SuffixMap) -> Self {
        Self {
            client,
            suffixes,
            max_tokens: crate::completion::DEFAULT_MAX_TOKENS,
            temperature: crate::completion::DEFAULT_TEMPERATURE,
        }
    }

    /// Converter backed by the HTTP client described in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = HttpCompletionClient::new(config.completion.clone())?;
        Ok(Self::new(Arc::new(client), config.suffixes.clone())
            .with_limits(config.completion.max_tokens, config.completion.temperature))
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn client(&self) -> &dyn CompletionClient {
        self.client.as_ref()
    }

    pub fn suffixes(&self) -> &SuffixMap {
        &self.suffixes
    }

    fn request(&self, system: String, user: String) -> CompletionRequest {
        CompletionRequest::new(system, user)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }

    /// Translate one unit. Never fails: a failed call yields a marked
    /// placeholder and an unparseable reply yields the raw text.
    pub async fn convert(
        &self,
        unit: &SourceUnit,
        options: &ConversionOptions,
        context: Option<&Value>,
    ) -> ConversionResult {
        let request = match context {
            Some(context) => self
                .request(
                    prompts::context_system_prompt(options, context),
                    prompts::context_user_prompt(unit, options),
                )
                .with_max_tokens(CONTEXT_CONVERSION_MAX_TOKENS),
            None => self.request(
                prompts::conversion_system_prompt(options),
                prompts::conversion_user_prompt(unit, options),
            ),
        };

        let reply = match self.client.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Conversion of {} failed: {}", unit.name, e);
                return ConversionResult::failed(unit, options, &self.suffixes);
            }
        };

        let payload = match try_interpret(&reply) {
            Some(payload) => payload,
            None => {
                debug!("Reply for {} was not a JSON object", unit.name);
                ConversionResult::fallback_payload(&reply, options)
            }
        };
        ConversionResult::from_payload(unit, &payload, options, &self.suffixes)
    }

    /// Review one snippet; `None` when the completion call fails
    pub async fn analyze(&self, code: &str, filename: &str) -> Option<AnalysisResult> {
        let request = self.request(
            prompts::ANALYSIS_SYSTEM_PROMPT.to_string(),
            prompts::analysis_user_prompt(code, filename),
        );

        match self.client.complete(request).await {
            Ok(reply) => {
                let payload = interpret(&reply, AnalysisResult::fallback_payload());
                Some(AnalysisResult::from_payload(&payload))
            }
            Err(e) => {
                warn!("Analysis of {} failed: {}", filename, e);
                None
            }
        }
    }

    /// Cross-file context for a multi-file batch
    pub async fn project_context(&self, units: &[SourceUnit]) -> Option<Value> {
        if units.len() <= 1 {
            return None;
        }

        let request = self
            .request(
                prompts::CONTEXT_SYSTEM_PROMPT.to_string(),
                prompts::project_summary(units),
            )
            .with_max_tokens(PROJECT_CONTEXT_MAX_TOKENS);

        match self.client.complete(request).await {
            Ok(reply) => Some(interpret(&reply, empty_project_context())),
            Err(e) => {
                warn!("Project context analysis failed: {}", e);
                None
            }
        }
    }

    /// Convert every unit of an extraction in order.
    ///
    /// `cancel` is checked before each item; a cancelled batch returns
    /// [`CoreError::Cancelled`] with the number of finished items.
    pub async fn convert_batch<F>(
        &self,
        extraction: Extraction,
        options: &ConversionOptions,
        mut on_progress: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<ConversionBatch>
    where
        F: FnMut(Progress),
    {
        let Extraction {
            units,
            layout,
            warnings,
        } = extraction;
        if units.is_empty() {
            return Err(CoreError::EmptyInput);
        }

        let total = units.len();
        let context = if options.use_project_context {
            self.project_context(&units).await
        } else {
            None
        };
        info!(
            "Converting {} file(s) (project context: {})",
            total,
            context.is_some()
        );

        let mut results = Vec::with_capacity(total);
        for unit in &units {
            if cancel.is_some_and(|token| token.is_cancelled()) {
                info!("Batch cancelled after {} of {} files", results.len(), total);
                return Err(CoreError::Cancelled {
                    completed: results.len(),
                    total,
                });
            }

            results.push(self.convert(unit, options, context.as_ref()).await);
            on_progress(Progress {
                completed: results.len(),
                total,
                current: unit.name.clone(),
            });
        }

        let stats = ConversionStats::from_results(&results, context.is_some(), *options);
        Ok(ConversionBatch {
            results,
            stats,
            layout,
            warnings,
        })
    }
}
