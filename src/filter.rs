//! The token-counting filter and its lifecycle surface.
//!
//! A host pipeline drives one `TokenCountFilter` instance per run through
//! `initialize`, one `process` call per record, and `finalize`. The filter
//! never mutates record contents; it observes them and makes a pass/drop
//! decision against the cumulative budget.

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::accounting::{Accounting, Verdict};
use crate::location::{Location, LocationSpec};
use crate::record::Record;
use crate::tokenizer::{self, Tokenizer};
use crate::types::{CostUsd, Result, TokengateError};

/// Lifecycle contract consumed from the host pipeline.
pub trait RecordFilter {
    /// May fail with a fatal configuration error; no record flows after that.
    fn initialize(&mut self) -> Result<()>;
    /// One record in, the same record out (pass) or `None` (drop).
    fn process(&mut self, record: Record) -> Result<Option<Record>>;
    /// Emit end-of-stream totals to the logging facility.
    fn finalize(&mut self);
}

/// Filter configuration, immutable after initialization.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub price_per_1k_tokens: Option<f64>,
    /// Cumulative token budget; values <= 0 mean unlimited.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
    /// One tag or a collection of tags; normalized to a set at initialization.
    #[serde(default = "default_location", deserialize_with = "one_or_many")]
    pub location: Vec<Location>,
    /// Languages to inspect on translation records; all if absent.
    #[serde(default, deserialize_with = "opt_one_or_many")]
    pub languages: Option<Vec<String>>,
}

fn default_max_tokens() -> i64 {
    -1
}

fn default_location() -> Vec<Location> {
    vec![Location::Any]
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            encoding: None,
            model: None,
            prompt: None,
            price_per_1k_tokens: None,
            max_tokens: default_max_tokens(),
            location: default_location(),
            languages: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

fn opt_one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<OneOrMany<T>>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    }))
}

/// Everything resolved at `initialize` time.
struct RunState {
    tokenizer: Box<dyn Tokenizer>,
    locations: LocationSpec,
    languages: Option<Vec<String>>,
    accounting: Accounting,
}

pub struct TokenCountFilter {
    config: FilterConfig,
    state: Option<RunState>,
}

impl TokenCountFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Build an already-initialized filter around a caller-supplied tokenizer,
    /// bypassing encoding/model resolution. The tokenizer is an opaque
    /// capability; hosts with their own counting scheme plug in here.
    pub fn with_tokenizer(config: FilterConfig, tokenizer: Box<dyn Tokenizer>) -> Result<Self> {
        let mut filter = Self::new(config);
        filter.state = Some(filter.build_state(tokenizer)?);
        Ok(filter)
    }

    fn build_state(&self, tokenizer: Box<dyn Tokenizer>) -> Result<RunState> {
        let locations = LocationSpec::new(self.config.location.iter().copied())?;

        let languages = self
            .config
            .languages
            .as_ref()
            .map(|langs| langs.iter().map(|l| l.to_lowercase()).collect::<Vec<_>>());

        let prompt_overhead = match self.config.prompt.as_deref() {
            Some(prompt) if !prompt.is_empty() => tokenizer.count(prompt),
            _ => 0,
        };

        Ok(RunState {
            tokenizer,
            locations,
            languages,
            accounting: Accounting::new(prompt_overhead, self.config.max_tokens),
        })
    }

    pub fn total_tokens(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.accounting.total())
    }

    pub fn budget_exceeded(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.accounting.budget_exceeded())
    }

    pub fn price(&self) -> Option<CostUsd> {
        let per_1k = self.config.price_per_1k_tokens?;
        Some(self.state.as_ref()?.accounting.price(per_1k))
    }
}

impl RecordFilter for TokenCountFilter {
    fn initialize(&mut self) -> Result<()> {
        let tokenizer =
            tokenizer::resolve(self.config.encoding.as_deref(), self.config.model.as_deref())?;
        self.state = Some(self.build_state(tokenizer)?);
        Ok(())
    }

    fn process(&mut self, record: Record) -> Result<Option<Record>> {
        // Fail loudly if the host skipped initialize.
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| TokengateError::Config("filter used before initialize".to_string()))?;

        let texts = record.candidates(&state.locations, state.languages.as_deref());
        for text in texts {
            let tokens = state.tokenizer.count(text);
            state.accounting.add_hit(tokens);
        }

        match state.accounting.settle() {
            Verdict::Pass => Ok(Some(record)),
            Verdict::Drop => Ok(None),
        }
    }

    fn finalize(&mut self) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let acc = &state.accounting;
        if acc.prompt_overhead() > 0 {
            info!(tokens = acc.prompt_overhead(), "prompt tokens (charged per location hit)");
        }
        info!(tokens = acc.total(), "total tokens");
        if acc.budget_exceeded() {
            info!(
                max_tokens = self.config.max_tokens,
                "token budget was exceeded during the run"
            );
        }
        if let Some(per_1k) = self.config.price_per_1k_tokens {
            info!(
                price = %acc.price(per_1k),
                price_per_1k_tokens = per_1k,
                "total price"
            );
        }
    }
}
