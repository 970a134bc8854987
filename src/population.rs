//! Population driver: runs the respondent simulator across N respondents
//! and flattens the resulting forms into an export table.
//!
//! The question order is computed once per `simulate` call and shared by
//! every respondent. Respondents share nothing mutable: each one gets its
//! own form and its own RNG stream seeded from `(base_seed, index)`, so a
//! parallel run produces exactly the forms a sequential run would.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distribution::SamplingPolicy;
use crate::error::SurveyError;
use crate::guru::{Form, Guru, DEFAULT_EFFECT_LIMIT};
use crate::ordering::{OrderingPolicy, PriorityThenDegree};
use crate::strategy::{StrategyRegistry, DEFAULT_ORDERING, DEFAULT_SAMPLING};
use crate::survey::Survey;

// =============================================================================
// Config
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Influence-driven walk over the ordered questions.
    #[default]
    Guided,
    /// Uniform choice per question, ignoring connections.
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base seed for the per-respondent RNG streams. `None` draws one.
    pub rng_seed: Option<u64>,
    /// Ordering strategy name, resolved through a `StrategyRegistry`.
    pub ordering: String,
    /// Sampling strategy name, resolved through a `StrategyRegistry`.
    pub sampling: String,
    /// Clamp on the absolute accumulated effect. `None` disables clamping.
    pub effect_limit: Option<i64>,
    /// Simulate respondents on the rayon pool.
    pub parallel: bool,
    pub mode: AnswerMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            ordering: DEFAULT_ORDERING.to_string(),
            sampling: DEFAULT_SAMPLING.to_string(),
            effect_limit: Some(DEFAULT_EFFECT_LIMIT),
            parallel: false,
            mode: AnswerMode::Guided,
        }
    }
}

impl SimulationConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SurveyError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SurveyError::InvalidConfig(format!("failed to read config: {e}")))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| SurveyError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SurveyError> {
        if let Some(limit) = self.effect_limit {
            if !(0..=DEFAULT_EFFECT_LIMIT).contains(&limit) {
                return Err(SurveyError::InvalidConfig(format!(
                    "effect_limit must be in [0, {DEFAULT_EFFECT_LIMIT}], got {limit}"
                )));
            }
        }
        if self.ordering.trim().is_empty() {
            return Err(SurveyError::InvalidConfig(
                "ordering must be non-empty".to_string(),
            ));
        }
        if self.sampling.trim().is_empty() {
            return Err(SurveyError::InvalidConfig(
                "sampling must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Population
// =============================================================================

pub struct Population<'s> {
    survey: &'s Survey,
    ordering: Arc<dyn OrderingPolicy>,
    guru: Guru<'s>,
    config: SimulationConfig,
}

impl<'s> Population<'s> {
    /// Canonical strategies with the default config.
    pub fn new(survey: &'s Survey) -> Self {
        Self {
            survey,
            ordering: Arc::new(PriorityThenDegree),
            guru: Guru::new(survey),
            config: SimulationConfig::default(),
        }
    }

    pub fn from_config(
        survey: &'s Survey,
        config: SimulationConfig,
        registry: &StrategyRegistry,
    ) -> Result<Self, SurveyError> {
        config.validate()?;
        let ordering = registry.ordering(&config.ordering)?;
        let sampler = registry.sampler(&config.sampling)?;
        let guru = Guru::new(survey)
            .with_sampler(sampler)
            .with_effect_limit(config.effect_limit);
        Ok(Self {
            survey,
            ordering,
            guru,
            config,
        })
    }

    pub fn with_ordering(mut self, ordering: Arc<dyn OrderingPolicy>) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn SamplingPolicy>) -> Self {
        self.guru = self.guru.with_sampler(sampler);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn guru(&self) -> &Guru<'s> {
        &self.guru
    }

    /// Simulate `population` respondents. Zero yields an empty result;
    /// a negative size fails with `InvalidPopulation`.
    pub fn simulate(&self, population: i64) -> Result<Vec<Form<'s>>, SurveyError> {
        self.simulate_with_cancel(population, None)
    }

    /// Like [`Population::simulate`], checking `cancel` before each
    /// respondent. A set flag aborts the whole call with `Cancelled`.
    pub fn simulate_with_cancel(
        &self,
        population: i64,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<Form<'s>>, SurveyError> {
        let count = usize::try_from(population)
            .map_err(|_| SurveyError::InvalidPopulation { size: population })?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let order = self.survey.order_with(self.ordering.as_ref());
        let base_seed = self.config.rng_seed.unwrap_or_else(rand::random);

        let respond = |respondent: usize| -> Result<Form<'s>, SurveyError> {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(SurveyError::Cancelled { respondent });
                }
            }
            let mut rng = StdRng::seed_from_u64(respondent_seed(base_seed, respondent));
            match self.config.mode {
                AnswerMode::Guided => self.guru.answer_all(&order, &mut rng),
                AnswerMode::Uniform => self.guru.answer_uniform(&mut rng),
            }
        };

        if self.config.parallel {
            (0..count).into_par_iter().map(&respond).collect()
        } else {
            (0..count).map(&respond).collect()
        }
    }
}

/// Simulate with the canonical strategies and a fresh seed.
pub fn simulate(survey: &Survey, population: i64) -> Result<Vec<Form<'_>>, SurveyError> {
    Population::new(survey).simulate(population)
}

/// SplitMix64 over the base seed and respondent index.
fn respondent_seed(base: u64, respondent: usize) -> u64 {
    let mut z = base.wrapping_add((respondent as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// =============================================================================
// Export rows
// =============================================================================

/// Which label heads each question column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    #[default]
    Id,
    Text,
}

/// Header row plus one row of chosen option names per form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn to_export_rows(forms: &[Form<'_>]) -> Result<ExportTable, SurveyError> {
    to_export_rows_with(forms, HeaderStyle::Id)
}

/// Columns follow ascending question id. A question missing from a form
/// exports as an empty cell.
pub fn to_export_rows_with(
    forms: &[Form<'_>],
    style: HeaderStyle,
) -> Result<ExportTable, SurveyError> {
    let first = forms.first().ok_or(SurveyError::EmptyDataset)?;
    let survey = first.survey();

    let header = survey
        .questions()
        .map(|q| match style {
            HeaderStyle::Id => q.id().to_string(),
            HeaderStyle::Text => q.text().to_string(),
        })
        .collect();

    let ids: Vec<_> = survey.question_ids().collect();
    let rows = forms
        .iter()
        .map(|form| {
            ids.iter()
                .map(|&id| form.answer(id).map(|o| o.name.clone()).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(ExportTable { header, rows })
}
