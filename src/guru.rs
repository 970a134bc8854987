//! Respondent simulator.
//!
//! A [`Form`] holds one synthetic respondent's answers. The [`Guru`] walks a
//! form through the questions one at a time: it sums the influence of the
//! already-answered connected peers, narrows the 0–100 draw window by that
//! effect, and samples an option from the narrowed window.
//!
//! Each question moves from unanswered to answered exactly once per form;
//! the walk never backtracks.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::Rng;

use crate::distribution::{bias_by_index, pick_option, EqualWidth, SamplingPolicy};
use crate::error::SurveyError;
use crate::survey::{AnswerOption, Question, QuestionId, Survey, PROBABILITY_SCALE};

/// Default bound on the absolute effect, keeping at least one draw value in
/// the window.
pub const DEFAULT_EFFECT_LIMIT: i64 = 99;

const SCALE: i64 = PROBABILITY_SCALE as i64;

// =============================================================================
// Form
// =============================================================================

#[derive(Debug, Clone)]
pub struct Form<'s> {
    survey: &'s Survey,
    /// Question id -> index into that question's options.
    answers: BTreeMap<QuestionId, usize>,
}

impl<'s> Form<'s> {
    pub fn new(survey: &'s Survey) -> Self {
        Self {
            survey,
            answers: BTreeMap::new(),
        }
    }

    pub fn survey(&self) -> &'s Survey {
        self.survey
    }

    /// Record the chosen option for a question, replacing any earlier choice.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        option_index: usize,
    ) -> Result<(), SurveyError> {
        let question = self.survey.check_exists(question_id)?;
        if option_index >= question.num_options() {
            return Err(SurveyError::UnknownOption {
                question_id,
                index: option_index,
            });
        }
        self.answers.insert(question_id, option_index);
        Ok(())
    }

    pub fn answer_index(&self, question_id: QuestionId) -> Option<usize> {
        self.answers.get(&question_id).copied()
    }

    pub fn answer(&self, question_id: QuestionId) -> Option<&'s AnswerOption> {
        let index = self.answer_index(question_id)?;
        self.survey.get_question(question_id)?.option(index)
    }

    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.answers.contains_key(&question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() == self.survey.len()
    }

    /// Answers in ascending question id order.
    pub fn answers(&self) -> impl Iterator<Item = (QuestionId, &'s AnswerOption)> + '_ {
        let survey = self.survey;
        self.answers.iter().filter_map(move |(&id, &index)| {
            survey
                .get_question(id)
                .and_then(|q| q.option(index))
                .map(|option| (id, option))
        })
    }

    /// Question id -> chosen option name.
    pub fn to_record(&self) -> BTreeMap<QuestionId, String> {
        self.answers()
            .map(|(id, option)| (id, option.name.clone()))
            .collect()
    }
}

// =============================================================================
// Sampling window
// =============================================================================

/// Draw window `[min, max)` on the 0–100 scale for an accumulated effect.
///
/// A positive effect raises the floor, a negative one lowers the ceiling.
/// Effects of magnitude 100 or more leave nothing to draw from.
pub fn sampling_window(effect: i64) -> Result<(i64, i64), SurveyError> {
    let min = effect.max(0).min(SCALE);
    let max = (SCALE + effect.min(0)).max(0);
    if min >= max {
        return Err(SurveyError::EmptyWindow { effect, min, max });
    }
    Ok((min, max))
}

// =============================================================================
// Guru
// =============================================================================

pub struct Guru<'s> {
    survey: &'s Survey,
    sampler: Arc<dyn SamplingPolicy>,
    effect_limit: Option<i64>,
    biases: HashMap<QuestionId, Vec<f64>>,
    sorted: HashMap<QuestionId, Vec<usize>>,
}

impl<'s> Guru<'s> {
    pub fn new(survey: &'s Survey) -> Self {
        let biases = survey.questions().map(|q| (q.id(), bias_by_index(q))).collect();
        let sorted = survey
            .questions()
            .map(|q| (q.id(), q.sorted_option_indices()))
            .collect();
        Self {
            survey,
            sampler: Arc::new(EqualWidth),
            effect_limit: Some(DEFAULT_EFFECT_LIMIT),
            biases,
            sorted,
        }
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn SamplingPolicy>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Bound the absolute effect before the window is derived. `None` leaves
    /// the effect unclamped, so a strong effect surfaces as `EmptyWindow`.
    pub fn with_effect_limit(mut self, limit: Option<i64>) -> Self {
        self.effect_limit = limit;
        self
    }

    pub fn survey(&self) -> &'s Survey {
        self.survey
    }

    /// Sum `weight * bias * sign` over the answered peers of a question,
    /// rounded to the nearest integer with ties to even. Unanswered peers
    /// contribute nothing.
    pub fn accumulate_effect(
        &self,
        form: &Form<'_>,
        question_id: QuestionId,
    ) -> Result<i64, SurveyError> {
        let question = self.survey.check_exists(question_id)?;
        let mut total = 0.0;
        for (&peer, connection) in question.connections() {
            let Some(index) = form.answer_index(peer) else {
                continue;
            };
            let bias = self
                .biases
                .get(&peer)
                .and_then(|b| b.get(index))
                .copied()
                .unwrap_or(0.0);
            total += connection.weight * bias * connection.effect.sign();
        }
        Ok(total.round_ties_even() as i64)
    }

    fn bounded(&self, effect: i64) -> i64 {
        match self.effect_limit {
            Some(limit) => effect.max(-limit).min(limit),
            None => effect,
        }
    }

    /// Draw an option for a question given the answers already in `form`.
    /// Returns the index of the option in `Question::options()`.
    pub fn sample_answer<R: Rng>(
        &self,
        form: &Form<'_>,
        question_id: QuestionId,
        rng: &mut R,
    ) -> Result<usize, SurveyError> {
        let question = self.survey.check_exists(question_id)?;
        let effect = self.bounded(self.accumulate_effect(form, question_id)?);
        let (min, max) = sampling_window(effect)?;
        let draw = rng.gen_range(min..max);

        let sorted = self
            .sorted
            .get(&question_id)
            .ok_or(SurveyError::UnknownQuestion { id: question_id })?;
        let widths = self.sampler.widths(question, sorted);
        pick_option(sorted, &widths, draw as f64).ok_or_else(|| {
            SurveyError::malformed(format!("question {question_id} has no options"))
        })
    }

    /// Simulate one respondent over `order`.
    pub fn answer_all<R: Rng>(
        &self,
        order: &[&Question],
        rng: &mut R,
    ) -> Result<Form<'s>, SurveyError> {
        let mut form = Form::new(self.survey);
        for question in order {
            let choice = self.sample_answer(&form, question.id(), rng)?;
            form.record_answer(question.id(), choice)?;
        }
        Ok(form)
    }

    /// Simulate one respondent with uniform choices and no influence.
    pub fn answer_uniform<R: Rng>(&self, rng: &mut R) -> Result<Form<'s>, SurveyError> {
        let mut form = Form::new(self.survey);
        for question in self.survey.questions() {
            let choice = rng.gen_range(0..question.num_options());
            form.record_answer(question.id(), choice)?;
        }
        Ok(form)
    }
}
