//! Question ordering policies for the simulation walk.
//!
//! Questions that propagate more influence are resolved first so that the
//! questions they affect see as much decided context as possible.

use std::cmp::Ordering;
use std::fmt;

use crate::survey::Question;

/// Policy that decides in which order questions are simulated.
///
/// `compare` must be a total order; ties are expected to fall back to
/// ascending question id so the ordering is deterministic.
pub trait OrderingPolicy: Send + Sync {
    fn compare(&self, a: &Question, b: &Question) -> Ordering;

    fn describe(&self) -> Option<String> {
        None
    }
}

/// Priority descending, then connection count descending, then id ascending.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityThenDegree;

impl OrderingPolicy for PriorityThenDegree {
    fn compare(&self, a: &Question, b: &Question) -> Ordering {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| b.degree().cmp(&a.degree()))
            .then_with(|| a.id().cmp(&b.id()))
    }

    fn describe(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl fmt::Display for PriorityThenDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PriorityThenDegree(priority desc, degree desc, id asc)")
    }
}

/// Connection count descending, then id ascending. Ignores priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeOnly;

impl OrderingPolicy for DegreeOnly {
    fn compare(&self, a: &Question, b: &Question) -> Ordering {
        b.degree()
            .cmp(&a.degree())
            .then_with(|| a.id().cmp(&b.id()))
    }

    fn describe(&self) -> Option<String> {
        Some("DegreeOnly(degree desc, id asc)".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{AnswerOption, EffectType, QuestionId, QuestionPriority, Survey};

    fn survey() -> Survey {
        let mut survey = Survey::new("ordering", "");
        for (id, priority) in [
            (1, QuestionPriority::Low),
            (2, QuestionPriority::High),
            (3, QuestionPriority::Low),
        ] {
            survey
                .add_question(
                    Question::new(id, "q", vec![AnswerOption::new("a", 1)], priority).unwrap(),
                )
                .unwrap();
        }
        survey.add_connection(1, 3, 1.0, EffectType::Direct).unwrap();
        survey.add_connection(1, 2, 1.0, EffectType::Direct).unwrap();
        survey
    }

    fn ids(questions: Vec<&Question>) -> Vec<QuestionId> {
        questions.iter().map(|q| q.id()).collect()
    }

    #[test]
    fn priority_dominates_degree() {
        let s = survey();
        assert_eq!(ids(s.order_with(&PriorityThenDegree)), vec![2, 1, 3]);
    }

    #[test]
    fn degree_only_ignores_priority() {
        let s = survey();
        assert_eq!(ids(s.order_with(&DegreeOnly)), vec![1, 2, 3]);
    }

    #[test]
    fn ordering_is_stable_across_calls() {
        let s = survey();
        assert_eq!(ids(s.order_for_simulation()), ids(s.order_for_simulation()));
    }
}
