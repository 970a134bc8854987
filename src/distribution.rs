//! Distribution builder: option bias and sampling widths.
//!
//! Bias places each option on a signed low→high spectrum in [-100, 100]
//! by its rank among the question's option values. Sampling widths split the
//! 0–100 draw scale across the same rank-sorted options.

use crate::survey::{Question, PROBABILITY_SCALE};

const BIAS_SPAN: f64 = 100.0;

/// Bias of one option, addressed by its index in `Question::options()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionBias {
    pub index: usize,
    pub bias: f64,
}

/// Bias of every option of `question`, ascending by option value.
///
/// The lower half runs from -100 upward, the upper half up to +100, and the
/// middle option of an odd-sized set sits at exactly 0.
pub fn bias_distribution(question: &Question) -> Vec<OptionBias> {
    let sorted = question.sorted_option_indices();
    let n = sorted.len();
    let half = n / 2;
    let right_start = n - half;

    let mut out = Vec::with_capacity(n);
    for (i, &index) in sorted[..half].iter().enumerate() {
        let bias = -BIAS_SPAN + BIAS_SPAN * i as f64 / half as f64;
        out.push(OptionBias { index, bias });
    }
    if n % 2 == 1 {
        out.push(OptionBias {
            index: sorted[half],
            bias: 0.0,
        });
    }
    for (i, &index) in sorted[right_start..].iter().enumerate() {
        let bias = BIAS_SPAN - BIAS_SPAN * (half - i - 1) as f64 / half as f64;
        out.push(OptionBias { index, bias });
    }
    out
}

/// Bias per option index, in definition order.
pub fn bias_by_index(question: &Question) -> Vec<f64> {
    let mut biases = vec![0.0; question.num_options()];
    for entry in bias_distribution(question) {
        biases[entry.index] = entry.bias;
    }
    biases
}

// =============================================================================
// Sampling policies
// =============================================================================

/// Policy that allots each option a width on the 0–100 draw scale.
pub trait SamplingPolicy: Send + Sync {
    /// Widths for `sorted` (option indices ascending by value), in the same
    /// order. Widths sum to 100.
    fn widths(&self, question: &Question, sorted: &[usize]) -> Vec<f64>;

    fn describe(&self) -> Option<String> {
        None
    }
}

/// Every option gets `100 / n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWidth;

impl SamplingPolicy for EqualWidth {
    fn widths(&self, _question: &Question, sorted: &[usize]) -> Vec<f64> {
        equal_widths(sorted.len())
    }

    fn describe(&self) -> Option<String> {
        Some("EqualWidth".to_string())
    }
}

/// Options with an explicit probability get it; the unallocated remainder
/// is split evenly across the rest. Widths are rescaled to sum to 100, and
/// a question with no mass at all falls back to equal widths.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocatedProbability;

impl SamplingPolicy for AllocatedProbability {
    fn widths(&self, question: &Question, sorted: &[usize]) -> Vec<f64> {
        let unprioritized = question.unprioritized_count();
        let share = if unprioritized > 0 {
            question.probability_left() / unprioritized as f64
        } else {
            0.0
        };
        let raw: Vec<f64> = sorted
            .iter()
            .map(|&i| {
                question
                    .option(i)
                    .and_then(|o| o.probability)
                    .unwrap_or(share)
            })
            .collect();

        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return equal_widths(sorted.len());
        }
        raw.into_iter()
            .map(|w| w * PROBABILITY_SCALE / total)
            .collect()
    }

    fn describe(&self) -> Option<String> {
        Some("AllocatedProbability".to_string())
    }
}

fn equal_widths(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![PROBABILITY_SCALE / n as f64; n]
}

/// Walk cumulative widths and return the entry of `sorted` whose range
/// `[start, end)` contains `draw`. Draws past the last boundary (float
/// rounding) resolve to the last option.
pub fn pick_option(sorted: &[usize], widths: &[f64], draw: f64) -> Option<usize> {
    let mut start = 0.0;
    for (&index, &width) in sorted.iter().zip(widths) {
        let end = start + width;
        if start <= draw && draw < end {
            return Some(index);
        }
        start = end;
    }
    sorted.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{AnswerOption, QuestionPriority};

    fn question(values: &[i32]) -> Question {
        let options = values
            .iter()
            .map(|&v| AnswerOption::new(format!("o{v}"), v))
            .collect();
        Question::new(1, "q", options, QuestionPriority::Normal).unwrap()
    }

    fn biases(values: &[i32]) -> Vec<f64> {
        bias_distribution(&question(values))
            .into_iter()
            .map(|b| b.bias)
            .collect()
    }

    #[test]
    fn single_option_sits_at_zero() {
        assert_eq!(biases(&[7]), vec![0.0]);
    }

    #[test]
    fn even_and_odd_sets() {
        assert_eq!(biases(&[1, 2]), vec![-100.0, 100.0]);
        assert_eq!(biases(&[1, 2, 3]), vec![-100.0, 0.0, 100.0]);
        assert_eq!(biases(&[1, 2, 3, 4]), vec![-100.0, -50.0, 50.0, 100.0]);
        assert_eq!(
            biases(&[1, 2, 3, 4, 5]),
            vec![-100.0, -50.0, 0.0, 50.0, 100.0]
        );
    }

    #[test]
    fn bias_depends_on_rank_not_magnitude() {
        let q = question(&[1000, -3, 42]);
        let by_index = bias_by_index(&q);
        assert_eq!(by_index, vec![100.0, -100.0, 0.0]);
    }

    #[test]
    fn allocated_widths_split_remainder() {
        let q = Question::new(
            1,
            "q",
            vec![
                AnswerOption::new("a", 1),
                AnswerOption::new("b", 2).with_probability(50.0),
                AnswerOption::new("c", 3),
            ],
            QuestionPriority::Normal,
        )
        .unwrap();
        let sorted = q.sorted_option_indices();
        assert_eq!(AllocatedProbability.widths(&q, &sorted), vec![25.0, 50.0, 25.0]);
        assert_eq!(pick_option(&sorted, &[25.0, 50.0, 25.0], 30.0), Some(1));
    }

    #[test]
    fn allocated_widths_rescale_partial_allocation() {
        let q = Question::new(
            1,
            "q",
            vec![
                AnswerOption::new("a", 1).with_probability(10.0),
                AnswerOption::new("b", 2).with_probability(30.0),
            ],
            QuestionPriority::Normal,
        )
        .unwrap();
        let sorted = q.sorted_option_indices();
        assert_eq!(AllocatedProbability.widths(&q, &sorted), vec![25.0, 75.0]);
    }

    #[test]
    fn pick_option_covers_boundaries() {
        let sorted = vec![2, 0, 1];
        let widths = equal_widths(3);
        assert_eq!(pick_option(&sorted, &widths, 0.0), Some(2));
        assert_eq!(pick_option(&sorted, &widths, 33.0), Some(2));
        assert_eq!(pick_option(&sorted, &widths, 34.0), Some(0));
        assert_eq!(pick_option(&sorted, &widths, 99.0), Some(1));
        assert_eq!(pick_option(&[], &[], 5.0), None);
    }
}
