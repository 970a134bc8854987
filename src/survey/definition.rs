//! Structured survey definition, as produced by the definition loader.
//!
//! The shape is:
//!
//! ```text
//! title, description,
//! questions:   [{id, question, options: [{name, value, probability?}], priority?}]
//! connections: [{affector, affected, weight, effect}]
//! ```
//!
//! Every top-level key is optional; the fields inside questions, options and
//! connections are required unless marked `?`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AnswerOption, EffectType, OptionValue, Question, QuestionId, QuestionPriority, Survey};
use crate::error::SurveyError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyDefinition {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<QuestionDefinition>,
    #[serde(default)]
    pub connections: Vec<ConnectionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: QuestionId,
    pub question: String,
    pub options: Vec<OptionDefinition>,
    #[serde(default)]
    pub priority: QuestionPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    pub value: OptionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDefinition {
    pub affector: QuestionId,
    pub affected: QuestionId,
    pub weight: f64,
    pub effect: EffectType,
}

impl Survey {
    /// Build a survey from a loaded definition tree.
    ///
    /// Missing or mistyped required fields fail with `MalformedDefinition`.
    /// Questions are inserted before any connection is resolved, so
    /// connections may reference questions declared later in the input.
    pub fn from_definition(definition: &Value) -> Result<Self, SurveyError> {
        let parsed = SurveyDefinition::deserialize(definition)
            .map_err(|e| SurveyError::malformed(e.to_string()))?;
        Self::try_from(parsed)
    }

    /// Inverse of [`Survey::from_definition`]. Connections are emitted once
    /// per pair, lower id first.
    pub fn to_definition(&self) -> SurveyDefinition {
        let questions = self
            .questions()
            .map(|q| QuestionDefinition {
                id: q.id(),
                question: q.text().to_string(),
                options: q
                    .options()
                    .iter()
                    .map(|o| OptionDefinition {
                        name: o.name.clone(),
                        value: o.value.clone(),
                        probability: o.probability,
                    })
                    .collect(),
                priority: q.priority(),
            })
            .collect();

        let connections = self
            .questions()
            .flat_map(|q| {
                q.connections()
                    .iter()
                    .filter(move |&(&peer, _)| q.id() <= peer)
                    .map(move |(&peer, con)| ConnectionDefinition {
                        affector: q.id(),
                        affected: peer,
                        weight: con.weight,
                        effect: con.effect,
                    })
            })
            .collect();

        SurveyDefinition {
            title: self.title.clone(),
            description: self.description.clone(),
            questions,
            connections,
        }
    }
}

impl TryFrom<SurveyDefinition> for Survey {
    type Error = SurveyError;

    fn try_from(def: SurveyDefinition) -> Result<Self, Self::Error> {
        let mut survey = Survey::new(def.title, def.description);

        for q in def.questions {
            let options = q
                .options
                .into_iter()
                .map(|o| AnswerOption {
                    name: o.name,
                    value: o.value,
                    probability: o.probability,
                })
                .collect();
            survey.add_question(Question::new(q.id, q.question, options, q.priority)?)?;
        }

        for con in def.connections {
            survey.add_connection(con.affector, con.affected, con.weight, con.effect)?;
        }

        Ok(survey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_definition_builds_minimal_survey() {
        let def = json!({
            "title": "T",
            "questions": [
                {"id": 1, "question": "Q1", "options": [
                    {"name": "A", "value": 1},
                    {"name": "B", "value": 2}
                ]}
            ],
            "connections": []
        });
        let survey = Survey::from_definition(&def).unwrap();

        assert_eq!(survey.title, "T");
        assert_eq!(survey.description, "");
        assert_eq!(survey.len(), 1);
        let q = survey.get_question(1).unwrap();
        assert_eq!(q.num_options(), 2);
        assert_eq!(q.priority(), QuestionPriority::Normal);
        assert_eq!(survey.connection_count(), 0);

        let order: Vec<QuestionId> = survey.order_for_simulation().iter().map(|q| q.id()).collect();
        assert_eq!(order, vec![1]);
    }

    #[test]
    fn from_definition_rejects_missing_required_fields() {
        let missing_options = json!({"questions": [{"id": 1, "question": "Q1"}]});
        assert!(matches!(
            Survey::from_definition(&missing_options),
            Err(SurveyError::MalformedDefinition { .. })
        ));

        let missing_weight = json!({
            "questions": [
                {"id": 1, "question": "Q1", "options": [{"name": "A", "value": 1}]},
                {"id": 2, "question": "Q2", "options": [{"name": "A", "value": 1}]}
            ],
            "connections": [{"affector": 1, "affected": 2, "effect": 1}]
        });
        assert!(matches!(
            Survey::from_definition(&missing_weight),
            Err(SurveyError::MalformedDefinition { .. })
        ));

        let not_a_map = json!("just a title");
        assert!(matches!(
            Survey::from_definition(&not_a_map),
            Err(SurveyError::MalformedDefinition { .. })
        ));
    }

    #[test]
    fn from_definition_surfaces_graph_errors() {
        let dup = json!({
            "questions": [
                {"id": 1, "question": "a", "options": [{"name": "A", "value": 1}]},
                {"id": 1, "question": "b", "options": [{"name": "A", "value": 1}]}
            ]
        });
        assert_eq!(
            Survey::from_definition(&dup).unwrap_err(),
            SurveyError::DuplicateId { id: 1 }
        );

        let dangling = json!({
            "questions": [{"id": 1, "question": "a", "options": [{"name": "A", "value": 1}]}],
            "connections": [{"affector": 1, "affected": 2, "weight": 1.0, "effect": "direct"}]
        });
        assert_eq!(
            Survey::from_definition(&dangling).unwrap_err(),
            SurveyError::UnknownQuestion { id: 2 }
        );
    }

    #[test]
    fn to_definition_round_trips_through_from_definition() {
        let def = json!({
            "title": "Habits",
            "description": "d",
            "questions": [
                {"id": 2, "question": "Q2", "priority": "high", "options": [
                    {"name": "no", "value": 0},
                    {"name": "yes", "value": 1, "probability": 40}
                ]},
                {"id": 1, "question": "Q1", "options": [{"name": "x", "value": "x"}]}
            ],
            "connections": [{"affector": 2, "affected": 1, "weight": 0.5, "effect": 2}]
        });
        let survey = Survey::from_definition(&def).unwrap();
        let emitted = serde_json::to_value(survey.to_definition()).unwrap();
        let rebuilt = Survey::from_definition(&emitted).unwrap();

        assert_eq!(rebuilt.title, "Habits");
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.connection_count(), 1);
        let q2 = rebuilt.get_question(2).unwrap();
        assert_eq!(q2.priority(), QuestionPriority::High);
        assert_eq!(q2.options()[1].probability, Some(40.0));
        assert_eq!(q2.connections()[&1].effect, EffectType::Inverse);
    }
}
