use serde_json::json;

use survey_guru::ordering::DegreeOnly;
use survey_guru::{EffectType, OptionValue, QuestionPriority, StrategyRegistry, Survey, SurveyError};

fn commute_survey() -> Survey {
    Survey::from_definition(&json!({
        "title": "Commute",
        "description": "How people get to work",
        "questions": [
            {"id": 4, "question": "Do you own a car?", "priority": 0, "options": [
                {"name": "no", "value": 0}, {"name": "yes", "value": 1}
            ]},
            {"id": 1, "question": "Distance to work?", "priority": "high", "options": [
                {"name": "under 5km", "value": 1},
                {"name": "5-20km", "value": 2},
                {"name": "over 20km", "value": 3}
            ]},
            {"id": 2, "question": "Commute mode?", "options": [
                {"name": "walk", "value": "a"},
                {"name": "bike", "value": "b"},
                {"name": "drive", "value": "c"}
            ]},
            {"id": 3, "question": "Commute satisfaction?", "options": [
                {"name": "low", "value": 1}, {"name": "high", "value": 5}
            ]}
        ],
        "connections": [
            {"affector": 1, "affected": 2, "weight": 0.6, "effect": "direct"},
            {"affector": 1, "affected": 3, "weight": 0.3, "effect": "inverse"},
            {"affector": 4, "affected": 2, "weight": 0.5, "effect": 1},
            {"affector": 2, "affected": 3, "weight": 0.1, "effect": "none"}
        ]
    }))
    .unwrap()
}

#[test]
fn minimal_definition_round_trip() {
    let survey = Survey::from_definition(&json!({
        "title": "T",
        "questions": [{"id": 1, "question": "Q1", "options": [
            {"name": "A", "value": 1}, {"name": "B", "value": 2}
        ]}],
        "connections": []
    }))
    .unwrap();

    assert_eq!(survey.title, "T");
    assert_eq!(survey.len(), 1);
    assert_eq!(survey.get_question(1).unwrap().num_options(), 2);
    assert_eq!(survey.connection_count(), 0);
    let order: Vec<_> = survey.order_for_simulation().iter().map(|q| q.id()).collect();
    assert_eq!(order, vec![1]);
}

#[test]
fn connections_are_symmetric() {
    let survey = commute_survey();
    assert_eq!(survey.connection_count(), 4);

    let q2 = survey.get_question(2).unwrap();
    let q4 = survey.get_question(4).unwrap();
    assert_eq!(q2.connections()[&4], q4.connections()[&2]);
    assert_eq!(q2.connections()[&4].effect, EffectType::Direct);
    assert_eq!(q2.degree(), 3);
}

#[test]
fn canonical_order_puts_priority_then_degree_first() {
    let survey = commute_survey();
    let order: Vec<_> = survey.order_for_simulation().iter().map(|q| q.id()).collect();
    // 1 is high priority; 2 and 3 are normal with degree 3 and 2; 4 is low.
    assert_eq!(order, vec![1, 2, 3, 4]);

    let by_degree: Vec<_> = survey.order_with(&DegreeOnly).iter().map(|q| q.id()).collect();
    assert_eq!(by_degree, vec![2, 1, 3, 4]);

    let registry = StrategyRegistry::default();
    let policy = registry.ordering("degree_only").unwrap();
    let via_registry: Vec<_> = survey
        .order_with(policy.as_ref())
        .iter()
        .map(|q| q.id())
        .collect();
    assert_eq!(via_registry, by_degree);
}

#[test]
fn definition_fields_survive_to_definition() {
    let survey = commute_survey();
    let definition = survey.to_definition();

    assert_eq!(definition.description, "How people get to work");
    assert_eq!(definition.questions.len(), 4);
    assert_eq!(definition.connections.len(), 4);
    assert!(definition
        .connections
        .iter()
        .all(|c| c.affector < c.affected));

    let rebuilt =
        Survey::from_definition(&serde_json::to_value(&definition).unwrap()).unwrap();
    let q1 = rebuilt.get_question(1).unwrap();
    assert_eq!(q1.priority(), QuestionPriority::High);
    assert_eq!(
        rebuilt.get_question(2).unwrap().options()[0].value,
        OptionValue::Text("a".to_string())
    );
    assert_eq!(
        rebuilt.get_question(3).unwrap().connections()[&1].effect,
        EffectType::Inverse
    );
}

#[test]
fn dangling_connection_is_rejected() {
    let err = Survey::from_definition(&json!({
        "questions": [{"id": 1, "question": "Q1", "options": [{"name": "A", "value": 1}]}],
        "connections": [{"affector": 1, "affected": 9, "weight": 0.5, "effect": "direct"}]
    }))
    .unwrap_err();
    assert_eq!(err, SurveyError::UnknownQuestion { id: 9 });
}

#[test]
fn duplicate_question_is_rejected() {
    let err = Survey::from_definition(&json!({
        "questions": [
            {"id": 1, "question": "Q1", "options": [{"name": "A", "value": 1}]},
            {"id": 1, "question": "again", "options": [{"name": "B", "value": 2}]}
        ]
    }))
    .unwrap_err();
    assert_eq!(err, SurveyError::DuplicateId { id: 1 });
}
