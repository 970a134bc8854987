//! Named registry of ordering and sampling strategies.

use std::collections::HashMap;
use std::sync::Arc;

use crate::distribution::{AllocatedProbability, EqualWidth, SamplingPolicy};
use crate::error::SurveyError;
use crate::ordering::{DegreeOnly, OrderingPolicy, PriorityThenDegree};

pub const DEFAULT_ORDERING: &str = "priority_degree";
pub const DEFAULT_SAMPLING: &str = "equal_width";

pub struct StrategyRegistry {
    orderings: HashMap<String, Arc<dyn OrderingPolicy>>,
    samplers: HashMap<String, Arc<dyn SamplingPolicy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut orderings: HashMap<String, Arc<dyn OrderingPolicy>> = HashMap::new();
        orderings.insert(DEFAULT_ORDERING.to_string(), Arc::new(PriorityThenDegree));
        orderings.insert("degree_only".to_string(), Arc::new(DegreeOnly));

        let mut samplers: HashMap<String, Arc<dyn SamplingPolicy>> = HashMap::new();
        samplers.insert(DEFAULT_SAMPLING.to_string(), Arc::new(EqualWidth));
        samplers.insert("allocated".to_string(), Arc::new(AllocatedProbability));

        Self {
            orderings,
            samplers,
        }
    }
}

impl StrategyRegistry {
    pub fn list_orderings(&self) -> Vec<String> {
        sorted_keys(&self.orderings)
    }

    pub fn list_samplers(&self) -> Vec<String> {
        sorted_keys(&self.samplers)
    }

    pub fn ordering(&self, name: &str) -> Result<Arc<dyn OrderingPolicy>, SurveyError> {
        self.orderings
            .get(name)
            .cloned()
            .ok_or_else(|| SurveyError::UnknownStrategy {
                kind: "ordering",
                name: name.to_string(),
            })
    }

    pub fn sampler(&self, name: &str) -> Result<Arc<dyn SamplingPolicy>, SurveyError> {
        self.samplers
            .get(name)
            .cloned()
            .ok_or_else(|| SurveyError::UnknownStrategy {
                kind: "sampling",
                name: name.to_string(),
            })
    }

    pub fn insert_ordering(&mut self, name: impl Into<String>, policy: Arc<dyn OrderingPolicy>) {
        self.orderings.insert(name.into(), policy);
    }

    pub fn insert_sampler(&mut self, name: impl Into<String>, policy: Arc<dyn SamplingPolicy>) {
        self.samplers.insert(name.into(), policy);
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lists_builtin_strategies() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.list_orderings(), vec!["degree_only", "priority_degree"]);
        assert_eq!(registry.list_samplers(), vec!["allocated", "equal_width"]);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let registry = StrategyRegistry::default();
        assert!(matches!(
            registry.ordering("alphabetical"),
            Err(SurveyError::UnknownStrategy { kind: "ordering", .. })
        ));
        assert!(registry.sampler("equal_width").is_ok());
    }
}
