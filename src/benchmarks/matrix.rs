//! Parameter matrix expansion
//!
//! Turns `name -> [candidate values]` into every concrete combination.
//! Keys iterate in sorted order, so the combination order is stable:
//! the last key varies fastest.

use crate::config::ParameterConfig;
use std::collections::BTreeMap;

/// One concrete parameter combination
pub type ParamSet = BTreeMap<String, String>;

/// Cartesian product of all parameters that have at least one value
///
/// Returns an empty list when no parameter has values.
pub fn expand(matrix: &BTreeMap<String, ParameterConfig>) -> Vec<ParamSet> {
    let populated: Vec<(&String, &ParameterConfig)> = matrix
        .iter()
        .filter(|(_, param)| !param.values.is_empty())
        .collect();

    if populated.is_empty() {
        return Vec::new();
    }

    let mut combinations = vec![ParamSet::new()];
    for (key, param) in populated {
        combinations = combinations
            .into_iter()
            .flat_map(|partial| {
                param.values.iter().map(move |value| {
                    let mut next = partial.clone();
                    next.insert(key.clone(), value.clone());
                    next
                })
            })
            .collect();
    }

    combinations
}

/// Per-parameter "include in output" flags
pub fn output_flags(matrix: &BTreeMap<String, ParameterConfig>) -> BTreeMap<String, bool> {
    matrix
        .iter()
        .map(|(key, param)| (key.clone(), param.output))
        .collect()
}
