//! Result bundle for one parameter combination

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::matrix::ParamSet;
use crate::analysis::ModelFit;
use crate::observation::Observation;
use crate::sampling::ContextClass;

/// An observation tagged with the context class that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContextObservation {
    pub context: ContextClass,
    #[serde(flatten)]
    pub observation: Observation,
}

impl ContextObservation {
    pub fn new(context: ContextClass, observation: Observation) -> Self {
        Self {
            context,
            observation,
        }
    }
}

/// Everything measured for one parameter combination
#[derive(Debug, Clone, Serialize)]
pub struct MatrixResult {
    /// Identifier shared by every combination of one benchmark invocation
    pub run_id: Uuid,

    /// UTC time the combination finished
    pub timestamp: DateTime<Utc>,

    pub params: ParamSet,

    /// Whether each parameter is shown in rendered output
    pub output_flags: BTreeMap<String, bool>,

    pub observations: Vec<ContextObservation>,

    pub short_fit: Option<ModelFit>,
    pub long_fit: Option<ModelFit>,

    /// Composite throughput score
    pub score: Option<f64>,

    /// Failure that ended this combination, if any
    pub error: Option<String>,
}

impl MatrixResult {
    /// Create an empty result for a parameter combination
    pub fn new(run_id: Uuid, params: ParamSet, output_flags: BTreeMap<String, bool>) -> Self {
        Self {
            run_id,
            timestamp: Utc::now(),
            params,
            output_flags,
            observations: Vec::new(),
            short_fit: None,
            long_fit: None,
            score: None,
            error: None,
        }
    }

    /// Record a failure for this combination
    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Parameters flagged for output, in key order
    pub fn visible_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|(key, _)| self.output_flags.get(*key).copied().unwrap_or(false))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Fit for a context class
    pub fn fit(&self, context: ContextClass) -> Option<&ModelFit> {
        match context {
            ContextClass::Short => self.short_fit.as_ref(),
            ContextClass::Long => self.long_fit.as_ref(),
        }
    }

    /// Check if the combination completed without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
