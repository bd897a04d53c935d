//! Per-token-type latency regression
//!
//! Fits `response_time_ms ≈ a·prompt + b·cached_prompt + c·completion` by
//! ordinary least squares over the normal equations `(XᵗX)β = Xᵗy`, solved
//! with Gauss-Jordan elimination and partial pivoting.

use crate::observation::Observation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Minimum number of observations for any fit attempt
pub const MIN_FIT_SAMPLES: usize = 2;

/// Threshold below which a matrix column or pivot is treated as zero
pub const SINGULARITY_EPSILON: f64 = 1e-10;

/// Fallback ms per prompt token for degenerate data
pub const FALLBACK_PROMPT_RATE: f64 = 3.0;
/// Fallback ms per cached prompt token for degenerate data
pub const FALLBACK_CACHED_PROMPT_RATE: f64 = 0.01;
/// Fallback ms per completion token for degenerate data
pub const FALLBACK_COMPLETION_RATE: f64 = 25.0;
/// R² reported with fallback coefficients
pub const FALLBACK_R_SQUARED: f64 = 0.5;

/// Floor for the prompt rate (ms/token)
pub const MIN_PROMPT_RATE: f64 = 0.01;
/// Floor for the cached prompt rate (ms/token)
pub const MIN_CACHED_PROMPT_RATE: f64 = 0.001;
/// Floor for the completion rate (ms/token)
pub const MIN_COMPLETION_RATE: f64 = 0.1;

/// Fitted latency model; rates are in milliseconds per token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelFit {
    pub prompt_rate: f64,
    pub cached_prompt_rate: f64,
    pub completion_rate: f64,
    pub r_squared: f64,
    /// Set when the design matrix was singular and fallback rates were used
    #[serde(default)]
    pub fallback: bool,
}

impl ModelFit {
    /// Degenerate "no fit" value returned for insufficient data
    pub fn empty() -> Self {
        Self {
            prompt_rate: 0.0,
            cached_prompt_rate: 0.0,
            completion_rate: 0.0,
            r_squared: 0.0,
            fallback: false,
        }
    }

    /// Fixed coefficients used when the data cannot identify the model
    pub fn fallback() -> Self {
        Self {
            prompt_rate: FALLBACK_PROMPT_RATE,
            cached_prompt_rate: FALLBACK_CACHED_PROMPT_RATE,
            completion_rate: FALLBACK_COMPLETION_RATE,
            r_squared: FALLBACK_R_SQUARED,
            fallback: true,
        }
    }

    /// True for the zero-valued "no fit" result
    pub fn is_empty(&self) -> bool {
        self.prompt_rate == 0.0 && self.cached_prompt_rate == 0.0 && self.completion_rate == 0.0
    }

    /// Predicted response time in milliseconds
    pub fn predict_ms(&self, observation: &Observation) -> f64 {
        self.prompt_rate * observation.prompt_tokens as f64
            + self.cached_prompt_rate * observation.cached_prompt_tokens as f64
            + self.completion_rate * observation.completion_tokens as f64
    }

    /// Prompt processing throughput, if a rate is known
    pub fn prompt_tokens_per_sec(&self) -> Option<f64> {
        tokens_per_sec(self.prompt_rate)
    }

    /// Cached prompt throughput, if a rate is known
    pub fn cached_prompt_tokens_per_sec(&self) -> Option<f64> {
        tokens_per_sec(self.cached_prompt_rate)
    }

    /// Generation throughput, if a rate is known
    pub fn completion_tokens_per_sec(&self) -> Option<f64> {
        tokens_per_sec(self.completion_rate)
    }
}

/// Convert a ms/token rate into tokens/sec
pub fn tokens_per_sec(rate_ms_per_token: f64) -> Option<f64> {
    (rate_ms_per_token > 0.0).then(|| 1000.0 / rate_ms_per_token)
}

/// Fit the latency model to a set of observations
///
/// Fewer than [`MIN_FIT_SAMPLES`] observations yield [`ModelFit::empty`];
/// a singular design yields [`ModelFit::fallback`].
pub fn fit(observations: &[Observation]) -> ModelFit {
    if observations.len() < MIN_FIT_SAMPLES {
        warn!(count = observations.len(), "Not enough results for model fitting");
        return ModelFit::empty();
    }

    let mut xtx = [[0.0_f64; 3]; 3];
    let mut xty = [0.0_f64; 3];
    let mut mean_y = 0.0;

    for (index, obs) in observations.iter().enumerate() {
        debug!(
            index,
            prompt_tokens = obs.prompt_tokens,
            cached_prompt_tokens = obs.cached_prompt_tokens,
            completion_tokens = obs.completion_tokens,
            response_time_ms = obs.response_time_ms(),
            "Data point"
        );

        let x = features(obs);
        let y = obs.response_time_ms();
        for i in 0..3 {
            for j in 0..3 {
                xtx[i][j] += x[i] * x[j];
            }
            xty[i] += x[i] * y;
        }
        mean_y += y;
    }
    mean_y /= observations.len() as f64;

    info!(valid_results = observations.len(), "Starting linear regression");

    let Some([a, b, c]) = solve_normal_equations(xtx, xty) else {
        warn!("Matrix is singular, using fallback values");
        return ModelFit::fallback();
    };

    let mut model = ModelFit {
        prompt_rate: a.max(MIN_PROMPT_RATE),
        cached_prompt_rate: b.max(MIN_CACHED_PROMPT_RATE),
        completion_rate: c.max(MIN_COMPLETION_RATE),
        r_squared: 0.0,
        fallback: false,
    };
    model.r_squared = r_squared(observations, &model, mean_y);

    info!(
        prompt_rate_ms_per_token = model.prompt_rate,
        cached_prompt_rate_ms_per_token = model.cached_prompt_rate,
        completion_rate_ms_per_token = model.completion_rate,
        r_squared = model.r_squared,
        "Linear regression results"
    );

    model
}

fn features(obs: &Observation) -> [f64; 3] {
    [
        obs.prompt_tokens as f64,
        obs.cached_prompt_tokens as f64,
        obs.completion_tokens as f64,
    ]
}

/// Solve the 3×3 system, returning `None` when it is singular or nearly so
fn solve_normal_equations(xtx: [[f64; 3]; 3], xty: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        if (0..3).all(|row| xtx[row][col].abs() <= SINGULARITY_EPSILON) {
            debug!(column = col, "Zero column in normal matrix");
            return None;
        }
    }

    let mut aug = [[0.0_f64; 4]; 3];
    for i in 0..3 {
        aug[i][..3].copy_from_slice(&xtx[i]);
        aug[i][3] = xty[i];
    }

    for i in 0..3 {
        let mut max_row = i;
        for j in (i + 1)..3 {
            if aug[j][i].abs() > aug[max_row][i].abs() {
                max_row = j;
            }
        }
        aug.swap(i, max_row);

        let pivot = aug[i][i];
        if pivot.abs() < SINGULARITY_EPSILON {
            debug!(column = i, pivot, "Near-zero pivot");
            return None;
        }

        for k in i..4 {
            aug[i][k] /= pivot;
        }

        for j in 0..3 {
            if j != i {
                let factor = aug[j][i];
                for k in i..4 {
                    aug[j][k] -= factor * aug[i][k];
                }
            }
        }
    }

    Some([aug[0][3], aug[1][3], aug[2][3]])
}

/// Coefficient of determination against the mean response time
///
/// Zero total variance gives 0. Values below zero (possible once the rates
/// are floored, since the model has no intercept) are reported as 0.
fn r_squared(observations: &[Observation], model: &ModelFit, mean_y: f64) -> f64 {
    let mut total = 0.0;
    let mut residual = 0.0;

    for (index, obs) in observations.iter().enumerate() {
        let actual = obs.response_time_ms();
        let predicted = model.predict_ms(obs);
        total += (actual - mean_y).powi(2);
        residual += (actual - predicted).powi(2);

        debug!(
            index,
            actual_ms = actual,
            predicted_ms = predicted,
            error_ms = actual - predicted,
            "Prediction"
        );
    }

    if total <= 0.0 {
        return 0.0;
    }

    let r_squared = 1.0 - residual / total;
    if r_squared.is_finite() {
        r_squared.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn obs(p: u32, c: u32, g: u32, ms: f64) -> Observation {
        Observation::new(p, c, g, Duration::from_nanos((ms * 1_000_000.0).round() as u64))
    }

    fn synthetic(p: u32, c: u32, g: u32) -> Observation {
        obs(p, c, g, 2.0 * p as f64 + 0.5 * c as f64 + 30.0 * g as f64)
    }

    #[test]
    fn test_recovers_exact_coefficients() {
        let data: Vec<Observation> = [
            (100, 0, 1),
            (100, 0, 100),
            (500, 0, 1),
            (500, 0, 100),
            (0, 100, 1),
            (0, 100, 100),
            (0, 500, 1),
            (0, 500, 100),
            (37, 0, 13),
            (0, 37, 13),
        ]
        .into_iter()
        .map(|(p, c, g)| synthetic(p, c, g))
        .collect();

        let model = fit(&data);

        assert!(!model.fallback);
        assert!((model.prompt_rate - 2.0).abs() < 1e-6);
        assert!((model.cached_prompt_rate - 0.5).abs() < 1e-6);
        assert!((model.completion_rate - 30.0).abs() < 1e-6);
        assert!((model.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_data_is_empty() {
        assert!(fit(&[]).is_empty());
        let model = fit(&[synthetic(100, 0, 1)]);
        assert!(model.is_empty());
        assert_eq!(model.r_squared, 0.0);
    }

    #[test]
    fn test_identical_observations_use_fallback() {
        let data = vec![obs(100, 0, 10, 500.0); 6];
        let model = fit(&data);

        assert_eq!(model, ModelFit::fallback());
        assert_eq!(model.prompt_rate, FALLBACK_PROMPT_RATE);
        assert_eq!(model.cached_prompt_rate, FALLBACK_CACHED_PROMPT_RATE);
        assert_eq!(model.completion_rate, FALLBACK_COMPLETION_RATE);
        assert_eq!(model.r_squared, 0.5);
        assert!(model.fallback);
    }

    #[test]
    fn test_collinear_columns_hit_pivot_check() {
        // Prompt and cached columns are identical: no zero column, zero pivot
        let data: Vec<Observation> = [(100, 100, 1), (200, 200, 5), (300, 300, 2), (50, 50, 9)]
            .into_iter()
            .map(|(p, c, g)| obs(p, c, g, 10.0 * p as f64 + g as f64))
            .collect();

        assert_eq!(fit(&data), ModelFit::fallback());
    }

    #[test]
    fn test_negative_coefficients_are_floored() {
        // Response time falls as prompt grows
        let data = vec![
            obs(100, 0, 10, 900.0),
            obs(200, 0, 10, 800.0),
            obs(300, 0, 20, 700.0),
            obs(400, 0, 20, 600.0),
            obs(0, 100, 10, 50.0),
        ];

        let model = fit(&data);
        assert_eq!(model.prompt_rate, MIN_PROMPT_RATE);
        assert!(model.cached_prompt_rate >= MIN_CACHED_PROMPT_RATE);
        assert!(model.completion_rate >= MIN_COMPLETION_RATE);
        assert!((0.0..=1.0).contains(&model.r_squared));
    }

    #[test]
    fn test_constant_response_time_has_zero_r_squared() {
        let data = vec![
            obs(100, 0, 1, 400.0),
            obs(0, 100, 1, 400.0),
            obs(200, 0, 5, 400.0),
            obs(0, 200, 5, 400.0),
        ];
        assert_eq!(fit(&data).r_squared, 0.0);
    }

    #[test]
    fn test_tokens_per_sec_conversion() {
        assert_eq!(tokens_per_sec(4.0), Some(250.0));
        assert_eq!(tokens_per_sec(0.0), None);

        let model = ModelFit::fallback();
        assert_eq!(model.completion_tokens_per_sec(), Some(40.0));
        assert_eq!(ModelFit::empty().prompt_tokens_per_sec(), None);
    }

    proptest! {
        #[test]
        fn prop_rates_respect_floors(
            points in prop::collection::vec(
                (0u32..20_000, 0u32..20_000, 0u32..500, 0.0f64..600_000.0),
                4..24,
            )
        ) {
            let data: Vec<Observation> = points
                .into_iter()
                .map(|(p, c, g, ms)| obs(p, c, g, ms))
                .collect();

            let model = fit(&data);
            prop_assert!(model.prompt_rate >= MIN_PROMPT_RATE);
            prop_assert!(model.cached_prompt_rate >= MIN_CACHED_PROMPT_RATE);
            prop_assert!(model.completion_rate >= MIN_COMPLETION_RATE);
            prop_assert!((0.0..=1.0).contains(&model.r_squared));
        }
    }
}
