//! Shrinking heuristic implementation
//!
//! Implements the shrinking strategy from Section 4 of the SVMlight paper
//! "Making Large-Scale SVM Learning Practical" by Thorsten Joachims.
//!
//! Variables that stay at a bound (0 or C) while comfortably satisfying their
//! KKT condition for `h` consecutive passes are removed from the active set.
//! The solver reactivates everything before it declares convergence, so a
//! wrong guess only costs time.

use crate::core::Sample;
use std::collections::VecDeque;

/// Tolerance used when deciding whether a multiplier sits on a bound
const BOUND_TOLERANCE: f64 = 1e-8;

/// Shrinking strategy for SVM optimization
#[derive(Debug)]
pub struct ShrinkingStrategy {
    /// Per-variable history of "pinned at alpha = 0" observations
    lower_bound_history: Vec<VecDeque<bool>>,
    /// Per-variable history of "pinned at alpha = C" observations
    upper_bound_history: Vec<VecDeque<bool>>,
    /// Maximum history size (h in the paper)
    history_size: usize,
    /// Number of updates since the last reset
    current_iteration: usize,
}

impl ShrinkingStrategy {
    /// Create a new shrinking strategy
    ///
    /// # Arguments
    /// * `n_samples` - Number of training samples
    /// * `history_size` - Number of passes to track (h in the paper)
    pub fn new(n_samples: usize, history_size: usize) -> Self {
        let history_size = history_size.max(1);
        Self {
            lower_bound_history: vec![VecDeque::with_capacity(history_size); n_samples],
            upper_bound_history: vec![VecDeque::with_capacity(history_size); n_samples],
            history_size,
            current_iteration: 0,
        }
    }

    /// Record the bound multipliers of every variable after one pass
    ///
    /// With `f(x_i) = E_i + y_i` (the error cache carries the bias):
    /// - `λ_lo = y_i f(x_i) - 1`, positive when alpha_i = 0 is strictly optimal
    /// - `λ_up = 1 - y_i f(x_i)`, positive when alpha_i = C is strictly optimal
    pub fn update(&mut self, alpha: &[f64], error_cache: &[f64], samples: &[Sample], c: f64) {
        for (i, sample) in samples.iter().enumerate() {
            let margin = sample.label * (error_cache[i] + sample.label);
            let lambda_lower = margin - 1.0;
            let lambda_upper = 1.0 - margin;

            let at_lower_bound = alpha[i] <= BOUND_TOLERANCE && lambda_lower > 1e-6;
            let at_upper_bound = alpha[i] >= c - BOUND_TOLERANCE && lambda_upper > 1e-6;

            Self::push_history(
                &mut self.lower_bound_history[i],
                at_lower_bound,
                self.history_size,
            );
            Self::push_history(
                &mut self.upper_bound_history[i],
                at_upper_bound,
                self.history_size,
            );
        }

        self.current_iteration += 1;
    }

    fn push_history(history: &mut VecDeque<bool>, value: bool, history_size: usize) {
        if history.len() >= history_size {
            history.pop_front();
        }
        history.push_back(value);
    }

    fn pinned(&self, history: &VecDeque<bool>) -> bool {
        history.len() == self.history_size && history.iter().all(|&x| x)
    }

    /// Variables that can leave the active set
    ///
    /// Returns (lower_bound_indices, upper_bound_indices).
    pub fn get_shrinkable_variables(&self) -> (Vec<usize>, Vec<usize>) {
        let lower = (0..self.lower_bound_history.len())
            .filter(|&i| self.pinned(&self.lower_bound_history[i]))
            .collect();
        let upper = (0..self.upper_bound_history.len())
            .filter(|&i| self.pinned(&self.upper_bound_history[i]))
            .collect();
        (lower, upper)
    }

    /// Check if enough history has been accumulated
    pub fn has_sufficient_history(&self) -> bool {
        self.current_iteration >= self.history_size
    }

    /// Forget all observations (used when variables are reactivated)
    pub fn reset_history(&mut self) {
        for history in &mut self.lower_bound_history {
            history.clear();
        }
        for history in &mut self.upper_bound_history {
            history.clear();
        }
        self.current_iteration = 0;
    }
}
