//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the binary SVM dual problem by repeatedly optimizing pairs of
//! Lagrange multipliers (Platt, 1998), with the shrinking heuristic from
//! "Making Large-Scale SVM Learning Practical" by Thorsten Joachims.

use crate::cache::KernelCache;
use crate::core::{
    OptimizationResult, OptimizerConfig, Result, SVMError, Sample, WorkingSetStrategy,
};
use crate::kernel::Kernel;
use crate::solver::shrinking::ShrinkingStrategy;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Multipliers below this are treated as zero when collecting support vectors
const SUPPORT_VECTOR_THRESHOLD: f64 = 1e-8;

/// SMO solver for SVM optimization
pub struct SMOSolver<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
}

/// Mutable state of one solve
struct SolverState<'a> {
    samples: &'a [Sample],
    alpha: Vec<f64>,
    /// E_i = f(x_i) - y_i, with f including the running bias
    error_cache: Vec<f64>,
    bias: f64,
    cache: KernelCache,
    rng: StdRng,
}

impl<K: Kernel> SMOSolver<K> {
    /// Create a new SMO solver with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self { kernel, config }
    }

    /// Compute kernel value with caching
    fn kernel_cached(
        &self,
        cache: &mut KernelCache,
        samples: &[Sample],
        i: usize,
        j: usize,
    ) -> f64 {
        cache.get_or_compute(i, j, || {
            self.kernel
                .compute(&samples[i].features, &samples[j].features)
        })
    }

    /// Solve the SVM optimization problem
    ///
    /// Takes the training samples (labels in {-1, +1}) and returns the
    /// optimized alpha values, bias term, and support vector indices.
    pub fn solve(&self, samples: &[Sample]) -> Result<OptimizationResult> {
        let cache = KernelCache::for_problem(self.config.cache_size, samples.len());
        self.solve_with_cache(samples, cache)
    }

    /// Solve the SVM optimization problem with a caller-provided kernel cache
    pub fn solve_with_cache(
        &self,
        samples: &[Sample],
        cache: KernelCache,
    ) -> Result<OptimizationResult> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if self.config.c <= 0.0 {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive, got: {}",
                self.config.c
            )));
        }

        let dim = samples[0].features.len();
        for sample in samples {
            if sample.label != 1.0 && sample.label != -1.0 {
                return Err(SVMError::InvalidLabel(sample.label));
            }
            if sample.features.len() != dim {
                return Err(SVMError::DimensionMismatch {
                    expected: dim,
                    actual: sample.features.len(),
                });
            }
        }

        let n = samples.len();

        // A single sample has no pair to optimize: the bias alone carries its label
        if n == 1 {
            return Ok(OptimizationResult {
                alpha: vec![0.0],
                b: samples[0].label,
                support_vectors: Vec::new(),
                iterations: 0,
                objective_value: 0.0,
            });
        }

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut state = SolverState {
            samples,
            alpha: vec![0.0; n],
            error_cache: samples.iter().map(|s| -s.label).collect(),
            bias: 0.0,
            cache,
            rng,
        };

        let mut shrinking_strategy = if self.config.shrinking {
            Some(ShrinkingStrategy::new(n, self.config.shrinking_iterations))
        } else {
            None
        };

        let mut active_set: Vec<usize> = (0..n).collect();
        let mut iterations = 0;
        let mut examine_all = true;
        let mut converged = false;
        let mut shrinking_counter = 0;

        while iterations < self.config.max_iterations {
            let candidates: Vec<usize> = if examine_all {
                active_set.clone()
            } else {
                active_set
                    .iter()
                    .copied()
                    .filter(|&i| self.is_free(state.alpha[i]))
                    .collect()
            };

            let mut num_changed = 0;
            for i in candidates {
                if self.examine_example(i, &mut state, &active_set) {
                    num_changed += 1;
                }
            }
            iterations += 1;

            if let Some(ref mut strategy) = shrinking_strategy {
                strategy.update(&state.alpha, &state.error_cache, samples, self.config.c);

                shrinking_counter += 1;
                if shrinking_counter >= self.config.shrinking_iterations
                    && strategy.has_sufficient_history()
                {
                    let (shrink_to_lower, shrink_to_upper) = strategy.get_shrinkable_variables();
                    let before = active_set.len();
                    active_set
                        .retain(|i| !shrink_to_lower.contains(i) && !shrink_to_upper.contains(i));
                    if active_set.len() < before {
                        debug!(
                            "Shrinking: {} of {} variables remain active",
                            active_set.len(),
                            n
                        );
                    }
                    shrinking_counter = 0;
                }
            }

            if examine_all {
                if num_changed == 0 {
                    if active_set.len() < n {
                        // Re-check shrunk variables before accepting the solution
                        active_set = (0..n).collect();
                        if let Some(ref mut strategy) = shrinking_strategy {
                            strategy.reset_history();
                        }
                        shrinking_counter = 0;
                        continue;
                    }
                    converged = true;
                    break;
                }
                examine_all = false;
            } else if num_changed == 0 {
                examine_all = true;
            }
        }

        if !converged {
            warn!(
                "SMO stopped after {} passes without meeting tolerance {}",
                iterations, self.config.epsilon
            );
        }

        let bias = self.calculate_bias(&state);

        let support_vectors: Vec<usize> = state
            .alpha
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| (a > SUPPORT_VECTOR_THRESHOLD).then_some(i))
            .collect();

        let objective_value = self.calculate_objective(&mut state, &support_vectors);

        let stats = state.cache.stats();
        debug!(
            "SMO finished: {} passes, {} support vectors, bias {:.6}, kernel cache hit rate {:.1}% ({} entries)",
            iterations,
            support_vectors.len(),
            bias,
            state.cache.hit_rate() * 100.0,
            stats.size
        );

        Ok(OptimizationResult {
            alpha: state.alpha,
            b: bias,
            support_vectors,
            iterations,
            objective_value,
        })
    }

    fn is_free(&self, alpha: f64) -> bool {
        alpha > 0.0 && alpha < self.config.c
    }

    /// Examine a single example for potential optimization
    fn examine_example(&self, i: usize, state: &mut SolverState, active_set: &[usize]) -> bool {
        let y_i = state.samples[i].label;
        let alpha_i = state.alpha[i];
        let r_i = state.error_cache[i] * y_i;

        // KKT violation conditions:
        // - r_i < -epsilon and alpha_i < C (can increase alpha_i)
        // - r_i > epsilon and alpha_i > 0 (can decrease alpha_i)
        let violates = (r_i < -self.config.epsilon && alpha_i < self.config.c)
            || (r_i > self.config.epsilon && alpha_i > 0.0);
        if !violates {
            return false;
        }

        if let Some(j) = self.select_second_variable(i, state, active_set) {
            if self.take_step(i, j, state) {
                return true;
            }
        }

        // The preferred partner made no progress: sweep the free multipliers,
        // then the whole active set, from a random starting point
        let m = active_set.len();
        if m == 0 {
            return false;
        }
        let start = state.rng.gen_range(0..m);
        for free_only in [true, false] {
            for offset in 0..m {
                let j = active_set[(start + offset) % m];
                if j == i || (free_only && !self.is_free(state.alpha[j])) {
                    continue;
                }
                if self.take_step(i, j, state) {
                    return true;
                }
            }
        }

        false
    }

    /// Select second variable using configured strategy
    fn select_second_variable(
        &self,
        i: usize,
        state: &mut SolverState,
        active_set: &[usize],
    ) -> Option<usize> {
        match self.config.working_set_strategy {
            WorkingSetStrategy::SMOHeuristic => {
                self.select_second_variable_smo_heuristic(i, state, active_set)
            }
            WorkingSetStrategy::SteepestDescent => {
                self.select_second_variable_steepest_descent(i, state, active_set)
            }
            WorkingSetStrategy::Random => self.select_second_variable_random(i, state, active_set),
        }
    }

    /// Maximum |E_i - E_j| among active variables
    fn select_second_variable_smo_heuristic(
        &self,
        i: usize,
        state: &SolverState,
        active_set: &[usize],
    ) -> Option<usize> {
        let e_i = state.error_cache[i];
        let mut best_j = None;
        let mut max_diff = 0.0;

        for &j in active_set {
            if j == i {
                continue;
            }
            let diff = (e_i - state.error_cache[j]).abs();
            if diff > max_diff {
                max_diff = diff;
                best_j = Some(j);
            }
        }

        best_j
    }

    /// Maximum KKT violation among active variables
    fn select_second_variable_steepest_descent(
        &self,
        i: usize,
        state: &SolverState,
        active_set: &[usize],
    ) -> Option<usize> {
        let mut best_j = None;
        let mut max_violation = 0.0;

        for &j in active_set {
            if j == i {
                continue;
            }

            let r_j = state.error_cache[j] * state.samples[j].label;
            let alpha_j = state.alpha[j];

            let violation = if r_j < -self.config.epsilon && alpha_j < self.config.c {
                -r_j - self.config.epsilon
            } else if r_j > self.config.epsilon && alpha_j > 0.0 {
                r_j - self.config.epsilon
            } else {
                0.0
            };

            if violation > max_violation {
                max_violation = violation;
                best_j = Some(j);
            }
        }

        best_j
    }

    /// Uniform draw from the active set, excluding i
    fn select_second_variable_random(
        &self,
        i: usize,
        state: &mut SolverState,
        active_set: &[usize],
    ) -> Option<usize> {
        let available: Vec<usize> = active_set.iter().copied().filter(|&j| j != i).collect();
        if available.is_empty() {
            None
        } else {
            Some(available[state.rng.gen_range(0..available.len())])
        }
    }

    /// Jointly optimize alpha_i and alpha_j
    fn take_step(&self, i: usize, j: usize, state: &mut SolverState) -> bool {
        if i == j {
            return false;
        }

        let samples = state.samples;
        let c = self.config.c;
        let y_i = samples[i].label;
        let y_j = samples[j].label;
        let alpha_i_old = state.alpha[i];
        let alpha_j_old = state.alpha[j];
        let e_i = state.error_cache[i];
        let e_j = state.error_cache[j];
        let s = y_i * y_j;

        // Feasible segment for alpha_j given y_i*alpha_i + y_j*alpha_j = const
        let (low, high) = if y_i != y_j {
            let diff = alpha_j_old - alpha_i_old;
            (diff.max(0.0), c.min(c + diff))
        } else {
            let sum = alpha_i_old + alpha_j_old;
            ((sum - c).max(0.0), c.min(sum))
        };

        if low >= high {
            return false;
        }

        let k_ii = self.kernel_cached(&mut state.cache, samples, i, i);
        let k_ij = self.kernel_cached(&mut state.cache, samples, i, j);
        let k_jj = self.kernel_cached(&mut state.cache, samples, j, j);

        let eta = k_ii + k_jj - 2.0 * k_ij;

        let alpha_j_new = if eta > 0.0 {
            (alpha_j_old + y_j * (e_i - e_j) / eta).clamp(low, high)
        } else {
            // Non-positive curvature (e.g. sigmoid kernel): move to the better end
            let f_i = y_i * (e_i - state.bias) - alpha_i_old * k_ii - s * alpha_j_old * k_ij;
            let f_j = y_j * (e_j - state.bias) - s * alpha_i_old * k_ij - alpha_j_old * k_jj;
            let objective_at = |a_j: f64| {
                let a_i = alpha_i_old + s * (alpha_j_old - a_j);
                a_i * f_i
                    + a_j * f_j
                    + 0.5 * a_i * a_i * k_ii
                    + 0.5 * a_j * a_j * k_jj
                    + s * a_j * a_i * k_ij
            };
            let low_obj = objective_at(low);
            let high_obj = objective_at(high);

            if low_obj < high_obj - self.config.epsilon {
                low
            } else if low_obj > high_obj + self.config.epsilon {
                high
            } else {
                alpha_j_old
            }
        };

        if (alpha_j_new - alpha_j_old).abs()
            < self.config.epsilon * (alpha_j_new + alpha_j_old + self.config.epsilon)
        {
            return false;
        }

        let mut alpha_i_new = alpha_i_old + s * (alpha_j_old - alpha_j_new);
        // Round-off can push alpha_i just outside [0, C]
        alpha_i_new = alpha_i_new.clamp(0.0, c);

        let delta_i = alpha_i_new - alpha_i_old;
        let delta_j = alpha_j_new - alpha_j_old;

        // New bias makes E_i (or E_j) vanish when that multiplier is free
        let b_i = state.bias - e_i - y_i * delta_i * k_ii - y_j * delta_j * k_ij;
        let b_j = state.bias - e_j - y_i * delta_i * k_ij - y_j * delta_j * k_jj;
        let bias_new = if self.is_free(alpha_i_new) {
            b_i
        } else if self.is_free(alpha_j_new) {
            b_j
        } else {
            (b_i + b_j) / 2.0
        };
        let delta_b = bias_new - state.bias;

        state.alpha[i] = alpha_i_new;
        state.alpha[j] = alpha_j_new;
        state.bias = bias_new;

        for k in 0..samples.len() {
            let k_ik = self.kernel_cached(&mut state.cache, samples, i, k);
            let k_jk = self.kernel_cached(&mut state.cache, samples, j, k);
            state.error_cache[k] += y_i * delta_i * k_ik + y_j * delta_j * k_jk + delta_b;
        }

        true
    }

    /// Final bias from the KKT conditions
    ///
    /// Free support vectors pin the bias exactly; without any, the bias is the
    /// midpoint of the interval allowed by the bounded multipliers.
    fn calculate_bias(&self, state: &SolverState) -> f64 {
        let c = self.config.c;
        let tol = SUPPORT_VECTOR_THRESHOLD;

        let mut free_sum = 0.0;
        let mut free_count = 0;
        let mut lower = f64::NEG_INFINITY;
        let mut upper = f64::INFINITY;

        for (i, sample) in state.samples.iter().enumerate() {
            // Bias that would put sample i exactly on its margin
            let candidate = state.bias - state.error_cache[i];
            let alpha = state.alpha[i];

            if alpha > tol && alpha < c - tol {
                free_sum += candidate;
                free_count += 1;
            } else if (alpha <= tol) == (sample.label > 0.0) {
                lower = lower.max(candidate);
            } else {
                upper = upper.min(candidate);
            }
        }

        if free_count > 0 {
            free_sum / free_count as f64
        } else if lower.is_finite() && upper.is_finite() {
            (lower + upper) / 2.0
        } else if lower.is_finite() {
            lower
        } else if upper.is_finite() {
            upper
        } else {
            state.bias
        }
    }

    /// Dual objective: Σα - ½ ΣΣ α_i α_j y_i y_j K(x_i, x_j)
    fn calculate_objective(&self, state: &mut SolverState, support_vectors: &[usize]) -> f64 {
        let samples = state.samples;
        let mut obj: f64 = support_vectors.iter().map(|&i| state.alpha[i]).sum();

        for &i in support_vectors {
            for &j in support_vectors {
                let k_ij = self.kernel_cached(&mut state.cache, samples, i, j);
                obj -= 0.5
                    * state.alpha[i]
                    * state.alpha[j]
                    * samples[i].label
                    * samples[j].label
                    * k_ij;
            }
        }

        obj
    }
}
