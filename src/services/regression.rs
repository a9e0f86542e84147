//! Epsilon-support-vector regression with an RBF kernel.
//!
//! The dual problem is solved with SMO using second-order working-set
//! selection (Fan, Chen & Lin 2005), the same scheme LIBSVM uses. The 2n
//! dual variables are `alpha` for `i < n` and `alpha*` for `i >= n`; the
//! fitted function is `f(x) = sum_i (alpha_i - alpha*_i) K(x_i, x) - rho`.

use thiserror::Error;
use tracing::{debug, warn};

const TAU: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("cannot fit a regression on an empty training set")]
    Empty,
    #[error("training inputs and targets differ in length ({inputs} vs {targets})")]
    LengthMismatch { inputs: usize, targets: usize },
    #[error("training data contains non-finite values")]
    NonFinite,
}

/// How the RBF width is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, or 1 when the inputs have no spread
    Scale,
    Fixed(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvrParams {
    pub c: f64,
    pub epsilon: f64,
    pub gamma: Gamma,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SvrParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.1,
            gamma: Gamma::Scale,
            tolerance: 1e-3,
            max_iterations: 1_000_000,
        }
    }
}

/// A fitted one-dimensional RBF SVR
#[derive(Debug, Clone)]
pub struct SvrModel {
    support: Vec<f64>,
    coefficients: Vec<f64>,
    rho: f64,
    gamma: f64,
}

impl SvrModel {
    pub fn fit(x: &[f64], y: &[f64], params: SvrParams) -> Result<Self, FitError> {
        if x.len() != y.len() {
            return Err(FitError::LengthMismatch {
                inputs: x.len(),
                targets: y.len(),
            });
        }
        if x.is_empty() {
            return Err(FitError::Empty);
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let gamma = match params.gamma {
            Gamma::Scale => scale_gamma(x),
            Gamma::Fixed(g) => g,
        };

        let n = x.len();
        let kernel: Vec<Vec<f64>> = x
            .iter()
            .map(|a| x.iter().map(|b| rbf(*a, *b, gamma)).collect())
            .collect();

        let mut solver = Solver::new(&kernel, y, params);
        let iterations = solver.solve();
        let rho = solver.rho();

        let (support, coefficients): (Vec<f64>, Vec<f64>) = (0..n)
            .map(|i| (x[i], solver.alpha[i] - solver.alpha[i + n]))
            .filter(|(_, coef)| *coef != 0.0)
            .unzip();

        debug!(
            "SVR fit: {} samples, {} support vectors, gamma={:.6}, rho={:.6}, {} iterations",
            n,
            support.len(),
            gamma,
            rho,
            iterations
        );

        Ok(Self {
            support,
            coefficients,
            rho,
            gamma,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.support
            .iter()
            .zip(self.coefficients.iter())
            .map(|(sv, coef)| coef * rbf(*sv, x, self.gamma))
            .sum::<f64>()
            - self.rho
    }

    pub fn support_vector_count(&self) -> usize {
        self.support.len()
    }

    /// Dual coefficients `alpha_i - alpha*_i` of the support vectors
    #[cfg(test)]
    pub fn dual_coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

pub fn scale_gamma(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if variance > 0.0 {
        1.0 / variance
    } else {
        1.0
    }
}

fn rbf(a: f64, b: f64, gamma: f64) -> f64 {
    (-gamma * (a - b).powi(2)).exp()
}

struct Solver<'a> {
    kernel: &'a [Vec<f64>],
    n: usize,
    c: f64,
    tolerance: f64,
    max_iterations: usize,
    alpha: Vec<f64>,
    gradient: Vec<f64>,
    sign: Vec<f64>,
}

impl<'a> Solver<'a> {
    fn new(kernel: &'a [Vec<f64>], y: &[f64], params: SvrParams) -> Self {
        let n = y.len();
        let mut gradient = Vec::with_capacity(2 * n);
        let mut sign = Vec::with_capacity(2 * n);
        for target in y {
            gradient.push(params.epsilon - target);
            sign.push(1.0);
        }
        for target in y {
            gradient.push(params.epsilon + target);
            sign.push(-1.0);
        }

        Self {
            kernel,
            n,
            c: params.c,
            tolerance: params.tolerance,
            max_iterations: params.max_iterations,
            alpha: vec![0.0; 2 * n],
            gradient,
            sign,
        }
    }

    /// Q_ij = y_i y_j K(i mod n, j mod n)
    fn q(&self, i: usize, j: usize) -> f64 {
        self.sign[i] * self.sign[j] * self.kernel[i % self.n][j % self.n]
    }

    fn qd(&self, i: usize) -> f64 {
        self.kernel[i % self.n][i % self.n]
    }

    fn at_upper(&self, i: usize) -> bool {
        self.alpha[i] >= self.c
    }

    fn at_lower(&self, i: usize) -> bool {
        self.alpha[i] <= 0.0
    }

    fn solve(&mut self) -> usize {
        let mut iterations = 0;
        while iterations < self.max_iterations {
            let Some((i, j)) = self.select_working_set() else {
                return iterations;
            };
            self.update_pair(i, j);
            iterations += 1;
        }
        warn!("SVR solver hit the iteration limit ({})", self.max_iterations);
        iterations
    }

    fn select_working_set(&self) -> Option<(usize, usize)> {
        let len = 2 * self.n;

        let mut g_max = f64::NEG_INFINITY;
        let mut i_best = None;
        for t in 0..len {
            if self.sign[t] > 0.0 {
                if !self.at_upper(t) && -self.gradient[t] >= g_max {
                    g_max = -self.gradient[t];
                    i_best = Some(t);
                }
            } else if !self.at_lower(t) && self.gradient[t] >= g_max {
                g_max = self.gradient[t];
                i_best = Some(t);
            }
        }
        let i = i_best?;

        let mut g_max2 = f64::NEG_INFINITY;
        let mut j_best = None;
        let mut obj_diff_min = f64::INFINITY;
        for t in 0..len {
            let (grad_diff, quad_coef) = if self.sign[t] > 0.0 {
                if self.at_lower(t) {
                    continue;
                }
                g_max2 = g_max2.max(self.gradient[t]);
                (
                    g_max + self.gradient[t],
                    self.qd(i) + self.qd(t) - 2.0 * self.sign[i] * self.q(i, t),
                )
            } else {
                if self.at_upper(t) {
                    continue;
                }
                g_max2 = g_max2.max(-self.gradient[t]);
                (
                    g_max - self.gradient[t],
                    self.qd(i) + self.qd(t) + 2.0 * self.sign[i] * self.q(i, t),
                )
            };

            if grad_diff > 0.0 {
                let quad = if quad_coef > 0.0 { quad_coef } else { TAU };
                let obj_diff = -(grad_diff * grad_diff) / quad;
                if obj_diff <= obj_diff_min {
                    obj_diff_min = obj_diff;
                    j_best = Some(t);
                }
            }
        }

        if g_max + g_max2 < self.tolerance {
            return None;
        }
        j_best.map(|j| (i, j))
    }

    fn update_pair(&mut self, i: usize, j: usize) {
        let c = self.c;
        let old_ai = self.alpha[i];
        let old_aj = self.alpha[j];
        let q_ij = self.q(i, j);

        if self.sign[i] != self.sign[j] {
            let mut quad = self.qd(i) + self.qd(j) + 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (-self.gradient[i] - self.gradient[j]) / quad;
            let diff = self.alpha[i] - self.alpha[j];
            self.alpha[i] += delta;
            self.alpha[j] += delta;

            if diff > 0.0 {
                if self.alpha[j] < 0.0 {
                    self.alpha[j] = 0.0;
                    self.alpha[i] = diff;
                }
            } else if self.alpha[i] < 0.0 {
                self.alpha[i] = 0.0;
                self.alpha[j] = -diff;
            }
            if diff > 0.0 {
                if self.alpha[i] > c {
                    self.alpha[i] = c;
                    self.alpha[j] = c - diff;
                }
            } else if self.alpha[j] > c {
                self.alpha[j] = c;
                self.alpha[i] = c + diff;
            }
        } else {
            let mut quad = self.qd(i) + self.qd(j) - 2.0 * q_ij;
            if quad <= 0.0 {
                quad = TAU;
            }
            let delta = (self.gradient[i] - self.gradient[j]) / quad;
            let sum = self.alpha[i] + self.alpha[j];
            self.alpha[i] -= delta;
            self.alpha[j] += delta;

            if sum > c {
                if self.alpha[i] > c {
                    self.alpha[i] = c;
                    self.alpha[j] = sum - c;
                }
            } else if self.alpha[j] < 0.0 {
                self.alpha[j] = 0.0;
                self.alpha[i] = sum;
            }
            if sum > c {
                if self.alpha[j] > c {
                    self.alpha[j] = c;
                    self.alpha[i] = sum - c;
                }
            } else if self.alpha[i] < 0.0 {
                self.alpha[i] = 0.0;
                self.alpha[j] = sum;
            }
        }

        let delta_i = self.alpha[i] - old_ai;
        let delta_j = self.alpha[j] - old_aj;
        for t in 0..2 * self.n {
            self.gradient[t] += self.q(i, t) * delta_i + self.q(j, t) * delta_j;
        }
    }

    fn rho(&self) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free_sum = 0.0;
        let mut free_count = 0usize;

        for t in 0..2 * self.n {
            let yg = self.sign[t] * self.gradient[t];
            if self.at_upper(t) {
                if self.sign[t] < 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else if self.at_lower(t) {
                if self.sign[t] > 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else {
                free_count += 1;
                free_sum += yg;
            }
        }

        if free_count > 0 {
            free_sum / free_count as f64
        } else {
            (upper + lower) / 2.0
        }
    }
}
