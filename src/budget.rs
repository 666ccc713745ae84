//! Connection budget policy.
//!
//! Every build has an integer edge ceiling. Candidate pairs are accepted
//! with a probability blending a per-pair density (roughly 50 expected edges
//! per adjacent layer pair) and a global density (budget over all candidate
//! pairs), then modulated by family-specific biases. The ceiling itself is
//! enforced by [`EdgeBudget`]: once it is reached, construction stops.

use crate::family::{ModelFamily, GLOBAL_DEFAULT_BUDGET};

/// Expected edges per adjacent layer pair targeted by [`base_density`].
pub const EDGES_PER_PAIR: f64 = 50.0;

/// Resolve the edge ceiling for a build.
///
/// A finite, positive override wins (fractional values are floored, with a
/// minimum of one edge); otherwise the family default applies, and failing
/// that [`GLOBAL_DEFAULT_BUDGET`].
pub fn resolve_budget(family: ModelFamily, override_budget: Option<f64>) -> usize {
    match override_budget {
        Some(value) if value.is_finite() && value > 0.0 => (value.floor() as usize).max(1),
        _ => family
            .profile()
            .default_budget
            .unwrap_or(GLOBAL_DEFAULT_BUDGET),
    }
}

/// `min(1, 50 / (from * to))`.
pub fn base_density(from_count: usize, to_count: usize) -> f64 {
    let pairs = (from_count * to_count) as f64;
    if pairs <= 0.0 {
        return 0.0;
    }
    (EDGES_PER_PAIR / pairs).min(1.0)
}

/// `min(1, budget / total_pairs)`.
pub fn budget_density(budget: usize, total_pairs: usize) -> f64 {
    if total_pairs == 0 {
        return 0.0;
    }
    (budget as f64 / total_pairs as f64).min(1.0)
}

/// Per-build acceptance policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionBudgetPolicy {
    family: ModelFamily,
    budget: usize,
    budget_density: f64,
}

impl ConnectionBudgetPolicy {
    /// Create a policy for `total_pairs` candidate pairs across all adjacent
    /// layer pairs.
    pub fn new(family: ModelFamily, budget: usize, total_pairs: usize) -> Self {
        Self {
            family,
            budget,
            budget_density: budget_density(budget, total_pairs),
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn budget_density(&self) -> f64 {
        self.budget_density
    }

    /// Acceptance probability for the candidate `(from_index, to_index)`
    /// between layers of `from_count` and `to_count` neurons.
    pub fn acceptance(
        &self,
        from_count: usize,
        to_count: usize,
        from_index: usize,
        to_index: usize,
    ) -> f64 {
        let base = base_density(from_count, to_count);
        // Geometric blend of the per-pair and global densities.
        let blended = (base * self.budget_density).sqrt();
        let bias = self.family_bias(from_count, to_count, from_index, to_index);
        (blended * bias).clamp(0.0, 1.0)
    }

    fn family_bias(
        &self,
        from_count: usize,
        to_count: usize,
        from_index: usize,
        to_index: usize,
    ) -> f64 {
        match self.family {
            ModelFamily::Autoencoder => {
                let rf = (from_index as f64 + 0.5) / from_count.max(1) as f64;
                let rt = (to_index as f64 + 0.5) / to_count.max(1) as f64;
                if (rf + rt - 1.0).abs() < MIRROR_WINDOW {
                    MIRROR_BOOST
                } else {
                    1.0
                }
            }
            ModelFamily::Operator => {
                let phase = ((from_index + to_index) as f64 * OPERATOR_PHASE_RATE).sin();
                OPERATOR_FLOOR + (1.0 - OPERATOR_FLOOR) * (0.5 + 0.5 * phase)
            }
            _ => 1.0,
        }
    }
}

// Tunable presentation constants.
const MIRROR_WINDOW: f64 = 0.12;
const MIRROR_BOOST: f64 = 1.5;
const OPERATOR_PHASE_RATE: f64 = 0.7;
const OPERATOR_FLOOR: f64 = 0.55;

/// Running edge count against a hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeBudget {
    limit: usize,
    used: usize,
}

impl EdgeBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// True once no further edge may be created.
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    /// Claim one edge slot; returns false when the ceiling is reached.
    pub fn try_claim(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
