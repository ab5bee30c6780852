//! GMRES-DR solver configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the stopping tolerance is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Precision {
    /// Stop when ||r|| <= sqrt(eps_sq).
    #[default]
    Absolute,
    /// Stop when ||r|| <= sqrt(eps_sq) * ||b||.
    Relative,
}

impl Precision {
    /// Parse from a string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "absolute" | "abs" => Some(Self::Absolute),
            "relative" | "rel" => Some(Self::Relative),
            _ => None,
        }
    }

    /// Build from the integer-style relative precision flag used by HMC drivers.
    pub fn from_flag(rel_prec: bool) -> Self {
        if rel_prec {
            Self::Relative
        } else {
            Self::Absolute
        }
    }

    /// Residual norm below which the solve counts as converged.
    pub fn threshold(self, eps: f64, rhs_norm: f64) -> f64 {
        match self {
            Self::Absolute => eps,
            Self::Relative => eps * rhs_norm,
        }
    }
}

/// GMRES-DR solver configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GmresDrConfig {
    /// Maximal Krylov subspace dimension `m` before a restart.
    pub restart: usize,
    /// Number of harmonic Ritz vectors `nr_ev` carried across a restart.
    pub deflation: usize,
    /// Maximal number of cycles, the first (undeflated) cycle included.
    pub max_restarts: usize,
    /// Squared stopping tolerance.
    pub eps_sq: f64,
    /// Absolute or relative stopping criterion.
    pub precision: Precision,
}

impl Default for GmresDrConfig {
    fn default() -> Self {
        Self {
            restart: 20,
            deflation: 5,
            max_restarts: 100,
            eps_sq: 1e-16,
            precision: Precision::Absolute,
        }
    }
}

impl GmresDrConfig {
    /// Create a configuration with subspace dimension `m` and `nr_ev` deflation vectors.
    pub fn new(restart: usize, deflation: usize) -> Self {
        Self {
            restart,
            deflation,
            ..Default::default()
        }
    }

    /// Set the maximal number of cycles.
    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Set the squared stopping tolerance.
    pub fn with_eps_sq(mut self, eps_sq: f64) -> Self {
        self.eps_sq = eps_sq;
        self
    }

    /// Set the stopping criterion.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Stopping tolerance on the residual norm, sqrt(eps_sq).
    pub fn eps(&self) -> f64 {
        self.eps_sq.sqrt()
    }

    /// Check the parameter ranges.
    ///
    /// The deflated restart needs `0 < nr_ev < m`: the re-based subspace has
    /// `nr_ev + 1` vectors and must leave room for at least one new Arnoldi
    /// step.
    pub fn validate(&self) -> Result<()> {
        if self.deflation == 0 || self.deflation >= self.restart {
            return Err(Error::InvalidDeflation {
                nr_ev: self.deflation,
                m: self.restart,
            });
        }
        if self.max_restarts == 0 {
            return Err(Error::InvalidParameter(
                "max_restarts must be at least 1".into(),
            ));
        }
        if !(self.eps_sq.is_finite() && self.eps_sq > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "eps_sq must be positive and finite, got {}",
                self.eps_sq
            )));
        }
        Ok(())
    }
}
