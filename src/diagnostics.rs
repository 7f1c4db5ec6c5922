//! Non-fatal diagnostics collected while fitting and evaluating.
//!
//! Iterative steps (the imputer, gradient-descent models) may stop at their
//! iteration bound without meeting their tolerance. That is not an error: the
//! best-effort result is still returned, and the shortfall is recorded here so
//! callers can decide whether they care.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of a pipeline produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Imputer,
    Scaler,
    Model,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Imputer => "imputer",
            Stage::Scaler => "scaler",
            Stage::Model => "model",
        };
        f.write_str(s)
    }
}

/// Where in an evaluation run a diagnostic was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Fit on the full training set
    Training,
    /// Fit inside a cross-validation fold
    CrossValidation { fold: usize },
}

/// A single non-fatal condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// An iterative step hit its iteration bound before meeting its tolerance
    ConvergenceNotReached { stage: Stage, iterations: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ConvergenceNotReached { stage, iterations } => write!(
                f,
                "{} did not converge within {} iterations",
                stage, iterations
            ),
        }
    }
}

/// Collection of diagnostics from one fit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics holding a single entry
    pub fn single(diagnostic: Diagnostic) -> Self {
        Self { items: vec![diagnostic] }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// True if any iterative step stopped short of convergence
    pub fn has_convergence_warnings(&self) -> bool {
        self.items
            .iter()
            .any(|d| matches!(d, Diagnostic::ConvergenceNotReached { .. }))
    }
}

/// A diagnostic attributed to a named model and evaluation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDiagnostic {
    pub model: String,
    pub phase: Phase,
    pub diagnostic: Diagnostic,
}

impl fmt::Display for ModelDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Phase::Training => write!(f, "{}: {} (training)", self.model, self.diagnostic),
            Phase::CrossValidation { fold } => {
                write!(f, "{}: {} (cv fold {})", self.model, self.diagnostic, fold)
            }
        }
    }
}

/// A value together with the non-fatal diagnostics raised while producing it
#[derive(Debug, Clone)]
pub struct Evaluated<T> {
    pub value: T,
    pub diagnostics: Vec<ModelDiagnostic>,
}

impl<T> Evaluated<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Attach every entry of `diagnostics` to `model` at `phase`
    pub fn record(&mut self, model: &str, phase: Phase, diagnostics: Diagnostics) {
        for diagnostic in diagnostics.items {
            self.diagnostics.push(ModelDiagnostic {
                model: model.to_string(),
                phase,
                diagnostic,
            });
        }
    }

    /// True if anything degraded silently
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_merge() {
        let mut a = Diagnostics::new();
        assert!(a.is_empty());
        a.extend(Diagnostics::single(Diagnostic::ConvergenceNotReached {
            stage: Stage::Imputer,
            iterations: 30,
        }));
        assert_eq!(a.len(), 1);
        assert!(a.has_convergence_warnings());
    }

    #[test]
    fn test_evaluated_record() {
        let mut evaluated = Evaluated::new(1.0);
        assert!(!evaluated.is_degraded());

        let diags = Diagnostics::single(Diagnostic::ConvergenceNotReached {
            stage: Stage::Model,
            iterations: 100,
        });
        evaluated.record("logistic", Phase::CrossValidation { fold: 2 }, diags);

        assert!(evaluated.is_degraded());
        assert_eq!(evaluated.diagnostics[0].model, "logistic");
        assert_eq!(
            evaluated.diagnostics[0].to_string(),
            "logistic: model did not converge within 100 iterations (cv fold 2)"
        );
    }
}
