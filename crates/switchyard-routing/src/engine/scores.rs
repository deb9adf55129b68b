//! Score accumulation for backend selection.
//!
//! Scores are not clamped while signals accumulate; stacked weights can push
//! a score past 1.0. Only the final confidence value is clamped, which is
//! why confidence is a strength-of-preference heuristic rather than a
//! probability.

use std::collections::HashMap;

use crate::types::{BackendChoice, Factor, FactorName};

/// Neutral starting score for every backend.
const BASELINE: f64 = 0.5;

/// Which backend scores a signal nudges.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target {
    Local,
    Paid,
    Free,
}

/// Running scores for the three backends plus the factor ledger.
pub(crate) struct ScoreBoard {
    local: f64,
    paid: f64,
    free: f64,
    /// Whether the free tier is eligible for selection at all.
    free_eligible: bool,
    factors: HashMap<FactorName, Factor>,
    notes: Vec<String>,
}

impl ScoreBoard {
    pub(crate) fn new(free_eligible: bool) -> Self {
        Self {
            local: BASELINE,
            paid: BASELINE,
            free: BASELINE,
            free_eligible,
            factors: HashMap::new(),
            notes: Vec::new(),
        }
    }

    /// Applies one signal: bumps each target by `weight × magnitude` and
    /// records the total delta under the factor's name. Free-tier bumps are
    /// dropped when the free tier is not eligible.
    pub(crate) fn apply(
        &mut self,
        name: FactorName,
        weight: f64,
        magnitude: f64,
        targets: &[Target],
    ) {
        let delta = weight * magnitude;
        let mut applied = 0.0;

        for target in targets {
            match target {
                Target::Local => {
                    self.local += delta;
                    applied += delta;
                }
                Target::Paid => {
                    self.paid += delta;
                    applied += delta;
                }
                Target::Free => {
                    if self.free_eligible {
                        self.free += delta;
                        applied += delta;
                    }
                }
            }
        }

        let entry = self.factors.entry(name).or_insert(Factor {
            contribution: 0.0,
            weight,
            was_applied: false,
        });
        entry.contribution += applied;
        entry.was_applied = entry.was_applied || applied.abs() > f64::EPSILON;
    }

    /// Records that a signal was considered but did not fire.
    pub(crate) fn skip(&mut self, name: FactorName, weight: f64) {
        self.factors.entry(name).or_insert(Factor {
            contribution: 0.0,
            weight,
            was_applied: false,
        });
    }

    /// Adds an explanation fragment.
    pub(crate) fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }

    /// Final selection: free wins only on strict superiority over both other
    /// backends; otherwise the better of local and paid. Confidence is the
    /// separation between the winner and the best other eligible score,
    /// clamped to `[0, 1]`.
    pub(crate) fn winner(&self) -> (BackendChoice, f64) {
        let (choice, score) =
            if self.free_eligible && self.free > self.local && self.free > self.paid {
                (BackendChoice::Free, self.free)
            } else if self.paid > self.local {
                (BackendChoice::Paid, self.paid)
            } else {
                (BackendChoice::Local, self.local)
            };

        let runner_up = match choice {
            BackendChoice::Free => self.local.max(self.paid),
            BackendChoice::Paid if self.free_eligible => self.local.max(self.free),
            BackendChoice::Paid => self.local,
            BackendChoice::Local if self.free_eligible => self.paid.max(self.free),
            BackendChoice::Local => self.paid,
        };

        let confidence = (score - runner_up).clamp(0.0, 1.0);
        (choice, confidence)
    }

    /// Builds the final explanation string from the accumulated notes and
    /// scores.
    pub(crate) fn explanation(&self, choice: BackendChoice) -> String {
        let summary = format!(
            "chose {choice} (local={:.2}, paid={:.2}, free={})",
            self.local,
            self.paid,
            if self.free_eligible {
                format!("{:.2}", self.free)
            } else {
                "n/a".to_owned()
            }
        );

        if self.notes.is_empty() {
            summary
        } else {
            format!("{summary}: {}", self.notes.join("; "))
        }
    }

    pub(crate) fn into_factors(self) -> HashMap<FactorName, Factor> {
        self.factors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_board_ties_on_local() {
        let board = ScoreBoard::new(false);
        let (choice, confidence) = board.winner();
        assert_eq!(choice, BackendChoice::Local);
        assert!(confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn free_requires_strict_superiority() {
        let mut board = ScoreBoard::new(true);
        board.apply(FactorName::Priority, 1.0, 0.2, &[Target::Free, Target::Local]);
        // free == local: free must not win.
        let (choice, _) = board.winner();
        assert_ne!(choice, BackendChoice::Free);

        board.apply(FactorName::Complexity, 1.0, 0.1, &[Target::Free]);
        let (choice, _) = board.winner();
        assert_eq!(choice, BackendChoice::Free);
    }

    #[test]
    fn free_bumps_dropped_when_ineligible() {
        let mut board = ScoreBoard::new(false);
        board.apply(FactorName::Priority, 1.0, 5.0, &[Target::Free]);
        let (choice, confidence) = board.winner();
        assert_eq!(choice, BackendChoice::Local);
        assert!(confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_is_clamped() {
        let mut board = ScoreBoard::new(false);
        board.apply(FactorName::Priority, 1.0, 5.0, &[Target::Paid]);
        let (choice, confidence) = board.winner();
        assert_eq!(choice, BackendChoice::Paid);
        assert!((confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn factor_ledger_tracks_application() {
        let mut board = ScoreBoard::new(false);
        board.apply(FactorName::Complexity, 0.8, 0.3, &[Target::Paid]);
        board.skip(FactorName::Cost, 1.0);

        let factors = board.into_factors();
        let complexity = &factors[&FactorName::Complexity];
        assert!(complexity.was_applied);
        assert!((complexity.contribution - 0.24).abs() < 1e-9);

        let cost = &factors[&FactorName::Cost];
        assert!(!cost.was_applied);
        assert!(cost.contribution.abs() < f64::EPSILON);
    }
}
