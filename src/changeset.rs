//! Changeset - Input Change Tracking for the Dashboard
//!
//! This module defines data structures for tracking changes to the dashboard's
//! inputs, so that only the outputs depending on a changed input are
//! recomputed.
//!
//! # Usage Pattern
//!
//! 1. Input events generate `InputChange` records (only when the value differs)
//! 2. Changes accumulate in the session's changeset buffer
//! 3. At the end of an event the buffer is coalesced to its net change per input
//! 4. The binding layer asks each output whether any of its inputs changed
//! 5. The buffer is drained, advancing the generation counter

use crate::chart::InterestVariable;
use serde::{Deserialize, Serialize};

/// Identifies one of the dashboard's input controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputId {
    #[serde(rename = "population-slider")]
    PopulationSlider,
    #[serde(rename = "interest-variable")]
    InterestVariable,
}

/// Represents a single change to an input value
#[derive(Debug, Clone, PartialEq)]
pub enum InputChange {
    PopulationCeiling { old: i64, new: i64 },
    InterestVariable { old: InterestVariable, new: InterestVariable },
}

impl InputChange {
    /// Returns the input this change applies to
    pub fn input(&self) -> InputId {
        match self {
            InputChange::PopulationCeiling { .. } => InputId::PopulationSlider,
            InputChange::InterestVariable { .. } => InputId::InterestVariable,
        }
    }

    /// Returns true if only labels and y-values are affected, not the
    /// selected record set.
    pub fn keeps_record_set(&self) -> bool {
        matches!(self, InputChange::InterestVariable { .. })
    }

    /// Returns true if the input ends where it started
    pub fn is_noop(&self) -> bool {
        match self {
            InputChange::PopulationCeiling { old, new } => old == new,
            InputChange::InterestVariable { old, new } => old == new,
        }
    }

    /// Takes the final value of a later change to the same input
    fn absorb(&mut self, later: InputChange) {
        match (self, later) {
            (InputChange::PopulationCeiling { new, .. }, InputChange::PopulationCeiling { new: last, .. }) => {
                *new = last
            }
            (InputChange::InterestVariable { new, .. }, InputChange::InterestVariable { new: last, .. }) => {
                *new = last
            }
            _ => {}
        }
    }
}

/// A collection of input changes not yet propagated to outputs
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    changes: Vec<InputChange>,
    /// Generation counter - incremented each time the changeset is drained
    generation: u64,
}

impl Changeset {
    pub fn new() -> Self {
        Changeset {
            changes: Vec::new(),
            generation: 0,
        }
    }

    /// Add a change to the changeset
    pub fn push(&mut self, change: InputChange) {
        self.changes.push(change);
    }

    /// Returns all changes since the last drain
    pub fn changes(&self) -> &[InputChange] {
        &self.changes
    }

    /// Returns the current generation number
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true if there are no pending changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of pending changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Folds pending changes into at most one per input, running from the
    /// value before the first change to the value after the last. Inputs that
    /// end where they started are dropped. The generation is not advanced.
    pub fn coalesce(&mut self) {
        let mut net: Vec<InputChange> = Vec::with_capacity(self.changes.len());
        for change in self.changes.drain(..) {
            match net.iter().position(|c| c.input() == change.input()) {
                Some(i) => net[i].absorb(change),
                None => net.push(change),
            }
        }
        net.retain(|c| !c.is_noop());
        self.changes = net;
    }

    /// Drain changes, returning ownership and clearing the buffer
    pub fn drain(&mut self) -> Vec<InputChange> {
        self.generation += 1;
        std::mem::take(&mut self.changes)
    }
}

/// Trait for outputs that declare the inputs they are computed from
pub trait DependentOutput {
    /// Inputs this output reads
    fn inputs(&self) -> &[InputId];

    /// Returns true if any of the given changes touches one of this output's inputs
    fn is_affected(&self, changes: &[InputChange]) -> bool {
        changes.iter().any(|c| self.inputs().contains(&c.input()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reads(&'static [InputId]);

    impl DependentOutput for Reads {
        fn inputs(&self) -> &[InputId] {
            self.0
        }
    }

    #[test]
    fn test_changeset_basic() {
        let mut cs = Changeset::new();
        assert!(cs.is_empty());
        assert_eq!(cs.generation(), 0);

        cs.push(InputChange::PopulationCeiling { old: 1, new: 2 });

        assert!(!cs.is_empty());
        assert_eq!(cs.len(), 1);
        assert_eq!(cs.changes()[0].input(), InputId::PopulationSlider);

        let drained = cs.drain();
        assert_eq!(drained.len(), 1);
        assert!(cs.is_empty());
        assert_eq!(cs.generation(), 1);
    }

    #[test]
    fn test_dependent_output_is_affected() {
        let population_only = Reads(&[InputId::PopulationSlider]);
        let interest_change = [InputChange::InterestVariable {
            old: InterestVariable::TotalCases,
            new: InterestVariable::TotalDeaths,
        }];

        assert!(!population_only.is_affected(&interest_change));
        assert!(!population_only.is_affected(&[]));
        assert!(population_only.is_affected(&[InputChange::PopulationCeiling { old: 1, new: 5 }]));
        assert!(interest_change[0].keeps_record_set());
    }

    #[test]
    fn test_coalesce_keeps_net_change_per_input() {
        let mut cs = Changeset::new();
        cs.push(InputChange::PopulationCeiling { old: 10, new: 20 });
        cs.push(InputChange::InterestVariable {
            old: InterestVariable::TotalCases,
            new: InterestVariable::TotalTests,
        });
        cs.push(InputChange::PopulationCeiling { old: 20, new: 30 });

        cs.coalesce();

        assert_eq!(
            cs.changes(),
            &[
                InputChange::PopulationCeiling { old: 10, new: 30 },
                InputChange::InterestVariable {
                    old: InterestVariable::TotalCases,
                    new: InterestVariable::TotalTests,
                },
            ]
        );
        assert_eq!(cs.generation(), 0);
    }

    #[test]
    fn test_coalesce_drops_reverted_inputs() {
        let mut cs = Changeset::new();
        cs.push(InputChange::PopulationCeiling { old: 10, new: 500 });
        cs.push(InputChange::PopulationCeiling { old: 500, new: 10 });
        cs.push(InputChange::InterestVariable {
            old: InterestVariable::TotalCases,
            new: InterestVariable::TotalDeaths,
        });

        cs.coalesce();

        assert_eq!(cs.len(), 1);
        assert!(cs.changes()[0].keeps_record_set());

        cs.push(InputChange::InterestVariable {
            old: InterestVariable::TotalDeaths,
            new: InterestVariable::TotalCases,
        });
        cs.coalesce();
        assert!(cs.is_empty());
    }

    #[test]
    fn test_input_ids_match_page_ids() {
        assert_eq!(
            serde_json::to_string(&InputId::PopulationSlider).unwrap(),
            "\"population-slider\""
        );
        assert_eq!(
            serde_json::to_string(&InputId::InterestVariable).unwrap(),
            "\"interest-variable\""
        );
    }
}
