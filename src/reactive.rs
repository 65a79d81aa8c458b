//! Reactive binding layer.
//!
//! Each output declares the inputs it reads in a static dependency table.
//! Input events are recorded in a `Changeset`; `flush` takes one snapshot of
//! the interaction state, filters the base table once, and re-renders only the
//! outputs whose inputs changed. Rendering is a pure function of the base
//! table and the snapshot.

use crate::changeset::{Changeset, DependentOutput, InputChange, InputId};
use crate::chart::{country_bar_chart, income_bar_chart, scatter_chart, ChartSpec, InterestVariable};
use crate::controls::min_population;
use crate::table::Table;
use crate::transform::{aggregate_by_income, exclude_outliers, filter_by_population, outlier_set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identifies one of the three chart slots on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputId {
    #[serde(rename = "covid-vs-edu")]
    EducationScatter,
    #[serde(rename = "covid-vs-income")]
    IncomeBar,
    #[serde(rename = "covid-vs-income2")]
    CountryBar,
}

/// Current values of the two inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub population_ceiling: i64,
    pub interest_variable: InterestVariable,
}

impl InteractionState {
    /// Slider at the smallest population, dropdown on total cases.
    pub fn initial(base: &Table) -> Self {
        InteractionState {
            population_ceiling: min_population(base),
            interest_variable: InterestVariable::default(),
        }
    }
}

/// A new value for one input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputValue {
    Population(i64),
    Interest(InterestVariable),
}

type RenderFn = fn(&Table, InterestVariable) -> ChartSpec;

/// One row of the dependency table.
pub struct OutputBinding {
    pub output: OutputId,
    pub inputs: &'static [InputId],
    render: RenderFn,
}

impl OutputBinding {
    /// Renders from a table already filtered by population.
    pub fn render(&self, filtered: &Table, interest: InterestVariable) -> ChartSpec {
        (self.render)(filtered, interest)
    }
}

impl DependentOutput for OutputBinding {
    fn inputs(&self) -> &[InputId] {
        self.inputs
    }
}

const POPULATION_AND_INTEREST: &[InputId] = &[InputId::PopulationSlider, InputId::InterestVariable];

fn render_income_bar(filtered: &Table, interest: InterestVariable) -> ChartSpec {
    income_bar_chart(&aggregate_by_income(filtered), interest)
}

pub static BINDINGS: [OutputBinding; 3] = [
    OutputBinding {
        output: OutputId::EducationScatter,
        inputs: POPULATION_AND_INTEREST,
        render: scatter_chart,
    },
    OutputBinding {
        output: OutputId::IncomeBar,
        inputs: POPULATION_AND_INTEREST,
        render: render_income_bar,
    },
    OutputBinding {
        output: OutputId::CountryBar,
        inputs: POPULATION_AND_INTEREST,
        render: country_bar_chart,
    },
];

/// A freshly rendered chart for one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputUpdate {
    pub output: OutputId,
    pub figure: ChartSpec,
    pub generation: u64,
}

fn render_every(table: &Table, interest: InterestVariable) -> Vec<OutputUpdate> {
    BINDINGS
        .iter()
        .map(|binding| OutputUpdate {
            output: binding.output,
            figure: binding.render(table, interest),
            generation: 0,
        })
        .collect()
}

/// Renders every output from scratch for the given state.
pub fn render_all(base: &Arc<Table>, state: &InteractionState) -> Vec<OutputUpdate> {
    let filtered = filter_by_population(base, state.population_ceiling);
    render_every(&filtered, state.interest_variable)
}

/// The three charts over the whole dataset minus the outlier countries,
/// computed once at startup.
pub fn render_overview(base: &Arc<Table>) -> Vec<OutputUpdate> {
    let trimmed = exclude_outliers(base, &outlier_set());
    render_every(&trimmed, InterestVariable::default())
}

/// Per-session dashboard: interaction state plus the last figure of each slot.
pub struct Dashboard {
    base: Arc<Table>,
    state: InteractionState,
    /// Base records under the ceiling of the last render
    filtered: Table,
    outputs: BTreeMap<OutputId, ChartSpec>,
    changes: Changeset,
}

impl Dashboard {
    pub fn new(base: Arc<Table>) -> Self {
        let state = InteractionState::initial(&base);
        Self::with_state(base, state)
    }

    pub fn with_state(base: Arc<Table>, state: InteractionState) -> Self {
        let filtered = filter_by_population(&base, state.population_ceiling);
        let outputs = render_every(&filtered, state.interest_variable)
            .into_iter()
            .map(|update| (update.output, update.figure))
            .collect();
        Dashboard {
            base,
            state,
            filtered,
            outputs,
            changes: Changeset::new(),
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn output(&self, id: OutputId) -> Option<&ChartSpec> {
        self.outputs.get(&id)
    }

    /// Current figure of every slot, tagged with the current generation.
    pub fn snapshot(&self) -> Vec<OutputUpdate> {
        self.outputs
            .iter()
            .map(|(id, figure)| OutputUpdate {
                output: *id,
                figure: figure.clone(),
                generation: self.changes.generation(),
            })
            .collect()
    }

    pub fn generation(&self) -> u64 {
        self.changes.generation()
    }

    /// Records of the base table visible under the rendered ceiling.
    pub fn filtered(&self) -> &Table {
        &self.filtered
    }

    /// Updates one input. Returns false when the value is unchanged, in which
    /// case nothing is recorded.
    pub fn set_input(&mut self, value: InputValue) -> bool {
        let change = match value {
            InputValue::Population(new) if new != self.state.population_ceiling => {
                let old = std::mem::replace(&mut self.state.population_ceiling, new);
                InputChange::PopulationCeiling { old, new }
            }
            InputValue::Interest(new) if new != self.state.interest_variable => {
                let old = std::mem::replace(&mut self.state.interest_variable, new);
                InputChange::InterestVariable { old, new }
            }
            _ => return false,
        };
        log::debug!("Input changed: {:?}", change);
        self.changes.push(change);
        true
    }

    /// Re-renders the outputs affected by the net change of pending inputs.
    /// An input moved and then set back within one event counts as unchanged.
    pub fn flush(&mut self) -> Vec<OutputUpdate> {
        self.changes.coalesce();
        if self.changes.is_empty() {
            return Vec::new();
        }

        let snapshot = self.state;
        let refilter = !self
            .changes
            .changes()
            .iter()
            .all(InputChange::keeps_record_set);
        let changes = self.changes.drain();
        let generation = self.changes.generation();

        let affected: Vec<&OutputBinding> = BINDINGS
            .iter()
            .filter(|binding| binding.is_affected(&changes))
            .collect();
        if affected.is_empty() {
            return Vec::new();
        }

        if refilter {
            self.filtered = filter_by_population(&self.base, snapshot.population_ceiling);
        }
        log::debug!(
            "Recomputing {} output(s) over {} of {} records",
            affected.len(),
            self.filtered.len(),
            self.base.len()
        );

        let mut updates = Vec::with_capacity(affected.len());
        for binding in affected {
            let figure = binding.render(&self.filtered, snapshot.interest_variable);
            self.outputs.insert(binding.output, figure.clone());
            updates.push(OutputUpdate {
                output: binding.output,
                figure,
                generation,
            });
        }
        updates
    }

    /// Applies several input values as one event.
    pub fn apply(&mut self, values: impl IntoIterator<Item = InputValue>) -> Vec<OutputUpdate> {
        for value in values {
            self.set_input(value);
        }
        self.flush()
    }
}
