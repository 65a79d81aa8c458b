//! Declarative page layout: title, input controls and graph slots.
//!
//! The layout is computed once from the base table and served as JSON; the
//! page builds its widgets from it.

use crate::chart::{label_for, InterestVariable, LabelContext};
use crate::changeset::InputId;
use crate::dataset::POPULATION;
use crate::reactive::OutputId;
use crate::table::Table;
use serde::Serialize;

pub const PAGE_TITLE: &str = "Studying The Pandemic Worldwide";
pub const BACKGROUND_COLOR: &str = "#FFFFFF";
pub const TEXT_COLOR: &str = "#7FDBFF";

pub const POPULATION_STEP: i64 = 100_000_000;

/// Labelled tick marks shown under the population slider.
pub const POPULATION_MARKS: [(i64, &str); 7] = [
    (72_037, "72K"),
    (80_000_000, "80M"),
    (150_000_000, "150M"),
    (300_000_000, "300M"),
    (700_000_000, "700M"),
    (1_000_000_000, "1B"),
    (1_439_323_776, "1.4B"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderMark {
    pub value: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderSpec {
    pub id: InputId,
    pub label: String,
    pub min: i64,
    pub max: i64,
    pub step: i64,
    pub value: i64,
    pub marks: Vec<SliderMark>,
    pub update_mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: InterestVariable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownSpec {
    pub id: InputId,
    pub label: String,
    pub options: Vec<DropdownOption>,
    pub value: InterestVariable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotWidth {
    Full,
    Half,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSlot {
    pub id: OutputId,
    pub width: SlotWidth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub title: String,
    pub background_color: String,
    pub text_color: String,
    pub slider: SliderSpec,
    pub dropdown: DropdownSpec,
    pub graphs: Vec<GraphSlot>,
}

/// Smallest population in the table, or 0 for an empty table.
pub fn min_population(table: &Table) -> i64 {
    table.min_i64(POPULATION).unwrap_or(0)
}

pub fn max_population(table: &Table) -> i64 {
    table.max_i64(POPULATION).unwrap_or(0)
}

pub fn population_slider(base: &Table) -> SliderSpec {
    let min = min_population(base);
    SliderSpec {
        id: InputId::PopulationSlider,
        label: "Population".to_string(),
        min,
        max: max_population(base),
        step: POPULATION_STEP,
        value: min,
        marks: POPULATION_MARKS
            .iter()
            .map(|(value, label)| SliderMark {
                value: *value,
                label: label.to_string(),
            })
            .collect(),
        update_mode: "drag".to_string(),
    }
}

pub fn interest_dropdown() -> DropdownSpec {
    DropdownSpec {
        id: InputId::InterestVariable,
        label: "Interest Variable".to_string(),
        options: InterestVariable::ALL
            .iter()
            .map(|v| DropdownOption {
                label: label_for(*v, LabelContext::BarAxis).to_string(),
                value: *v,
            })
            .collect(),
        value: InterestVariable::default(),
    }
}

pub fn page_layout(base: &Table) -> PageLayout {
    PageLayout {
        title: PAGE_TITLE.to_string(),
        background_color: BACKGROUND_COLOR.to_string(),
        text_color: TEXT_COLOR.to_string(),
        slider: population_slider(base),
        dropdown: interest_dropdown(),
        graphs: vec![
            GraphSlot {
                id: OutputId::EducationScatter,
                width: SlotWidth::Full,
            },
            GraphSlot {
                id: OutputId::IncomeBar,
                width: SlotWidth::Half,
            },
            GraphSlot {
                id: OutputId::CountryBar,
                width: SlotWidth::Half,
            },
        ],
    }
}
