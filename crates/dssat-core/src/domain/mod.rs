pub mod errors;

pub use errors::{DssatError, DssatErrorCategory, DssatResult};

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropKind {
    Rice,
}

impl CropKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rice => "rice",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("rice") {
            Some(Self::Rice)
        } else {
            None
        }
    }
}

impl Display for CropKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// One scheduled irrigation application.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct IrrigationEvent {
    pub date: NaiveDate,
    pub amount: f64,
}

/// One scheduled fertilizer application. Amount and nitrogen percent are
/// whole numbers; the control-file grammar has no fractional columns for
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FertilizerEvent {
    pub date: NaiveDate,
    pub amount: u32,
    #[serde(rename = "nitrogenPercent")]
    pub nitrogen_percent: u32,
}

/// Volumetric soil-moisture input for an ensemble: either one value
/// shared by every member and layer, or one per-layer list per member.
/// Shorter per-member inputs are cycled to fill the ensemble.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MoistureInput {
    Single(f64),
    PerMember(Vec<Vec<f64>>),
}

impl MoistureInput {
    pub fn fill(&self, ensemble_count: usize, layer_count: usize) -> Vec<Vec<f64>> {
        match self {
            Self::Single(value) => vec![vec![*value; layer_count]; ensemble_count],
            Self::PerMember(members) => cycle_to_length(members, ensemble_count),
        }
    }
}

pub(crate) fn cycle_to_length<T: Clone>(items: &[T], length: usize) -> Vec<T> {
    if items.is_empty() {
        return Vec::new();
    }
    items.iter().cloned().cycle().take(length).collect()
}

/// Rejects schema names that cannot be spliced into a query as an
/// identifier. Schema names come from configuration, not user input, but
/// they cannot be bound as parameters either.
pub fn schema_identifier(schema: &str) -> DssatResult<&str> {
    let valid = !schema.is_empty()
        && schema
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !schema.chars().next().is_some_and(|c| c.is_ascii_digit());
    if valid {
        Ok(schema)
    } else {
        Err(DssatError::input_validation(
            "INPUT.SCHEMA_IDENTIFIER",
            format!("'{schema}' is not a valid schema identifier"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{CropKind, MoistureInput, cycle_to_length, schema_identifier};

    #[test]
    fn crop_names_roundtrip() {
        assert_eq!(CropKind::from_name("rice"), Some(CropKind::Rice));
        assert_eq!(CropKind::from_name("RICE"), Some(CropKind::Rice));
        assert_eq!(CropKind::from_name("maize"), None);
        assert_eq!(CropKind::Rice.to_string(), "rice");
    }

    #[test]
    fn single_moisture_value_replicates_across_all_members() {
        let input = MoistureInput::Single(0.25);
        let slots = input.fill(3, 2);
        assert_eq!(slots, vec![vec![0.25, 0.25]; 3]);
    }

    #[test]
    fn short_per_member_moisture_cycles_to_ensemble_count() {
        let input = MoistureInput::PerMember(vec![vec![0.2], vec![0.4]]);
        let slots = input.fill(5, 1);
        assert_eq!(
            slots,
            vec![vec![0.2], vec![0.4], vec![0.2], vec![0.4], vec![0.2]]
        );
    }

    #[test]
    fn cycling_an_empty_list_yields_nothing() {
        let empty: Vec<f64> = Vec::new();
        assert!(cycle_to_length(&empty, 4).is_empty());
    }

    #[test]
    fn schema_identifiers_are_validated() {
        assert!(schema_identifier("rheas").is_ok());
        assert!(schema_identifier("basin_01").is_ok());
        assert!(schema_identifier("").is_err());
        assert!(schema_identifier("1basin").is_err());
        assert!(schema_identifier("bad-name; drop").is_err());
    }
}
