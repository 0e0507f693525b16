//! Tabular record types for the tree inventory CSV tables.

use serde::{Deserialize, Serialize};

/// One raw row of the source inventory CSV.
///
/// Free-text fields are optional: the source data is sparsely populated and
/// null handling happens downstream. Columns not listed here are ignored on
/// read.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeRecord {
    #[serde(rename = "Id")]
    pub id: String,

    /// Easting in the target planar CRS.
    #[serde(default)]
    pub x: Option<f64>,
    /// Northing in the target planar CRS.
    #[serde(default)]
    pub y: Option<f64>,

    #[serde(rename = "Species", default)]
    pub species: Option<String>,
    #[serde(rename = "TreeForm", default)]
    pub tree_form: Option<String>,
    #[serde(rename = "RecorderOrganisationName", default)]
    pub recorder_organisation_name: Option<String>,
    #[serde(rename = "LocalName", default)]
    pub local_name: Option<String>,

    // Legacy location columns, superseded by the region assignment.
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(rename = "County", default)]
    pub county: Option<String>,
    #[serde(rename = "Town", default)]
    pub town: Option<String>,

    #[serde(rename = "StandingStatus", default)]
    pub standing_status: Option<String>,
    #[serde(rename = "LivingStatus", default)]
    pub living_status: Option<String>,
    #[serde(rename = "PublicAccessibilityStatus", default)]
    pub public_accessibility_status: Option<String>,
    #[serde(rename = "VeteranStatus", default)]
    pub veteran_status: Option<String>,

    // Multi-valued marker columns, pivoted into the marker table.
    #[serde(rename = "Condition", default)]
    pub condition: Option<String>,
    #[serde(rename = "Surroundings", default)]
    pub surroundings: Option<String>,
    #[serde(rename = "Protection", default)]
    pub protection: Option<String>,
    #[serde(rename = "SpecialStatus", default)]
    pub special_status: Option<String>,
    #[serde(rename = "Epiphyte", default)]
    pub epiphyte: Option<String>,
    #[serde(rename = "Fungus", default)]
    pub fungus: Option<String>,

    #[serde(rename = "SurveyDate", default)]
    pub survey_date: Option<String>,
    #[serde(rename = "VerifiedDate", default)]
    pub verified_date: Option<String>,
}

/// The multi-valued marker columns of the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerColumn {
    Protection,
    Epiphyte,
    Fungus,
    Condition,
    SpecialStatus,
    Surroundings,
}

impl MarkerColumn {
    /// All marker columns, in the order they appear in the marker table.
    pub fn all() -> &'static [MarkerColumn] {
        &[
            MarkerColumn::Protection,
            MarkerColumn::Epiphyte,
            MarkerColumn::Fungus,
            MarkerColumn::Condition,
            MarkerColumn::SpecialStatus,
            MarkerColumn::Surroundings,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColumn::Protection => "Protection",
            MarkerColumn::Epiphyte => "Epiphyte",
            MarkerColumn::Fungus => "Fungus",
            MarkerColumn::Condition => "Condition",
            MarkerColumn::SpecialStatus => "SpecialStatus",
            MarkerColumn::Surroundings => "Surroundings",
        }
    }

    /// The raw value of this column on a record.
    pub fn value<'a>(&self, record: &'a TreeRecord) -> Option<&'a str> {
        let field = match self {
            MarkerColumn::Protection => &record.protection,
            MarkerColumn::Epiphyte => &record.epiphyte,
            MarkerColumn::Fungus => &record.fungus,
            MarkerColumn::Condition => &record.condition,
            MarkerColumn::SpecialStatus => &record.special_status,
            MarkerColumn::Surroundings => &record.surroundings,
        };
        field.as_deref()
    }
}

/// One row of the long-format marker table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerRow {
    pub id: String,
    pub variable: String,
    pub value: String,
}

/// One row of the cleaned base table.
///
/// Legacy location columns and the raw marker columns are dropped; region
/// attributes and derived groupings are carried instead.
#[derive(Debug, Clone, Serialize)]
pub struct BaseRecord {
    pub id: String,
    pub species: String,
    pub species_group: String,
    pub tree_form: String,
    pub recorder_organisation_name: String,
    pub local_name: String,

    pub region_id: String,
    pub region_name: String,
    pub country: String,
    pub country_high_level: String,

    pub standing_status: String,
    pub living_status: String,
    pub living_group: String,
    pub ash_dieback: String,
    pub public_accessibility_status: String,
    pub public_accessibility_group: String,
    pub veteran_status: String,

    pub survey_date: String,
    pub verified_date: String,

    pub protection_flag: u8,
    pub epiphyte_flag: u8,
    pub fungus_flag: u8,
    pub condition_flag: u8,
    pub special_status_flag: u8,
    pub surroundings_flag: u8,
}
