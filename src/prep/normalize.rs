//! Attribute normalization: null-filling, presence flags and value grouping.

use crate::models::{Assignment, BaseRecord, MarkerColumn, TreeRecord};
use crate::prep::dates;

/// Higher-level species keywords. When a species name mentions one of these,
/// the record is grouped under it.
const SPECIES_GROUPS: &[&str] = &[
    "oak", "beech", "cedar", "lime", "walnut", "ash", "alder", "hawthorn", "willow", "larch",
    "elm", "poplar", "cherry", "service", "apple", "juniper", "mulberry", "birch", "sycamore",
    "maple", "chestnut", "pear", "plane", "cypress", "plum", "yew", "laburnum", "pine",
    "whitebeam", "fir", "buckthorn",
];

/// Null-fill a free-text field with the designated filler.
pub fn fill_unknown(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() && v.trim() != "nan" => v.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// 1 when the raw field is populated, 0 when null. Computed before
/// null-filling so the filler never counts as presence.
pub fn presence_flag(value: Option<&str>) -> u8 {
    match value {
        Some(v) if !v.trim().is_empty() && v.trim() != "nan" => 1,
        _ => 0,
    }
}

/// Group a raw species name under a higher-level keyword.
///
/// Matching keywords are taken in name order; with more than one match the
/// last wins, since the trailing word is generally the actual tree type
/// rather than the variant ("mountain ash" groups under ash). Names with no
/// matching keyword pass through raw. The result is capitalized.
pub fn species_group(species: &str) -> String {
    let lowered = species.to_lowercase();
    let matches: Vec<&str> = lowered
        .split_whitespace()
        .filter(|word| SPECIES_GROUPS.contains(word))
        .collect();

    let chosen = match matches.last() {
        Some(word) => word,
        None => lowered.as_str(),
    };
    capitalize(chosen)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Roll the free-text living status up to Alive/Dead/Unknown.
pub fn living_group(living_status: &str) -> &'static str {
    let lowered = living_status.to_lowercase();
    if lowered.contains("alive") {
        "Alive"
    } else if lowered.contains("dead") {
        "Dead"
    } else {
        "Unknown"
    }
}

/// Ash dieback status from the living-status text.
///
/// "Chalara fraxinea" mentions are split into confirmed and suspected; ash
/// records without a mention are Unknown; non-ash records are not applicable.
pub fn ash_dieback(living_status: &str, species_group: &str) -> &'static str {
    let lowered = living_status.to_lowercase();
    if lowered.contains("chalara fraxinea") {
        if lowered.contains("confirmed") {
            "Confirmed"
        } else {
            "Suspected"
        }
    } else if species_group.contains("Ash") {
        "Unknown"
    } else {
        "N/A"
    }
}

/// Roll public accessibility up to Public/Private/Unknown via its first word.
pub fn accessibility_group(status: &str) -> String {
    let first = status.split_whitespace().next().unwrap_or("");
    match first {
        "Public" | "Private" => first.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// Compose the cleaned base-table row for one record.
pub fn build_base_record(record: &TreeRecord, assignment: &Assignment) -> BaseRecord {
    let species = fill_unknown(record.species.as_deref());
    let species_group = species_group(&species);
    let living_status = fill_unknown(record.living_status.as_deref());
    let public_accessibility_status = fill_unknown(record.public_accessibility_status.as_deref());

    BaseRecord {
        id: record.id.clone(),
        species_group: species_group.clone(),
        species,
        tree_form: fill_unknown(record.tree_form.as_deref()),
        recorder_organisation_name: fill_unknown(record.recorder_organisation_name.as_deref()),
        local_name: fill_unknown(record.local_name.as_deref()),

        region_id: assignment.region_id.clone(),
        region_name: assignment.region_name.clone(),
        country: assignment.country.clone(),
        country_high_level: assignment.country_high_level.clone(),

        living_group: living_group(&living_status).to_string(),
        ash_dieback: ash_dieback(&living_status, &species_group).to_string(),
        standing_status: fill_unknown(record.standing_status.as_deref()),
        public_accessibility_group: accessibility_group(&public_accessibility_status),
        public_accessibility_status,
        living_status,
        veteran_status: fill_unknown(record.veteran_status.as_deref()),

        survey_date: dates::reformat_or_sentinel(record.survey_date.as_deref()),
        verified_date: dates::reformat_or_sentinel(record.verified_date.as_deref()),

        protection_flag: presence_flag(MarkerColumn::Protection.value(record)),
        epiphyte_flag: presence_flag(MarkerColumn::Epiphyte.value(record)),
        fungus_flag: presence_flag(MarkerColumn::Fungus.value(record)),
        condition_flag: presence_flag(MarkerColumn::Condition.value(record)),
        special_status_flag: presence_flag(MarkerColumn::SpecialStatus.value(record)),
        surroundings_flag: presence_flag(MarkerColumn::Surroundings.value(record)),
    }
}
