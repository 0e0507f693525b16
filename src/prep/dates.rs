//! Survey date reformatting.
//!
//! Source date fields are consistently `m/d/Y h:m:s AM` text; the cleaned
//! tables carry `d/m/Y`. Nulls map to a far-future sentinel so downstream
//! date parsing never sees an empty cell.

use chrono::NaiveDateTime;
use tracing::warn;

/// Sentinel carried for null or unparseable dates.
pub const NULL_DATE: &str = "31/12/9999";

const SOURCE_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";
const OUTPUT_FORMAT: &str = "%d/%m/%Y";

/// Reformat one source date value; `None` when it does not parse.
pub fn reformat(raw: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(raw.trim(), SOURCE_FORMAT)
        .ok()
        .map(|dt| dt.format(OUTPUT_FORMAT).to_string())
}

/// Reformat a possibly-null source date, substituting the sentinel for nulls
/// and (with a warning) for values that do not parse. Peripheral columns
/// never abort the run.
pub fn reformat_or_sentinel(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(value) if !value.trim().is_empty() && value.trim() != "nan" => value,
        _ => return NULL_DATE.to_string(),
    };
    match reformat(raw) {
        Some(formatted) => formatted,
        None => {
            warn!("Unparseable date '{raw}', substituting {NULL_DATE}");
            NULL_DATE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reformats_us_style_dates() {
        assert_eq!(
            reformat("3/14/2019 12:00:00 AM").as_deref(),
            Some("14/03/2019")
        );
        assert_eq!(
            reformat("12/31/9999 12:00:00 AM").as_deref(),
            Some("31/12/9999")
        );
    }

    #[test]
    fn nulls_become_sentinel() {
        assert_eq!(reformat_or_sentinel(None), NULL_DATE);
        assert_eq!(reformat_or_sentinel(Some("")), NULL_DATE);
        assert_eq!(reformat_or_sentinel(Some("nan")), NULL_DATE);
    }

    #[test]
    fn unparseable_becomes_sentinel() {
        assert_eq!(reformat_or_sentinel(Some("not a date")), NULL_DATE);
        // Day/month transposed beyond range.
        assert_eq!(reformat_or_sentinel(Some("31/12/2019 12:00:00 AM")), NULL_DATE);
    }
}
