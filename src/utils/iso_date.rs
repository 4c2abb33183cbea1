//! Calendar dates on the wire as `YYYY-MM-DD`, the format of an HTML date input.
//!
//! Use with `#[serde(with = "crate::utils::iso_date")]`, or the `option`
//! submodule for optional fields, where a blank string reads as absent.

use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

pub use calendar_date::{deserialize, serialize};

const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Render a date as `YYYY-MM-DD`
pub fn format(date: Date) -> String {
    date.format(FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), FORMAT)
}

pub mod option {
    use serde::{de::Error as _, Deserialize, Deserializer};
    use time::Date;

    pub use super::calendar_date::option::serialize;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => super::parse(&raw)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", raw, e))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format(date!(2024 - 03 - 05)), "2024-03-05");
    }

    #[test]
    fn parses_form_input() {
        assert_eq!(parse(" 2024-12-31 ").unwrap(), date!(2024 - 12 - 31));
        assert!(parse("2024-02-30").is_err());
        assert!(parse("31/12/2024").is_err());
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct Loan {
        #[serde(with = "super")]
        lent: Date,
        #[serde(default, with = "super::option")]
        due: Option<Date>,
    }

    #[test]
    fn blank_optional_date_is_absent() {
        let loan: Loan = serde_json::from_str(r#"{"lent": "2025-01-01", "due": ""}"#).unwrap();
        assert_eq!(loan.due, None);
        let loan: Loan = serde_json::from_str(r#"{"lent": "2025-01-01"}"#).unwrap();
        assert_eq!(loan.due, None);
        let loan: Loan =
            serde_json::from_str(r#"{"lent": "2025-01-01", "due": "2025-01-02"}"#).unwrap();
        assert_eq!(loan.due, Some(date!(2025 - 01 - 02)));
    }

    #[test]
    fn serializes_both_shapes_as_calendar_dates() {
        let loan = Loan {
            lent: date!(2025 - 01 - 01),
            due: Some(date!(2025 - 01 - 15)),
        };
        assert_eq!(
            serde_json::to_value(&loan).unwrap(),
            serde_json::json!({ "lent": "2025-01-01", "due": "2025-01-15" })
        );
        assert!(serde_json::from_str::<Loan>(r#"{"lent": "01/01/2025"}"#).is_err());
    }
}
