use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;

use rollstock_core::{DomainError, DomainResult};
use rollstock_inventory::{NewRoll, Roll, RollFilter, StatsWindow};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRollRequest {
    pub length: f64,
    pub weight: f64,
}

impl CreateRollRequest {
    pub fn into_new_roll(self) -> DomainResult<NewRoll> {
        NewRoll::new(self.length, self.weight)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRollsQuery {
    pub id_range: Option<String>,
    pub weight_range: Option<String>,
    pub length_range: Option<String>,
    pub added_date_range: Option<String>,
    pub removed_date_range: Option<String>,
}

impl ListRollsQuery {
    pub fn to_filter(&self) -> DomainResult<RollFilter> {
        RollFilter::from_query(
            self.id_range.as_deref(),
            self.weight_range.as_deref(),
            self.length_range.as_deref(),
            self.added_date_range.as_deref(),
            self.removed_date_range.as_deref(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl StatsQuery {
    /// Both bounds are required. A bare date starts at midnight for
    /// `start_date` and covers the whole day for `end_date`.
    pub fn to_window(&self) -> DomainResult<StatsWindow> {
        let start = required("start_date", self.start_date.as_deref())?;
        let end = required("end_date", self.end_date.as_deref())?;

        StatsWindow::new(
            parse_timestamp("start_date", start, DayBound::Start)?,
            parse_timestamp("end_date", end, DayBound::End)?,
        )
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> DomainResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(format!("{field} is required")))
}

/// Which end of a calendar day a bare date stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC), or a
/// bare `YYYY-MM-DD`.
pub fn parse_timestamp(field: &str, raw: &str, bound: DayBound) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        DomainError::validation(format!("{field}: expected an ISO 8601 date or timestamp, got `{raw}`"))
    })?;

    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| DomainError::invariant("end of day is representable"))?,
    };
    Ok(date.and_time(time).and_utc())
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn roll_to_json(roll: &Roll) -> serde_json::Value {
    serde_json::json!({
        "id": roll.id.get(),
        "length": roll.length,
        "weight": roll.weight,
        "added_date": roll.added_date.to_rfc3339(),
        "removed_date": roll.removed_date.map(|d| d.to_rfc3339()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_supported_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        for raw in [
            "2023-01-02T03:04:05Z",
            "2023-01-02T05:04:05+02:00",
            "2023-01-02T03:04:05",
            "2023-01-02 03:04:05",
            "2023-01-02T03:04:05.000",
        ] {
            assert_eq!(parse_timestamp("start_date", raw, DayBound::Start).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn bare_dates_expand_to_day_bounds() {
        let start = parse_timestamp("start_date", "2023-01-01", DayBound::Start).unwrap();
        let end = parse_timestamp("end_date", "2023-01-01", DayBound::End).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end.date_naive(), start.date_naive());
        assert!(end > Utc.with_ymd_and_hms(2023, 1, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        let err = parse_timestamp("end_date", "yesterday", DayBound::End).unwrap_err();
        assert!(err.to_string().contains("end_date"));
    }

    #[test]
    fn stats_query_requires_both_bounds_in_order() {
        let missing = StatsQuery {
            start_date: Some("2023-01-01".into()),
            end_date: None,
        };
        assert!(missing.to_window().unwrap_err().to_string().contains("end_date is required"));

        let inverted = StatsQuery {
            start_date: Some("2023-02-01".into()),
            end_date: Some("2023-01-01".into()),
        };
        assert!(matches!(inverted.to_window(), Err(DomainError::Validation(_))));

        let same_day = StatsQuery {
            start_date: Some("2023-01-01".into()),
            end_date: Some("2023-01-01".into()),
        };
        assert!(same_day.to_window().is_ok());
    }

    #[test]
    fn roll_json_uses_null_for_active_rolls() {
        let roll = Roll {
            id: rollstock_core::RollId::new(1),
            length: 10.5,
            weight: 200.0,
            added_date: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            removed_date: None,
        };
        let json = roll_to_json(&roll);
        assert_eq!(json["id"], 1);
        assert_eq!(json["length"], 10.5);
        assert!(json["removed_date"].is_null());
        assert_eq!(json["added_date"], "2023-01-01T00:00:00+00:00");
    }
}
