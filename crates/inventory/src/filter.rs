//! Range filters for listing rolls.
//!
//! Query strings use `min-max` for numbers (`1-10`, `100.5-200`) and
//! `YYYY-MM-DD-YYYY-MM-DD` (or `YYYY-MM-DD..YYYY-MM-DD`) for dates. All bounds
//! are inclusive.

use core::cmp::Ordering;
use core::fmt::Display;
use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use rollstock_core::{DomainError, DomainResult};

use crate::roll::Roll;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[min, max]` range.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    min: T,
    max: T,
}

impl<T: PartialOrd + Copy> Range<T> {
    pub fn new(min: T, max: T) -> DomainResult<Self> {
        match min.partial_cmp(&max) {
            Some(Ordering::Less | Ordering::Equal) => Ok(Self { min, max }),
            Some(Ordering::Greater) => Err(DomainError::validation("range min must not exceed max")),
            None => Err(DomainError::validation("range bounds are not comparable")),
        }
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Parse a numeric `min-max` range.
pub fn parse_range<T>(field: &str, raw: &str) -> DomainResult<Range<T>>
where
    T: FromStr + PartialOrd + Copy,
    T::Err: Display,
{
    let (lo, hi) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| DomainError::validation(format!("{field}: expected `min-max`, got `{raw}`")))?;

    let parse = |s: &str| {
        s.trim()
            .parse::<T>()
            .map_err(|e| DomainError::validation(format!("{field}: invalid bound `{s}`: {e}")))
    };

    Range::new(parse(lo)?, parse(hi)?)
        .map_err(|e| DomainError::validation(format!("{field}: {e}")))
}

/// Parse a calendar-date range.
pub fn parse_date_range(field: &str, raw: &str) -> DomainResult<Range<NaiveDate>> {
    let raw = raw.trim();
    let (lo, hi) = match raw.split_once("..") {
        Some(parts) => parts,
        // `YYYY-MM-DD-YYYY-MM-DD`: the separator is the dash right after the first date.
        None if raw.len() == 21 && raw.as_bytes()[10] == b'-' => (&raw[..10], &raw[11..]),
        None => {
            return Err(DomainError::validation(format!(
                "{field}: expected `YYYY-MM-DD-YYYY-MM-DD`, got `{raw}`"
            )));
        }
    };

    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|e| DomainError::validation(format!("{field}: invalid date `{s}`: {e}")))
    };

    Range::new(parse(lo)?, parse(hi)?)
        .map_err(|e| DomainError::validation(format!("{field}: {e}")))
}

/// Conjunction of optional range filters over roll attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollFilter {
    pub id: Option<Range<i64>>,
    pub weight: Option<Range<f64>>,
    pub length: Option<Range<f64>>,
    pub added: Option<Range<NaiveDate>>,
    pub removed: Option<Range<NaiveDate>>,
}

impl RollFilter {
    /// Build a filter from raw query-string values.
    pub fn from_query(
        id_range: Option<&str>,
        weight_range: Option<&str>,
        length_range: Option<&str>,
        added_date_range: Option<&str>,
        removed_date_range: Option<&str>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: id_range.map(|s| parse_range("id_range", s)).transpose()?,
            weight: weight_range.map(|s| parse_range("weight_range", s)).transpose()?,
            length: length_range.map(|s| parse_range("length_range", s)).transpose()?,
            added: added_date_range
                .map(|s| parse_date_range("added_date_range", s))
                .transpose()?,
            removed: removed_date_range
                .map(|s| parse_date_range("removed_date_range", s))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.weight.is_none()
            && self.length.is_none()
            && self.added.is_none()
            && self.removed.is_none()
    }

    /// Every present range must contain the roll's value. An active roll never
    /// matches a removed-date range.
    pub fn matches(&self, roll: &Roll) -> bool {
        if let Some(r) = &self.id {
            if !r.contains(roll.id.get()) {
                return false;
            }
        }
        if let Some(r) = &self.weight {
            if !r.contains(roll.weight) {
                return false;
            }
        }
        if let Some(r) = &self.length {
            if !r.contains(roll.length) {
                return false;
            }
        }
        if let Some(r) = &self.added {
            if !r.contains(roll.added_date.date_naive()) {
                return false;
            }
        }
        if let Some(r) = &self.removed {
            match roll.removed_date {
                Some(removed) if r.contains(removed.date_naive()) => {}
                _ => return false,
            }
        }
        true
    }
}
