//! Period statistics over roll occupancy.
//!
//! A roll is "in stock" on every calendar day from its `added_date` through its
//! `removed_date` (or the caller-supplied as-of instant while it is still
//! active). The engine expands each roll over those days, accumulates per-day
//! presence counts and weights, and summarizes the admitted rolls.
//!
//! The engine never reads the clock: callers pass `as_of` explicitly so that
//! the same snapshot always yields the same report.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use rollstock_core::{DomainError, DomainResult};

use crate::roll::Roll;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// No roll falls inside the requested window.
    #[error("no rolls found in this period")]
    NoData,

    /// None of the admitted rolls has been removed, so durations are undefined.
    #[error("no removed rolls in this period")]
    NoDurationData,
}

/// Inclusive `[start, end]` reporting window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatsWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl StatsWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation("start_date must not be after end_date"));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Added inside the window and, if removed, removed no later than its end.
    pub fn admits(&self, roll: &Roll) -> bool {
        roll.added_date >= self.start
            && roll.added_date <= self.end
            && roll.removed_date.is_none_or(|removed| removed <= self.end)
    }
}

/// Per-day presence counts and weight totals, ordered by calendar day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyOccupancy {
    counts: BTreeMap<NaiveDate, u32>,
    weights: BTreeMap<NaiveDate, f64>,
}

impl DailyOccupancy {
    pub fn from_rolls<'a>(rolls: impl IntoIterator<Item = &'a Roll>, as_of: DateTime<Utc>) -> Self {
        let mut occupancy = Self::default();
        for roll in rolls {
            occupancy.record(roll, as_of);
        }
        occupancy
    }

    /// Add one roll to every calendar day it spans.
    pub fn record(&mut self, roll: &Roll, as_of: DateTime<Utc>) {
        let first = roll.added_date.date_naive();
        let last = roll.removed_date.unwrap_or(as_of).date_naive();

        let mut day = first;
        while day <= last {
            *self.counts.entry(day).or_insert(0) += 1;
            *self.weights.entry(day).or_insert(0.0) += roll.weight;
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
    }

    pub fn counts(&self) -> &BTreeMap<NaiveDate, u32> {
        &self.counts
    }

    pub fn weights(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.weights
    }

    pub fn count_on(&self, day: NaiveDate) -> u32 {
        self.counts.get(&day).copied().unwrap_or(0)
    }

    pub fn weight_on(&self, day: NaiveDate) -> f64 {
        self.weights.get(&day).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn min_count_day(&self) -> Option<NaiveDate> {
        extreme_day(&self.counts, |candidate, best| candidate < best)
    }

    pub fn max_count_day(&self) -> Option<NaiveDate> {
        extreme_day(&self.counts, |candidate, best| candidate > best)
    }

    pub fn min_weight_day(&self) -> Option<NaiveDate> {
        extreme_day(&self.weights, |candidate, best| candidate < best)
    }

    pub fn max_weight_day(&self) -> Option<NaiveDate> {
        extreme_day(&self.weights, |candidate, best| candidate > best)
    }
}

/// Earliest day holding the extreme value: days are visited in ascending
/// order and only a strictly better value replaces the current pick.
fn extreme_day<V: Copy>(
    values: &BTreeMap<NaiveDate, V>,
    better: impl Fn(V, V) -> bool,
) -> Option<NaiveDate> {
    let mut best: Option<(NaiveDate, V)> = None;
    for (&day, &value) in values {
        match best {
            Some((_, current)) if !better(value, current) => {}
            _ => best = Some((day, value)),
        }
    }
    best.map(|(day, _)| day)
}

/// Shortest and longest stay, in whole days, among removed rolls.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DurationRange {
    pub min: i64,
    pub max: i64,
}

pub fn duration_range<'a>(rolls: impl IntoIterator<Item = &'a Roll>) -> Result<DurationRange, StatsError> {
    rolls
        .into_iter()
        .filter_map(Roll::duration_days)
        .fold(None, |acc: Option<DurationRange>, days| {
            Some(match acc {
                None => DurationRange { min: days, max: days },
                Some(r) => DurationRange {
                    min: r.min.min(days),
                    max: r.max.max(days),
                },
            })
        })
        .ok_or(StatsError::NoDurationData)
}

/// Flat statistics report for one window.
///
/// Duration fields are `None` when no admitted roll has been removed; day
/// fields are `None` only if no admitted roll spans a day up to `as_of`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub added_count: usize,
    pub removed_count: usize,
    pub avg_length: f64,
    pub avg_weight: f64,
    pub max_length: f64,
    pub min_length: f64,
    pub max_weight: f64,
    pub min_weight: f64,
    pub total_weight: f64,
    pub max_duration: Option<i64>,
    pub min_duration: Option<i64>,
    pub min_count_day: Option<NaiveDate>,
    pub max_count_day: Option<NaiveDate>,
    pub min_weight_day: Option<NaiveDate>,
    pub max_weight_day: Option<NaiveDate>,
}

/// Compute the report for `window` over the rolls it admits.
pub fn compute_stats(
    rolls: &[Roll],
    window: &StatsWindow,
    as_of: DateTime<Utc>,
) -> Result<StatsReport, StatsError> {
    let admitted: Vec<&Roll> = rolls.iter().filter(|r| window.admits(r)).collect();
    let Some(first) = admitted.first() else {
        return Err(StatsError::NoData);
    };

    let occupancy = DailyOccupancy::from_rolls(admitted.iter().copied(), as_of);

    let mut total_length = 0.0;
    let mut total_weight = 0.0;
    let (mut min_length, mut max_length) = (first.length, first.length);
    let (mut min_weight, mut max_weight) = (first.weight, first.weight);
    for roll in &admitted {
        total_length += roll.length;
        total_weight += roll.weight;
        min_length = min_length.min(roll.length);
        max_length = max_length.max(roll.length);
        min_weight = min_weight.min(roll.weight);
        max_weight = max_weight.max(roll.weight);
    }

    let durations = duration_range(admitted.iter().copied()).ok();
    let n = admitted.len() as f64;

    Ok(StatsReport {
        added_count: admitted.iter().filter(|r| r.added_date >= window.start).count(),
        removed_count: admitted
            .iter()
            .filter(|r| r.removed_date.is_some_and(|removed| removed <= window.end))
            .count(),
        avg_length: total_length / n,
        avg_weight: total_weight / n,
        max_length,
        min_length,
        max_weight,
        min_weight,
        total_weight,
        max_duration: durations.map(|d| d.max),
        min_duration: durations.map(|d| d.min),
        min_count_day: occupancy.min_count_day(),
        max_count_day: occupancy.max_count_day(),
        min_weight_day: occupancy.min_weight_day(),
        max_weight_day: occupancy.max_weight_day(),
    })
}
