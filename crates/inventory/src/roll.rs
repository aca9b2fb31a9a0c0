use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rollstock_core::{DomainError, DomainResult, RollId};

/// Creation input for a roll: the only fields a caller supplies.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoll {
    pub length: f64,
    pub weight: f64,
}

impl NewRoll {
    pub fn new(length: f64, weight: f64) -> DomainResult<Self> {
        let roll = Self { length, weight };
        roll.validate()?;
        Ok(roll)
    }

    /// Length and weight must both be finite and strictly positive.
    pub fn validate(&self) -> DomainResult<()> {
        ensure_positive("length", self.length)?;
        ensure_positive("weight", self.weight)?;
        Ok(())
    }
}

fn ensure_positive(field: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!("{field} must be a finite number")));
    }
    if value <= 0.0 {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(())
}

/// A physical stock item tracked from the moment it is added until it is
/// (soft) removed.
///
/// Once `removed_date` is set the roll is frozen; the record itself is never
/// physically deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    pub id: RollId,
    pub length: f64,
    pub weight: f64,
    pub added_date: DateTime<Utc>,
    pub removed_date: Option<DateTime<Utc>>,
}

impl Roll {
    /// Build an active roll from validated creation input.
    pub fn create(id: RollId, new: NewRoll, added_at: DateTime<Utc>) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            id,
            length: new.length,
            weight: new.weight,
            added_date: added_at,
            removed_date: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.removed_date.is_none()
    }

    /// Soft-delete the roll at `at`.
    ///
    /// A roll is removed at most once, and never before it was added.
    pub fn remove(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.removed_date.is_some() {
            return Err(DomainError::conflict(format!("roll {} already removed", self.id)));
        }
        if at < self.added_date {
            return Err(DomainError::invariant(
                "removed_date cannot precede added_date",
            ));
        }
        self.removed_date = Some(at);
        Ok(())
    }

    /// Whole days between adding and removing the roll (floored).
    ///
    /// `None` for active rolls.
    pub fn duration_days(&self) -> Option<i64> {
        self.removed_date
            .map(|removed| (removed - self.added_date).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn roll() -> Roll {
        Roll::create(RollId::new(1), NewRoll { length: 10.5, weight: 200.0 }, at(2023, 1, 1, 8)).unwrap()
    }

    #[test]
    fn create_starts_active() {
        let r = roll();
        assert!(r.is_active());
        assert_eq!(r.duration_days(), None);
        assert_eq!(r.added_date, at(2023, 1, 1, 8));
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        assert!(matches!(NewRoll::new(0.0, 1.0), Err(DomainError::Validation(_))));
        assert!(matches!(NewRoll::new(1.0, -3.0), Err(DomainError::Validation(_))));
        assert!(matches!(NewRoll::new(f64::NAN, 1.0), Err(DomainError::Validation(_))));
        assert!(matches!(NewRoll::new(1.0, f64::INFINITY), Err(DomainError::Validation(_))));
        assert!(NewRoll::new(0.1, 0.1).is_ok());
    }

    #[test]
    fn remove_sets_removed_date_once() {
        let mut r = roll();
        r.remove(at(2023, 1, 3, 9)).unwrap();
        assert_eq!(r.removed_date, Some(at(2023, 1, 3, 9)));

        let err = r.remove(at(2023, 1, 4, 9)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(r.removed_date, Some(at(2023, 1, 3, 9)));
    }

    #[test]
    fn remove_before_added_is_an_invariant_violation() {
        let mut r = roll();
        let err = r.remove(at(2022, 12, 31, 0)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert!(r.is_active());
    }

    #[test]
    fn duration_is_floored_to_whole_days() {
        let mut r = roll();
        // 2 days and 23 hours.
        r.remove(at(2023, 1, 4, 7)).unwrap();
        assert_eq!(r.duration_days(), Some(2));
    }

    #[test]
    fn same_instant_removal_has_zero_duration() {
        let mut r = roll();
        r.remove(r.added_date).unwrap();
        assert_eq!(r.duration_days(), Some(0));
    }
}
