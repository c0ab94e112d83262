//! Recurrence evaluation: does a template occur on a given date?
//!
//! Rules are a closed five-variant frequency enum with an interval cadence
//! counted from `startDate`. Evaluation is total over valid rules -- it never
//! panics and never allocates; validation is a separate pass returning every
//! structural problem at once.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Recurrence cadence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One-off: occurs on `startDate` only (or any date when unset)
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Day of week, Monday-first as in the rule schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// Days since Monday, 0..=6.
    pub fn from_monday(self) -> u32 {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
            Weekday::Sat => 5,
            Weekday::Sun => 6,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        match date.weekday().num_days_from_monday() {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }
}

/// A template's recurrence rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Every N periods, counted from `startDate`
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Weekly only; non-empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<Weekday>>,
    /// Monthly/yearly; months without this day are skipped, never clamped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Yearly only, 1..=12
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    /// Inclusive ISO local date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive ISO local date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

fn default_interval() -> u32 {
    1
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self {
            frequency: Frequency::None,
            interval: 1,
            days_of_week: None,
            day_of_month: None,
            month: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl RecurrenceRule {
    /// Convenience constructor for a plain daily rule.
    pub fn daily(interval: u32) -> Self {
        Self {
            frequency: Frequency::Daily,
            interval,
            ..Self::default()
        }
    }

    /// Convenience constructor for a weekly rule on the given days.
    pub fn weekly(interval: u32, days: Vec<Weekday>) -> Self {
        Self {
            frequency: Frequency::Weekly,
            interval,
            days_of_week: Some(days),
            ..Self::default()
        }
    }

    /// Whether this rule produces an occurrence on `date`.
    ///
    /// Total over valid rules; a zero interval is treated as 1 rather than
    /// dividing by zero, so evaluation stays safe even on unvalidated input.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start_date {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }
        let interval = i64::from(self.interval.max(1));

        match self.frequency {
            Frequency::None => match self.start_date {
                Some(start) => date == start,
                None => true,
            },
            Frequency::Daily => match self.start_date {
                Some(start) => (date - start).num_days() % interval == 0,
                None => true,
            },
            Frequency::Weekly => {
                let days = match &self.days_of_week {
                    Some(days) if !days.is_empty() => days,
                    _ => return false,
                };
                if !days.contains(&Weekday::of(date)) {
                    return false;
                }
                match self.start_date {
                    Some(start) => {
                        let weeks = (week_anchor(date) - week_anchor(start)).num_days() / 7;
                        weeks % interval == 0
                    }
                    None => true,
                }
            }
            Frequency::Monthly => {
                let day = match self.day_of_month {
                    Some(day) => day,
                    None => return false,
                };
                // months without this day are skipped: no date can match
                if date.day() != day {
                    return false;
                }
                match self.start_date {
                    Some(start) => months_between(start, date) % interval == 0,
                    None => true,
                }
            }
            Frequency::Yearly => {
                let (month, day) = match (self.month, self.day_of_month) {
                    (Some(month), Some(day)) => (month, day),
                    _ => return false,
                };
                // Feb 29 matches only in leap years: the date simply does
                // not exist otherwise
                if date.month() != month || date.day() != day {
                    return false;
                }
                match self.start_date {
                    Some(start) => i64::from(date.year() - start.year()) % interval == 0,
                    None => true,
                }
            }
        }
    }

    /// Structural validation; returns every problem found.
    pub fn validate(&self) -> Vec<RuleError> {
        let mut errors = Vec::new();
        if self.interval < 1 {
            errors.push(RuleError::IntervalTooSmall {
                interval: self.interval,
            });
        }
        match self.frequency {
            Frequency::Weekly => {
                let empty = self
                    .days_of_week
                    .as_ref()
                    .map_or(true, |days| days.is_empty());
                if empty {
                    errors.push(RuleError::WeeklyRequiresDays);
                }
            }
            Frequency::Monthly => {
                if self.day_of_month.is_none() {
                    errors.push(RuleError::MonthlyRequiresDayOfMonth);
                }
            }
            Frequency::Yearly => {
                if self.month.is_none() || self.day_of_month.is_none() {
                    errors.push(RuleError::YearlyRequiresMonthAndDay);
                }
            }
            Frequency::None | Frequency::Daily => {}
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                errors.push(RuleError::DayOfMonthOutOfRange { day });
            }
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                errors.push(RuleError::MonthOutOfRange { month });
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                errors.push(RuleError::StartAfterEnd);
            }
        }
        errors
    }
}

/// Whether a template with this optional rule occurs on `date`.
///
/// Templates without a rule are always eligible, matching
/// `frequency = none` with no start date.
pub fn occurs_on(rule: Option<&RecurrenceRule>, date: NaiveDate) -> bool {
    match rule {
        Some(rule) => rule.occurs_on(date),
        None => true,
    }
}

/// Monday of the week containing `date`: the weekly cadence anchor.
fn week_anchor(date: NaiveDate) -> NaiveDate {
    date - chrono::Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Whole months elapsed between the months containing the two dates.
fn months_between(start: NaiveDate, date: NaiveDate) -> i64 {
    i64::from(date.year() - start.year()) * 12 + i64::from(date.month()) - i64::from(start.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_date;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn no_rule_always_occurs() {
        assert!(occurs_on(None, d("2025-03-01")));
    }

    #[test]
    fn none_frequency_matches_start_date_only() {
        let rule = RecurrenceRule {
            start_date: Some(d("2025-03-01")),
            ..RecurrenceRule::default()
        };
        assert!(rule.occurs_on(d("2025-03-01")));
        assert!(!rule.occurs_on(d("2025-03-02")));

        let unanchored = RecurrenceRule::default();
        assert!(unanchored.occurs_on(d("2025-03-02")));
    }

    #[test]
    fn daily_interval_counts_from_start() {
        let rule = RecurrenceRule {
            start_date: Some(d("2025-03-01")),
            ..RecurrenceRule::daily(3)
        };
        assert!(rule.occurs_on(d("2025-03-01")));
        assert!(!rule.occurs_on(d("2025-03-02")));
        assert!(!rule.occurs_on(d("2025-03-03")));
        assert!(rule.occurs_on(d("2025-03-04")));
        // before start
        assert!(!rule.occurs_on(d("2025-02-26")));
    }

    #[test]
    fn end_date_is_inclusive() {
        let rule = RecurrenceRule {
            start_date: Some(d("2025-03-01")),
            end_date: Some(d("2025-03-05")),
            ..RecurrenceRule::daily(1)
        };
        assert!(rule.occurs_on(d("2025-03-05")));
        assert!(!rule.occurs_on(d("2025-03-06")));
    }

    #[test]
    fn weekly_cadence_uses_week_anchor() {
        // 2025-03-05 is a Wednesday; anchor week starts Monday 2025-03-03
        let rule = RecurrenceRule {
            start_date: Some(d("2025-03-05")),
            ..RecurrenceRule::weekly(2, vec![Weekday::Mon, Weekday::Wed])
        };
        // same week, listed days
        assert!(rule.occurs_on(d("2025-03-05")));
        // Monday of the start week is before startDate
        assert!(!rule.occurs_on(d("2025-03-03")));
        // next week is off-cadence
        assert!(!rule.occurs_on(d("2025-03-12")));
        // two weeks out is on-cadence
        assert!(rule.occurs_on(d("2025-03-17")));
        assert!(rule.occurs_on(d("2025-03-19")));
        // on-cadence but not a listed day
        assert!(!rule.occurs_on(d("2025-03-18")));
    }

    #[test]
    fn monthly_skips_short_months() {
        let rule = RecurrenceRule {
            frequency: Frequency::Monthly,
            day_of_month: Some(31),
            start_date: Some(d("2025-01-31")),
            ..RecurrenceRule::default()
        };
        assert!(rule.occurs_on(d("2025-01-31")));
        // February has no 31st: skipped, not clamped to the 28th
        assert!(!rule.occurs_on(d("2025-02-28")));
        assert!(rule.occurs_on(d("2025-03-31")));
    }

    #[test]
    fn monthly_interval() {
        let rule = RecurrenceRule {
            frequency: Frequency::Monthly,
            interval: 2,
            day_of_month: Some(15),
            start_date: Some(d("2025-01-15")),
            ..RecurrenceRule::default()
        };
        assert!(rule.occurs_on(d("2025-01-15")));
        assert!(!rule.occurs_on(d("2025-02-15")));
        assert!(rule.occurs_on(d("2025-03-15")));
    }

    #[test]
    fn yearly_feb29_skips_non_leap() {
        let rule = RecurrenceRule {
            frequency: Frequency::Yearly,
            month: Some(2),
            day_of_month: Some(29),
            start_date: Some(d("2024-02-29")),
            ..RecurrenceRule::default()
        };
        assert!(rule.occurs_on(d("2024-02-29")));
        assert!(rule.occurs_on(d("2028-02-29")));
        // 2025-02-29 does not exist; nothing to assert for it
        assert!(!rule.occurs_on(d("2025-02-28")));
        assert!(!rule.occurs_on(d("2025-03-01")));
    }

    #[test]
    fn validation_reports_all_problems() {
        let rule = RecurrenceRule {
            frequency: Frequency::Weekly,
            interval: 0,
            days_of_week: Some(vec![]),
            start_date: Some(d("2025-03-10")),
            end_date: Some(d("2025-03-01")),
            ..RecurrenceRule::default()
        };
        let errors = rule.validate();
        assert!(errors.contains(&RuleError::IntervalTooSmall { interval: 0 }));
        assert!(errors.contains(&RuleError::WeeklyRequiresDays));
        assert!(errors.contains(&RuleError::StartAfterEnd));
    }

    #[test]
    fn zero_interval_does_not_panic() {
        let rule = RecurrenceRule {
            start_date: Some(d("2025-03-01")),
            ..RecurrenceRule::daily(0)
        };
        // invalid, but evaluation must stay total
        assert!(rule.occurs_on(d("2025-03-02")));
    }

    proptest::proptest! {
        /// Evaluation is total and idempotent over arbitrary rules, valid or
        /// not: no panics, and the same inputs always answer the same way.
        #[test]
        fn occurs_on_is_total_and_idempotent(
            frequency in 0u8..5,
            interval in 0u32..40,
            days in proptest::collection::vec(0u8..7, 0..7),
            day_of_month in proptest::option::of(0u32..40),
            month in proptest::option::of(0u32..15),
            start_offset in proptest::option::of(0i64..2000),
            end_offset in proptest::option::of(0i64..2000),
            probe_offset in 0i64..2000,
        ) {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let all_days = [
                Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu,
                Weekday::Fri, Weekday::Sat, Weekday::Sun,
            ];
            let rule = RecurrenceRule {
                frequency: match frequency {
                    0 => Frequency::None,
                    1 => Frequency::Daily,
                    2 => Frequency::Weekly,
                    3 => Frequency::Monthly,
                    _ => Frequency::Yearly,
                },
                interval,
                days_of_week: Some(days.iter().map(|&d| all_days[d as usize]).collect()),
                day_of_month,
                month,
                start_date: start_offset.map(|o| base + chrono::Days::new(o as u64)),
                end_date: end_offset.map(|o| base + chrono::Days::new(o as u64)),
            };
            let date = base + chrono::Days::new(probe_offset as u64);
            let first = rule.occurs_on(date);
            let second = rule.occurs_on(date);
            proptest::prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn serializes_camel_case() {
        let rule = RecurrenceRule {
            frequency: Frequency::Weekly,
            days_of_week: Some(vec![Weekday::Mon, Weekday::Fri]),
            start_date: Some(d("2025-03-03")),
            ..RecurrenceRule::default()
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["frequency"], "weekly");
        assert_eq!(json["daysOfWeek"][0], "mon");
        assert_eq!(json["startDate"], "2025-03-03");
        assert!(json.get("dayOfMonth").is_none());
    }
}
