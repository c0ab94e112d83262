//! User settings: sleep window and desired sleep duration.

use serde::{Deserialize, Serialize};

use crate::clock::{format_hhmm, parse_hhmm, MINUTES_PER_DAY};
use crate::error::ValidationError;

/// User-level scheduling settings.
///
/// The awake window is the complement of the sleep period; sleep may cross
/// midnight (the usual case: sleep in the evening, wake in the morning).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Desired sleep in hours, 4..=12. Advisory; the window is defined by the
    /// two times below.
    pub desired_sleep_duration: f64,
    /// `HH:MM`
    pub default_wake_time: String,
    /// `HH:MM`
    pub default_sleep_time: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            desired_sleep_duration: 7.5,
            default_wake_time: "06:30".to_string(),
            default_sleep_time: "23:00".to_string(),
        }
    }
}

/// The schedulable stretch of the day, in extended minutes.
///
/// `start` is the wake minute. When the sleep time is at or before the wake
/// time on the clock face, the window crosses midnight and `end` is the sleep
/// minute plus 1440, so `start < end` always holds and minutes inside the
/// window sort in wake-to-sleep order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwakeWindow {
    pub start: u32,
    pub end: u32,
}

impl AwakeWindow {
    /// Wake minute on the clock face.
    pub fn wake(&self) -> u32 {
        self.start
    }

    /// Sleep minute on the clock face.
    pub fn sleep(&self) -> u32 {
        self.end % MINUTES_PER_DAY
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end > MINUTES_PER_DAY
    }

    pub fn len_minutes(&self) -> u32 {
        self.end - self.start
    }

    /// Map a clock-face minute into this window's extended coordinate.
    ///
    /// Minutes earlier than the wake time belong to the stretch after
    /// midnight when the window crosses it.
    pub fn to_extended(&self, minute: u32) -> u32 {
        if self.crosses_midnight() && minute < self.start {
            minute + MINUTES_PER_DAY
        } else {
            minute
        }
    }

    pub fn contains(&self, extended_minute: u32) -> bool {
        (self.start..self.end).contains(&extended_minute)
    }
}

/// Sleep summary attached to every schedule result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SleepSchedule {
    pub wake_time: String,
    pub sleep_time: String,
    /// Actual sleep period length in hours
    pub duration: f64,
}

impl Settings {
    /// Validate field ranges and time formats.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(4.0..=12.0).contains(&self.desired_sleep_duration) {
            return Err(ValidationError::new(
                "desiredSleepDuration",
                format!("{} is out of range 4..=12 hours", self.desired_sleep_duration),
            ));
        }
        let wake = parse_hhmm(&self.default_wake_time)
            .map_err(|e| ValidationError::new("defaultWakeTime", e.to_string()))?;
        let sleep = parse_hhmm(&self.default_sleep_time)
            .map_err(|e| ValidationError::new("defaultSleepTime", e.to_string()))?;
        if sleep == wake {
            return Err(ValidationError::new(
                "defaultSleepTime",
                "sleep time must differ from wake time",
            ));
        }
        Ok(())
    }

    /// The awake window in extended minutes.
    pub fn awake_window(&self) -> Result<AwakeWindow, ValidationError> {
        self.validate()?;
        let wake = parse_hhmm(&self.default_wake_time)
            .map_err(|e| ValidationError::new("defaultWakeTime", e.to_string()))?;
        let sleep = parse_hhmm(&self.default_sleep_time)
            .map_err(|e| ValidationError::new("defaultSleepTime", e.to_string()))?;
        let end = if sleep > wake { sleep } else { sleep + MINUTES_PER_DAY };
        Ok(AwakeWindow { start: wake, end })
    }

    /// The sleep summary for schedule results.
    pub fn sleep_schedule(&self) -> Result<SleepSchedule, ValidationError> {
        let window = self.awake_window()?;
        let sleep_minutes = MINUTES_PER_DAY - window.len_minutes();
        Ok(SleepSchedule {
            wake_time: format_hhmm(window.wake()),
            sleep_time: format_hhmm(window.sleep()),
            duration: f64::from(sleep_minutes) / 60.0,
        })
    }
}
