//! Time axis construction.
//!
//! Derives the vertical axis of the board from the assigned encounters:
//!
//! 1. No assigned encounter: use the fallback window (07:00-20:00) on the
//!    reference date, so the grid is never empty.
//! 2. Otherwise take the earliest start and the latest end
//!    (start + duration, default duration when unknown).
//! 3. Floor the earliest to its hour and subtract the padding; ceil the
//!    latest to its hour and add the padding.
//! 4. Emit slots every `granularity` minutes from the padded minimum up to,
//!    but excluding, the padded maximum.
//!
//! The slot list is always regenerated from `(min, max, granularity)`;
//! changing granularity never patches an existing list.

use chrono::{Duration, NaiveTime, Timelike};

use crate::config::{
    BoardConfig, FallbackWindow, DEFAULT_DURATION_MINUTES, DEFAULT_GRANULARITY_MINUTES,
    DEFAULT_PADDING_MINUTES,
};
use crate::error::BoardError;
use crate::models::{Encounter, Timestamp};

/// Builds a [`TimeAxis`] from a set of encounters.
#[derive(Debug, Clone)]
pub struct TimeAxisBuilder {
    granularity_minutes: u32,
    default_duration_minutes: u32,
    padding_minutes: u32,
    fallback_window: FallbackWindow,
}

/// Evenly spaced slot instants covering `[min, max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    /// Padded lower bound (first slot).
    pub min: Timestamp,
    /// Padded upper bound (exclusive).
    pub max: Timestamp,
    /// Minutes between consecutive slots.
    pub granularity_minutes: u32,
    /// Slot start instants, strictly increasing.
    pub slots: Vec<Timestamp>,
}

impl TimeAxisBuilder {
    pub fn new() -> Self {
        Self {
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            padding_minutes: DEFAULT_PADDING_MINUTES,
            fallback_window: FallbackWindow::default(),
        }
    }

    /// Takes duration, padding and fallback window from the configuration.
    /// Granularity comes from the configuration's initial value.
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            granularity_minutes: config.granularity_minutes,
            default_duration_minutes: config.default_duration_minutes,
            padding_minutes: config.padding_minutes,
            fallback_window: config.fallback_window,
        }
    }

    pub fn with_granularity(mut self, minutes: u32) -> Self {
        self.granularity_minutes = minutes;
        self
    }

    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    pub fn with_padding(mut self, minutes: u32) -> Self {
        self.padding_minutes = minutes;
        self
    }

    pub fn with_fallback_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.fallback_window = FallbackWindow { start, end };
        self
    }

    /// Builds the axis. `reference` supplies the date (and offset) of the
    /// fallback window.
    pub fn build<'a, I>(&self, encounters: I, reference: Timestamp) -> Result<TimeAxis, BoardError>
    where
        I: IntoIterator<Item = &'a Encounter>,
    {
        let (min, max) = match self.assigned_bounds(encounters) {
            Some((earliest, latest)) => {
                let padding = Duration::minutes(i64::from(self.padding_minutes));
                (floor_to_hour(earliest) - padding, ceil_to_hour(latest) + padding)
            }
            None => {
                let midnight = start_of_day(reference);
                (
                    midnight + since_midnight(self.fallback_window.start),
                    midnight + since_midnight(self.fallback_window.end),
                )
            }
        };
        TimeAxis::from_bounds(min, max, self.granularity_minutes)
    }

    /// Earliest start and latest end over assigned encounters.
    fn assigned_bounds<'a, I>(&self, encounters: I) -> Option<(Timestamp, Timestamp)>
    where
        I: IntoIterator<Item = &'a Encounter>,
    {
        encounters
            .into_iter()
            .filter_map(|e| e.interval(self.default_duration_minutes))
            .fold(None, |acc, (start, end)| match acc {
                None => Some((start, end)),
                Some((lo, hi)) => Some((lo.min(start), hi.max(end))),
            })
    }
}

impl Default for TimeAxisBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeAxis {
    /// Generates slots every `granularity_minutes` from `min` up to `max` (exclusive).
    pub fn from_bounds(
        min: Timestamp,
        max: Timestamp,
        granularity_minutes: u32,
    ) -> Result<Self, BoardError> {
        if granularity_minutes == 0 {
            return Err(BoardError::InvalidGranularity(granularity_minutes));
        }
        let step = Duration::minutes(i64::from(granularity_minutes));
        let mut slots = Vec::new();
        let mut t = min;
        while t < max {
            slots.push(t);
            t += step;
        }
        Ok(Self {
            min,
            max,
            granularity_minutes,
            slots,
        })
    }

    /// Same bounds, new granularity. Regenerated from scratch.
    pub fn with_granularity(&self, granularity_minutes: u32) -> Result<Self, BoardError> {
        tracing::debug!(
            from = self.granularity_minutes,
            to = granularity_minutes,
            "regenerating time axis"
        );
        Self::from_bounds(self.min, self.max, granularity_minutes)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.granularity_minutes))
    }

    /// End of the slot starting at `slot`.
    pub fn slot_end(&self, slot: Timestamp) -> Timestamp {
        slot + self.step()
    }

    /// Index of the slot containing `t`, if it lies on the axis.
    pub fn slot_index(&self, t: Timestamp) -> Option<usize> {
        if t < self.min || t >= self.max {
            return None;
        }
        let offset = (t - self.min).num_minutes() / i64::from(self.granularity_minutes);
        usize::try_from(offset).ok().filter(|&i| i < self.slots.len())
    }

    /// "HH:MM" for slots on a whole hour, `None` otherwise.
    pub fn hour_label(slot: Timestamp) -> Option<String> {
        (slot.minute() == 0 && slot.second() == 0).then(|| slot.format("%H:%M").to_string())
    }
}

fn floor_to_hour(t: Timestamp) -> Timestamp {
    t - Duration::seconds(i64::from(t.minute() * 60 + t.second()))
        - Duration::nanoseconds(i64::from(t.nanosecond()))
}

fn ceil_to_hour(t: Timestamp) -> Timestamp {
    let floored = floor_to_hour(t);
    if floored == t {
        t
    } else {
        floored + Duration::hours(1)
    }
}

fn start_of_day(t: Timestamp) -> Timestamp {
    t - since_midnight(t.time())
}

fn since_midnight(time: NaiveTime) -> Duration {
    time.signed_duration_since(NaiveTime::MIN)
}
