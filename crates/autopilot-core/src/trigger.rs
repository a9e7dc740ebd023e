//! Trigger model and evaluation.
//!
//! A trigger decides when its workflow becomes eligible to run.  Four
//! kinds exist: `time` (a clock time on a set of enabled days), `condition`
//! (a weekday and/or time-of-day bucket), `voice` (a spoken phrase, matched
//! by the host's command router), and `manual` (host-invoked only).  The
//! scheduler polls [`Trigger::should_fire`] for `time` and `condition`
//! triggers; `voice` and `manual` always answer `false` there and are
//! activated through the engine's direct-invocation API instead.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::clock::parse_clock;
use crate::error::CoreError;

/// Seconds around the target clock time within which a time trigger
/// matches.  Doubles as the de-duplication window: a trigger that fired
/// inside the window will not fire again until the window has passed.
pub const MATCH_WINDOW_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Day and time-of-day vocabulary
// ---------------------------------------------------------------------------

/// A day of the week, serialized as the lowercase English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All seven days, Monday first.
    pub const ALL: [DayOfWeek; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Monday through Friday.
    pub const WEEKDAYS: [DayOfWeek; 5] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
    ];

    /// Saturday and Sunday.
    pub const WEEKEND: [DayOfWeek; 2] = [Self::Saturday, Self::Sunday];

    /// Convert from a [`chrono::Weekday`].
    pub fn from_weekday(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }

    /// Lowercase English name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|day| day.name() == s.trim().to_lowercase())
            .ok_or_else(|| CoreError::UnknownDay {
                input: s.to_string(),
            })
    }
}

/// A coarse time-of-day bucket, serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// The half-open `[start, end)` hour range of this bucket.
    pub fn hours(self) -> (u32, u32) {
        match self {
            Self::Morning => (6, 12),
            Self::Afternoon => (12, 18),
            Self::Evening => (18, 22),
            Self::Night => (22, 24),
        }
    }

    /// Whether `hour` (0..24) falls inside this bucket.
    pub fn contains_hour(self, hour: u32) -> bool {
        let (start, end) = self.hours();
        (start..end).contains(&hour)
    }

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeOfDay {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            _ => Err(CoreError::UnknownTimeOfDay {
                input: s.to_string(),
            }),
        }
    }
}

/// Map a spoken frequency word to the set of days it enables.
///
/// `morning`/`evening` constrain the clock, not the calendar, so they
/// enable every day.  Unrecognized frequencies yield an empty set, which a
/// time trigger treats as "never fire".
pub fn frequency_to_days(frequency: &str) -> Vec<DayOfWeek> {
    match frequency.trim().to_lowercase().as_str() {
        "daily" | "day" | "every day" => DayOfWeek::ALL.to_vec(),
        "weekday" | "weekdays" | "workday" | "workdays" => DayOfWeek::WEEKDAYS.to_vec(),
        "weekend" | "weekends" => DayOfWeek::WEEKEND.to_vec(),
        "morning" | "evening" => DayOfWeek::ALL.to_vec(),
        other => other
            .parse::<DayOfWeek>()
            .map(|day| vec![day])
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// The kind of a trigger together with its conditions.
///
/// Serialized adjacently tagged (`trigger_type` + `conditions`) so the
/// on-disk JSON keeps the stable field names of `workflows.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger_type", content = "conditions", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Fire at a clock time on a set of enabled days.
    Time {
        /// The original frequency word the rule was parsed from, if any.
        #[serde(default)]
        frequency: Option<String>,
        /// Clock string (`8am`, `2:30pm`, `14:00`).
        time: String,
        /// Days on which the trigger may fire; empty means never.
        enabled_days: Vec<DayOfWeek>,
    },

    /// Fire when the host's command router recognizes a phrase.
    Voice {
        phrase: String,
        exact_match: bool,
    },

    /// Fire while a weekday / time-of-day condition holds.
    Condition {
        #[serde(default)]
        day_of_week: Option<DayOfWeek>,
        #[serde(default)]
        time_of_day: Option<TimeOfDay>,
    },

    /// Only ever invoked directly by the host.
    Manual {},
}

impl TriggerSpec {
    /// Stable lowercase tag, for logs and display.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Time { .. } => "time",
            Self::Voice { .. } => "voice",
            Self::Condition { .. } => "condition",
            Self::Manual {} => "manual",
        }
    }

    /// Whether a recognized utterance activates this voice trigger.
    ///
    /// Exact-match phrases compare for case-insensitive equality; everything
    /// else matches on containment.  Non-voice specs never match.
    pub fn matches_phrase(&self, utterance: &str) -> bool {
        match self {
            Self::Voice {
                phrase,
                exact_match,
            } => {
                let phrase = phrase.to_lowercase();
                let utterance = utterance.to_lowercase();
                if *exact_match {
                    utterance == phrase
                } else {
                    utterance.contains(&phrase)
                }
            }
            _ => false,
        }
    }
}

/// The condition under which a workflow becomes eligible to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Unique identifier (UUID v7, timestamp-ordered).
    pub id: Uuid,
    /// Human-readable trigger name.
    pub name: String,
    /// Kind and conditions.
    #[serde(flatten)]
    pub spec: TriggerSpec,
    /// Whether this trigger may fire at all.
    pub enabled: bool,
    /// Set on every fire; guards against the poll period overlapping the
    /// match window and double-firing.
    #[serde(default)]
    pub last_fired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Trigger {
    /// Create an enabled trigger with a fresh id.
    pub fn new(name: impl Into<String>, spec: TriggerSpec) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            spec,
            enabled: true,
            last_fired_at: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the scheduler should fire this trigger at `now`.
    ///
    /// `voice` and `manual` triggers always answer `false`; they are
    /// invoked through the host API, not the polling loop.
    pub fn should_fire(&self, now: DateTime<Local>) -> bool {
        if !self.enabled {
            return false;
        }
        match &self.spec {
            TriggerSpec::Time {
                time, enabled_days, ..
            } => self.time_due(time, enabled_days, now),
            TriggerSpec::Condition {
                day_of_week,
                time_of_day,
            } => self.condition_due(*day_of_week, *time_of_day, now),
            TriggerSpec::Voice { .. } | TriggerSpec::Manual {} => false,
        }
    }

    /// Time trigger: today enabled, within the match window of the target
    /// clock time, and not already fired inside the window.
    fn time_due(&self, time: &str, enabled_days: &[DayOfWeek], now: DateTime<Local>) -> bool {
        let today = DayOfWeek::from_weekday(now.weekday());
        if !enabled_days.contains(&today) {
            return false;
        }

        let target = match parse_clock(time) {
            Ok(target) => target,
            Err(e) => {
                debug!(trigger_id = %self.id, error = %e, "unparseable trigger time");
                return false;
            }
        };

        // Resolve today's date + target clock in local time; a nonexistent
        // local time (DST gap) simply never fires.
        let Some(target_at) = Local
            .from_local_datetime(&now.date_naive().and_time(target))
            .earliest()
        else {
            return false;
        };

        let diff = now.signed_duration_since(target_at).num_seconds().abs();
        if diff > MATCH_WINDOW_SECS {
            return false;
        }

        if let Some(last) = self.last_fired_at {
            let since_last = now
                .with_timezone(&Utc)
                .signed_duration_since(last)
                .num_seconds();
            if since_last <= MATCH_WINDOW_SECS {
                return false;
            }
        }

        true
    }

    /// Condition trigger: weekday and time-of-day bucket both hold (when
    /// set), at most one fire per local day per bucket.
    fn condition_due(
        &self,
        day_of_week: Option<DayOfWeek>,
        time_of_day: Option<TimeOfDay>,
        now: DateTime<Local>,
    ) -> bool {
        let today = DayOfWeek::from_weekday(now.weekday());
        if let Some(day) = day_of_week
            && day != today
        {
            return false;
        }
        if let Some(bucket) = time_of_day
            && !bucket.contains_hour(now.hour())
        {
            return false;
        }

        if let Some(last) = self.last_fired_at {
            let last_local = last.with_timezone(&Local);
            if last_local.date_naive() == now.date_naive()
                && time_of_day.is_none_or(|bucket| bucket.contains_hour(last_local.hour()))
            {
                return false;
            }
        }

        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    /// Monday 2025-06-02 at the given local clock time.
    fn monday_at(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 6, 2, hour, minute, second)
            .unwrap()
    }

    fn time_trigger(time: &str, days: Vec<DayOfWeek>) -> Trigger {
        Trigger::new(
            "test",
            TriggerSpec::Time {
                frequency: None,
                time: time.to_string(),
                enabled_days: days,
            },
        )
    }

    #[test]
    fn frequency_daily_enables_all_days() {
        assert_eq!(frequency_to_days("daily"), DayOfWeek::ALL.to_vec());
        assert_eq!(frequency_to_days("every day"), DayOfWeek::ALL.to_vec());
    }

    #[test]
    fn frequency_weekdays_and_weekends() {
        assert_eq!(frequency_to_days("weekdays"), DayOfWeek::WEEKDAYS.to_vec());
        assert_eq!(frequency_to_days("workdays"), DayOfWeek::WEEKDAYS.to_vec());
        assert_eq!(frequency_to_days("weekends"), DayOfWeek::WEEKEND.to_vec());
    }

    #[test]
    fn frequency_morning_evening_enable_all_days() {
        assert_eq!(frequency_to_days("morning"), DayOfWeek::ALL.to_vec());
        assert_eq!(frequency_to_days("evening"), DayOfWeek::ALL.to_vec());
    }

    #[test]
    fn frequency_single_day_name() {
        assert_eq!(frequency_to_days("friday"), vec![DayOfWeek::Friday]);
        assert_eq!(frequency_to_days("Sunday"), vec![DayOfWeek::Sunday]);
    }

    #[test]
    fn frequency_unknown_is_empty() {
        assert!(frequency_to_days("fortnight").is_empty());
        assert!(frequency_to_days("").is_empty());
    }

    #[test]
    fn time_trigger_fires_within_window() {
        let trigger = time_trigger("9am", DayOfWeek::ALL.to_vec());
        assert!(trigger.should_fire(monday_at(9, 0, 0)));
        assert!(trigger.should_fire(monday_at(8, 59, 30)));
        // Exactly 60 seconds away still matches...
        assert!(trigger.should_fire(monday_at(9, 1, 0)));
        // ...61 seconds does not.
        assert!(!trigger.should_fire(monday_at(9, 1, 1)));
    }

    #[test]
    fn time_trigger_respects_enabled_days() {
        let trigger = time_trigger("9am", vec![DayOfWeek::Saturday]);
        assert!(!trigger.should_fire(monday_at(9, 0, 0)));

        let trigger = time_trigger("9am", vec![DayOfWeek::Monday]);
        assert!(trigger.should_fire(monday_at(9, 0, 0)));
    }

    #[test]
    fn time_trigger_with_empty_days_never_fires() {
        let trigger = time_trigger("9am", Vec::new());
        assert!(!trigger.should_fire(monday_at(9, 0, 0)));
    }

    #[test]
    fn time_trigger_with_bad_clock_never_fires() {
        let trigger = time_trigger("o'clock", DayOfWeek::ALL.to_vec());
        assert!(!trigger.should_fire(monday_at(9, 0, 0)));
    }

    #[test]
    fn disabled_trigger_never_fires() {
        let mut trigger = time_trigger("9am", DayOfWeek::ALL.to_vec());
        trigger.enabled = false;
        assert!(!trigger.should_fire(monday_at(9, 0, 0)));
    }

    #[test]
    fn time_trigger_does_not_refire_inside_window() {
        let now = monday_at(9, 0, 30);
        let mut trigger = time_trigger("9am", DayOfWeek::ALL.to_vec());

        trigger.last_fired_at = Some((now - TimeDelta::seconds(30)).with_timezone(&Utc));
        assert!(!trigger.should_fire(now));

        // A fire well outside the window does not suppress.
        trigger.last_fired_at = Some((now - TimeDelta::seconds(120)).with_timezone(&Utc));
        assert!(trigger.should_fire(now));
    }

    #[test]
    fn condition_trigger_matches_day_and_bucket() {
        let trigger = Trigger::new(
            "cond",
            TriggerSpec::Condition {
                day_of_week: Some(DayOfWeek::Monday),
                time_of_day: Some(TimeOfDay::Morning),
            },
        );
        assert!(trigger.should_fire(monday_at(9, 0, 0)));
        // Noon is afternoon, not morning (half-open bucket).
        assert!(!trigger.should_fire(monday_at(12, 0, 0)));
    }

    #[test]
    fn condition_trigger_wrong_day_never_fires() {
        let trigger = Trigger::new(
            "cond",
            TriggerSpec::Condition {
                day_of_week: Some(DayOfWeek::Friday),
                time_of_day: Some(TimeOfDay::Morning),
            },
        );
        assert!(!trigger.should_fire(monday_at(9, 0, 0)));
    }

    #[test]
    fn condition_trigger_without_conditions_matches() {
        let trigger = Trigger::new(
            "cond",
            TriggerSpec::Condition {
                day_of_week: None,
                time_of_day: None,
            },
        );
        assert!(trigger.should_fire(monday_at(15, 0, 0)));
    }

    #[test]
    fn condition_trigger_fires_once_per_bucket_per_day() {
        let now = monday_at(9, 30, 0);
        let mut trigger = Trigger::new(
            "cond",
            TriggerSpec::Condition {
                day_of_week: Some(DayOfWeek::Monday),
                time_of_day: Some(TimeOfDay::Morning),
            },
        );

        // Fired earlier in the same morning: suppressed.
        trigger.last_fired_at = Some(monday_at(8, 0, 0).with_timezone(&Utc));
        assert!(!trigger.should_fire(now));

        // Fired the previous day: fires again.
        trigger.last_fired_at =
            Some((monday_at(8, 0, 0) - TimeDelta::days(1)).with_timezone(&Utc));
        assert!(trigger.should_fire(now));
    }

    #[test]
    fn voice_and_manual_are_not_scheduler_fired() {
        let voice = Trigger::new(
            "voice",
            TriggerSpec::Voice {
                phrase: "focus mode".into(),
                exact_match: false,
            },
        );
        let manual = Trigger::new("manual", TriggerSpec::Manual {});
        assert!(!voice.should_fire(monday_at(9, 0, 0)));
        assert!(!manual.should_fire(monday_at(9, 0, 0)));
    }

    #[test]
    fn phrase_matching() {
        let spec = TriggerSpec::Voice {
            phrase: "focus mode".into(),
            exact_match: false,
        };
        assert!(spec.matches_phrase("focus mode"));
        assert!(spec.matches_phrase("enable Focus Mode please"));
        assert!(!spec.matches_phrase("focus"));

        let exact = TriggerSpec::Voice {
            phrase: "focus mode".into(),
            exact_match: true,
        };
        assert!(exact.matches_phrase("Focus Mode"));
        assert!(!exact.matches_phrase("enable focus mode please"));

        assert!(!TriggerSpec::Manual {}.matches_phrase("focus mode"));
    }

    #[test]
    fn trigger_spec_serializes_with_stable_field_names() {
        let trigger = time_trigger("9am", DayOfWeek::WEEKDAYS.to_vec());
        let value = serde_json::to_value(&trigger).unwrap();

        assert_eq!(value["trigger_type"], "time");
        assert_eq!(value["conditions"]["time"], "9am");
        assert_eq!(
            value["conditions"]["enabled_days"],
            serde_json::json!(["monday", "tuesday", "wednesday", "thursday", "friday"])
        );

        let back: Trigger = serde_json::from_value(value).unwrap();
        assert_eq!(back.spec, trigger.spec);
        assert_eq!(back.created_at, trigger.created_at);
    }

    #[test]
    fn manual_spec_round_trips_with_empty_conditions() {
        let trigger = Trigger::new("manual", TriggerSpec::Manual {});
        let value = serde_json::to_value(&trigger).unwrap();
        assert_eq!(value["trigger_type"], "manual");
        assert_eq!(value["conditions"], serde_json::json!({}));

        let back: Trigger = serde_json::from_value(value).unwrap();
        assert_eq!(back.spec, TriggerSpec::Manual {});
    }
}
