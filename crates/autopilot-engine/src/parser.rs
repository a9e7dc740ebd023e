//! Rule parser — turns free-form automation rules into workflow drafts.
//!
//! Three regex recognizers are tried in priority order against the
//! lower-cased command:
//!
//! 1. Recurring time: `every <frequency> at <time>, <action>`
//! 2. Voice phrase: `when i say '<phrase>', <action>`
//! 3. Weekly condition: `if it's <day> <time-of-day>, <action>`
//!
//! Anything that matches none of them becomes a manually-triggered
//! `command` workflow carrying the original text, so parsing is effectively
//! total: callers that want strict validation post-check for the manual
//! shape instead of handling an error.

use regex::Regex;
use serde_json::json;
use tracing::debug;

use autopilot_core::{Action, ActionKind, DayOfWeek, TimeOfDay, TriggerSpec, frequency_to_days};

use crate::error::{EngineError, Result};

/// A parsed rule, ready to be materialized into a workflow.
#[derive(Debug, Clone)]
pub struct ParsedRule {
    pub name: String,
    pub description: String,
    pub trigger_name: String,
    pub spec: TriggerSpec,
    pub actions: Vec<Action>,
}

/// Regex-chain rule parser.
pub struct RuleParser {
    recurring: Regex,
    voice: Regex,
    weekly: Regex,
}

impl RuleParser {
    /// Compile the recognizer patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            recurring: compile(
                r"every (?P<freq>\w+) at (?P<time>\d{1,2}(?::\d{2})?\s*(?:am|pm)?),?\s*(?P<action>.+)",
            )?,
            voice: compile(r#"when i say ['"](?P<phrase>.*?)['"],?\s*(?P<action>.+)"#)?,
            weekly: compile(r"if it's (?P<day>\w+) (?P<tod>\w+),?\s*(?P<action>.+)")?,
        })
    }

    /// Parse a natural-language command into a rule draft.
    ///
    /// Returns `None` only when no recognizer and no fallback apply; in
    /// practice the fallback always applies.
    pub fn parse(&self, command: &str) -> Option<ParsedRule> {
        let lowered = command.to_lowercase();
        let lowered = lowered.trim();

        let rule = self
            .try_recurring(lowered, command)
            .or_else(|| self.try_voice(lowered, command))
            .or_else(|| self.try_weekly(lowered, command))
            .unwrap_or_else(|| self.fallback(command));

        debug!(
            trigger_type = rule.spec.type_name(),
            name = %rule.name,
            "rule parsed"
        );
        Some(rule)
    }

    /// `every <frequency> at <time>, <action>` → time trigger + reminder.
    fn try_recurring(&self, lowered: &str, original: &str) -> Option<ParsedRule> {
        let caps = self.recurring.captures(lowered)?;
        let frequency = caps["freq"].to_string();
        let time = caps["time"].trim().to_string();
        let action_text = caps["action"].trim().to_string();

        let enabled_days = frequency_to_days(&frequency);

        Some(ParsedRule {
            name: format!("Scheduled {action_text}"),
            description: format!("Auto-generated workflow: {original}"),
            trigger_name: format!("{} at {time}", title_case(&frequency)),
            spec: TriggerSpec::Time {
                frequency: Some(frequency),
                time,
                enabled_days,
            },
            actions: vec![Action::new(
                ActionKind::Reminder,
                json!({"message": action_text, "priority": "medium"}),
            )],
        })
    }

    /// `when i say '<phrase>', <action>` → voice trigger + command.
    fn try_voice(&self, lowered: &str, original: &str) -> Option<ParsedRule> {
        let caps = self.voice.captures(lowered)?;
        let phrase = caps["phrase"].to_string();
        let action_text = caps["action"].trim().to_string();

        Some(ParsedRule {
            name: format!("Voice command: {phrase}"),
            description: format!("Auto-generated workflow: {original}"),
            trigger_name: format!("Voice: '{phrase}'"),
            spec: TriggerSpec::Voice {
                phrase,
                exact_match: false,
            },
            actions: vec![Action::new(
                ActionKind::Command,
                json!({"command": action_text, "speak_response": true}),
            )],
        })
    }

    /// `if it's <day> <time-of-day>, <action>` → condition trigger +
    /// notification.  Unknown day or bucket tokens reject the pattern and
    /// fall through to the fallback.
    fn try_weekly(&self, lowered: &str, original: &str) -> Option<ParsedRule> {
        let caps = self.weekly.captures(lowered)?;
        let day: DayOfWeek = caps["day"].parse().ok()?;
        let time_of_day: TimeOfDay = caps["tod"].parse().ok()?;
        let action_text = caps["action"].trim().to_string();

        let label = format!("{} {time_of_day}", title_case(day.name()));

        Some(ParsedRule {
            name: format!("{label} automation"),
            description: format!("Auto-generated workflow: {original}"),
            trigger_name: label.clone(),
            spec: TriggerSpec::Condition {
                day_of_week: Some(day),
                time_of_day: Some(time_of_day),
            },
            actions: vec![Action::new(
                ActionKind::Notification,
                json!({"title": label, "message": action_text, "priority": "medium"}),
            )],
        })
    }

    /// Anything unrecognized: a manually-triggered command carrying the
    /// whole original text.
    fn fallback(&self, original: &str) -> ParsedRule {
        ParsedRule {
            name: "Custom Automation".to_string(),
            description: format!("Basic automation: {original}"),
            trigger_name: "Manual trigger".to_string(),
            spec: TriggerSpec::Manual {},
            actions: vec![Action::new(
                ActionKind::Command,
                json!({"command": original, "speak_response": false}),
            )],
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| EngineError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Uppercase the first character of a word.
fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> RuleParser {
        RuleParser::new().unwrap()
    }

    #[test]
    fn recurring_weekday_rule() {
        let rule = parser()
            .parse("every weekday at 9am, stand up and stretch")
            .unwrap();

        assert_eq!(rule.name, "Scheduled stand up and stretch");
        assert_eq!(rule.trigger_name, "Weekday at 9am");
        match &rule.spec {
            TriggerSpec::Time {
                frequency,
                time,
                enabled_days,
            } => {
                assert_eq!(frequency.as_deref(), Some("weekday"));
                assert_eq!(time, "9am");
                assert_eq!(enabled_days, &DayOfWeek::WEEKDAYS.to_vec());
            }
            other => panic!("expected time spec, got {other:?}"),
        }

        assert_eq!(rule.actions.len(), 1);
        assert_eq!(rule.actions[0].action_type, ActionKind::Reminder);
        assert_eq!(
            rule.actions[0].parameters["message"],
            "stand up and stretch"
        );
    }

    #[test]
    fn recurring_rule_with_minutes_and_unknown_frequency() {
        let rule = parser()
            .parse("every fortnight at 2:30pm, water the plants")
            .unwrap();

        match &rule.spec {
            TriggerSpec::Time {
                time, enabled_days, ..
            } => {
                assert_eq!(time, "2:30pm");
                // Unknown frequency fails closed: no enabled days.
                assert!(enabled_days.is_empty());
            }
            other => panic!("expected time spec, got {other:?}"),
        }
    }

    #[test]
    fn voice_rule() {
        let rule = parser()
            .parse("when I say 'focus mode', turn off notifications")
            .unwrap();

        assert_eq!(rule.name, "Voice command: focus mode");
        match &rule.spec {
            TriggerSpec::Voice {
                phrase,
                exact_match,
            } => {
                assert_eq!(phrase, "focus mode");
                assert!(!exact_match);
            }
            other => panic!("expected voice spec, got {other:?}"),
        }

        assert_eq!(rule.actions[0].action_type, ActionKind::Command);
        assert_eq!(
            rule.actions[0].parameters["command"],
            "turn off notifications"
        );
        assert_eq!(rule.actions[0].parameters["speak_response"], true);
    }

    #[test]
    fn voice_rule_accepts_double_quotes() {
        let rule = parser()
            .parse(r#"when I say "good night", dim the lights"#)
            .unwrap();
        match &rule.spec {
            TriggerSpec::Voice { phrase, .. } => assert_eq!(phrase, "good night"),
            other => panic!("expected voice spec, got {other:?}"),
        }
    }

    #[test]
    fn weekly_condition_rule() {
        let rule = parser()
            .parse("if it's Friday afternoon, suggest weekend plans")
            .unwrap();

        assert_eq!(rule.name, "Friday afternoon automation");
        match &rule.spec {
            TriggerSpec::Condition {
                day_of_week,
                time_of_day,
            } => {
                assert_eq!(*day_of_week, Some(DayOfWeek::Friday));
                assert_eq!(*time_of_day, Some(TimeOfDay::Afternoon));
            }
            other => panic!("expected condition spec, got {other:?}"),
        }

        assert_eq!(rule.actions[0].action_type, ActionKind::Notification);
        assert_eq!(rule.actions[0].parameters["title"], "Friday afternoon");
        assert_eq!(
            rule.actions[0].parameters["message"],
            "suggest weekend plans"
        );
    }

    #[test]
    fn weekly_condition_with_unknown_day_falls_back() {
        let rule = parser()
            .parse("if it's payday morning, celebrate")
            .unwrap();
        assert_eq!(rule.spec, TriggerSpec::Manual {});
    }

    #[test]
    fn unrecognized_command_falls_back_to_manual() {
        let original = "make me a sandwich";
        let rule = parser().parse(original).unwrap();

        assert_eq!(rule.name, "Custom Automation");
        assert_eq!(rule.trigger_name, "Manual trigger");
        assert_eq!(rule.spec, TriggerSpec::Manual {});
        assert_eq!(rule.actions[0].action_type, ActionKind::Command);
        assert_eq!(rule.actions[0].parameters["command"], original);
        assert_eq!(rule.actions[0].parameters["speak_response"], false);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        let rule = parser()
            .parse("EVERY MORNING AT 8AM, take vitamins")
            .unwrap();
        match &rule.spec {
            TriggerSpec::Time {
                frequency,
                enabled_days,
                ..
            } => {
                assert_eq!(frequency.as_deref(), Some("morning"));
                assert_eq!(enabled_days.len(), 7);
            }
            other => panic!("expected time spec, got {other:?}"),
        }
    }

    #[test]
    fn recurring_takes_priority_over_fallback() {
        // A sentence that also happens to contain quoting still matches the
        // recurring recognizer first.
        let rule = parser()
            .parse("every monday at 10am, say 'hello team' in chat")
            .unwrap();
        assert_eq!(rule.spec.type_name(), "time");
    }
}
