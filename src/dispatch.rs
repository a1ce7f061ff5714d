//! Command dispatch
//!
//! Matches recognized utterances against the configured command rules and
//! forwards the first hit to the action sink.

use crate::config::CommandRule;
use crate::homeassistant::ActionSink;
use std::sync::Arc;
use tracing::{info, warn};

/// Maps utterance text to configured actions, first match wins
pub struct CommandDispatcher {
    rules: Vec<CommandRule>,
    sink: Arc<dyn ActionSink>,
}

impl CommandDispatcher {
    pub fn new(rules: Vec<CommandRule>, sink: Arc<dyn ActionSink>) -> Self {
        Self { rules, sink }
    }

    /// Try to dispatch `text` as a command.
    ///
    /// Returns true when a rule matched, whether or not the action itself
    /// succeeded. Rules are checked in configuration order and only the
    /// first match fires.
    pub fn dispatch(&self, text: &str) -> bool {
        for rule in &self.rules {
            if !rule.matches(text) {
                continue;
            }
            info!("Utterance matched command for {}", rule.entity_id);
            let message = match self.sink.trigger_action(&rule.entity_id) {
                Ok(()) => format!("Executing command for {}.", rule.entity_id),
                Err(e) => {
                    warn!("Command for {} failed: {}", rule.entity_id, e);
                    format!("Error executing command for {}.", rule.entity_id)
                }
            };
            if let Err(e) = self.sink.speak(&message) {
                warn!("Failed to announce command result: {}", e);
            }
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HearthError, Result};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        actions: Mutex<Vec<String>>,
        spoken: Mutex<Vec<String>>,
        fail_actions: bool,
    }

    impl ActionSink for RecordingSink {
        fn trigger_action(&self, entity_id: &str) -> Result<()> {
            self.actions.lock().push(entity_id.to_string());
            if self.fail_actions {
                return Err(HearthError::HomeAssistantError("unreachable".to_string()));
            }
            Ok(())
        }

        fn speak(&self, message: &str) -> Result<()> {
            self.spoken.lock().push(message.to_string());
            Ok(())
        }
    }

    fn rule(phrases: &[&str], entity_id: &str) -> CommandRule {
        CommandRule {
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
            entity_id: entity_id.to_string(),
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = CommandDispatcher::new(
            vec![
                rule(&["lights on"], "button.lights"),
                rule(&["lights"], "button.all_lights"),
            ],
            sink.clone(),
        );

        assert!(dispatcher.dispatch("turn the lights on please"));
        assert_eq!(*sink.actions.lock(), vec!["button.lights"]);
        assert_eq!(
            *sink.spoken.lock(),
            vec!["Executing command for button.lights."]
        );
    }

    #[test]
    fn test_no_match_leaves_sink_untouched() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher =
            CommandDispatcher::new(vec![rule(&["lights on"], "button.lights")], sink.clone());

        assert!(!dispatcher.dispatch("what time is it"));
        assert!(sink.actions.lock().is_empty());
        assert!(sink.spoken.lock().is_empty());
    }

    #[test]
    fn test_failed_action_is_reported_and_still_counts_as_match() {
        let sink = Arc::new(RecordingSink {
            fail_actions: true,
            ..RecordingSink::default()
        });
        let dispatcher =
            CommandDispatcher::new(vec![rule(&["fan"], "button.fan")], sink.clone());

        assert!(dispatcher.dispatch("start the fan"));
        assert_eq!(*sink.actions.lock(), vec!["button.fan"]);
        assert_eq!(
            *sink.spoken.lock(),
            vec!["Error executing command for button.fan."]
        );
    }

    #[test]
    fn test_later_rules_match_when_earlier_ones_do_not() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = CommandDispatcher::new(
            vec![
                rule(&["lights on"], "button.lights"),
                rule(&["coffee"], "button.coffee"),
            ],
            sink.clone(),
        );

        assert!(dispatcher.dispatch("make me some coffee"));
        assert_eq!(*sink.actions.lock(), vec!["button.coffee"]);
    }
}
