//! Observable events for squema
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Schema lifecycle
    /// A schema class was built and its tables fixed
    ClassRegistered,
    /// A class declaration was loaded into a registry
    DeclarationLoaded,
    /// A conversion policy with overrides was built
    PolicyBuilt,

    // CLI
    /// Command dispatch begins
    CommandStart,
    /// Command finished successfully
    CommandComplete,
    /// Command failed
    CommandFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ClassRegistered => "SCHEMA_CLASS_REGISTERED",
            Event::DeclarationLoaded => "SCHEMA_DECLARATION_LOADED",
            Event::PolicyBuilt => "SCHEMA_POLICY_BUILT",

            Event::CommandStart => "COMMAND_BEGIN",
            Event::CommandComplete => "COMMAND_COMPLETE",
            Event::CommandFailed => "COMMAND_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ClassRegistered | Event::DeclarationLoaded | Event::PolicyBuilt => {
                Severity::Trace
            }
            Event::CommandStart | Event::CommandComplete => Severity::Info,
            Event::CommandFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ClassRegistered,
            Event::DeclarationLoaded,
            Event::PolicyBuilt,
            Event::CommandStart,
            Event::CommandComplete,
            Event::CommandFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_schema_events_are_trace() {
        assert_eq!(Event::ClassRegistered.severity(), Severity::Trace);
        assert_eq!(Event::PolicyBuilt.severity(), Severity::Trace);
        assert_eq!(Event::CommandStart.severity(), Severity::Info);
        assert_eq!(Event::CommandFailed.severity(), Severity::Error);
    }

    #[test]
    fn test_failure_events_go_to_stderr_level() {
        assert_eq!(Event::CommandFailed.severity(), Severity::Error);
        assert!(Event::CommandComplete.severity() < Severity::Error);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::ClassRegistered), "SCHEMA_CLASS_REGISTERED");
    }
}
