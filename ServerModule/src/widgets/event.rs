//! # Widget Events
//!
//! Event types delivered to widget listeners and the session-scoped event
//! clock that stamps them.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rwt_shared::constants::events;

use super::{WidgetKey, WidgetTree};

/// Event types understood by the shipped widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Selection,
    Help,
    Show,
    Hide,
    Arm,
    Close,
}

impl EventType {
    /// Wire name, used both in `listen` and in inbound `notify`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selection => events::SELECTION,
            Self::Help => events::HELP,
            Self::Show => events::SHOW,
            Self::Hide => events::HIDE,
            Self::Arm => events::ARM,
            Self::Close => events::CLOSE,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Selection,
            Self::Help,
            Self::Show,
            Self::Hide,
            Self::Arm,
            Self::Close,
        ]
        .into_iter()
        .find(|event_type| event_type.as_str() == name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub widget: WidgetKey,
    /// Timestamp from the session's event clock
    pub time: u64,
    /// Listeners of vetoable events set this to false to cancel the action
    pub doit: bool,
}

/// Listener callback; receives the tree so it can mutate widgets
pub type Listener = Box<dyn FnMut(&mut WidgetTree, &mut Event) + Send>;

/// Handle returned when a listener is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Strictly increasing timestamps within one session
///
/// The first event takes the wall clock in milliseconds; every later event is
/// one greater than its predecessor.
#[derive(Debug, Default)]
pub struct EventClock {
    last: Option<u64>,
}

impl EventClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_time(&mut self) -> u64 {
        let time = match self.last {
            Some(last) => last + 1,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or(0),
        };
        self.last = Some(time);
        time
    }

    /// Timestamp of the most recent event, if any
    pub fn last_time(&self) -> Option<u64> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock = EventClock::new();
        let first = clock.next_time();
        assert!(first > 0);
        assert_eq!(clock.next_time(), first + 1);
        assert_eq!(clock.next_time(), first + 2);
        assert_eq!(clock.last_time(), Some(first + 2));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(EventType::from_name("Selection"), Some(EventType::Selection));
        assert_eq!(EventType::from_name("selection"), None);
        assert_eq!(EventType::Close.to_string(), "Close");
    }
}
