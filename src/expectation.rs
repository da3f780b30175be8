//! The single in-flight "what can happen next" gate on a Board.
//!
//! Kept as explicit state, per the original's "expected message" field,
//! rather than scattered assertions inside each handler: the dispatch rule
//! in the Board documents one policy against this one value.

use std::time::{Duration, Instant};

use crate::board_layout::EXPECTATION_TIMEOUT_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundEvent {
    SelectQuadrant,
    DiceRoll,
    MovePawn,
    TurnCompleted,
}

impl InboundEvent {
    /// Parses the wire `<Class>.<Method>` event name into a closed variant,
    /// replacing the original's reflection-based dispatch.
    pub fn parse(event_name: &str) -> Option<Self> {
        match event_name {
            "Board.SelectQuadrant" => Some(Self::SelectQuadrant),
            "Board.DiceRoll" => Some(Self::DiceRoll),
            "Board.MovePawn" => Some(Self::MovePawn),
            "Board.TurnCompleted" => Some(Self::TurnCompleted),
            _ => None,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::SelectQuadrant => "Board.SelectQuadrant",
            Self::DiceRoll => "Board.DiceRoll",
            Self::MovePawn => "Board.MovePawn",
            Self::TurnCompleted => "Board.TurnCompleted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpectedMessage {
    pub event: InboundEvent,
    pub quadrant: Option<String>,
    pub player_id: String,
    pub installed_at: Instant,
    pub timeout: Duration,
    pub steps: Option<i32>,
}

impl ExpectedMessage {
    pub fn new(event: InboundEvent, player_id: impl Into<String>, quadrant: Option<String>) -> Self {
        Self {
            event,
            quadrant,
            player_id: player_id.into(),
            installed_at: Instant::now(),
            timeout: Duration::from_secs(EXPECTATION_TIMEOUT_SECS),
            steps: None,
        }
    }

    pub fn with_steps(mut self, steps: i32) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.installed_at.elapsed() >= self.timeout
    }

    /// The three-way match required by the dispatch rule: event name, sender,
    /// and (when the expectation names one) sender's current quadrant.
    pub fn matches(&self, event: InboundEvent, player_id: &str, player_quadrant: Option<&str>) -> bool {
        if self.event != event || self.player_id != player_id {
            return false;
        }
        match (&self.quadrant, player_quadrant) {
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_events_only() {
        assert_eq!(InboundEvent::parse("Board.DiceRoll"), Some(InboundEvent::DiceRoll));
        assert_eq!(InboundEvent::parse("Board.Nonsense"), None);
    }

    #[test]
    fn matches_requires_all_three_fields() {
        let exp = ExpectedMessage::new(InboundEvent::MovePawn, "p1", Some("QUADRANT_1".into()));
        assert!(exp.matches(InboundEvent::MovePawn, "p1", Some("QUADRANT_1")));
        assert!(!exp.matches(InboundEvent::MovePawn, "p2", Some("QUADRANT_1")));
        assert!(!exp.matches(InboundEvent::MovePawn, "p1", Some("QUADRANT_2")));
        assert!(!exp.matches(InboundEvent::DiceRoll, "p1", Some("QUADRANT_1")));
    }
}
