//! Presentation lifecycle state machine.
//!
//! A presentation moves `PendingText -> PendingVisuals` once its slide text
//! exists and a visual batch is submitted, then to exactly one of the two
//! terminal states. `GenerationFailed` is also reachable directly from
//! `PendingVisuals` via cancellation or a fast-fail from a slide job.
//! There are no transitions out of a terminal state; per-slide regeneration
//! afterwards never changes presentation-level status.

/// Status of a presentation, stored as TEXT in the `presentations` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationStatus {
    /// Initial state, slide text generation is pending.
    PendingText,
    /// Text exists, the visual generation batch is in flight.
    PendingVisuals,
    /// All visuals generated, presentation is ready.
    VisualsComplete,
    /// Generation failed or was cancelled.
    GenerationFailed,
}

impl PresentationStatus {
    /// String representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationStatus::PendingText => "pending_text",
            PresentationStatus::PendingVisuals => "pending_visuals",
            PresentationStatus::VisualsComplete => "visuals_complete",
            PresentationStatus::GenerationFailed => "generation_failed",
        }
    }

    /// Parse from a stored string, defaulting to `GenerationFailed` for
    /// unknown values so a corrupted row is never mistaken for in-flight.
    pub fn from_str(s: &str) -> Self {
        match s {
            "pending_text" => PresentationStatus::PendingText,
            "pending_visuals" => PresentationStatus::PendingVisuals,
            "visuals_complete" => PresentationStatus::VisualsComplete,
            _ => PresentationStatus::GenerationFailed,
        }
    }

    /// Whether this state admits no further batch-level transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PresentationStatus::VisualsComplete | PresentationStatus::GenerationFailed
        )
    }

    /// The set of valid target states reachable from this state.
    pub fn valid_transitions(&self) -> &'static [PresentationStatus] {
        match self {
            PresentationStatus::PendingText => &[PresentationStatus::PendingVisuals],
            PresentationStatus::PendingVisuals => &[
                PresentationStatus::VisualsComplete,
                PresentationStatus::GenerationFailed,
            ],
            PresentationStatus::VisualsComplete | PresentationStatus::GenerationFailed => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(&self, to: PresentationStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_storage_strings() {
        for status in [
            PresentationStatus::PendingText,
            PresentationStatus::PendingVisuals,
            PresentationStatus::VisualsComplete,
            PresentationStatus::GenerationFailed,
        ] {
            assert_eq!(PresentationStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn unknown_string_parses_as_failed() {
        assert_eq!(
            PresentationStatus::from_str("half_done"),
            PresentationStatus::GenerationFailed
        );
    }

    #[test]
    fn pending_text_only_advances_to_pending_visuals() {
        let s = PresentationStatus::PendingText;
        assert!(s.can_transition(PresentationStatus::PendingVisuals));
        assert!(!s.can_transition(PresentationStatus::VisualsComplete));
        assert!(!s.can_transition(PresentationStatus::GenerationFailed));
    }

    #[test]
    fn pending_visuals_reaches_both_terminals() {
        let s = PresentationStatus::PendingVisuals;
        assert!(s.can_transition(PresentationStatus::VisualsComplete));
        assert!(s.can_transition(PresentationStatus::GenerationFailed));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        assert!(PresentationStatus::VisualsComplete.valid_transitions().is_empty());
        assert!(PresentationStatus::GenerationFailed.valid_transitions().is_empty());
        assert!(PresentationStatus::VisualsComplete.is_terminal());
        assert!(PresentationStatus::GenerationFailed.is_terminal());
        assert!(!PresentationStatus::PendingVisuals.is_terminal());
    }
}
