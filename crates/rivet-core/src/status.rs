//! Denormalized session status.
//!
//! The raw event stream never reaches the client; every state change is
//! latched into this bit-set and copied out on each status query.

use crate::backend::SessionState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatusBits {
    pub hmd_present: bool,
    pub hmd_mounted: bool,
    pub is_visible: bool,
    pub has_input_focus: bool,
    pub display_lost: bool,
    pub should_quit: bool,
    pub should_recenter: bool,
    /// Declared for layout compatibility; nothing drives it.
    pub overlay_present: bool,
}

impl SessionStatusBits {
    pub fn apply_session_state(&mut self, state: SessionState) {
        match state {
            SessionState::Idle => self.hmd_present = true,
            SessionState::Ready => {
                self.is_visible = true;
                self.hmd_mounted = true;
            }
            SessionState::Synchronized => self.hmd_mounted = false,
            SessionState::Visible => {
                self.hmd_mounted = true;
                self.has_input_focus = false;
            }
            SessionState::Focused => self.has_input_focus = true,
            SessionState::Stopping => self.is_visible = false,
            SessionState::LossPending => self.display_lost = true,
            SessionState::Exiting => self.should_quit = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_marks_visible_and_mounted() {
        let mut bits = SessionStatusBits::default();
        bits.apply_session_state(SessionState::Ready);
        assert!(bits.is_visible);
        assert!(bits.hmd_mounted);
        assert!(!bits.has_input_focus);
    }

    #[test]
    fn visible_drops_focus_but_focused_restores_it() {
        let mut bits = SessionStatusBits::default();
        bits.apply_session_state(SessionState::Focused);
        assert!(bits.has_input_focus);
        bits.apply_session_state(SessionState::Visible);
        assert!(!bits.has_input_focus);
        assert!(bits.hmd_mounted);
    }

    #[test]
    fn loss_and_exit_latches_stay_set() {
        let mut bits = SessionStatusBits::default();
        bits.apply_session_state(SessionState::LossPending);
        bits.apply_session_state(SessionState::Exiting);
        bits.apply_session_state(SessionState::Focused);
        assert!(bits.display_lost);
        assert!(bits.should_quit);
    }
}
