//! Client version profile.
//!
//! Old clients were compiled against older SDK headers whose structures
//! differ in size and whose entry points behave differently. The profile is
//! set once at initialization from the minor version the client requested
//! and consulted wherever a binary layout or documented behavior changed.

use std::sync::OnceLock;

/// Which input-state structure revision the client was compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStateRevision {
    /// Pre-1.7: no no-deadzone members.
    V1,
    /// Pre-1.11: no raw members.
    V2,
    /// Current layout.
    V3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionProfile {
    minor: u32,
}

impl VersionProfile {
    pub fn new(minor: u32) -> Self {
        Self { minor }
    }

    pub fn minor(self) -> u32 {
        self.minor
    }

    /// Pre-1.17 clients expect eye poses flattened to orientation-only
    /// offsets in the render descriptor.
    pub fn eye_pose_is_3dof(self) -> bool {
        self.minor < 17
    }

    pub fn input_state_revision(self) -> InputStateRevision {
        if self.minor < 7 {
            InputStateRevision::V1
        } else if self.minor < 11 {
            InputStateRevision::V2
        } else {
            InputStateRevision::V3
        }
    }

    /// 1.25 introduced a 128-byte reserved block in the layer header;
    /// older clients lay their members out without it.
    pub fn has_layer_reserved_field(self) -> bool {
        self.minor >= 25
    }

    /// Pre-1.37 clients treat zero sensors as a loss of tracking, so
    /// virtual ones are reported.
    pub fn needs_virtual_trackers(self) -> bool {
        self.minor < 37
    }

    /// Pre-1.38 clients only know the first-generation headset type.
    pub fn assumes_first_gen_hmd(self) -> bool {
        self.minor < 38
    }
}

impl Default for VersionProfile {
    fn default() -> Self {
        Self::new(CURRENT_MINOR_VERSION)
    }
}

/// Minor version reported when the client does not request one.
pub const CURRENT_MINOR_VERSION: u32 = 43;

static PROFILE: OnceLock<VersionProfile> = OnceLock::new();

/// Install the process-wide profile. The first caller wins; later calls
/// return false and leave the installed profile untouched.
pub fn set_profile(profile: VersionProfile) -> bool {
    PROFILE.set(profile).is_ok()
}

/// The installed profile, or the current-version default.
pub fn profile() -> VersionProfile {
    PROFILE.get().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_thresholds() {
        assert_eq!(
            VersionProfile::new(5).input_state_revision(),
            InputStateRevision::V1
        );
        assert_eq!(
            VersionProfile::new(7).input_state_revision(),
            InputStateRevision::V2
        );
        assert_eq!(
            VersionProfile::new(10).input_state_revision(),
            InputStateRevision::V2
        );
        assert_eq!(
            VersionProfile::new(11).input_state_revision(),
            InputStateRevision::V3
        );
    }

    #[test]
    fn layer_reserved_threshold() {
        assert!(!VersionProfile::new(24).has_layer_reserved_field());
        assert!(VersionProfile::new(25).has_layer_reserved_field());
    }

    #[test]
    fn tracker_and_hmd_thresholds() {
        assert!(VersionProfile::new(36).needs_virtual_trackers());
        assert!(!VersionProfile::new(37).needs_virtual_trackers());
        assert!(VersionProfile::new(37).assumes_first_gen_hmd());
        assert!(!VersionProfile::new(38).assumes_first_gen_hmd());
    }
}
