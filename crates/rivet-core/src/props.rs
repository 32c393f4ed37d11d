//! Untyped name/value property table.
//!
//! A handful of names have fixed semantics; everything else echoes the
//! caller's default, and setters are always no-ops.

use crate::session::Session;

pub const KEY_PLAYER_HEIGHT: &str = "PlayerHeight";
pub const KEY_EYE_HEIGHT: &str = "EyeHeight";
pub const KEY_NECK_TO_EYE_DISTANCE: &str = "NeckEyeDistance";
pub const KEY_GENDER: &str = "Gender";

pub const DEFAULT_PLAYER_HEIGHT: f32 = 1.778;
pub const DEFAULT_EYE_HEIGHT: f32 = 1.675;
pub const DEFAULT_NECK_TO_EYE_HORIZONTAL: f32 = 0.0805;
pub const DEFAULT_NECK_TO_EYE_VERTICAL: f32 = 0.075;
pub const DEFAULT_GENDER: &str = "Unknown";

impl Session {
    pub fn get_property_bool(&mut self, _name: &str, default: bool) -> bool {
        default
    }

    pub fn get_property_int(&mut self, name: &str, default: i32) -> i32 {
        if name == "TextureSwapChainDepth" {
            return self.config.swapchain_depth;
        }
        default
    }

    pub fn get_property_float(&mut self, name: &str, default: f32) -> f32 {
        match name {
            "IPD" => {
                // Locate the eyes in view space to compute the distance.
                match self.eye_views() {
                    Ok(views) => views[0].pose.position.distance(views[1].pose.position),
                    Err(_) => 0.0,
                }
            }
            "VsyncToNextVsync" => {
                self.current_frame().predicted_display_period as f32 / 1e9
            }
            KEY_PLAYER_HEIGHT => DEFAULT_PLAYER_HEIGHT,
            KEY_EYE_HEIGHT => DEFAULT_EYE_HEIGHT,
            _ => default,
        }
    }

    /// Writes into `values`, returning how many entries were filled.
    pub fn get_property_float_array(&mut self, name: &str, values: &mut [f32]) -> u32 {
        if name == KEY_NECK_TO_EYE_DISTANCE {
            if values.len() < 2 {
                return 0;
            }
            values[0] = DEFAULT_NECK_TO_EYE_HORIZONTAL;
            values[1] = DEFAULT_NECK_TO_EYE_VERTICAL;
            return 2;
        }
        0
    }

    pub fn get_property_string<'a>(&mut self, name: &str, default: &'a str) -> &'a str {
        if name == KEY_GENDER {
            return DEFAULT_GENDER;
        }
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::headless::HeadlessRuntime;

    fn session() -> Session {
        Session::create(Box::new(HeadlessRuntime::new()), Config::default()).unwrap()
    }

    #[test]
    fn ipd_comes_from_eye_separation() {
        let mut session = session();
        let ipd = session.get_property_float("IPD", 0.0);
        assert!((ipd - 0.064).abs() < 1e-4);
    }

    #[test]
    fn vsync_interval_follows_predicted_period() {
        let mut session = session();
        session.wait_to_begin_frame(0).unwrap();
        let period = session.current_frame().predicted_display_period;
        let seconds = session.get_property_float("VsyncToNextVsync", 0.0);
        assert!((seconds - period as f32 / 1e9).abs() < 1e-6);
    }

    #[test]
    fn unknown_names_echo_defaults() {
        let mut session = session();
        assert_eq!(session.get_property_int("NoSuchProperty", 17), 17);
        assert_eq!(session.get_property_float("NoSuchProperty", 2.5), 2.5);
        assert!(session.get_property_bool("QueueAheadEnabled", true));
        assert_eq!(session.get_property_string("NoSuchProperty", "x"), "x");
    }

    #[test]
    fn swapchain_depth_reports_configured_value() {
        let config = Config {
            swapchain_depth: 5,
            ..Default::default()
        };
        let mut session = Session::create(Box::new(HeadlessRuntime::new()), config).unwrap();
        assert_eq!(session.get_property_int("TextureSwapChainDepth", 0), 5);
    }

    #[test]
    fn neck_to_eye_fills_two_entries() {
        let mut session = session();
        let mut values = [0.0f32; 2];
        assert_eq!(
            session.get_property_float_array(KEY_NECK_TO_EYE_DISTANCE, &mut values),
            2
        );
        assert_eq!(values, [DEFAULT_NECK_TO_EYE_HORIZONTAL, DEFAULT_NECK_TO_EYE_VERTICAL]);
        let mut short = [0.0f32; 1];
        assert_eq!(
            session.get_property_float_array(KEY_NECK_TO_EYE_DISTANCE, &mut short),
            0
        );
    }
}
