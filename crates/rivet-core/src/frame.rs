//! Frame pipeline.
//!
//! The legacy API lets the client submit whenever it likes; the target
//! runtime wants an explicit wait → begin → end cadence. A two-slot ring
//! carries the predicted timing for the frame in flight and the frame
//! being waited on, and the legacy one-shot submit is composed out of the
//! three explicit phases.

use crate::error::ShimResult;
use crate::layers::{LegacyLayer, ViewScale};
use crate::session::{FrameSlot, Session, MAX_FRAMES};

impl Session {
    /// Rotate to the next slot, block in the runtime's frame wait and
    /// stamp the slot one ahead of the client's index.
    pub fn wait_to_begin_frame(&mut self, frame_index: i64) -> ShimResult<()> {
        let next = (self.current + 1) % MAX_FRAMES;
        let timing = self.runtime.wait_frame()?;
        self.frames[next] = FrameSlot {
            predicted_display_time: timing.predicted_display_time,
            predicted_display_period: timing.predicted_display_period,
            frame_index: frame_index + 1,
        };
        self.current = next;
        Ok(())
    }

    /// Wait on every chain committed since the last begin, then open the
    /// frame.
    pub fn begin_frame(&mut self, _frame_index: i64) -> ShimResult<()> {
        {
            let mut pending = self
                .acquired
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            while let Some(chain) = pending.pop_front() {
                self.runtime.wait_image(chain)?;
            }
        }
        self.runtime.begin_frame()?;
        Ok(())
    }

    /// Translate the layer list and close the frame at the current slot's
    /// predicted display time.
    pub fn end_frame(
        &mut self,
        _frame_index: i64,
        view_scale: Option<ViewScale>,
        layers: &[Option<LegacyLayer>],
    ) -> ShimResult<()> {
        let translated = self.translate_layers(layers, view_scale);
        let display_time = self.current_frame().predicted_display_time;
        self.runtime.end_frame(display_time, &translated)?;
        Ok(())
    }

    /// Legacy one-shot submit: end this frame, then wait and begin the
    /// next so the client can keep rendering immediately.
    pub fn submit_frame(
        &mut self,
        frame_index: i64,
        view_scale: Option<ViewScale>,
        layers: &[Option<LegacyLayer>],
    ) -> ShimResult<()> {
        let frame_index = if frame_index <= 0 {
            self.current_frame().frame_index
        } else {
            frame_index
        };
        self.end_frame(frame_index, view_scale, layers)?;
        self.wait_to_begin_frame(frame_index + 1)?;
        self.begin_frame(frame_index + 1)?;
        Ok(())
    }

    /// Wall-clock display time predicted for `frame_index`, or the current
    /// frame when the index is not positive. Returns 0.0 when the runtime
    /// cannot convert its timestamps.
    pub fn predicted_display_time(&mut self, frame_index: i64) -> f64 {
        let slot = self.current_frame();
        let mut display_time = slot.predicted_display_time;
        if frame_index > 0 {
            display_time +=
                slot.predicted_display_period * (slot.frame_index - frame_index);
        }
        self.runtime.time_to_seconds(display_time).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::headless::HeadlessRuntime;

    fn session() -> (Session, crate::headless::HeadlessHandle) {
        let runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        let session = Session::create(Box::new(runtime), Config::default()).unwrap();
        (session, handle)
    }

    #[test]
    fn wait_stamps_one_ahead_of_client() {
        let (mut session, _) = session();
        session.wait_to_begin_frame(0).unwrap();
        assert_eq!(session.current_frame().frame_index, 1);
        session.wait_to_begin_frame(1).unwrap();
        assert_eq!(session.current_frame().frame_index, 2);
    }

    #[test]
    fn slot_indices_strictly_increase() {
        let (mut session, _) = session();
        let mut last = session.current_frame().frame_index;
        for i in 0..20 {
            session.wait_to_begin_frame(i).unwrap();
            session.begin_frame(i).unwrap();
            session.end_frame(i, None, &[]).unwrap();
            let index = session.current_frame().frame_index;
            assert!(index > last);
            last = index;
        }
    }

    #[test]
    fn predicted_time_extrapolates_by_period() {
        let (mut session, handle) = session();
        session.wait_to_begin_frame(0).unwrap();
        session.wait_to_begin_frame(1).unwrap();
        let stamp = session.current_frame().frame_index;
        let period = handle.predicted_period();
        let now = session.predicted_display_time(stamp);
        let earlier = session.predicted_display_time(stamp - 1);
        assert!((earlier - now - period as f64 * 1e-9).abs() < 1e-9);
    }

    #[test]
    fn predicted_time_zero_when_conversion_fails() {
        let (mut session, handle) = session();
        session.wait_to_begin_frame(0).unwrap();
        handle.fail_time_conversion(true);
        assert_eq!(session.predicted_display_time(1), 0.0);
    }
}
