//! Timestamped events emitted from the render callback.

use serde::{Deserialize, Serialize};

/// Discriminant of an [`EventPayload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Parameter,
    NoteOn,
    NoteOff,
    BufferReady,
    Raw,
}

/// Event body. The bridge never inspects it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    Parameter { id: u32, value: f32 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    BufferReady { id: u32, frames: u32 },
    Raw([u8; 16]),
}

/// RT-safe event with sample-accurate timing.
///
/// Producers fill in `frame`, the offset within the current block. `time` is
/// stamped by the bridge at the end of the block as
/// `output_time + frame / sample_rate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Offset within the current block (0 = first sample).
    pub frame: u32,
    /// Absolute output time in seconds. Zero until stamped.
    pub time: f64,
    pub payload: EventPayload,
}

impl Event {
    /// Unstamped event at `frame` within the block.
    #[inline]
    pub fn new(frame: u32, payload: EventPayload) -> Self {
        Self {
            frame,
            time: 0.0,
            payload,
        }
    }

    #[inline]
    pub fn parameter(frame: u32, id: u32, value: f32) -> Self {
        Self::new(frame, EventPayload::Parameter { id, value })
    }

    #[inline]
    pub fn note_on(frame: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(
            frame,
            EventPayload::NoteOn {
                channel,
                note,
                velocity,
            },
        )
    }

    #[inline]
    pub fn note_off(frame: u32, channel: u8, note: u8) -> Self {
        Self::new(frame, EventPayload::NoteOff { channel, note })
    }

    /// A render-side buffer of `frames` frames is ready for the control thread.
    #[inline]
    pub fn buffer_ready(frame: u32, id: u32, frames: u32) -> Self {
        Self::new(frame, EventPayload::BufferReady { id, frames })
    }

    /// Opaque 16-byte payload for application-defined events.
    #[inline]
    pub fn raw(frame: u32, bytes: [u8; 16]) -> Self {
        Self::new(frame, EventPayload::Raw(bytes))
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Parameter { .. } => EventKind::Parameter,
            EventPayload::NoteOn { .. } => EventKind::NoteOn,
            EventPayload::NoteOff { .. } => EventKind::NoteOff,
            EventPayload::BufferReady { .. } => EventKind::BufferReady,
            EventPayload::Raw(_) => EventKind::Raw,
        }
    }

    /// Converts the block-relative frame into absolute output time.
    ///
    /// A non-finite result is stored as `0.0`, which makes the event due on
    /// the next control tick and keeps time ordering total.
    #[inline]
    pub fn stamp(&mut self, output_time: f64, sample_rate: f64) {
        let time = if sample_rate > 0.0 {
            output_time + self.frame as f64 / sample_rate
        } else {
            output_time
        };
        self.time = if time.is_finite() { time } else { 0.0 };
    }
}

/// Per-block information supplied by the owning audio engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderInfo {
    /// Samples per second.
    pub sample_rate: f64,
    /// Frames in the current block.
    pub num_frames: usize,
}

impl RenderInfo {
    pub fn new(sample_rate: f64, num_frames: usize) -> Self {
        Self {
            sample_rate,
            num_frames,
        }
    }

    /// Block length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.num_frames as f64 / self.sample_rate
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kind_matches_payload() {
        assert_eq!(Event::parameter(0, 1, 0.5).kind(), EventKind::Parameter);
        assert_eq!(Event::note_on(0, 0, 60, 100).kind(), EventKind::NoteOn);
        assert_eq!(Event::note_off(0, 0, 60).kind(), EventKind::NoteOff);
        assert_eq!(Event::buffer_ready(0, 3, 512).kind(), EventKind::BufferReady);
        assert_eq!(Event::raw(0, [0; 16]).kind(), EventKind::Raw);
    }

    #[test]
    fn test_stamp() {
        let mut event = Event::note_on(480, 0, 60, 100);
        event.stamp(2.0, 48000.0);
        assert_relative_eq!(event.time, 2.01, epsilon = 1e-9);
    }

    #[test]
    fn test_stamp_non_finite_output_time() {
        let mut event = Event::parameter(64, 1, 0.0);
        event.stamp(-f64::NAN, 48000.0);
        assert_eq!(event.time, 0.0);
        event.stamp(f64::INFINITY, 48000.0);
        assert_eq!(event.time, 0.0);
    }

    #[test]
    fn test_render_info_duration() {
        let info = RenderInfo::new(44100.0, 441);
        assert_relative_eq!(info.duration(), 0.01);
        assert_eq!(RenderInfo::new(0.0, 128).duration(), 0.0);
    }
}
