//! Visualization snapshot slot.
//!
//! The audio thread publishes a copy of display-relevant values once per
//! block; the UI reads the latest published snapshot on its own cadence.
//! Torn reads are tolerable there (display only) and nothing read here may
//! feed back into the control path.

use crate::lockfree::AtomicFloat;

/// Lock-free slot the audio thread writes visualization values into.
pub struct VizState {
    mod_left: AtomicFloat,
    mod_right: AtomicFloat,
    delay_ms: AtomicFloat,
}

impl VizState {
    pub fn new() -> Self {
        Self {
            mod_left: AtomicFloat::new(0.0),
            mod_right: AtomicFloat::new(0.0),
            delay_ms: AtomicFloat::new(0.0),
        }
    }

    /// Audio thread, once per block.
    #[inline]
    pub fn publish(&self, mod_left: f32, mod_right: f32, delay_ms: f32) {
        self.mod_left.set(mod_left);
        self.mod_right.set(mod_right);
        self.delay_ms.set(delay_ms);
    }

    /// Control/UI thread, any cadence.
    #[inline]
    pub fn read(&self) -> VizSnapshot {
        VizSnapshot {
            mod_left: self.mod_left.get(),
            mod_right: self.mod_right.get(),
            delay_ms: self.delay_ms.get(),
        }
    }
}

impl Default for VizState {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the latest published values.
#[derive(Debug, Clone, Copy, Default)]
pub struct VizSnapshot {
    /// Latest left-channel modulation value, -1..1.
    pub mod_left: f32,
    /// Latest right-channel modulation value, -1..1.
    pub mod_right: f32,
    /// Instantaneous vibrato delay of the left channel in milliseconds.
    pub delay_ms: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_read() {
        let viz = VizState::new();
        viz.publish(0.5, -0.5, 3.2);
        let snap = viz.read();
        assert_eq!(snap.mod_left, 0.5);
        assert_eq!(snap.mod_right, -0.5);
        assert_eq!(snap.delay_ms, 3.2);
    }
}
