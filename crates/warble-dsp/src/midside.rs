//! Mid/side stereo transform.
//!
//! `encode` maps a left/right pair onto sum and difference channels so that
//! depth and modulation width act independently on shared vs. differential
//! stereo content; `decode` is the exact algebraic inverse.

/// Channel interpretation of a stereo pair through the wet path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StereoMode {
    #[default]
    LeftRight,
    MidSide,
}

impl StereoMode {
    /// Toggle parameter value → mode.
    pub fn from_param(value: f32) -> Self {
        if value >= 0.5 {
            StereoMode::MidSide
        } else {
            StereoMode::LeftRight
        }
    }
}

/// In-place `(left, right)` → `(mid, side)`.
#[inline]
pub fn encode(left: &mut [f32], right: &mut [f32]) {
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let mid = (*l + *r) * 0.5;
        let side = (*l - *r) * 0.5;
        *l = mid;
        *r = side;
    }
}

/// In-place `(mid, side)` → `(left, right)`.
#[inline]
pub fn decode(mid: &mut [f32], side: &mut [f32]) {
    for (m, s) in mid.iter_mut().zip(side.iter_mut()) {
        let left = *m + *s;
        let right = *m - *s;
        *m = left;
        *s = right;
    }
}
