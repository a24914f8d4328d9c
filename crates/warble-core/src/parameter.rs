//! Parameter surface: identifiers, ranges, cross-thread targets and the
//! serializable patch snapshot.
//!
//! Normalized (0.0-1.0) ↔ real value conversion follows the usual plugin
//! convention so a host can drive every parameter from a normalized knob.

use crate::lockfree::AtomicFloat;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a parameter value is scaled between normalized (0-1) and real values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParameterScale {
    /// `real = min + normalized * (max - min)`
    #[default]
    Linear,

    /// `real = min * (max/min)^normalized`. Requires `min > 0`.
    Logarithmic,

    /// Discrete integer steps between `min` and `max`.
    Stepped,

    /// normalized < 0.5 = `min`, otherwise `max`.
    Toggle,
}

/// Valid range, default and scaling of one parameter.
#[derive(Debug, Clone)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub scale: ParameterScale,
}

impl ParameterRange {
    pub fn new(min: f32, max: f32, default: f32, scale: ParameterScale) -> Self {
        debug_assert!(max > min, "max must be greater than min");
        Self {
            min,
            max,
            default: default.clamp(min, max),
            scale,
        }
    }

    pub fn linear(min: f32, max: f32, default: f32) -> Self {
        Self::new(min, max, default, ParameterScale::Linear)
    }

    pub fn logarithmic(min: f32, max: f32, default: f32) -> Self {
        debug_assert!(min > 0.0, "logarithmic scale requires min > 0");
        Self::new(min, max, default, ParameterScale::Logarithmic)
    }

    pub fn stepped(min: f32, max: f32, default: f32) -> Self {
        Self::new(min, max, default, ParameterScale::Stepped)
    }

    pub fn toggle(default_on: bool) -> Self {
        Self::new(
            0.0,
            1.0,
            if default_on { 1.0 } else { 0.0 },
            ParameterScale::Toggle,
        )
    }

    /// Clamp a real value into the range, snapping stepped/toggle values.
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.default
        };
        match self.scale {
            ParameterScale::Stepped => value.round(),
            ParameterScale::Toggle => {
                if value >= 0.5 {
                    self.max
                } else {
                    self.min
                }
            }
            _ => value,
        }
    }

    /// Convert a normalized 0-1 value to a real value.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let n = normalized.clamp(0.0, 1.0);
        let real = match self.scale {
            ParameterScale::Linear | ParameterScale::Stepped | ParameterScale::Toggle => {
                self.min + n * (self.max - self.min)
            }
            ParameterScale::Logarithmic => self.min * (self.max / self.min).powf(n),
        };
        self.clamp(real)
    }

    /// Convert a real value to normalized 0-1.
    pub fn normalize(&self, real: f32) -> f32 {
        let real = self.clamp(real);
        match self.scale {
            ParameterScale::Linear | ParameterScale::Stepped | ParameterScale::Toggle => {
                (real - self.min) / (self.max - self.min)
            }
            ParameterScale::Logarithmic => (real / self.min).ln() / (self.max / self.min).ln(),
        }
    }
}

/// Identifier of every engine parameter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ParamId {
    /// Vibrato depth, 0..1 of the available delay headroom.
    Depth,
    /// Rate of modulator slot 0 in Hz.
    Rate0,
    /// Rate of modulator slot 1 in Hz.
    Rate1,
    /// Crossfade between modulator slot 0 and slot 1.
    ModMix,
    /// Dry/wet blend.
    Mix,
    /// Stereo spread of the modulation signal.
    Width,
    /// Center delay of the vibrato read head in milliseconds.
    BaseDelayMs,
    /// Waveform of modulator slot 0 (stepped shape index).
    Shape0,
    /// Waveform of modulator slot 1 (stepped shape index).
    Shape1,
    /// Envelope follower attack in milliseconds.
    EnvAttackMs,
    /// Envelope follower release in milliseconds.
    EnvReleaseMs,
    /// 0 = left/right processing, 1 = mid/side processing.
    StereoMode,
}

impl ParamId {
    pub const COUNT: usize = 12;

    pub fn all() -> &'static [ParamId] {
        &[
            ParamId::Depth,
            ParamId::Rate0,
            ParamId::Rate1,
            ParamId::ModMix,
            ParamId::Mix,
            ParamId::Width,
            ParamId::BaseDelayMs,
            ParamId::Shape0,
            ParamId::Shape1,
            ParamId::EnvAttackMs,
            ParamId::EnvReleaseMs,
            ParamId::StereoMode,
        ]
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamId::Depth => "depth",
            ParamId::Rate0 => "rate0",
            ParamId::Rate1 => "rate1",
            ParamId::ModMix => "mod_mix",
            ParamId::Mix => "mix",
            ParamId::Width => "width",
            ParamId::BaseDelayMs => "base_delay_ms",
            ParamId::Shape0 => "shape0",
            ParamId::Shape1 => "shape1",
            ParamId::EnvAttackMs => "env_attack_ms",
            ParamId::EnvReleaseMs => "env_release_ms",
            ParamId::StereoMode => "stereo_mode",
        }
    }

    pub fn from_name(name: &str) -> Option<ParamId> {
        ParamId::all().iter().copied().find(|id| id.name() == name)
    }

    pub fn range(&self) -> ParameterRange {
        match self {
            ParamId::Depth => ParameterRange::linear(0.0, 1.0, 0.3),
            ParamId::Rate0 => ParameterRange::logarithmic(0.01, 40.0, 2.0),
            ParamId::Rate1 => ParameterRange::logarithmic(0.01, 40.0, 0.25),
            ParamId::ModMix => ParameterRange::linear(0.0, 1.0, 0.0),
            ParamId::Mix => ParameterRange::linear(0.0, 1.0, 1.0),
            ParamId::Width => ParameterRange::linear(0.0, 1.0, 0.6),
            ParamId::BaseDelayMs => ParameterRange::linear(1.0, 20.0, 3.0),
            ParamId::Shape0 => ParameterRange::stepped(0.0, 4.0, 0.0),
            ParamId::Shape1 => ParameterRange::stepped(0.0, 4.0, 2.0),
            ParamId::EnvAttackMs => ParameterRange::logarithmic(0.1, 500.0, 10.0),
            ParamId::EnvReleaseMs => ParameterRange::logarithmic(1.0, 2000.0, 150.0),
            ParamId::StereoMode => ParameterRange::toggle(false),
        }
    }
}

/// Cross-thread parameter target table.
///
/// One cache-line aligned [`AtomicFloat`] per parameter. The control thread
/// stores clamped targets; the audio thread reads them once per block.
#[derive(Debug)]
pub struct Params {
    targets: [AtomicFloat; ParamId::COUNT],
}

impl Params {
    pub fn new() -> Self {
        let targets =
            core::array::from_fn(|i| AtomicFloat::new(ParamId::all()[i].range().default));
        Self { targets }
    }

    /// Store a target. Out-of-range values are clamped, never rejected.
    #[inline]
    pub fn set(&self, id: ParamId, value: f32) {
        self.targets[id.index()].set(id.range().clamp(value));
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.targets[id.index()].get()
    }

    /// Snapshot all current targets into a patch.
    pub fn snapshot(&self) -> PatchState {
        let mut values = BTreeMap::new();
        for &id in ParamId::all() {
            values.insert(id, self.get(id));
        }
        PatchState { values }
    }

    /// Apply a patch: present values are clamped into range, missing
    /// parameters fall back to their defaults. Never fails.
    pub fn apply_patch(&self, patch: &PatchState) {
        for &id in ParamId::all() {
            let range = id.range();
            let value = patch
                .values
                .get(&id)
                .map(|v| range.clamp(*v))
                .unwrap_or(range.default);
            self.targets[id.index()].set(value);
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all parameter values.
///
/// Ordered by [`ParamId`] so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PatchState {
    pub values: BTreeMap<ParamId, f32>,
}

impl PatchState {
    pub fn get(&self, id: ParamId) -> Option<f32> {
        self.values.get(&id).copied()
    }

    pub fn set(&mut self, id: ParamId, value: f32) {
        self.values.insert(id, value);
    }

    pub fn to_json(&self) -> String {
        let named: BTreeMap<&str, f32> =
            self.values.iter().map(|(id, v)| (id.name(), *v)).collect();
        // a string/number map cannot fail to serialize
        serde_json::to_string(&named).unwrap_or_default()
    }

    /// Lenient parse: unknown keys are ignored, out-of-range values are kept
    /// (they are clamped when the patch is applied). Only malformed JSON is
    /// an error.
    pub fn from_json(json: &str) -> Result<Self> {
        let named: BTreeMap<String, f32> =
            serde_json::from_str(json).map_err(|e| Error::InvalidPatch(e.to_string()))?;
        let mut values = BTreeMap::new();
        for (name, value) in named {
            if let Some(id) = ParamId::from_name(&name) {
                values.insert(id, value);
            }
        }
        Ok(Self { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_linear_denormalize() {
        let range = ParameterRange::linear(0.0, 10.0, 5.0);
        assert_relative_eq!(range.denormalize(0.5), 5.0);
        assert_relative_eq!(range.normalize(2.5), 0.25);
    }

    #[test]
    fn test_logarithmic_midpoint_is_geometric_mean() {
        let range = ParameterRange::logarithmic(0.01, 40.0, 2.0);
        let mid = range.denormalize(0.5);
        assert_relative_eq!(mid, (0.01f32 * 40.0).sqrt(), max_relative = 1e-4);
    }

    #[test]
    fn test_clamp_snaps_stepped_and_toggle() {
        let stepped = ParameterRange::stepped(0.0, 4.0, 0.0);
        assert_eq!(stepped.clamp(2.4), 2.0);
        assert_eq!(stepped.clamp(9.0), 4.0);

        let toggle = ParameterRange::toggle(false);
        assert_eq!(toggle.clamp(0.4), 0.0);
        assert_eq!(toggle.clamp(0.6), 1.0);
    }

    #[test]
    fn test_clamp_replaces_non_finite_with_default() {
        let range = ParameterRange::linear(0.0, 1.0, 0.3);
        assert_eq!(range.clamp(f32::NAN), 0.3);
        assert_eq!(range.clamp(f32::INFINITY), 0.3);
    }

    #[test]
    fn test_params_defaults() {
        let params = Params::new();
        assert_eq!(params.get(ParamId::Mix), 1.0);
        assert_eq!(params.get(ParamId::Depth), 0.3);
    }

    #[test]
    fn test_params_set_clamps() {
        let params = Params::new();
        params.set(ParamId::Depth, 7.0);
        assert_eq!(params.get(ParamId::Depth), 1.0);
        params.set(ParamId::Rate0, -3.0);
        assert_eq!(params.get(ParamId::Rate0), 0.01);
    }

    #[test]
    fn test_patch_round_trip() {
        let params = Params::new();
        params.set(ParamId::Depth, 0.7);
        params.set(ParamId::Rate0, 5.0);

        let patch = params.snapshot();
        let json = patch.to_json();
        let restored = PatchState::from_json(&json).unwrap();

        let other = Params::new();
        other.apply_patch(&restored);
        assert_relative_eq!(other.get(ParamId::Depth), 0.7);
        assert_relative_eq!(other.get(ParamId::Rate0), 5.0);
    }

    #[test]
    fn test_patch_ignores_unknown_and_defaults_missing() {
        let patch =
            PatchState::from_json(r#"{"depth": 0.9, "no_such_param": 3.0}"#).unwrap();
        let params = Params::new();
        params.apply_patch(&patch);
        assert_relative_eq!(params.get(ParamId::Depth), 0.9);
        // missing entries fall back to defaults
        assert_eq!(params.get(ParamId::Mix), 1.0);
    }

    #[test]
    fn test_patch_out_of_range_is_clamped_on_apply() {
        let patch = PatchState::from_json(r#"{"depth": 42.0, "rate0": -1.0}"#).unwrap();
        let params = Params::new();
        params.apply_patch(&patch);
        assert_eq!(params.get(ParamId::Depth), 1.0);
        assert_eq!(params.get(ParamId::Rate0), 0.01);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(PatchState::from_json("not json").is_err());
    }

    proptest! {
        #[test]
        fn prop_normalize_round_trip(n in 0.0f32..=1.0) {
            for &id in ParamId::all() {
                let range = id.range();
                let real = range.denormalize(n);
                let back = range.denormalize(range.normalize(real));
                prop_assert!((real - back).abs() < 1e-3 * (1.0 + real.abs()));
            }
        }

        #[test]
        fn prop_clamp_is_idempotent(v in -1e6f32..1e6) {
            for &id in ParamId::all() {
                let range = id.range();
                let once = range.clamp(v);
                prop_assert_eq!(once, range.clamp(once));
            }
        }
    }
}
