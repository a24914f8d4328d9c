//! Builder for configuring and constructing a [`WarbleEngine`].

use crate::{Error, Result, WarbleEngine};
use warble_core::PatchState;

/// Construction-time configuration.
///
/// The oversampling factor is structural (it sizes filters and scratch
/// buffers), so it lives here rather than in the parameter surface; it can
/// still be changed later through
/// [`WarbleEngine::set_oversampling_factor`], which re-prepares.
///
/// # Example
///
/// ```
/// use warble::WarbleEngine;
///
/// let mut engine = WarbleEngine::builder()
///     .oversampling(2)
///     .build()
///     .unwrap();
/// engine.prepare(48000.0, 256, 2).unwrap();
/// ```
pub struct WarbleEngineBuilder {
    oversampling: usize,
    initial_patch: Option<PatchState>,
}

impl WarbleEngineBuilder {
    pub fn new() -> Self {
        Self {
            oversampling: 2,
            initial_patch: None,
        }
    }

    /// Oversampling factor: 1 (bypass), 2 or 4.
    pub fn oversampling(mut self, factor: usize) -> Self {
        self.oversampling = factor;
        self
    }

    /// Parameter values the engine starts from instead of the defaults.
    pub fn initial_patch(mut self, patch: PatchState) -> Self {
        self.initial_patch = Some(patch);
        self
    }

    pub fn build(self) -> Result<WarbleEngine> {
        if !matches!(self.oversampling, 1 | 2 | 4) {
            return Err(Error::InvalidOversamplingFactor(self.oversampling));
        }
        let engine = WarbleEngine::with_factor(self.oversampling);
        if let Some(patch) = self.initial_patch {
            engine.params().load_patch(patch);
        }
        Ok(engine)
    }
}

impl Default for WarbleEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warble_core::ParamId;

    #[test]
    fn test_default_builds() {
        let engine = WarbleEngineBuilder::new().build().unwrap();
        assert_eq!(engine.oversampling_factor(), 2);
    }

    #[test]
    fn test_invalid_factor_rejected() {
        assert!(WarbleEngineBuilder::new().oversampling(3).build().is_err());
    }

    #[test]
    fn test_initial_patch_is_applied_at_first_block() {
        let mut patch = PatchState::default();
        patch.set(ParamId::Depth, 0.9);

        let mut engine = WarbleEngineBuilder::new()
            .oversampling(1)
            .initial_patch(patch)
            .build()
            .unwrap();
        engine.prepare(48000.0, 64, 1).unwrap();

        let mut buf = vec![0.0f32; 64];
        let mut buffers: [&mut [f32]; 1] = [&mut buf];
        engine.process(&mut buffers);

        assert_eq!(engine.params().get(ParamId::Depth), 0.9);
    }
}
