//! WarbleEngine: coordinates the signal path and its control plane.
//!
//! Per-block flow: snapshot the dry input, optionally encode mid/side,
//! upsample, render the smoothed control buffers and the modulation signal
//! at the oversampled rate, run the modulated delay read, downsample,
//! decode, blend against the latency-aligned dry copy, publish the
//! visualization snapshot.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use warble_core::parameter::Params;
use warble_core::{Error, ParamId, PatchState, Result, SmoothedValue, VizSnapshot, VizState};
use warble_dsp::{
    decode, encode, DryWetProcessor, ModShape, ModulationSystem, Oversampler, StereoMode,
    VibratoProcessor, KERNEL_HALF_WIDTH,
};

const MIN_SAMPLE_RATE: f64 = 8_000.0;
const MAX_SAMPLE_RATE: f64 = 384_000.0;

/// Time constant for the audible continuous parameters.
const SMOOTH_SECS: f32 = 0.020;
/// The read-head center moves slower so base-delay automation stays subtle.
const BASE_DELAY_SMOOTH_SECS: f32 = 0.050;

/// Control-thread surface of a [`WarbleEngine`].
///
/// Cloneable and cheap; scalar writes are atomic stores consumed at the
/// next block boundary, whole patches are applied coherently at one block
/// start.
#[derive(Clone)]
pub struct ParamHandle {
    params: Arc<Params>,
    pending: Arc<ArcSwapOption<PatchState>>,
}

impl ParamHandle {
    /// Store a parameter target; out-of-range values are clamped.
    pub fn set(&self, id: ParamId, value: f32) {
        self.params.set(id, value);
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    /// Snapshot all current targets.
    pub fn save_patch(&self) -> PatchState {
        self.params.snapshot()
    }

    /// Publish a patch; the audio thread applies it at the next block start.
    /// Out-of-range values are clamped per parameter, missing ones default.
    pub fn load_patch(&self, patch: PatchState) {
        self.pending.store(Some(Arc::new(patch)));
    }

    pub fn save_json(&self) -> String {
        self.save_patch().to_json()
    }

    /// Only malformed JSON fails; recoverable problems (unknown keys,
    /// out-of-range values) are absorbed.
    pub fn load_json(&self, json: &str) -> Result<()> {
        self.load_patch(PatchState::from_json(json)?);
        Ok(())
    }
}

/// Real-time vibrato engine.
///
/// Owned by the audio side; [`WarbleEngine::process`] is the only method
/// that may run on the audio thread. `prepare` and the factor setter
/// allocate and rely on the host to keep them out of the callback.
pub struct WarbleEngine {
    sample_rate: f64,
    max_block: usize,
    channels: usize,
    factor: usize,
    prepared: bool,

    params: Arc<Params>,
    pending_patch: Arc<ArcSwapOption<PatchState>>,
    viz: Arc<VizState>,

    depth: SmoothedValue,
    mix: SmoothedValue,
    mod_mix: SmoothedValue,
    width: SmoothedValue,
    base_delay: SmoothedValue,

    // control buffers at the oversampled rate
    depth_buf: Vec<f32>,
    mod_mix_buf: Vec<f32>,
    width_buf: Vec<f32>,
    base_buf: Vec<f32>,
    mono_buf: Vec<f32>,
    // mix runs at the base rate
    mix_buf: Vec<f32>,

    dry_wet: DryWetProcessor,
    oversampler: Oversampler,
    mods: ModulationSystem,
    vibrato: VibratoProcessor,
}

impl WarbleEngine {
    pub fn builder() -> crate::WarbleEngineBuilder {
        crate::WarbleEngineBuilder::new()
    }

    pub(crate) fn with_factor(factor: usize) -> Self {
        Self {
            sample_rate: 0.0,
            max_block: 0,
            channels: 0,
            factor,
            prepared: false,
            params: Arc::new(Params::new()),
            pending_patch: Arc::new(ArcSwapOption::empty()),
            viz: Arc::new(VizState::new()),
            depth: SmoothedValue::default(),
            mix: SmoothedValue::default(),
            mod_mix: SmoothedValue::default(),
            width: SmoothedValue::default(),
            base_delay: SmoothedValue::default(),
            depth_buf: Vec::new(),
            mod_mix_buf: Vec::new(),
            width_buf: Vec::new(),
            base_buf: Vec::new(),
            mono_buf: Vec::new(),
            mix_buf: Vec::new(),
            dry_wet: DryWetProcessor::new(),
            oversampler: Oversampler::new(),
            mods: ModulationSystem::new(),
            vibrato: VibratoProcessor::new(),
        }
    }

    /// Control-thread handle. Clone freely.
    pub fn params(&self) -> ParamHandle {
        ParamHandle {
            params: Arc::clone(&self.params),
            pending: Arc::clone(&self.pending_patch),
        }
    }

    /// Read side of the visualization slot published each block.
    pub fn viz(&self) -> Arc<VizState> {
        Arc::clone(&self.viz)
    }

    pub fn latest_viz(&self) -> VizSnapshot {
        self.viz.read()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn oversampling_factor(&self) -> usize {
        self.factor
    }

    /// Wet-path latency in samples at the base rate. The dry signal is
    /// aligned internally; the host should additionally delay-compensate
    /// parallel tracks by this amount.
    pub fn latency_samples(&self) -> usize {
        self.oversampler.latency_samples()
    }

    /// (Re)allocate everything for a sample rate, block size and layout.
    ///
    /// Idempotent; callable repeatedly before processing starts and again on
    /// any configuration change. Clears all delay and filter state, so the
    /// engine starts from a deterministic silent state.
    pub fn prepare(&mut self, sample_rate: f64, max_block: usize, channels: usize) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        if !matches!(channels, 1 | 2) {
            return Err(Error::UnsupportedChannelLayout(channels));
        }
        if max_block == 0 {
            return Err(Error::InvalidBlockSize(max_block));
        }

        self.oversampler
            .prepare(self.factor, channels, max_block)
            .map_err(|_| Error::InvalidOversamplingFactor(self.factor))?;

        let os_rate = sample_rate * self.factor as f64;
        let os_frames = max_block * self.factor;

        self.dry_wet
            .prepare(channels, max_block, self.oversampler.latency_samples());
        self.mods.prepare(os_rate as f32, os_frames);
        self.mods.reset();

        let max_base = ParamId::BaseDelayMs.range().max as f64 * 1e-3 * os_rate;
        self.vibrato.prepare(channels, max_base.ceil() as f32);

        for buf in [
            &mut self.depth_buf,
            &mut self.mod_mix_buf,
            &mut self.width_buf,
            &mut self.base_buf,
            &mut self.mono_buf,
        ] {
            buf.clear();
            buf.resize(os_frames, 0.0);
        }
        self.mix_buf.clear();
        self.mix_buf.resize(max_block, 0.0);

        self.depth.set_time_constant(SMOOTH_SECS, os_rate as f32);
        self.mod_mix.set_time_constant(SMOOTH_SECS, os_rate as f32);
        self.width.set_time_constant(SMOOTH_SECS, os_rate as f32);
        self.base_delay
            .set_time_constant(BASE_DELAY_SMOOTH_SECS, os_rate as f32);
        self.mix.set_time_constant(SMOOTH_SECS, sample_rate as f32);

        // jump smoothers onto their targets: prepare is a silence point, a
        // glide from stale values would be audible on the first block
        self.depth.set_immediate(self.params.get(ParamId::Depth));
        self.mix.set_immediate(self.params.get(ParamId::Mix));
        self.mod_mix.set_immediate(self.params.get(ParamId::ModMix));
        self.width.set_immediate(self.params.get(ParamId::Width));
        self.base_delay
            .set_immediate(self.base_delay_target(os_rate));

        self.sample_rate = sample_rate;
        self.max_block = max_block;
        self.channels = channels;
        self.prepared = true;
        Ok(())
    }

    /// Change the oversampling factor. Re-prepares (and therefore may
    /// allocate) when the engine was already prepared; the host must keep
    /// this call out of the audio callback, like `prepare` itself.
    pub fn set_oversampling_factor(&mut self, factor: usize) -> Result<()> {
        if !matches!(factor, 1 | 2 | 4) {
            return Err(Error::InvalidOversamplingFactor(factor));
        }
        self.factor = factor;
        if self.prepared {
            self.prepare(self.sample_rate, self.max_block, self.channels)?;
        }
        Ok(())
    }

    /// Clear all delay and filter state without reallocating.
    pub fn reset(&mut self) {
        self.dry_wet.reset();
        self.oversampler.reset();
        self.mods.reset();
        self.vibrato.reset();
    }

    fn base_delay_target(&self, os_rate: f64) -> f32 {
        (self.params.get(ParamId::BaseDelayMs) as f64 * 1e-3 * os_rate) as f32
    }

    /// Consume control-plane writes. Runs at block start on the audio
    /// thread; everything it reads is an atomic load or pointer swap.
    fn refresh_targets(&mut self) {
        if let Some(patch) = self.pending_patch.swap(None) {
            self.params.apply_patch(&patch);
        }

        self.depth.set_target(self.params.get(ParamId::Depth));
        self.mix.set_target(self.params.get(ParamId::Mix));
        self.mod_mix.set_target(self.params.get(ParamId::ModMix));
        self.width.set_target(self.params.get(ParamId::Width));
        let os_rate = self.sample_rate * self.factor as f64;
        self.base_delay.set_target(self.base_delay_target(os_rate));

        self.mods
            .set_shape(0, ModShape::from_index(self.params.get(ParamId::Shape0) as usize));
        self.mods
            .set_shape(1, ModShape::from_index(self.params.get(ParamId::Shape1) as usize));
        self.mods.set_rate(0, self.params.get(ParamId::Rate0));
        self.mods.set_rate(1, self.params.get(ParamId::Rate1));
        self.mods.set_envelope_times(
            self.params.get(ParamId::EnvAttackMs) * 1e-3,
            self.params.get(ParamId::EnvReleaseMs) * 1e-3,
        );
    }

    /// Process one block in place. Real-time safe: no allocation, no
    /// blocking, no panics; frame count must not exceed the prepared
    /// maximum (larger buffers are truncated defensively).
    pub fn process(&mut self, buffers: &mut [&mut [f32]]) {
        if !self.prepared || buffers.is_empty() {
            return;
        }
        let frames = buffers
            .iter()
            .map(|b| b.len())
            .min()
            .unwrap_or(0)
            .min(self.max_block);
        if frames == 0 {
            return;
        }
        let channels = self.channels.min(buffers.len());

        self.refresh_targets();

        let stereo_mode = StereoMode::from_param(self.params.get(ParamId::StereoMode));
        let mid_side = stereo_mode == StereoMode::MidSide && channels == 2;

        // dry snapshot happens in the left/right domain, pre-encode
        self.dry_wet.capture(buffers, frames);

        if mid_side {
            let (head, tail) = buffers.split_at_mut(1);
            encode(&mut head[0][..frames], &mut tail[0][..frames]);
        }

        let os_frames = self.oversampler.os_frames(frames);
        for ch in 0..channels {
            self.oversampler.upsample(ch, &buffers[ch][..frames], frames);
        }

        self.depth.process_block(&mut self.depth_buf[..os_frames]);
        self.mod_mix.process_block(&mut self.mod_mix_buf[..os_frames]);
        self.width.process_block(&mut self.width_buf[..os_frames]);
        self.base_delay.process_block(&mut self.base_buf[..os_frames]);
        self.mix.process_block(&mut self.mix_buf[..frames]);

        self.oversampler.mix_to_mono(&mut self.mono_buf, os_frames);
        self.mods.process(
            &self.mono_buf[..os_frames],
            &self.mod_mix_buf[..os_frames],
            &self.width_buf[..os_frames],
            os_frames,
        );

        for ch in 0..channels {
            let wet = self.oversampler.channel_mut(ch);
            self.vibrato.process_channel(
                ch,
                &mut wet[..os_frames],
                &self.mods.channel(ch)[..os_frames],
                &self.depth_buf[..os_frames],
                &self.base_buf[..os_frames],
            );
        }

        for ch in 0..channels {
            self.oversampler.downsample(ch, &mut buffers[ch][..frames], frames);
        }

        if mid_side {
            let (head, tail) = buffers.split_at_mut(1);
            decode(&mut head[0][..frames], &mut tail[0][..frames]);
        }

        self.dry_wet.blend(buffers, &self.mix_buf[..frames], frames);

        self.publish_viz(os_frames, channels);
    }

    fn publish_viz(&self, os_frames: usize, channels: usize) {
        let last = os_frames - 1;
        let mod_l = self.mods.channel(0)[last];
        let mod_r = if channels > 1 {
            self.mods.channel(1)[last]
        } else {
            mod_l
        };

        let center = self.base_buf[last];
        let span = (center - KERNEL_HALF_WIDTH as f32).max(0.0);
        let delay = center + span * self.depth_buf[last] * mod_l;
        let os_rate = self.sample_rate * self.factor as f64;
        let delay_ms = if os_rate > 0.0 {
            (delay as f64 / os_rate * 1e3) as f32
        } else {
            0.0
        };

        self.viz.publish(mod_l, mod_r, delay_ms);
    }
}
