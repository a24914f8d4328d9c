//! End-to-end signal measurements: the produced wet signal must actually be
//! frequency-modulated the way the modulator trajectory says.

use std::f32::consts::TAU;
use warble::{ParamId, WarbleEngine};

const SAMPLE_RATE: f32 = 48000.0;

fn sine(freq_hz: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (TAU * freq_hz * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

fn render(engine: &mut WarbleEngine, signal: &[f32], block: usize) -> Vec<f32> {
    let mut out = signal.to_vec();
    for chunk in out.chunks_mut(block) {
        let mut buffers: [&mut [f32]; 1] = [chunk];
        engine.process(&mut buffers);
    }
    out
}

/// Fractional sample positions of upward zero crossings.
fn upward_crossings(signal: &[f32]) -> Vec<f32> {
    let mut crossings = Vec::new();
    for i in 1..signal.len() {
        let (a, b) = (signal[i - 1], signal[i]);
        if a <= 0.0 && b > 0.0 {
            let frac = if b != a { -a / (b - a) } else { 0.0 };
            crossings.push((i - 1) as f32 + frac);
        }
    }
    crossings
}

/// Instantaneous frequency per crossing interval, in Hz.
fn instantaneous_frequencies(crossings: &[f32]) -> Vec<f32> {
    crossings
        .windows(2)
        .map(|w| SAMPLE_RATE / (w[1] - w[0]))
        .collect()
}

fn moving_average(values: &[f32], window: usize) -> Vec<f32> {
    values
        .windows(window)
        .map(|w| w.iter().sum::<f32>() / window as f32)
        .collect()
}

fn vibrato_engine(depth: f32, rate_hz: f32) -> WarbleEngine {
    let mut engine = WarbleEngine::builder().oversampling(2).build().unwrap();
    let params = engine.params();
    params.set(ParamId::Depth, depth);
    params.set(ParamId::Rate0, rate_hz);
    params.set(ParamId::ModMix, 0.0); // slot 0 (sine) only
    params.set(ParamId::Mix, 1.0);
    params.set(ParamId::BaseDelayMs, 3.0);
    engine.prepare(SAMPLE_RATE as f64, 512, 1).unwrap();
    engine
}

#[test]
fn end_to_end_frequency_modulation_follows_the_modulator() {
    let len = SAMPLE_RATE as usize; // 1 second
    let input = sine(1000.0, len);

    let mut engine = vibrato_engine(0.2, 5.0);
    let output = render(&mut engine, &input, 512);

    // drop the first 100ms: filter settle + delay line fill
    let settled = &output[4800..];
    let crossings = upward_crossings(settled);
    assert!(
        crossings.len() > 800,
        "a 1kHz carrier must keep crossing zero, got {}",
        crossings.len()
    );

    let freqs = instantaneous_frequencies(&crossings);
    let mean = freqs.iter().sum::<f32>() / freqs.len() as f32;
    assert!(
        (mean - 1000.0).abs() < 5.0,
        "mean frequency should stay at the carrier, got {}",
        mean
    );

    // deviation trajectory: smooth out crossing jitter, then require an
    // oscillation at the modulator rate (5 Hz over ~0.9s = 9 sign changes)
    let deviation: Vec<f32> = freqs.iter().map(|f| f - mean).collect();
    let smoothed = moving_average(&deviation, 20);

    let max_dev = smoothed.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    assert!(
        max_dev > 5.0,
        "vibrato must actually move the pitch, peak deviation {} Hz",
        max_dev
    );
    assert!(
        max_dev < 60.0,
        "deviation out of scale for this depth, peak {} Hz",
        max_dev
    );

    let mut sign_changes = 0;
    for w in smoothed.windows(2) {
        if (w[0] > 0.0) != (w[1] > 0.0) {
            sign_changes += 1;
        }
    }
    assert!(
        (6..=13).contains(&sign_changes),
        "deviation should oscillate at ~5 Hz, got {} sign changes",
        sign_changes
    );
}

#[test]
fn deeper_vibrato_deviates_more() {
    let len = SAMPLE_RATE as usize;
    let input = sine(1000.0, len);

    let peak_deviation = |depth: f32| -> f32 {
        let mut engine = vibrato_engine(depth, 5.0);
        let output = render(&mut engine, &input, 512);
        let crossings = upward_crossings(&output[4800..]);
        let freqs = instantaneous_frequencies(&crossings);
        let mean = freqs.iter().sum::<f32>() / freqs.len() as f32;
        let deviation: Vec<f32> = freqs.iter().map(|f| f - mean).collect();
        moving_average(&deviation, 20)
            .iter()
            .fold(0.0f32, |m, v| m.max(v.abs()))
    };

    let shallow = peak_deviation(0.1);
    let deep = peak_deviation(0.4);
    assert!(
        deep > 2.0 * shallow,
        "deviation should scale with depth: shallow {} Hz, deep {} Hz",
        shallow,
        deep
    );
}

#[test]
fn faster_modulator_wobbles_faster() {
    let len = SAMPLE_RATE as usize;
    let input = sine(1000.0, len);

    let sign_changes = |rate: f32| -> usize {
        let mut engine = vibrato_engine(0.2, rate);
        let output = render(&mut engine, &input, 512);
        let crossings = upward_crossings(&output[4800..]);
        let freqs = instantaneous_frequencies(&crossings);
        let mean = freqs.iter().sum::<f32>() / freqs.len() as f32;
        let deviation: Vec<f32> = freqs.iter().map(|f| f - mean).collect();
        let smoothed = moving_average(&deviation, 20);
        smoothed
            .windows(2)
            .filter(|w| (w[0] > 0.0) != (w[1] > 0.0))
            .count()
    };

    let slow = sign_changes(2.0);
    let fast = sign_changes(8.0);
    assert!(
        fast > slow,
        "8 Hz vibrato must alternate more often than 2 Hz: {} vs {}",
        fast,
        slow
    );
}

#[test]
fn envelope_follower_shape_tracks_input_level() {
    // with the envelope follower as modulation source, a loud signal bends
    // pitch away from the quiet-signal delay; measure via the mean period
    let len = SAMPLE_RATE as usize;
    let mut engine = WarbleEngine::builder().oversampling(2).build().unwrap();
    let params = engine.params();
    params.set(ParamId::Depth, 0.5);
    params.set(ParamId::Shape0, 4.0); // envelope follower
    params.set(ParamId::ModMix, 0.0);
    params.set(ParamId::Mix, 1.0);
    params.set(ParamId::EnvAttackMs, 5.0);
    params.set(ParamId::EnvReleaseMs, 50.0);
    engine.prepare(SAMPLE_RATE as f64, 512, 1).unwrap();

    // amplitude ramp: quiet first half, loud second half
    let input: Vec<f32> = sine(1000.0, len)
        .iter()
        .enumerate()
        .map(|(i, s)| if i < len / 2 { s * 0.05 } else { s * 0.9 })
        .collect();
    let output = render(&mut engine, &input, 512);

    // while the envelope rises the delay grows, so the instantaneous
    // frequency must dip below the carrier right after the level step
    let step = len / 2;
    let during = upward_crossings(&output[step..step + 4800]);
    let freqs = instantaneous_frequencies(&during);
    let min_freq = freqs.iter().fold(f32::INFINITY, |m, &v| m.min(v));
    assert!(
        min_freq < 995.0,
        "rising envelope should stretch the period, min freq {}",
        min_freq
    );
}
