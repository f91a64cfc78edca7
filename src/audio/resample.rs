//! Audio resampling for playout.
//!
//! Narration clips arrive at 24 000 Hz mono but the output device runs at
//! whatever rate the platform reports (commonly 44 100 or 48 000 Hz).
//! [`resample`] bridges the two before a clip is handed to the playout slot.
//!
//! The current implementation uses linear interpolation (fast, zero extra
//! deps).  For better quality replace the inner loop with the `rubato` crate
//! (`SincFixedIn` + `BlackmanHarris2` window) — rubato is already listed in
//! `Cargo.toml` for that upgrade path.

/// Resample mono `samples` from `source_rate` Hz to `target_rate` Hz using
/// linear interpolation.
///
/// * If the rates already match the input is cloned and returned unchanged
///   (no-op fast path — no interpolation performed).
/// * If `samples` is empty an empty vector is returned.
///
/// The output length is approximately
/// `samples.len() * target_rate / source_rate`.
///
/// # Example
///
/// ```rust
/// use story_time::audio::resample;
///
/// // Already at the target rate — no-op
/// let clip = vec![0.1_f32; 240];
/// let out = resample(&clip, 24_000, 24_000);
/// assert_eq!(out.len(), clip.len());
///
/// // Upsample from 24 kHz to 48 kHz (ratio = 2)
/// let out = resample(&clip, 24_000, 48_000);
/// assert_eq!(out.len(), 480);
/// ```
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            // Linear interpolation between adjacent samples
            samples[idx] * (1.0 - frac as f32) + samples[idx + 1] * frac as f32
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
