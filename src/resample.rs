// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Walks a voice's waveform at its pitch increment.
//!
//! Each call produces mono samples into a scratch buffer owned by the
//! [`Resampler`]. The loops are batched: the number of whole steps before
//! the next boundary is computed up front with [`Fixed::steps_below`] and
//! [`Fixed::steps_above`], so the positions emitted are the same as a plain
//! per-sample walk.

use tracing::{debug, warn};

use crate::fixed::{Fixed, FRACTION_BITS};
use crate::format::{Interpolation, RenderParams};
use crate::patch::Sample;
use crate::tables::note_frequency;
use crate::voice::{Voice, VoiceStatus};

/// Pre-resampled waveforms longer than this many samples are left alone.
const MAX_PRE_RESAMPLE_LEN: f64 = (1u64 << 26) as f64;

/// Slowest step a walk will take; a zero step would never reach a boundary.
const MIN_INCREMENT: Fixed = Fixed::from_raw(1);

/// How a voice walks its waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Forward to the end of data, then free the voice.
    Plain,
    /// Forward, wrapping from the loop end back by the loop length.
    Loop,
    /// Back and forth between the loop points.
    Bidir,
}

/// Topology plus whether the increment is refreshed by vibrato.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleMode {
    pub topology: Topology,
    pub vibrato: bool,
}

impl ResampleMode {
    /// Picks the walk for a voice's current state. Loops only apply while
    /// the sample has an envelope to end the note, or the note is held.
    pub fn select(voice: &Voice) -> ResampleMode {
        let sample = &voice.sample;
        let held = matches!(voice.status, VoiceStatus::On | VoiceStatus::Sustained);

        let topology = if sample.is_looping()
            && sample.loop_is_valid()
            && (sample.has_envelope() || held)
        {
            if sample.modes.contains(crate::patch::Modes::PINGPONG) {
                Topology::Bidir
            } else {
                Topology::Loop
            }
        } else {
            Topology::Plain
        };

        ResampleMode {
            topology,
            vibrato: voice.vibrato_control_ratio > 0,
        }
    }
}

/// Whole-sample loop points of a forward loop. The sample after the last
/// one in the loop is the loop's first.
#[derive(Debug, Clone, Copy)]
struct Seam {
    end: usize,
    start: usize,
}

impl Seam {
    fn of(sample: &Sample) -> Seam {
        Seam {
            end: sample.loop_end.to_int().max(0) as usize,
            start: sample.loop_start.to_int().max(0) as usize,
        }
    }
}

/// Reads the waveform at a fractional position.
#[inline]
fn interpolate(data: &[i16], ofs: Fixed, interpolation: Interpolation, seam: Option<Seam>) -> i32 {
    let index = ofs.to_int() as usize;
    let v1 = data.get(index).copied().map(i32::from).unwrap_or(0);
    match interpolation {
        Interpolation::Nearest => v1,
        Interpolation::Linear => {
            let next = match seam {
                Some(seam) if index + 1 == seam.end => seam.start,
                _ => index + 1,
            };
            let v2 = data.get(next).copied().map(i32::from).unwrap_or(v1);
            v1 + ((i64::from(v2 - v1) * ofs.to_frac()) >> FRACTION_BITS) as i32
        }
    }
}

/// Produces resampled audio for voices, one call at a time.
#[derive(Debug, Default)]
pub struct Resampler {
    buffer: Vec<i32>,
}

impl Resampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces up to `count` samples for `voice`. Fewer are returned only if
    /// the voice finished during the call, in which case it is now free.
    pub fn resample(&mut self, voice: &mut Voice, count: usize, params: &RenderParams) -> &[i32] {
        self.buffer.clear();
        if voice.status == VoiceStatus::Free || count == 0 {
            return &self.buffer;
        }

        if voice.sample.sample_rate.is_none() {
            self.pre_resampled(voice, count);
            return &self.buffer;
        }

        let mode = ResampleMode::select(voice);
        let interpolation = params.interpolation;
        let mut remaining = count;

        while remaining > 0 {
            let mut span = remaining;
            if mode.vibrato {
                if voice.vibrato_control_counter <= 0 {
                    voice.vibrato_control_counter = voice.vibrato_control_ratio;
                    voice.sample_increment = voice.update_vibrato(params);
                }
                span = span.min(voice.vibrato_control_counter as usize);
            }

            let produced = match mode.topology {
                Topology::Plain => self.plain(voice, span, interpolation),
                Topology::Loop => self.looped(voice, span, interpolation),
                Topology::Bidir => self.bidir(voice, span, interpolation),
            };

            if mode.vibrato {
                voice.vibrato_control_counter -= produced as i32;
            }
            remaining -= produced;
            if produced < span {
                break;
            }
        }

        &self.buffer
    }

    /// Data already at output rate and pitch is copied straight out.
    fn pre_resampled(&mut self, voice: &mut Voice, count: usize) {
        let sample = &voice.sample;
        let ofs = voice.sample_offset.to_int().max(0) as usize;
        let end = (sample.data_length.to_int().max(0) as usize).min(sample.data.len());
        let available = end.saturating_sub(ofs);
        let n = count.min(available);

        self.buffer
            .extend(sample.data[ofs..ofs + n].iter().map(|&s| i32::from(s)));

        if n == available {
            voice.status = VoiceStatus::Free;
        }
        voice.sample_offset += Fixed::from_samples(n as i64);
    }

    /// Walks forward; frees the voice once every position before the end of
    /// data has been emitted.
    fn plain(&mut self, voice: &mut Voice, count: usize, interpolation: Interpolation) -> usize {
        let sample = &voice.sample;
        let le = sample.data_length;
        let incr = voice.sample_increment.abs().max(MIN_INCREMENT);
        let mut ofs = voice.sample_offset;

        let n = (ofs.steps_below(le, incr).max(0) as usize).min(count);
        for _ in 0..n {
            self.buffer.push(interpolate(&sample.data, ofs, interpolation, None));
            ofs += incr;
        }

        if ofs >= le {
            voice.status = VoiceStatus::Free;
        }
        voice.sample_offset = ofs;
        voice.sample_increment = incr;
        n
    }

    /// Walks forward, wrapping from `loop_end` by the loop length so the
    /// phase is kept across the seam.
    fn looped(&mut self, voice: &mut Voice, count: usize, interpolation: Interpolation) -> usize {
        let sample = &voice.sample;
        let (ls, le) = (sample.loop_start, sample.loop_end);
        let ll = le - ls;
        let seam = Some(Seam::of(sample));
        let incr = voice.sample_increment.abs().max(MIN_INCREMENT);
        let mut ofs = voice.sample_offset;

        let mut remaining = count;
        while remaining > 0 {
            while ofs >= le {
                ofs -= ll;
            }
            let n = (ofs.steps_below(le, incr) as usize).min(remaining);
            for _ in 0..n {
                self.buffer.push(interpolate(&sample.data, ofs, interpolation, seam));
                ofs += incr;
            }
            remaining -= n;
        }

        voice.sample_offset = ofs;
        voice.sample_increment = incr;
        count
    }

    /// Walks forward into the loop, then reflects off each loop point.
    fn bidir(&mut self, voice: &mut Voice, count: usize, interpolation: Interpolation) -> usize {
        let sample = &voice.sample;
        let (ls, le) = (sample.loop_start, sample.loop_end);
        let mut incr = voice.sample_increment;
        if incr == Fixed::ZERO {
            incr = MIN_INCREMENT;
        }
        let mut ofs = voice.sample_offset;

        let mut remaining = count;
        while remaining > 0 {
            if incr.is_negative() {
                if ofs <= ls {
                    ofs = ls + ls - ofs;
                    incr = -incr;
                }
            } else if ofs >= le {
                ofs = le + le - ofs;
                incr = -incr;
            }

            let steps = if incr.is_negative() {
                ofs.steps_above(ls, incr)
            } else {
                ofs.steps_below(le, incr)
            };
            let n = (steps as usize).min(remaining);
            for _ in 0..n {
                self.buffer.push(interpolate(&sample.data, ofs, interpolation, None));
                ofs += incr;
            }
            remaining -= n;
        }

        voice.sample_offset = ofs;
        voice.sample_increment = incr;
        count
    }
}

/// Resamples a fixed-note sample once, at load time, to the output rate and
/// its playback pitch, using 4-point cubic interpolation. Afterwards the
/// sample needs no per-voice resampling and `sample_rate` is `None`.
pub fn pre_resample(sample: &mut Sample, params: &RenderParams) {
    let (Some(rate), Some(note)) = (sample.sample_rate, sample.note_to_use) else {
        return;
    };

    let a = (f64::from(rate) * f64::from(note_frequency(note)))
        / (f64::from(sample.root_freq.max(1)) * f64::from(params.output_rate));
    if !a.is_finite() || a <= 0.0 {
        warn!(ratio = a, "Unusable pitch ratio, not pre-resampling");
        return;
    }

    let new_len = sample.data_length.to_f64() / a;
    if new_len >= MAX_PRE_RESAMPLE_LEN {
        warn!(samples = new_len, "Pre-resampled waveform too large, skipping");
        return;
    }
    let count = new_len as usize;

    let source = sample.waveform();
    let last = source.len().saturating_sub(1);
    let at = |i: i64| -> f64 { f64::from(source[(i.max(0) as usize).min(last)]) };

    let mut resampled = Vec::with_capacity(count);
    if !source.is_empty() {
        for i in 0..count {
            let ofs = Fixed::from_f64(i as f64 * a);
            let index = ofs.to_int();
            let x = ofs.to_frac() as f64 / f64::from(1u32 << FRACTION_BITS);
            let (v1, v2, v3, v4) = (at(index - 1), at(index), at(index + 1), at(index + 2));

            let value = v2
                + (x / 6.0)
                    * (-2.0 * v1 - 3.0 * v2 + 6.0 * v3 - v4
                        + x * (3.0 * (v1 - 2.0 * v2 + v3) + x * (-v1 + 3.0 * (v2 - v3) + v4)));
            resampled.push(value.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16);
        }
    }

    debug!(
        note,
        from = sample.buffer_len(),
        to = resampled.len(),
        "Pre-resampled"
    );

    sample.loop_start = sample.loop_start.div_ratio(a);
    sample.loop_end = sample.loop_end.div_ratio(a);
    sample.set_waveform(resampled);
    sample.sample_rate = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Modes;
    use crate::voice::NoteParams;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn looping(pcm: Vec<i16>, ls: i64, le: i64, pingpong: bool) -> Sample {
        let mut sample = Sample::from_pcm(pcm, 44100, 261_626);
        sample.modes.insert(Modes::LOOPING | Modes::SUSTAIN);
        if pingpong {
            sample.modes.insert(Modes::PINGPONG);
        }
        sample.loop_start = Fixed::from_samples(ls);
        sample.loop_end = Fixed::from_samples(le);
        sample
    }

    fn voice_with(sample: Sample, incr: Fixed) -> Voice {
        let mut voice = Voice::start(
            Arc::new(sample),
            NoteParams::new(261_626, 127),
            &RenderParams::default(),
        );
        voice.sample_increment = incr;
        voice
    }

    /// Per-sample reference walk returning emitted positions.
    fn naive_positions(sample: &Sample, mode: Topology, mut ofs: Fixed, mut incr: Fixed, count: usize) -> Vec<Fixed> {
        let (ls, le) = (sample.loop_start, sample.loop_end);
        let mut out = Vec::new();
        for _ in 0..count {
            match mode {
                Topology::Plain => {
                    incr = incr.abs();
                    if ofs >= sample.data_length {
                        break;
                    }
                }
                Topology::Loop => {
                    while ofs >= le {
                        ofs -= le - ls;
                    }
                }
                Topology::Bidir => {
                    if incr.is_negative() && ofs <= ls {
                        ofs = ls + ls - ofs;
                        incr = -incr;
                    } else if !incr.is_negative() && ofs >= le {
                        ofs = le + le - ofs;
                        incr = -incr;
                    }
                }
            }
            out.push(ofs);
            ofs += incr;
        }
        out
    }

    /// A waveform whose values encode their own index, so nearest sampling
    /// reveals the emitted positions.
    fn ramp(len: usize) -> Vec<i16> {
        (0..len as i16).collect()
    }

    fn nearest() -> RenderParams {
        RenderParams {
            interpolation: Interpolation::Nearest,
            ..RenderParams::default()
        }
    }

    #[test]
    fn test_interpolate() {
        let data = [0i16, 100, 200];
        let half = Fixed::from_raw(1 << (FRACTION_BITS - 1));
        assert_eq!(interpolate(&data, half, Interpolation::Linear, None), 50);
        assert_eq!(interpolate(&data, half, Interpolation::Nearest, None), 0);
        assert_eq!(
            interpolate(&data, Fixed::from_samples(1) + half, Interpolation::Linear, None),
            150
        );
        // Past the end reads as the last value rather than panicking.
        assert_eq!(
            interpolate(&data, Fixed::from_samples(2) + half, Interpolation::Linear, None),
            200
        );
    }

    #[test]
    fn test_interpolate_across_seam() {
        let data = [0i16, 100, 200, 300, 999];
        let half = Fixed::from_raw(1 << (FRACTION_BITS - 1));
        let seam = Some(Seam { end: 4, start: 1 });

        // Between the last loop sample and the loop start.
        assert_eq!(
            interpolate(&data, Fixed::from_samples(3) + half, Interpolation::Linear, seam),
            200
        );
        // Away from the seam nothing changes.
        assert_eq!(
            interpolate(&data, Fixed::from_samples(2) + half, Interpolation::Linear, seam),
            250
        );
    }

    #[test]
    fn test_select_mode() {
        let voice = voice_with(looping(vec![0; 10], 2, 8, false), Fixed::ONE);
        assert_eq!(ResampleMode::select(&voice).topology, Topology::Loop);

        let voice = voice_with(looping(vec![0; 10], 2, 8, true), Fixed::ONE);
        assert_eq!(ResampleMode::select(&voice).topology, Topology::Bidir);

        // Released without an envelope: play out the tail.
        let mut voice = voice_with(looping(vec![0; 10], 2, 8, false), Fixed::ONE);
        voice.release();
        assert_eq!(ResampleMode::select(&voice).topology, Topology::Plain);

        let mut voice = voice_with(looping(vec![0; 10], 2, 8, false), Fixed::ONE);
        let mut sample = (*voice.sample).clone();
        sample.modes.insert(Modes::ENVELOPE);
        voice.sample = Arc::new(sample);
        voice.status = VoiceStatus::Off;
        assert_eq!(ResampleMode::select(&voice).topology, Topology::Loop);

        let mut sample = looping(vec![0; 10], 2, 8, false);
        sample.vibrato_control_ratio = 5;
        let voice = voice_with(sample, Fixed::ONE);
        assert!(ResampleMode::select(&voice).vibrato);
    }

    #[test]
    fn test_plain_stops_at_end() {
        let params = nearest();
        let mut voice = voice_with(Sample::from_pcm(ramp(10), 44100, 261_626), Fixed::from_raw(3 << 11));

        let out = Resampler::new().resample(&mut voice, 100, &params).to_vec();
        // ceil(10 / 1.5) positions below the end.
        assert_eq!(out, vec![0, 1, 3, 4, 6, 7, 9]);
        assert_eq!(voice.status, VoiceStatus::Free);
    }

    #[test]
    fn test_plain_exact_count() {
        let params = RenderParams::default();
        let mut voice = voice_with(Sample::from_pcm(ramp(100), 44100, 261_626), Fixed::ONE);
        let mut resampler = Resampler::new();

        let out = resampler.resample(&mut voice, 100, &params);
        assert_eq!(out.len(), 100);
        assert_eq!(voice.status, VoiceStatus::Free);
        assert!(resampler.resample(&mut voice, 10, &params).is_empty());
    }

    #[test]
    fn test_loop_scenario_never_reaches_end() {
        // 8-bit unsigned data widened as the loader does. Each value maps
        // back to the index it was read from.
        let pcm: Vec<i16> = (0u8..10).map(|b| ((u16::from(b) << 8) ^ 0x8000) as i16).collect();
        let index_of = |v: i32| (((v as i16 as u16) ^ 0x8000) >> 8) as i64;
        let mut voice = voice_with(looping(pcm, 2, 8, false), Fixed::ONE);
        let params = nearest();
        let mut resampler = Resampler::new();

        let mut emitted = Vec::new();
        for _ in 0..500 {
            emitted.extend_from_slice(resampler.resample(&mut voice, 1, &params));
        }
        emitted.extend_from_slice(resampler.resample(&mut voice, 500, &params));

        assert_eq!(emitted.len(), 1_000);
        assert_eq!(voice.status, VoiceStatus::On);
        let indices: Vec<i64> = emitted.iter().map(|&v| index_of(v)).collect();
        assert_eq!(&indices[..10], &[0, 1, 2, 3, 4, 5, 6, 7, 2, 3]);
        assert!(indices.iter().all(|&i| i < 8));
    }

    #[test]
    fn test_loop_seam_matches_repeated_body() {
        let params = RenderParams::default();
        let pcm: Vec<i16> = vec![0, 0, 500, -300, 1200, 800, -900, 50, 0, 0];
        let (ls, le) = (2usize, 8usize);
        let incr = Fixed::from_raw(0x1680);

        // The loop body repeated far past anything the test reads.
        let mut repeated = Sample::from_pcm(
            pcm[..ls]
                .iter()
                .chain(pcm[ls..le].iter().cycle().take(600))
                .copied()
                .collect(),
            44100,
            261_626,
        );
        repeated.modes = Modes::BITS_16;

        let mut looped_voice = voice_with(looping(pcm, ls as i64, le as i64, false), incr);
        let mut plain_voice = voice_with(repeated, incr);

        let a = Resampler::new().resample(&mut looped_voice, 300, &params).to_vec();
        let b = Resampler::new().resample(&mut plain_voice, 300, &params).to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bidir_bounds() {
        // With a ramp of 64 per sample, linear reads return the position in
        // 1/64ths of a sample.
        const SCALE: i32 = 64;
        let mut rng = StdRng::seed_from_u64(7);
        let params = RenderParams::default();

        for _ in 0..200 {
            let ls = rng.gen_range(0..20i64);
            let len = rng.gen_range(2..30i64);
            let le = ls + len;
            let incr = Fixed::from_raw(rng.gen_range(1..(len << FRACTION_BITS)));

            let pcm = (0..le + 5).map(|i| (i as i32 * SCALE) as i16).collect();
            let mut voice = voice_with(looping(pcm, ls, le, true), incr);
            let mut resampler = Resampler::new();

            let mut emitted = Vec::new();
            while emitted.len() < 2_000 {
                let chunk = rng.gen_range(1..50);
                emitted.extend_from_slice(resampler.resample(&mut voice, chunk, &params));
            }

            let lo = ls as i32 * SCALE;
            let hi = le as i32 * SCALE;
            let inside = emitted.iter().skip_while(|&&v| v < lo);
            for &v in inside {
                assert!(v >= lo && v <= hi, "{} outside [{}, {}]", v, lo, hi);
            }
            assert_eq!(voice.status, VoiceStatus::On);
        }
    }

    #[test]
    fn test_bidir_reflects() {
        let params = nearest();
        let mut voice = voice_with(looping(ramp(10), 2, 6, true), Fixed::ONE);

        let out = Resampler::new().resample(&mut voice, 14, &params).to_vec();
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 5, 4, 3, 2, 3, 4, 5]);
        assert!(!voice.sample_increment.is_negative());
    }

    #[test]
    fn test_batched_matches_naive() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = nearest();

        for _ in 0..300 {
            let len = rng.gen_range(8..200i64);
            let ls = rng.gen_range(0..len - 2);
            let le = rng.gen_range(ls + 2..=len);
            let topology = match rng.gen_range(0..3) {
                0 => Topology::Plain,
                1 => Topology::Loop,
                _ => Topology::Bidir,
            };
            let loop_len = (le - ls) << FRACTION_BITS;
            let incr = Fixed::from_raw(rng.gen_range(1..loop_len.min(3 << FRACTION_BITS)));

            let sample = match topology {
                Topology::Plain => Sample::from_pcm(ramp(len as usize), 44100, 261_626),
                Topology::Loop => looping(ramp(len as usize), ls, le, false),
                Topology::Bidir => looping(ramp(len as usize), ls, le, true),
            };
            let expected: Vec<i32> = naive_positions(&sample, topology, Fixed::ZERO, incr, 500)
                .iter()
                .map(|p| p.to_int() as i32)
                .collect();

            let mut voice = voice_with(sample, incr);
            assert_eq!(ResampleMode::select(&voice).topology, topology);
            let mut resampler = Resampler::new();
            let mut actual = Vec::new();
            // Uneven chunks exercise resuming mid-walk.
            while actual.len() < 500 && !voice.is_free() {
                let chunk = rng.gen_range(1..64).min(500 - actual.len());
                actual.extend_from_slice(resampler.resample(&mut voice, chunk, &params));
            }
            assert_eq!(actual, expected, "{:?} ls={} le={} incr={}", topology, ls, le, incr);
        }
    }

    #[test]
    fn test_vibrato_refresh_is_chunk_invariant() {
        let params = RenderParams::default();
        let mut sample = looping(ramp(100), 10, 90, false);
        sample.vibrato_control_ratio = 7;
        sample.vibrato_depth = 200;

        let mut whole = voice_with(sample.clone(), Fixed::ONE);
        let expected = Resampler::new().resample(&mut whole, 400, &params).to_vec();

        let mut chunked = voice_with(sample, Fixed::ONE);
        let mut resampler = Resampler::new();
        let mut actual = Vec::new();
        for chunk in [1, 13, 64, 3, 200, 119] {
            actual.extend_from_slice(resampler.resample(&mut chunked, chunk, &params));
        }
        assert_eq!(actual, expected);
        assert_eq!(chunked.vibrato_phase, whole.vibrato_phase);
    }

    #[test]
    fn test_vibrato_plain_keeps_forward() {
        let params = RenderParams::default();
        let mut sample = Sample::from_pcm(ramp(100), 44100, 261_626);
        sample.vibrato_control_ratio = 3;
        sample.vibrato_depth = 255;

        let mut voice = voice_with(sample, -Fixed::ONE);
        let out = Resampler::new().resample(&mut voice, 30, &params).to_vec();
        assert_eq!(out.len(), 30);
        assert!(voice.sample_increment > Fixed::ZERO);
        assert!(out.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_pre_resampled_fast_path() {
        let params = RenderParams::default();
        let mut sample = Sample::from_pcm(ramp(10), 44100, 261_626);
        sample.sample_rate = None;
        let mut voice = voice_with(sample, Fixed::ONE);
        let mut resampler = Resampler::new();

        assert_eq!(resampler.resample(&mut voice, 4, &params), &[0, 1, 2, 3]);
        assert_eq!(voice.status, VoiceStatus::On);
        assert_eq!(resampler.resample(&mut voice, 4, &params), &[4, 5, 6, 7]);
        assert_eq!(resampler.resample(&mut voice, 4, &params), &[8, 9]);
        assert_eq!(voice.status, VoiceStatus::Free);
    }

    #[test]
    fn test_pre_resample() {
        let params = RenderParams::default();
        let mut sample = Sample::from_pcm((0..100).map(|i| i * 100).collect(), 44100, 261_626);
        sample.note_to_use = Some(72);
        sample.loop_start = Fixed::from_samples(20);
        sample.loop_end = Fixed::from_samples(80);

        pre_resample(&mut sample, &params);
        assert_eq!(sample.sample_rate, None);
        assert_eq!(sample.buffer_len(), 50);
        assert_eq!(sample.data_length, Fixed::from_samples(50));
        assert_eq!(sample.loop_start.to_int(), 10);
        assert_eq!(sample.loop_end.to_int(), 40);
        // A linear ramp survives cubic interpolation at double speed.
        let wave = sample.waveform();
        assert_eq!(wave[0], 0);
        assert!((i32::from(wave[10]) - 2000).abs() <= 1);
    }

    #[test]
    fn test_pre_resample_requires_note() {
        let params = RenderParams::default();
        let mut sample = Sample::from_pcm(vec![1; 20], 44100, 261_626);
        pre_resample(&mut sample, &params);
        assert_eq!(sample.sample_rate, Some(44100));
        assert_eq!(sample.buffer_len(), 20);
    }
}
