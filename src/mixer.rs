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
// Accumulates resampled voices into the shared 32-bit output buffer.
use tracing::debug;

use crate::format::RenderParams;
use crate::resample::Resampler;
use crate::tables::MAX_DIE_TIME;
use crate::voice::{Panning, Voice, VoiceStatus};

/// Mixes voices into an interleaved accumulation buffer.
///
/// Envelope and LFO state is refreshed once per `control_ratio` output
/// samples, while samples themselves are copied at audio rate. The tick
/// position lives in the voice, so a block mixed in one call or many
/// produces the same output.
#[derive(Debug)]
pub struct Mixer {
    params: RenderParams,
    resampler: Resampler,
}

impl Mixer {
    pub fn new(params: RenderParams) -> Self {
        Self {
            params,
            resampler: Resampler::new(),
        }
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Adds one voice's next `buffer.len() / channels` frames into `buffer`.
    pub fn mix_voice(&mut self, voice: &mut Voice, buffer: &mut [i32]) {
        if voice.status == VoiceStatus::Free {
            return;
        }

        let channels = self.params.channels();
        let frames = buffer.len() / channels;
        let control_ratio = self.params.control_ratio;
        let mono = self.params.mono;

        if voice.status == VoiceStatus::Dying {
            let count = frames.min(MAX_DIE_TIME.saturating_sub(voice.die_elapsed));
            let samples = self.resampler.resample(voice, count, &self.params);
            let saturated = ramp_out(samples, buffer, voice, mono);
            if saturated > 0 {
                debug!(saturated, "Output saturated during ramp-out");
            }
            voice.die_elapsed += samples.len();
            if voice.die_elapsed >= MAX_DIE_TIME {
                voice.status = VoiceStatus::Free;
            }
            return;
        }

        let samples = self.resampler.resample(voice, frames, &self.params);

        if mono {
            mix_signal(samples, voice, control_ratio, |start, span, _, right| {
                for (out, &s) in buffer[start..].iter_mut().zip(span) {
                    *out = out.saturating_add(right * s);
                }
            });
            return;
        }

        match voice.panned {
            Panning::Mystery => mix_signal(samples, voice, control_ratio, |start, span, left, right| {
                for (frame, &s) in buffer[start * 2..].chunks_exact_mut(2).zip(span) {
                    frame[0] = frame[0].saturating_add(left * s);
                    frame[1] = frame[1].saturating_add(right * s);
                }
            }),
            Panning::Center => mix_signal(samples, voice, control_ratio, |start, span, gain, _| {
                for (frame, &s) in buffer[start * 2..].chunks_exact_mut(2).zip(span) {
                    let v = gain * s;
                    frame[0] = frame[0].saturating_add(v);
                    frame[1] = frame[1].saturating_add(v);
                }
            }),
            Panning::Left => mix_signal(samples, voice, control_ratio, |start, span, gain, _| {
                for (out, &s) in buffer[start * 2..].iter_mut().step_by(2).zip(span) {
                    *out = out.saturating_add(gain * s);
                }
            }),
            Panning::Right => mix_signal(samples, voice, control_ratio, |start, span, gain, _| {
                for (out, &s) in buffer[start * 2 + 1..].iter_mut().step_by(2).zip(span) {
                    *out = out.saturating_add(gain * s);
                }
            }),
        }
    }

    /// Mixes every active voice into `buffer`.
    pub fn mix(&mut self, voices: &mut [Voice], buffer: &mut [i32]) {
        for voice in voices.iter_mut() {
            self.mix_voice(voice, buffer);
        }
    }
}

/// Splits `samples` into spans ending on control ticks and hands each to
/// `mix` with the gains current for it. Stops early if the envelope runs out.
fn mix_signal<F>(samples: &[i32], voice: &mut Voice, control_ratio: u32, mut mix: F)
where
    F: FnMut(usize, &[i32], i32, i32),
{
    let mut pos = 0;
    while pos < samples.len() {
        if voice.control_counter == 0 {
            voice.control_counter = control_ratio;
            if voice.update_signal() {
                return;
            }
        }

        let n = (voice.control_counter as usize).min(samples.len() - pos);
        mix(pos, &samples[pos..pos + n], voice.left_mix, voice.right_mix);
        voice.control_counter -= n as u32;
        pos += n;
    }
}

/// Continues a killed voice's fade across `samples`. The gain falls linearly
/// from its last value to silence over `MAX_DIE_TIME` samples, however many
/// calls that spans. Returns how many outputs saturated.
fn ramp_out(samples: &[i32], buffer: &mut [i32], voice: &Voice, mono: bool) -> usize {
    let total = MAX_DIE_TIME as i64;
    let elapsed = voice.die_elapsed as i64;
    let ramp = |last: i32, i: usize| -> i32 {
        let last = i64::from(last);
        let step = (elapsed + i as i64 + 1).min(total);
        (last - last * step / total) as i32
    };

    let mut saturated = 0;
    let mut add = |out: &mut i32, v: i32| match out.checked_add(v) {
        Some(sum) => *out = sum,
        None => {
            *out = out.saturating_add(v);
            saturated += 1;
        }
    };

    for (i, &s) in samples.iter().enumerate() {
        let left = ramp(voice.left_mix, i);
        let right = ramp(voice.right_mix, i);

        if mono {
            add(&mut buffer[i], right * s);
            continue;
        }
        let frame = &mut buffer[i * 2..i * 2 + 2];
        match voice.panned {
            Panning::Mystery => {
                add(&mut frame[0], left * s);
                add(&mut frame[1], right * s);
            }
            Panning::Center => {
                add(&mut frame[0], left * s);
                add(&mut frame[1], left * s);
            }
            Panning::Left => add(&mut frame[0], left * s),
            Panning::Right => add(&mut frame[1], left * s),
        }
    }
    saturated
}
