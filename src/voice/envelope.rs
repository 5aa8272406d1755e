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

//! Control-rate modulation: the six stage envelope and both LFOs.

use super::{Panning, Voice, VoiceStatus};
use crate::fixed::{Fixed, FRACTION_BITS};
use crate::format::RenderParams;
use crate::tables::{
    bend_ratio, fscale, fscale_neg, sine, AMP_BITS, MAX_AMP_VALUE, RATE_SHIFT, SINE_CYCLE_LENGTH,
    SWEEP_SHIFT, TREMOLO_AMPLITUDE_TUNING, VIBRATO_AMPLITUDE_TUNING, VIBRATO_SAMPLE_INCREMENTS,
    VOL_TABLE,
};

/// Index of the last envelope stage.
const LAST_STAGE: usize = 5;

/// Stage past which a held note freezes its envelope.
const SUSTAIN_STAGE: usize = 2;

const VIBRATO_PHASES: i32 = 2 * VIBRATO_SAMPLE_INCREMENTS as i32;

/// Maps one of the `2 * N` vibrato phases onto the `N` cached magnitudes.
/// The sine is symmetric about each quarter cycle, so mirrored phases share
/// a slot.
fn vibrato_slot(phase: i32) -> usize {
    let n = VIBRATO_SAMPLE_INCREMENTS as i32;
    let slot = if phase < n / 2 {
        n / 2 - 1 - phase
    } else if phase >= 3 * n / 2 {
        5 * n / 2 - 1 - phase
    } else {
        phase - n / 2
    };
    slot as usize
}

/// Applies a sweep-in to an LFO depth, turning the sweep off once complete.
fn swept_depth(depth: i32, sweep: &mut i32, position: &mut i32) -> i32 {
    if *sweep == 0 {
        return depth;
    }
    *position += *sweep;
    if *position >= 1 << SWEEP_SHIFT {
        *sweep = 0;
        depth
    } else {
        ((i64::from(depth) * i64::from(*position)) >> SWEEP_SHIFT) as i32
    }
}

impl Voice {
    /// Moves the envelope to its next stage. Returns true when the voice has
    /// run out of stages and is now free.
    pub fn recompute_envelope(&mut self) -> bool {
        loop {
            if self.envelope_stage > LAST_STAGE {
                self.status = VoiceStatus::Free;
                return true;
            }

            if self.sample.has_envelope()
                && matches!(self.status, VoiceStatus::On | VoiceStatus::Sustained)
                && self.envelope_stage > SUSTAIN_STAGE
            {
                // Hold until the note is released.
                self.envelope_increment = 0;
                return false;
            }

            let stage = self.envelope_stage;
            self.envelope_stage += 1;

            let target = self.sample.envelope_offset[stage];
            if target == self.envelope_volume {
                continue;
            }

            self.envelope_target = target;
            self.envelope_increment = self.sample.envelope_rate[stage];
            if target < self.envelope_volume {
                self.envelope_increment = -self.envelope_increment;
            }
            return false;
        }
    }

    /// Advances the envelope by one control tick. Returns true when the voice
    /// has finished.
    pub fn update_envelope(&mut self) -> bool {
        self.envelope_volume = self
            .envelope_volume
            .saturating_add(self.envelope_increment);

        let reached = (self.envelope_increment < 0 && self.envelope_volume <= self.envelope_target)
            || (self.envelope_increment > 0 && self.envelope_volume >= self.envelope_target);
        if reached {
            self.envelope_volume = self.envelope_target;
            return self.recompute_envelope();
        }
        false
    }

    /// Advances the tremolo by one control tick.
    pub fn update_tremolo(&mut self) {
        let depth = swept_depth(
            i32::from(self.sample.tremolo_depth) << 7,
            &mut self.tremolo_sweep,
            &mut self.tremolo_sweep_position,
        );

        self.tremolo_phase = self.tremolo_phase.wrapping_add(self.tremolo_phase_increment);
        let swing = (sine(self.tremolo_phase >> RATE_SHIFT) + 1.0)
            * f64::from(depth)
            * TREMOLO_AMPLITUDE_TUNING;
        self.tremolo_volume = 1.0 - fscale_neg(swing, 17);
    }

    /// Steps the vibrato phase and returns the playback increment for it,
    /// signed to match the current playback direction.
    pub fn update_vibrato(&mut self, params: &RenderParams) -> Fixed {
        let negative = self.sample_increment.is_negative();

        self.vibrato_phase = if self.vibrato_phase >= VIBRATO_PHASES - 1 {
            0
        } else {
            self.vibrato_phase + 1
        };
        let slot = vibrato_slot(self.vibrato_phase);

        if let Some(cached) = self.vibrato_sample_increment[slot] {
            return if negative { -cached } else { cached };
        }

        let depth = swept_depth(
            i32::from(self.sample.vibrato_depth) << 7,
            &mut self.vibrato_sweep,
            &mut self.vibrato_sweep_position,
        );

        let mut a = self.pitch_ratio(params) * f64::from(1u32 << FRACTION_BITS);
        let pb = (sine(self.vibrato_phase * (SINE_CYCLE_LENGTH / VIBRATO_PHASES))
            * f64::from(depth)
            * VIBRATO_AMPLITUDE_TUNING) as i32;
        if pb < 0 {
            a /= bend_ratio(pb);
        } else {
            a *= bend_ratio(pb);
        }

        let increment = Fixed::from_raw(a as i64);
        // Only the full-depth increments are stable enough to reuse.
        if self.vibrato_sweep == 0 {
            self.vibrato_sample_increment[slot] = Some(increment);
        }

        if negative {
            -increment
        } else {
            increment
        }
    }

    /// Folds tremolo and envelope into the final mix gains.
    pub fn apply_envelope_to_amp(&mut self) {
        let mut left = self.left_amp;
        let mut right = self.right_amp;

        if self.tremolo_phase_increment != 0 {
            left *= self.tremolo_volume;
            right *= self.tremolo_volume;
        }
        if self.sample.has_envelope() {
            let index = (self.envelope_volume >> 23).clamp(0, 127) as usize;
            left *= VOL_TABLE[index];
            right *= VOL_TABLE[index];
        }

        let left_mix = fscale(left, AMP_BITS).clamp(0, MAX_AMP_VALUE);
        self.left_mix = left_mix;
        self.right_mix = match self.panned {
            Panning::Mystery => fscale(right, AMP_BITS).clamp(0, MAX_AMP_VALUE),
            _ => left_mix,
        };
    }

    /// One control tick: envelope, tremolo, then the mix gains. Returns true
    /// when the envelope has run out and the voice is free.
    pub fn update_signal(&mut self) -> bool {
        if self.envelope_increment != 0 && self.update_envelope() {
            return true;
        }
        if self.tremolo_phase_increment != 0 {
            self.update_tremolo();
        }
        self.apply_envelope_to_amp();
        false
    }
}
