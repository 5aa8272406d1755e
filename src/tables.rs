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

//! Precomputed lookup tables and the tuning constants shared by the loader,
//! the envelope/LFO engine and the resampler.

use std::f64::consts::PI;

use lazy_static::lazy_static;

/// Positions in one sine cycle.
pub const SINE_CYCLE_LENGTH: i32 = 1024;

/// Sweep positions are 16.16 fixed point; full depth at `1 << SWEEP_SHIFT`.
pub const SWEEP_SHIFT: u32 = 16;

/// Extra precision bits kept in the tremolo phase.
pub const RATE_SHIFT: u32 = 5;

pub const SWEEP_TUNING: i64 = 38;
pub const TREMOLO_RATE_TUNING: i64 = 38;
pub const VIBRATO_RATE_TUNING: i64 = 38;

/// Distinct vibrato pitch magnitudes cached per voice. The phase runs over
/// twice this many positions and folds back onto the cache by symmetry.
pub const VIBRATO_SAMPLE_INCREMENTS: usize = 32;

pub const TREMOLO_AMPLITUDE_TUNING: f64 = 1.0;
pub const VIBRATO_AMPLITUDE_TUNING: f64 = 1.0;

/// Bits of precision in a per-voice mix gain.
pub const AMP_BITS: u32 = 12;

/// Largest representable mix gain.
pub const MAX_AMP_VALUE: i32 = (1 << (AMP_BITS + 1)) - 1;

/// Upper bound on samples per envelope/LFO tick.
pub const MAX_CONTROL_RATIO: u32 = 255;

/// Longest ramp-out of a killed voice, in output samples.
pub const MAX_DIE_TIME: usize = 20;

lazy_static! {
    /// Frequency of each MIDI note in milli-Hz.
    pub static ref FREQ_TABLE: [i32; 128] = {
        let mut table = [0; 128];
        for (note, freq) in table.iter_mut().enumerate() {
            *freq = (8175.7989 * 2f64.powf(note as f64 / 12.0)).round() as i32;
        }
        table
    };

    /// Logarithmic gain curve, `2^((x/127 - 1) * 6)`.
    pub static ref VOL_TABLE: [f64; 128] = {
        let mut table = [0.0; 128];
        for (x, vol) in table.iter_mut().enumerate() {
            *vol = 2f64.powf((x as f64 / 127.0 - 1.0) * 6.0);
        }
        table
    };

    static ref SINE_TABLE: Vec<f64> = (0..SINE_CYCLE_LENGTH)
        .map(|x| (2.0 * PI * x as f64 / SINE_CYCLE_LENGTH as f64).sin())
        .collect();

    /// Fine pitch-bend ratios, 256 steps per semitone.
    pub static ref BEND_FINE: [f64; 256] = {
        let mut table = [0.0; 256];
        for (i, ratio) in table.iter_mut().enumerate() {
            *ratio = 2f64.powf(i as f64 / (12.0 * 256.0));
        }
        table
    };

    /// Coarse pitch-bend ratios, one per semitone.
    pub static ref BEND_COARSE: [f64; 128] = {
        let mut table = [0.0; 128];
        for (i, ratio) in table.iter_mut().enumerate() {
            *ratio = 2f64.powf(i as f64 / 12.0);
        }
        table
    };
}

/// Sine of a phase measured in [`SINE_CYCLE_LENGTH`] units. Wraps.
pub fn sine(phase: i32) -> f64 {
    SINE_TABLE[phase.rem_euclid(SINE_CYCLE_LENGTH) as usize]
}

/// Frequency in milli-Hz of a MIDI note, clamped to the table.
pub fn note_frequency(note: u8) -> i32 {
    FREQ_TABLE[usize::from(note.min(127))]
}

/// Pitch ratio for a bend of `pb` units, 8192 units per semitone. The sign
/// is ignored; callers divide for downward bends.
pub fn bend_ratio(pb: i32) -> f64 {
    let pb = pb.unsigned_abs() as usize;
    BEND_FINE[(pb >> 5) & 0xff] * BEND_COARSE[(pb >> 13).min(127)]
}

/// Scales a real value by `2^bits` and truncates, as gains are converted to
/// their fixed representation.
pub fn fscale(value: f64, bits: u32) -> i32 {
    (value * f64::from(1u32 << bits)) as i32
}

/// Divides a real value by `2^bits`.
pub fn fscale_neg(value: f64, bits: u32) -> f64 {
    value / (1u64 << bits) as f64
}
