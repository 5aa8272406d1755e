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

//! Conversions from raw GF1 envelope and LFO bytes to engine units. All of
//! them depend on the output rate and control ratio, so they run at load time.

use crate::format::RenderParams;
use crate::tables::{
    RATE_SHIFT, SINE_CYCLE_LENGTH, SWEEP_SHIFT, SWEEP_TUNING, TREMOLO_RATE_TUNING,
    VIBRATO_RATE_TUNING, VIBRATO_SAMPLE_INCREMENTS,
};

/// Converts an envelope rate byte to a 15.15 per-tick increment.
///
/// The top two bits select a range multiplier, the low six bits are the
/// magnitude.
pub fn envelope_rate(rate: u8, params: &RenderParams) -> i32 {
    let shift = 3 * (3 - u32::from((rate >> 6) & 0x3));
    // 6.9 fixed point
    let r = i64::from(rate & 0x3f) << shift;
    let scaled = (r * 44100) / i64::from(params.output_rate) * i64::from(params.control_ratio);
    let r = scaled << if params.fast_decay { 10 } else { 9 };
    r.min(i64::from(i32::MAX)) as i32
}

/// Places an envelope offset byte in the high bits of the 15.15 range.
pub fn envelope_offset(offset: u8) -> i32 {
    i32::from(offset) << (7 + 15)
}

pub fn tremolo_sweep(sweep: u8, params: &RenderParams) -> i32 {
    if sweep == 0 {
        return 0;
    }
    (((i64::from(params.control_ratio) * SWEEP_TUNING) << SWEEP_SHIFT)
        / (i64::from(params.output_rate) * i64::from(sweep))) as i32
}

pub fn tremolo_rate(rate: u8, params: &RenderParams) -> i32 {
    (((i64::from(SINE_CYCLE_LENGTH) * i64::from(params.control_ratio) * i64::from(rate))
        << RATE_SHIFT)
        / (TREMOLO_RATE_TUNING * i64::from(params.output_rate))) as i32
}

/// Returns the number of output samples between vibrato updates.
pub fn vibrato_control_ratio(rate: u8, params: &RenderParams) -> i32 {
    if rate == 0 {
        return 0;
    }
    ((VIBRATO_RATE_TUNING * i64::from(params.output_rate))
        / (i64::from(rate) * 2 * VIBRATO_SAMPLE_INCREMENTS as i64)) as i32
}

pub fn vibrato_sweep(sweep: u8, vib_control_ratio: i32, params: &RenderParams) -> i32 {
    if sweep == 0 {
        return 0;
    }
    let scaled = f64::from(vib_control_ratio) * SWEEP_TUNING as f64 * f64::from(1u32 << SWEEP_SHIFT);
    (scaled / (f64::from(params.output_rate) * f64::from(sweep))) as i32
}
