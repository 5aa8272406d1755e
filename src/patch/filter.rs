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

//! Load-time anti-aliasing for patches recorded above the output rate.

use std::f64::consts::PI;

use tracing::debug;

/// A filter run once over a waveform before it is rendered at a lower rate.
pub trait AntiAliasFilter: Send + Sync {
    fn apply(&self, data: &mut [i16], sample_rate: u32, output_rate: u32);
}

/// Symmetric FIR low-pass with a Kaiser window.
#[derive(Debug, Clone, Copy)]
pub struct KaiserLowPass {
    /// Stop-band attenuation in dB.
    attenuation: f64,
}

const ORDER: usize = 20;
const HALF_ORDER: usize = ORDER / 2;

impl Default for KaiserLowPass {
    fn default() -> Self {
        KaiserLowPass { attenuation: 40.0 }
    }
}

impl KaiserLowPass {
    /// Filter taps for a cutoff given as a fraction of the source rate.
    fn design(&self, cutoff: f64) -> [f64; ORDER] {
        let excess = self.attenuation - 20.96;
        let beta = (0.58417 * excess).powf(0.4) + 0.07886 * excess;
        let window = kaiser_window(beta);

        let mut half = [0.0; HALF_ORDER];
        for (i, tap) in half.iter_mut().enumerate() {
            let omega = PI * (i as f64 + 0.5);
            *tap = (omega * cutoff).sin() / omega * window[i];
        }

        let mut taps = [0.0; ORDER];
        for i in 0..HALF_ORDER {
            taps[HALF_ORDER - 1 - i] = half[i];
            taps[HALF_ORDER + i] = half[i];
        }
        taps
    }
}

impl AntiAliasFilter for KaiserLowPass {
    fn apply(&self, data: &mut [i16], sample_rate: u32, output_rate: u32) {
        if output_rate >= sample_rate || data.is_empty() {
            return;
        }

        let taps = self.design(f64::from(output_rate) / f64::from(sample_rate));
        let source = data.to_vec();
        let mut clipped = 0usize;

        for (n, out) in data.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (k, tap) in taps.iter().enumerate() {
                // Zero padding on both edges.
                let idx = n as isize + k as isize - HALF_ORDER as isize;
                if idx >= 0 && (idx as usize) < source.len() {
                    sum += tap * f64::from(source[idx as usize]);
                }
            }
            if sum > f64::from(i16::MAX) || sum < f64::from(i16::MIN) {
                clipped += 1;
            }
            *out = sum.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
        }

        if clipped > 0 {
            debug!(clipped, "Anti-aliasing filter saturated");
        }
    }
}

/// Zeroth-order modified Bessel function of the first kind.
fn bessel_i0(x: f64) -> f64 {
    let y = x / 2.0;
    let mut e = 1.0;
    let mut de = 1.0;
    for i in 1..=25 {
        de = de * y / i as f64;
        let sde = de * de;
        e += sde;
        if e * 1.0e-08 - sde > 0.0 {
            break;
        }
    }
    e
}

fn kaiser_window(beta: f64) -> [f64; HALF_ORDER] {
    let mut window = [0.0; HALF_ORDER];
    let xind = ((2 * HALF_ORDER - 1) * (2 * HALF_ORDER - 1)) as f64;
    for (i, w) in window.iter_mut().enumerate() {
        let xi = i as f64 + 0.5;
        *w = bessel_i0(beta * (1.0 - 4.0 * xi * xi / xind).sqrt()) / bessel_i0(beta);
    }
    window
}
