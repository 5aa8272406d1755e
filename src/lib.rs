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

//! A wavetable synthesis engine for GF1 sampled-instrument patches.
//!
//! Patches are parsed and normalized once by [`patch::PatchLoader`], then
//! played by [`voice::Voice`]s: the [`resample::Resampler`] walks each
//! voice's waveform at its pitch, and the [`mixer::Mixer`] applies envelope,
//! tremolo and panning while accumulating into a 32-bit buffer.
//! [`synth::Synth`] ties these together behind note-on and note-off.

pub mod config;
pub mod fixed;
pub mod format;
pub mod mixer;
pub mod patch;
pub mod resample;
pub mod synth;
pub mod tables;
pub mod voice;

#[cfg(test)]
mod testutil;
