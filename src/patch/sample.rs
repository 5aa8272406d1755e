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

//! In-memory instrument data shared read-only by every voice.

use std::fmt;
use std::sync::Arc;

use crate::fixed::Fixed;

/// GF1 sample mode flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modes(u8);

impl Modes {
    pub const BITS_16: Modes = Modes(0x01);
    pub const UNSIGNED: Modes = Modes(0x02);
    pub const LOOPING: Modes = Modes(0x04);
    pub const PINGPONG: Modes = Modes(0x08);
    pub const REVERSE: Modes = Modes(0x10);
    pub const SUSTAIN: Modes = Modes(0x20);
    pub const ENVELOPE: Modes = Modes(0x40);

    pub const fn from_bits(bits: u8) -> Modes {
        Modes(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if any of the given flags are set.
    pub const fn intersects(self, other: Modes) -> bool {
        self.0 & other.0 != 0
    }

    /// True if all of the given flags are set.
    pub const fn contains(self, other: Modes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modes) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modes) {
        self.0 &= !other.0;
    }

    pub const fn union(self, other: Modes) -> Modes {
        Modes(self.0 | other.0)
    }
}

impl std::ops::BitOr for Modes {
    type Output = Modes;

    fn bitor(self, rhs: Modes) -> Modes {
        self.union(rhs)
    }
}

impl fmt::Debug for Modes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Modes, &str); 7] = [
            (Modes::BITS_16, "16bit"),
            (Modes::UNSIGNED, "unsigned"),
            (Modes::LOOPING, "loop"),
            (Modes::PINGPONG, "pingpong"),
            (Modes::REVERSE, "reverse"),
            (Modes::SUSTAIN, "sustain"),
            (Modes::ENVELOPE, "envelope"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(mode, _)| self.contains(*mode))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "[{}]", names.join(","))
    }
}

impl fmt::Display for Modes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One waveform plus its playback metadata.
///
/// Positions are in fixed-point sample units. `data` carries one guard
/// sample past `data_length` so interpolation at the last position never
/// reads out of bounds.
#[derive(Clone, Debug)]
pub struct Sample {
    pub data: Vec<i16>,
    pub data_length: Fixed,
    pub loop_start: Fixed,
    pub loop_end: Fixed,
    /// Native rate in Hz; `None` once the waveform has been pre-resampled to
    /// the output rate and pitch.
    pub sample_rate: Option<u32>,
    /// Frequencies in milli-Hz.
    pub low_freq: i32,
    pub high_freq: i32,
    pub root_freq: i32,
    /// Envelope rates and targets, 15.15 fixed point.
    pub envelope_rate: [i32; 6],
    pub envelope_offset: [i32; 6],
    pub tremolo_sweep_increment: i32,
    pub tremolo_phase_increment: i32,
    pub tremolo_depth: u8,
    pub vibrato_sweep_increment: i32,
    /// Output samples between vibrato pitch refreshes; zero disables vibrato.
    pub vibrato_control_ratio: i32,
    pub vibrato_depth: u8,
    pub modes: Modes,
    /// 0 (left) to 127 (right).
    pub panning: u8,
    /// Fixed playback note, if this sample always plays at one pitch.
    pub note_to_use: Option<u8>,
    /// Static gain applied to every voice playing this sample.
    pub volume: f64,
}

impl Sample {
    /// Builds a plain 16-bit sample with no loop, envelope or LFOs.
    pub fn from_pcm(pcm: Vec<i16>, sample_rate: u32, root_freq: i32) -> Sample {
        let mut sample = Sample {
            data: Vec::new(),
            data_length: Fixed::ZERO,
            loop_start: Fixed::ZERO,
            loop_end: Fixed::ZERO,
            sample_rate: Some(sample_rate),
            low_freq: 0,
            high_freq: i32::MAX,
            root_freq,
            envelope_rate: [0; 6],
            envelope_offset: [0; 6],
            tremolo_sweep_increment: 0,
            tremolo_phase_increment: 0,
            tremolo_depth: 0,
            vibrato_sweep_increment: 0,
            vibrato_control_ratio: 0,
            vibrato_depth: 0,
            modes: Modes::BITS_16,
            panning: 64,
            note_to_use: None,
            volume: 1.0,
        };
        sample.set_waveform(pcm);
        sample
    }

    /// Replaces the waveform, appends the guard sample and resets
    /// `data_length` to cover exactly `pcm`.
    pub fn set_waveform(&mut self, mut pcm: Vec<i16>) {
        let len = pcm.len();
        let guard = pcm.last().copied().unwrap_or(0);
        pcm.push(guard);
        self.data = pcm;
        self.data_length = Fixed::from_samples(len as i64);
    }

    /// The waveform without the guard sample.
    pub fn waveform(&self) -> &[i16] {
        &self.data[..self.data.len().saturating_sub(1)]
    }

    /// Length of the underlying buffer in whole samples, independent of any
    /// tail stripping applied to `data_length`.
    pub fn buffer_len(&self) -> usize {
        self.data.len().saturating_sub(1)
    }

    pub fn is_looping(&self) -> bool {
        self.modes.contains(Modes::LOOPING)
    }

    pub fn has_envelope(&self) -> bool {
        self.modes.contains(Modes::ENVELOPE)
    }

    /// Loop points are usable: `0 <= loop_start < loop_end <= data_length`.
    pub fn loop_is_valid(&self) -> bool {
        Fixed::ZERO <= self.loop_start
            && self.loop_start < self.loop_end
            && self.loop_end <= self.data_length
    }

    /// Memory held by the waveform, in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<i16>()
    }
}

/// An ordered set of samples making up one patch.
#[derive(Clone, Debug)]
pub struct Instrument {
    samples: Vec<Arc<Sample>>,
}

impl Instrument {
    pub fn new(samples: Vec<Sample>) -> Instrument {
        Instrument {
            samples: samples.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn samples(&self) -> &[Arc<Sample>] {
        &self.samples
    }

    /// Picks the sample for a note at `freq` milli-Hz: the first whose key
    /// range covers it, else the one with the closest root frequency.
    pub fn select_sample(&self, freq: i32) -> Option<&Arc<Sample>> {
        if self.samples.len() == 1 {
            return self.samples.first();
        }

        self.samples
            .iter()
            .find(|s| s.low_freq <= freq && s.high_freq >= freq)
            .or_else(|| {
                self.samples
                    .iter()
                    .min_by_key(|s| (i64::from(s.root_freq) - i64::from(freq)).abs())
            })
    }

    /// Total waveform memory, in bytes.
    pub fn memory_size(&self) -> usize {
        self.samples.iter().map(|s| s.memory_size()).sum()
    }
}
