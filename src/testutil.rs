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

//! Builders for synthetic GF1 patches used across the test suites.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::patch::format::{HEADER_SIZE, MAGIC_110, MAGIC_LEN};

/// One sample record plus its waveform bytes.
#[derive(Clone, Debug)]
pub struct SampleSpec {
    pub name: String,
    pub fractions: u8,
    /// Loop points in bytes.
    pub loop_start: u32,
    pub loop_end: u32,
    pub sample_rate: u16,
    pub low_freq: u32,
    pub high_freq: u32,
    pub root_freq: u32,
    pub panning: u8,
    pub envelope_rates: [u8; 6],
    pub envelope_offsets: [u8; 6],
    /// Tremolo sweep/rate/depth then vibrato sweep/rate/depth.
    pub lfo: [u8; 6],
    pub modes: u8,
    pub data: Vec<u8>,
}

impl Default for SampleSpec {
    /// A 16-bit signed, non-looping sample at 44.1kHz rooted on middle C,
    /// with an envelope that decays immediately.
    fn default() -> Self {
        SampleSpec {
            name: "wave".to_string(),
            fractions: 0,
            loop_start: 0,
            loop_end: 0,
            sample_rate: 44100,
            low_freq: 0,
            high_freq: 12_543_854,
            root_freq: 261_626,
            panning: 7,
            envelope_rates: [63; 6],
            envelope_offsets: [250, 200, 150, 100, 50, 0],
            lfo: [0; 6],
            modes: 0x01,
            data: Vec::new(),
        }
    }
}

impl SampleSpec {
    /// Encodes signed 16-bit samples little-endian.
    pub fn pcm16(samples: &[i16]) -> Vec<u8> {
        let mut data = Vec::with_capacity(samples.len() * 2);
        for &s in samples {
            data.write_i16::<LittleEndian>(s).expect("write to vec");
        }
        data
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        let mut name = [0u8; 7];
        for (dst, src) in name.iter_mut().zip(self.name.bytes()) {
            *dst = src;
        }
        out.extend_from_slice(&name);
        out.push(self.fractions);
        out.write_u32::<LittleEndian>(self.data.len() as u32).expect("write to vec");
        out.write_u32::<LittleEndian>(self.loop_start).expect("write to vec");
        out.write_u32::<LittleEndian>(self.loop_end).expect("write to vec");
        out.write_u16::<LittleEndian>(self.sample_rate).expect("write to vec");
        out.write_u32::<LittleEndian>(self.low_freq).expect("write to vec");
        out.write_u32::<LittleEndian>(self.high_freq).expect("write to vec");
        out.write_u32::<LittleEndian>(self.root_freq).expect("write to vec");
        out.extend_from_slice(&[0, 0]);
        out.push(self.panning);
        out.extend_from_slice(&self.envelope_rates);
        out.extend_from_slice(&self.envelope_offsets);
        out.extend_from_slice(&self.lfo);
        out.push(self.modes);
        out.extend_from_slice(&[0u8; 40]);
        out.extend_from_slice(&self.data);
    }
}

/// Assembles a complete patch file.
pub struct PatchBuilder {
    magic: [u8; MAGIC_LEN],
    instruments: u8,
    layers: u8,
    samples: Vec<SampleSpec>,
    sample_count: Option<u8>,
}

impl PatchBuilder {
    pub fn new() -> Self {
        PatchBuilder {
            magic: *MAGIC_110,
            instruments: 1,
            layers: 1,
            samples: Vec::new(),
            sample_count: None,
        }
    }

    pub fn magic(mut self, magic: &[u8; MAGIC_LEN]) -> Self {
        self.magic = *magic;
        self
    }

    pub fn instruments(mut self, count: u8) -> Self {
        self.instruments = count;
        self
    }

    pub fn layers(mut self, count: u8) -> Self {
        self.layers = count;
        self
    }

    /// Overrides the declared sample count, e.g. to declare more samples than
    /// are present.
    pub fn sample_count(mut self, count: u8) -> Self {
        self.sample_count = Some(count);
        self
    }

    pub fn sample(mut self, spec: SampleSpec) -> Self {
        self.samples.push(spec);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];
        out[..MAGIC_LEN].copy_from_slice(&self.magic);
        out[82] = self.instruments;
        out[151] = self.layers;
        out[198] = self
            .sample_count
            .unwrap_or(self.samples.len() as u8);

        for sample in &self.samples {
            sample.write_to(&mut out);
        }
        out
    }

    /// Writes the patch to `dir/name` and returns the full path.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).expect("create patch file");
        file.write_all(&self.build()).expect("write patch file");
        path
    }
}
