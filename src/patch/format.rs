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

//! Byte layout of GF1 patch files.

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::error::LoadError;

/// Size of the file header, in bytes.
pub const HEADER_SIZE: usize = 239;

/// Size of each per-sample record preceding its waveform, in bytes.
pub const SAMPLE_RECORD_SIZE: usize = 96;

pub const MAGIC_LEN: usize = 22;
pub const MAGIC_110: &[u8; MAGIC_LEN] = b"GF1PATCH110\0ID#000002\0";
pub const MAGIC_100: &[u8; MAGIC_LEN] = b"GF1PATCH100\0ID#000002\0";

const INSTRUMENTS_OFFSET: usize = 82;
const LAYERS_OFFSET: usize = 151;
const SAMPLES_OFFSET: usize = 198;

const WAVE_NAME_LEN: usize = 7;
const TUNE_LEN: usize = 2;
const RESERVED_LEN: usize = 40;

/// The counts in a validated file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHeader {
    pub samples: u8,
}

/// Reads and validates the fixed header. Instrument and layer counts of both
/// 0 and 1 mean "one"; writers disagree on which to use.
pub fn read_header<R: Read>(reader: &mut R, name: &str) -> Result<PatchHeader, LoadError> {
    let mut header = [0u8; HEADER_SIZE];
    if reader.read_exact(&mut header).is_err() {
        return Err(LoadError::NotAnInstrument {
            name: name.to_string(),
        });
    }

    let magic = &header[..MAGIC_LEN];
    if magic != MAGIC_110 && magic != MAGIC_100 {
        return Err(LoadError::NotAnInstrument {
            name: name.to_string(),
        });
    }

    let instruments = header[INSTRUMENTS_OFFSET];
    if instruments > 1 {
        return Err(LoadError::UnsupportedInstruments {
            name: name.to_string(),
            count: instruments,
        });
    }

    let layers = header[LAYERS_OFFSET];
    if layers > 1 {
        return Err(LoadError::UnsupportedLayers {
            name: name.to_string(),
            count: layers,
        });
    }

    Ok(PatchHeader {
        samples: header[SAMPLES_OFFSET],
    })
}

/// Raw fields of one sample record, before any conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleRecord {
    pub name: String,
    /// Low nibble: loop start fraction. High nibble: loop end fraction.
    pub fractions: u8,
    /// Lengths and loop points in bytes.
    pub data_length: u32,
    pub loop_start: u32,
    pub loop_end: u32,
    pub sample_rate: u16,
    pub low_freq: u32,
    pub high_freq: u32,
    pub root_freq: u32,
    /// 0 (left) to 15 (right).
    pub panning: u8,
    pub envelope_rates: [u8; 6],
    pub envelope_offsets: [u8; 6],
    pub tremolo_sweep: u8,
    pub tremolo_rate: u8,
    pub tremolo_depth: u8,
    pub vibrato_sweep: u8,
    pub vibrato_rate: u8,
    pub vibrato_depth: u8,
    pub modes: u8,
}

impl SampleRecord {
    /// Reads one 96-byte record.
    pub fn read<R: Read>(reader: &mut R) -> io::Result<SampleRecord> {
        let mut name = [0u8; WAVE_NAME_LEN];
        reader.read_exact(&mut name)?;
        let name = String::from_utf8_lossy(&name)
            .trim_end_matches('\0')
            .to_string();

        let fractions = reader.read_u8()?;
        let data_length = reader.read_u32::<LittleEndian>()?;
        let loop_start = reader.read_u32::<LittleEndian>()?;
        let loop_end = reader.read_u32::<LittleEndian>()?;
        let sample_rate = reader.read_u16::<LittleEndian>()?;
        let low_freq = reader.read_u32::<LittleEndian>()?;
        let high_freq = reader.read_u32::<LittleEndian>()?;
        let root_freq = reader.read_u32::<LittleEndian>()?;
        skip(reader, TUNE_LEN)?;
        let panning = reader.read_u8()?;

        let mut envelope_rates = [0u8; 6];
        reader.read_exact(&mut envelope_rates)?;
        let mut envelope_offsets = [0u8; 6];
        reader.read_exact(&mut envelope_offsets)?;

        let mut lfo = [0u8; 6];
        reader.read_exact(&mut lfo)?;

        let modes = reader.read_u8()?;
        skip(reader, RESERVED_LEN)?;

        Ok(SampleRecord {
            name,
            fractions,
            data_length,
            loop_start,
            loop_end,
            sample_rate,
            low_freq,
            high_freq,
            root_freq,
            panning,
            envelope_rates,
            envelope_offsets,
            tremolo_sweep: lfo[0],
            tremolo_rate: lfo[1],
            tremolo_depth: lfo[2],
            vibrato_sweep: lfo[3],
            vibrato_rate: lfo[4],
            vibrato_depth: lfo[5],
            modes,
        })
    }
}

fn skip<R: Read>(reader: &mut R, len: usize) -> io::Result<()> {
    let mut buf = [0u8; RESERVED_LEN];
    reader.read_exact(&mut buf[..len])
}

/// Decodes raw little-endian waveform bytes to signed 16-bit samples: 8-bit
/// data is widened into the high byte, unsigned data has its sign bit flipped.
pub fn decode_waveform(bytes: &[u8], sixteen_bit: bool, unsigned: bool) -> Vec<i16> {
    let flip: u16 = if unsigned { 0x8000 } else { 0 };

    if sixteen_bit {
        let mut reader = bytes;
        let mut pcm = Vec::with_capacity(bytes.len() / 2);
        while let Ok(value) = reader.read_u16::<LittleEndian>() {
            pcm.push((value ^ flip) as i16);
        }
        pcm
    } else {
        bytes
            .iter()
            .map(|&b| ((u16::from(b) << 8) ^ flip) as i16)
            .collect()
    }
}
