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

//! Patch loading and normalization.
//!
//! A patch is parsed completely into owned samples before an [`Instrument`]
//! is returned; any failure drops everything parsed so far.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::convert;
use super::error::LoadError;
use super::filter::{AntiAliasFilter, KaiserLowPass};
use super::format::{self, SampleRecord};
use super::sample::{Instrument, Modes, Sample};
use crate::fixed::Fixed;
use crate::format::RenderParams;
use crate::resample;

/// Waveforms larger than this are rejected rather than allocated.
pub const MAX_SAMPLE_BYTES: u32 = 1 << 24;

/// Default extensions tried after the bare patch name.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".pat"];

/// Envelope stripping policy for a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StripEnvelope {
    /// Keep whatever the patch declares.
    Never,
    /// Always remove the envelope.
    Always,
    /// Remove it when the patch looks like it doesn't want one.
    #[default]
    Guess,
}

/// Per-patch overrides, normally derived from a tone bank entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Panning override, 0 (left) to 127 (right).
    pub panning: Option<u8>,
    /// Plays every sample at this note.
    pub note: Option<u8>,
    /// Static volume as a percentage; `None` normalizes each sample's peak.
    pub amp: Option<u32>,
    pub strip_loop: bool,
    pub strip_envelope: StripEnvelope,
    /// Truncates playback at the loop end.
    pub strip_tail: bool,
}

/// Loads GF1 patches from disk.
pub struct PatchLoader {
    params: RenderParams,
    search_paths: Vec<PathBuf>,
    extensions: Vec<String>,
    filter: Box<dyn AntiAliasFilter>,
}

impl PatchLoader {
    /// Creates a loader converting patches for the given render parameters.
    pub fn new(params: RenderParams) -> Self {
        Self {
            params,
            search_paths: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            filter: Box::new(KaiserLowPass::default()),
        }
    }

    /// Directories searched, in order, for relative patch names.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Extensions tried, in order, after the bare name.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_filter(mut self, filter: Box<dyn AntiAliasFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Finds the file for a patch name, trying the bare name and then each
    /// extension, first as given and then under each search path.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, LoadError> {
        let mut tried = Vec::new();

        let candidates = std::iter::once(name.to_string())
            .chain(self.extensions.iter().map(|ext| format!("{}{}", name, ext)));

        for candidate in candidates {
            let direct = PathBuf::from(&candidate);
            let mut paths = vec![direct.clone()];
            if !direct.is_absolute() {
                paths.extend(self.search_paths.iter().map(|dir| dir.join(&candidate)));
            }

            for path in paths {
                if path.is_file() {
                    return Ok(path);
                }
                tried.push(path);
            }
        }

        Err(LoadError::NotFound {
            name: name.to_string(),
            tried,
        })
    }

    /// Resolves and loads a patch.
    pub fn load(&self, name: &str, options: &LoadOptions) -> Result<Instrument, LoadError> {
        let path = self.resolve(name)?;
        info!(path = ?path, "Loading instrument");

        let file = File::open(&path)?;
        let result = self.load_from_reader(&mut BufReader::new(file), name, options);
        match &result {
            Ok(instrument) => info!(
                path = ?path,
                samples = instrument.samples().len(),
                memory_kb = instrument.memory_size() / 1024,
                "Instrument loaded"
            ),
            Err(e) => error!(path = ?path, err = %e, "Failed to load instrument"),
        }
        result
    }

    /// Parses a patch from any byte source.
    pub fn load_from_reader<R: Read>(
        &self,
        reader: &mut R,
        name: &str,
        options: &LoadOptions,
    ) -> Result<Instrument, LoadError> {
        let header = format::read_header(reader, name)?;
        if header.samples == 0 {
            return Err(LoadError::Empty {
                name: name.to_string(),
            });
        }

        let mut samples = Vec::with_capacity(usize::from(header.samples));
        for index in 0..usize::from(header.samples) {
            let truncated = |source| LoadError::Truncated {
                name: name.to_string(),
                sample: index,
                source,
            };

            let record = SampleRecord::read(reader).map_err(truncated)?;
            if record.data_length > MAX_SAMPLE_BYTES {
                return Err(LoadError::TooLarge {
                    name: name.to_string(),
                    sample: index,
                    bytes: record.data_length,
                });
            }

            let mut bytes = vec![0u8; record.data_length as usize];
            reader.read_exact(&mut bytes).map_err(truncated)?;

            samples.push(self.build_sample(name, index, &record, &bytes, options));
        }

        Ok(Instrument::new(samples))
    }

    /// Converts one raw record and its waveform into a playable sample,
    /// applying the compatibility and quality fixups in load order.
    fn build_sample(
        &self,
        name: &str,
        index: usize,
        record: &SampleRecord,
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Sample {
        let params = &self.params;
        let mut modes = Modes::from_bits(record.modes);

        // Many patches loop without declaring sustain. Force it on.
        if modes.contains(Modes::LOOPING) {
            modes.insert(Modes::SUSTAIN);
        }

        let loop_modes = Modes::SUSTAIN | Modes::LOOPING | Modes::PINGPONG | Modes::REVERSE;
        if options.strip_loop && modes.intersects(loop_modes) {
            debug!(name, sample = index, "Removing loop and/or sustain");
            modes.remove(loop_modes);
        }

        strip_envelope(&mut modes, record, options.strip_envelope, name, index);

        let mut envelope_rate = [0; 6];
        let mut envelope_offset = [0; 6];
        for stage in 0..6 {
            envelope_rate[stage] = convert::envelope_rate(record.envelope_rates[stage], params);
            envelope_offset[stage] = convert::envelope_offset(record.envelope_offsets[stage]);
        }

        let (tremolo_sweep_increment, tremolo_phase_increment, tremolo_depth) =
            if record.tremolo_rate == 0 || record.tremolo_depth == 0 {
                debug!(name, sample = index, "No tremolo");
                (0, 0, 0)
            } else {
                let sweep = convert::tremolo_sweep(record.tremolo_sweep, params);
                let phase = convert::tremolo_rate(record.tremolo_rate, params);
                debug!(
                    name,
                    sample = index,
                    sweep,
                    phase,
                    depth = record.tremolo_depth,
                    "Tremolo"
                );
                (sweep, phase, record.tremolo_depth)
            };

        let (vibrato_sweep_increment, vibrato_control_ratio, vibrato_depth) =
            if record.vibrato_rate == 0 || record.vibrato_depth == 0 {
                debug!(name, sample = index, "No vibrato");
                (0, 0, 0)
            } else {
                let ratio = convert::vibrato_control_ratio(record.vibrato_rate, params);
                let sweep = convert::vibrato_sweep(record.vibrato_sweep, ratio, params);
                debug!(
                    name,
                    sample = index,
                    sweep,
                    control_ratio = ratio,
                    depth = record.vibrato_depth,
                    "Vibrato"
                );
                (sweep, ratio, record.vibrato_depth)
            };

        let sixteen_bit = modes.contains(Modes::BITS_16);
        let mut pcm = format::decode_waveform(bytes, sixteen_bit, modes.contains(Modes::UNSIGNED));
        let bytes_per_sample = if sixteen_bit { 2 } else { 1 };
        let mut loop_start = i64::from(record.loop_start / bytes_per_sample);
        let mut loop_end = i64::from(record.loop_end / bytes_per_sample);

        if modes.contains(Modes::REVERSE) {
            warn!(name, sample = index, "Reverse loop");
            (loop_start, loop_end) = unreverse(&mut pcm, loop_start, loop_end);
            modes.remove(Modes::REVERSE);
            modes.insert(Modes::LOOPING);
        }

        if params.antialiasing && u32::from(record.sample_rate) > params.output_rate {
            debug!(
                name,
                sample = index,
                sample_rate = record.sample_rate,
                output_rate = params.output_rate,
                "Anti-aliasing"
            );
            self.filter
                .apply(&mut pcm, u32::from(record.sample_rate), params.output_rate);
        }

        let volume = match options.amp {
            Some(amp) => f64::from(amp) / 100.0,
            None => {
                let volume = peak_normalization(&pcm);
                debug!(name, sample = index, volume, "Volume compensation");
                volume
            }
        };

        let panning = match options.panning {
            Some(panning) => panning & 0x7f,
            None => record.panning.wrapping_mul(8).wrapping_add(4) & 0x7f,
        };

        let mut sample = Sample {
            data: Vec::new(),
            data_length: Fixed::ZERO,
            loop_start: Fixed::ZERO,
            loop_end: Fixed::ZERO,
            sample_rate: Some(u32::from(record.sample_rate)),
            low_freq: record.low_freq as i32,
            high_freq: record.high_freq as i32,
            root_freq: record.root_freq as i32,
            envelope_rate,
            envelope_offset,
            tremolo_sweep_increment,
            tremolo_phase_increment,
            tremolo_depth,
            vibrato_sweep_increment,
            vibrato_control_ratio,
            vibrato_depth,
            modes,
            panning,
            note_to_use: options.note,
            volume,
        };
        sample.set_waveform(pcm);
        sample.loop_start = Fixed::from_samples(loop_start).with_nibble_fraction(record.fractions);
        sample.loop_end = Fixed::from_samples(loop_end).with_nibble_fraction(record.fractions >> 4);

        if sample.modes.contains(Modes::LOOPING) && !sample.loop_is_valid() {
            warn!(
                name,
                sample = index,
                loop_start = %sample.loop_start,
                loop_end = %sample.loop_end,
                "Invalid loop points, removing loop"
            );
            sample.modes.remove(Modes::LOOPING | Modes::PINGPONG);
        }

        if sample.note_to_use.is_some() && !sample.is_looping() {
            resample::pre_resample(&mut sample, params);
        }

        if options.strip_tail {
            if sample.is_looping() && sample.loop_is_valid() {
                debug!(name, sample = index, "Stripping tail");
                sample.data_length = sample.loop_end;
            } else {
                warn!(name, sample = index, "No usable loop, keeping tail");
            }
        }

        sample
    }
}

impl fmt::Debug for PatchLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchLoader")
            .field("output_rate", &self.params.output_rate)
            .field("search_paths", &self.search_paths)
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Applies the envelope stripping policy.
fn strip_envelope(
    modes: &mut Modes,
    record: &SampleRecord,
    policy: StripEnvelope,
    name: &str,
    index: usize,
) {
    match policy {
        StripEnvelope::Never => {}
        StripEnvelope::Always => {
            if modes.contains(Modes::ENVELOPE) {
                debug!(name, sample = index, "Removing envelope");
            }
            modes.remove(Modes::ENVELOPE);
        }
        StripEnvelope::Guess => {
            let rates = &record.envelope_rates;
            if !modes.intersects(Modes::LOOPING | Modes::PINGPONG | Modes::REVERSE) {
                // Nothing to sustain without a loop.
                debug!(name, sample = index, "No loop, removing sustain and envelope");
                modes.remove(Modes::SUSTAIN | Modes::ENVELOPE);
            } else if rates.iter().all(|&r| r == rates[0]) || record.envelope_offsets[5] >= 100 {
                debug!(name, sample = index, "Weird envelope, removing it");
                modes.remove(Modes::ENVELOPE);
            } else if !modes.contains(Modes::SUSTAIN) {
                debug!(name, sample = index, "No sustain, removing envelope");
                modes.remove(Modes::ENVELOPE);
            }
        }
    }
}

/// Reverses a waveform in place and returns the mirrored loop points.
pub fn unreverse(pcm: &mut [i16], loop_start: i64, loop_end: i64) -> (i64, i64) {
    pcm.reverse();
    let len = pcm.len() as i64;
    (len - loop_end, len - loop_start)
}

/// Gain that brings the waveform's peak to full scale.
fn peak_normalization(pcm: &[i16]) -> f64 {
    let peak = pcm.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    if peak == 0 {
        1.0
    } else {
        32768.0 / f64::from(peak)
    }
}

/// Resolves a path relative to a base directory unless it is absolute.
pub fn resolve_relative(base: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        base.join(path)
    }
}
