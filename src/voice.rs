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

//! Per-note render state.
//!
//! A [`Voice`] shares its [`Sample`] read-only and carries everything the
//! envelope, resampler and mixer advance while the note sounds.

mod envelope;

use std::fmt;
use std::sync::Arc;

use crate::fixed::Fixed;
use crate::format::RenderParams;
use crate::patch::Sample;
use crate::tables::{note_frequency, VIBRATO_SAMPLE_INCREMENTS};

/// Lifecycle of a voice slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStatus {
    /// Not sounding; the slot can be reused.
    Free,
    /// Key held.
    On,
    /// Key released but held by the sustain pedal.
    Sustained,
    /// Key released; the envelope is running out.
    Off,
    /// Killed; the mixer ramps it to silence on its next call.
    Dying,
}

/// Stereo placement, each with its own mixing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panning {
    /// Independent left and right gains.
    Mystery,
    Center,
    Left,
    Right,
}

impl Panning {
    /// Classifies a 0..=127 pan position. Mono output is always centered.
    pub fn from_position(panning: u8, mono: bool) -> Panning {
        if mono {
            return Panning::Center;
        }
        match panning {
            61..=67 => Panning::Center,
            0..=4 => Panning::Left,
            124..=u8::MAX => Panning::Right,
            _ => Panning::Mystery,
        }
    }
}

/// The facts a note allocator supplies when starting a voice.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteParams {
    /// Frequency in milli-Hz.
    pub frequency: i32,
    pub velocity: u8,
    /// Overrides the sample's own panning.
    pub panning: Option<u8>,
    /// Extra linear gain, e.g. channel volume.
    pub gain: f64,
}

impl NoteParams {
    pub fn new(frequency: i32, velocity: u8) -> Self {
        NoteParams {
            frequency,
            velocity: velocity.min(127),
            panning: None,
            gain: 1.0,
        }
    }

    /// Parameters for a MIDI note number.
    pub fn for_note(note: u8, velocity: u8) -> Self {
        Self::new(note_frequency(note), velocity)
    }

    pub fn with_panning(mut self, panning: u8) -> Self {
        self.panning = Some(panning & 0x7f);
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }
}

/// Render state for one sounding note.
#[derive(Clone)]
pub struct Voice {
    pub status: VoiceStatus,
    pub sample: Arc<Sample>,
    /// Playback frequency in milli-Hz.
    pub frequency: i32,
    pub velocity: u8,
    pub gain: f64,

    pub sample_offset: Fixed,
    /// Signed step per output sample. Negative while a ping-pong loop
    /// plays backward.
    pub sample_increment: Fixed,

    pub envelope_volume: i32,
    pub envelope_target: i32,
    pub envelope_increment: i32,
    pub envelope_stage: usize,
    /// Output samples left until the next control tick.
    pub control_counter: u32,

    pub tremolo_phase: i32,
    pub tremolo_phase_increment: i32,
    pub tremolo_sweep: i32,
    pub tremolo_sweep_position: i32,
    pub tremolo_volume: f64,

    pub vibrato_phase: i32,
    pub vibrato_control_ratio: i32,
    pub vibrato_control_counter: i32,
    pub vibrato_sweep: i32,
    pub vibrato_sweep_position: i32,
    /// Increments already computed for each vibrato phase magnitude.
    pub vibrato_sample_increment: [Option<Fixed>; VIBRATO_SAMPLE_INCREMENTS],

    pub panning: u8,
    pub panned: Panning,
    pub left_amp: f64,
    pub right_amp: f64,
    pub left_mix: i32,
    pub right_mix: i32,

    /// Samples of the kill ramp already played.
    pub die_elapsed: usize,
}

impl Voice {
    /// Starts a note on `sample`. The envelope ramps up from silence.
    pub fn start(sample: Arc<Sample>, note: NoteParams, params: &RenderParams) -> Voice {
        let frequency = sample
            .note_to_use
            .map(note_frequency)
            .unwrap_or(note.frequency);
        let panning = note.panning.unwrap_or(sample.panning);

        let mut voice = Voice {
            status: VoiceStatus::On,
            frequency,
            velocity: note.velocity,
            gain: note.gain,
            sample_offset: Fixed::ZERO,
            sample_increment: Fixed::ZERO,
            envelope_volume: 0,
            envelope_target: 0,
            envelope_increment: 0,
            envelope_stage: 0,
            control_counter: 0,
            tremolo_phase: 0,
            tremolo_phase_increment: sample.tremolo_phase_increment,
            tremolo_sweep: sample.tremolo_sweep_increment,
            tremolo_sweep_position: 0,
            tremolo_volume: 1.0,
            vibrato_phase: 0,
            vibrato_control_ratio: sample.vibrato_control_ratio,
            vibrato_control_counter: 0,
            vibrato_sweep: sample.vibrato_sweep_increment,
            vibrato_sweep_position: 0,
            vibrato_sample_increment: [None; VIBRATO_SAMPLE_INCREMENTS],
            panning,
            panned: Panning::Center,
            left_amp: 0.0,
            right_amp: 0.0,
            left_mix: 0,
            right_mix: 0,
            die_elapsed: 0,
            sample,
        };

        voice.recompute_increment(params);
        voice.recompute_amp(params);
        if voice.sample.has_envelope() {
            voice.recompute_envelope();
        }
        voice.apply_envelope_to_amp();
        voice
    }

    /// Note-off. Envelope voices skip ahead to the release stages; others
    /// drop out of their loop and play to the end of data.
    pub fn release(&mut self) {
        if !matches!(self.status, VoiceStatus::On | VoiceStatus::Sustained) {
            return;
        }

        self.status = VoiceStatus::Off;
        if self.sample.has_envelope() {
            self.envelope_stage = 3;
            self.recompute_envelope();
            self.apply_envelope_to_amp();
        }
    }

    /// Holds a released key while the sustain pedal is down.
    pub fn sustain(&mut self) {
        if self.status == VoiceStatus::On {
            self.status = VoiceStatus::Sustained;
        }
    }

    /// Cuts the note. The mixer fades it out over a few samples; killing a
    /// voice that is already fading leaves its ramp where it is.
    pub fn kill(&mut self) {
        if !matches!(self.status, VoiceStatus::Free | VoiceStatus::Dying) {
            self.status = VoiceStatus::Dying;
            self.die_elapsed = 0;
        }
    }

    pub fn is_free(&self) -> bool {
        self.status == VoiceStatus::Free
    }

    /// Recomputes the playback step from the current frequency, keeping the
    /// current direction and discarding any cached vibrato increments.
    pub fn recompute_increment(&mut self, params: &RenderParams) {
        let negative = self.sample_increment.is_negative();
        self.vibrato_sample_increment = [None; VIBRATO_SAMPLE_INCREMENTS];

        let increment = match self.sample.sample_rate {
            // Already at output rate and pitch.
            None => Fixed::ONE,
            Some(_) => Fixed::from_f64(self.pitch_ratio(params)),
        };
        self.sample_increment = if negative { -increment } else { increment };
    }

    /// Source samples per output sample at the current frequency.
    pub fn pitch_ratio(&self, params: &RenderParams) -> f64 {
        let sample_rate = self.sample.sample_rate.unwrap_or(params.output_rate);
        let root = self.sample.root_freq.max(1);
        (f64::from(sample_rate) * f64::from(self.frequency))
            / (f64::from(root) * f64::from(params.output_rate))
    }

    /// Recomputes the static pan-derived gains.
    pub fn recompute_amp(&mut self, params: &RenderParams) {
        let base = f64::from(self.velocity) / 127.0
            * self.gain
            * self.sample.volume
            * params.master_volume;

        self.panned = Panning::from_position(self.panning, params.mono);
        match self.panned {
            Panning::Center => {
                self.left_amp = base;
                self.right_amp = base;
            }
            Panning::Left | Panning::Right => {
                self.left_amp = base * 2.0;
                self.right_amp = self.left_amp;
            }
            Panning::Mystery => {
                self.left_amp = base * f64::from(127 - self.panning) / 64.0;
                self.right_amp = base * f64::from(self.panning) / 64.0;
            }
        }
    }
}

impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("status", &self.status)
            .field("frequency", &self.frequency)
            .field("sample_offset", &self.sample_offset)
            .field("sample_increment", &self.sample_increment)
            .field("envelope_stage", &self.envelope_stage)
            .field("panned", &self.panned)
            .finish()
    }
}
