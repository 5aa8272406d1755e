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

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ConfigError, SynthConfig};
use crate::format::RenderParams;
use crate::mixer::Mixer;
use crate::patch::{Instrument, LoadOptions, ToneBank};
use crate::voice::{NoteParams, Voice, VoiceStatus};

/// A voice plus the bookkeeping the allocator needs.
struct ActiveVoice {
    voice: Voice,
    note: u8,
    drum: bool,
    /// Start order, used to pick a voice to steal.
    started: u64,
}

impl ActiveVoice {
    fn matches_note(&self, note: u8, drum: bool) -> bool {
        self.note == note && self.drum == drum
    }

    /// Still audible and not already on its way out.
    fn is_sounding(&self) -> bool {
        !matches!(self.voice.status, VoiceStatus::Free | VoiceStatus::Dying)
    }
}

/// Plays notes from a tone bank and a drum set into an accumulation buffer.
pub struct Synth {
    params: RenderParams,
    max_voices: usize,
    tonebank: ToneBank,
    drumset: ToneBank,
    voices: Vec<ActiveVoice>,
    mixer: Mixer,
    sustain: bool,
    next_start: u64,
    /// Frames rendered so far.
    clock: u64,
}

impl Synth {
    pub fn new(params: RenderParams, max_voices: usize, tonebank: ToneBank, drumset: ToneBank) -> Synth {
        let max_voices = max_voices.max(1);
        Synth {
            mixer: Mixer::new(params.clone()),
            params,
            max_voices,
            tonebank,
            drumset,
            voices: Vec::with_capacity(max_voices),
            sustain: false,
            next_start: 0,
            clock: 0,
        }
    }

    /// Builds a synth from its configuration, loading every configured
    /// patch. Patches that fail to load are logged and left silent.
    pub fn from_config(config: &SynthConfig) -> Result<Synth, ConfigError> {
        let render = config.render();
        let params = render.params()?;
        let loader = config.loader(params.clone());

        let mut tonebank = config.tonebank()?;
        let mut drumset = config.drumset()?;

        if let Some(name) = config.default_instrument() {
            match loader.load(name, &LoadOptions::default()) {
                Ok(instrument) => tonebank.set_default_instrument(Arc::new(instrument)),
                Err(e) => warn!(name, err = %e, "Couldn't load default instrument"),
            }
        }

        let failures = tonebank.fill(&loader) + drumset.fill(&loader);
        info!(
            sample_rate = params.output_rate,
            control_ratio = params.control_ratio,
            max_voices = render.max_voices(),
            failures,
            "Synth ready"
        );

        Ok(Synth::new(params, render.max_voices(), tonebank, drumset))
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    pub fn tonebank(&self) -> &ToneBank {
        &self.tonebank
    }

    pub fn drumset(&self) -> &ToneBank {
        &self.drumset
    }

    /// Frames rendered since creation.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Starts `note` on a melodic program. Returns false when the program has
    /// nothing to play.
    pub fn note_on(&mut self, program: u8, note: u8, velocity: u8) -> bool {
        match self.tonebank.instrument(program) {
            Some(instrument) => self.start(instrument, note, velocity, false),
            None => {
                debug!(program, note, "No instrument for program");
                false
            }
        }
    }

    /// Starts a percussion note. Drum voices ignore note-off.
    pub fn drum_on(&mut self, note: u8, velocity: u8) -> bool {
        match self.drumset.instrument(note) {
            Some(instrument) => self.start(instrument, note, velocity, true),
            None => {
                debug!(note, "No drum for note");
                false
            }
        }
    }

    fn start(&mut self, instrument: Arc<Instrument>, note: u8, velocity: u8, drum: bool) -> bool {
        let params = NoteParams::for_note(note, velocity);
        let Some(sample) = instrument.select_sample(params.frequency) else {
            return false;
        };
        let voice = Voice::start(Arc::clone(sample), params, &self.params);

        // Cut retrigger: the previous voice for this note fades out.
        for active in self.voices.iter_mut() {
            if active.matches_note(note, drum) {
                active.voice.kill();
            }
        }

        let sounding = self.voices.iter().filter(|v| v.is_sounding()).count();
        if sounding >= self.max_voices {
            if let Some(oldest) = self
                .voices
                .iter_mut()
                .filter(|v| v.is_sounding())
                .min_by_key(|v| v.started)
            {
                warn!(
                    note = oldest.note,
                    max_voices = self.max_voices,
                    "Global voice limit reached, stealing oldest"
                );
                oldest.voice.kill();
            }
        }

        // Without a render in between, faded voices would pile up.
        if self.voices.len() >= 2 * self.max_voices {
            let before = self.voices.len();
            self.voices.retain(|v| v.is_sounding());
            debug!(dropped = before - self.voices.len(), "Dropping fading voices");
        }

        self.voices.push(ActiveVoice {
            voice,
            note,
            drum,
            started: self.next_start,
        });
        self.next_start += 1;
        true
    }

    /// Releases a melodic note, or marks it sustained while the pedal is down.
    pub fn note_off(&mut self, note: u8) {
        for active in self.voices.iter_mut() {
            if !active.matches_note(note, false) || active.voice.status != VoiceStatus::On {
                continue;
            }
            if self.sustain {
                active.voice.sustain();
            } else {
                active.voice.release();
            }
        }
    }

    /// Sets the sustain pedal. Lifting it releases every sustained voice.
    pub fn set_sustain(&mut self, on: bool) {
        self.sustain = on;
        if on {
            return;
        }
        for active in self.voices.iter_mut() {
            if active.voice.status == VoiceStatus::Sustained {
                active.voice.release();
            }
        }
    }

    /// Cuts every voice. They fade out during the next render.
    pub fn all_notes_off(&mut self) {
        for active in self.voices.iter_mut() {
            active.voice.kill();
        }
    }

    /// Renders `buffer.len() / channels` frames into `buffer`, overwriting
    /// its contents, and drops voices that finished.
    pub fn render(&mut self, buffer: &mut [i32]) {
        buffer.fill(0);
        for active in self.voices.iter_mut() {
            self.mixer.mix_voice(&mut active.voice, buffer);
        }
        self.voices.retain(|active| !active.voice.is_free());
        self.clock += (buffer.len() / self.params.channels()) as u64;
    }

    /// Voices still held by the synth, including ones fading out.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Status of the most recently started voice for a melodic note.
    pub fn note_status(&self, note: u8) -> Option<VoiceStatus> {
        self.voices
            .iter()
            .filter(|v| v.matches_note(note, false))
            .max_by_key(|v| v.started)
            .map(|v| v.voice.status)
    }
}

impl fmt::Debug for Synth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synth")
            .field("params", &self.params)
            .field("max_voices", &self.max_voices)
            .field("active_voices", &self.voices.len())
            .field("sustain", &self.sustain)
            .field("clock", &self.clock)
            .finish()
    }
}
