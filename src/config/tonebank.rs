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

use serde::Deserialize;

use crate::patch::{LoadOptions, StripEnvelope};

/// A YAML representation of one tone bank or drum set slot.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ToneBankElement {
    /// Patch name, resolved through the search paths and extensions.
    name: String,

    /// Panning override, 0 (left) to 127 (right).
    panning: Option<u8>,

    /// Plays every sample at this note. Drum slots default to their program.
    note: Option<u8>,

    /// Volume percentage. Unset normalizes each sample's peak.
    amp: Option<u32>,

    /// Remove loops. Drum slots default to true.
    strip_loop: Option<bool>,

    /// Remove envelopes. Unset guesses, except on drum slots where it strips.
    strip_envelope: Option<bool>,

    /// Stop playback at the loop end.
    strip_tail: Option<bool>,
}

impl ToneBankElement {
    pub fn new(name: &str) -> ToneBankElement {
        ToneBankElement {
            name: name.to_string(),
            panning: None,
            note: None,
            amp: None,
            strip_loop: None,
            strip_envelope: None,
            strip_tail: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loader overrides for this slot. Drum slots play at their own program
    /// number and drop loops and envelopes unless told otherwise.
    pub fn load_options(&self, program: u8, drum: bool) -> LoadOptions {
        let strip_envelope = match self.strip_envelope {
            Some(true) => StripEnvelope::Always,
            Some(false) => StripEnvelope::Never,
            None if drum => StripEnvelope::Always,
            None => StripEnvelope::Guess,
        };

        LoadOptions {
            panning: self.panning.map(|p| p.min(127)),
            note: self.note.or(drum.then_some(program)),
            amp: self.amp,
            strip_loop: self.strip_loop.unwrap_or(drum),
            strip_envelope,
            strip_tail: self.strip_tail.unwrap_or(false),
        }
    }
}
