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

use tracing::{info, warn};

use super::loader::{LoadOptions, PatchLoader};
use super::sample::Instrument;

/// Programs per bank.
pub const BANK_SIZE: usize = 128;

/// A patch to load into a program slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BankEntry {
    pub name: String,
    pub options: LoadOptions,
}

/// Load state of one program slot.
#[derive(Clone)]
pub enum Slot {
    /// Nothing configured.
    Unloaded,
    /// Configured, waiting for [`ToneBank::fill`].
    Pending(BankEntry),
    Loaded(Arc<Instrument>),
    /// Configured but could not be loaded.
    Failed(String),
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Unloaded => write!(f, "Unloaded"),
            Slot::Pending(entry) => write!(f, "Pending({})", entry.name),
            Slot::Loaded(instrument) => write!(f, "Loaded({} samples)", instrument.samples().len()),
            Slot::Failed(name) => write!(f, "Failed({})", name),
        }
    }
}

/// A 128-program mapping from program numbers to instruments.
#[derive(Clone)]
pub struct ToneBank {
    name: String,
    slots: Vec<Slot>,
    default_instrument: Option<Arc<Instrument>>,
}

impl ToneBank {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slots: vec![Slot::Unloaded; BANK_SIZE],
            default_instrument: None,
        }
    }

    /// Configures a program. It is loaded on the next [`ToneBank::fill`].
    pub fn set(&mut self, program: u8, entry: BankEntry) {
        if let Some(slot) = self.slots.get_mut(usize::from(program)) {
            *slot = Slot::Pending(entry);
        }
    }

    /// Installs an already loaded instrument.
    pub fn insert(&mut self, program: u8, instrument: Arc<Instrument>) {
        if let Some(slot) = self.slots.get_mut(usize::from(program)) {
            *slot = Slot::Loaded(instrument);
        }
    }

    pub fn slot(&self, program: u8) -> &Slot {
        static UNLOADED: Slot = Slot::Unloaded;
        self.slots.get(usize::from(program)).unwrap_or(&UNLOADED)
    }

    /// Instrument played by slots that are unconfigured or failed to load.
    pub fn set_default_instrument(&mut self, instrument: Arc<Instrument>) {
        self.default_instrument = Some(instrument);
    }

    /// Loads every pending slot. A slot that fails is marked failed and
    /// logged; the rest of the bank still loads. Returns the failure count.
    pub fn fill(&mut self, loader: &PatchLoader) -> usize {
        let mut failures = 0;
        for (program, slot) in self.slots.iter_mut().enumerate() {
            let Slot::Pending(entry) = slot else {
                continue;
            };

            *slot = match loader.load(&entry.name, &entry.options) {
                Ok(instrument) => Slot::Loaded(Arc::new(instrument)),
                Err(e) => {
                    warn!(
                        bank = %self.name,
                        program,
                        name = %entry.name,
                        err = %e,
                        "Couldn't load instrument, falling back to default"
                    );
                    failures += 1;
                    Slot::Failed(entry.name.clone())
                }
            };
        }

        info!(
            bank = %self.name,
            loaded = self.loaded_count(),
            failures,
            "Tone bank filled"
        );
        failures
    }

    /// The instrument for a program, or the default when it has none.
    pub fn instrument(&self, program: u8) -> Option<Arc<Instrument>> {
        match self.slot(program) {
            Slot::Loaded(instrument) => Some(Arc::clone(instrument)),
            _ => self.default_instrument.clone(),
        }
    }

    pub fn loaded_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Loaded(_)))
            .count()
    }
}

impl fmt::Debug for ToneBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToneBank")
            .field("name", &self.name)
            .field("loaded", &self.loaded_count())
            .field("has_default", &self.default_instrument.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::RenderParams;
    use crate::patch::Sample;
    use crate::testutil::{PatchBuilder, SampleSpec};

    fn entry(name: &str) -> BankEntry {
        BankEntry {
            name: name.to_string(),
            options: LoadOptions::default(),
        }
    }

    #[test]
    fn test_fill() {
        let dir = tempfile::tempdir().unwrap();
        PatchBuilder::new()
            .sample(SampleSpec {
                data: SampleSpec::pcm16(&[0, 1, 2, 3]),
                ..SampleSpec::default()
            })
            .write(dir.path(), "piano.pat");

        let loader = PatchLoader::new(RenderParams::default())
            .with_search_paths(vec![dir.path().to_path_buf()]);
        let mut bank = ToneBank::new("tone");
        bank.set(0, entry("piano"));
        bank.set(1, entry("missing"));
        assert!(matches!(bank.slot(0), Slot::Pending(_)));

        let failures = bank.fill(&loader);
        assert_eq!(failures, 1);
        assert_eq!(bank.loaded_count(), 1);
        assert!(matches!(bank.slot(0), Slot::Loaded(_)));
        assert!(matches!(bank.slot(1), Slot::Failed(ref name) if name == "missing"));
        assert!(matches!(bank.slot(2), Slot::Unloaded));

        assert!(bank.instrument(0).is_some());
        assert!(bank.instrument(1).is_none());

        // Filling again leaves loaded and failed slots alone.
        assert_eq!(bank.fill(&loader), 0);
    }

    #[test]
    fn test_default_instrument() {
        let mut bank = ToneBank::new("tone");
        let fallback = Arc::new(Instrument::new(vec![Sample::from_pcm(vec![0; 4], 44100, 261_626)]));
        bank.set_default_instrument(Arc::clone(&fallback));

        let instrument = bank.instrument(5).unwrap();
        assert!(Arc::ptr_eq(&instrument, &fallback));
    }

    #[test]
    fn test_out_of_range_program() {
        let mut bank = ToneBank::new("tone");
        bank.set(200, entry("piano"));
        assert!(matches!(bank.slot(200), Slot::Unloaded));
    }
}
