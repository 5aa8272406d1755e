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

//! GF1 instrument patches.
//!
//! This module provides:
//! - Parsing of the on-disk patch layout
//! - Conversion of raw envelope and LFO bytes for the render parameters
//! - Load-time fixups (loop and envelope stripping, reverse loops, volume)
//! - Tone banks mapping programs to loaded instruments

mod bank;
mod convert;
mod error;
mod filter;
pub(crate) mod format;
mod loader;
mod sample;

pub use bank::{BankEntry, Slot, ToneBank, BANK_SIZE};
pub use error::LoadError;
pub use filter::{AntiAliasFilter, KaiserLowPass};
pub use loader::{
    resolve_relative, LoadOptions, PatchLoader, StripEnvelope, DEFAULT_EXTENSIONS,
    MAX_SAMPLE_BYTES,
};
pub use sample::{Instrument, Modes, Sample};
