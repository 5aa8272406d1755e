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
use std::path::PathBuf;

/// Error types for patch loading. Every variant is fatal to one patch only.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Instrument {name} not found (tried {} paths)", tried.len())]
    NotFound { name: String, tried: Vec<PathBuf> },

    #[error("{name}: not an instrument")]
    NotAnInstrument { name: String },

    #[error("{name}: can't handle patches with {count} instruments")]
    UnsupportedInstruments { name: String, count: u8 },

    #[error("{name}: can't handle instruments with {count} layers")]
    UnsupportedLayers { name: String, count: u8 },

    #[error("{name}: patch contains no samples")]
    Empty { name: String },

    #[error("{name}: error reading sample {sample}: {source}")]
    Truncated {
        name: String,
        sample: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: sample {sample} claims {bytes} bytes, this must be a bug")]
    TooLarge {
        name: String,
        sample: usize,
        bytes: u32,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
