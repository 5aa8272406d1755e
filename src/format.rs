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
use std::{fmt, str::FromStr};

use crate::tables::MAX_CONTROL_RATIO;

/// Errors raised while validating render parameters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Output sample rate must be greater than 0")]
    ZeroSampleRate,

    #[error("Control rate must be greater than 0")]
    ZeroControlRate,

    #[error("Unsupported interpolation: {0}")]
    UnsupportedInterpolation(String),
}

/// How the resampler reads between waveform samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Linear interpolation between the two bracketing samples.
    #[default]
    Linear,
    /// Nearest (truncated) sample. Cheaper, audibly rougher.
    Nearest,
}

impl FromStr for Interpolation {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, FormatError> {
        match s {
            "linear" | "Linear" => Ok(Interpolation::Linear),
            "nearest" | "Nearest" => Ok(Interpolation::Nearest),
            _ => Err(FormatError::UnsupportedInterpolation(s.to_string())),
        }
    }
}

impl Interpolation {
    pub fn as_str(self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::Nearest => "nearest",
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global parameters every stage of the engine renders against.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Output sample rate in Hz.
    pub output_rate: u32,
    /// Output samples per envelope/LFO tick.
    pub control_ratio: u32,
    /// Single-channel output target.
    pub mono: bool,
    /// Doubles every envelope rate at load time.
    pub fast_decay: bool,
    /// Low-pass oversampled patches at load time.
    pub antialiasing: bool,
    pub interpolation: Interpolation,
    pub master_volume: f64,
}

impl RenderParams {
    /// Creates render parameters for the given output rate and number of
    /// control ticks per second. The derived control ratio is clamped to
    /// `1..=MAX_CONTROL_RATIO`.
    pub fn new(output_rate: u32, controls_per_second: u32) -> Result<Self, FormatError> {
        if output_rate == 0 {
            return Err(FormatError::ZeroSampleRate);
        }
        if controls_per_second == 0 {
            return Err(FormatError::ZeroControlRate);
        }

        Ok(RenderParams {
            output_rate,
            control_ratio: (output_rate / controls_per_second).clamp(1, MAX_CONTROL_RATIO),
            mono: false,
            fast_decay: false,
            antialiasing: false,
            interpolation: Interpolation::Linear,
            master_volume: 1.0,
        })
    }

    /// Interleaved channels in the accumulation buffer.
    pub fn channels(&self) -> usize {
        if self.mono {
            1
        } else {
            2
        }
    }
}

impl Default for RenderParams {
    /// 44.1kHz stereo, 1000 control ticks per second.
    fn default() -> Self {
        RenderParams {
            output_rate: 44100,
            control_ratio: 44,
            mono: false,
            fast_decay: false,
            antialiasing: false,
            interpolation: Interpolation::Linear,
            master_volume: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_from_str() {
        assert_eq!(Interpolation::from_str("linear").unwrap(), Interpolation::Linear);
        assert_eq!(Interpolation::from_str("Nearest").unwrap(), Interpolation::Nearest);
        assert_eq!(
            Interpolation::from_str("cubic"),
            Err(FormatError::UnsupportedInterpolation("cubic".to_string()))
        );
    }

    #[test]
    fn test_interpolation_display() {
        assert_eq!(format!("{}", Interpolation::Linear), "linear");
        assert_eq!(format!("{}", Interpolation::Nearest), "nearest");
    }

    #[test]
    fn test_render_params_new() {
        let params = RenderParams::new(48000, 1000).unwrap();
        assert_eq!(params.output_rate, 48000);
        assert_eq!(params.control_ratio, 48);
        assert_eq!(params.channels(), 2);
    }

    #[test]
    fn test_control_ratio_clamped() {
        assert_eq!(RenderParams::new(44100, 10).unwrap().control_ratio, MAX_CONTROL_RATIO);
        assert_eq!(RenderParams::new(8000, 100_000).unwrap().control_ratio, 1);
    }

    #[test]
    fn test_render_params_invalid() {
        assert_eq!(RenderParams::new(0, 1000), Err(FormatError::ZeroSampleRate));
        assert_eq!(RenderParams::new(44100, 0), Err(FormatError::ZeroControlRate));
    }

    #[test]
    fn test_render_params_default() {
        assert_eq!(RenderParams::default(), RenderParams::new(44100, 1000).unwrap());
    }
}
