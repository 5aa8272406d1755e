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

use std::str::FromStr;

use serde::Deserialize;

use super::error::ConfigError;
use crate::format::{Interpolation, RenderParams};

const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CONTROLS_PER_SECOND: u32 = 1000;
const DEFAULT_MASTER_VOLUME: f64 = 1.0;
const DEFAULT_MAX_VOICES: usize = 32;

/// A YAML representation of the render settings.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct RenderConfig {
    /// Output sample rate in Hz (default: 44100)
    sample_rate: Option<u32>,

    /// Envelope and LFO updates per second (default: 1000)
    controls_per_second: Option<u32>,

    /// Render a single channel instead of interleaved stereo.
    mono: Option<bool>,

    /// Use the faster release envelope.
    fast_decay: Option<bool>,

    /// Low-pass samples recorded above the output rate at load time.
    antialiasing: Option<bool>,

    /// "linear" or "nearest" (default: "linear")
    interpolation: Option<String>,

    /// Scales every voice (default: 1.0)
    master_volume: Option<f64>,

    /// Simultaneous voices before the oldest is stolen (default: 32)
    max_voices: Option<usize>,
}

impl RenderConfig {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn controls_per_second(&self) -> u32 {
        self.controls_per_second
            .unwrap_or(DEFAULT_CONTROLS_PER_SECOND)
    }

    pub fn mono(&self) -> bool {
        self.mono.unwrap_or(false)
    }

    pub fn fast_decay(&self) -> bool {
        self.fast_decay.unwrap_or(false)
    }

    pub fn antialiasing(&self) -> bool {
        self.antialiasing.unwrap_or(false)
    }

    pub fn interpolation(&self) -> Result<Interpolation, ConfigError> {
        match &self.interpolation {
            Some(interpolation) => Ok(Interpolation::from_str(interpolation)?),
            None => Ok(Interpolation::default()),
        }
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume.unwrap_or(DEFAULT_MASTER_VOLUME)
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices.unwrap_or(DEFAULT_MAX_VOICES).max(1)
    }

    /// Validates the settings and builds the render parameters.
    pub fn params(&self) -> Result<RenderParams, ConfigError> {
        let mut params = RenderParams::new(self.sample_rate(), self.controls_per_second())?;
        params.mono = self.mono();
        params.fast_decay = self.fast_decay();
        params.antialiasing = self.antialiasing();
        params.interpolation = self.interpolation()?;
        params.master_volume = self.master_volume();
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;
    use crate::format::FormatError;

    fn parse(yaml: &str) -> RenderConfig {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let render = RenderConfig::default();
        let params = render.params().unwrap();
        assert_eq!(params.output_rate, 44100);
        assert_eq!(params.control_ratio, 44);
        assert!(!params.mono);
        assert_eq!(params.interpolation, Interpolation::Linear);
        assert_eq!(params.master_volume, 1.0);
        assert_eq!(render.max_voices(), 32);
    }

    #[test]
    fn test_render_config_deserialize() {
        let render = parse(
            r#"
            sample_rate: 22050
            controls_per_second: 100
            mono: true
            fast_decay: true
            interpolation: nearest
            master_volume: 0.5
            max_voices: 8
        "#,
        );

        let params = render.params().unwrap();
        assert_eq!(params.output_rate, 22050);
        assert_eq!(params.control_ratio, 220);
        assert!(params.mono);
        assert!(params.fast_decay);
        assert!(!params.antialiasing);
        assert_eq!(params.interpolation, Interpolation::Nearest);
        assert_eq!(params.master_volume, 0.5);
        assert_eq!(render.max_voices(), 8);
    }

    #[test]
    fn test_control_ratio_clamped() {
        let render = parse("sample_rate: 96000\ncontrols_per_second: 10\n");
        assert_eq!(render.params().unwrap().control_ratio, 255);
    }

    #[test]
    fn test_invalid_settings() {
        let render = parse("interpolation: cubic\n");
        assert!(matches!(
            render.params(),
            Err(ConfigError::Render(FormatError::UnsupportedInterpolation(_)))
        ));

        let render = parse("sample_rate: 0\n");
        assert!(matches!(
            render.params(),
            Err(ConfigError::Render(FormatError::ZeroSampleRate))
        ));
    }
}
