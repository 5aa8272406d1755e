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

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use crate::format::RenderParams;
use crate::patch::{resolve_relative, BankEntry, PatchLoader, ToneBank, BANK_SIZE};

mod error;
mod render;
mod tonebank;

pub use error::ConfigError;
pub use render::RenderConfig;
pub use tonebank::ToneBankElement;

const DEFAULT_EXTENSION: &str = ".pat";

/// A YAML representation of a synthesizer: render settings, where to find
/// patches, and which patch plays each program.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct SynthConfig {
    /// Render settings.
    render: Option<RenderConfig>,

    /// Directories searched for patch files. Relative entries are relative
    /// to the config file.
    search_paths: Option<Vec<String>>,

    /// Extensions tried after the bare patch name (default: [".pat"])
    extensions: Option<Vec<String>>,

    /// Melodic programs, keyed by program number.
    tonebank: Option<HashMap<String, ToneBankElement>>,

    /// Percussion, keyed by note number.
    drumset: Option<HashMap<String, ToneBankElement>>,

    /// Patch played by programs that have none or failed to load.
    default_instrument: Option<String>,

    /// Directory holding the config file, if it was read from disk.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl SynthConfig {
    /// Deserializes a file from the path into a synth configuration struct.
    pub fn deserialize(path: &Path) -> Result<SynthConfig, ConfigError> {
        let mut config = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<SynthConfig>()?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn render(&self) -> RenderConfig {
        self.render.clone().unwrap_or_default()
    }

    /// Search paths, resolved against the config file's directory.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .flatten()
            .map(|path| match &self.base_dir {
                Some(base) => resolve_relative(base, path),
                None => PathBuf::from(path),
            })
            .collect()
    }

    pub fn extensions(&self) -> Vec<String> {
        self.extensions
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_EXTENSION.to_string()])
    }

    pub fn default_instrument(&self) -> Option<&str> {
        self.default_instrument.as_deref()
    }

    /// A patch loader for these render settings and search paths.
    pub fn loader(&self, params: RenderParams) -> PatchLoader {
        PatchLoader::new(params)
            .with_search_paths(self.search_paths())
            .with_extensions(self.extensions())
    }

    /// The melodic bank with every configured program pending.
    pub fn tonebank(&self) -> Result<ToneBank, ConfigError> {
        build_bank("tonebank", self.tonebank.as_ref(), false)
    }

    /// The percussion bank with every configured note pending.
    pub fn drumset(&self) -> Result<ToneBank, ConfigError> {
        build_bank("drumset", self.drumset.as_ref(), true)
    }
}

fn build_bank(
    name: &'static str,
    elements: Option<&HashMap<String, ToneBankElement>>,
    drum: bool,
) -> Result<ToneBank, ConfigError> {
    let mut bank = ToneBank::new(name);
    for (key, element) in elements.into_iter().flatten() {
        let program = key
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|program| usize::from(*program) < BANK_SIZE)
            .ok_or_else(|| ConfigError::InvalidProgram {
                bank: name,
                program: key.clone(),
            })?;

        bank.set(
            program,
            BankEntry {
                name: element.name().to_string(),
                options: element.load_options(program, drum),
            },
        );
    }
    Ok(bank)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use config::FileFormat;

    use super::*;
    use crate::patch::{Slot, StripEnvelope};
    use crate::testutil::{PatchBuilder, SampleSpec};

    fn parse(yaml: &str) -> SynthConfig {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_synth_config_deserialize() {
        let config = parse(
            r#"
            render:
              sample_rate: 22050
              mono: true
            search_paths:
              - /usr/share/patches
            extensions:
              - .pat
              - .PAT
            tonebank:
              0:
                name: acpiano
              1:
                name: brpiano
                amp: 120
            drumset:
              36:
                name: kick1
            default_instrument: acpiano
        "#,
        );

        assert_eq!(config.render().sample_rate(), 22050);
        assert!(config.render().mono());
        assert_eq!(config.search_paths(), vec![PathBuf::from("/usr/share/patches")]);
        assert_eq!(config.extensions(), vec![".pat", ".PAT"]);
        assert_eq!(config.default_instrument(), Some("acpiano"));

        let tonebank = config.tonebank().unwrap();
        match tonebank.slot(1) {
            Slot::Pending(entry) => {
                assert_eq!(entry.name, "brpiano");
                assert_eq!(entry.options.amp, Some(120));
                assert_eq!(entry.options.strip_envelope, StripEnvelope::Guess);
            }
            other => panic!("unexpected slot {:?}", other),
        }
        assert!(matches!(tonebank.slot(2), Slot::Unloaded));

        let drumset = config.drumset().unwrap();
        match drumset.slot(36) {
            Slot::Pending(entry) => {
                assert_eq!(entry.name, "kick1");
                assert_eq!(entry.options.note, Some(36));
                assert!(entry.options.strip_loop);
            }
            other => panic!("unexpected slot {:?}", other),
        }
    }

    #[test]
    fn test_empty_config() {
        let config = parse("{}");
        assert_eq!(config.render().max_voices(), 32);
        assert!(config.search_paths().is_empty());
        assert_eq!(config.extensions(), vec![".pat"]);
        assert_eq!(config.tonebank().unwrap().loaded_count(), 0);
        assert_eq!(config.default_instrument(), None);
    }

    #[test]
    fn test_invalid_program() {
        let config = parse(
            r#"
            tonebank:
              128:
                name: toohigh
        "#,
        );
        assert!(matches!(
            config.tonebank(),
            Err(ConfigError::InvalidProgram { bank: "tonebank", .. })
        ));

        let config = parse(
            r#"
            drumset:
              snare:
                name: snare
        "#,
        );
        assert!(matches!(
            config.drumset(),
            Err(ConfigError::InvalidProgram { bank: "drumset", .. })
        ));
    }

    #[test]
    fn test_deserialize_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let patches = dir.path().join("patches");
        fs::create_dir(&patches).unwrap();
        PatchBuilder::new()
            .sample(SampleSpec {
                data: SampleSpec::pcm16(&[0, 100, 200, 300]),
                ..SampleSpec::default()
            })
            .write(&patches, "organ.pat");

        let path = dir.path().join("synth.yaml");
        fs::write(
            &path,
            "search_paths:\n  - patches\ntonebank:\n  19:\n    name: organ\n",
        )
        .unwrap();

        let config = SynthConfig::deserialize(&path).unwrap();
        assert_eq!(config.search_paths(), vec![patches]);

        let params = config.render().params().unwrap();
        let mut bank = config.tonebank().unwrap();
        assert_eq!(bank.fill(&config.loader(params)), 0);
        assert!(matches!(bank.slot(19), Slot::Loaded(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SynthConfig::deserialize(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
