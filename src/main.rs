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

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{crate_version, Parser, Subcommand};
use hound::{SampleFormat, WavSpec, WavWriter};
use patchsynth::config::SynthConfig;
use patchsynth::format::RenderParams;
use patchsynth::patch::{LoadOptions, PatchLoader, StripEnvelope};
use patchsynth::synth::Synth;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Frames rendered per block.
const BLOCK_FRAMES: usize = 1024;

/// Accumulated samples carry this many bits of gain above 16-bit PCM.
const OUTPUT_SHIFT: u32 = 13;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A wavetable synthesizer for GF1 patches."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the samples contained in a patch file.
    Info {
        /// The path to the patch.
        path: String,
    },
    /// Renders a single note to a WAV file.
    Render {
        /// The path to the synth config.
        config_path: String,
        /// The program to play, or the drum note with --drum.
        program: u8,
        /// The MIDI note to play.
        note: u8,
        /// The WAV file to write.
        output_path: String,
        /// Total length of the output.
        #[arg[short, long, default_value_t = 2.0]]
        seconds: f64,
        /// Note-on velocity.
        #[arg[short, long, default_value_t = 127]]
        velocity: u8,
        /// When to release the note, in seconds. Defaults to halfway.
        #[arg[short, long]]
        release: Option<f64>,
        /// Play from the drum set instead of the tone bank.
        #[arg[short, long]]
        drum: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { path } => print_info(Path::new(&path))?,
        Commands::Render {
            config_path,
            program,
            note,
            output_path,
            seconds,
            velocity,
            release,
            drum,
        } => {
            let config = SynthConfig::deserialize(&PathBuf::from(&config_path))?;
            let mut synth = Synth::from_config(&config)?;

            let started = if drum {
                synth.drum_on(note, velocity)
            } else {
                synth.note_on(program, note, velocity)
            };
            if !started {
                return Err(format!("nothing to play for program {} note {}", program, note).into());
            }

            let params = synth.params().clone();
            let total_frames = (seconds.max(0.0) * f64::from(params.output_rate)) as u64;
            let release_frame =
                (release.unwrap_or(seconds / 2.0).max(0.0) * f64::from(params.output_rate)) as u64;

            let mut writer = WavWriter::create(&output_path, wav_spec(&params))?;
            let mut buffer = vec![0; BLOCK_FRAMES * params.channels()];
            let mut released = false;

            while synth.clock() < total_frames {
                if !released && synth.clock() >= release_frame {
                    synth.note_off(note);
                    released = true;
                }

                let frames = (total_frames - synth.clock()).min(BLOCK_FRAMES as u64) as usize;
                let block = &mut buffer[..frames * params.channels()];
                synth.render(block);
                for &sample in block.iter() {
                    writer.write_sample(to_pcm16(sample))?;
                }
            }
            writer.finalize()?;

            info!(path = %output_path, frames = total_frames, "Rendered note");
        }
    }

    Ok(())
}

/// Loads a patch with its envelopes intact and prints each sample.
fn print_info(path: &Path) -> Result<(), Box<dyn Error>> {
    let loader = PatchLoader::new(RenderParams::default());
    let options = LoadOptions {
        strip_envelope: StripEnvelope::Never,
        ..LoadOptions::default()
    };
    let instrument = loader.load(&path.to_string_lossy(), &options)?;

    println!("{} (samples: {})", path.display(), instrument.samples().len());
    for (i, sample) in instrument.samples().iter().enumerate() {
        println!("- sample {}:", i);
        match sample.sample_rate {
            Some(rate) => println!("    rate: {} Hz", rate),
            None => println!("    rate: output rate"),
        }
        println!(
            "    frequencies: low {} high {} root {} (mHz)",
            sample.low_freq, sample.high_freq, sample.root_freq
        );
        println!("    length: {}", sample.data_length);
        println!("    loop: {} - {}", sample.loop_start, sample.loop_end);
        println!("    modes: {}", sample.modes);
        println!("    panning: {}", sample.panning);
        println!("    volume: {:.3}", sample.volume);
        if sample.has_envelope() {
            println!("    envelope rates: {:?}", sample.envelope_rate);
            println!("    envelope offsets: {:?}", sample.envelope_offset);
        }
        if sample.tremolo_depth != 0 {
            println!("    tremolo depth: {}", sample.tremolo_depth);
        }
        if sample.vibrato_depth != 0 {
            println!("    vibrato depth: {}", sample.vibrato_depth);
        }
    }

    Ok(())
}

fn wav_spec(params: &RenderParams) -> WavSpec {
    WavSpec {
        channels: params.channels() as u16,
        sample_rate: params.output_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Scales an accumulated sample down to 16 bits, clipping at full scale.
fn to_pcm16(sample: i32) -> i16 {
    (sample >> OUTPUT_SHIFT).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}
