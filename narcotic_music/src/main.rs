// Narcotic Melodies — CLI entry point.
//
// Generates one melody for the requested mood and tempo and writes it to a
// MIDI file. The pipeline: draw parameters -> expand pitches -> humanize
// timing -> write SMF.
//
// Usage:
//   cargo run -p narcotic_music -- --name out.mid [--mood sad|energetic|creepy]
//     [--tempo BPM] [--seed N] [--config config.json] [--dump]
//
// Tempos between 90 and 300 BPM sound best.

use anyhow::{Context, Result};
use clap::Parser;
use narcotic_music::config::GeneratorConfig;
use narcotic_music::melody::Melody;
use narcotic_music::midi::write_melody;
use narcotic_music::mood::Mood;
use narcotic_prng::PhraseRng;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(
    version,
    about = "Narcotic melodies generator: simple melodies built from chord progressions"
)]
struct Cli {
    /// Output file name, or a path to save it elsewhere
    #[arg(short, long)]
    name: PathBuf,

    /// Mood for the music: sad, energetic or creepy
    #[arg(short, long, default_value = "sad")]
    mood: Mood,

    /// Tempo in beats per minute (best between 90 and 300)
    #[arg(short, long, default_value_t = 90, value_parser = clap::value_parser!(u32).range(1..))]
    tempo: u32,

    /// Seed for a reproducible melody (default: derived from the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file overriding generator settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the generated melody as JSON
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GeneratorConfig::from_json(&json)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };

    let seed = cli.seed.unwrap_or_else(clock_seed);
    let mut rng = PhraseRng::new(seed);

    println!("=== Narcotic Melodies ===");
    println!("Output: {}", cli.name.display());
    println!("Mood: {}", cli.mood);
    println!("Tempo: {} BPM", cli.tempo);
    println!("Seed: {}", seed);

    let melody = Melody::generate(cli.mood, cli.tempo, &config, &mut rng)?;
    let params = melody.params();
    println!("Key: {} (octave {})", melody.starting_key_name(), params.octave);
    println!("Instrument: program {}", params.instrument);
    println!(
        "Template: {:?} x {} passes, {} notes",
        params.template,
        params.repetitions + 1,
        melody.pitches().len()
    );

    if cli.dump {
        println!("{}", serde_json::to_string_pretty(&melody)?);
    }

    write_melody(&melody, &config, &cli.name)
        .with_context(|| format!("writing {}", cli.name.display()))?;

    let seconds = melody.tail().end().as_f64() * 60.0 / f64::from(cli.tempo);
    println!("Done! Duration: {seconds:.0}s");
    Ok(())
}

/// Seed from wall-clock nanoseconds when the user gives none.
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
