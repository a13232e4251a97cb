use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;

use midigen_core::config::PipelineConfig;
use midigen_core::intent::{Emotion, Genre, Intent, StyleDescriptor};
use midigen_core::parser;

#[derive(Debug, Parser)]
#[command(name = "midigen", version, about = "Composition core: intent in, Standard MIDI File out")]
struct Cli {
    /// Output directory (a timestamped filename is generated inside it)
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Path to a pre-materialized Intent JSON file (the core's real contract)
    #[arg(long)]
    intent_json: Option<PathBuf>,

    /// Free text passed through the fallback parser when --intent-json is absent
    #[arg(long)]
    text: Option<String>,

    /// Genre, overrides anything detected from --text
    #[arg(long)]
    genre: Option<String>,

    /// Duration in minutes, overrides anything detected from --text
    #[arg(long)]
    minutes: Option<f64>,

    /// Emotion keyword, overrides anything detected from --text
    #[arg(long)]
    emotion: Option<String>,

    /// Style keyword, overrides anything detected from --text
    #[arg(long)]
    style: Option<String>,

    /// Track count (1-8)
    #[arg(long)]
    tracks: Option<u32>,

    /// Session id used to seed the Variation Engine and scope uniqueness history
    #[arg(long, default_value_t = default_session_id())]
    session_id: String,

    /// Generation counter within this session (bump for successive calls)
    #[arg(long, default_value_t = 0u64)]
    generation: u64,
}

fn default_session_id() -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    let mut hasher = DefaultHasher::new();
    nanos.hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn resolve_intent(cli: &Cli) -> Result<Intent, Box<dyn Error>> {
    if let Some(path) = &cli.intent_json {
        let bytes = std::fs::read(path)?;
        let intent: Intent = serde_json::from_slice(&bytes)?;
        return Ok(intent);
    }

    let mut intent = match &cli.text {
        Some(text) => parser::parse_text_intent(text),
        None => Intent::default_for(Genre::Other),
    };

    if let Some(genre) = &cli.genre {
        intent.genre = Genre::from_str(genre).unwrap();
    }
    if let Some(minutes) = cli.minutes {
        intent.duration = midigen_core::duration::DurationRequest {
            value: minutes,
            unit: midigen_core::duration::DurationUnit::Minutes,
        };
    }
    if let Some(emotion) = &cli.emotion {
        intent.emotions.insert(Emotion::from_str(emotion).unwrap());
    }
    if let Some(style) = &cli.style {
        intent.styles.insert(StyleDescriptor::from_str(style).unwrap());
    }
    if let Some(tracks) = cli.tracks {
        intent.requested_track_count = Some(tracks);
    }

    Ok(intent)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let intent = resolve_intent(&cli)?;
    let config = PipelineConfig::default();

    std::fs::create_dir_all(&cli.out_dir)?;

    let outcome = midigen_core::generate(&intent, &cli.session_id, cli.generation, Vec::new(), &config, &cli.out_dir);

    match &outcome.midi_path {
        Some(path) => eprintln!("Wrote {}", path.display()),
        None => eprintln!("generation failed, no MIDI file written"),
    }
    eprintln!(
        "quality: overall={:.2} melodic={:.2} harmonic={:.2} rhythmic={:.2} structural={:.2} timbral={:.2} emotional={:.2}",
        outcome.quality_report.overall,
        outcome.quality_report.melodic,
        outcome.quality_report.harmonic,
        outcome.quality_report.rhythmic,
        outcome.quality_report.structural,
        outcome.quality_report.timbral,
        outcome.quality_report.emotional,
    );
    for issue in &outcome.quality_report.issues {
        eprintln!("issue[{:?}]: {}", issue.severity, issue.description);
    }

    if outcome.midi_path.is_none() {
        return Err("generation failed".into());
    }
    Ok(())
}
