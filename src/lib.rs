//! `midigen_core`: turns a structured musical `Intent` into a Standard
//! MIDI File. See each module's doc comment for its pipeline stage.

pub mod config;
pub mod duration;
pub mod error;
pub mod generators;
pub mod humanize;
pub mod intent;
pub mod knowledge;
pub mod midi;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod quality;
pub mod sections;
pub mod theory;
pub mod track_plan;
pub mod uniqueness;
pub mod variation;

pub use error::CoreError;
pub use intent::Intent;
pub use model::{CompositionSignature, GenerationOutcome, QualityReport};
pub use orchestrator::generate;
