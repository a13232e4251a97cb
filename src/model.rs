//! Shared data model (§3): the record types passed between pipeline stages.
//! The orchestrator owns `CompositionState`; everything else is read-only
//! views or freshly-returned values, never shared mutable state (§3
//! ownership note, §9 "cyclic references" re-architecture note).

use serde::{Deserialize, Serialize};

use crate::error::Severity;
use crate::intent::{Intent, TrackType};
use crate::sections::Section;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
    pub velocity: u8,
}

impl Note {
    pub fn is_valid(&self) -> bool {
        self.duration > 0.0 && self.start_time >= 0.0 && self.velocity > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub track_type: TrackType,
    pub instrument_key: String,
    pub program: u8,
    pub role: String,
    pub priority: u32,
    pub channel: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub track_type: TrackType,
    pub channel: u8,
    pub program: u8,
    pub notes: Vec<Note>,
}

impl Track {
    pub fn sort_notes(&mut self) {
        self.notes
            .sort_by(|a, b| a.start_time.partial_cmp(&b.start_time).unwrap().then(a.pitch.cmp(&b.pitch)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    Density,
    Diversity,
    Velocity,
    Balance,
    IntentMismatch,
    Repetition,
    /// Backs the `fatal_{stage}` issue spec.md §7 requires on the stage
    /// that aborted generation; always carries `track_index: None`.
    Fatal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub track_index: Option<usize>,
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub track_index: usize,
    pub directive: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub melodic: f32,
    pub harmonic: f32,
    pub rhythmic: f32,
    pub structural: f32,
    pub timbral: f32,
    pub emotional: f32,
    pub overall: f32,
    pub issues: Vec<Issue>,
    pub needs_refinement: bool,
    pub suggestions: Vec<Suggestion>,
}

impl QualityReport {
    /// A neutral placeholder used when the reviewer fails internally
    /// (`quality_error`, §7): score defaults to 0.5, pipeline continues.
    pub fn neutral() -> Self {
        QualityReport {
            melodic: 0.5,
            harmonic: 0.5,
            rhythmic: 0.5,
            structural: 0.5,
            timbral: 0.5,
            emotional: 0.5,
            overall: 0.5,
            issues: Vec::new(),
            needs_refinement: false,
            suggestions: Vec::new(),
        }
    }

    /// Built for the fatal-error path of `generate()` (§7): a neutral
    /// score report plus the single high-severity `fatal_{stage}` issue
    /// spec.md mandates accompany a null `midi_path`.
    pub fn fatal(err: &crate::error::CoreError) -> Self {
        let mut report = Self::neutral();
        report.issues.push(Issue {
            track_index: None,
            kind: IssueKind::Fatal,
            severity: Severity::High,
            description: format!("fatal_{}: {err}", err.stage()),
        });
        report
    }
}

/// Five-hash fingerprint used by the Uniqueness Guard (§3, §4.10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionSignature {
    pub melody: Vec<u64>,
    pub harmony: Vec<u64>,
    pub rhythm: Vec<u64>,
    pub structure: Vec<u64>,
    pub overall: u64,
    pub tempo: u32,
    pub genre: crate::intent::Genre,
}

/// Orchestrator working memory for a single generation (§3). Lives only for
/// the duration of one `generate()` call.
#[derive(Debug, Clone)]
pub struct CompositionState {
    pub intent: Intent,
    pub track_plan: Vec<TrackConfig>,
    pub sections: Vec<Section>,
    pub generated_tracks: Vec<Track>,
    pub quality_report: Option<QualityReport>,
    pub refinement_attempts: u32,
    pub max_refinement_iterations: u32,
    pub final_midi_path: Option<std::path::PathBuf>,
    pub error: Option<String>,
}

/// Returned by `generate()` (§10.2). `midi_path` is `None` on the fatal
/// path (§7): no file was written, and `quality_report` carries the
/// `fatal_{stage}` issue explaining why.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub midi_path: Option<std::path::PathBuf>,
    pub quality_report: QualityReport,
    pub session_history: Vec<CompositionSignature>,
}
