//! Centralizes the tunables §9's open question asks to be "centrally
//! configurable" instead of scattered magic numbers.

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub ppqn: u16,
    pub beats_per_bar: u32,
    pub refinement_threshold: f32,
    pub max_refinement_iterations: u32,
    pub session_history_capacity: usize,
    pub uniqueness_threshold: f32,
    pub min_duration_seconds: f64,
    pub max_duration_seconds: f64,
    pub default_duration_seconds: f64,
    pub unison_guard_beats: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            ppqn: 480,
            beats_per_bar: 4,
            refinement_threshold: crate::quality::REFINEMENT_THRESHOLD,
            max_refinement_iterations: 2,
            session_history_capacity: 100,
            uniqueness_threshold: 0.70,
            min_duration_seconds: crate::duration::MIN_SECONDS,
            max_duration_seconds: crate::duration::MAX_SECONDS,
            default_duration_seconds: crate::duration::DEFAULT_SECONDS,
            unison_guard_beats: 0.1,
        }
    }
}
