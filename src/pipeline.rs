// src/pipeline.rs

use crate::error::{check_aligned, Result};
use crate::events::EventDetector;
use crate::kinematics::KinematicsEstimator;
use crate::possession::PossessionEngine;
use crate::tactical::{CourtTemplate, TacticalProjector};
use crate::types::{
    BallTrackFrame, DistanceFrame, KeypointSet, PipelineConfig, PlayerId, PlayerTrackFrame,
    SpeedFrame, TacticalPositionFrame, Team, TeamAssignmentFrame,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Frame-aligned input sequences from the external detector, tracker and
/// appearance classifier. All four must have one entry per frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub player_tracks: Vec<PlayerTrackFrame>,
    pub ball_tracks: Vec<BallTrackFrame>,
    pub team_assignments: Vec<TeamAssignmentFrame>,
    pub court_keypoints: Vec<KeypointSet>,
}

impl AnalysisInput {
    pub fn num_frames(&self) -> usize {
        self.player_tracks.len()
    }

    fn check_frame_alignment(&self) -> Result<()> {
        let frames = self.player_tracks.len();
        check_aligned("player_tracks", frames, "ball_tracks", self.ball_tracks.len())?;
        check_aligned(
            "player_tracks",
            frames,
            "team_assignments",
            self.team_assignments.len(),
        )?;
        check_aligned(
            "player_tracks",
            frames,
            "court_keypoints",
            self.court_keypoints.len(),
        )?;
        Ok(())
    }
}

/// All derived per-frame sequences, each exactly `num_frames` long.
/// Serializable so the host can cache and reload a finished analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub possession: Vec<Option<PlayerId>>,
    pub passes: Vec<Option<Team>>,
    pub interceptions: Vec<Option<Team>>,
    pub tactical_positions: Vec<TacticalPositionFrame>,
    pub distances: Vec<DistanceFrame>,
    pub speeds: Vec<SpeedFrame>,
}

/// Wires the four inference stages together. Possession/events and
/// projection/kinematics are independent branches over the same tracks.
pub struct AnalysisPipeline {
    possession: PossessionEngine,
    events: EventDetector,
    projector: TacticalProjector,
    kinematics: KinematicsEstimator,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let template = CourtTemplate::new(config.court.clone());
        let kinematics = KinematicsEstimator::new(config.kinematics.clone(), &template);

        Ok(Self {
            possession: PossessionEngine::new(config.possession),
            events: EventDetector::new(config.events),
            projector: TacticalProjector::new(template),
            kinematics,
        })
    }

    /// Run the full analysis over one video's detections.
    ///
    /// Holds mutable possession state so a driver feeding consecutive
    /// batches of the same video keeps hysteresis intact across batch
    /// boundaries.
    pub fn run(&mut self, input: &AnalysisInput) -> Result<GameAnalysis> {
        input.check_frame_alignment()?;
        let frames = input.num_frames();
        info!(frames, "starting game analysis");

        let possession = self
            .possession
            .detect(&input.player_tracks, &input.ball_tracks)?;
        let confirmed = possession.iter().filter(|p| p.is_some()).count();
        info!(confirmed_frames = confirmed, "possession resolved");

        let passes = self.events.detect_passes(&possession, &input.team_assignments)?;
        let interceptions = self
            .events
            .detect_interceptions(&possession, &input.team_assignments)?;
        info!(
            passes = passes.iter().filter(|e| e.is_some()).count(),
            interceptions = interceptions.iter().filter(|e| e.is_some()).count(),
            "events detected"
        );

        let tactical_positions = self
            .projector
            .project_sequence(&input.court_keypoints, &input.player_tracks)?;
        let distances = self.kinematics.distances(&tactical_positions);
        let speeds = self.kinematics.speeds(&distances);
        info!("tactical projection and kinematics complete");

        Ok(GameAnalysis {
            possession,
            passes,
            interceptions,
            tactical_positions,
            distances,
            speeds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_empty_input_produces_empty_analysis() {
        let mut pipeline = AnalysisPipeline::new(PipelineConfig::default()).unwrap();
        let analysis = pipeline.run(&AnalysisInput::default()).unwrap();
        assert!(analysis.possession.is_empty());
        assert!(analysis.speeds.is_empty());
    }

    #[test]
    fn test_misaligned_input_names_sequences() {
        let mut pipeline = AnalysisPipeline::new(PipelineConfig::default()).unwrap();
        let input = AnalysisInput {
            player_tracks: vec![PlayerTrackFrame::new(); 4],
            ball_tracks: vec![None; 4],
            team_assignments: vec![TeamAssignmentFrame::new(); 3],
            court_keypoints: vec![Vec::new(); 4],
        };

        match pipeline.run(&input) {
            Err(PipelineError::SequenceLengthMismatch { right, right_len, .. }) => {
                assert_eq!(right, "team_assignments");
                assert_eq!(right_len, 3);
            }
            other => panic!("expected length mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = PipelineConfig::default();
        config.kinematics.fps = -1.0;
        assert!(matches!(
            AnalysisPipeline::new(config),
            Err(PipelineError::Configuration(_))
        ));
    }
}
