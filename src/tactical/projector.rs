// src/tactical/projector.rs

use crate::error::{check_aligned, PipelineError, Result};
use crate::tactical::court::CourtTemplate;
use crate::tactical::homography::Homography;
use crate::types::{KeypointSet, PlayerTrackFrame, Point, TacticalPositionFrame};
use tracing::debug;

/// At least this many surviving keypoints are needed before a per-frame
/// homography is attempted.
const MIN_HOMOGRAPHY_POINTS: usize = 4;

/// Relative error margin for the keypoint ratio cross-check.
const RATIO_ERROR_MARGIN: f32 = 0.8;

/// Projects player foot positions into the canonical top-down court view,
/// after geometric validation of the detected court keypoints.
pub struct TacticalProjector {
    template: CourtTemplate,
}

impl TacticalProjector {
    pub fn new(template: CourtTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &CourtTemplate {
        &self.template
    }

    /// Cross-check detected keypoints against the canonical court geometry.
    ///
    /// For each detected keypoint i, the ratio of its distances to two other
    /// detected keypoints is compared with the same ratio in the template; a
    /// relative error above the margin zeroes the keypoint out. The two
    /// reference points are the first two other detected indices in
    /// ascending order, skipping already-invalidated ones. That pair choice
    /// is order-dependent and may miss bad keypoints depending on which
    /// indices detected first; changing it would change which points
    /// survive, so it stays fixed.
    ///
    /// Fewer than 3 detections: returned unchanged, nothing to cross-check.
    pub fn validate_keypoints(&self, keypoints: &KeypointSet) -> Result<KeypointSet> {
        self.check_template_alignment(keypoints)?;

        let mut validated = keypoints.clone();
        let detected: Vec<usize> = (0..keypoints.len())
            .filter(|&i| keypoints[i].is_some())
            .collect();
        if detected.len() < 3 {
            return Ok(validated);
        }

        let template = self.template.points();
        let mut invalid: Vec<usize> = Vec::new();

        for &i in &detected {
            let mut others = detected
                .iter()
                .filter(|&&idx| idx != i && !invalid.contains(&idx));
            let (j, k) = match (others.next(), others.next()) {
                (Some(&j), Some(&k)) => (j, k),
                _ => continue,
            };

            // Distances are measured on the raw detections; invalidation
            // only narrows the pair choice for later indices.
            let (point_i, point_j, point_k) = match (keypoints[i], keypoints[j], keypoints[k]) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => continue,
            };

            let t_ij = template[i].distance(&template[j]);
            let t_ik = template[i].distance(&template[k]);
            if t_ij <= 0.0 || t_ik <= 0.0 {
                continue;
            }

            let d_ij = point_i.distance(&point_j);
            let d_ik = point_i.distance(&point_k);
            let detected_ratio = if d_ik > 0.0 { d_ij / d_ik } else { f32::INFINITY };
            let template_ratio = t_ij / t_ik;

            let error = ((detected_ratio - template_ratio) / template_ratio).abs();
            if error > RATIO_ERROR_MARGIN {
                debug!(
                    keypoint = i,
                    error, "keypoint failed geometric cross-check, dropping"
                );
                validated[i] = None;
                invalid.push(i);
            }
        }

        Ok(validated)
    }

    /// Project every visible player's foot position onto the tactical canvas
    /// for one frame. Frames without a usable homography yield an empty map.
    pub fn project_players(
        &self,
        keypoints: &KeypointSet,
        players: &PlayerTrackFrame,
    ) -> Result<TacticalPositionFrame> {
        let validated = self.validate_keypoints(keypoints)?;
        let mut positions = TacticalPositionFrame::new();

        let template = self.template.points();
        let mut source: Vec<Point> = Vec::new();
        let mut target: Vec<Point> = Vec::new();
        for (i, keypoint) in validated.iter().enumerate() {
            if let Some(point) = keypoint {
                source.push(*point);
                target.push(template[i]);
            }
        }
        if source.len() < MIN_HOMOGRAPHY_POINTS {
            debug!(
                detected = source.len(),
                "not enough keypoints for a homography, skipping frame"
            );
            return Ok(positions);
        }

        let homography = match Homography::from_points(&source, &target) {
            Ok(homography) => homography,
            Err(error) => {
                debug!(%error, "homography fit failed, skipping frame");
                return Ok(positions);
            }
        };

        for (&player_id, bbox) in players {
            let tactical = match homography.project(&bbox.foot()) {
                Ok(point) => point,
                Err(error) => {
                    // Numerical degeneracy invalidates the whole transform,
                    // not just this player.
                    debug!(%error, "projection degenerate, dropping frame positions");
                    return Ok(TacticalPositionFrame::new());
                }
            };

            let in_bounds = tactical.x >= 0.0
                && tactical.x <= self.template.canvas_width()
                && tactical.y >= 0.0
                && tactical.y <= self.template.canvas_height();
            if in_bounds {
                positions.insert(player_id, tactical);
            }
        }

        Ok(positions)
    }

    /// Whole-video projection; a degenerate frame degrades to an empty map
    /// without aborting the run.
    pub fn project_sequence(
        &self,
        keypoints: &[KeypointSet],
        player_tracks: &[PlayerTrackFrame],
    ) -> Result<Vec<TacticalPositionFrame>> {
        check_aligned(
            "court_keypoints",
            keypoints.len(),
            "player_tracks",
            player_tracks.len(),
        )?;

        keypoints
            .iter()
            .zip(player_tracks)
            .map(|(frame_keypoints, players)| self.project_players(frame_keypoints, players))
            .collect()
    }

    /// Index alignment between detections and the template is assumed by
    /// every computation here, so a mismatch is fatal.
    fn check_template_alignment(&self, keypoints: &KeypointSet) -> Result<()> {
        if keypoints.len() != self.template.len() {
            return Err(PipelineError::Configuration(format!(
                "keypoint set has {} entries but the court template defines {}",
                keypoints.len(),
                self.template.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn projector() -> TacticalProjector {
        TacticalProjector::new(CourtTemplate::standard())
    }

    /// Keypoints exactly at their template positions (the camera already
    /// looking straight down), with every index detected.
    fn perfect_keypoints(template: &CourtTemplate) -> KeypointSet {
        template.points().iter().copied().map(Some).collect()
    }

    #[test]
    fn test_validation_passes_perfect_keypoints() {
        let projector = projector();
        let keypoints = perfect_keypoints(projector.template());
        let validated = projector.validate_keypoints(&keypoints).unwrap();
        assert_eq!(validated, keypoints);
    }

    #[test]
    fn test_validation_drops_displaced_keypoint() {
        let projector = projector();
        let mut keypoints = perfect_keypoints(projector.template());
        // Drag the last free-throw point onto the far corner landmark; its
        // distance ratio to the first two references collapses toward zero
        // while the template ratio stays near one.
        keypoints[17] = Some(Point::new(1.0, 0.0));

        let validated = projector.validate_keypoints(&keypoints).unwrap();
        assert_eq!(validated[17], None);
        // The untouched points survive.
        assert_eq!(validated[..17], keypoints[..17]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let projector = projector();
        let mut keypoints = perfect_keypoints(projector.template());
        keypoints[17] = Some(Point::new(1.0, 0.0));

        let once = projector.validate_keypoints(&keypoints).unwrap();
        let twice = projector.validate_keypoints(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validation_skips_sparse_frames() {
        let projector = projector();
        let mut keypoints: KeypointSet = vec![None; projector.template().len()];
        keypoints[0] = Some(Point::new(9999.0, 9999.0));
        keypoints[5] = Some(Point::new(-50.0, 3.0));

        // Two detections cannot be cross-checked; both are kept.
        let validated = projector.validate_keypoints(&keypoints).unwrap();
        assert_eq!(validated, keypoints);
    }

    #[test]
    fn test_template_count_mismatch_is_fatal() {
        let projector = projector();
        let keypoints: KeypointSet = vec![None; 3];
        assert!(matches!(
            projector.validate_keypoints(&keypoints),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_identity_projection_maps_foot_points() {
        let projector = projector();
        let keypoints = perfect_keypoints(projector.template());

        let mut players = PlayerTrackFrame::new();
        players.insert(4, BoundingBox::new(140.0, 40.0, 160.0, 80.0));

        let positions = projector.project_players(&keypoints, &players).unwrap();
        let position = positions.get(&4).expect("player should be projected");
        assert_relative_eq!(position.x, 150.0, epsilon = 1e-2);
        assert_relative_eq!(position.y, 80.0, epsilon = 1e-2);
    }

    #[test]
    fn test_out_of_canvas_projection_dropped() {
        let projector = projector();
        let keypoints = perfect_keypoints(projector.template());

        let mut players = PlayerTrackFrame::new();
        // Foot lands beyond the right canvas edge.
        players.insert(9, BoundingBox::new(400.0, 40.0, 440.0, 100.0));

        let positions = projector.project_players(&keypoints, &players).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn test_too_few_keypoints_yields_empty_frame() {
        let projector = projector();
        let template = projector.template().clone();
        let mut keypoints: KeypointSet = vec![None; template.len()];
        keypoints[0] = Some(template.points()[0]);
        keypoints[5] = Some(template.points()[5]);
        keypoints[10] = Some(template.points()[10]);

        let mut players = PlayerTrackFrame::new();
        players.insert(1, BoundingBox::new(10.0, 10.0, 30.0, 60.0));

        let positions = projector.project_players(&keypoints, &players).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn test_sequence_recovers_after_degenerate_frame() {
        let projector = projector();
        let template = projector.template().clone();
        let good = perfect_keypoints(&template);
        let empty: KeypointSet = vec![None; template.len()];

        let mut players = PlayerTrackFrame::new();
        players.insert(2, BoundingBox::new(100.0, 20.0, 120.0, 60.0));
        let tracks: Vec<PlayerTrackFrame> = vec![players.clone(), players.clone(), players];

        let positions = projector
            .project_sequence(&[good.clone(), empty, good], &tracks)
            .unwrap();
        assert_eq!(positions.len(), 3);
        assert!(!positions[0].is_empty());
        assert!(positions[1].is_empty());
        assert!(!positions[2].is_empty());
    }

    #[test]
    fn test_sequence_length_mismatch_rejected() {
        let projector = projector();
        let keypoints = vec![perfect_keypoints(projector.template()); 2];
        let tracks = vec![BTreeMap::new(); 3];
        assert!(projector.project_sequence(&keypoints, &tracks).is_err());
    }
}
