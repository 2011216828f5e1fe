// src/possession.rs

use crate::error::{check_aligned, Result};
use crate::types::{BallTrackFrame, BoundingBox, PlayerId, PlayerTrackFrame, Point, PossessionConfig};
use tracing::debug;

/// Decides which player holds the ball each frame, with temporal hysteresis
/// to suppress one-frame noise: a candidate must be selected for
/// `min_frames` consecutive frames before possession is confirmed.
pub struct PossessionEngine {
    config: PossessionConfig,
    current_candidate: Option<PlayerId>,
    streak: u32,
}

impl PossessionEngine {
    pub fn new(config: PossessionConfig) -> Self {
        Self {
            config,
            current_candidate: None,
            streak: 0,
        }
    }

    /// Clear the hysteresis state (e.g. between unrelated videos). Batches of
    /// the same video must NOT be separated by a reset.
    pub fn reset(&mut self) {
        self.current_candidate = None;
        self.streak = 0;
    }

    /// Process one frame and return the confirmed holder, if any.
    ///
    /// A missing ball box (or an empty player frame) skips the frame without
    /// touching the streak; a present ball with no acceptable candidate
    /// breaks the streak.
    pub fn update(&mut self, players: &PlayerTrackFrame, ball: &BallTrackFrame) -> Option<PlayerId> {
        let ball_bbox = match ball {
            Some(bbox) => bbox,
            None => return None,
        };
        if players.is_empty() {
            return None;
        }

        let ball_center = ball_bbox.center();
        match self.find_best_candidate(ball_center, players, ball_bbox) {
            Some(candidate) => {
                if self.current_candidate == Some(candidate) {
                    self.streak += 1;
                } else {
                    debug!(player = candidate, "possession candidate changed");
                    self.current_candidate = Some(candidate);
                    self.streak = 1;
                }
                if self.streak >= self.config.min_frames {
                    Some(candidate)
                } else {
                    None
                }
            }
            None => {
                self.reset();
                None
            }
        }
    }

    /// Whole-video scan. Both sequences must have one entry per frame.
    pub fn detect(
        &mut self,
        player_tracks: &[PlayerTrackFrame],
        ball_tracks: &[BallTrackFrame],
    ) -> Result<Vec<Option<PlayerId>>> {
        check_aligned(
            "player_tracks",
            player_tracks.len(),
            "ball_tracks",
            ball_tracks.len(),
        )?;

        Ok(player_tracks
            .iter()
            .zip(ball_tracks)
            .map(|(players, ball)| self.update(players, ball))
            .collect())
    }

    /// Pick the most likely holder for a single frame.
    ///
    /// Players whose box contains most of the ball win outright; among those,
    /// the one with the LARGEST key-point distance is preferred, since
    /// containment already established eligibility and the largest distance
    /// marks the box that most stably encloses the ball. Without any
    /// high-containment player, the nearest player wins, but only within
    /// `possession_threshold`.
    fn find_best_candidate(
        &self,
        ball_center: Point,
        players: &PlayerTrackFrame,
        ball_bbox: &BoundingBox,
    ) -> Option<PlayerId> {
        let mut high_containment: Vec<(PlayerId, f32)> = Vec::new();
        let mut regular_distance: Vec<(PlayerId, f32)> = Vec::new();

        for (&player_id, player_bbox) in players {
            let containment = containment_ratio(player_bbox, ball_bbox);
            let min_distance = min_distance_to_ball(ball_center, player_bbox);

            if containment > self.config.containment_threshold {
                high_containment.push((player_id, min_distance));
            } else {
                regular_distance.push((player_id, min_distance));
            }
        }

        // Strict comparisons keep the tie-break on the lowest player id,
        // matching the deterministic ascending iteration order.
        if let Some(&(player_id, _)) = high_containment
            .iter()
            .reduce(|best, cand| if cand.1 > best.1 { cand } else { best })
        {
            return Some(player_id);
        }

        if let Some(&(player_id, distance)) = regular_distance
            .iter()
            .reduce(|best, cand| if cand.1 < best.1 { cand } else { best })
        {
            if distance < self.config.possession_threshold {
                return Some(player_id);
            }
        }

        None
    }
}

/// Fraction of the ball's box area lying inside the player's box.
pub fn containment_ratio(player: &BoundingBox, ball: &BoundingBox) -> f32 {
    player.intersection_area(ball) / ball.area()
}

/// Reference points on a player's box used for distance measurement: the four
/// corners, the four edge midpoints, the center, a mid-top-center at 1/3
/// height, and projections of the ball center onto the near edges whenever
/// its x or y coordinate falls strictly inside the box's span.
pub fn candidate_points(player: &BoundingBox, ball_center: Point) -> Vec<Point> {
    let BoundingBox { x1, y1, x2, y2 } = *player;
    let cx = (x1 + x2) / 2.0;
    let cy = (y1 + y2) / 2.0;

    let mut points = Vec::with_capacity(14);
    if ball_center.y > y1 && ball_center.y < y2 {
        points.push(Point::new(x1, ball_center.y));
        points.push(Point::new(x2, ball_center.y));
    }
    if ball_center.x > x1 && ball_center.x < x2 {
        points.push(Point::new(ball_center.x, y1));
        points.push(Point::new(ball_center.x, y2));
    }

    points.extend([
        Point::new(cx, y1),                                   // top center
        Point::new(x2, y1),                                   // top right
        Point::new(x1, y1),                                   // top left
        Point::new(x2, cy),                                   // center right
        Point::new(x1, cy),                                   // center left
        Point::new(cx, cy),                                   // center
        Point::new(x2, y2),                                   // bottom right
        Point::new(x1, y2),                                   // bottom left
        Point::new(cx, y2),                                   // bottom center
        Point::new(cx, y1 + player.height() / 3.0),           // mid-top center
    ]);
    points
}

/// Smallest distance from the ball center to any reference point of the box.
pub fn min_distance_to_ball(ball_center: Point, player: &BoundingBox) -> f32 {
    candidate_points(player, ball_center)
        .iter()
        .map(|point| ball_center.distance(point))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn frame(entries: &[(PlayerId, BoundingBox)]) -> PlayerTrackFrame {
        entries.iter().copied().collect::<BTreeMap<_, _>>()
    }

    fn engine(min_frames: u32) -> PossessionEngine {
        PossessionEngine::new(PossessionConfig {
            min_frames,
            ..PossessionConfig::default()
        })
    }

    const BALL: BoundingBox = BoundingBox {
        x1: 95.0,
        y1: 95.0,
        x2: 105.0,
        y2: 105.0,
    };

    #[test]
    fn test_containment_beats_distance() {
        // A fully contains the ball; B is closer by raw distance but does not
        // overlap it at all.
        let a = BoundingBox::new(50.0, 50.0, 150.0, 250.0);
        let b = BoundingBox::new(106.0, 95.0, 140.0, 180.0);
        let players = frame(&[(1, a), (2, b)]);

        let mut engine = engine(1);
        assert!(containment_ratio(&a, &BALL) > 0.8);
        assert_eq!(containment_ratio(&b, &BALL), 0.0);
        assert!(min_distance_to_ball(BALL.center(), &b) < min_distance_to_ball(BALL.center(), &a));
        assert_eq!(engine.update(&players, &Some(BALL)), Some(1));
    }

    #[test]
    fn test_distance_threshold_rejects_far_player() {
        // No containment and the nearest reference point is beyond 50px.
        let far = BoundingBox::new(300.0, 300.0, 360.0, 420.0);
        let players = frame(&[(7, far)]);

        let mut engine = engine(1);
        assert_eq!(engine.update(&players, &Some(BALL)), None);
    }

    #[test]
    fn test_edge_projection_point_shrinks_distance() {
        // Ball center x sits inside the box span, so the projected edge point
        // (ball_x, y1) is much closer than any corner or midpoint.
        let player = BoundingBox::new(60.0, 110.0, 160.0, 300.0);
        let distance = min_distance_to_ball(Point::new(100.0, 100.0), &player);
        assert!((distance - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_hysteresis_not_confirmed_below_min_frames() {
        let holder = BoundingBox::new(50.0, 50.0, 150.0, 250.0);
        let players = frame(&[(3, holder)]);

        let mut engine = engine(11);
        for _ in 0..10 {
            assert_eq!(engine.update(&players, &Some(BALL)), None);
        }
        // Ball lost before confirmation; the streak never pays out.
        assert_eq!(engine.update(&players, &None), None);
    }

    #[test]
    fn test_hysteresis_confirms_at_min_frames() {
        let holder = BoundingBox::new(50.0, 50.0, 150.0, 250.0);
        let players = frame(&[(3, holder)]);

        let mut engine = engine(5);
        let emitted: Vec<_> = (0..6).map(|_| engine.update(&players, &Some(BALL))).collect();
        assert_eq!(
            emitted,
            vec![None, None, None, None, Some(3), Some(3)]
        );
    }

    #[test]
    fn test_candidate_change_resets_streak() {
        let a = BoundingBox::new(50.0, 50.0, 150.0, 250.0);
        // Same geometry translated so it contains the ball when it is handed over.
        let b = BoundingBox::new(55.0, 50.0, 155.0, 250.0);
        let mut engine = engine(3);

        assert_eq!(engine.update(&frame(&[(1, a)]), &Some(BALL)), None);
        assert_eq!(engine.update(&frame(&[(1, a)]), &Some(BALL)), None);
        // New candidate appears with full containment and wins the frame.
        assert_eq!(engine.update(&frame(&[(2, b)]), &Some(BALL)), None);
        assert_eq!(engine.update(&frame(&[(2, b)]), &Some(BALL)), None);
        assert_eq!(engine.update(&frame(&[(2, b)]), &Some(BALL)), Some(2));
    }

    #[test]
    fn test_missing_ball_does_not_break_streak() {
        let holder = BoundingBox::new(50.0, 50.0, 150.0, 250.0);
        let players = frame(&[(3, holder)]);

        let mut engine = engine(3);
        assert_eq!(engine.update(&players, &Some(BALL)), None);
        assert_eq!(engine.update(&players, &Some(BALL)), None);
        // One undetected-ball frame is skipped, not treated as a new candidate.
        assert_eq!(engine.update(&players, &None), None);
        assert_eq!(engine.update(&players, &Some(BALL)), Some(3));
    }

    #[test]
    fn test_detect_rejects_mismatched_lengths() {
        let mut engine = engine(1);
        let players = vec![PlayerTrackFrame::new(); 3];
        let balls = vec![None; 4];
        assert!(engine.detect(&players, &balls).is_err());
    }

    #[test]
    fn test_detect_output_length_matches_frames() {
        let mut engine = engine(1);
        let players = vec![PlayerTrackFrame::new(); 8];
        let balls = vec![None; 8];
        let possession = engine.detect(&players, &balls).unwrap();
        assert_eq!(possession.len(), 8);
        assert!(possession.iter().all(Option::is_none));
    }
}
