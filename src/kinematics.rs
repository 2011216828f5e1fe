// src/kinematics.rs

use crate::tactical::CourtTemplate;
use crate::types::{DistanceFrame, KinematicsConfig, PlayerId, Point, SpeedFrame, TacticalPositionFrame};
use std::collections::BTreeMap;

/// Derives per-player distance and speed from tactical-canvas positions.
///
/// Distance is measured between consecutive known positions only: a player
/// lost for a stretch of frames contributes a single delta on reappearance,
/// never one per missing frame.
pub struct KinematicsEstimator {
    config: KinematicsConfig,
    meters_per_pixel_x: f32,
    meters_per_pixel_y: f32,
}

impl KinematicsEstimator {
    pub fn new(config: KinematicsConfig, template: &CourtTemplate) -> Self {
        Self {
            config,
            meters_per_pixel_x: template.meters_per_pixel_x(),
            meters_per_pixel_y: template.meters_per_pixel_y(),
        }
    }

    /// Per-frame distance covered since each player's previous known
    /// position, in meters. A frame gets a sample for a player only when
    /// both a current and a prior position exist.
    pub fn distances(&self, positions: &[TacticalPositionFrame]) -> Vec<DistanceFrame> {
        let mut previous: BTreeMap<PlayerId, Point> = BTreeMap::new();
        let mut output: Vec<DistanceFrame> = Vec::with_capacity(positions.len());

        for frame_positions in positions {
            let mut frame_distances = DistanceFrame::new();
            for (&player_id, &position) in frame_positions {
                if let Some(&last) = previous.get(&player_id) {
                    frame_distances.insert(player_id, self.meter_distance(last, position));
                }
                previous.insert(player_id, position);
            }
            output.push(frame_distances);
        }
        output
    }

    /// Euclidean distance in meters between two canvas points, with the
    /// empirical correction for foot-point homography noise applied.
    fn meter_distance(&self, from: Point, to: Point) -> f32 {
        let dx = (to.x - from.x) * self.meters_per_pixel_x;
        let dy = (to.y - from.y) * self.meters_per_pixel_y;
        (dx * dx + dy * dy).sqrt() * self.config.distance_correction
    }

    /// Per-frame speed in km/h over a backward-looking window of
    /// `window_size * 3` frames.
    ///
    /// The first sample found in the window is skipped: its distance was
    /// computed against a position outside the window and would smuggle in
    /// movement from before it. Players with fewer than `window_size`
    /// counted samples get an explicit 0.0 so every player present in the
    /// frame has a speed value.
    pub fn speeds(&self, distances: &[DistanceFrame]) -> Vec<SpeedFrame> {
        let lookback = self.config.window_size * 3;
        let mut output: Vec<SpeedFrame> = Vec::with_capacity(distances.len());

        for frame_idx in 0..distances.len() {
            let mut frame_speeds = SpeedFrame::new();
            let window_start = (frame_idx + 1).saturating_sub(lookback);

            for &player_id in distances[frame_idx].keys() {
                let mut total_meters = 0.0f32;
                let mut counted = 0usize;
                let mut seen_first = false;

                for window_frame in &distances[window_start..=frame_idx] {
                    if let Some(&meters) = window_frame.get(&player_id) {
                        if seen_first {
                            total_meters += meters;
                            counted += 1;
                        }
                        seen_first = true;
                    }
                }

                let speed_kmh = if counted >= self.config.window_size {
                    let hours = counted as f32 / self.config.fps / 3600.0;
                    (total_meters / 1000.0) / hours
                } else {
                    0.0
                };
                frame_speeds.insert(player_id, speed_kmh);
            }
            output.push(frame_speeds);
        }
        output
    }
}
