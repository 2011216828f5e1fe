// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable player identifier assigned by the external tracker. Not guaranteed
/// contiguous; a player may disappear and reappear under the same id.
pub type PlayerId = i64;

/// Per-frame map from player id to bounding box. Absence means the player was
/// not visible this frame. BTreeMap so iteration order (ascending id) is
/// deterministic, which the possession tie-break relies on.
pub type PlayerTrackFrame = BTreeMap<PlayerId, BoundingBox>;

/// At most one tracked ball per frame.
pub type BallTrackFrame = Option<BoundingBox>;

/// Per-frame map from player id to team label; absent when the appearance
/// classifier could not label that player this frame.
pub type TeamAssignmentFrame = BTreeMap<PlayerId, Team>;

/// Ordered court keypoints for one frame, index-aligned to the canonical
/// template. `None` encodes the detector's (0,0) "not detected" sentinel.
pub type KeypointSet = Vec<Option<Point>>;

/// Per-frame map from player id to position on the tactical canvas.
pub type TacticalPositionFrame = BTreeMap<PlayerId, Point>;

/// Per-frame map from player id to distance covered since their previous
/// known position, in meters.
pub type DistanceFrame = BTreeMap<PlayerId, f32>;

/// Per-frame map from player id to smoothed speed in km/h.
pub type SpeedFrame = BTreeMap<PlayerId, f32>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned box in image coordinates, x1 < x2 and y1 < y2 as guaranteed
/// by the upstream detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Bottom-center point, used as the ground-contact proxy for a player.
    pub fn foot(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, self.y2)
    }

    /// Area of the overlap with `other`, 0.0 when disjoint.
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        if ix2 < ix1 || iy2 < iy1 {
            return 0.0;
        }
        (ix2 - ix1) * (iy2 - iy1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl Team {
    /// Numeric label used at the serialized boundary (1 or 2).
    pub fn id(self) -> i32 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub possession: PossessionConfig,
    #[serde(default)]
    pub events: EventConfig,
    #[serde(default)]
    pub court: CourtConfig,
    #[serde(default)]
    pub kinematics: KinematicsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PossessionConfig {
    /// Maximum key-point distance (pixels) at which a player may take
    /// possession when containment alone is insufficient.
    pub possession_threshold: f32,
    /// Ball containment ratio above which a player holds the ball without a
    /// distance check.
    pub containment_threshold: f32,
    /// Consecutive frames the same candidate must be selected before
    /// possession is confirmed.
    pub min_frames: u32,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            possession_threshold: 50.0,
            containment_threshold: 0.8,
            min_frames: 11,
        }
    }
}

/// Which team is credited with an interception. The two historical pipeline
/// variants disagreed, so the choice is explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptionCredit {
    /// The team that gained the ball (default).
    NewHolder,
    /// The team that lost the ball.
    PreviousHolder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub interception_credit: InterceptionCredit,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            interception_credit: InterceptionCredit::NewHolder,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtConfig {
    /// Tactical canvas size in pixels.
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Real-world court size in meters.
    pub court_width_meters: f32,
    pub court_height_meters: f32,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            canvas_width: 300.0,
            canvas_height: 161.0,
            court_width_meters: 28.0,
            court_height_meters: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicsConfig {
    pub fps: f32,
    /// Minimum distance samples needed inside the lookback window before a
    /// non-zero speed is reported. The lookback spans window_size * 3 frames.
    pub window_size: usize,
    /// Empirical correction for systematic overestimation from foot-point
    /// homography noise.
    pub distance_correction: f32,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            window_size: 5,
            distance_correction: 0.4,
        }
    }
}
