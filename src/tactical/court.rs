// src/tactical/court.rs

use crate::types::{CourtConfig, Point};

/// Distances (meters) from a baseline's near sideline to the marked
/// landmarks along each baseline: lane edge, free-throw-line ends, far lane
/// edge.
const BASELINE_MARKS_METERS: [f32; 4] = [0.91, 5.18, 10.0, 14.1];

/// Free-throw line offset from each baseline, meters.
const FREE_THROW_OFFSET_METERS: f32 = 5.79;

/// Canonical landmark positions on the synthetic top-down court canvas.
///
/// Index identity is the contract of the whole tactical pipeline: detected
/// `KeypointSet` index i always refers to the same physical landmark as
/// template index i. The layout matches the court-keypoint detector's
/// ordering: 6 points down the left baseline, the 2 midline endpoints, the
/// 2 left free-throw ends, 6 points down the right baseline (mirrored
/// order), and the 2 right free-throw ends.
#[derive(Debug, Clone)]
pub struct CourtTemplate {
    config: CourtConfig,
    points: Vec<Point>,
}

impl CourtTemplate {
    pub fn new(config: CourtConfig) -> Self {
        let w = config.canvas_width;
        let h = config.canvas_height;
        // Proportional mapping from court meters to canvas pixels, truncated
        // to whole pixels like the synthetic court image the canvas mirrors.
        let x = |meters: f32| (meters / config.court_width_meters * w).floor();
        let y = |meters: f32| (meters / config.court_height_meters * h).floor();

        let [lane_near, ft_near, ft_far, lane_far] = BASELINE_MARKS_METERS;
        let ft_left = x(FREE_THROW_OFFSET_METERS);
        let ft_right = x(config.court_width_meters - FREE_THROW_OFFSET_METERS);
        let mid = (w / 2.0).floor();

        let points = vec![
            // Left baseline, top to bottom.
            Point::new(0.0, 0.0),
            Point::new(0.0, y(lane_near)),
            Point::new(0.0, y(ft_near)),
            Point::new(0.0, y(ft_far)),
            Point::new(0.0, y(lane_far)),
            Point::new(0.0, h),
            // Midline endpoints.
            Point::new(mid, h),
            Point::new(mid, 0.0),
            // Left free-throw line ends.
            Point::new(ft_left, y(ft_near)),
            Point::new(ft_left, y(ft_far)),
            // Right baseline, bottom to top.
            Point::new(w, h),
            Point::new(w, y(lane_far)),
            Point::new(w, y(ft_far)),
            Point::new(w, y(ft_near)),
            Point::new(w, y(lane_near)),
            Point::new(w, 0.0),
            // Right free-throw line ends.
            Point::new(ft_right, y(ft_near)),
            Point::new(ft_right, y(ft_far)),
        ];

        Self { config, points }
    }

    /// Template for a regulation 28m x 15m court on the 300x161 canvas.
    pub fn standard() -> Self {
        Self::new(CourtConfig::default())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn canvas_width(&self) -> f32 {
        self.config.canvas_width
    }

    pub fn canvas_height(&self) -> f32 {
        self.config.canvas_height
    }

    /// Horizontal scale factor for converting canvas pixels to meters.
    pub fn meters_per_pixel_x(&self) -> f32 {
        self.config.court_width_meters / self.config.canvas_width
    }

    /// Vertical scale factor; the canvas aspect ratio does not match the
    /// court's, so x and y scales differ.
    pub fn meters_per_pixel_y(&self) -> f32 {
        self.config.court_height_meters / self.config.canvas_height
    }
}
