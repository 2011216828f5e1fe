// src/tactical/mod.rs

pub mod court;
pub mod homography;
pub mod projector;

pub use court::CourtTemplate;
pub use homography::Homography;
pub use projector::TacticalProjector;
