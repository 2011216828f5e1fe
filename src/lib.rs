//! Game-state inference over basketball broadcast tracking output.
//!
//! Consumes per-frame bounding boxes from an external detector/tracker and
//! per-frame team labels from an external appearance classifier, and derives:
//!
//! - confirmed ball possession per frame (with temporal hysteresis),
//! - pass and interception events,
//! - player positions on a canonical top-down tactical court,
//! - per-player distance covered and smoothed speed.
//!
//! The vision models, video decoding, caching and any service wrapper live
//! outside this crate; [`pipeline::AnalysisInput`] and
//! [`pipeline::GameAnalysis`] are the in-memory contracts with them.

pub mod config;
pub mod error;
pub mod events;
pub mod kinematics;
pub mod pipeline;
pub mod possession;
pub mod tactical;
pub mod types;

pub use error::{PipelineError, Result};
pub use events::EventDetector;
pub use kinematics::KinematicsEstimator;
pub use pipeline::{AnalysisInput, AnalysisPipeline, GameAnalysis};
pub use possession::PossessionEngine;
pub use tactical::{CourtTemplate, Homography, TacticalProjector};
pub use types::{
    BoundingBox, PipelineConfig, PlayerId, Point, Team,
};
