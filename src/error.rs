// src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Frame-aligned input sequences disagree in length. Fatal for the run:
    /// truncating or padding would silently break frame alignment.
    #[error("sequence length mismatch: `{left}` has {left_len} frames but `{right}` has {right_len}")]
    SequenceLengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    /// Malformed static configuration, detected at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The homography solver could not produce a usable transform for a
    /// frame. Recovered locally by the projector; callers of `Homography`
    /// directly must handle it.
    #[error("degenerate homography: {0}")]
    DegenerateHomography(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Checks that two frame-aligned sequences have the same length.
pub fn check_aligned(
    left: &'static str,
    left_len: usize,
    right: &'static str,
    right_len: usize,
) -> Result<()> {
    if left_len != right_len {
        return Err(PipelineError::SequenceLengthMismatch {
            left,
            left_len,
            right,
            right_len,
        });
    }
    Ok(())
}
