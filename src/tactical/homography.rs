// src/tactical/homography.rs

use crate::error::{PipelineError, Result};
use crate::types::Point;
use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};

/// Rank-deficiency tolerance relative to the largest eigenvalue of the
/// normalized design matrix.
const RANK_TOLERANCE: f64 = 1e-10;

/// Planar projective transform fitted from point correspondences with the
/// normalized direct linear transform.
///
/// Fitting fails explicitly on degenerate input (fewer than 4 points,
/// collinear configurations, coincident points); it never falls back to an
/// identity transform.
#[derive(Debug, Clone)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    pub fn from_points(source: &[Point], target: &[Point]) -> Result<Self> {
        if source.len() != target.len() {
            return Err(PipelineError::DegenerateHomography(format!(
                "source has {} correspondences but target has {}",
                source.len(),
                target.len()
            )));
        }
        if source.len() < 4 {
            return Err(PipelineError::DegenerateHomography(format!(
                "at least 4 point correspondences required, got {}",
                source.len()
            )));
        }

        let (t_source, source_normalized) = normalize(source)?;
        let (t_target, target_normalized) = normalize(target)?;

        // Each correspondence contributes two rows of the DLT system A h = 0.
        let mut a = DMatrix::<f64>::zeros(2 * source.len(), 9);
        for (i, (&(sx, sy), &(dx, dy))) in
            source_normalized.iter().zip(&target_normalized).enumerate()
        {
            let top = 2 * i;
            a[(top, 0)] = -sx;
            a[(top, 1)] = -sy;
            a[(top, 2)] = -1.0;
            a[(top, 6)] = dx * sx;
            a[(top, 7)] = dx * sy;
            a[(top, 8)] = dx;

            let bottom = top + 1;
            a[(bottom, 3)] = -sx;
            a[(bottom, 4)] = -sy;
            a[(bottom, 5)] = -1.0;
            a[(bottom, 6)] = dy * sx;
            a[(bottom, 7)] = dy * sy;
            a[(bottom, 8)] = dy;
        }

        // The solution is the eigenvector of A^T A with the smallest
        // eigenvalue. The second-smallest eigenvalue reveals rank deficiency:
        // collinear correspondences leave a null space wider than one vector,
        // meaning the homography is not uniquely determined.
        let eigen = SymmetricEigen::new(a.transpose() * &a);
        let mut order: Vec<usize> = (0..9).collect();
        order.sort_by(|&i, &j| {
            eigen.eigenvalues[i]
                .partial_cmp(&eigen.eigenvalues[j])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let largest = eigen.eigenvalues[order[8]].abs();
        let second_smallest = eigen.eigenvalues[order[1]].abs();
        if !largest.is_finite() || largest <= 0.0 {
            return Err(PipelineError::DegenerateHomography(
                "design matrix is numerically invalid".to_string(),
            ));
        }
        if second_smallest <= largest * RANK_TOLERANCE {
            return Err(PipelineError::DegenerateHomography(
                "correspondences are rank-deficient (collinear or coincident points)".to_string(),
            ));
        }

        let h = eigen.eigenvectors.column(order[0]);
        let normalized_matrix = Matrix3::new(
            h[0], h[1], h[2], //
            h[3], h[4], h[5], //
            h[6], h[7], h[8],
        );

        let t_target_inv = t_target.try_inverse().ok_or_else(|| {
            PipelineError::DegenerateHomography(
                "target normalization is not invertible".to_string(),
            )
        })?;
        let mut matrix = t_target_inv * normalized_matrix * t_source;

        let scale = matrix[(2, 2)];
        if scale.abs() > f64::EPSILON {
            matrix.unscale_mut(scale);
        }
        if !matrix.iter().all(|value| value.is_finite()) {
            return Err(PipelineError::DegenerateHomography(
                "transform contains non-finite entries".to_string(),
            ));
        }
        if matrix.determinant().abs() < 1e-12 {
            return Err(PipelineError::DegenerateHomography(
                "transform is not invertible".to_string(),
            ));
        }

        Ok(Self { matrix })
    }

    /// Apply the transform to a single point.
    pub fn project(&self, point: &Point) -> Result<Point> {
        let projected = self.matrix * Vector3::new(f64::from(point.x), f64::from(point.y), 1.0);
        if projected.z.abs() < 1e-12 {
            return Err(PipelineError::DegenerateHomography(format!(
                "point ({}, {}) maps to infinity",
                point.x, point.y
            )));
        }
        Ok(Point::new(
            (projected.x / projected.z) as f32,
            (projected.y / projected.z) as f32,
        ))
    }
}

/// Hartley normalization: translate the centroid to the origin and scale the
/// mean distance to sqrt(2). Conditions the DLT system so pixel-scale
/// coordinates do not swamp the homogeneous 1s.
fn normalize(points: &[Point]) -> Result<(Matrix3<f64>, Vec<(f64, f64)>)> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| f64::from(p.x)).sum::<f64>() / n;
    let cy = points.iter().map(|p| f64::from(p.y)).sum::<f64>() / n;

    let mean_distance = points
        .iter()
        .map(|p| (f64::from(p.x) - cx).hypot(f64::from(p.y) - cy))
        .sum::<f64>()
        / n;
    if mean_distance < f64::EPSILON {
        return Err(PipelineError::DegenerateHomography(
            "all correspondence points coincide".to_string(),
        ));
    }

    let scale = std::f64::consts::SQRT_2 / mean_distance;
    let transform = Matrix3::new(
        scale,
        0.0,
        -scale * cx,
        0.0,
        scale,
        -scale * cy,
        0.0,
        0.0,
        1.0,
    );
    let normalized = points
        .iter()
        .map(|p| (scale * (f64::from(p.x) - cx), scale * (f64::from(p.y) - cy)))
        .collect();
    Ok((transform, normalized))
}
