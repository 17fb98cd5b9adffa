use crate::models::PointPairing;

/// A point in the answer plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

/// Euclidean distance between two points in the plane
#[inline]
pub fn point_distance(a: Point2D, b: Point2D) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Turn an answer vector into 2-D points
///
/// # Arguments
/// * `values` - Answer vector
/// * `pairing` - Which index pairs become points
///
/// # Returns
/// The points, in index order. Fewer than two values yields no points.
pub fn form_points(values: &[f64], pairing: PointPairing) -> Vec<Point2D> {
    if values.len() < 2 {
        return Vec::new();
    }

    match pairing {
        PointPairing::AllPairs => {
            let n = values.len();
            let mut points = Vec::with_capacity(n * (n - 1) / 2);
            for i in 0..n {
                for j in (i + 1)..n {
                    points.push(Point2D {
                        x: values[i],
                        y: values[j],
                    });
                }
            }
            points
        }
        PointPairing::Consecutive => values
            .chunks(2)
            .map(|chunk| Point2D {
                x: chunk[0],
                y: *chunk.get(1).unwrap_or(&chunk[0]),
            })
            .collect(),
    }
}

/// Mean of a set of points; the origin for an empty set
pub fn centroid(points: &[Point2D]) -> Point2D {
    if points.is_empty() {
        return Point2D { x: 0.0, y: 0.0 };
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point2D { x: sx / n, y: sy / n }
}

/// Distance of every point to the centroid of all points
///
/// This is the per-participant "distance profile" compared by the
/// geometric strategy.
pub fn distance_profile(values: &[f64], pairing: PointPairing) -> Vec<f64> {
    let points = form_points(values, pairing);
    let center = centroid(&points);
    points.iter().map(|p| point_distance(*p, center)).collect()
}

/// Euclidean distance between two equal-length vectors
#[inline]
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[inline]
fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine of the angle between two vectors, 0 if either has zero norm
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    (dot / (na * nb)).clamp(-1.0, 1.0)
}

/// Subtract the vector's own mean from every component
pub fn centered(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| v - mean).collect()
}
