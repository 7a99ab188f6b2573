use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("non-finite waypoint coordinate at index {0}")]
    NonFinite(usize),
    #[error("polyline needs at least two waypoints, got {0}")]
    TooFewPoints(usize),
}

/// Integer points of the connected segments through `waypoints`, using
/// symmetric Bresenham stepping. The first segment contributes its start
/// through its end inclusive; each later segment skips the shared joint.
/// With `closed`, a final segment returns to the first waypoint.
pub fn line_points(
    waypoints: &[(f32, f32)],
    closed: bool,
) -> Result<Vec<(i32, i32)>, GeometryError> {
    if waypoints.len() < 2 {
        return Err(GeometryError::TooFewPoints(waypoints.len()));
    }
    let mut pts = Vec::with_capacity(waypoints.len() + usize::from(closed));
    for (i, &(x, y)) in waypoints.iter().enumerate() {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeometryError::NonFinite(i));
        }
        pts.push((x.round() as i32, y.round() as i32));
    }
    if closed {
        pts.push(pts[0]);
    }

    let mut out = Vec::new();
    for (i, pair) in pts.windows(2).enumerate() {
        segment(pair[0], pair[1], i > 0, &mut out);
    }
    Ok(out)
}

fn segment(from: (i32, i32), to: (i32, i32), skip_start: bool, out: &mut Vec<(i32, i32)>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut first = true;

    loop {
        if !(first && skip_start) {
            out.push((x, y));
        }
        first = false;
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Midpoint-circle points around `(cx, cy)` with integer radius `r`.
/// Emits all 8 octant reflections per step and stops once the horizontal
/// step passes the vertical.
pub fn circle_points(cx: i32, cy: i32, r: i32) -> Vec<(i32, i32)> {
    let r = r.max(0);
    let mut out = Vec::new();
    let mut x = 0;
    let mut y = r;
    let mut d = 1 - r;

    while x <= y {
        out.push((cx + x, cy + y));
        out.push((cx + y, cy + x));
        out.push((cx - x, cy + y));
        out.push((cx - y, cy + x));
        out.push((cx + x, cy - y));
        out.push((cx + y, cy - x));
        out.push((cx - x, cy - y));
        out.push((cx - y, cy - x));

        x += 1;
        if d < 0 {
            d += 2 * x + 1;
        } else {
            y -= 1;
            d += 2 * (x - y) + 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn horizontal_line_is_exact() {
        let pts = line_points(&[(0.0, 0.0), (5.0, 0.0)], false).unwrap();
        assert_eq!(pts, vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0)]);
    }

    #[test]
    fn diagonal_line_is_exact() {
        let pts = line_points(&[(0.0, 0.0), (3.0, 3.0)], false).unwrap();
        assert_eq!(pts, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn polyline_does_not_duplicate_joints() {
        let pts = line_points(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)], false).unwrap();
        assert_eq!(pts, vec![(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]);
    }

    #[test]
    fn closed_polyline_returns_to_start() {
        let pts = line_points(&[(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)], true).unwrap();
        assert_eq!(pts.last(), Some(&(0, 0)));
        // The closing segment walks the second diagonal.
        assert!(pts.contains(&(0, 1)) || pts.contains(&(0, 2)));
    }

    #[test]
    fn rejects_non_finite_and_short_input() {
        assert!(matches!(
            line_points(&[(0.0, 0.0), (f32::NAN, 1.0)], false),
            Err(GeometryError::NonFinite(1))
        ));
        assert!(matches!(
            line_points(&[(0.0, 0.0)], false),
            Err(GeometryError::TooFewPoints(1))
        ));
    }

    #[test]
    fn circle_radius_and_extrema() {
        let pts = circle_points(0, 0, 5);
        let set: HashSet<(i32, i32)> = pts.iter().copied().collect();
        for &(x, y) in &set {
            let r = ((x * x + y * y) as f64).sqrt().round() as i32;
            assert!((r - 5).abs() <= 1, "({x},{y}) at rounded radius {r}");
        }
        for extremum in [(5, 0), (-5, 0), (0, 5), (0, -5)] {
            assert!(set.contains(&extremum), "missing {extremum:?}");
        }
    }
}
