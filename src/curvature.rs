use geo::LineString;
use itertools::Itertools;

/// Total turning angle of a polyline, in degrees.
///
/// Sums the unsigned angle between each pair of consecutive direction
/// vectors, so a zig-zag accumulates rather than cancelling out. Repeated
/// points give a zero-length vector and are skipped.
pub fn curvature(geometry: Option<&LineString<f64>>) -> f64 {
    let Some(line) = geometry else {
        return 0.0;
    };
    if line.0.len() < 3 {
        return 0.0;
    }

    line.coords()
        .tuple_windows()
        .filter_map(|(p1, p2, p3)| {
            let (v1x, v1y) = (p2.x - p1.x, p2.y - p1.y);
            let (v2x, v2y) = (p3.x - p2.x, p3.y - p2.y);
            let n1 = v1x.hypot(v1y);
            let n2 = v2x.hypot(v2y);
            if n1 == 0.0 || n2 == 0.0 {
                return None;
            }
            // rounding can push the cosine just past ±1
            let cos = ((v1x * v2x + v1y * v2y) / (n1 * n2)).clamp(-1.0, 1.0);
            Some(cos.acos().to_degrees())
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn collinear_and_short_lines_have_no_curvature() {
        let straight = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 2.0), (x: 5.0, y: 5.0)];
        assert!(curvature(Some(&straight)).abs() < 1e-9);

        let two = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        assert_eq!(curvature(Some(&two)), 0.0);
        assert_eq!(curvature(None), 0.0);
    }

    #[test]
    fn right_angle_is_ninety_degrees() {
        let elbow = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert!((curvature(Some(&elbow)) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn zig_zag_accumulates() {
        let zig = line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 2.0, y: 1.0),
        ];
        assert!((curvature(Some(&zig)) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_points_are_skipped() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        // both triples touching the duplicate contain a zero-length vector
        assert_eq!(curvature(Some(&line)), 0.0);
    }

    #[test]
    fn translation_and_reversal_preserve_total() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.2), (x: 1.5, y: 1.0), (x: 3.0, y: 1.1)];
        let shifted: LineString<f64> = line.coords().map(|c| (c.x + 40.0, c.y - 70.0)).collect();
        let mut reversed = line.clone();
        reversed.0.reverse();

        let base = curvature(Some(&line));
        assert!((curvature(Some(&shifted)) - base).abs() < 1e-6);
        assert!((curvature(Some(&reversed)) - base).abs() < 1e-9);
    }
}
