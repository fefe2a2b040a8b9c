/// Cohen–Sutherland segment clipping against an axis-aligned rectangle.
///
/// Used by the view-rectangle test to decide whether any edge of a
/// projected bounding box crosses the screen.

use glam::Vec2;

const INSIDE: u8 = 0;
const LEFT: u8 = 1 << 0;
const RIGHT: u8 = 1 << 1;
const BOTTOM: u8 = 1 << 2;
const TOP: u8 = 1 << 3;

/// Out-code of a point relative to the rectangle `[min, max]`.
pub fn out_code(point: Vec2, min: Vec2, max: Vec2) -> u8 {
    let mut code = INSIDE;
    if point.x < min.x {
        code |= LEFT;
    } else if point.x > max.x {
        code |= RIGHT;
    }
    if point.y < min.y {
        code |= BOTTOM;
    } else if point.y > max.y {
        code |= TOP;
    }
    code
}

/// Returns true if any part of the segment `start → end` lies inside the
/// rectangle `[min, max]`.
///
/// Iterates until both out-codes are zero (accept) or share a bit (reject),
/// moving the outside endpoint onto the violated rectangle edge each step.
pub fn cohen_sutherland_line_clip(start: Vec2, end: Vec2, min: Vec2, max: Vec2) -> bool {
    let mut p0 = start;
    let mut p1 = end;
    let mut code0 = out_code(p0, min, max);
    let mut code1 = out_code(p1, min, max);

    // Each iteration clears at least one bit of one endpoint, so 4 bits per
    // endpoint bound the loop; the cap guards against NaN input.
    for _ in 0..8 {
        if code0 | code1 == INSIDE {
            return true;
        }
        if code0 & code1 != INSIDE {
            return false;
        }

        let code_out = if code0 != INSIDE { code0 } else { code1 };
        let d = p1 - p0;
        let point = if code_out & TOP != 0 {
            Vec2::new(p0.x + d.x * (max.y - p0.y) / d.y, max.y)
        } else if code_out & BOTTOM != 0 {
            Vec2::new(p0.x + d.x * (min.y - p0.y) / d.y, min.y)
        } else if code_out & RIGHT != 0 {
            Vec2::new(max.x, p0.y + d.y * (max.x - p0.x) / d.x)
        } else {
            Vec2::new(min.x, p0.y + d.y * (min.x - p0.x) / d.x)
        };

        if code_out == code0 {
            p0 = point;
            code0 = out_code(p0, min, max);
        } else {
            p1 = point;
            code1 = out_code(p1, min, max);
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect() -> (Vec2, Vec2) {
        (Vec2::splat(-1.0), Vec2::splat(1.0))
    }

    #[test]
    fn test_out_codes() {
        let (min, max) = unit_rect();
        assert_eq!(out_code(Vec2::ZERO, min, max), INSIDE);
        assert_eq!(out_code(Vec2::new(-2.0, 0.0), min, max), LEFT);
        assert_eq!(out_code(Vec2::new(2.0, 2.0), min, max), RIGHT | TOP);
        assert_eq!(out_code(Vec2::new(0.0, -2.0), min, max), BOTTOM);
    }

    #[test]
    fn test_segment_fully_inside_accepted() {
        let (min, max) = unit_rect();
        assert!(cohen_sutherland_line_clip(Vec2::new(-0.5, 0.0), Vec2::new(0.5, 0.5), min, max));
    }

    #[test]
    fn test_segment_crossing_rectangle_accepted() {
        let (min, max) = unit_rect();
        assert!(cohen_sutherland_line_clip(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), min, max));
        assert!(cohen_sutherland_line_clip(Vec2::new(-3.0, -3.0), Vec2::new(3.0, 3.0), min, max));
    }

    #[test]
    fn test_segment_sharing_outside_region_rejected() {
        let (min, max) = unit_rect();
        assert!(!cohen_sutherland_line_clip(Vec2::new(-5.0, 2.0), Vec2::new(5.0, 3.0), min, max));
    }

    #[test]
    fn test_segment_passing_corner_outside_rejected() {
        let (min, max) = unit_rect();
        // Crosses from LEFT to TOP regions but misses the top-left corner.
        assert!(!cohen_sutherland_line_clip(Vec2::new(-3.0, 0.5), Vec2::new(-0.5, 3.0), min, max));
    }

    #[test]
    fn test_segment_touching_edge_accepted() {
        let (min, max) = unit_rect();
        assert!(cohen_sutherland_line_clip(Vec2::new(1.0, -3.0), Vec2::new(1.0, 3.0), min, max));
    }
}
