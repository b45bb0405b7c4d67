/// Minimum displacement, in device-independent pixels, for a swipe to count.
pub const SWIPE_THRESHOLD: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeIntent {
    Next,
    Previous,
    None,
}

/// Interpret a completed gesture from its start and end points.
///
/// The axis with the larger absolute displacement decides; it must move at
/// least [`SWIPE_THRESHOLD`]. Moving left or up means next, right or down
/// means previous. Equal displacement on both axes is not a navigation.
pub fn swipe_intent(start: Point, end: Point) -> SwipeIntent {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if !dx.is_finite() || !dy.is_finite() {
        return SwipeIntent::None;
    }

    let (ax, ay) = (dx.abs(), dy.abs());
    let dominant = if ax > ay {
        dx
    } else if ay > ax {
        dy
    } else {
        return SwipeIntent::None;
    };

    if dominant.abs() < SWIPE_THRESHOLD {
        SwipeIntent::None
    } else if dominant < 0.0 {
        SwipeIntent::Next
    } else {
        SwipeIntent::Previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ORIGIN: Point = Point::new(100.0, 100.0);

    #[test]
    fn test_horizontal_swipes() {
        assert_eq!(swipe_intent(ORIGIN, Point::new(20.0, 110.0)), SwipeIntent::Next);
        assert_eq!(swipe_intent(ORIGIN, Point::new(180.0, 90.0)), SwipeIntent::Previous);
    }

    #[test]
    fn test_vertical_swipes() {
        assert_eq!(swipe_intent(ORIGIN, Point::new(110.0, 20.0)), SwipeIntent::Next);
        assert_eq!(swipe_intent(ORIGIN, Point::new(90.0, 200.0)), SwipeIntent::Previous);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(swipe_intent(ORIGIN, Point::new(50.0, 100.0)), SwipeIntent::Next);
        assert_eq!(swipe_intent(ORIGIN, Point::new(50.1, 100.0)), SwipeIntent::None);
    }

    #[test]
    fn test_short_gesture_is_ignored() {
        assert_eq!(swipe_intent(ORIGIN, Point::new(130.0, 80.0)), SwipeIntent::None);
        assert_eq!(swipe_intent(ORIGIN, ORIGIN), SwipeIntent::None);
    }

    #[test]
    fn test_equal_displacement_is_not_navigation() {
        // Diagonal ties have no preferred axis
        assert_eq!(swipe_intent(ORIGIN, Point::new(20.0, 20.0)), SwipeIntent::None);
        assert_eq!(swipe_intent(ORIGIN, Point::new(180.0, 20.0)), SwipeIntent::None);
    }

    #[test]
    fn test_non_finite_points() {
        assert_eq!(
            swipe_intent(ORIGIN, Point::new(f64::NAN, 0.0)),
            SwipeIntent::None
        );
    }

    proptest! {
        #[test]
        fn prop_translation_invariant(
            sx in -1000.0f64..1000.0, sy in -1000.0f64..1000.0,
            dx in -400.0f64..400.0, dy in -400.0f64..400.0,
            shift in -500.0f64..500.0,
        ) {
            let a = swipe_intent(Point::new(sx, sy), Point::new(sx + dx, sy + dy));
            let b = swipe_intent(
                Point::new(sx + shift, sy + shift),
                Point::new(sx + shift + dx, sy + shift + dy),
            );
            // Floating point subtraction can differ right at the threshold
            prop_assume!((dx.abs() - SWIPE_THRESHOLD).abs() > 1e-6);
            prop_assume!((dy.abs() - SWIPE_THRESHOLD).abs() > 1e-6);
            prop_assume!((dx.abs() - dy.abs()).abs() > 1e-6);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_reversed_gesture_flips_intent(dx in -400.0f64..400.0, dy in -400.0f64..400.0) {
            let forward = swipe_intent(Point::new(0.0, 0.0), Point::new(dx, dy));
            let backward = swipe_intent(Point::new(dx, dy), Point::new(0.0, 0.0));
            let flipped = match forward {
                SwipeIntent::Next => SwipeIntent::Previous,
                SwipeIntent::Previous => SwipeIntent::Next,
                SwipeIntent::None => SwipeIntent::None,
            };
            prop_assert_eq!(backward, flipped);
        }
    }
}
