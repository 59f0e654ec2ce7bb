//! The brush accumulation model.
//!
//! One frame of painting is a sequence of [`SUBSAMPLE_COUNT`] stamps
//! interpolated along the segment between the previous frame's pointer
//! position and the current one. Each stamp evaluates a soft circular
//! footprint at every texel, converts the user's flow setting and the
//! elapsed frame time into a blend alpha, and alpha-composites the result
//! over the running texel color.
//!
//! The functions here are the reference implementation: the paint shader
//! (`shaders/paint.wgsl`) runs the same formulas texel-parallel on the GPU,
//! and the tests hold the two accountable to each other. Divergence between
//! this module and the shader is a bug.

use lyon::math::Point;

use crate::color::PremulRgba;

/// Number of stamps interpolated along one frame's stroke segment.
pub const SUBSAMPLE_COUNT: u32 = 16;

/// Guards divisions by near-zero softness and flow values.
pub const EPSILON: f32 = 1e-6;

/// Constant fitting the logistic curve `2/(1+e^(-kx)) - 1` to the geometric
/// alpha-accumulation series, so that "seconds to full opacity" becomes an
/// explicit, framerate-independent control.
const FLOW_FIT: f32 = std::f32::consts::TAU * (2.0 / 3.0);

/// Maps a texel position into brush-UV space for a stamp centered at
/// `center` with the given `radius` (texels).
///
/// In brush-UV space the stamp center is `(0.5, 0.5)` and the brush edge is
/// at distance `0.5`, so the offset is divided by the diameter.
#[inline]
pub fn brush_uv(texel: Point, center: Point, radius: f32) -> Point {
    let offset = texel - center;
    Point::new(
        offset.x / (2.0 * radius) + 0.5,
        offset.y / (2.0 * radius) + 0.5,
    )
}

/// Coverage of the brush footprint at a brush-UV position, in `[0, 1]`.
///
/// The falloff is a signed-distance profile (`+1` at the center, `0` at the
/// edge, negative beyond) divided by the softness and squared for a softer
/// visual rolloff. Softness `0` yields a hard disk; softness `1` a very
/// gradual fade.
#[inline]
pub fn footprint_coverage(uv: Point, softness: f32) -> f32 {
    let distance = (uv - Point::new(0.5, 0.5)).length();
    let sdf = -(distance * 2.0 - 1.0);
    let coverage = (sdf / (softness + EPSILON)).clamp(0.0, 1.0);
    coverage * coverage
}

/// Converts the user flow setting into an opacity accumulation rate.
///
/// `flow` is the fraction of `max_seconds_to_opaque` after which continuous
/// painting saturates: `flow = 1` reaches full opacity immediately, `flow =
/// 0` after the full configured interval.
#[inline]
pub fn flow_rate(flow: f32, max_seconds_to_opaque: f32) -> f32 {
    1.0 / (max_seconds_to_opaque * (1.0 - flow + EPSILON))
}

/// The per-stamp blend alpha for one frame slice of `frame_delta_ms`,
/// divided evenly across the frame's subsamples.
#[inline]
pub fn stamp_alpha(rate: f32, frame_delta_ms: f32) -> f32 {
    let subsample_seconds = frame_delta_ms / SUBSAMPLE_COUNT as f32 / 1000.0;
    (rate * subsample_seconds * FLOW_FIT).clamp(0.0, 1.0)
}

/// The center of subsample `index` (0-based) along the segment from `start`
/// to `end`.
///
/// Interpolation runs at `t = (index + 1) / SUBSAMPLE_COUNT`: the previous
/// frame's endpoint (`t = 0`) is skipped so consecutive frames chain without
/// double-stamping, and the final subsample lands exactly on `end`.
#[inline]
pub fn subsample_center(start: Point, end: Point, index: u32) -> Point {
    let t = (index + 1) as f32 / SUBSAMPLE_COUNT as f32;
    start.lerp(end, t)
}

/// One frame of the compositor for a single texel: stamps
/// [`SUBSAMPLE_COUNT`] interpolated brush footprints over `dst`, in stroke
/// order.
///
/// `brush_rgb` is the straight (not premultiplied) brush color;
/// `stamp_alpha` is the per-stamp blend weight from [`stamp_alpha`].
/// If `start == end` all stamps coincide, which degrades gracefully into
/// repeated identical stamps.
pub fn paint_segment(
    dst: PremulRgba,
    texel: Point,
    start: Point,
    end: Point,
    brush_rgb: [f32; 3],
    radius: f32,
    softness: f32,
    stamp_alpha: f32,
) -> PremulRgba {
    let mut out = dst;
    for index in 0..SUBSAMPLE_COUNT {
        let center = subsample_center(start, end, index);
        let coverage = footprint_coverage(brush_uv(texel, center, radius), softness);
        let alpha = coverage * stamp_alpha;
        out = PremulRgba::from_straight(brush_rgb, alpha).over(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uv_at_distance(distance: f32) -> Point {
        Point::new(0.5 + distance, 0.5)
    }

    #[test]
    fn coverage_is_full_at_the_stamp_center() {
        for softness in [0.01, 0.25, 0.5, 0.99] {
            assert_eq!(footprint_coverage(uv_at_distance(0.0), softness), 1.0);
        }
    }

    #[test]
    fn coverage_is_zero_at_and_beyond_the_edge() {
        // Hard edge: a small softness saturates the profile inside the
        // radius and zeroes it at the edge.
        let softness = 0.001;
        assert_eq!(footprint_coverage(uv_at_distance(0.5), softness), 0.0);
        assert_eq!(footprint_coverage(uv_at_distance(0.75), softness), 0.0);
    }

    #[test]
    fn coverage_is_monotonically_non_increasing_in_distance() {
        for softness in [0.05, 0.3, 0.8, 1.0] {
            let mut previous = f32::INFINITY;
            for step in 0..=100 {
                let distance = step as f32 * 0.01;
                let coverage = footprint_coverage(uv_at_distance(distance), softness);
                assert!((0.0..=1.0).contains(&coverage));
                assert!(
                    coverage <= previous,
                    "coverage increased at d={distance} s={softness}"
                );
                previous = coverage;
            }
        }
    }

    #[test]
    fn flow_alpha_is_monotonic_and_saturates() {
        let max_seconds = 2.0;
        let mut previous = 0.0;
        for step in 0..=10 {
            let flow = step as f32 * 0.1;
            let alpha = stamp_alpha(flow_rate(flow, max_seconds), 16.0);
            assert!(alpha >= previous, "alpha decreased at flow={flow}");
            previous = alpha;
        }
        // Saturation in delta time.
        let rate = flow_rate(0.5, max_seconds);
        assert_eq!(stamp_alpha(rate, 1_000_000.0), 1.0);
        // Flow near zero paints almost nothing in one frame.
        assert!(stamp_alpha(flow_rate(0.0, max_seconds), 16.0) < 0.01);
    }

    #[test]
    fn flow_one_saturates_within_a_frame() {
        let rate = flow_rate(1.0, 2.0);
        assert_eq!(stamp_alpha(rate, 16.0), 1.0);
    }

    #[test]
    fn subsamples_skip_the_start_and_reach_the_end() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(32.0, 0.0);
        let first = subsample_center(start, end, 0);
        let last = subsample_center(start, end, SUBSAMPLE_COUNT - 1);
        assert!(first.x > 0.0);
        assert_eq!(last, end);
    }

    #[test]
    fn zero_alpha_segment_leaves_texels_untouched() {
        let dst = PremulRgba([0.3, 0.1, 0.25, 0.4]);
        let out = paint_segment(
            dst,
            Point::new(10.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 10.0),
            [1.0, 0.0, 0.0],
            24.0,
            0.5,
            0.0,
        );
        assert_eq!(out, dst);
    }

    #[test]
    fn texels_outside_the_radius_are_untouched() {
        let dst = PremulRgba::TRANSPARENT;
        let out = paint_segment(
            dst,
            Point::new(50.0, 80.0),
            Point::new(50.0, 50.0),
            Point::new(50.0, 50.0),
            [1.0, 0.0, 0.0],
            24.0,
            0.0,
            1.0,
        );
        assert_eq!(out, dst);
    }

    #[test]
    fn stationary_stroke_moves_texel_toward_brush_color() {
        // Press at (50,50), no motion, one 16 ms frame, flow=1,
        // max_seconds_to_opaque=2, radius=24, softness=0.
        let alpha = stamp_alpha(flow_rate(1.0, 2.0), 16.0);
        let out = paint_segment(
            PremulRgba::TRANSPARENT,
            Point::new(50.0, 50.0),
            Point::new(50.0, 50.0),
            Point::new(50.0, 50.0),
            [1.0, 0.0, 0.0],
            24.0,
            0.0,
            alpha,
        );
        assert!(out.alpha() > 0.99);
        assert!(out.0[0] > 0.99);
        assert_eq!(out.0[1], 0.0);
    }

    #[test]
    fn moving_stroke_paints_a_gapless_line() {
        // (0,0) -> (100,0) in one frame, radius well above
        // half the subsample spacing. Every texel under the swept segment
        // must receive paint.
        let alpha = stamp_alpha(flow_rate(1.0, 2.0), 16.0);
        for x in 0..=100 {
            let out = paint_segment(
                PremulRgba::TRANSPARENT,
                Point::new(x as f32, 0.0),
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                [0.0, 0.0, 1.0],
                24.0,
                0.2,
                alpha,
            );
            assert!(out.alpha() > 0.0, "gap at texel x={x}");
        }
    }

    #[test]
    fn stamp_order_is_not_commutative() {
        let texel = Point::new(5.0, 0.0);
        let red_then_blue = {
            let mid = paint_segment(
                PremulRgba::TRANSPARENT,
                texel,
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                [1.0, 0.0, 0.0],
                16.0,
                0.5,
                0.5,
            );
            paint_segment(
                mid,
                texel,
                Point::new(10.0, 0.0),
                Point::new(0.0, 0.0),
                [0.0, 0.0, 1.0],
                16.0,
                0.5,
                0.5,
            )
        };
        let blue_then_red = {
            let mid = paint_segment(
                PremulRgba::TRANSPARENT,
                texel,
                Point::new(10.0, 0.0),
                Point::new(0.0, 0.0),
                [0.0, 0.0, 1.0],
                16.0,
                0.5,
                0.5,
            );
            paint_segment(
                mid,
                texel,
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                [1.0, 0.0, 0.0],
                16.0,
                0.5,
                0.5,
            )
        };
        assert_ne!(red_then_blue, blue_then_red);
    }
}
