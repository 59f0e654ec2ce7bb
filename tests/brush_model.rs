//! End-to-end brush model tests: drive a [`Canvas`] with pointer events and
//! evaluate the resulting frame inputs with the CPU stamp reference, the same
//! math the paint shader runs per texel.

use impasto::stamp::{self, SUBSAMPLE_COUNT};
use impasto::{BrushSettings, Canvas, CanvasSettings, CameraBounds, Color, PremulRgba};
use lyon::math::Point;

const FRAME_MS: f32 = 16.0;

fn canvas() -> Canvas {
    let mut canvas = Canvas::new(CanvasSettings::default(), BrushSettings::default());
    canvas
        .camera_mut()
        .set_bounds(CameraBounds::from_viewport(1024.0, 1024.0));
    canvas
}

/// Applies one frame's segment to a texel, exactly as the paint pass does.
fn apply_frame(dst: PremulRgba, texel: Point, frame: &impasto::FrameInput) -> PremulRgba {
    match frame.segment {
        Some((start, end)) => stamp::paint_segment(
            dst,
            texel,
            start,
            end,
            frame.brush_rgb,
            frame.brush_radius,
            frame.brush_softness,
            frame.stamp_alpha,
        ),
        None => dst,
    }
}

#[test]
fn full_flow_stationary_stroke_is_opaque_after_one_frame() {
    let mut canvas = canvas();
    canvas.brush_mut().set_flow(1.0);
    canvas.brush_mut().set_size(24.0);
    canvas.brush_mut().set_softness(0.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(50.0, 50.0));
    canvas.pointer_mut().pressed();

    let frame = canvas.tick(FRAME_MS);
    let texel = apply_frame(PremulRgba::default(), Point::new(50.0, 50.0), &frame);
    assert!(texel.alpha() > 0.99, "alpha was {}", texel.alpha());
}

#[test]
fn low_flow_stroke_accumulates_gradually_and_saturates() {
    let mut canvas = canvas();
    canvas.brush_mut().set_flow(0.5);
    canvas.brush_mut().set_size(24.0);
    canvas.brush_mut().set_softness(0.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(50.0, 50.0));
    canvas.pointer_mut().pressed();

    let mut texel = PremulRgba::default();
    let mut previous_alpha = 0.0;
    for _ in 0..4 {
        let frame = canvas.tick(FRAME_MS);
        texel = apply_frame(texel, Point::new(50.0, 50.0), &frame);
        assert!(texel.alpha() > previous_alpha);
        previous_alpha = texel.alpha();
    }
    assert!(previous_alpha < 1.0);

    // Holding long enough approaches full opacity without overshooting.
    for _ in 0..2000 {
        let frame = canvas.tick(FRAME_MS);
        texel = apply_frame(texel, Point::new(50.0, 50.0), &frame);
    }
    assert!(texel.alpha() > 0.999);
    assert!(texel.alpha() <= 1.0);
}

#[test]
fn texels_outside_the_footprint_stay_untouched() {
    let mut canvas = canvas();
    canvas.brush_mut().set_flow(1.0);
    canvas.brush_mut().set_size(24.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(50.0, 50.0));
    canvas.pointer_mut().pressed();

    let frame = canvas.tick(FRAME_MS);
    // 30 texels from the center, radius 24: outside the brush edge.
    let before = PremulRgba([0.1, 0.2, 0.3, 0.4]);
    let after = apply_frame(before, Point::new(50.0, 80.0), &frame);
    assert_eq!(before, after);
}

#[test]
fn fast_drag_leaves_no_gaps_along_the_segment() {
    let mut canvas = canvas();
    canvas.brush_mut().set_flow(1.0);
    canvas.brush_mut().set_size(24.0);
    canvas.brush_mut().set_softness(0.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(0.0, 100.0));
    canvas.pointer_mut().pressed();
    let _ = canvas.tick(FRAME_MS);

    // 100 texels in one frame: subsample spacing 6.25, well under the radius.
    canvas.pointer_mut().moved(Point::new(100.0, 100.0));
    let frame = canvas.tick(FRAME_MS);

    for x in 0..=100 {
        let texel = apply_frame(
            PremulRgba::default(),
            Point::new(x as f32, 100.0),
            &frame,
        );
        assert!(
            texel.alpha() > 0.9,
            "gap at x = {}: alpha {}",
            x,
            texel.alpha()
        );
    }
}

#[test]
fn stroke_interpolation_skips_the_start_and_reaches_the_end() {
    let start = Point::new(0.0, 0.0);
    let end = Point::new(SUBSAMPLE_COUNT as f32, 0.0);
    let first = stamp::subsample_center(start, end, 0);
    let last = stamp::subsample_center(start, end, SUBSAMPLE_COUNT - 1);
    assert!(first.x > start.x);
    assert_eq!(last, end);
}

#[test]
fn released_pointer_stops_accumulation() {
    let mut canvas = canvas();
    canvas.brush_mut().set_flow(0.5);
    canvas.brush_mut().set_size(24.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(50.0, 50.0));
    canvas.pointer_mut().pressed();
    let frame = canvas.tick(FRAME_MS);
    let mut texel = apply_frame(PremulRgba::default(), Point::new(50.0, 50.0), &frame);
    let painted_alpha = texel.alpha();
    assert!(painted_alpha > 0.0);

    canvas.pointer_mut().released();
    for _ in 0..10 {
        let frame = canvas.tick(FRAME_MS);
        assert_eq!(frame.segment, None);
        texel = apply_frame(texel, Point::new(50.0, 50.0), &frame);
    }
    assert_eq!(texel.alpha(), painted_alpha);
}

#[test]
fn brush_color_flows_straight_into_the_stamp() {
    let mut canvas = canvas();
    canvas.brush_mut().set_color(Color::from_hex("#ff8000").unwrap());
    canvas.brush_mut().set_flow(1.0);
    canvas.brush_mut().set_size(24.0);
    canvas.brush_mut().set_softness(0.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(50.0, 50.0));
    canvas.pointer_mut().pressed();

    let frame = canvas.tick(FRAME_MS);
    let texel = apply_frame(PremulRgba::default(), Point::new(50.0, 50.0), &frame);
    // Opaque premultiplied color equals the straight color.
    assert!((texel.0[0] - 1.0).abs() < 1e-3);
    assert!((texel.0[1] - 128.0 / 255.0).abs() < 1e-2);
    assert!((texel.0[2] - 0.0).abs() < 1e-3);
}

#[test]
fn zero_flow_paints_almost_nothing_per_frame() {
    let mut canvas = canvas();
    canvas.brush_mut().set_flow(0.0);
    canvas.brush_mut().set_size(24.0);
    canvas.brush_mut().set_softness(0.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(50.0, 50.0));
    canvas.pointer_mut().pressed();

    let frame = canvas.tick(FRAME_MS);
    let texel = apply_frame(PremulRgba::default(), Point::new(50.0, 50.0), &frame);
    assert!(texel.alpha() < 0.05);
    assert!(texel.alpha() > 0.0);
}

#[test]
fn camera_zoom_changes_where_strokes_land() {
    let mut canvas = canvas();
    canvas.camera_mut().set_scale(2.0);
    canvas.brush_mut().set_flow(1.0);
    canvas.brush_mut().set_size(24.0);
    canvas.brush_mut().set_softness(0.0);

    canvas.pointer_mut().entered();
    canvas.pointer_mut().moved(Point::new(200.0, 200.0));
    canvas.pointer_mut().pressed();

    let frame = canvas.tick(FRAME_MS);
    // Device (200, 200) at scale 2 maps to texel (100, 100).
    let at_mapped = apply_frame(PremulRgba::default(), Point::new(100.0, 100.0), &frame);
    let at_device = apply_frame(PremulRgba::default(), Point::new(200.0, 200.0), &frame);
    assert!(at_mapped.alpha() > 0.99);
    assert_eq!(at_device.alpha(), 0.0);
}
