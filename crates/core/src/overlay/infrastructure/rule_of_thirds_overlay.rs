use ndarray::{s, Axis};

use crate::overlay::domain::frame_transform::FrameTransform;
use crate::shared::constants::{DEFAULT_GUIDE_COLOR, DEFAULT_GUIDE_THICKNESS};
use crate::shared::frame::Frame;

/// Colour and stroke width of the guide lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayStyle {
    pub color: [u8; 3],
    pub thickness: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_GUIDE_COLOR,
            thickness: DEFAULT_GUIDE_THICKNESS,
        }
    }
}

/// Draws two vertical and two horizontal lines splitting the frame into
/// thirds.
///
/// Line positions are `w/3`, `2*(w/3)` and `h/3`, `2*(h/3)` using integer
/// division, each stroke centred on its position and clipped to the frame.
pub struct RuleOfThirdsOverlay {
    style: OverlayStyle,
}

impl RuleOfThirdsOverlay {
    pub fn new(style: OverlayStyle) -> Result<Self, &'static str> {
        if style.thickness == 0 {
            return Err("thickness must be >= 1");
        }
        Ok(Self { style })
    }
}

impl Default for RuleOfThirdsOverlay {
    fn default() -> Self {
        Self {
            style: OverlayStyle::default(),
        }
    }
}

impl FrameTransform for RuleOfThirdsOverlay {
    fn apply(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let channels = (frame.channels() as usize).min(3);
        let third_w = width / 3;
        let third_h = height / 3;
        let thickness = self.style.thickness as usize;
        let color = self.style.color;

        let mut pixels = frame.as_ndarray_mut();

        for x in [third_w, 2 * third_w] {
            let (start, end) = stroke(x, thickness, width);
            let mut band = pixels.slice_mut(s![.., start..end, ..]);
            for (c, value) in color.iter().enumerate().take(channels) {
                band.index_axis_mut(Axis(2), c).fill(*value);
            }
        }

        for y in [third_h, 2 * third_h] {
            let (start, end) = stroke(y, thickness, height);
            let mut band = pixels.slice_mut(s![start..end, .., ..]);
            for (c, value) in color.iter().enumerate().take(channels) {
                band.index_axis_mut(Axis(2), c).fill(*value);
            }
        }

        Ok(())
    }
}

/// Half-open pixel range of a stroke centred on `pos`, clipped to `[0, limit)`.
fn stroke(pos: usize, thickness: usize, limit: usize) -> (usize, usize) {
    let start = pos.saturating_sub(thickness / 2);
    let end = (start + thickness).min(limit);
    (start.min(end), end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WHITE: [u8; 3] = [255, 255, 255];

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let arr = frame.as_ndarray();
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    #[test]
    fn test_draws_lines_at_thirds() {
        let mut frame = Frame::filled(90, 60, [0, 0, 0], 0);
        RuleOfThirdsOverlay::default().apply(&mut frame).unwrap();

        // Vertical strokes at x=30 and x=60 cover [29, 31) and [59, 61).
        for y in [0, 10, 59] {
            assert_eq!(pixel(&frame, 29, y), WHITE);
            assert_eq!(pixel(&frame, 30, y), WHITE);
            assert_eq!(pixel(&frame, 60, y), WHITE);
        }
        // Horizontal strokes at y=20 and y=40.
        for x in [0, 45, 89] {
            assert_eq!(pixel(&frame, x, 19), WHITE);
            assert_eq!(pixel(&frame, x, 40), WHITE);
        }
    }

    #[test]
    fn test_leaves_other_pixels_untouched() {
        let mut frame = Frame::filled(90, 60, [7, 8, 9], 0);
        RuleOfThirdsOverlay::default().apply(&mut frame).unwrap();

        assert_eq!(pixel(&frame, 0, 0), [7, 8, 9]);
        assert_eq!(pixel(&frame, 15, 10), [7, 8, 9]);
        assert_eq!(pixel(&frame, 31, 21), [7, 8, 9]);
        assert_eq!(pixel(&frame, 89, 59), [7, 8, 9]);
    }

    #[test]
    fn test_uses_configured_colour_and_thickness() {
        let style = OverlayStyle {
            color: [255, 0, 0],
            thickness: 4,
        };
        let mut frame = Frame::filled(90, 60, [0, 0, 0], 0);
        RuleOfThirdsOverlay::new(style).unwrap().apply(&mut frame).unwrap();

        for x in 28..32 {
            assert_eq!(pixel(&frame, x, 5), [255, 0, 0]);
        }
        assert_eq!(pixel(&frame, 27, 5), [0, 0, 0]);
        assert_eq!(pixel(&frame, 32, 5), [0, 0, 0]);
    }

    #[test]
    fn test_is_deterministic_across_frames() {
        let overlay = RuleOfThirdsOverlay::default();
        let mut a = Frame::filled(48, 27, [100, 50, 25], 0);
        let mut b = Frame::filled(48, 27, [100, 50, 25], 99);
        overlay.apply(&mut a).unwrap();
        overlay.apply(&mut b).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 1)]
    fn test_tiny_frames_do_not_panic(#[case] w: u32, #[case] h: u32) {
        let mut frame = Frame::filled(w, h, [0, 0, 0], 0);
        RuleOfThirdsOverlay::default().apply(&mut frame).unwrap();
    }

    #[test]
    fn test_zero_thickness_rejected() {
        let style = OverlayStyle {
            color: WHITE,
            thickness: 0,
        };
        assert!(RuleOfThirdsOverlay::new(style).is_err());
    }

    #[rstest]
    #[case(30, 2, 90, (29, 31))]
    #[case(0, 2, 90, (0, 2))]
    #[case(89, 4, 90, (87, 90))]
    #[case(0, 3, 1, (0, 1))]
    fn test_stroke_range(
        #[case] pos: usize,
        #[case] thickness: usize,
        #[case] limit: usize,
        #[case] expected: (usize, usize),
    ) {
        assert_eq!(stroke(pos, thickness, limit), expected);
    }
}
