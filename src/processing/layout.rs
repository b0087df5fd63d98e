/// Placement of a source image letterboxed inside a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Letterbox {
    pub scaled_w: u32,
    pub scaled_h: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Uniform scale that fits `src` inside `canvas` without distortion.
///
/// May exceed 1.0: a smaller image is enlarged to touch the canvas edges.
pub fn contain_scale(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> f32 {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let scale = (canvas_w as f32 / iw).min(canvas_h as f32 / ih).max(0.0);
    if scale.is_finite() { scale } else { 1.0 }
}

pub fn resize_to_contain(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let scale = contain_scale(canvas_w, canvas_h, src_w, src_h);
    let w = (src_w as f32 * scale)
        .round()
        .clamp(1.0, canvas_w.max(1) as f32);
    let h = (src_h as f32 * scale)
        .round()
        .clamp(1.0, canvas_h.max(1) as f32);
    (w as u32, h as u32)
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}

/// Contain-fit `src` inside `canvas` and center it.
///
/// Returns `None` when either side of the source or canvas is zero.
pub fn letterbox(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> Option<Letterbox> {
    if canvas_w == 0 || canvas_h == 0 || src_w == 0 || src_h == 0 {
        return None;
    }
    let (scaled_w, scaled_h) = resize_to_contain(canvas_w, canvas_h, src_w, src_h);
    let (offset_x, offset_y) = center_offset(scaled_w, scaled_h, canvas_w, canvas_h);
    Some(Letterbox {
        scaled_w,
        scaled_h,
        offset_x,
        offset_y,
    })
}

/// Dimensions after shrinking `src` so neither side exceeds `max_dim`.
///
/// Images already within bounds are returned unchanged; shrunk sides are floored.
pub fn fit_within(src_w: u32, src_h: u32, max_dim: u32) -> (u32, u32) {
    if src_w <= max_dim && src_h <= max_dim {
        return (src_w, src_h);
    }
    // integer math keeps the limiting side exactly at max_dim
    let max = u64::from(max_dim);
    let (w, h) = (u64::from(src_w), u64::from(src_h));
    if w >= h {
        (max_dim, (h * max / w).max(1) as u32)
    } else {
        ((w * max / h).max(1) as u32, max_dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_wide_into_square() {
        // 200x100 into 200x200: scale 1, centered vertically
        let lb = letterbox(200, 200, 200, 100).unwrap();
        assert_eq!(
            lb,
            Letterbox {
                scaled_w: 200,
                scaled_h: 100,
                offset_x: 0,
                offset_y: 50
            }
        );
    }

    #[test]
    fn letterbox_enlarges_small_source() {
        // 50x100 into 200x200: scale 2
        let lb = letterbox(200, 200, 50, 100).unwrap();
        assert_eq!((lb.scaled_w, lb.scaled_h), (100, 200));
        assert_eq!((lb.offset_x, lb.offset_y), (50, 0));
    }

    #[test]
    fn letterbox_rejects_degenerate_sizes() {
        assert!(letterbox(0, 10, 10, 10).is_none());
        assert!(letterbox(10, 10, 10, 0).is_none());
    }

    #[test]
    fn fit_within_floors_large_images() {
        assert_eq!(fit_within(4032, 3024, 200), (200, 150));
        assert_eq!(fit_within(333, 1000, 200), (66, 200));
        assert_eq!(fit_within(120, 80, 200), (120, 80));
    }
}
