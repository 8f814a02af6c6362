//! Clipping and merging of label masks into a shared canvas.
//!
//! Masks are placed by the location of their top-left cell, which may lie
//! outside the canvas. Rows and columns that fall outside are dropped before
//! pasting, so nothing is ever written out of bounds.
//!
//! Pasting never erases: a zero cell of the incoming mask leaves the canvas
//! untouched, a nonzero cell overwrites whatever is there.

use glam::IVec2;

use crate::raster::LabelMask;

/// The part of a mask that lands inside a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub mask: LabelMask,
    /// Top-left of `mask` in the canvas, never negative.
    pub location: IVec2,
}

/// Clips `mask` placed at `location` to a `width x height` canvas.
///
/// Returns `None` when no cell of the mask lands inside the canvas.
pub fn project(mask: &LabelMask, width: usize, height: usize, location: IVec2) -> Option<Projection> {
    let (x0, x1) = clip_span(location.x as i64, mask.width(), width)?;
    let (y0, y1) = clip_span(location.y as i64, mask.height(), height)?;

    Some(Projection {
        mask: mask.crop(x0, y0, x1 - x0, y1 - y0),
        location: IVec2::new(
            (location.x as i64 + x0 as i64) as i32,
            (location.y as i64 + y0 as i64) as i32,
        ),
    })
}

/// Range `[start, end)` of a span of `len` cells placed at `offset` that falls
/// inside `[0, limit)`, in span coordinates.
fn clip_span(offset: i64, len: usize, limit: usize) -> Option<(usize, usize)> {
    let start = (-offset).clamp(0, len as i64);
    let end = (limit as i64 - offset).clamp(0, len as i64);
    (end > start).then_some((start as usize, end as usize))
}

/// Pastes `mask` with its top-left at `location`, keeping existing nonzero
/// cells wherever `mask` is zero.
///
/// # Panics
///
/// Panics if the mask does not fit inside the canvas at `location`.
pub fn paste_merge(canvas: &mut LabelMask, mask: &LabelMask, location: IVec2) {
    assert!(
        location.x >= 0
            && location.y >= 0
            && location.x as usize + mask.width() <= canvas.width()
            && location.y as usize + mask.height() <= canvas.height(),
        "mask {}x{} at ({}, {}) exceeds {}x{} canvas",
        mask.width(),
        mask.height(),
        location.x,
        location.y,
        canvas.width(),
        canvas.height()
    );

    let (x, y) = (location.x as usize, location.y as usize);
    for row in 0..mask.height() {
        let dst = &mut canvas.row_mut(y + row)[x..x + mask.width()];
        for (d, &s) in dst.iter_mut().zip(mask.row(row)) {
            if s != 0 {
                *d = s;
            }
        }
    }
}

/// Clips `mask` to `canvas` and merges it in. Returns where the clipped mask
/// landed, or `None` if it missed the canvas entirely.
pub fn project_into(canvas: &mut LabelMask, mask: &LabelMask, location: IVec2) -> Option<IVec2> {
    let projection = project(mask, canvas.width(), canvas.height(), location)?;
    paste_merge(canvas, &projection.mask, projection.location);
    Some(projection.location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(width: usize, height: usize) -> LabelMask {
        LabelMask::new_filled(width, height, 1)
    }

    #[test]
    fn test_inside_is_unchanged() {
        let mask = LabelMask::from_fn(3, 2, |x, y| (y * 3 + x + 1) as u8);
        let projection = project(&mask, 10, 10, IVec2::new(4, 5)).expect("inside");
        assert_eq!(projection.mask, mask);
        assert_eq!(projection.location, IVec2::new(4, 5));
    }

    #[test]
    fn test_clips_top_left_and_clamps_location() {
        let mask = LabelMask::from_fn(4, 4, |x, y| (y * 4 + x) as u8);
        let projection = project(&mask, 10, 10, IVec2::new(-1, -2)).expect("overlaps");
        assert_eq!(projection.location, IVec2::ZERO);
        assert_eq!(projection.mask.width(), 3);
        assert_eq!(projection.mask.height(), 2);
        assert_eq!(projection.mask.pixels(), &[9, 10, 11, 13, 14, 15]);
    }

    #[test]
    fn test_clips_bottom_right() {
        let mask = LabelMask::from_fn(4, 4, |x, y| (y * 4 + x) as u8);
        let projection = project(&mask, 6, 5, IVec2::new(4, 3)).expect("overlaps");
        assert_eq!(projection.location, IVec2::new(4, 3));
        assert_eq!(projection.mask.pixels(), &[0, 1, 4, 5]);
    }

    #[test]
    fn test_mask_larger_than_canvas() {
        let projection = project(&ones(20, 20), 5, 4, IVec2::new(-3, -3)).expect("covers");
        assert_eq!(projection.location, IVec2::ZERO);
        assert_eq!((projection.mask.width(), projection.mask.height()), (5, 4));
    }

    #[test]
    fn test_fully_outside_projects_nothing() {
        let mask = ones(3, 3);
        assert!(project(&mask, 10, 10, IVec2::new(10, 0)).is_none());
        assert!(project(&mask, 10, 10, IVec2::new(-3, 0)).is_none());
        assert!(project(&mask, 10, 10, IVec2::new(0, 12)).is_none());
        assert!(project(&mask, 10, 10, IVec2::new(-50, -50)).is_none());
    }

    #[test]
    fn test_never_writes_outside_canvas() {
        for (w, h) in [(1, 1), (7, 3), (12, 12)] {
            for mx in -15..15 {
                for my in -15..15 {
                    let mut canvas = LabelMask::new_default(10, 8);
                    let hit = project_into(&mut canvas, &ones(w, h), IVec2::new(mx, my));
                    let written = canvas.iter().filter(|&&v| v != 0).count();

                    let overlap_w = (mx + w as i32).min(10) - mx.max(0);
                    let overlap_h = (my + h as i32).min(8) - my.max(0);
                    let expected = (overlap_w.max(0) * overlap_h.max(0)) as usize;
                    assert_eq!(written, expected, "{}x{} at ({}, {})", w, h, mx, my);
                    assert_eq!(hit.is_some(), expected > 0);
                }
            }
        }
    }

    #[test]
    fn test_zeros_never_erase() {
        let mut canvas = LabelMask::new_default(4, 1);
        paste_merge(&mut canvas, &LabelMask::new(4, 1, vec![5, 5, 0, 0]), IVec2::ZERO);
        paste_merge(&mut canvas, &LabelMask::new(4, 1, vec![0, 7, 7, 0]), IVec2::ZERO);
        // Later nonzero wins, zero keeps what was there.
        assert_eq!(canvas.pixels(), &[5, 7, 7, 0]);
    }

    #[test]
    #[should_panic(expected = "exceeds 4x4 canvas")]
    fn test_paste_merge_rejects_overflow() {
        let mut canvas = LabelMask::new_default(4, 4);
        paste_merge(&mut canvas, &ones(2, 2), IVec2::new(3, 0));
    }
}
