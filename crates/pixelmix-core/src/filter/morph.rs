//! Morphological dilation and erosion with a rectangular element.
//!
//! The rectangle is separable, so both passes run along one axis at a time.
//! Samples outside the image are skipped rather than padded, which matches
//! padding with the identity of the reduction (0 for max, 255 for min).

use crate::error::Result;
use crate::scope::{MatId, Scope};

use super::KernelSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduce {
    Max,
    Min,
}

impl Reduce {
    #[inline]
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Reduce::Max => a.max(b),
            Reduce::Min => a.min(b),
        }
    }
}

/// Per-channel maximum over the element.
pub(crate) fn dilate(scope: &mut Scope, src: MatId, ksize: KernelSize) -> Result<MatId> {
    morph(scope, src, ksize, Reduce::Max)
}

/// Per-channel minimum over the element.
pub(crate) fn erode(scope: &mut Scope, src: MatId, ksize: KernelSize) -> Result<MatId> {
    morph(scope, src, ksize, Reduce::Min)
}

fn morph(scope: &mut Scope, src: MatId, ksize: KernelSize, op: Reduce) -> Result<MatId> {
    let horizontal = scope.alloc_like(src)?;
    let dst = scope.alloc_like(src)?;

    {
        let (src_mat, out) = scope.pair_mut(src, horizontal)?;
        let (w, h, cn) = (
            src_mat.cols() as usize,
            src_mat.rows() as usize,
            src_mat.channels() as usize,
        );
        let (before, after) = reach(ksize.width);
        reduce_rows(src_mat.as_u8()?, out.as_u8_mut()?, w, h, cn, before, after, op);
    }
    {
        let (tmp, out) = scope.pair_mut(horizontal, dst)?;
        let (w, h, cn) = (tmp.cols() as usize, tmp.rows() as usize, tmp.channels() as usize);
        let (before, after) = reach(ksize.height);
        reduce_cols(tmp.as_u8()?, out.as_u8_mut()?, w, h, cn, before, after, op);
    }

    scope.release(horizontal);
    Ok(dst)
}

/// Samples covered before and after the anchor for a kernel of length `k`.
fn reach(k: u32) -> (usize, usize) {
    let k = k.max(1) as usize;
    let anchor = k / 2;
    (anchor, k - 1 - anchor)
}

#[allow(clippy::too_many_arguments)]
fn reduce_rows(input: &[u8], out: &mut [u8], w: usize, h: usize, cn: usize, before: usize, after: usize, op: Reduce) {
    for y in 0..h {
        let row = &input[y * w * cn..(y + 1) * w * cn];
        for x in 0..w {
            let lo = x.saturating_sub(before);
            let hi = (x + after).min(w - 1);
            for c in 0..cn {
                let mut acc = row[lo * cn + c];
                for sx in lo + 1..=hi {
                    acc = op.pick(acc, row[sx * cn + c]);
                }
                out[(y * w + x) * cn + c] = acc;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn reduce_cols(input: &[u8], out: &mut [u8], w: usize, h: usize, cn: usize, before: usize, after: usize, op: Reduce) {
    let stride = w * cn;
    for y in 0..h {
        let lo = y.saturating_sub(before);
        let hi = (y + after).min(h - 1);
        let dst_row = &mut out[y * stride..(y + 1) * stride];
        dst_row.copy_from_slice(&input[lo * stride..(lo + 1) * stride]);
        for sy in lo + 1..=hi {
            let src_row = &input[sy * stride..(sy + 1) * stride];
            for (d, &s) in dst_row.iter_mut().zip(src_row) {
                *d = op.pick(*d, s);
            }
        }
    }
}
