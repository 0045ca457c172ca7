//! Channel-layout conversions between gray, RGB, RGBA and BGR matrices.
//!
//! Luminance uses the ITU-R BT.601 weights with 14-bit fixed-point
//! rounding, the same RGB→GRAY conversion vision libraries apply to 8-bit
//! images.

use crate::dual::OperationKind;
use crate::error::{Result, TransformError};
use crate::scope::{Depth, MatId, Scope};

/// ITU-R BT.601 coefficient for the red channel.
pub const LUMA_R: f32 = 0.299;

/// ITU-R BT.601 coefficient for the green channel.
pub const LUMA_G: f32 = 0.587;

/// ITU-R BT.601 coefficient for the blue channel.
pub const LUMA_B: f32 = 0.114;

// Fixed-point weights, scaled by 2^14; they sum to exactly 16384.
const FIX_R: u32 = 4899;
const FIX_G: u32 = 9617;
const FIX_B: u32 = 1868;
const FIX_SHIFT: u32 = 14;

/// Gray value of an 8-bit RGB triple.
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let sum = r as u32 * FIX_R + g as u32 * FIX_G + b as u32 * FIX_B + (1 << (FIX_SHIFT - 1));
    (sum >> FIX_SHIFT) as u8
}

/// Whether the adapter should convert operands of `kind` to gray.
///
/// Only the bitwise operators work on luminance; arithmetic and blending
/// always keep the caller's channel layout.
pub fn wants_grayscale(kind: OperationKind, grayscale_requested: bool) -> bool {
    grayscale_requested && kind.is_bitwise()
}

/// Prepare an operand for `kind`, converting to gray when requested.
///
/// Returns `src` unchanged when no conversion applies.
pub fn adapt_for_operation(
    scope: &mut Scope,
    src: MatId,
    kind: OperationKind,
    grayscale_requested: bool,
) -> Result<MatId> {
    if wants_grayscale(kind, grayscale_requested) {
        to_gray(scope, src)
    } else {
        Ok(src)
    }
}

/// Convert an RGB or RGBA matrix to a single gray channel.
///
/// A 1-channel matrix is returned as-is.
pub fn to_gray(scope: &mut Scope, src: MatId) -> Result<MatId> {
    convert_channels(scope, src, 1)
}

/// Convert `src` to `target` channels, allocating a new matrix.
///
/// Gray expands by replication, alpha is added as 255 and dropped when
/// narrowing. Returns `src` when it already has `target` channels.
pub fn convert_channels(scope: &mut Scope, src: MatId, target: u8) -> Result<MatId> {
    let (rows, cols, from) = {
        let mat = scope.mat(src)?;
        (mat.rows(), mat.cols(), mat.channels())
    };
    if from == target {
        return Ok(src);
    }
    check_layout(from)?;
    check_layout(target)?;

    let dst = scope.alloc(rows, cols, target, Depth::U8)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    let input = src_mat.as_u8()?;
    let output = dst_mat.as_u8_mut()?;

    for (px, out) in input
        .chunks_exact(from as usize)
        .zip(output.chunks_exact_mut(target as usize))
    {
        let (r, g, b, a) = match from {
            1 => (px[0], px[0], px[0], 255),
            3 => (px[0], px[1], px[2], 255),
            _ => (px[0], px[1], px[2], px[3]),
        };
        match target {
            1 => out[0] = luma_u8(r, g, b),
            3 => out.copy_from_slice(&[r, g, b]),
            _ => out.copy_from_slice(&[r, g, b, a]),
        }
    }
    Ok(dst)
}

/// Bring two operands to the same channel count by promoting the one with
/// fewer channels (gray→RGB replicates, RGB→RGBA adds opaque alpha).
pub fn unify_channels(scope: &mut Scope, a: MatId, b: MatId) -> Result<(MatId, MatId)> {
    let (ca, cb) = (scope.mat(a)?.channels(), scope.mat(b)?.channels());
    match ca.cmp(&cb) {
        std::cmp::Ordering::Equal => Ok((a, b)),
        std::cmp::Ordering::Less => Ok((convert_channels(scope, a, cb)?, b)),
        std::cmp::Ordering::Greater => Ok((a, convert_channels(scope, b, ca)?)),
    }
}

/// Reorder an RGB or RGBA matrix into 3-channel BGR; alpha is dropped.
pub fn to_bgr(scope: &mut Scope, src: MatId) -> Result<MatId> {
    let (rows, cols, from) = {
        let mat = scope.mat(src)?;
        (mat.rows(), mat.cols(), mat.channels())
    };
    if from < 3 {
        return Err(TransformError::InvalidInput(format!(
            "cannot reorder {from}-channel matrix to BGR"
        )));
    }

    let dst = scope.alloc(rows, cols, 3, Depth::U8)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    for (px, out) in src_mat
        .as_u8()?
        .chunks_exact(from as usize)
        .zip(dst_mat.as_u8_mut()?.chunks_exact_mut(3))
    {
        out.copy_from_slice(&[px[2], px[1], px[0]]);
    }
    Ok(dst)
}

/// Reorder a BGR matrix back to RGB (3 channels) or RGBA with opaque alpha.
pub fn from_bgr(scope: &mut Scope, src: MatId, target: u8) -> Result<MatId> {
    let (rows, cols, from) = {
        let mat = scope.mat(src)?;
        (mat.rows(), mat.cols(), mat.channels())
    };
    if from != 3 || target < 3 {
        return Err(TransformError::InvalidInput(format!(
            "cannot convert {from}-channel BGR to {target} channels"
        )));
    }
    check_layout(target)?;

    let dst = scope.alloc(rows, cols, target, Depth::U8)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    for (px, out) in src_mat
        .as_u8()?
        .chunks_exact(3)
        .zip(dst_mat.as_u8_mut()?.chunks_exact_mut(target as usize))
    {
        out[..3].copy_from_slice(&[px[2], px[1], px[0]]);
        if target == 4 {
            out[3] = 255;
        }
    }
    Ok(dst)
}

fn check_layout(channels: u8) -> Result<()> {
    match channels {
        1 | 3 | 4 => Ok(()),
        n => Err(TransformError::InvalidInput(format!(
            "unsupported channel count {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RasterBuffer;

    #[test]
    fn test_coefficients_sum_to_one() {
        let sum = LUMA_R + LUMA_G + LUMA_B;
        assert!((sum - 1.0).abs() < 1e-6);
        assert_eq!(FIX_R + FIX_G + FIX_B, 1 << FIX_SHIFT);
    }

    #[test]
    fn test_luma_gray_preserves_value() {
        for v in [0u8, 1, 64, 128, 200, 255] {
            assert_eq!(luma_u8(v, v, v), v);
        }
    }

    #[test]
    fn test_luma_primaries() {
        // 0.299 * 255 = 76.2, 0.587 * 255 = 149.7, 0.114 * 255 = 29.1
        assert_eq!(luma_u8(255, 0, 0), 76);
        assert_eq!(luma_u8(0, 255, 0), 150);
        assert_eq!(luma_u8(0, 0, 255), 29);
    }

    #[test]
    fn test_adapter_policy() {
        assert!(wants_grayscale(OperationKind::Xor, true));
        assert!(wants_grayscale(OperationKind::Not, true));
        assert!(!wants_grayscale(OperationKind::Xor, false));
        assert!(!wants_grayscale(OperationKind::Add, true));
        assert!(!wants_grayscale(OperationKind::Blend, true));
    }

    #[test]
    fn test_to_gray_rgba() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::new(2, 1, 4, vec![255, 0, 0, 9, 10, 10, 10, 0]).unwrap());
        let gray = to_gray(&mut scope, src).unwrap();
        assert_ne!(gray, src);
        let mat = scope.mat(gray).unwrap();
        assert_eq!(mat.channels(), 1);
        assert_eq!(mat.as_u8().unwrap(), &[76, 10]);
    }

    #[test]
    fn test_to_gray_is_noop_for_single_channel() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::filled(3, 3, 1, 42).unwrap());
        assert_eq!(to_gray(&mut scope, src).unwrap(), src);
        assert_eq!(scope.live(), 1);
    }

    #[test]
    fn test_adapt_keeps_layout_for_arithmetic() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::filled(2, 2, 3, 100).unwrap());
        let out = adapt_for_operation(&mut scope, src, OperationKind::Add, true).unwrap();
        assert_eq!(out, src);
        let out = adapt_for_operation(&mut scope, src, OperationKind::And, true).unwrap();
        assert_eq!(scope.mat(out).unwrap().channels(), 1);
    }

    #[test]
    fn test_expand_gray_to_rgba() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::new(2, 1, 1, vec![7, 200]).unwrap());
        let rgba = convert_channels(&mut scope, src, 4).unwrap();
        assert_eq!(
            scope.mat(rgba).unwrap().as_u8().unwrap(),
            &[7, 7, 7, 255, 200, 200, 200, 255]
        );
    }

    #[test]
    fn test_rgb_to_rgba_and_back() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::new(1, 1, 3, vec![1, 2, 3]).unwrap());
        let rgba = convert_channels(&mut scope, src, 4).unwrap();
        assert_eq!(scope.mat(rgba).unwrap().as_u8().unwrap(), &[1, 2, 3, 255]);
        let rgb = convert_channels(&mut scope, rgba, 3).unwrap();
        assert_eq!(scope.mat(rgb).unwrap().as_u8().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_bgr_round_trip() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::new(1, 1, 4, vec![10, 20, 30, 40]).unwrap());
        let bgr = to_bgr(&mut scope, src).unwrap();
        assert_eq!(scope.mat(bgr).unwrap().as_u8().unwrap(), &[30, 20, 10]);
        let rgba = from_bgr(&mut scope, bgr, 4).unwrap();
        assert_eq!(scope.mat(rgba).unwrap().as_u8().unwrap(), &[10, 20, 30, 255]);
    }

    #[test]
    fn test_unify_promotes_smaller_layout() {
        let mut scope = Scope::new("test");
        let gray = scope.adopt(RasterBuffer::new(1, 1, 1, vec![40]).unwrap());
        let rgba = scope.adopt(RasterBuffer::new(1, 1, 4, vec![1, 2, 3, 4]).unwrap());
        let (a, b) = unify_channels(&mut scope, gray, rgba).unwrap();
        assert_eq!(b, rgba);
        assert_eq!(scope.mat(a).unwrap().as_u8().unwrap(), &[40, 40, 40, 255]);

        let (a, b) = unify_channels(&mut scope, rgba, gray).unwrap();
        assert_eq!(a, rgba);
        assert_eq!(scope.mat(b).unwrap().channels(), 4);

        let (a, b) = unify_channels(&mut scope, rgba, rgba).unwrap();
        assert_eq!((a, b), (rgba, rgba));
    }

    #[test]
    fn test_to_bgr_rejects_gray() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::filled(1, 1, 1, 0).unwrap());
        assert!(matches!(
            to_bgr(&mut scope, src),
            Err(TransformError::InvalidInput(_))
        ));
    }
}
