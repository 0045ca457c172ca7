//! Border indexing and separable correlation shared by the linear filters.
//!
//! Kernels live in the scope as 1-row `F32` matrices. A separable pass runs
//! the row kernel along x and then the column kernel along y, both anchored
//! at the kernel center, accumulating into an `F32` matrix that callers
//! store back at 8-bit or 16-bit depth.

use crate::error::{Result, TransformError};
use crate::scope::{Depth, MatId, Scope};

/// Mirror `i` into `0..n` without repeating the edge sample
/// (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub(crate) fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let last = n as isize - 1;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as usize;
        }
    }
}

/// Clamp `i` into `0..n` (`aaaaaa|abcdefgh|hhhhhhh`).
#[inline]
pub(crate) fn replicate(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

/// Store `values` as a 1-row `F32` kernel matrix.
pub(crate) fn kernel_mat(scope: &mut Scope, values: &[f32]) -> Result<MatId> {
    let id = scope.alloc(1, values.len() as u32, 1, Depth::F32)?;
    scope.mat_mut(id)?.as_f32_mut()?.copy_from_slice(values);
    Ok(id)
}

fn kernel_taps(scope: &Scope, id: MatId) -> Result<&[f32]> {
    let taps = scope.mat(id)?.as_f32()?;
    if taps.is_empty() {
        return Err(TransformError::InternalProcessingFailure(
            "empty convolution kernel".to_string(),
        ));
    }
    Ok(taps)
}

fn shape(scope: &Scope, id: MatId) -> Result<(u32, u32, u8)> {
    let mat = scope.mat(id)?;
    Ok((mat.rows(), mat.cols(), mat.channels()))
}

/// Correlate an 8-bit matrix with a row kernel and a column kernel.
///
/// Returns a new `F32` matrix of the same shape holding the unrounded sums.
/// Borders are reflected without repeating the edge sample.
pub(crate) fn sep_correlate(scope: &mut Scope, src: MatId, row_kernel: MatId, col_kernel: MatId) -> Result<MatId> {
    let (rows, cols, channels) = shape(scope, src)?;
    let horizontal = scope.alloc(rows, cols, channels, Depth::F32)?;
    let dst = scope.alloc(rows, cols, channels, Depth::F32)?;
    let (w, h, cn) = (cols as usize, rows as usize, channels as usize);

    scope.with_output(horizontal, |scope, out| {
        let input = scope.mat(src)?.as_u8()?;
        let taps = kernel_taps(scope, row_kernel)?;
        let anchor = (taps.len() / 2) as isize;
        let out = out.as_f32_mut()?;
        for y in 0..h {
            let row = &input[y * w * cn..(y + 1) * w * cn];
            for x in 0..w {
                for c in 0..cn {
                    let mut sum = 0.0f32;
                    for (i, &k) in taps.iter().enumerate() {
                        let sx = reflect101(x as isize + i as isize - anchor, w);
                        sum += k * row[sx * cn + c] as f32;
                    }
                    out[(y * w + x) * cn + c] = sum;
                }
            }
        }
        Ok(())
    })?;

    scope.with_output(dst, |scope, out| {
        let input = scope.mat(horizontal)?.as_f32()?;
        let taps = kernel_taps(scope, col_kernel)?;
        let anchor = (taps.len() / 2) as isize;
        let out = out.as_f32_mut()?;
        let stride = w * cn;
        for y in 0..h {
            for (i, &k) in taps.iter().enumerate() {
                let sy = reflect101(y as isize + i as isize - anchor, h);
                let src_row = &input[sy * stride..(sy + 1) * stride];
                let dst_row = &mut out[y * stride..(y + 1) * stride];
                for (d, &s) in dst_row.iter_mut().zip(src_row) {
                    *d += k * s;
                }
            }
        }
        Ok(())
    })?;

    scope.release(horizontal);
    Ok(dst)
}

/// Round and saturate an `F32` matrix into a new 8-bit matrix.
pub(crate) fn store_u8(scope: &mut Scope, src: MatId) -> Result<MatId> {
    store(scope, src, Depth::U8)
}

/// Round and saturate an `F32` matrix into a new signed 16-bit matrix.
pub(crate) fn store_i16(scope: &mut Scope, src: MatId) -> Result<MatId> {
    store(scope, src, Depth::I16)
}

fn store(scope: &mut Scope, src: MatId, depth: Depth) -> Result<MatId> {
    let (rows, cols, channels) = shape(scope, src)?;
    let dst = scope.alloc(rows, cols, channels, depth)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    let input = src_mat.as_f32()?;
    match depth {
        Depth::U8 => {
            for (d, &s) in dst_mat.as_u8_mut()?.iter_mut().zip(input) {
                *d = s.round().clamp(0.0, 255.0) as u8;
            }
        }
        Depth::I16 => {
            for (d, &s) in dst_mat.as_i16_mut()?.iter_mut().zip(input) {
                *d = s.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            }
        }
        Depth::F32 => dst_mat.as_f32_mut()?.copy_from_slice(input),
    }
    Ok(dst)
}

/// Add `other` into `acc` element-wise; both must be `F32` and equally shaped.
pub(crate) fn accumulate(scope: &mut Scope, acc: MatId, other: MatId) -> Result<()> {
    let (other_mat, acc_mat) = scope.pair_mut(other, acc)?;
    if !other_mat.same_shape(acc_mat) {
        return Err(TransformError::InternalProcessingFailure(
            "accumulating matrices of different shapes".to_string(),
        ));
    }
    for (a, &o) in acc_mat.as_f32_mut()?.iter_mut().zip(other_mat.as_f32()?) {
        *a += o;
    }
    Ok(())
}

/// Saturated absolute value of a signed 16-bit matrix as a new 8-bit matrix.
pub(crate) fn convert_scale_abs(scope: &mut Scope, src: MatId) -> Result<MatId> {
    let (rows, cols, channels) = shape(scope, src)?;
    let dst = scope.alloc(rows, cols, channels, Depth::U8)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    for (d, &s) in dst_mat.as_u8_mut()?.iter_mut().zip(src_mat.as_i16()?) {
        *d = s.unsigned_abs().min(255) as u8;
    }
    Ok(dst)
}

/// Copy an 8-bit matrix into a freshly allocated one.
pub(crate) fn copy(scope: &mut Scope, src: MatId) -> Result<MatId> {
    let dst = scope.alloc_like(src)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    dst_mat.as_u8_mut()?.copy_from_slice(src_mat.as_u8()?);
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::RasterBuffer;

    #[test]
    fn test_reflect101() {
        // gfedcb|abcdefgh|gfedcba
        let n = 8;
        assert_eq!(reflect101(-1, n), 1);
        assert_eq!(reflect101(-2, n), 2);
        assert_eq!(reflect101(0, n), 0);
        assert_eq!(reflect101(7, n), 7);
        assert_eq!(reflect101(8, n), 6);
        assert_eq!(reflect101(9, n), 5);
        assert_eq!(reflect101(5, 1), 0);
    }

    #[test]
    fn test_reflect101_wide_kernel_on_narrow_image() {
        // offsets far outside a 2-wide image keep bouncing between 0 and 1
        for i in -40..40 {
            assert!(reflect101(i, 2) < 2);
            assert!(reflect101(i, 3) < 3);
        }
        assert_eq!(reflect101(-3, 3), 1);
        assert_eq!(reflect101(5, 3), 1);
    }

    #[test]
    fn test_replicate() {
        assert_eq!(replicate(-5, 4), 0);
        assert_eq!(replicate(2, 4), 2);
        assert_eq!(replicate(9, 4), 3);
    }

    #[test]
    fn test_identity_kernel_round_trips() {
        let mut scope = Scope::new("test");
        let pixels: Vec<u8> = (0..20).map(|v| v * 11).collect();
        let src = scope.adopt(RasterBuffer::new(5, 4, 1, pixels.clone()).unwrap());
        let k = kernel_mat(&mut scope, &[0.0, 1.0, 0.0]).unwrap();
        let sums = sep_correlate(&mut scope, src, k, k).unwrap();
        let out = store_u8(&mut scope, sums).unwrap();
        assert_eq!(scope.mat(out).unwrap().as_u8().unwrap(), &pixels[..]);
    }

    #[test]
    fn test_correlation_is_not_flipped() {
        // [1, 0, 0] with a centered anchor samples the left neighbour
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::new(4, 1, 1, vec![10, 20, 30, 40]).unwrap());
        let row = kernel_mat(&mut scope, &[1.0, 0.0, 0.0]).unwrap();
        let col = kernel_mat(&mut scope, &[1.0]).unwrap();
        let sums = sep_correlate(&mut scope, src, row, col).unwrap();
        let out = store_u8(&mut scope, sums).unwrap();
        // x = 0 reflects to x = 1
        assert_eq!(scope.mat(out).unwrap().as_u8().unwrap(), &[20, 10, 20, 30]);
    }

    #[test]
    fn test_store_saturates() {
        let mut scope = Scope::new("test");
        let f = kernel_mat(&mut scope, &[-3.2, 0.5, 254.6, 300.0, -40000.0]).unwrap();
        let u = store_u8(&mut scope, f).unwrap();
        assert_eq!(scope.mat(u).unwrap().as_u8().unwrap(), &[0, 1, 255, 255, 0]);
        let s = store_i16(&mut scope, f).unwrap();
        assert_eq!(scope.mat(s).unwrap().as_i16().unwrap(), &[-3, 1, 255, 300, -32768]);
        let abs = convert_scale_abs(&mut scope, s).unwrap();
        assert_eq!(scope.mat(abs).unwrap().as_u8().unwrap(), &[3, 1, 255, 255, 255]);
    }

    #[test]
    fn test_intermediate_released() {
        let mut scope = Scope::new("test");
        let src = scope.adopt(RasterBuffer::filled(3, 3, 3, 50).unwrap());
        let k = kernel_mat(&mut scope, &[1.0 / 3.0; 3]).unwrap();
        let before = scope.live();
        sep_correlate(&mut scope, src, k, k).unwrap();
        assert_eq!(scope.live(), before + 1);
    }
}
