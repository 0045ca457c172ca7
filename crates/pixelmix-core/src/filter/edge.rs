//! Derivative filters: Sobel, Scharr and Laplacian.
//!
//! All three run on a gray copy of the input at signed 16-bit depth, then
//! take the saturated absolute response back to 8-bit and expand it to the
//! input's channel count.

use crate::colorspace::{convert_channels, to_gray};
use crate::error::{Result, TransformError};
use crate::scope::{MatId, Scope};

use super::kernel::{accumulate, convert_scale_abs, kernel_mat, sep_correlate, store_i16};

/// 1-D Sobel kernel of the given derivative `order` and length `ksize`.
///
/// Built by repeated convolution of `[1, 1]` (smoothing) and `[-1, 1]`
/// (differencing); `ksize` 1 with a non-zero order uses length 3.
pub(crate) fn sobel_kernel(order: u32, ksize: u32) -> Result<Vec<f32>> {
    let ksize = if ksize == 1 && order > 0 { 3 } else { ksize } as usize;
    let order = order as usize;
    if ksize % 2 == 0 || order >= ksize {
        return Err(TransformError::invalid_parameter(
            "ksize",
            ksize,
            format!("derivative order {order} needs an odd aperture larger than the order"),
        ));
    }
    if ksize == 1 {
        return Ok(vec![1.0]);
    }

    let mut k = vec![0i32; ksize + 1];
    k[0] = 1;
    for _ in 0..ksize - order - 1 {
        let mut prev = k[0];
        for j in 1..=ksize {
            let next = k[j] + k[j - 1];
            k[j - 1] = prev;
            prev = next;
        }
    }
    for _ in 0..order {
        let mut prev = -k[0];
        for j in 1..=ksize {
            let next = k[j - 1] - k[j];
            k[j - 1] = prev;
            prev = next;
        }
    }
    k.truncate(ksize);
    Ok(k.into_iter().map(|v| v as f32).collect())
}

/// 3-tap Scharr kernel of derivative `order` 0 or 1.
pub(crate) fn scharr_kernel(order: u32) -> Result<Vec<f32>> {
    match order {
        0 => Ok(vec![3.0, 10.0, 3.0]),
        1 => Ok(vec![-1.0, 0.0, 1.0]),
        _ => Err(TransformError::invalid_parameter(
            "order",
            order,
            "Scharr supports first derivatives only",
        )),
    }
}

pub(crate) fn sobel(scope: &mut Scope, src: MatId, dx: u32, dy: u32, ksize: u32) -> Result<MatId> {
    let row = sobel_kernel(dx, ksize)?;
    let col = sobel_kernel(dy, ksize)?;
    gradient(scope, src, &[(row, col)])
}

pub(crate) fn scharr(scope: &mut Scope, src: MatId, dx: u32, dy: u32) -> Result<MatId> {
    let row = scharr_kernel(dx)?;
    let col = scharr_kernel(dy)?;
    gradient(scope, src, &[(row, col)])
}

/// Sum of the second derivatives along x and y.
///
/// Aperture 1 uses the 4-neighbour kernel and aperture 3 the 8-neighbour
/// `[2 0 2; 0 -8 0; 2 0 2]`; larger apertures add the second-order Sobel
/// responses.
pub(crate) fn laplacian(scope: &mut Scope, src: MatId, ksize: u32) -> Result<MatId> {
    let (second, smooth) = if ksize == 1 {
        (vec![1.0, -2.0, 1.0], vec![0.0, 1.0, 0.0])
    } else {
        (sobel_kernel(2, ksize)?, sobel_kernel(0, ksize)?)
    };
    gradient(scope, src, &[(second.clone(), smooth.clone()), (smooth, second)])
}

/// Run each `(row, col)` kernel pair on the gray input, sum the responses
/// at 16-bit depth and return their absolute value in the input layout.
fn gradient(scope: &mut Scope, src: MatId, passes: &[(Vec<f32>, Vec<f32>)]) -> Result<MatId> {
    let channels = scope.mat(src)?.channels();
    let gray = to_gray(scope, src)?;

    let mut total: Option<MatId> = None;
    for (row, col) in passes {
        let row = kernel_mat(scope, row)?;
        let col = kernel_mat(scope, col)?;
        let response = sep_correlate(scope, gray, row, col)?;
        scope.release(row);
        scope.release(col);
        match total {
            Some(acc) => {
                accumulate(scope, acc, response)?;
                scope.release(response);
            }
            None => total = Some(response),
        }
    }
    let total = total.ok_or_else(|| {
        TransformError::InternalProcessingFailure("gradient needs at least one kernel".to_string())
    })?;
    if gray != src {
        scope.release(gray);
    }

    let signed = store_i16(scope, total)?;
    scope.release(total);
    let magnitude = convert_scale_abs(scope, signed)?;
    scope.release(signed);

    let out = convert_channels(scope, magnitude, channels)?;
    if out != magnitude {
        scope.release(magnitude);
    }
    Ok(out)
}
