//! Smoothing filters: box mean, Gaussian, median, bilateral and the
//! identity-kernel separable filter.

use crate::colorspace::{from_bgr, to_bgr};
use crate::error::Result;
use crate::scope::{MatId, Scope};

use super::kernel::{kernel_mat, reflect101, replicate, sep_correlate, store_u8};
use super::KernelSize;

/// Normalized box mean over a `width x height` window.
pub(crate) fn box_blur(scope: &mut Scope, src: MatId, ksize: KernelSize) -> Result<MatId> {
    let row = vec![1.0 / ksize.width as f32; ksize.width as usize];
    let col = vec![1.0 / ksize.height as f32; ksize.height as usize];
    separable_u8(scope, src, &row, &col)
}

/// Separable Gaussian blur.
///
/// A non-positive `sigma_y` takes `sigma_x`; a non-positive sigma on either
/// axis is derived from that axis's kernel size.
pub(crate) fn gaussian_blur(
    scope: &mut Scope,
    src: MatId,
    ksize: KernelSize,
    sigma_x: f64,
    sigma_y: f64,
) -> Result<MatId> {
    let sigma_y = if sigma_y > 0.0 { sigma_y } else { sigma_x };
    let row = gaussian_kernel(ksize.width as usize, sigma_x);
    let col = gaussian_kernel(ksize.height as usize, sigma_y);
    separable_u8(scope, src, &row, &col)
}

/// Separable filter whose kernels are 1 at index 0 and 0 elsewhere.
///
/// With the anchor at the kernel center this shifts the image by half the
/// kernel length along each axis, reflecting at the borders.
pub(crate) fn sep_filter_identity(scope: &mut Scope, src: MatId, kernel_x: u32, kernel_y: u32) -> Result<MatId> {
    separable_u8(scope, src, &unit_kernel(kernel_x as usize), &unit_kernel(kernel_y as usize))
}

fn unit_kernel(len: usize) -> Vec<f32> {
    let mut k = vec![0.0; len.max(1)];
    k[0] = 1.0;
    k
}

fn separable_u8(scope: &mut Scope, src: MatId, row: &[f32], col: &[f32]) -> Result<MatId> {
    let row = kernel_mat(scope, row)?;
    let col = kernel_mat(scope, col)?;
    let sums = sep_correlate(scope, src, row, col)?;
    let out = store_u8(scope, sums)?;
    for id in [row, col, sums] {
        scope.release(id);
    }
    Ok(out)
}

// Binomial tables used for small kernels when no sigma is given.
const SMALL_GAUSSIAN: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
];

/// 1-D Gaussian weights of length `n` (odd), normalized to sum to 1.
pub(crate) fn gaussian_kernel(n: usize, sigma: f64) -> Vec<f32> {
    if sigma <= 0.0 && n % 2 == 1 && n <= 7 {
        return SMALL_GAUSSIAN[n / 2].to_vec();
    }
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((n as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let scale = -0.5 / (sigma * sigma);
    let center = (n as f64 - 1.0) * 0.5;
    let weights: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Per-channel median over a `ksize x ksize` window with replicated borders.
pub(crate) fn median_blur(scope: &mut Scope, src: MatId, ksize: u32) -> Result<MatId> {
    let dst = scope.alloc_like(src)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    let (w, h, cn) = (
        src_mat.cols() as usize,
        src_mat.rows() as usize,
        src_mat.channels() as usize,
    );
    let input = src_mat.as_u8()?;
    let output = dst_mat.as_u8_mut()?;

    if ksize <= 1 {
        output.copy_from_slice(input);
        return Ok(dst);
    }

    let radius = (ksize / 2) as isize;
    let mut window = Vec::with_capacity((ksize * ksize) as usize);
    for y in 0..h {
        for x in 0..w {
            for c in 0..cn {
                window.clear();
                for dy in -radius..=radius {
                    let sy = replicate(y as isize + dy, h);
                    for dx in -radius..=radius {
                        let sx = replicate(x as isize + dx, w);
                        window.push(input[(sy * w + sx) * cn + c]);
                    }
                }
                let mid = window.len() / 2;
                let (_, median, _) = window.select_nth_unstable(mid);
                output[(y * w + x) * cn + c] = *median;
            }
        }
    }
    Ok(dst)
}

/// Edge-preserving bilateral smoothing.
///
/// Color input is filtered in BGR order and returned in its original layout
/// with opaque alpha; gray input is filtered directly.
pub(crate) fn bilateral(
    scope: &mut Scope,
    src: MatId,
    diameter: i32,
    sigma_color: f64,
    sigma_space: f64,
) -> Result<MatId> {
    let channels = scope.mat(src)?.channels();
    if channels == 1 {
        return bilateral_raw(scope, src, diameter, sigma_color, sigma_space);
    }
    let bgr = to_bgr(scope, src)?;
    let filtered = bilateral_raw(scope, bgr, diameter, sigma_color, sigma_space)?;
    scope.release(bgr);
    let out = from_bgr(scope, filtered, channels)?;
    scope.release(filtered);
    Ok(out)
}

fn bilateral_raw(
    scope: &mut Scope,
    src: MatId,
    diameter: i32,
    sigma_color: f64,
    sigma_space: f64,
) -> Result<MatId> {
    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };
    let radius: isize = if diameter <= 0 {
        (sigma_space * 1.5).round() as isize
    } else {
        (diameter / 2) as isize
    };
    let radius = radius.max(1);

    let dst = scope.alloc_like(src)?;
    let (src_mat, dst_mat) = scope.pair_mut(src, dst)?;
    let (w, h, cn) = (
        src_mat.cols() as usize,
        src_mat.rows() as usize,
        src_mat.channels() as usize,
    );
    let input = src_mat.as_u8()?;
    let output = dst_mat.as_u8_mut()?;

    // Color weights indexed by the summed absolute channel difference.
    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let color_weight: Vec<f32> = (0..256 * cn)
        .map(|d| ((d * d) as f64 * color_coeff).exp() as f32)
        .collect();

    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let mut taps: Vec<(isize, isize, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r = ((dx * dx + dy * dy) as f64).sqrt();
            if r > radius as f64 {
                continue;
            }
            taps.push((dx, dy, (r * r * space_coeff).exp() as f32));
        }
    }

    let mut acc = vec![0.0f32; cn];
    for y in 0..h {
        for x in 0..w {
            let center = &input[(y * w + x) * cn..(y * w + x + 1) * cn];
            acc.iter_mut().for_each(|a| *a = 0.0);
            let mut weight_sum = 0.0f32;
            for &(dx, dy, space_weight) in &taps {
                let sy = reflect101(y as isize + dy, h);
                let sx = reflect101(x as isize + dx, w);
                let sample = &input[(sy * w + sx) * cn..(sy * w + sx + 1) * cn];
                let diff: usize = sample
                    .iter()
                    .zip(center)
                    .map(|(&s, &c)| (s as i32 - c as i32).unsigned_abs() as usize)
                    .sum();
                let weight = space_weight * color_weight[diff];
                for (a, &s) in acc.iter_mut().zip(sample) {
                    *a += weight * s as f32;
                }
                weight_sum += weight;
            }
            let out = &mut output[(y * w + x) * cn..(y * w + x + 1) * cn];
            for (o, a) in out.iter_mut().zip(&acc) {
                *o = (a / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(dst)
}
