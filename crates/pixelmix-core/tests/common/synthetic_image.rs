use pixelmix_core::RasterBuffer;

/// High-contrast checkerboard with `channels` interleaved channels; alpha,
/// when present, is opaque.
pub fn checkerboard(width: u32, height: u32, cell: u32, channels: u8) -> RasterBuffer {
    assert!(cell > 0, "cell size must be positive");
    let mut pixels = Vec::with_capacity((width * height * channels as u32) as usize);
    for y in 0..height {
        for x in 0..width {
            let val = if (x / cell + y / cell) % 2 == 0 { 32u8 } else { 220u8 };
            for c in 0..channels {
                pixels.push(if c == 3 { 255 } else { val });
            }
        }
    }
    RasterBuffer::new(width, height, channels, pixels).expect("valid checkerboard")
}

/// Smooth diagonal gradient whose channels differ from each other.
pub fn gradient(width: u32, height: u32, channels: u8) -> RasterBuffer {
    let mut pixels = Vec::with_capacity((width * height * channels as u32) as usize);
    for y in 0..height {
        for x in 0..width {
            let values = [
                (x * 200 / width.max(1)) as u8,
                (y * 200 / height.max(1)) as u8,
                ((x + y) * 100 / (width + height)) as u8,
                255,
            ];
            pixels.extend_from_slice(&values[..channels as usize]);
        }
    }
    RasterBuffer::new(width, height, channels, pixels).expect("valid gradient")
}

/// Deterministic pseudo-random noise.
pub fn noise(width: u32, height: u32, channels: u8, seed: u32) -> RasterBuffer {
    let mut state = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let len = (width * height * channels as u32) as usize;
    let pixels = (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();
    RasterBuffer::new(width, height, channels, pixels).expect("valid noise")
}
