mod common;

use std::thread;

use common::synthetic_image::{checkerboard, gradient, noise};
use pixelmix_core::{
    apply_dual_op, apply_dual_op_with, apply_filter, filter_catalog, live_mat_count, EncodeFormat, FilterRequest,
    FilterType, OperationKind, OperationRequest, RasterBuffer, TransformError, TransformOptions,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn not_ignores_second_operand() {
    init_logger();
    let a = gradient(32, 24, 4);
    let request = OperationRequest::new(OperationKind::Not);
    let first = apply_dual_op(&a, &noise(32, 24, 4, 1), &request).unwrap();
    let second = apply_dual_op(&a, &noise(32, 24, 4, 2), &request).unwrap();
    let gray_b = apply_dual_op(&a, &noise(32, 24, 1, 3), &request).unwrap();

    assert_eq!(first.buffer, second.buffer);
    assert_eq!(first.buffer, gray_b.buffer);
    for (out, src) in first.buffer.pixels.iter().zip(&a.pixels) {
        assert_eq!(*out, !*src);
    }
}

#[test]
fn add_then_subtract_reconstructs() {
    init_logger();
    // values stay below 128 so the sum never clips
    let a = RasterBuffer::new(8, 8, 3, (0..192).map(|i| (i % 128) as u8).collect()).unwrap();
    let b = RasterBuffer::new(8, 8, 3, (0..192).map(|i| ((i * 7) % 128) as u8).collect()).unwrap();

    let sum = apply_dual_op(&a, &b, &OperationRequest::new(OperationKind::Add)).unwrap();
    let back = apply_dual_op(&sum.buffer, &b, &OperationRequest::new(OperationKind::Subtract)).unwrap();
    assert_eq!(back.buffer, a);
}

#[test]
fn subtract_floors_at_zero() {
    init_logger();
    let a = RasterBuffer::filled(4, 4, 3, 30).unwrap();
    let b = RasterBuffer::filled(4, 4, 3, 200).unwrap();
    let out = apply_dual_op(&a, &b, &OperationRequest::new(OperationKind::Subtract)).unwrap();
    assert!(out.buffer.pixels.iter().all(|&v| v == 0));
}

#[test]
fn result_takes_per_axis_maximum() {
    init_logger();
    let a = gradient(100, 50, 4);
    let b = gradient(60, 80, 4);
    for kind in OperationKind::ALL {
        let out = apply_dual_op(&a, &b, &OperationRequest::new(kind)).unwrap();
        assert_eq!(out.buffer.dimensions(), (100, 80), "{kind}");
    }
}

#[test]
fn resize_filter_is_configurable() {
    init_logger();
    let a = checkerboard(40, 40, 5, 3);
    let b = checkerboard(20, 20, 5, 3);
    let request = OperationRequest::new(OperationKind::Xor);
    for resize_filter in [FilterType::Nearest, FilterType::Bilinear, FilterType::Lanczos3] {
        let options = TransformOptions::new().with_resize_filter(resize_filter);
        let out = apply_dual_op_with(&a, &b, &request, &options).unwrap();
        assert_eq!(out.buffer.dimensions(), (40, 40));
    }
}

#[test]
fn blend_extremes_select_one_operand() {
    init_logger();
    let a = gradient(16, 16, 3);
    let b = noise(16, 16, 3, 9);
    let only_a = apply_dual_op(&a, &b, &OperationRequest::blend(1.0, 0.0)).unwrap();
    let only_b = apply_dual_op(&a, &b, &OperationRequest::blend(0.0, 1.0)).unwrap();
    assert_eq!(only_a.buffer, a);
    assert_eq!(only_b.buffer, b);
}

#[test]
fn no_filter_is_identity() {
    init_logger();
    for channels in [1u8, 3, 4] {
        let image = noise(13, 9, channels, channels as u32);
        let out = apply_filter(&image, &FilterRequest::new("noFilter")).unwrap();
        assert_eq!(out.buffer, image);
    }
}

#[test]
fn gaussian_even_kernel_matches_next_odd() {
    init_logger();
    let image = checkerboard(24, 24, 3, 3);
    let four = apply_filter(&image, &FilterRequest::new("GaussianBlur").with_param("ksizeX", 4)).unwrap();
    let five = apply_filter(&image, &FilterRequest::new("GaussianBlur").with_param("ksizeX", 5)).unwrap();
    assert_eq!(four.buffer, five.buffer);
}

#[test]
fn unknown_filter_fails_cleanly() {
    init_logger();
    let baseline = live_mat_count();
    let image = gradient(8, 8, 4);
    let err = apply_filter(&image, &FilterRequest::new("doesNotExist")).unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedFilter(ref name) if name == "doesNotExist"));
    assert_eq!(live_mat_count(), baseline);
}

#[test]
fn invalid_parameter_names_the_offender() {
    init_logger();
    let image = gradient(8, 8, 3);
    let err = apply_filter(&image, &FilterRequest::new("medianBlur").with_param("ksize", 40)).unwrap_err();
    match err {
        TransformError::InvalidParameter { name, value, .. } => {
            assert_eq!(name, "ksize");
            assert_eq!(value, "40");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn every_invocation_returns_counter_to_baseline() {
    init_logger();
    let baseline = live_mat_count();
    let image = checkerboard(20, 14, 4, 4);
    let other = gradient(11, 17, 3);

    for spec in filter_catalog() {
        for gray in [false, true] {
            let request = FilterRequest::new(spec.name).with_grayscale(gray);
            let out = apply_filter(&image, &request).unwrap();
            assert_eq!(out.buffer.dimensions(), (20, 14), "{}", spec.name);
            assert_eq!(out.buffer.channels, 4, "{}", spec.name);
            assert_eq!(live_mat_count(), baseline, "{} leaked", spec.name);
        }
    }
    for kind in OperationKind::ALL {
        for gray in [false, true] {
            let request = OperationRequest::new(kind).with_grayscale(gray);
            apply_dual_op(&image, &other, &request).unwrap();
            assert_eq!(live_mat_count(), baseline, "{kind} leaked");
        }
    }

    // failures too
    let _ = apply_filter(&image, &FilterRequest::new("Sobel").with_param("dx", 0).with_param("dy", 0));
    let _ = apply_dual_op(&image, &other, &OperationRequest::blend(2.0, 0.0));
    assert_eq!(live_mat_count(), baseline);
}

#[test]
fn edge_filters_respond_to_edges_only() {
    init_logger();
    let flat = RasterBuffer::filled(10, 10, 3, 120).unwrap();
    for name in ["Sobel", "Scharr", "Laplacian"] {
        let out = apply_filter(&flat, &FilterRequest::new(name)).unwrap();
        assert!(out.buffer.pixels.iter().all(|&v| v == 0), "{name}");
    }
    let board = checkerboard(16, 16, 4, 3);
    let edges = apply_filter(&board, &FilterRequest::new("Sobel")).unwrap();
    assert!(edges.buffer.pixels.iter().any(|&v| v > 0));
}

#[test]
fn smoothing_reduces_variation() {
    init_logger();
    let image = noise(32, 32, 1, 5);
    let spread = |buffer: &RasterBuffer| {
        let mean = buffer.pixels.iter().map(|&v| v as f64).sum::<f64>() / buffer.pixels.len() as f64;
        buffer.pixels.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>()
    };
    for request in [
        FilterRequest::new("blur"),
        FilterRequest::new("GaussianBlur").with_param("sigmaX", 2.0),
        FilterRequest::new("medianBlur").with_param("ksize", 5),
        FilterRequest::new("bilateralFilter"),
    ] {
        let out = apply_filter(&image, &request).unwrap();
        assert!(spread(&out.buffer) < spread(&image), "{}", request.filter_name);
    }
}

#[test]
fn requests_round_trip_through_json() {
    init_logger();
    let request: OperationRequest =
        serde_json::from_str(r#"{"kind":"blend","alpha":0.25,"beta":0.75}"#).unwrap();
    let a = RasterBuffer::filled(4, 4, 3, 200).unwrap();
    let b = RasterBuffer::filled(4, 4, 3, 40).unwrap();
    let out = apply_dual_op(&a, &b, &request).unwrap();
    // 0.25 * 200 + 0.75 * 40 = 80
    assert!(out.buffer.pixels.iter().all(|&v| v == 80));

    let filter: FilterRequest =
        serde_json::from_str(r#"{"filterName":"dilate","parameters":{"ksizeX":5,"ksizeY":1}}"#).unwrap();
    assert!(apply_filter(&a, &filter).is_ok());
}

#[test]
fn jpeg_output_is_configurable() {
    init_logger();
    let options = TransformOptions::new().with_encoding(EncodeFormat::Jpeg { quality: 60 });
    let out = apply_dual_op_with(
        &gradient(20, 20, 4),
        &gradient(20, 20, 4),
        &OperationRequest::new(OperationKind::Or),
        &options,
    )
    .unwrap();
    assert_eq!(out.encoded.mime_type(), "image/jpeg");
    assert_eq!(&out.encoded.bytes[0..2], &[0xFF, 0xD8]);
    assert_eq!(out.buffer.channels, 4);
}

#[test]
fn invocations_run_concurrently() {
    init_logger();
    let handles: Vec<_> = (0..4u32)
        .map(|seed| {
            thread::spawn(move || {
                let baseline = live_mat_count();
                let a = noise(30, 20, 3, seed);
                let b = noise(20, 30, 4, seed + 10);
                let dual = apply_dual_op(&a, &b, &OperationRequest::blend(0.5, 0.5)).unwrap();
                let filtered = apply_filter(&dual.buffer, &FilterRequest::new("GaussianBlur")).unwrap();
                assert_eq!(live_mat_count(), baseline);
                filtered.buffer
            })
        })
        .collect();

    for handle in handles {
        let buffer = handle.join().unwrap();
        assert_eq!(buffer.dimensions(), (30, 30));
        assert_eq!(buffer.channels, 4);
    }
}
