// On-demand transform through MediaService, end to end

use std::collections::HashMap;

use mediacdn::transform::{cache_key, CropMode, FitMode, OutputFormat, TransformRequest};
use rstest::rstest;

use super::test_harness::{gradient_jpeg, solid_png_rgba, webp_dimensions, Harness};

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn decoded_dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn test_width_only_preserves_aspect() {
    let h = Harness::new();
    h.store.insert("media", "wide.jpg", gradient_jpeg(1000, 500), "image/jpeg");

    let outcome = h
        .service
        .transform_query("media", "wide.jpg", &query(&[("w", "400")]))
        .await
        .unwrap();

    assert_eq!((outcome.width, outcome.height), (400, 200));
    assert_eq!(outcome.content_type, "image/jpeg");
    assert_eq!(decoded_dimensions(&outcome.data), (400, 200));
}

#[rstest]
#[case(FitMode::Contain, (1000, 500), (300, 300), (300, 150))]
#[case(FitMode::Contain, (200, 100), (400, 400), (200, 100))]
#[case(FitMode::Cover, (1000, 500), (300, 300), (300, 300))]
#[case(FitMode::Fill, (1000, 500), (123, 456), (123, 456))]
#[case(FitMode::Inside, (200, 100), (400, 400), (200, 100))]
#[case(FitMode::Inside, (1000, 500), (400, 400), (400, 200))]
#[tokio::test]
async fn test_fit_modes(
    #[case] fit: FitMode,
    #[case] source: (u32, u32),
    #[case] target: (u32, u32),
    #[case] expected: (u32, u32),
) {
    let h = Harness::new();
    h.store.insert("media", "src.jpg", gradient_jpeg(source.0, source.1), "image/jpeg");

    let request = TransformRequest::new()
        .with_width(target.0)
        .with_height(target.1)
        .with_fit(fit)
        .with_format(OutputFormat::Png);
    let outcome = h.service.transform("media", "src.jpg", &request).await.unwrap();

    assert_eq!((outcome.width, outcome.height), expected);
    assert_eq!(decoded_dimensions(&outcome.data), expected);
    assert!(outcome.width <= target.0.max(source.0));
}

#[tokio::test]
async fn test_cover_center_webp_scenario() {
    let h = Harness::new();
    h.store.insert("media", "photo.jpg", gradient_jpeg(800, 600), "image/jpeg");

    let params = query(&[
        ("w", "400"),
        ("h", "300"),
        ("fit", "cover"),
        ("crop", "center"),
        ("format", "webp"),
        ("quality", "90"),
    ]);
    let outcome = h
        .service
        .transform_query("media", "photo.jpg", &params)
        .await
        .unwrap();

    assert_eq!((outcome.width, outcome.height), (400, 300));
    assert_eq!(outcome.content_type, "image/webp");
    assert_eq!(webp_dimensions(&outcome.data), (400, 300));

    let expected_request = TransformRequest::new()
        .with_width(400)
        .with_height(300)
        .with_fit(FitMode::Cover)
        .with_crop(CropMode::Center)
        .with_format(OutputFormat::WebP)
        .with_quality(90);
    assert_eq!(outcome.cache_key, cache_key("media", "photo.jpg", &expected_request));
}

#[rstest]
#[case("left", (600, 600))]
#[case("center", (600, 600))]
#[case("entropy", (600, 600))]
#[case("sideways", (800, 600))]
#[tokio::test]
async fn test_crop_runs_before_resize(#[case] crop: &str, #[case] expected: (u32, u32)) {
    let h = Harness::new();
    h.store.insert("media", "p.jpg", gradient_jpeg(800, 600), "image/jpeg");

    let outcome = h
        .service
        .transform_query("media", "p.jpg", &query(&[("crop", crop), ("format", "png")]))
        .await
        .unwrap();
    assert_eq!((outcome.width, outcome.height), expected);
}

#[tokio::test]
async fn test_unsupported_format_falls_back_to_webp() {
    let h = Harness::new();
    h.store.insert("media", "p.jpg", gradient_jpeg(64, 64), "image/jpeg");

    let outcome = h
        .service
        .transform_query("media", "p.jpg", &query(&[("format", "tiff")]))
        .await
        .unwrap();
    assert_eq!(outcome.content_type, "image/webp");
    assert_eq!(webp_dimensions(&outcome.data), (64, 64));
}

#[tokio::test]
async fn test_alpha_png_to_jpeg_is_flattened() {
    let h = Harness::new();
    h.store.insert(
        "media",
        "clear.png",
        solid_png_rgba(32, 32, [0, 0, 0, 0]),
        "image/png",
    );

    let outcome = h
        .service
        .transform_query("media", "clear.png", &query(&[("format", "jpg")]))
        .await
        .unwrap();
    assert_eq!(outcome.content_type, "image/jpeg");

    let img = image::load_from_memory(&outcome.data).unwrap().to_rgb8();
    let pixel = img.get_pixel(16, 16);
    assert!(pixel.0.iter().all(|&c| c > 245), "expected white, got {:?}", pixel);
}

#[rstest]
#[case(&[])]
#[case(&[("w", "0")])]
#[case(&[("w", "4001")])]
#[case(&[("h", "abc")])]
#[case(&[("w", "100"), ("quality", "101")])]
#[case(&[("fit", "cover")])]
#[tokio::test]
async fn test_invalid_parameters_are_client_errors(#[case] pairs: &[(&str, &str)]) {
    let h = Harness::new();
    h.store.insert("media", "p.jpg", gradient_jpeg(16, 16), "image/jpeg");

    let err = h
        .service
        .transform_query("media", "p.jpg", &query(pairs))
        .await
        .unwrap_err();
    assert_eq!(err.to_http_status(), 400);
}

#[tokio::test]
async fn test_headers_report_sizes() {
    let h = Harness::new();
    let original = gradient_jpeg(600, 400);
    let original_len = original.len();
    h.store.insert("media", "p.jpg", original, "image/jpeg");

    let outcome = h
        .service
        .transform_query("media", "p.jpg", &query(&[("w", "100"), ("format", "webp")]))
        .await
        .unwrap();

    let headers: HashMap<_, _> = outcome.headers().into_iter().collect();
    assert_eq!(headers["X-Original-Size"], original_len.to_string());
    assert_eq!(headers["X-Transformed-Size"], outcome.data.len().to_string());
    assert!(headers["X-Compression-Ratio"].ends_with('%'));
    assert_eq!(headers["Content-Type"], "image/webp");
}
