// Watermark store, compositor and upload-time watermarking

use bytes::Bytes;
use image::{DynamicImage, Rgba, RgbaImage};
use mediacdn::metrics::WatermarkOutcome;
use mediacdn::upload::{UploadFile, UploadOptions};
use mediacdn::watermark::{
    apply_watermark, decode_logo, WatermarkPosition, WatermarkSpec, WatermarkUpdate,
};
use rstest::rstest;

use super::test_harness::{gradient_jpeg, logo_png, solid_png_rgba, webp_dimensions, Harness};

fn spec(position: WatermarkPosition, opacity: f32) -> WatermarkSpec {
    WatermarkSpec {
        position,
        opacity,
        scale_percent: 20,
        padding: 10,
    }
}

fn blue_base(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 255])))
}

#[test]
fn test_bottom_right_placement_and_scale() {
    // 1000x200 logo on a 2000x1000 base: capped at 400x80
    let logo = decode_logo(&logo_png(1000, 200)).unwrap();
    let marked = apply_watermark(blue_base(2000, 1000), &logo, &spec(WatermarkPosition::BottomRight, 0.5))
        .unwrap()
        .to_rgba8();

    // Logo occupies x in 1590..1990, y in 910..990
    let inside = marked.get_pixel(1700, 950);
    assert!((120..=135).contains(&inside[0]), "red channel {}", inside[0]);
    assert!((120..=135).contains(&inside[2]), "blue channel {}", inside[2]);

    assert_eq!(marked.get_pixel(1585, 950), &Rgba([0, 0, 255, 255]));
    assert_eq!(marked.get_pixel(1700, 905), &Rgba([0, 0, 255, 255]));
    assert_eq!(marked.get_pixel(1995, 995), &Rgba([0, 0, 255, 255]));
}

#[rstest]
#[case(WatermarkPosition::TopLeft, (15, 15), (5, 5))]
#[case(WatermarkPosition::TopRight, (185, 15), (195, 5))]
#[case(WatermarkPosition::BottomLeft, (15, 85), (5, 95))]
#[case(WatermarkPosition::Center, (100, 50), (5, 5))]
fn test_anchor_positions(
    #[case] position: WatermarkPosition,
    #[case] covered: (u32, u32),
    #[case] untouched: (u32, u32),
) {
    // 20x20 logo stays native size on a 200x100 base (cap is 40px)
    let logo = decode_logo(&logo_png(20, 20)).unwrap();
    let marked = apply_watermark(blue_base(200, 100), &logo, &spec(position, 1.0))
        .unwrap()
        .to_rgba8();

    assert_eq!(marked.get_pixel(covered.0, covered.1)[0], 255);
    assert_eq!(marked.get_pixel(untouched.0, untouched.1), &Rgba([0, 0, 255, 255]));
}

#[test]
fn test_zero_opacity_leaves_base_untouched() {
    let base = blue_base(300, 300);
    let logo = decode_logo(&logo_png(50, 50)).unwrap();
    let marked = apply_watermark(base.clone(), &logo, &spec(WatermarkPosition::Center, 0.0)).unwrap();
    assert_eq!(marked.to_rgba8(), base.to_rgba8());
}

#[test]
fn test_opaque_base_stays_opaque() {
    let base = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(100, 100, image::Rgb([1, 2, 3])));
    let logo = decode_logo(&logo_png(10, 10)).unwrap();
    let marked = apply_watermark(base, &logo, &spec(WatermarkPosition::TopLeft, 0.7)).unwrap();
    assert!(!marked.color().has_alpha());
}

#[tokio::test]
async fn test_upload_with_active_watermark() {
    let h = Harness::new();
    h.watermarks
        .set_logo(
            "logo.png",
            logo_png(1000, 200),
            WatermarkUpdate {
                position: Some(WatermarkPosition::BottomRight),
                opacity: Some(0.5),
                scale_percent: Some(20),
                padding: Some(10),
            },
        )
        .unwrap();

    let record = h
        .service
        .uploads()
        .upload_single(
            UploadFile::new("banner.png", solid_png_rgba(2000, 1000, [0, 0, 255, 255])),
            &UploadOptions::new("media").with_watermark(true),
        )
        .await
        .unwrap();

    assert_eq!(record.mime_type, "image/webp");
    let stored = h.store.object("media", &record.object_name).unwrap();
    assert_eq!(webp_dimensions(&stored.data), (2000, 1000));
}

#[tokio::test]
async fn test_convert_reports_watermark_outcome() {
    let h = Harness::new();
    let jpeg = Bytes::from(gradient_jpeg(500, 300));

    let skipped = h
        .service
        .convert_and_maybe_watermark(jpeg.clone(), true)
        .await
        .unwrap();
    assert_eq!(skipped.watermark, WatermarkOutcome::Skipped);

    h.watermarks
        .set_logo("logo.png", logo_png(50, 20), WatermarkUpdate::default())
        .unwrap();
    let applied = h
        .service
        .convert_and_maybe_watermark(jpeg.clone(), true)
        .await
        .unwrap();
    assert_eq!(applied.watermark, WatermarkOutcome::Applied);
    assert_eq!((applied.width, applied.height), (500, 300));

    let not_requested = h
        .service
        .convert_and_maybe_watermark(jpeg.clone(), false)
        .await
        .unwrap();
    assert_eq!(not_requested.watermark, WatermarkOutcome::Skipped);

    h.watermarks.toggle(false).unwrap();
    let inactive = h.service.convert_and_maybe_watermark(jpeg, true).await.unwrap();
    assert_eq!(inactive.watermark, WatermarkOutcome::Skipped);
}

#[test]
fn test_store_rejects_non_png_logo() {
    let h = Harness::new();
    let err = h
        .watermarks
        .set_logo("logo.jpg", Bytes::from(gradient_jpeg(10, 10)), WatermarkUpdate::default())
        .unwrap_err();
    assert_eq!(err.to_http_status(), 400);
    assert!(!h.watermarks.config().has_logo);
}
