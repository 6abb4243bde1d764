// Upload orchestration through MediaService against the memory store

use mediacdn::config::Config;
use mediacdn::error::MediaError;
use mediacdn::upload::{FileType, UploadFile, UploadOptions};

use super::test_harness::{gradient_jpeg, solid_png_rgba, webp_dimensions, Harness};

#[tokio::test]
async fn test_mixed_batch() {
    let h = Harness::new();
    let files = vec![
        UploadFile::new("cover.jpg", gradient_jpeg(300, 200)),
        UploadFile::new("icon.png", solid_png_rgba(16, 16, [0, 128, 0, 200])),
        UploadFile::new("trailer.webm", b"webm bytes".to_vec()),
        UploadFile::new("notes.txt", b"hello".to_vec()),
    ];

    let report = h
        .service
        .uploads()
        .upload_batch(files, &UploadOptions::new("media").with_folder("posts/42"))
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.uploaded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].filename, "notes.txt");
    assert_eq!(h.store.object_count(), 3);

    let cover = &report.results[0];
    assert_eq!(cover.original_filename, "cover.jpg");
    assert_eq!(cover.file_type, FileType::Image);
    assert!(cover.object_name.starts_with("posts/42/"));
    assert!(cover.object_name.ends_with(".webp"));
    let stored = h.store.object("media", &cover.object_name).unwrap();
    assert_eq!(stored.content_type, "image/webp");
    assert_eq!(webp_dimensions(&stored.data), (300, 200));

    let trailer = &report.results[2];
    assert_eq!(trailer.file_type, FileType::Video);
    assert_eq!(trailer.mime_type, "video/webm");
    assert_eq!(
        h.store.object("media", &trailer.object_name).unwrap().data,
        "webm bytes"
    );
}

#[tokio::test]
async fn test_object_name_format() {
    let h = Harness::new();
    let record = h
        .service
        .uploads()
        .upload_single(UploadFile::new("a.mov", b"x".to_vec()), &UploadOptions::new("media"))
        .await
        .unwrap();

    // 20240131_235959_0123456789abcdef.mov
    let name = &record.filename;
    assert_eq!(name.len(), 15 + 1 + 16 + 4);
    assert_eq!(&name[8..9], "_");
    assert!(name[..8].chars().all(|c| c.is_ascii_digit()));
    assert!(name[16..32].chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(record.object_name, *name);
}

#[tokio::test]
async fn test_identical_content_gets_identical_hash() {
    let h = Harness::new();
    let data = gradient_jpeg(40, 40);
    let report = h
        .service
        .uploads()
        .upload_batch(
            vec![
                UploadFile::new("one.jpg", data.clone()),
                UploadFile::new("two.jpg", data),
            ],
            &UploadOptions::new("media"),
        )
        .await
        .unwrap();

    let hash = |name: &str| name[16..32].to_string();
    assert_eq!(
        hash(&report.results[0].filename),
        hash(&report.results[1].filename)
    );
}

#[tokio::test]
async fn test_configured_limits_apply() {
    let mut config = Config::default();
    config.upload.max_files_per_request = 2;
    config.upload.allowed_video_extensions = vec![".mp4".to_string()];
    let h = Harness::with_config(config);

    let three: Vec<UploadFile> = (0..3)
        .map(|i| UploadFile::new(format!("{}.mp4", i), b"x".to_vec()))
        .collect();
    let err = h
        .service
        .uploads()
        .upload_batch(three, &UploadOptions::new("media"))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::UploadRejected(_)));
    assert_eq!(err.to_http_status(), 400);

    let err = h
        .service
        .uploads()
        .upload_single(UploadFile::new("clip.mkv", b"x".to_vec()), &UploadOptions::new("media"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Upload rejected: File type not allowed: .mkv");
}

#[tokio::test]
async fn test_report_serializes() {
    let h = Harness::new();
    let report = h
        .service
        .uploads()
        .upload_batch(
            vec![UploadFile::new("p.jpg", gradient_jpeg(20, 10))],
            &UploadOptions::new("media"),
        )
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["uploaded"], 1);
    assert_eq!(json["results"][0]["file_type"], "image");
    assert_eq!(json["results"][0]["dimensions"]["width"], 20);
    assert!(json["results"][0]["transform_urls"]["preview"]
        .as_str()
        .unwrap()
        .ends_with("?w=800&format=webp"));
}
