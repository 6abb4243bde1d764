use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use mediacdn::config::Config;
use mediacdn::service::MediaService;
use mediacdn::storage::S3ObjectStore;
use mediacdn::upload::{UploadFile, UploadOptions};
use mediacdn::watermark::WatermarkStore;

/// mediacdn - image variants, watermarking and uploads over S3/MinIO
#[derive(Parser, Debug)]
#[command(name = "mediacdn")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive an image variant from a stored original
    Transform {
        /// Bucket of the original (defaults to storage.default_bucket)
        #[arg(long)]
        bucket: Option<String>,
        /// Object key of the original
        #[arg(long)]
        path: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// webp, jpeg, jpg, png or gif
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        quality: Option<u8>,
        /// contain, cover, fill or inside
        #[arg(long)]
        fit: Option<String>,
        /// top, bottom, left, right, center or entropy
        #[arg(long)]
        crop: Option<String>,
        /// Where to write the variant
        #[arg(long)]
        out: PathBuf,
    },
    /// Upload files, converting images to WebP
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        bucket: Option<String>,
        /// Key prefix inside the bucket
        #[arg(long, default_value = "")]
        folder: String,
        /// Apply the configured watermark to images
        #[arg(long)]
        watermark: bool,
    },
    /// Validate the configuration file and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    mediacdn::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    tracing::info!(
        config_file = %args.config.display(),
        endpoint = config.storage.endpoint.as_deref().unwrap_or("aws"),
        default_bucket = %config.storage.default_bucket,
        cdn_domain = %config.cdn.domain,
        "Configuration loaded successfully"
    );

    match args.command {
        Command::CheckConfig => {
            println!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        Command::Transform {
            bucket,
            path,
            width,
            height,
            format,
            quality,
            fit,
            crop,
            out,
        } => {
            let bucket = bucket.unwrap_or_else(|| config.storage.default_bucket.clone());
            let mut query = HashMap::new();
            let pairs = [
                ("w", width.map(|v| v.to_string())),
                ("h", height.map(|v| v.to_string())),
                ("format", format),
                ("quality", quality.map(|v| v.to_string())),
                ("fit", fit),
                ("crop", crop),
            ];
            for (key, value) in pairs {
                if let Some(value) = value {
                    query.insert(key.to_string(), value);
                }
            }

            let service = build_service(config, WatermarkStore::new()).await?;
            let outcome = service.transform_query(&bucket, &path, &query).await?;

            std::fs::write(&out, &outcome.data)
                .with_context(|| format!("Failed to write {}", out.display()))?;

            for (name, value) in outcome.headers() {
                println!("{}: {}", name, value);
            }
            println!("X-Cache-Key: {}", outcome.cache_key);
            Ok(())
        }
        Command::Upload {
            files,
            bucket,
            folder,
            watermark,
        } => {
            let watermarks = WatermarkStore::from_settings(&config.watermark)?;
            let options = UploadOptions::new(
                bucket.unwrap_or_else(|| config.storage.default_bucket.clone()),
            )
            .with_folder(folder)
            .with_watermark(watermark);

            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                let data = std::fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                uploads.push(UploadFile::new(filename, data));
            }

            let service = build_service(config, watermarks).await?;
            let report = service.uploads().upload_batch(uploads, &options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if report.success {
                Ok(())
            } else {
                Err(anyhow!("No file was uploaded"))
            }
        }
    }
}

async fn build_service(config: Config, watermarks: WatermarkStore) -> Result<MediaService> {
    let store = S3ObjectStore::from_config(&config.storage).await?;
    Ok(MediaService::new(Arc::new(store), Arc::new(watermarks), config))
}
