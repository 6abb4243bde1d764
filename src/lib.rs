// mediacdn library: image variants, watermarking and uploads over object storage

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod service;
pub mod storage;
pub mod transform;
pub mod upload;
pub mod urls;
pub mod watermark;
