mod client;
mod download;
mod types;
mod urls;

pub use client::CircleCiClient;
pub use download::{DownloadParams, Downloader};
pub use types::{JobStatus, RawJobResult, StatusFilter};
