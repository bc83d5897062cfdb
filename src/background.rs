use crate::error::*;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use log::info;
use std::path::PathBuf;

/// Where the background template comes from. Accepts the same kinds of
/// reference an image element does.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundSource {
    File(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

impl BackgroundSource {
    /// `http(s)://...` is fetched, `data:...;base64,...` is decoded in place,
    /// anything else is a file path.
    pub fn parse(reference: &str) -> TkbResult<BackgroundSource> {
        let reference = reference.trim();

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(BackgroundSource::Url(reference.to_string()));
        }

        if let Some(data) = reference.strip_prefix("data:") {
            let (header, payload) = data
                .split_once(',')
                .ok_or_else(|| TkbError::BackgroundDecode("data URI without payload".to_string()))?;

            if !header.ends_with(";base64") {
                return Err(TkbError::BackgroundDecode(
                    "only base64 data URIs are supported".to_string(),
                ));
            }

            let bytes = STANDARD
                .decode(payload.trim())
                .map_err(|e| TkbError::BackgroundDecode(e.to_string()))?;

            return Ok(BackgroundSource::Bytes(bytes));
        }

        Ok(BackgroundSource::File(PathBuf::from(reference)))
    }

    pub fn describe(&self) -> String {
        match self {
            BackgroundSource::File(path) => path.display().to_string(),
            BackgroundSource::Url(url) => url.clone(),
            BackgroundSource::Bytes(bytes) => format!("<{} inline bytes>", bytes.len()),
        }
    }
}

async fn read_background_bytes(source: &BackgroundSource) -> TkbResult<Vec<u8>> {
    match source {
        BackgroundSource::File(path) => Ok(tokio::fs::read(path).await?),
        BackgroundSource::Url(url) => {
            let response = reqwest::get(url).await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        }
        BackgroundSource::Bytes(bytes) => Ok(bytes.clone()),
    }
}

/// Loads and decodes the background. Any failure here fails the render.
pub async fn load_background(source: &BackgroundSource) -> TkbResult<RgbaImage> {
    info!("Loading background template from {}", source.describe());

    let bytes = read_background_bytes(source).await?;
    let image = image::load_from_memory(&bytes)?;

    Ok(image.to_rgba8())
}
