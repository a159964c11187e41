//! Resolves `<img src>` references to picture bytes, or to a placeholder text.

use crate::docx::{ImageFormat, Picture, EMU_PER_INCH};
use crate::style::StyleDeclaration;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use url::Url;

pub const INCHES_PER_PIXEL: f64 = 0.0104166667;
pub const DEFAULT_WIDTH_PX: f64 = 200.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Picture(Picture),
    Placeholder(String),
}

#[derive(Debug, Clone)]
pub struct ImageResolver {
    pub fetch_remote: bool,
    /// Directory local references are resolved against.
    pub root: Option<PathBuf>,
    pub default_width_px: f64,
}

impl Default for ImageResolver {
    fn default() -> Self {
        ImageResolver {
            fetch_remote: true,
            root: None,
            default_width_px: DEFAULT_WIDTH_PX,
        }
    }
}

/// Not a URL validator: only tells a remote reference (scheme, authority and path) from a
/// file path.
pub fn is_remote(src: &str) -> bool {
    match Url::parse(src) {
        Ok(url) => {
            url.host_str().is_some_and(|h| !h.is_empty()) && !url.path().is_empty()
        }
        Err(_) => false,
    }
}

/// Last path component of a reference, never any of its directories.
pub fn file_name(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

pub fn pixels_to_inches(pixels: f64) -> f64 {
    pixels * INCHES_PER_PIXEL
}

impl ImageResolver {
    pub fn resolve(&self, src: &str, style: &StyleDeclaration) -> ImageOutcome {
        let remote = is_remote(src);
        let bytes = if remote {
            self.fetch(src)
        } else {
            self.read_local(src)
        };

        if let Some(picture) = bytes.and_then(|b| self.picture(b, style)) {
            return ImageOutcome::Picture(picture);
        }

        let shown = if remote { src } else { file_name(src) };
        log::warn!("image unavailable, inserting placeholder for {shown}");
        ImageOutcome::Placeholder(format!("<image: {shown}>"))
    }

    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        if !self.fetch_remote {
            return None;
        }
        let response = match reqwest::blocking::get(url) {
            Ok(r) => r,
            Err(err) => {
                log::debug!("fetch {url}: {err}");
                return None;
            }
        };
        if !response.status().is_success() {
            log::debug!("fetch {url}: status {}", response.status());
            return None;
        }
        match response.bytes() {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(err) => {
                log::debug!("fetch {url}: {err}");
                None
            }
        }
    }

    fn read_local(&self, src: &str) -> Option<Vec<u8>> {
        let path = match &self.root {
            Some(root) => root.join(src),
            None => Path::new(src).to_path_buf(),
        };
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::debug!("read {}: {err}", path.display());
                None
            }
        }
    }

    fn picture(&self, data: Vec<u8>, style: &StyleDeclaration) -> Option<Picture> {
        let reader = image::ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .ok()?;
        let format = match reader.format()? {
            image::ImageFormat::Png => ImageFormat::Png,
            image::ImageFormat::Jpeg => ImageFormat::Jpeg,
            image::ImageFormat::Gif => ImageFormat::Gif,
            image::ImageFormat::Bmp => ImageFormat::Bmp,
            other => {
                log::debug!("unsupported image format {other:?}");
                return None;
            }
        };
        let (px_w, px_h) = match reader.into_dimensions() {
            Ok(dims) => dims,
            Err(err) => {
                log::debug!("undecodable image: {err}");
                return None;
            }
        };
        if px_w == 0 {
            return None;
        }

        let width_px = style
            .get("width")
            .and_then(|w| w.trim_end_matches("px").parse::<f64>().ok())
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width_px);
        let width = (pixels_to_inches(width_px) * EMU_PER_INCH).round() as u64;
        let height = (width as f64 * px_h as f64 / px_w as f64).round() as u64;

        Some(Picture {
            data,
            format,
            width,
            height,
        })
    }
}
