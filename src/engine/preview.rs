use anyhow::{Context, Result};
use egui::ColorImage;
use reqwest::blocking::Client;

/// Fetches a generated image so the UI can show it as a texture.
pub trait PreviewLoader {
    fn load(&self, url: &str) -> Result<ColorImage>;
}

pub struct HttpPreviewLoader {
    http: Client,
}

impl HttpPreviewLoader {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(None)
            .build()
            .context("building preview client")?;
        Ok(Self { http })
    }
}

impl PreviewLoader for HttpPreviewLoader {
    fn load(&self, url: &str) -> Result<ColorImage> {
        let bytes = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .with_context(|| format!("downloading {url}"))?;

        decode_preview(&bytes)
    }
}

pub fn decode_preview(bytes: &[u8]) -> Result<ColorImage> {
    let img = image::load_from_memory(bytes).context("unrecognised image data")?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];

    Ok(ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_raw(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_png_into_matching_size() {
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([200, 10, 10, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();

        let color = decode_preview(buf.get_ref()).unwrap();

        assert_eq!(color.size, [2, 3]);
        assert_eq!(color.pixels.len(), 6);
    }

    #[test]
    fn garbage_is_an_error() {
        let err = decode_preview(b"<html>not an image</html>").unwrap_err();
        assert!(format!("{err:#}").contains("unrecognised image data"));
    }
}
