use super::{EncodeSettings, ImageCodec, PngCompression};
use crate::core::OutputFormat;
use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// `image` クレートによる標準コーデック実装
///
/// WebPは `image` クレートが提供するロスレスエンコーダーを使う。
#[derive(Clone, Debug, Default)]
pub struct StandardCodec;

impl StandardCodec {
    pub fn new() -> Self {
        Self
    }

    fn png_compression(compression: PngCompression) -> CompressionType {
        match compression {
            PngCompression::BestSpeed => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::BestCompression => CompressionType::Best,
        }
    }
}

impl ImageCodec for StandardCodec {
    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        ImageReader::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Failed to guess image format: {}", path.display()))?
            .into_dimensions()
            .with_context(|| format!("Failed to read image header: {}", path.display()))
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        ImageReader::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Failed to guess image format: {}", path.display()))?
            .decode()
            .with_context(|| format!("Failed to load image from path: {}", path.display()))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        match format {
            OutputFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    Self::png_compression(settings.png_compression),
                    FilterType::Adaptive,
                );
                image.write_with_encoder(encoder).context("PNG encode failed")?;
            }
            OutputFormat::Jpg | OutputFormat::Jpeg => {
                // JPEGはアルファを持てないのでRGBに落とす
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut buffer, settings.quality.clamp(1, 100));
                rgb.write_with_encoder(encoder).context("JPEG encode failed")?;
            }
            OutputFormat::Webp => {
                let raster = if image.color().has_alpha() {
                    DynamicImage::ImageRgba8(image.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(image.to_rgb8())
                };
                let encoder = WebPEncoder::new_lossless(&mut buffer);
                raster.write_with_encoder(encoder).context("WebP encode failed")?;
            }
        }

        Ok(buffer)
    }
}
