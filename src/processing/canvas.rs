use anyhow::{Context, Result};
use fast_image_resize as fir;
use image::{Rgba, RgbaImage, imageops};

use crate::processing::layout::{FitMode, VisibleCrop, place, visible_crop};

/// CPU raster the renderer paints into; the viewer uploads it to the GPU.
pub struct Canvas {
    pixels: RgbaImage,
    resizer: fir::Resizer,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
            resizer: fir::Resizer::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Reallocate the backing raster. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    /// Scale `source` with `fit`, center it, and composite it over the canvas.
    pub fn draw_fitted(&mut self, source: &RgbaImage, fit: FitMode) -> Result<()> {
        anyhow::ensure!(
            source.width() > 0 && source.height() > 0,
            "cannot draw an image without dimensions"
        );
        let placement = place(
            fit,
            self.width(),
            self.height(),
            source.width(),
            source.height(),
        );
        let Some(crop) = visible_crop(
            placement,
            self.width(),
            self.height(),
            source.width(),
            source.height(),
        ) else {
            return Ok(());
        };
        let resized = self.resize_rgba(source, &crop)?;
        imageops::overlay(
            &mut self.pixels,
            &resized,
            i64::from(crop.dst_x),
            i64::from(crop.dst_y),
        );
        Ok(())
    }

    /// Resize only the visible part of `source` into a buffer no larger than the canvas.
    fn resize_rgba(&mut self, source: &RgbaImage, crop: &VisibleCrop) -> Result<RgbaImage> {
        let whole = crop.is_whole_source(source.width(), source.height());
        if whole && source.dimensions() == (crop.dst_width, crop.dst_height) {
            return Ok(source.clone());
        }

        let src_view = fir::images::ImageRef::new(
            source.width(),
            source.height(),
            source.as_raw(),
            fir::PixelType::U8x4,
        )
        .context("failed to create source view for frame resize")?;
        let mut dst_image =
            fir::images::Image::new(crop.dst_width, crop.dst_height, fir::PixelType::U8x4);
        let mut options = fir::ResizeOptions::new()
            .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
        if !whole {
            options = options.crop(crop.src_left, crop.src_top, crop.src_width, crop.src_height);
        }
        self.resizer
            .resize(&src_view, &mut dst_image, Some(&options))
            .context("frame resize failed")?;
        RgbaImage::from_raw(crop.dst_width, crop.dst_height, dst_image.into_vec())
            .context("failed to construct resized RGBA frame")
    }
}
