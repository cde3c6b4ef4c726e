//! In-process MuPDF rasterizer

use std::io::Cursor;

use async_trait::async_trait;
use image::DynamicImage;
use mupdf::{Colorspace, Document, Matrix};

use super::{PageImage, PageRasterizer, RasterizeError};

/// PDF user space is 72 points per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Renders pages with MuPDF on a blocking thread
pub struct MupdfRasterizer {
    dpi: u32,
}

impl MupdfRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

impl From<mupdf::Error> for RasterizeError {
    fn from(err: mupdf::Error) -> Self {
        RasterizeError::RenderError(err.to_string())
    }
}

#[async_trait]
impl PageRasterizer for MupdfRasterizer {
    async fn rasterize(&self, pdf_data: &[u8]) -> Result<Vec<PageImage>, RasterizeError> {
        let data = pdf_data.to_vec();
        let scale = self.dpi as f32 / POINTS_PER_INCH;

        // fz_context is not thread-safe, so the document lives and dies on
        // one blocking thread
        tokio::task::spawn_blocking(move || {
            let doc = Document::from_bytes(&data, "application/pdf")?;
            let page_count = doc.page_count()?;

            let matrix = Matrix::new_scale(scale, scale);
            let colorspace = Colorspace::device_rgb();

            let mut pages = Vec::with_capacity(page_count.max(0) as usize);
            for index in 0..page_count {
                let page = doc.load_page(index)?;
                let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;
                pages.push(PageImage {
                    page: index as usize + 1,
                    data: encode_png(&pixmap)?,
                });
            }

            Ok::<_, RasterizeError>(pages)
        })
        .await
        .map_err(|e| RasterizeError::RenderError(format!("Task join error: {}", e)))?
    }
}

fn encode_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, RasterizeError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);
    for pixel in samples.chunks(n.max(1)) {
        let r = pixel.first().copied().unwrap_or(0);
        let g = pixel.get(1).copied().unwrap_or(r);
        let b = pixel.get(2).copied().unwrap_or(r);
        rgb_buffer.extend_from_slice(&[r, g, b]);
    }

    let img = image::RgbImage::from_raw(width, height, rgb_buffer).ok_or_else(|| {
        RasterizeError::RenderError("Failed to create image buffer".to_string())
    })?;

    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| RasterizeError::RenderError(e.to_string()))?;

    Ok(output)
}
