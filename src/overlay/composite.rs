//! Flattening bubble overlays onto panel images.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::debug;
use usvg::fontdb;

use super::OverlayError;
use super::layout::BubbleMetrics;
use super::svg::overlay_svg;
use crate::model::Bubble;

/// Flattens bubble overlays onto panel images.
///
/// The font database is loaded once and shared; cloning is cheap.
#[derive(Clone, Debug)]
pub struct Compositor {
    fontdb: Arc<fontdb::Database>,
    metrics: BubbleMetrics,
    canvas: u32,
}

impl Compositor {
    /// Compositor drawing onto a `canvas` x `canvas` square with `fontdb` for bubble text.
    pub fn new(fontdb: Arc<fontdb::Database>, canvas: u32) -> Self {
        Self {
            fontdb,
            metrics: BubbleMetrics::default(),
            canvas,
        }
    }

    /// Compositor using the fonts installed on this machine.
    pub fn with_system_fonts(canvas: u32) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!("Loaded {} font faces for bubble text", db.len());
        Self::new(Arc::new(db), canvas)
    }

    /// Replaces the sizing rules.
    pub fn with_metrics(mut self, metrics: BubbleMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Side length of the output image.
    pub fn canvas(&self) -> u32 {
        self.canvas
    }

    /// Overlay markup for the given bubbles.
    pub fn svg(&self, dialogues: &[Bubble], thoughts: &[Bubble]) -> String {
        overlay_svg(&self.metrics, dialogues, thoughts, self.canvas)
    }

    /// Decodes `source`, fits it into the canvas, draws the bubbles on top and
    /// returns PNG bytes.
    pub fn compose_png(
        &self,
        source: &[u8],
        dialogues: &[Bubble],
        thoughts: &[Bubble],
    ) -> Result<Vec<u8>, OverlayError> {
        let source = image::load_from_memory(source).map_err(OverlayError::Decode)?;
        let mut page = fit_to_canvas(&source, self.canvas);

        if !dialogues.is_empty() || !thoughts.is_empty() {
            let overlay = self.rasterize(&self.svg(dialogues, thoughts))?;
            imageops::overlay(&mut page, &overlay, 0, 0);
        }

        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(page)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(OverlayError::Encode)?;
        Ok(buf)
    }

    fn rasterize(&self, svg: &str) -> Result<RgbaImage, OverlayError> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts).map_err(OverlayError::Svg)?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(self.canvas, self.canvas).ok_or(
            OverlayError::Pixmap {
                width: self.canvas,
                height: self.canvas,
            },
        )?;
        resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let mut out = RgbaImage::new(self.canvas, self.canvas);
        for (pixel, premul) in out.pixels_mut().zip(pixmap.pixels()) {
            let color = premul.demultiply();
            *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
        }
        Ok(out)
    }
}

/// Scales `source` to fit inside the canvas keeping its aspect ratio and centers it
/// on a transparent square.
fn fit_to_canvas(source: &DynamicImage, canvas: u32) -> RgbaImage {
    let resized = source.resize(canvas, canvas, FilterType::Lanczos3).to_rgba8();
    let mut page = RgbaImage::from_pixel(canvas, canvas, Rgba([255, 255, 255, 0]));
    let x = (canvas.saturating_sub(resized.width())) / 2;
    let y = (canvas.saturating_sub(resized.height())) / 2;
    imageops::overlay(&mut page, &resized, i64::from(x), i64::from(y));
    page
}
