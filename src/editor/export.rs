//! Saving the edited comic as PNG.

use std::collections::HashMap;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage, imageops};
use tracing::info;

use super::Editor;
use crate::constants::GRID_FILENAME;
use crate::model::Panel;
use crate::overlay::{Compositor, OverlayError};

/// What to capture.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaptureTarget {
    /// Every panel at once.
    Grid,
    /// One panel by index.
    Panel(usize),
}

impl CaptureTarget {
    /// Suggested download name.
    pub fn filename(&self) -> String {
        match self {
            Self::Grid => GRID_FILENAME.to_string(),
            Self::Panel(index) => format!("panel-{}.png", index + 1),
        }
    }
}

/// Renders the editor's current view to PNG bytes.
///
/// Implementations see the editor with delete controls hidden.
pub trait Rasterizer {
    /// Why rendering failed.
    type Error;

    /// Renders `target` as PNG.
    fn rasterize(&mut self, editor: &Editor, target: CaptureTarget) -> Result<Vec<u8>, Self::Error>;
}

/// A rendered capture and the name to save it under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    /// Download name.
    pub filename: String,
    /// PNG bytes.
    pub png: Vec<u8>,
}

impl Editor {
    /// Captures `target` with `rasterizer`. Controls are hidden while it runs and
    /// restored afterwards whether or not it succeeds.
    pub fn export<R: Rasterizer>(
        &mut self,
        rasterizer: &mut R,
        target: CaptureTarget,
    ) -> Result<Export, R::Error> {
        let previous = self.controls_visible();
        self.set_controls_visible(false);
        let result = rasterizer.rasterize(self, target);
        self.set_controls_visible(previous);

        let png = result?;
        let filename = target.filename();
        info!("Exported {} ({} bytes)", filename, png.len());
        Ok(Export { filename, png })
    }
}

/// Renders panels with the server-side [`Compositor`] from already fetched
/// source images keyed by image URL.
#[derive(Clone, Debug)]
pub struct OverlayRasterizer {
    compositor: Compositor,
    sources: HashMap<String, Vec<u8>>,
}

impl OverlayRasterizer {
    /// Creates a rasterizer with no sources.
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            sources: HashMap::new(),
        }
    }

    /// Registers the bytes behind `image_url`.
    pub fn insert_source(&mut self, image_url: impl Into<String>, bytes: Vec<u8>) {
        self.sources.insert(image_url.into(), bytes);
    }

    fn panel_png(&self, panel: &Panel) -> Result<Vec<u8>, OverlayError> {
        let source = self
            .sources
            .get(&panel.image_url)
            .ok_or_else(|| OverlayError::MissingSource(panel.image_url.clone()))?;
        self.compositor
            .compose_png(source, &panel.dialogues, &panel.thoughts)
    }

    /// Stacks every composed panel top to bottom.
    fn grid_png(&self, panels: &[Panel]) -> Result<Vec<u8>, OverlayError> {
        let side = self.compositor.canvas();
        let count = u32::try_from(panels.len()).unwrap_or(u32::MAX).max(1);
        let mut grid = RgbaImage::new(side, side.saturating_mul(count));
        for (row, panel) in panels.iter().enumerate() {
            let png = self.panel_png(panel)?;
            let tile = image::load_from_memory(&png)
                .map_err(OverlayError::Decode)?
                .to_rgba8();
            let y = i64::from(side) * i64::try_from(row).unwrap_or(i64::MAX);
            imageops::overlay(&mut grid, &tile, 0, y);
        }
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(grid)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(OverlayError::Encode)?;
        Ok(buf)
    }
}

impl Rasterizer for OverlayRasterizer {
    type Error = OverlayError;

    fn rasterize(&mut self, editor: &Editor, target: CaptureTarget) -> Result<Vec<u8>, Self::Error> {
        match target {
            CaptureTarget::Grid => self.grid_png(editor.panels()),
            CaptureTarget::Panel(index) => {
                let panel = editor
                    .panels()
                    .get(index)
                    .ok_or(OverlayError::NoSuchPanel(index))?;
                self.panel_png(panel)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use usvg::fontdb;

    use super::*;
    use crate::model::BubbleKind;

    /// Records what it saw and fails on request.
    struct Recorder {
        saw_controls: Option<bool>,
        fail: bool,
    }

    impl Rasterizer for Recorder {
        type Error = String;

        fn rasterize(&mut self, editor: &Editor, _target: CaptureTarget) -> Result<Vec<u8>, String> {
            self.saw_controls = Some(editor.controls_visible());
            if self.fail {
                Err("canvas tainted".to_string())
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    fn editor() -> Editor {
        Editor::new(vec![
            Panel::new("a", "https://img/a.png"),
            Panel::new("b", "https://img/b.png"),
        ])
    }

    #[test]
    fn filenames() {
        assert_eq!(CaptureTarget::Grid.filename(), "comic-grid.png");
        assert_eq!(CaptureTarget::Panel(0).filename(), "panel-1.png");
        assert_eq!(CaptureTarget::Panel(2).filename(), "panel-3.png");
    }

    #[test]
    fn controls_hidden_during_capture_and_restored() {
        let mut editor = editor();
        let mut recorder = Recorder {
            saw_controls: None,
            fail: false,
        };
        let export = editor
            .export(&mut recorder, CaptureTarget::Panel(1))
            .unwrap();
        assert_eq!(export.filename, "panel-2.png");
        assert_eq!(export.png, vec![1, 2, 3]);
        assert_eq!(recorder.saw_controls, Some(false));
        assert!(editor.controls_visible());
    }

    #[test]
    fn controls_restored_when_capture_fails() {
        let mut editor = editor();
        let mut recorder = Recorder {
            saw_controls: None,
            fail: true,
        };
        let err = editor.export(&mut recorder, CaptureTarget::Grid).unwrap_err();
        assert_eq!(err, "canvas tainted");
        assert_eq!(recorder.saw_controls, Some(false));
        assert!(editor.controls_visible());
    }

    fn png(side: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(side, side, image::Rgba([0, 0, 200, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn overlay_rasterizer_renders_panels_and_grid() {
        let mut editor = editor();
        editor.add_bubble(0, BubbleKind::Dialogue);
        let compositor = Compositor::new(Arc::new(fontdb::Database::new()), 64);
        let mut rasterizer = OverlayRasterizer::new(compositor);
        rasterizer.insert_source("https://img/a.png", png(16));
        rasterizer.insert_source("https://img/b.png", png(16));

        let single = editor
            .export(&mut rasterizer, CaptureTarget::Panel(0))
            .unwrap();
        let decoded = image::load_from_memory(&single.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));

        let grid = editor.export(&mut rasterizer, CaptureTarget::Grid).unwrap();
        let decoded = image::load_from_memory(&grid.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 128));
    }

    #[test]
    fn overlay_rasterizer_reports_missing_inputs() {
        let mut editor = editor();
        let compositor = Compositor::new(Arc::new(fontdb::Database::new()), 64);
        let mut rasterizer = OverlayRasterizer::new(compositor);
        assert!(matches!(
            editor.export(&mut rasterizer, CaptureTarget::Panel(0)),
            Err(OverlayError::MissingSource(_))
        ));
        assert!(matches!(
            editor.export(&mut rasterizer, CaptureTarget::Panel(9)),
            Err(OverlayError::NoSuchPanel(9))
        ));
        assert!(editor.controls_visible());
    }
}
