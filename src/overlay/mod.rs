//! Server-side bubble overlay: lay out bubbles, draw them as SVG and flatten them
//! onto the panel image.

mod composite;
mod layout;
mod svg;

pub use composite::Compositor;
pub use layout::{BubbleMetrics, DialogueLayout, ThoughtLayout, wrap_text};
pub use svg::overlay_svg;

/// Why a panel could not be flattened.
#[derive(Debug)]
pub enum OverlayError {
    /// The source image could not be fetched.
    Fetch(crate::fetch::FetchError),
    /// The source bytes are not a supported image.
    Decode(image::ImageError),
    /// The generated overlay markup was rejected by the SVG parser.
    Svg(usvg::Error),
    /// The raster surface could not be allocated.
    Pixmap {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// PNG encoding failed.
    Encode(image::ImageError),
    /// No source bytes were registered for this image URL.
    MissingSource(String),
    /// Panel index out of range.
    NoSuchPanel(usize),
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "fetch source image: {err}"),
            Self::Decode(err) => write!(f, "decode source image: {err}"),
            Self::Svg(err) => write!(f, "parse overlay svg: {err}"),
            Self::Pixmap { width, height } => {
                write!(f, "failed to allocate {width}x{height} overlay pixmap")
            }
            Self::Encode(err) => write!(f, "encode png: {err}"),
            Self::MissingSource(url) => write!(f, "no source image loaded for {url}"),
            Self::NoSuchPanel(index) => write!(f, "no panel at index {index}"),
        }
    }
}

impl std::error::Error for OverlayError {}

impl From<crate::fetch::FetchError> for OverlayError {
    fn from(err: crate::fetch::FetchError) -> Self {
        Self::Fetch(err)
    }
}
