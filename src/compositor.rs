//! Draws a greeting and the credit caption onto an uploaded image.
//!
//! The greeting block is centred on the canvas as a whole, each line is
//! centred inside the block, and the caption sits in a fixed band near the
//! bottom edge. Nothing is clamped: text bigger than the canvas gets a negative
//! origin and whatever falls outside is dropped.

use std::fmt;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::{DynamicImage, ImageFormat, Rgb, Rgba, RgbaImage};
use tracing::debug;

use crate::catalog::TextColor;

/// Fixed credit line drawn under every greeting.
pub const CAPTION_TEXT: &str = "@Greetings Galore";
/// Pixel size of the caption font.
pub const CAPTION_FONT_SIZE: f32 = 10.0;
/// Caption colour, a tan/cream that doesn't follow the greeting colour.
pub const CAPTION_COLOR: Rgb<u8> = Rgb([239, 210, 171]);
/// Distance from the bottom edge to the top of the caption.
pub const CAPTION_BOTTOM_OFFSET: i32 = 20;
/// Default pixel size of the greeting font.
pub const DEFAULT_GREETING_FONT_SIZE: f32 = 24.0;
/// Extra gap between the lines of a multi-line greeting.
pub const LINE_SPACING: f32 = 4.0;

/// Errors from loading fonts or drawing and encoding images.
#[derive(Debug)]
pub enum CompositorError {
    /// A configured font file doesn't exist.
    FontNotFound(PathBuf),
    /// A font file exists but couldn't be parsed.
    InvalidFont(PathBuf),
    /// Reading a font file failed for some other reason.
    Io(PathBuf, std::io::Error),
    /// The uploaded bytes aren't an image we can decode.
    Decode(image::ImageError),
    /// Writing the PNG failed.
    Encode(image::ImageError),
}

impl fmt::Display for CompositorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontNotFound(path) => write!(f, "font not found: {}", path.display()),
            Self::InvalidFont(path) => write!(f, "not a usable font file: {}", path.display()),
            Self::Io(path, err) => write!(f, "failed to read {}: {err}", path.display()),
            Self::Decode(err) => write!(f, "failed to decode image: {err}"),
            Self::Encode(err) => write!(f, "failed to encode PNG: {err}"),
        }
    }
}

impl std::error::Error for CompositorError {}

/// A font loaded at a fixed pixel size.
#[derive(Clone, Debug)]
pub struct SizedFont {
    font: FontArc,
    scale: PxScale,
}

impl SizedFont {
    /// Reads a TrueType/OpenType font from disk.
    pub fn load(path: &Path, size: f32) -> Result<Self, CompositorError> {
        let bytes = std::fs::read(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CompositorError::FontNotFound(path.to_path_buf()),
            _ => CompositorError::Io(path.to_path_buf(), err),
        })?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|_| CompositorError::InvalidFont(path.to_path_buf()))?;
        debug!("Loaded font {} at {}px", path.display(), size);
        Ok(Self {
            font,
            scale: PxScale::from(size),
        })
    }

    /// Wraps an already parsed font.
    pub fn new(font: FontArc, size: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(size),
        }
    }

    /// Height of one line, ascent to descent.
    pub fn line_height(&self) -> f32 {
        self.font.as_scaled(self.scale).height()
    }

    /// Advance width of a single line of text, kerning included.
    pub fn line_width(&self, line: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0f32;
        let mut previous: Option<GlyphId> = None;
        for c in line.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                width += scaled.kern(previous, glyph_id);
            }
            width += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        width
    }

    /// Measures a possibly multi-line string as a single block.
    pub fn measure(&self, text: &str) -> TextBlock {
        let lines = split_lines(text);
        let line_height = self.line_height();
        let line_widths: Vec<f32> = lines.iter().map(|line| self.line_width(line)).collect();
        let width = line_widths.iter().copied().fold(0.0f32, f32::max);
        let height = match lines.len() {
            0 => 0.0,
            count => count as f32 * line_height + (count - 1) as f32 * LINE_SPACING,
        };
        TextBlock {
            lines: lines.into_iter().map(str::to_string).collect(),
            line_widths,
            line_height,
            width,
            height,
        }
    }

    /// Draws one line with its top-left corner at `(x, y)`.
    fn draw_line(&self, canvas: &mut RgbaImage, line: &str, x: f32, y: f32, color: Rgb<u8>) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = y + scaled.ascent();
        let mut caret = x;
        let mut previous: Option<GlyphId> = None;
        for c in line.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(self.scale, point(caret, baseline));
            caret += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + i64::from(gx);
                let py = bounds.min.y as i64 + i64::from(gy);
                blend_pixel(canvas, px, py, color, coverage);
            });
        }
    }
}

/// The greeting font and the caption font.
#[derive(Clone, Debug)]
pub struct GreetingFonts {
    /// Font for the greeting itself
    pub greeting: SizedFont,
    /// Smaller font for [`CAPTION_TEXT`]
    pub caption: SizedFont,
}

impl GreetingFonts {
    /// Loads both fonts; a missing file is reported as [`CompositorError::FontNotFound`].
    pub fn load(
        greeting_path: &Path,
        greeting_size: f32,
        caption_path: &Path,
    ) -> Result<Self, CompositorError> {
        Ok(Self {
            greeting: SizedFont::load(greeting_path, greeting_size)?,
            caption: SizedFont::load(caption_path, CAPTION_FONT_SIZE)?,
        })
    }
}

/// A measured block of text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    /// The lines, split on `\n`
    pub lines: Vec<String>,
    /// Advance width of each line
    pub line_widths: Vec<f32>,
    /// Height of one line
    pub line_height: f32,
    /// Width of the widest line
    pub width: f32,
    /// Height of all lines plus spacing
    pub height: f32,
}

/// Where the greeting and the caption ended up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Placement {
    /// Top-left of the greeting block
    pub greeting: (i32, i32),
    /// Top-left of the caption
    pub caption: (i32, i32),
}

/// The uploaded image being drawn on. Draws go straight into the pixel buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    pixels: RgbaImage,
}

impl Canvas {
    /// Decodes an uploaded PNG or JPEG.
    pub fn decode(bytes: &[u8]) -> Result<Self, CompositorError> {
        let image = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| CompositorError::Decode(image::ImageError::IoError(err)))?
            .decode()
            .map_err(CompositorError::Decode)?;
        Ok(Self::from(image))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The pixel buffer.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encodes the canvas as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CompositorError> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(CompositorError::Encode)?;
        Ok(buf.into_inner())
    }
}

impl From<DynamicImage> for Canvas {
    fn from(image: DynamicImage) -> Self {
        Self {
            pixels: image.into_rgba8(),
        }
    }
}

impl From<RgbaImage> for Canvas {
    fn from(pixels: RgbaImage) -> Self {
        Self { pixels }
    }
}

/// Top-left origin that centres a `text_width` x `text_height` block on the canvas.
pub fn centered_origin(
    canvas_width: u32,
    canvas_height: u32,
    text_width: f32,
    text_height: f32,
) -> (i32, i32) {
    let x = (canvas_width as f32 - text_width) / 2.0;
    let y = (canvas_height as f32 - text_height) / 2.0;
    (x.floor() as i32, y.floor() as i32)
}

/// Top-left of the caption: centred horizontally, a fixed offset above the bottom edge.
pub fn caption_origin(canvas_width: u32, canvas_height: u32, caption_width: f32) -> (i32, i32) {
    let x = (canvas_width as f32 - caption_width) / 2.0;
    (x.floor() as i32, canvas_height as i32 - CAPTION_BOTTOM_OFFSET)
}

/// Draws the greeting and caption onto `canvas` without encoding.
pub fn composite(
    text: &str,
    fonts: &GreetingFonts,
    canvas: &mut Canvas,
    color: TextColor,
) -> Placement {
    let (width, height) = (canvas.width(), canvas.height());

    let block = fonts.greeting.measure(text);
    let greeting = centered_origin(width, height, block.width, block.height);
    let text_color = Rgb(color.channels());
    for (index, (line, line_width)) in block.lines.iter().zip(&block.line_widths).enumerate() {
        let x = greeting.0 as f32 + (block.width - line_width) / 2.0;
        let y = greeting.1 as f32 + index as f32 * (block.line_height + LINE_SPACING);
        fonts
            .greeting
            .draw_line(&mut canvas.pixels, line, x, y, text_color);
    }

    let caption_width = fonts.caption.line_width(CAPTION_TEXT);
    let caption = caption_origin(width, height, caption_width);
    fonts.caption.draw_line(
        &mut canvas.pixels,
        CAPTION_TEXT,
        caption.0 as f32,
        caption.1 as f32,
        CAPTION_COLOR,
    );

    debug!(
        "Composited {} line(s) at {:?}, caption at {:?}",
        block.lines.len(),
        greeting,
        caption
    );
    Placement { greeting, caption }
}

/// Draws the greeting and caption onto `canvas` and returns the PNG bytes.
///
/// The canvas keeps the drawing, so rendering twice on the same canvas stacks
/// the text.
pub fn render(
    text: &str,
    fonts: &GreetingFonts,
    canvas: &mut Canvas,
    color: TextColor,
) -> Result<Vec<u8>, CompositorError> {
    composite(text, fonts, canvas, color);
    canvas.encode_png()
}

fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    let Rgba([r, g, b, a]) = *pixel;
    let mix = |dst: u8, src: u8| -> u8 {
        (f32::from(dst) * (1.0 - coverage) + f32::from(src) * coverage).round() as u8
    };
    *pixel = Rgba([
        mix(r, color[0]),
        mix(g, color[1]),
        mix(b, color[2]),
        mix(a, u8::MAX),
    ]);
}
