//! Portrait lookup and ten-pull image composition.
//!
//! Portraits are loaded as RGBA, optionally scaled to a common height, and
//! alpha-composited onto an opaque background. The result is written to a
//! PNG temp file that the caller sends and later removes.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, warn};

/// Largest composite canvas, in pixels.
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

/// Grid geometry for [`compose_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    /// Pixels between neighbouring cells.
    pub spacing: u32,
}

impl GridLayout {
    pub fn capacity(&self) -> usize {
        (self.rows as usize).saturating_mul(self.cols as usize)
    }

    /// Canvas size for cells of `cell_w` × `cell_h`, `None` on overflow.
    pub fn canvas_size(&self, cell_w: u32, cell_h: u32) -> Option<(u32, u32)> {
        let span = |count: u32, cell: u32| {
            count
                .checked_mul(cell)?
                .checked_add(count.saturating_sub(1).checked_mul(self.spacing)?)
        };
        Some((span(self.cols, cell_w)?, span(self.rows, cell_h)?))
    }

    /// Top-left corner of cell `index`, filled row by row.
    pub fn cell_origin(&self, index: usize, cell_w: u32, cell_h: u32) -> (u32, u32) {
        let row = index as u32 / self.cols;
        let col = index as u32 % self.cols;
        (col * (cell_w + self.spacing), row * (cell_h + self.spacing))
    }
}

/// Portrait path for `image`, falling back to `default_image`.
pub fn resolve_image_path(images_dir: &Path, image: &str, default_image: &str) -> Option<PathBuf> {
    let path = images_dir.join(image);
    if path.is_file() {
        return Some(path);
    }
    let fallback = images_dir.join(default_image);
    if fallback.is_file() {
        debug!("Portrait {} missing, using {}", image, default_image);
        return Some(fallback);
    }
    None
}

/// Arrange portraits in a grid, each centred in a cell sized to the largest
/// portrait. Portraits beyond `rows * cols` are dropped.
///
/// Returns `None` when no path could be loaded.
pub fn compose_grid(
    paths: &[PathBuf],
    layout: GridLayout,
    target_height: Option<u32>,
    background: [u8; 3],
) -> Result<Option<PathBuf>> {
    let mut images = load_images(paths);
    if images.is_empty() {
        return Ok(None);
    }
    if let Some(height) = target_height {
        images = images
            .into_iter()
            .map(|img| scale_to_height(img, height))
            .collect::<Result<_>>()?;
    }

    let cell_w = images.iter().map(RgbaImage::width).max().unwrap_or(1);
    let cell_h = images.iter().map(RgbaImage::height).max().unwrap_or(1);
    let Some((width, height)) = layout.canvas_size(cell_w, cell_h) else {
        bail!(
            "{}x{} grid of {}x{} cells overflows the canvas",
            layout.rows, layout.cols, cell_w, cell_h
        );
    };
    check_canvas(width, height)?;

    let mut canvas = RgbaImage::from_pixel(width, height, opaque(background));
    for (index, img) in images.iter().enumerate().take(layout.capacity()) {
        let (x, y) = layout.cell_origin(index, cell_w, cell_h);
        let offset_x = (cell_w - img.width()) / 2;
        let offset_y = (cell_h - img.height()) / 2;
        imageops::overlay(&mut canvas, img, (x + offset_x) as i64, (y + offset_y) as i64);
    }

    save_composite(canvas).map(Some)
}

/// Lay portraits out left to right at a common height: `target_height`,
/// or the tallest portrait's height.
pub fn compose_horizontal(
    paths: &[PathBuf],
    spacing: u32,
    target_height: Option<u32>,
    background: [u8; 3],
) -> Result<Option<PathBuf>> {
    let images = load_images(paths);
    if images.is_empty() {
        return Ok(None);
    }

    let height = target_height
        .or_else(|| images.iter().map(RgbaImage::height).max())
        .unwrap_or(1);
    let images: Vec<RgbaImage> = images
        .into_iter()
        .map(|img| if img.height() == height { Ok(img) } else { scale_to_height(img, height) })
        .collect::<Result<_>>()?;

    let width = images
        .iter()
        .try_fold(0u32, |acc, img| acc.checked_add(img.width()))
        .and_then(|w| {
            let gaps = u32::try_from(images.len() - 1).ok()?.checked_mul(spacing)?;
            w.checked_add(gaps)
        });
    let Some(width) = width else {
        bail!("{} portraits overflow the canvas width", images.len());
    };
    check_canvas(width, height)?;

    let mut canvas = RgbaImage::from_pixel(width, height, opaque(background));
    let mut x = 0u32;
    for img in &images {
        imageops::overlay(&mut canvas, img, x as i64, 0);
        x += img.width() + spacing;
    }

    save_composite(canvas).map(Some)
}

/// Remove a composite produced by this module. Returns whether a file was
/// deleted.
pub fn cleanup_temp_file(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to remove composite {}: {}", path.display(), e);
            false
        }
    }
}

fn check_canvas(width: u32, height: u32) -> Result<()> {
    if width as u64 * height as u64 > MAX_CANVAS_PIXELS {
        bail!("Composite {}x{} exceeds {} pixels", width, height, MAX_CANVAS_PIXELS);
    }
    Ok(())
}

fn opaque(rgb: [u8; 3]) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

/// Load every readable path as RGBA; unreadable ones are skipped.
fn load_images(paths: &[PathBuf]) -> Vec<RgbaImage> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        match image::open(path) {
            Ok(img) => images.push(img.to_rgba8()),
            Err(e) => debug!("Skipping portrait {}: {}", path.display(), e),
        }
    }
    images
}

fn scale_to_height(img: RgbaImage, height: u32) -> Result<RgbaImage> {
    if img.height() == 0 {
        return Ok(img);
    }
    let ratio = height as f64 / img.height() as f64;
    let width = ((img.width() as f64 * ratio) as u32).max(1);
    check_canvas(width, height)?;
    Ok(imageops::resize(&img, width, height, FilterType::Lanczos3))
}

fn save_composite(canvas: RgbaImage) -> Result<PathBuf> {
    let path = tempfile::Builder::new()
        .prefix("gacha-")
        .suffix(".png")
        .tempfile()
        .context("Failed to create composite file")?
        .into_temp_path()
        .keep()
        .context("Failed to keep composite file")?;

    DynamicImage::ImageRgba8(canvas)
        .to_rgb8()
        .save_with_format(&path, ImageFormat::Png)
        .with_context(|| format!("Failed to write composite {}", path.display()))?;

    Ok(path)
}
