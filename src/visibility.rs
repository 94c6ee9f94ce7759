use std::path::{Path, PathBuf};

use image::GrayImage;
use imageproc::edges::canny;
use tracing::{debug, warn};

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Scores ambient road visibility from a single still image.
///
/// A busy, high-contrast frame (rain streaks, glare, clutter) yields many
/// edges; the penalty is one of 0, 10 or 20 and applies to every segment of
/// a route alike.
#[derive(Debug, Clone)]
pub struct VisibilityEstimator {
    image_path: PathBuf,
}

impl VisibilityEstimator {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self { image_path: image_path.into() }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Penalty for the configured image. Missing or unreadable images score 0.
    pub fn penalty(&self) -> u32 {
        if !self.image_path.exists() {
            debug!(path = %self.image_path.display(), "no visibility image, skipping");
            return 0;
        }
        let img = match image::open(&self.image_path) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                warn!(path = %self.image_path.display(), error = %e, "visibility image unreadable");
                return 0;
            }
        };
        let density = edge_density(&img);
        let penalty = penalty_for_density(density);
        debug!(density, penalty, "visibility estimated");
        penalty
    }
}

/// Percentage of pixels Canny marks as edges.
///
/// `canny` smooths with its own Gaussian (sigma 1.4) before taking
/// gradients, so the image goes in unblurred.
pub fn edge_density(img: &GrayImage) -> f64 {
    let total = img.width() as usize * img.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let edges = canny(img, CANNY_LOW, CANNY_HIGH);
    let count = edges.pixels().filter(|p| p.0[0] != 0).count();
    count as f64 / total as f64 * 100.0
}

pub fn penalty_for_density(density: f64) -> u32 {
    if density > 5.0 {
        20
    } else if density > 2.0 {
        10
    } else {
        0
    }
}
