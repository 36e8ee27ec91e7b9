// src/image/scan.rs

//! Handing discovered images to a vulnerability scanner

use super::{ImagePolicy, ImageRef};
use crate::error::Result;
use tracing::info;

/// A vulnerability scanner for container images
///
/// Reports are opaque to this crate.
pub trait ImageScanner {
    type Report;

    fn scan(&self, image: &ImageRef) -> Result<Self::Report>;
}

/// Scan every image the policy does not exclude
///
/// Stops at the first scanner failure.
pub fn scan_images<S: ImageScanner>(
    images: Vec<ImageRef>,
    policy: &ImagePolicy,
    scanner: &S,
) -> Result<Vec<(ImageRef, S::Report)>> {
    let targets = policy.scan_targets(images);
    info!("Scanning {} images", targets.len());

    let mut reports = Vec::with_capacity(targets.len());
    for image in targets {
        let report = scanner.scan(&image)?;
        reports.push((image, report));
    }
    Ok(reports)
}
