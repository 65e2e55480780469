//! V4L2 device discovery.

use std::path::Path;

const WEBCAM_HINTS: &[&str] = &["webcam", "camera", "cam", "uvc", "facetime", "logitech"];
const NON_WEBCAM_HINTS: &[&str] = &["tuner", "tv", "dvb", "hdmi", "capture", "encoder", "decoder"];

/// Pick the `/dev/videoN` node most likely to be a webcam.
///
/// Candidates are scored from their sysfs name; metadata and tuner nodes are
/// skipped. Ties go to the lowest index.
pub fn detect_default_webcam_device() -> Option<String> {
    let mut best: Option<(u32, String)> = None;

    for idx in 0..16u32 {
        let dev_path = format!("/dev/video{idx}");
        if !Path::new(&dev_path).exists() {
            continue;
        }

        let name = std::fs::read_to_string(format!("/sys/class/video4linux/video{idx}/name"))
            .unwrap_or_default();
        let score = score_device_name(&name);
        tracing::debug!(device = %dev_path, name = name.trim(), score, "Probed V4L2 device");

        if score > 0 && best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, dev_path));
        }
    }

    best.map(|(score, dev_path)| {
        tracing::info!(device = %dev_path, score, "Selected webcam device");
        dev_path
    })
}

/// Score a V4L2 device name: 0 rejects, higher is more webcam-like.
pub fn score_device_name(name: &str) -> u32 {
    let name = name.to_lowercase();
    if NON_WEBCAM_HINTS.iter().any(|hint| name.contains(hint)) {
        return 0;
    }
    if WEBCAM_HINTS.iter().any(|hint| name.contains(hint)) {
        return 80;
    }
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_device_name() {
        assert_eq!(score_device_name("Integrated Camera: Integrated C"), 80);
        assert_eq!(score_device_name("HDMI Capture Card"), 0);
        assert_eq!(score_device_name("bcm2835-isp"), 10);
    }
}
