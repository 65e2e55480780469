//! Alert contents and the notification capability.

use std::path::PathBuf;

use leaven_common::error::LeavenResult;

/// A peak-activity alert.
#[derive(Debug, Clone)]
pub struct PeakAlert {
    /// Still at which the peak was detected.
    pub filename: String,

    /// Hours since the first still.
    pub elapsed_hours: f64,

    /// Peak time formatted for humans.
    pub human_readable: String,

    /// Growth GIF to embed, if one was rendered.
    pub attachment: Option<PathBuf>,
}

impl PeakAlert {
    pub fn subject(&self) -> String {
        "Leaven Alert: Peak Sourdough Activity Detected".to_string()
    }

    pub fn body(&self) -> String {
        format!(
            "The sourdough starter has reached peak activity at {}.",
            self.human_readable
        )
    }
}

/// Delivers peak alerts.
pub trait Notifier {
    fn notify(&self, alert: &PeakAlert) -> LeavenResult<()>;

    /// Notifier name for logs.
    fn name(&self) -> &str;
}

/// Notifier that only writes the alert to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, alert: &PeakAlert) -> LeavenResult<()> {
        tracing::info!(
            subject = %alert.subject(),
            filename = %alert.filename,
            elapsed_hours = alert.elapsed_hours,
            attachment = ?alert.attachment,
            "{}",
            alert.body()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
