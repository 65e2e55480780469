//! Leaven Notifications
//!
//! The monitor raises exactly one [`PeakAlert`] per run. A [`Notifier`]
//! delivers it; [`EmailNotifier`] sends it through an SMTP relay with the
//! growth GIF inlined, [`LogNotifier`] only logs it.

pub mod alert;
pub mod email;

pub use alert::{LogNotifier, Notifier, PeakAlert};
pub use email::{Credentials, EmailNotifier};
