//! Email delivery over an SMTP relay.

use std::fmt;
use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Message, SmtpTransport, Transport};

use leaven_common::config::SmtpSettings;
use leaven_common::error::{LeavenError, LeavenResult};

use crate::alert::{Notifier, PeakAlert};

/// Content-ID of the inline growth GIF.
const IMAGE_CID: &str = "sourdough-growth@leaven";

/// Mail account used as both sender and recipient.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    app_password: String,
}

impl Credentials {
    /// Environment variable holding the account address.
    pub const EMAIL_VAR: &'static str = "EMAIL";

    /// Environment variable holding the relay app password.
    pub const PASSWORD_VAR: &'static str = "GMAIL_APP_PASSWORD";

    pub fn new(email: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            app_password: app_password.into(),
        }
    }

    /// Read credentials from the process environment.
    pub fn from_env() -> LeavenResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`, e.g. the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LeavenResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    LeavenError::config(format!(
                        "Environment variable {key} must be set to send email alerts"
                    ))
                })
        };
        Ok(Self::new(get(Self::EMAIL_VAR)?, get(Self::PASSWORD_VAR)?))
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

/// Sends peak alerts to the account owner by email.
pub struct EmailNotifier {
    credentials: Credentials,
    smtp: SmtpSettings,
}

impl EmailNotifier {
    pub fn new(credentials: Credentials, smtp: SmtpSettings) -> Self {
        Self { credentials, smtp }
    }

    /// Build the alert email: plain text plus HTML with the GIF inlined.
    pub fn build_message(&self, alert: &PeakAlert) -> LeavenResult<Message> {
        let mailbox: Mailbox = self.credentials.email.parse().map_err(|e| {
            LeavenError::notify(format!(
                "Invalid email address '{}': {e}",
                self.credentials.email
            ))
        })?;

        let body = alert.body();
        let image = match &alert.attachment {
            Some(path) => match std::fs::read(path) {
                Ok(bytes) => Some((bytes, image_content_type(path)?)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Growth image unreadable, sending text only");
                    None
                }
            },
            None => None,
        };

        let alternative = match image {
            Some((bytes, content_type)) => {
                let html = format!(
                    "<html>\n  <body>\n    <p>{}</p>\n    <img src=\"cid:{IMAGE_CID}\">\n  </body>\n</html>\n",
                    escape_html(&body)
                );
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(body))
                    .multipart(
                        MultiPart::related()
                            .singlepart(SinglePart::html(html))
                            .singlepart(
                                Attachment::new_inline(IMAGE_CID.to_string())
                                    .body(bytes, content_type),
                            ),
                    )
            }
            None => {
                let html = format!(
                    "<html>\n  <body>\n    <p>{}</p>\n  </body>\n</html>\n",
                    escape_html(&body)
                );
                MultiPart::alternative_plain_html(body, html)
            }
        };

        Message::builder()
            .from(mailbox.clone())
            .to(mailbox)
            .subject(alert.subject())
            .multipart(alternative)
            .map_err(|e| LeavenError::notify(format!("Failed to build email: {e}")))
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, alert: &PeakAlert) -> LeavenResult<()> {
        let message = self.build_message(alert)?;

        let transport = SmtpTransport::starttls_relay(&self.smtp.host)
            .map_err(|e| LeavenError::notify(format!("Invalid SMTP relay {}: {e}", self.smtp.host)))?
            .port(self.smtp.port)
            .credentials(SmtpCredentials::new(
                self.credentials.email.clone(),
                self.credentials.app_password.clone(),
            ))
            .build();

        tracing::debug!(host = %self.smtp.host, port = self.smtp.port, "Sending alert email");
        transport
            .send(&message)
            .map_err(|e| LeavenError::notify(format!("Error sending email: {e}")))?;

        tracing::info!(to = %self.credentials.email, "Alert email sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }
}

fn image_content_type(path: &Path) -> LeavenResult<ContentType> {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("gif") => "image/gif",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    };
    ContentType::parse(mime)
        .map_err(|e| LeavenError::notify(format!("Invalid content type {mime}: {e}")))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn notifier() -> EmailNotifier {
        EmailNotifier::new(
            Credentials::new("baker@example.com", "secret"),
            SmtpSettings::default(),
        )
    }

    fn alert(attachment: Option<PathBuf>) -> PeakAlert {
        PeakAlert {
            filename: "2024-04-28T01_02_03.000000.jpg".to_string(),
            elapsed_hours: 5.25,
            human_readable: "Sunday, April 28 @ 01:02 AM".to_string(),
            attachment,
        }
    }

    #[test]
    fn test_credentials_from_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("EMAIL", "baker@example.com"), ("GMAIL_APP_PASSWORD", "pw")]);
        let creds = Credentials::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.email(), "baker@example.com");
    }

    #[test]
    fn test_missing_password_is_config_error() {
        let err = Credentials::from_lookup(|k| (k == "EMAIL").then(|| "a@b.c".to_string()))
            .unwrap_err();
        assert!(matches!(err, LeavenError::Config { .. }));
        assert!(err.to_string().contains("GMAIL_APP_PASSWORD"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let text = format!("{:?}", Credentials::new("a@b.c", "hunter2"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_message_inlines_gif() {
        let dir = std::env::temp_dir().join("leaven_test_email_gif");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let gif = dir.join("sourdough_growth.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();

        let message = notifier().build_message(&alert(Some(gif))).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("Peak Sourdough Activity Detected"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("multipart/related"));
        assert!(raw.contains("image/gif"));
        assert!(raw.contains(IMAGE_CID));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_gif_sends_text_only() {
        let message = notifier()
            .build_message(&alert(Some(PathBuf::from("/nonexistent/growth.gif"))))
            .unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("multipart/alternative"));
        assert!(!raw.contains("multipart/related"));
    }

    #[test]
    fn test_invalid_address_is_notify_error() {
        let notifier = EmailNotifier::new(Credentials::new("not an address", "pw"), SmtpSettings::default());
        assert!(matches!(
            notifier.build_message(&alert(None)),
            Err(LeavenError::Notify { .. })
        ));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
    }
}
