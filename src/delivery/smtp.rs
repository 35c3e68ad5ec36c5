//! Email transport over implicit-TLS SMTP.

use crate::config::MailConfig;
use crate::error::DeliveryError;
use crate::models::OutgoingMail;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

/// SMTP reply codes that mean the login itself was refused.
const AUTH_FAILURE_CODES: &[&str] = &["530", "534", "535"];

/// Something that can make one attempt at sending an email.
pub trait Mailer {
    /// Make a single delivery attempt. Retrying is the caller's job.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError>;
}

/// Gmail-style SMTP sender. Every call opens a fresh TLS session.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: MailConfig,
}

impl SmtpMailer {
    /// Create a sender for the server and account in `config`.
    ///
    /// Nothing is checked or connected here; missing credentials surface as
    /// [`DeliveryError::MissingSetting`] on the first [`Mailer::send`].
    ///
    /// # Arguments
    ///
    /// * `config` - SMTP host, port, timeout, account and recipient
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }
}

impl Mailer for SmtpMailer {
    #[instrument(level = "debug", skip_all, fields(host = %self.config.host, port = self.config.port))]
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let username = self
            .config
            .username
            .as_deref()
            .ok_or(DeliveryError::MissingSetting("GMAIL_USER"))?;
        let password = self
            .config
            .password
            .as_deref()
            .ok_or(DeliveryError::MissingSetting("GMAIL_APP_PASSWORD"))?;

        let message = build_message(mail)?;
        let creds = Credentials::new(username.to_string(), password.to_string());

        let transport: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?
                .port(self.config.port)
                .credentials(creds)
                .timeout(Some(self.config.timeout))
                .build();

        let response = transport.send(message).await.map_err(classify_smtp_error)?;
        debug!(code = %response.code(), "SMTP server accepted message");
        Ok(())
    }
}

/// Build a plain-text message from `mail`.
pub fn build_message(mail: &OutgoingMail) -> Result<Message, DeliveryError> {
    let from: Mailbox = mail
        .from
        .as_deref()
        .ok_or(DeliveryError::MissingSetting("GMAIL_USER"))?
        .parse()?;
    let to: Mailbox = mail
        .to
        .as_deref()
        .ok_or(DeliveryError::MissingSetting("EMAIL_TO"))?
        .parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(mail.body.clone())?;
    Ok(message)
}

fn classify_smtp_error(e: lettre::transport::smtp::Error) -> DeliveryError {
    match e.status() {
        Some(code) if is_auth_failure_code(&code.to_string()) => DeliveryError::Auth(e.to_string()),
        _ => DeliveryError::Smtp(e),
    }
}

fn is_auth_failure_code(code: &str) -> bool {
    AUTH_FAILURE_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn mail(from: Option<&str>, to: Option<&str>) -> OutgoingMail {
        OutgoingMail {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            subject: "LinkedIn Advisory Post - 06 May 2025".to_string(),
            body: "Stay invested 📈".to_string(),
        }
    }

    #[test]
    fn test_build_message_headers() {
        let message = build_message(&mail(Some("advisor@gmail.com"), Some("me@example.com"))).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: advisor@gmail.com"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("Subject: LinkedIn Advisory Post - 06 May 2025"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
    }

    #[test]
    fn test_build_message_requires_recipient() {
        let err = build_message(&mail(Some("advisor@gmail.com"), None)).unwrap_err();
        assert!(matches!(err, DeliveryError::MissingSetting("EMAIL_TO")));
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let err = build_message(&mail(Some("not an address"), Some("me@example.com"))).unwrap_err();
        assert!(matches!(err, DeliveryError::Address(_)));
    }

    #[tokio::test]
    async fn test_send_without_credentials_fails_before_connecting() {
        let mailer = SmtpMailer::new(MailConfig {
            host: "smtp.invalid".to_string(),
            port: 465,
            timeout: Duration::from_secs(1),
            username: None,
            password: None,
            to: Some("me@example.com".to_string()),
        });

        let err = mailer
            .send(&mail(None, Some("me@example.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::MissingSetting("GMAIL_USER")));
    }

    #[test]
    fn test_auth_failure_codes() {
        assert!(is_auth_failure_code("535"));
        assert!(is_auth_failure_code("534"));
        assert!(is_auth_failure_code("530"));
        assert!(!is_auth_failure_code("550"));
        assert!(!is_auth_failure_code("421"));
        assert!(!is_auth_failure_code("250"));
    }

    #[tokio::test]
    async fn test_send_to_closed_connection_is_smtp_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (first_byte_tx, first_byte_rx) = oneshot::channel();

        // read the client's first byte, then hang up
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let _ = first_byte_tx.send((n > 0).then_some(buf[0]));
        });

        let mailer = SmtpMailer::new(MailConfig {
            host: "127.0.0.1".to_string(),
            port,
            timeout: Duration::from_secs(5),
            username: Some("advisor@gmail.com".to_string()),
            password: Some("app-password".to_string()),
            to: Some("me@example.com".to_string()),
        });

        let err = mailer
            .send(&mail(Some("advisor@gmail.com"), Some("me@example.com")))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Smtp(_)), "unexpected error: {err:?}");
        assert!(err.kind().starts_with("Smtp"));
        // 0x16 opens a TLS handshake record: the client spoke TLS before any SMTP greeting
        assert_eq!(first_byte_rx.await.unwrap(), Some(0x16));
    }
}
