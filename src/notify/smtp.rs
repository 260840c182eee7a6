//! Minimal SMTP relay client.
//!
//! Speaks just enough SMTP to hand one message to an unauthenticated relay:
//! greeting, EHLO (falling back to HELO), MAIL, RCPT per recipient, DATA, QUIT.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::config::AlertConfig;

/// Positive completion (`250 OK`, `251 will forward`, ...).
const COMPLETED: u16 = 2;
/// Positive intermediate (`354` after DATA).
const INTERMEDIATE: u16 = 3;
use crate::notify::{AlertEvent, Notifier, NotifyError};

/// Delivers alerts through an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    from: String,
    relay: String,
    port: u16,
    helo_name: String,
}

impl SmtpNotifier {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            from: config.from.clone(),
            relay: config.smtp_relay.clone(),
            port: config.smtp_port,
            helo_name: "localhost".to_string(),
        }
    }

    /// Name announced in EHLO/HELO.
    pub fn with_helo_name(mut self, name: impl Into<String>) -> Self {
        self.helo_name = name.into();
        self
    }
}

/// Render headers and body, dot-stuffing lines that start with a period.
pub fn format_message(from: &str, alert: &AlertEvent) -> String {
    let mut message = format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n",
        from,
        alert.recipients.join(", "),
        alert.subject
    );
    for line in alert.body.lines() {
        if line.starts_with('.') {
            message.push('.');
        }
        message.push_str(line);
        message.push_str("\r\n");
    }
    message
}

struct Session {
    reader: BufReader<TcpStream>,
}

impl Session {
    /// Read one (possibly multi-line) reply, returning its code and text.
    async fn reply(&mut self) -> Result<(u16, String), NotifyError> {
        let mut text = String::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(NotifyError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "relay closed the connection",
                )));
            }
            let line = line.trim_end();
            text.push_str(line);
            // "250-..." continues, "250 ..." ends the reply
            if line.len() < 4 || line.as_bytes()[3] != b'-' {
                break;
            }
            text.push('\n');
        }
        let code = text
            .get(..3)
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        Ok((code, text))
    }

    /// Send one command; any reply in the `class` hundred range is accepted.
    async fn command(&mut self, command: &str, class: u16) -> Result<String, NotifyError> {
        self.reader
            .get_mut()
            .write_all(format!("{command}\r\n").as_bytes())
            .await?;
        let (code, text) = self.reply().await?;
        if code / 100 != class {
            return Err(NotifyError::Rejected {
                command: command.to_string(),
                reply: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, alert: &AlertEvent) -> Result<(), NotifyError> {
        if alert.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let stream = TcpStream::connect((self.relay.as_str(), self.port)).await?;
        let mut session = Session {
            reader: BufReader::new(stream),
        };

        let (code, greeting) = session.reply().await?;
        if code / 100 != COMPLETED {
            return Err(NotifyError::Rejected {
                command: "connect".to_string(),
                reply: greeting,
            });
        }

        if session
            .command(&format!("EHLO {}", self.helo_name), COMPLETED)
            .await
            .is_err()
        {
            session.command(&format!("HELO {}", self.helo_name), COMPLETED).await?;
        }

        session.command(&format!("MAIL FROM:<{}>", self.from), COMPLETED).await?;
        for recipient in &alert.recipients {
            session.command(&format!("RCPT TO:<{recipient}>"), COMPLETED).await?;
        }
        session.command("DATA", INTERMEDIATE).await?;

        let message = format_message(&self.from, alert);
        session.command(&format!("{message}."), COMPLETED).await?;
        // Some relays drop the connection right after QUIT without replying.
        let _ = session.command("QUIT", COMPLETED).await;

        tracing::debug!(
            relay = %self.relay,
            recipients = alert.recipients.len(),
            "Alert handed to SMTP relay"
        );
        Ok(())
    }
}
