//! Reminder delivery for renewtrack.
//!
//! The notifier hands each due contract to a [`Dispatcher`]. The production
//! implementation, [`SmtpDispatcher`], sends a plain-text email over an
//! authenticated STARTTLS session; tests substitute a recording fake.

use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

use renewtrack_shared::{DATE_FORMAT, RenewTrackError, Result, SmtpConfig};

// ---------------------------------------------------------------------------
// Reminder
// ---------------------------------------------------------------------------

/// A reminder ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Destination address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl Reminder {
    /// Build the renewal reminder for one contract.
    pub fn for_contract(filename: &str, renewal_date: NaiveDate, recipient: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: format!("Contract Renewal Reminder: {filename}"),
            body: format!(
                "Contract '{filename}' is due for renewal on {}.",
                renewal_date.format(DATE_FORMAT)
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Delivers reminders. One call per reminder; blocks until delivered or failed.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Deliver `reminder`. Any failure is a [`RenewTrackError::Dispatch`].
    async fn dispatch(&self, reminder: &Reminder) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Sends reminders through an SMTP relay using STARTTLS and login credentials.
pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpDispatcher {
    /// Build a dispatcher from the `[smtp]` config section and the resolved password.
    pub fn new(config: &SmtpConfig, password: String) -> Result<Self> {
        let sender = parse_mailbox(&config.sender)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| RenewTrackError::Dispatch(format!("{}: {e}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), password))
            .build();

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl Dispatcher for SmtpDispatcher {
    #[instrument(skip_all, fields(to = %reminder.recipient, subject = %reminder.subject))]
    async fn dispatch(&self, reminder: &Reminder) -> Result<()> {
        let message = build_message(&self.sender, reminder)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| RenewTrackError::Dispatch(e.to_string()))?;
        debug!(code = %response.code(), "message accepted");
        Ok(())
    }
}

/// Render `reminder` as a plain-text email from `sender`.
pub fn build_message(sender: &Mailbox, reminder: &Reminder) -> Result<Message> {
    let to = parse_mailbox(&reminder.recipient)?;
    Message::builder()
        .from(sender.clone())
        .to(to)
        .subject(reminder.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(reminder.body.clone())
        .map_err(|e| RenewTrackError::Dispatch(format!("cannot build message: {e}")))
}

/// Parse an address such as `a@example.com` or `Legal <a@example.com>`.
pub fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| RenewTrackError::validation(format!("invalid email address {address:?}: {e}")))
}
