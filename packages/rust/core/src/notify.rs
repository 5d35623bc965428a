//! Notification pass: send one reminder for every unnotified contract whose
//! renewal date falls in `[today, today + lookahead_days]`, then mark it
//! notified.
//!
//! Contracts whose date has already passed are never picked up again; they
//! stay unnotified.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, error, info, instrument, warn};

use renewtrack_mailer::{Dispatcher, Reminder};
use renewtrack_shared::{ContractRecord, NotifyOptions, RenewalWindow, Result, RunId};
use renewtrack_storage::ContractRepository;

use crate::pipeline::ProgressReporter;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// What happened to one unnotified contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Reminder delivered and record marked notified.
    Sent,
    /// Inside the window, but this was a dry run.
    WouldNotify,
    /// Renewal date outside the window; nothing done.
    OutsideWindow,
    /// Delivery failed; the record stays unnotified.
    DispatchFailed { error: String },
}

/// Outcome for a single contract.
#[derive(Debug, Clone)]
pub struct ContractReport {
    pub id: i64,
    pub filename: String,
    pub renewal_date: NaiveDate,
    pub outcome: NotifyOutcome,
}

/// Result of a notification pass.
#[derive(Debug)]
pub struct NotifyReport {
    /// Identifier tagging this run in logs.
    pub run_id: RunId,
    /// The window that was applied.
    pub window: RenewalWindow,
    /// Per-contract outcomes for every unnotified record, in id order.
    pub contracts: Vec<ContractReport>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

impl NotifyReport {
    fn count(&self, pred: impl Fn(&NotifyOutcome) -> bool) -> usize {
        self.contracts.iter().filter(|c| pred(&c.outcome)).count()
    }

    /// Reminders delivered.
    pub fn sent(&self) -> usize {
        self.count(|o| matches!(o, NotifyOutcome::Sent))
    }

    /// Reminders that would have been delivered (dry run).
    pub fn would_notify(&self) -> usize {
        self.count(|o| matches!(o, NotifyOutcome::WouldNotify))
    }

    /// Contracts outside the window.
    pub fn outside_window(&self) -> usize {
        self.count(|o| matches!(o, NotifyOutcome::OutsideWindow))
    }

    /// Deliveries that failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, NotifyOutcome::DispatchFailed { .. }))
    }
}

// ---------------------------------------------------------------------------
// Notification pass
// ---------------------------------------------------------------------------

/// Run one notification pass as of `today`.
///
/// A failed delivery is logged and reported, and the pass moves on to the
/// next contract, unless `options.fail_fast` is set. Store errors always
/// abort the pass.
#[instrument(skip_all, fields(today = %today, lookahead_days = options.lookahead_days))]
pub async fn run_notification_pass(
    options: &NotifyOptions,
    today: NaiveDate,
    store: &dyn ContractRepository,
    dispatcher: &dyn Dispatcher,
    progress: &dyn ProgressReporter,
) -> Result<NotifyReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    let window = RenewalWindow::from_today(today, options.lookahead_days);

    info!(%run_id, %window, dry_run = options.dry_run, "starting notification pass");

    progress.phase("Loading unnotified contracts");
    let pending = store.list_unnotified().await?;
    let total = pending.len();

    progress.phase("Checking renewal dates");
    let mut contracts = Vec::with_capacity(total);

    for (i, record) in pending.into_iter().enumerate() {
        let outcome = check_contract(&record, &window, options, store, dispatcher).await?;
        progress.contract_checked(&record.filename, i + 1, total);
        contracts.push(ContractReport {
            id: record.id,
            filename: record.filename,
            renewal_date: record.renewal_date,
            outcome,
        });
    }

    let report = NotifyReport {
        run_id,
        window,
        contracts,
        elapsed: start.elapsed(),
    };

    progress.finish();

    info!(
        run_id = %report.run_id,
        checked = total,
        sent = report.sent(),
        would_notify = report.would_notify(),
        outside_window = report.outside_window(),
        failed = report.failed(),
        elapsed_ms = report.elapsed.as_millis(),
        "notification pass complete"
    );

    Ok(report)
}

async fn check_contract(
    record: &ContractRecord,
    window: &RenewalWindow,
    options: &NotifyOptions,
    store: &dyn ContractRepository,
    dispatcher: &dyn Dispatcher,
) -> Result<NotifyOutcome> {
    if !window.contains(record.renewal_date) {
        debug!(id = record.id, date = %record.renewal_date, "outside window");
        return Ok(NotifyOutcome::OutsideWindow);
    }

    if options.dry_run {
        info!(id = record.id, filename = %record.filename, "would send reminder");
        return Ok(NotifyOutcome::WouldNotify);
    }

    let reminder = Reminder::for_contract(&record.filename, record.renewal_date, &options.recipient);
    if let Err(e) = dispatcher.dispatch(&reminder).await {
        if options.fail_fast {
            return Err(e);
        }
        error!(id = record.id, filename = %record.filename, error = %e, "reminder not sent");
        return Ok(NotifyOutcome::DispatchFailed {
            error: e.to_string(),
        });
    }

    if !store.mark_notified(record.id).await? {
        warn!(id = record.id, "record was already marked notified by another run");
    }
    info!(id = record.id, filename = %record.filename, date = %record.renewal_date, "reminder sent");
    Ok(NotifyOutcome::Sent)
}
