//! Parse → store → notify against a real libSQL database file.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use renewtrack_core::ingest::{self, IngestOutcome};
use renewtrack_core::notify::{self, NotifyOutcome};
use renewtrack_core::pipeline::SilentProgress;
use renewtrack_mailer::{Dispatcher, Reminder};
use renewtrack_shared::{IngestOptions, NotifyOptions, Result};
use renewtrack_storage::{ContractRepository, Storage};

#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<Reminder>>,
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, reminder: &Reminder) -> Result<()> {
        self.sent.lock().unwrap().push(reminder.clone());
        Ok(())
    }
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rt_e2e_{}", Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn expiring_contract_is_tracked_and_notified_once() {
    let root = scratch_dir();
    let docs = root.join("contracts");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(
        docs.join("supply-agreement.txt"),
        "SUPPLY AGREEMENT\n\nThis agreement Expires on: June 5, 2025.\n",
    )
    .unwrap();
    std::fs::write(docs.join("memo.txt"), "No dates worth tracking here.").unwrap();

    let db_path = root.join("contracts.db");
    let ingest_opts = IngestOptions {
        source_dir: docs,
        extensions: vec!["txt".into()],
        fail_fast: false,
    };

    // --- parse ---
    {
        let store = Storage::open(&db_path).await.expect("open store");
        let report = ingest::ingest_all(&ingest_opts, &store, &SilentProgress)
            .await
            .expect("ingest");
        assert_eq!(report.inserted(), 1);
        assert_eq!(report.documents[0].outcome, IngestOutcome::NoDate);
    }

    // --- parse again: nothing new ---
    {
        let store = Storage::open(&db_path).await.expect("reopen store");
        let report = ingest::ingest_all(&ingest_opts, &store, &SilentProgress)
            .await
            .expect("second ingest");
        assert_eq!(report.inserted(), 0);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].filename, "supply-agreement.txt");
        assert_eq!(all[0].renewal_date, date(2025, 6, 5));
        assert!(!all[0].notified);
    }

    // --- notify ---
    let dispatcher = RecordingDispatcher::default();
    let notify_opts = NotifyOptions {
        lookahead_days: 30,
        recipient: "legal@example.com".into(),
        dry_run: false,
        fail_fast: false,
    };
    {
        let store = Storage::open(&db_path).await.expect("reopen store");
        let report = notify::run_notification_pass(
            &notify_opts,
            date(2025, 5, 10),
            &store,
            &dispatcher,
            &SilentProgress,
        )
        .await
        .expect("notify");
        assert_eq!(report.contracts.len(), 1);
        assert_eq!(report.contracts[0].outcome, NotifyOutcome::Sent);
    }

    let sent = dispatcher.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("supply-agreement.txt"));
    assert!(sent[0].body.contains("2025-06-05"));

    // --- listing sees the flag; a second pass sends nothing ---
    let store = Storage::open_readonly(&db_path).await.expect("open read-only");
    let all = store.list_all().await.unwrap();
    assert!(all[0].notified);
    assert!(all[0].notified_at.is_some());
    drop(store);

    let store = Storage::open(&db_path).await.unwrap();
    let report = notify::run_notification_pass(
        &notify_opts,
        date(2025, 5, 11),
        &store,
        &dispatcher,
        &SilentProgress,
    )
    .await
    .unwrap();
    assert!(report.contracts.is_empty());
    assert_eq!(dispatcher.sent.lock().unwrap().len(), 1);
}
