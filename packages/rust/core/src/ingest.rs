//! Document ingestion: read every contract document in the source directory,
//! extract its renewal date, and record first sightings in the store.
//!
//! Re-running over an unchanged directory is a no-op. A filename that is
//! already stored is never updated, even if the document's date changed.

use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use renewtrack_shared::{IngestOptions, Result, RunId};
use renewtrack_storage::ContractRepository;

use crate::document;
use crate::pipeline::ProgressReporter;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new record was created.
    Inserted { id: i64, renewal_date: NaiveDate },
    /// A date was found but the filename is already tracked.
    AlreadyTracked { renewal_date: NaiveDate },
    /// No recognizable renewal date; the document will be rescanned next run.
    NoDate,
    /// The document could not be opened or its text extracted.
    ReadFailed { error: String },
}

/// Outcome for a single source document.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    /// File name within the source directory.
    pub filename: String,
    pub outcome: IngestOutcome,
}

/// Result of an ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    /// Identifier tagging this run in logs.
    pub run_id: RunId,
    /// Per-document outcomes, in processing order.
    pub documents: Vec<DocumentReport>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

impl IngestReport {
    fn count(&self, pred: impl Fn(&IngestOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }

    /// Number of new records created.
    pub fn inserted(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::Inserted { .. }))
    }

    /// Number of documents whose filename was already stored.
    pub fn already_tracked(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::AlreadyTracked { .. }))
    }

    /// Number of documents without a recognizable date.
    pub fn no_date(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::NoDate))
    }

    /// Number of documents that could not be read.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, IngestOutcome::ReadFailed { .. }))
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Scan `options.source_dir` and record every newly seen dated document.
///
/// Unreadable documents are reported and skipped unless `options.fail_fast`
/// is set. Store errors always abort the run; records inserted before the
/// failure stay in place.
#[instrument(skip_all, fields(source_dir = %options.source_dir.display()))]
pub async fn ingest_all(
    options: &IngestOptions,
    store: &dyn ContractRepository,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, "starting ingestion");

    progress.phase("Listing documents");
    let paths = document::list_documents(&options.source_dir, &options.extensions)?;
    let total = paths.len();

    progress.phase("Reading documents");
    let mut documents = Vec::with_capacity(total);

    for (i, path) in paths.iter().enumerate() {
        let filename = file_name(path);

        let outcome = match document::read_document_text(path).await {
            Ok(text) => ingest_text(&filename, &text, store).await?,
            Err(e) if options.fail_fast => return Err(e),
            Err(e) => {
                warn!(%filename, error = %e, "cannot read document, skipping");
                IngestOutcome::ReadFailed {
                    error: e.to_string(),
                }
            }
        };

        progress.document_scanned(&filename, i + 1, total);
        documents.push(DocumentReport { filename, outcome });
    }

    let report = IngestReport {
        run_id,
        documents,
        elapsed: start.elapsed(),
    };

    progress.finish();

    info!(
        run_id = %report.run_id,
        scanned = total,
        inserted = report.inserted(),
        already_tracked = report.already_tracked(),
        no_date = report.no_date(),
        failed = report.failed(),
        elapsed_ms = report.elapsed.as_millis(),
        "ingestion complete"
    );

    Ok(report)
}

/// Match one document's text and insert a record if it is new.
pub async fn ingest_text(
    filename: &str,
    text: &str,
    store: &dyn ContractRepository,
) -> Result<IngestOutcome> {
    let Some(found) = renewtrack_extractor::extract(text) else {
        debug!(filename, "no renewal date found");
        return Ok(IngestOutcome::NoDate);
    };

    if store.exists(filename).await? {
        debug!(filename, date = %found.date, "already tracked");
        return Ok(IngestOutcome::AlreadyTracked {
            renewal_date: found.date,
        });
    }

    let id = store.insert(filename, found.date).await?;
    info!(
        filename,
        id,
        date = %found.date,
        phrase = %found.phrase,
        matched = %found.matched,
        "tracking new contract"
    );
    Ok(IngestOutcome::Inserted {
        id,
        renewal_date: found.date,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::pipeline::SilentProgress;
    use renewtrack_shared::RenewTrackError;
    use renewtrack_storage::MemoryStore;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn docs_dir(files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rt_ingest_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
        dir
    }

    fn options(dir: PathBuf, extensions: &[&str]) -> IngestOptions {
        IngestOptions {
            source_dir: dir,
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            fail_fast: false,
        }
    }

    #[tokio::test]
    async fn inserts_dated_documents_and_skips_the_rest() {
        let dir = docs_dir(&[
            ("lease.txt", "Expires on: June 5, 2025"),
            ("nda.txt", "Confidentiality obligations survive termination."),
            ("vendor.txt", "Renewal date: 2025-09-30"),
        ]);
        let store = MemoryStore::new();

        let report = ingest_all(&options(dir, &["txt"]), &store, &SilentProgress)
            .await
            .expect("ingest");

        assert_eq!(report.documents.len(), 3);
        assert_eq!(report.inserted(), 2);
        assert_eq!(report.no_date(), 1);
        assert_eq!(report.documents[1].filename, "nda.txt");
        assert_eq!(report.documents[1].outcome, IngestOutcome::NoDate);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].filename, "lease.txt");
        assert_eq!(all[0].renewal_date, date(2025, 6, 5));
        assert!(!all[0].notified);
        assert!(!store.exists("nda.txt").await.unwrap());
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let dir = docs_dir(&[
            ("a.txt", "Renewal date: March 1, 2025"),
            ("b.txt", "expires on 2025-04-01"),
        ]);
        let opts = options(dir, &["txt"]);
        let store = MemoryStore::new();

        ingest_all(&opts, &store, &SilentProgress).await.unwrap();
        let first = store.list_all().await.unwrap();

        let report = ingest_all(&opts, &store, &SilentProgress).await.unwrap();
        assert_eq!(report.inserted(), 0);
        assert_eq!(report.already_tracked(), 2);
        assert_eq!(store.list_all().await.unwrap(), first);
    }

    #[tokio::test]
    async fn changed_document_does_not_update_stored_date() {
        let dir = docs_dir(&[("a.txt", "Renewal date: 2025-03-01")]);
        let opts = options(dir.clone(), &["txt"]);
        let store = MemoryStore::new();
        ingest_all(&opts, &store, &SilentProgress).await.unwrap();

        std::fs::write(dir.join("a.txt"), "Renewal date: 2026-03-01").unwrap();
        let report = ingest_all(&opts, &store, &SilentProgress).await.unwrap();

        assert_eq!(
            report.documents[0].outcome,
            IngestOutcome::AlreadyTracked {
                renewal_date: date(2026, 3, 1)
            }
        );
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].renewal_date, date(2025, 3, 1));
    }

    #[tokio::test]
    async fn pdf_date_on_second_page_is_inserted() {
        let dir = docs_dir(&[]);
        let fixture =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/two_page_contract.pdf");
        std::fs::copy(&fixture, dir.join("services.pdf")).unwrap();
        let store = MemoryStore::new();

        let report = ingest_all(&options(dir, &["pdf"]), &store, &SilentProgress)
            .await
            .expect("ingest");

        assert_eq!(report.documents.len(), 1);
        assert!(matches!(
            report.documents[0].outcome,
            IngestOutcome::Inserted { renewal_date, .. } if renewal_date == date(2025, 6, 5)
        ));
        assert!(store.exists("services.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn unreadable_document_does_not_stop_the_batch() {
        let dir = docs_dir(&[
            ("a_broken.pdf", "definitely not a pdf"),
            ("b_good.txt", "Renewal date: 2025-05-05"),
        ]);
        let store = MemoryStore::new();

        let report = ingest_all(&options(dir, &["pdf", "txt"]), &store, &SilentProgress)
            .await
            .expect("ingest");

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.documents[0].outcome,
            IngestOutcome::ReadFailed { .. }
        ));
        assert_eq!(report.inserted(), 1);
        assert!(store.exists("b_good.txt").await.unwrap());
    }

    #[tokio::test]
    async fn fail_fast_aborts_on_unreadable_document() {
        let dir = docs_dir(&[
            ("a_broken.pdf", "definitely not a pdf"),
            ("b_good.txt", "Renewal date: 2025-05-05"),
        ]);
        let mut opts = options(dir, &["pdf", "txt"]);
        opts.fail_fast = true;
        let store = MemoryStore::new();

        let err = ingest_all(&opts, &store, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, RenewTrackError::DocumentRead { .. }));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ignores_other_extensions() {
        let dir = docs_dir(&[
            ("a.txt", "Renewal date: 2025-05-05"),
            ("b.md", "Renewal date: 2025-06-06"),
        ]);
        let store = MemoryStore::new();
        let report = ingest_all(&options(dir, &["txt"]), &store, &SilentProgress)
            .await
            .unwrap();
        assert_eq!(report.documents.len(), 1);
        assert!(!store.exists("b.md").await.unwrap());
    }
}
