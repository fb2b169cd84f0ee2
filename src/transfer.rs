//! CSV import and export through the store.

use crate::backend::PersistenceBackend;
use crate::codec::{self, DecodeError};
use crate::error::Result;
use crate::store::SubscriptionStore;
use chrono::NaiveDate;
use tracing::{info, warn};

/// How imported records combine with the existing collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    /// Discard existing records.
    Replace,
    /// Keep existing records and add the imported ones after them.
    Append,
}

/// Result of an import.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportReport {
    pub mode: ImportMode,
    /// Records written to the store.
    pub imported: usize,
    /// Per-row (or whole-input) problems, in input order.
    pub errors: Vec<DecodeError>,
}

impl ImportReport {
    /// True if nothing was written.
    pub fn is_noop(&self) -> bool {
        self.imported == 0
    }

    /// Error messages ready for display.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// `subscriptions_<YYYYMMDD>.csv` for the given date.
pub fn export_filename(date: NaiveDate) -> String {
    format!("subscriptions_{}.csv", date.format("%Y%m%d"))
}

/// Export filename for today's UTC date.
pub fn export_filename_today() -> String {
    export_filename(chrono::Utc::now().date_naive())
}

impl<B: PersistenceBackend> SubscriptionStore<B> {
    /// Encode the collection in display order.
    pub fn export_csv(&self) -> Result<String> {
        let subscriptions = self.list()?;
        info!(count = subscriptions.len(), "exporting subscriptions");
        Ok(codec::encode(&subscriptions))
    }

    /// Decode `text` and apply it with `mode`.
    ///
    /// Bad rows are skipped and reported. If no row decodes, the store is
    /// left untouched (no write, no event) even in replace mode.
    pub fn import_csv(&self, text: &str, mode: ImportMode) -> Result<ImportReport> {
        let outcome = codec::decode(text);
        let imported = outcome.subscriptions.len();

        if !outcome.errors.is_empty() {
            warn!(errors = outcome.errors.len(), "skipped rows during import");
        }

        if imported > 0 {
            match mode {
                ImportMode::Replace => self.replace_all(outcome.subscriptions)?,
                ImportMode::Append => self.append_all(outcome.subscriptions)?,
            }
        }
        info!(?mode, imported, "import finished");

        Ok(ImportReport {
            mode,
            imported,
            errors: outcome.errors,
        })
    }
}
