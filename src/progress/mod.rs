//! Labeling progress: how much of the record store is annotated, and who
//! did the work.

mod report;

pub use report::ProgressReport;

use crate::error::LabelError;
use crate::ledger::Ledger;
use crate::record::RecordStore;

/// Compute the progress report from the current contents of both stores.
pub fn progress_report(records: &RecordStore, ledger: &Ledger) -> Result<ProgressReport, LabelError> {
    let counts = records.count_annotated()?;
    Ok(ProgressReport {
        annotated: counts.annotated,
        total: counts.total,
        ledger: ledger.list()?,
    })
}
