//! Report data structure (HTML is generated in the session_stakes_report
//! crate).

use crate::snapshot::SnapshotBundle;
use serde::{Deserialize, Serialize};

/// Data passed to the HTML report generator: bundle + reproducibility hash.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportData {
    pub bundle: SnapshotBundle,
    pub reproducibility_hash_sha256: String,
}
