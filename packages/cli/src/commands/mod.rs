pub mod check;
pub mod fragments;
pub mod replay;

pub use check::{check, CheckArgs};
pub use fragments::{fragments, FragmentsArgs};
pub use replay::{replay, ReplayArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use folio_document::DocumentSession;
use folio_model::{prose, DocumentSnapshot};
use std::fs;
use std::path::Path;

/// Open a prose snapshot file as an editing session
pub(crate) fn open_session(path: &Path, config: &Config) -> Result<DocumentSession> {
    let source = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let snapshot = DocumentSnapshot::from_json(&source).with_context(|| format!("{} is not a snapshot", path.display()))?;
    let session = DocumentSession::load(path.display().to_string(), prose::schema()?, &snapshot, &config.session)?;
    Ok(session)
}
