pub mod info;
pub mod reports;
pub mod show;
pub mod summary;

use crate::context::{ReportContext, ReportRequest};
use anyhow::Result;
use kvadm_reports::ReportKind;
use kvadm_types::SourceSet;
use tracing::warn;

/// Print `kind`, or log and move on when the snapshot lacks one of its sources.
/// Used where several reports are printed in one go.
pub(crate) fn print_or_skip(
    ctx: &ReportContext,
    kind: ReportKind,
    sources: &SourceSet,
    request: &ReportRequest,
) -> Result<()> {
    let Err(err) = ctx.print(kind, sources, request) else {
        return Ok(());
    };
    let missing = match err.downcast_ref::<kvadm_sheet::Error>() {
        Some(kvadm_sheet::Error::MissingSource(source)) => source.clone(),
        _ => return Err(err),
    };
    warn!(report = kind.name(), source = %missing, "skipping report: source not in snapshot");
    Ok(())
}
