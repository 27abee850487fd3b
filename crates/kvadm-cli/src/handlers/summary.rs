use crate::context::{ReportContext, ReportRequest};
use anyhow::Result;
use kvadm_reports::ReportKind;

pub fn handle(ctx: &ReportContext) -> Result<()> {
    ctx.print(ReportKind::SummaryNamespace, ctx.sources(), &ReportRequest::default())
}
