use crate::context::write_stdout;
use anyhow::Result;
use kvadm_reports::ReportKind;

pub fn handle() -> Result<()> {
    write_stdout(&listing())
}

fn listing() -> String {
    let width = ReportKind::all()
        .iter()
        .map(|kind| kind.name().len())
        .max()
        .unwrap_or(0);

    ReportKind::all()
        .iter()
        .map(|kind| format!("{:<width$}  {}\n", kind.name(), kind.title(), width = width))
        .collect()
}
