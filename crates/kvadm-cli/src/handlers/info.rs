use super::print_or_skip;
use crate::args::{InfoCommand, NamespaceView};
use crate::context::{ReportContext, ReportRequest};
use anyhow::Result;
use kvadm_reports::ReportKind;

pub fn handle(ctx: &ReportContext, command: Option<InfoCommand>) -> Result<()> {
    let request = ReportRequest::default();
    let sources = ctx.sources();

    let Some(command) = command else {
        for kind in all_reports(ctx) {
            print_or_skip(ctx, kind, sources, &request)?;
        }
        return Ok(());
    };

    match command {
        InfoCommand::Network => ctx.print(ReportKind::InfoNetwork, sources, &request),
        InfoCommand::Namespace { view } => {
            for kind in namespace_reports(view) {
                ctx.print(kind, sources, &request)?;
            }
            Ok(())
        }
        InfoCommand::Set => ctx.print(ReportKind::InfoSet, sources, &request),
        InfoCommand::Xdr => ctx.print(ReportKind::xdr_for(sources), sources, &request),
        InfoCommand::Dc => ctx.print(ReportKind::InfoDc, sources, &request),
        InfoCommand::Sindex => ctx.print(ReportKind::InfoSindex, sources, &request),
    }
}

fn namespace_reports(view: Option<NamespaceView>) -> Vec<ReportKind> {
    match view {
        Some(NamespaceView::Usage) => vec![ReportKind::InfoNamespaceUsage],
        Some(NamespaceView::Object) => vec![ReportKind::InfoNamespaceObject],
        None => vec![ReportKind::InfoNamespaceUsage, ReportKind::InfoNamespaceObject],
    }
}

fn all_reports(ctx: &ReportContext) -> Vec<ReportKind> {
    let mut kinds = vec![ReportKind::InfoNetwork];
    kinds.extend(namespace_reports(None));
    kinds.extend([
        ReportKind::InfoSet,
        ReportKind::xdr_for(ctx.sources()),
        ReportKind::InfoDc,
        ReportKind::InfoSindex,
    ]);
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_without_view_prints_both() {
        assert_eq!(
            namespace_reports(None),
            vec![ReportKind::InfoNamespaceUsage, ReportKind::InfoNamespaceObject]
        );
        assert_eq!(namespace_reports(Some(NamespaceView::Object)), vec![ReportKind::InfoNamespaceObject]);
    }
}
