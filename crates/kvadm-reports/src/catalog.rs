use crate::error::{Error, Result};
use crate::{info, show, summary};
use kvadm_sheet::Sheet;
use kvadm_types::SourceSet;
use std::fmt;
use std::str::FromStr;

/// First server major version answering the 5.x XDR statistics.
const XDR5_MAJOR: u32 = 5;

/// Every report the client knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    InfoNetwork,
    InfoNamespaceUsage,
    InfoNamespaceObject,
    InfoSet,
    InfoXdr,
    InfoXdrLegacy,
    InfoDc,
    InfoSindex,
    ShowDistribution,
    ShowObjectSize,
    ShowPmap,
    ShowConfig,
    ShowConfigXdrNamespace,
    ShowLatencies,
    ShowUsers,
    ShowRoles,
    ShowUdfs,
    ShowSindex,
    ShowMappingToIp,
    ShowMappingToId,
    SummaryNamespace,
    GrepCount,
}

const ALL: [ReportKind; 22] = [
    ReportKind::InfoNetwork,
    ReportKind::InfoNamespaceUsage,
    ReportKind::InfoNamespaceObject,
    ReportKind::InfoSet,
    ReportKind::InfoXdr,
    ReportKind::InfoXdrLegacy,
    ReportKind::InfoDc,
    ReportKind::InfoSindex,
    ReportKind::ShowDistribution,
    ReportKind::ShowObjectSize,
    ReportKind::ShowPmap,
    ReportKind::ShowConfig,
    ReportKind::ShowConfigXdrNamespace,
    ReportKind::ShowLatencies,
    ReportKind::ShowUsers,
    ReportKind::ShowRoles,
    ReportKind::ShowUdfs,
    ReportKind::ShowSindex,
    ReportKind::ShowMappingToIp,
    ReportKind::ShowMappingToId,
    ReportKind::SummaryNamespace,
    ReportKind::GrepCount,
];

impl ReportKind {
    pub fn all() -> &'static [ReportKind] {
        &ALL
    }

    /// Stable name used on the command line and in `[reports.<name>]` config tables.
    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::InfoNetwork => "info-network",
            ReportKind::InfoNamespaceUsage => "info-namespace-usage",
            ReportKind::InfoNamespaceObject => "info-namespace-object",
            ReportKind::InfoSet => "info-set",
            ReportKind::InfoXdr => "info-xdr",
            ReportKind::InfoXdrLegacy => "info-xdr-legacy",
            ReportKind::InfoDc => "info-dc",
            ReportKind::InfoSindex => "info-sindex",
            ReportKind::ShowDistribution => "show-distribution",
            ReportKind::ShowObjectSize => "show-object-size",
            ReportKind::ShowPmap => "show-pmap",
            ReportKind::ShowConfig => "show-config",
            ReportKind::ShowConfigXdrNamespace => "show-config-xdr-namespace",
            ReportKind::ShowLatencies => "show-latencies",
            ReportKind::ShowUsers => "show-users",
            ReportKind::ShowRoles => "show-roles",
            ReportKind::ShowUdfs => "show-udfs",
            ReportKind::ShowSindex => "show-sindex",
            ReportKind::ShowMappingToIp => "show-mapping-ip",
            ReportKind::ShowMappingToId => "show-mapping-id",
            ReportKind::SummaryNamespace => "summary-namespace",
            ReportKind::GrepCount => "grep-count",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::InfoNetwork => "Network Information",
            ReportKind::InfoNamespaceUsage => "Namespace Usage Information",
            ReportKind::InfoNamespaceObject => "Namespace Object Information",
            ReportKind::InfoSet => "Set Information",
            ReportKind::InfoXdr | ReportKind::InfoXdrLegacy => "XDR Information",
            ReportKind::InfoDc => "DC Information",
            ReportKind::InfoSindex => "Secondary Index Information",
            ReportKind::ShowDistribution => "TTL Distribution in Seconds",
            ReportKind::ShowObjectSize => "Object Size Distribution in Bytes",
            ReportKind::ShowPmap => "Partition Map Analysis",
            ReportKind::ShowConfig => "Service Configuration",
            ReportKind::ShowConfigXdrNamespace => "XDR Namespace Configuration",
            ReportKind::ShowLatencies => "Latency",
            ReportKind::ShowUsers => "Users",
            ReportKind::ShowRoles => "Roles",
            ReportKind::ShowUdfs => "UDF Modules",
            ReportKind::ShowSindex => "Secondary Indexes",
            ReportKind::ShowMappingToIp => "Node ID to IP Mapping",
            ReportKind::ShowMappingToId => "IP to Node ID Mapping",
            ReportKind::SummaryNamespace => "Namespaces",
            ReportKind::GrepCount => "Count of Matched Lines",
        }
    }

    pub fn description(&self) -> Option<&'static str> {
        match self {
            ReportKind::InfoNamespaceUsage => Some(
                "Used% above HWM% is highlighted. Avail% below 10 means the namespace may stop accepting writes.",
            ),
            ReportKind::ShowDistribution => {
                Some("Percentage of records having a TTL less than or equal to the value in each column.")
            }
            ReportKind::ShowObjectSize => {
                Some("Number of records having a size less than or equal to the value in each column.")
            }
            ReportKind::ShowLatencies => Some("Values are the most recent interval per node."),
            _ => None,
        }
    }

    pub fn sheet(&self) -> Result<Sheet> {
        match self {
            ReportKind::InfoNetwork => info::network(),
            ReportKind::InfoNamespaceUsage => info::namespace_usage(),
            ReportKind::InfoNamespaceObject => info::namespace_object(),
            ReportKind::InfoSet => info::set(),
            ReportKind::InfoXdr => info::xdr(),
            ReportKind::InfoXdrLegacy => info::xdr_legacy(),
            ReportKind::InfoDc => info::dc(),
            ReportKind::InfoSindex => info::sindex(),
            ReportKind::ShowDistribution => show::distribution(),
            ReportKind::ShowObjectSize => show::object_size(),
            ReportKind::ShowPmap => show::pmap(),
            ReportKind::ShowConfig => show::config(),
            ReportKind::ShowConfigXdrNamespace => show::config_xdr_namespace(),
            ReportKind::ShowLatencies => show::latencies(),
            ReportKind::ShowUsers => show::users(),
            ReportKind::ShowRoles => show::roles(),
            ReportKind::ShowUdfs => show::udfs(),
            ReportKind::ShowSindex => show::sindex(),
            ReportKind::ShowMappingToIp => show::mapping_to_ip(),
            ReportKind::ShowMappingToId => show::mapping_to_id(),
            ReportKind::SummaryNamespace => summary::namespace(),
            ReportKind::GrepCount => show::grep_count(),
        }
    }

    /// The XDR report matching the cluster: the legacy view as soon as one node runs a
    /// server older than 5.0.
    pub fn xdr_for(sources: &SourceSet) -> ReportKind {
        let legacy = sources
            .get("builds")
            .into_iter()
            .flatten()
            .filter_map(|(_, build)| build.as_str())
            .filter_map(major_version)
            .any(|major| major < XDR5_MAJOR);
        if legacy {
            ReportKind::InfoXdrLegacy
        } else {
            ReportKind::InfoXdr
        }
    }
}

fn major_version(build: &str) -> Option<u32> {
    build.split('.').next()?.trim().parse().ok()
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ReportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ALL.iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownReport(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvadm_types::source_map;

    #[test]
    fn test_every_report_sheet_builds() {
        for kind in ReportKind::all() {
            assert!(kind.sheet().is_ok(), "{} failed validation", kind);
        }
    }

    #[test]
    fn test_names_round_trip_and_are_unique() {
        let mut names: Vec<&str> = ReportKind::all().iter().map(|k| k.name()).collect();
        for name in &names {
            assert_eq!(name.parse::<ReportKind>().unwrap().name(), *name);
        }
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ReportKind::all().len());
    }

    #[test]
    fn test_unknown_report() {
        assert!(matches!(
            "info-everything".parse::<ReportKind>(),
            Err(Error::UnknownReport(name)) if name == "info-everything"
        ));
    }

    #[test]
    fn test_xdr_variant_follows_oldest_build() {
        let modern = SourceSet::new().with("builds", source_map! { "A" => "6.2.0.1", "B" => "5.7.0" });
        assert_eq!(ReportKind::xdr_for(&modern), ReportKind::InfoXdr);

        let mixed = SourceSet::new().with("builds", source_map! { "A" => "6.2.0.1", "B" => "4.9.0.3" });
        assert_eq!(ReportKind::xdr_for(&mixed), ReportKind::InfoXdrLegacy);

        assert_eq!(ReportKind::xdr_for(&SourceSet::new()), ReportKind::InfoXdr);
    }
}
