use crate::config::ColorMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kvadm")]
#[command(about = "Render cluster snapshots as admin reports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Snapshot to read [default: $KVADM_HOME/snapshot.json]
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Config file [default: $KVADM_HOME/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log verbosity on stderr, unless KVADM_LOG is set
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Overrides `[display] color` from the config file
    #[arg(long, value_enum, global = true)]
    pub color: Option<ColorMode>,

    /// Terminal width to lay reports out for
    #[arg(long, global = true)]
    pub width: Option<usize>,

    /// Terminal height used to repeat title rows
    #[arg(long, global = true)]
    pub height: Option<usize>,

    /// Print field labels only once per line in row style
    #[arg(long, global = true)]
    pub no_title_repeat: bool,

    /// Render in the other style (rows <-> columns)
    #[arg(long, global = true)]
    pub flip: bool,

    /// Omit per-group aggregates
    #[arg(long, global = true)]
    pub no_aggregates: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Node, namespace, set, XDR and index statistics (all of them when no view is given)
    Info {
        #[command(subcommand)]
        command: Option<InfoCommand>,
    },

    /// Configuration, histograms and security objects
    Show {
        #[command(subcommand)]
        command: ShowCommand,
    },

    /// Cluster-wide namespace summary
    Summary,

    /// List available report names
    Reports,
}

#[derive(Subcommand, Debug)]
pub enum InfoCommand {
    Network,
    Namespace {
        #[arg(value_enum)]
        view: Option<NamespaceView>,
    },
    Set,
    Xdr,
    Dc,
    Sindex,
}

#[derive(Subcommand, Debug)]
pub enum ShowCommand {
    Config {
        /// Only show parameters whose values differ between nodes
        #[arg(long)]
        diff: bool,

        /// Only show parameters matching this regex (repeatable)
        #[arg(long = "like", value_name = "REGEX")]
        like: Vec<String>,

        /// Show per-namespace XDR configuration instead of service configuration
        #[arg(long)]
        xdr_namespace: bool,
    },
    Latencies {
        /// Only show histogram columns matching this regex (repeatable)
        #[arg(long = "like", value_name = "REGEX")]
        like: Vec<String>,
    },
    Distribution,
    ObjectSize,
    Pmap,
    Users,
    Roles,
    Udfs,
    Sindex,
    Mapping {
        #[arg(long, value_enum, default_value = "id")]
        by: MappingBy,
    },
    /// Matched-line counts of a log search
    GrepCount,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceView {
    Usage,
    Object,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingBy {
    /// Node ID -> IP
    Id,
    /// IP -> Node ID
    Ip,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show_config_flags() {
        let cli = Cli::try_parse_from([
            "kvadm", "show", "config", "--diff", "--like", "^service", "--like", "threads$", "--flip",
        ])
        .unwrap();
        assert!(cli.flip);
        match cli.command {
            Commands::Show {
                command: ShowCommand::Config { diff, like, xdr_namespace },
            } => {
                assert!(diff);
                assert!(!xdr_namespace);
                assert_eq!(like, vec!["^service", "threads$"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_info_without_view() {
        let cli = Cli::try_parse_from(["kvadm", "info"]).unwrap();
        assert!(matches!(cli.command, Commands::Info { command: None }));
    }

    #[test]
    fn test_mapping_defaults_to_id() {
        let cli = Cli::try_parse_from(["kvadm", "show", "mapping"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Show { command: ShowCommand::Mapping { by: MappingBy::Id } }
        ));
    }
}
