use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "verlog",
    about = "Diff-chain history for JSON documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with store settings (`label`, `min_token_len`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Field holding the embedded history (overrides the config file)
    #[arg(long, global = true)]
    pub label: Option<String>,

    /// Minimum token length for diffs (overrides the config file)
    #[arg(long, global = true)]
    pub min_token_len: Option<usize>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Commit the document's current state to its history
    Push(DocArgs),
    /// Drop the last history entry and restore the state before it
    Pop(DocArgs),
    /// Mark the document as deleted
    Delete(DocArgs),
    /// Restore the previous state, recording the rollback in history
    Rollback(DocArgs),
    /// Show the document's history
    Log(LogArgs),
    /// Check the embedded history for integrity problems
    Verify(DocArgs),
    /// Show the operations that turn one file back into another
    Diff(DiffArgs),
}

#[derive(Args)]
pub struct DocArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct LogArgs {
    pub file: PathBuf,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
    /// Print the reconstructed snapshot of every entry
    #[arg(long)]
    pub show: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub newer: PathBuf,
    pub older: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_push() {
        let cli = Cli::try_parse_from(["verlog", "push", "doc.json"]).unwrap();
        if let Command::Push(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("doc.json"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_rollback() {
        let cli = Cli::try_parse_from(["verlog", "rollback", "doc.json"]).unwrap();
        assert!(matches!(cli.command, Command::Rollback(_)));
    }

    #[test]
    fn parse_log_oneline() {
        let cli = Cli::try_parse_from(["verlog", "log", "doc.json", "--oneline", "-n", "5"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert!(args.oneline);
            assert!(!args.show);
            assert_eq!(args.limit, 5);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_diff() {
        let cli = Cli::try_parse_from(["verlog", "diff", "new.json", "old.json"]).unwrap();
        if let Command::Diff(args) = cli.command {
            assert_eq!(args.newer, PathBuf::from("new.json"));
            assert_eq!(args.older, PathBuf::from("old.json"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_store_overrides() {
        let cli = Cli::try_parse_from([
            "verlog", "push", "doc.json", "--label", "_meta", "--min-token-len", "4",
        ])
        .unwrap();
        assert_eq!(cli.label, Some("_meta".into()));
        assert_eq!(cli.min_token_len, Some(4));
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["verlog", "--verbose", "verify", "doc.json"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["verlog", "--format", "json", "pop", "doc.json"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn diff_requires_two_files() {
        assert!(Cli::try_parse_from(["verlog", "diff", "new.json"]).is_err());
    }
}
