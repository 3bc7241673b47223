//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::net::IpAddr;
use std::path::PathBuf;

/// Local development server with live reload
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory to serve
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub root: PathBuf,

    /// Port number to listen on (default: 8000)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Index document served for directory URLs (default: index.html)
    #[arg(long)]
    pub index: Option<String>,

    /// Serve files without watching for changes
    #[arg(long)]
    pub no_watch: bool,

    /// Number of request handler threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Config file path (default: hotserve.toml)
    #[arg(short = 'C', long, default_value = "hotserve.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Log every request, edge and session
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_are_unset() {
        let cli = Cli::parse_from(["hotserve", "site"]);
        assert_eq!(cli.root, PathBuf::from("site"));
        assert_eq!(cli.port, None);
        assert_eq!(cli.interface, None);
        assert!(!cli.no_watch);
        assert_eq!(cli.config, PathBuf::from("hotserve.toml"));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::parse_from([
            "hotserve", "public", "-p", "9000", "-i", "0.0.0.0", "--index", "home.html",
            "--no-watch", "-w", "2", "-C", "dev.toml", "-v", "--color", "never",
        ]);
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.interface, Some("0.0.0.0".parse().unwrap()));
        assert_eq!(cli.index.as_deref(), Some("home.html"));
        assert!(cli.no_watch);
        assert_eq!(cli.workers, Some(2));
        assert_eq!(cli.config, PathBuf::from("dev.toml"));
        assert!(cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn test_root_is_required() {
        assert!(Cli::try_parse_from(["hotserve"]).is_err());
    }
}
