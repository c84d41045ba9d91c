use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use issuetracker::StorageBackend;
use std::path::PathBuf;

/// Storage backend choices accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageArg {
    /// Keep issues in process memory
    Memory,
    /// Keep one JSON document per issue under --data-dir
    Filesystem,
}

impl From<StorageArg> for StorageBackend {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Memory => StorageBackend::Memory,
            StorageArg::Filesystem => StorageBackend::Filesystem,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "issuetracker")]
#[command(version)]
#[command(about = "A project-scoped issue tracking REST API")]
#[command(long_about = "
issuetracker serves a small REST API for tracking issues per project.
Issues are created, listed, updated and deleted under /api/issues/:project.

Example usage:
  issuetracker serve                          # Serve on 127.0.0.1:3000 with in-memory storage
  issuetracker serve --storage filesystem     # Persist issues as JSON documents
  issuetracker config --example > issuetracker.yaml
  issuetracker completion bash > ~/.bashrc.d/issuetracker
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the issue API server
    #[command(long_about = "
Runs the issue API server until interrupted with Ctrl-C.

Settings come from defaults, ISSUETRACKER_* environment variables, an
issuetracker.yaml file and finally the flags below, later sources winning.

Exit codes:
  0 - Clean shutdown
  1 - Failed to open storage, bind or serve
  2 - Invalid configuration

Examples:
  issuetracker serve
  issuetracker serve --port 8080 --host 0.0.0.0
  issuetracker serve --storage filesystem --data-dir ./issues
  issuetracker serve --config ./deploy/issuetracker.yaml
")]
    Serve(ServeArgs),
    /// Show the effective configuration
    #[command(long_about = "
Prints the configuration the server would start with, as YAML.
With --example, prints a commented example configuration file instead.

Examples:
  issuetracker config
  issuetracker config --config ./deploy/issuetracker.yaml
  issuetracker config --example > issuetracker.yaml
")]
    Config {
        /// Print an example configuration file
        #[arg(long)]
        example: bool,

        /// Read this YAML configuration file instead of searching for one
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    #[command(long_about = "
Generates shell completion scripts for issuetracker.

Examples:
  issuetracker completion bash > ~/.bashrc.d/issuetracker
  issuetracker completion zsh > ~/.zfunc/_issuetracker
  issuetracker completion fish > ~/.config/fish/completions/issuetracker.fish
")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Flags for `issuetracker serve`
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (0 picks a free port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Storage backend
    #[arg(long, value_enum)]
    pub storage: Option<StorageArg>,

    /// Directory for the filesystem backend
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Read this YAML configuration file instead of searching for one
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    /// Apply the flags that were given on top of `config`
    pub fn apply_to(&self, config: &mut issuetracker::ServerConfig) {
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(storage) = self.storage {
            config.storage = storage.into();
        }
        if let Some(ref data_dir) = self.data_dir {
            config.data_dir = data_dir.clone();
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    #[allow(dead_code)]
    pub fn try_parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuetracker::ServerConfig;

    #[test]
    fn test_cli_help_works() {
        let result = Cli::try_parse_from_args(["issuetracker", "--help"]);
        assert!(result.is_err()); // Help exits with error code but that's expected

        let error = result.unwrap_err();
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_works() {
        let result = Cli::try_parse_from_args(["issuetracker", "--version"]);
        let error = result.unwrap_err();
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_no_subcommand() {
        let cli = Cli::try_parse_from_args(["issuetracker"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.debug);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from_args([
            "issuetracker",
            "serve",
            "--host",
            "0.0.0.0",
            "-p",
            "8080",
            "--storage",
            "filesystem",
            "--data-dir",
            "/tmp/issues",
            "-q",
        ])
        .unwrap();
        assert!(cli.quiet);

        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        let mut config = ServerConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageBackend::Filesystem);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/issues"));
    }

    #[test]
    fn test_serve_without_flags_keeps_config() {
        let mut config = ServerConfig {
            port: 9999,
            ..Default::default()
        };
        ServeArgs::default().apply_to(&mut config);
        assert_eq!(config.port, 9999);
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_serve_rejects_unknown_storage() {
        let result = Cli::try_parse_from_args(["issuetracker", "serve", "--storage", "mongo"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_config_and_completion_commands() {
        let cli = Cli::try_parse_from_args(["issuetracker", "config", "--example"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config { example: true, config: None })
        ));

        let cli = Cli::try_parse_from_args(["issuetracker", "completion", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completion { shell: Shell::Zsh })
        ));
    }
}
