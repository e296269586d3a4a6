use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use chub_card_downloader::config::{
    default_config_path, find_config_file, load_config, BundleMode, Config, ConfigFile, Settings,
};
use chub_card_downloader::pipeline::{DownloadHandle, DownloadRequest, Downloader, StatusEvent};
use chub_card_downloader::sources::ChubSource;
use chub_card_downloader::ui::{self, Status};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chub Card Downloader - Download Chub.ai character cards with their gallery
#[derive(Parser, Debug)]
#[command(name = "chub-card-downloader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download Chub.ai character cards with their gallery and an HTML info sheet", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Defaults to `interactive`
    #[command(subcommand)]
    command: Option<Commands>,
}

/// How the card folder is left on disk
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BundleArg {
    /// Keep the loose folder
    Folder,
    /// Compress the folder into a zip archive
    Zip,
}

impl From<BundleArg> for BundleMode {
    fn from(arg: BundleArg) -> Self {
        match arg {
            BundleArg::Folder => BundleMode::Folder,
            BundleArg::Zip => BundleMode::Zip,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download a card by name or code
    #[command(alias = "d")]
    Download {
        /// Card name or code to search for
        name: String,

        /// Directory the card folder is created in (overrides the saved setting)
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Keep a folder or produce a zip archive (overrides the saved setting)
        #[arg(long, short, value_enum)]
        bundle: Option<BundleArg>,

        /// Chub.ai API token for this run only
        #[arg(long)]
        token: Option<String>,
    },

    /// Prompt for card names and download them one at a time
    #[command(alias = "i")]
    Interactive,

    /// Show or edit the saved settings
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Save the Chub.ai API token
    SetToken {
        /// Value of the `URQL_TOKEN` browser storage entry
        token: String,
    },

    /// Remove the saved API token
    ClearToken,

    /// Save the default output directory
    SetOutputDir {
        /// Directory card folders are created in
        dir: PathBuf,
    },

    /// Save the default bundle mode
    SetBundle {
        #[arg(value_enum)]
        mode: BundleArg,
    },
}

/// A line typed at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Empty,
    Quit,
    Help,
    ShowConfig,
    SetToken(Option<String>),
    SetOutputDir(PathBuf),
    SetBundle(BundleMode),
    Download(String),
    Invalid(String),
}

fn parse_repl_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return ReplCommand::Download(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match (name, arg) {
        ("q" | "quit" | "exit", _) => ReplCommand::Quit,
        ("h" | "help", _) => ReplCommand::Help,
        ("config", _) => ReplCommand::ShowConfig,
        ("token", "") => ReplCommand::Invalid("Usage: :token <value> | :token clear".to_string()),
        ("token", "clear") => ReplCommand::SetToken(None),
        ("token", token) => ReplCommand::SetToken(Some(token.to_string())),
        ("dir", "") => ReplCommand::Invalid("Usage: :dir <path>".to_string()),
        ("dir", dir) => ReplCommand::SetOutputDir(PathBuf::from(dir)),
        ("bundle", mode) => match mode.to_ascii_lowercase().as_str() {
            "folder" => ReplCommand::SetBundle(BundleMode::Folder),
            "zip" => ReplCommand::SetBundle(BundleMode::Zip),
            _ => ReplCommand::Invalid("Usage: :bundle folder|zip".to_string()),
        },
        (other, _) => ReplCommand::Invalid(format!("Unknown command :{}", other)),
    }
}

fn log_filter(cli: &Cli, configured: &str) -> String {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => configured,
            1 => "debug",
            _ => "trace",
        }
    };
    format!("chub_card_downloader={}", level)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "chub-card-downloader", &mut std::io::stdout());
        return Ok(());
    }

    // Explicit path, then a local or platform file, then where one would be created
    let config_path = cli
        .config
        .clone()
        .or_else(find_config_file)
        .unwrap_or_else(default_config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_filter(&cli, &config.logging.level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Using config file: {}", config_path.display());

    match cli.command {
        Some(Commands::Download {
            name,
            output_dir,
            bundle,
            token,
        }) => {
            let mut config = config;
            if token.is_some() {
                config.settings.api_token = token;
            }
            let mut request = DownloadRequest::from_settings(name, &config.settings);
            if let Some(dir) = output_dir {
                request = request.output_directory(dir);
            }
            if let Some(bundle) = bundle {
                request = request.bundle(bundle.into());
            }

            let source = ChubSource::from_config(&config)?;
            let handle = Downloader::new(Arc::new(source)).spawn(request);
            if !finish_download(handle, cli.quiet).await {
                std::process::exit(1);
            }
        }

        Some(Commands::Config(command)) => run_config_command(command, &config, &config_path)?,

        Some(Commands::Interactive) | None => run_interactive(config, &config_path).await?,

        Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}

fn run_config_command(command: ConfigCommands, config: &Config, path: &Path) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            ui::print_config(config);
            println!();
            println!("Config file: {}", path.display());
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::SetToken { token } => {
            ConfigFile::update_settings(path, |s| s.api_token = Some(token))?;
            ui::print_status(Status::Success, "API token saved.");
        }
        ConfigCommands::ClearToken => {
            ConfigFile::update_settings(path, |s| s.api_token = None)?;
            ui::print_status(Status::Success, "API token cleared.");
        }
        ConfigCommands::SetOutputDir { dir } => {
            let shown = dir.display().to_string();
            ConfigFile::update_settings(path, |s| s.output_directory = Some(dir))?;
            ui::print_status(Status::Success, &format!("Output directory set to {}", shown));
        }
        ConfigCommands::SetBundle { mode } => {
            let mode = BundleMode::from(mode);
            ConfigFile::update_settings(path, |s| s.bundle_option = mode)?;
            ui::print_status(Status::Success, &format!("Bundle option set to {}", mode));
        }
    }
    Ok(())
}

/// Print events until the download stops, then its result. Returns success.
async fn finish_download(mut handle: DownloadHandle, quiet: bool) -> bool {
    while let Some(event) = handle.next_event().await {
        if !quiet {
            ui::print_event(&event);
        }
    }
    report_result(handle).await
}

async fn report_result(handle: DownloadHandle) -> bool {
    match handle.wait().await {
        Ok(outcome) => {
            ui::print_outcome(&outcome);
            true
        }
        Err(e) => {
            ui::print_error(&e);
            false
        }
    }
}

enum Input {
    Event(Option<StatusEvent>),
    Line(std::io::Result<Option<String>>),
}

/// Save one settings edit and reload the merged configuration.
fn save_setting<F>(path: &Path, edit: F) -> Result<Config>
where
    F: FnOnce(&mut Settings),
{
    ConfigFile::update_settings(path, edit)
        .with_context(|| format!("Failed to save settings to {}", path.display()))?;
    load_config(path).with_context(|| format!("Failed to reload {}", path.display()))
}

/// Apply a settings edit from the prompt. A failure is printed and the
/// current configuration is kept.
fn apply_setting<F>(config: &mut Config, path: &Path, edit: F, success: &str)
where
    F: FnOnce(&mut Settings),
{
    match save_setting(path, edit) {
        Ok(updated) => {
            *config = updated;
            ui::print_status(Status::Success, success);
        }
        Err(e) => ui::print_status(Status::Error, &format!("{:#}", e)),
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Read card names from stdin and run one download at a time.
///
/// While a download is running its events are printed as they arrive and
/// any other input is refused.
async fn run_interactive(mut config: Config, config_path: &Path) -> Result<()> {
    ui::print_banner();
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut active: Option<DownloadHandle> = None;

    loop {
        let input = match active.as_mut() {
            Some(handle) => tokio::select! {
                event = handle.next_event() => Input::Event(event),
                line = lines.next_line() => Input::Line(line),
            },
            None => Input::Line(lines.next_line().await),
        };

        match input {
            Input::Event(Some(event)) => ui::print_event(&event),
            Input::Event(None) => {
                if let Some(handle) = active.take() {
                    report_result(handle).await;
                }
                prompt();
            }
            Input::Line(Err(e)) => {
                if let Some(handle) = active.take() {
                    finish_download(handle, false).await;
                }
                return Err(e).context("Failed to read from stdin");
            }
            Input::Line(Ok(None)) => {
                if let Some(handle) = active.take() {
                    finish_download(handle, false).await;
                }
                break;
            }
            Input::Line(Ok(Some(_))) if active.is_some() => {
                ui::print_status(
                    Status::Warning,
                    "A download is already running. Please wait for it to finish.",
                );
            }
            Input::Line(Ok(Some(line))) => {
                match parse_repl_line(&line) {
                    ReplCommand::Empty => {}
                    ReplCommand::Quit => break,
                    ReplCommand::Help => ui::print_banner(),
                    ReplCommand::ShowConfig => ui::print_config(&config),
                    ReplCommand::Invalid(message) => ui::print_status(Status::Error, &message),
                    ReplCommand::SetToken(token) => {
                        let message = if token.is_none() {
                            "API token cleared."
                        } else {
                            "API token saved."
                        };
                        apply_setting(&mut config, config_path, |s| s.api_token = token, message);
                    }
                    ReplCommand::SetOutputDir(dir) => {
                        let message = format!("Output directory set to {}", dir.display());
                        apply_setting(
                            &mut config,
                            config_path,
                            |s| s.output_directory = Some(dir),
                            &message,
                        );
                    }
                    ReplCommand::SetBundle(mode) => {
                        let message = format!("Bundle option set to {}", mode);
                        apply_setting(
                            &mut config,
                            config_path,
                            |s| s.bundle_option = mode,
                            &message,
                        );
                    }
                    ReplCommand::Download(query) => {
                        let request = DownloadRequest::from_settings(query, &config.settings);
                        match ChubSource::from_config(&config) {
                            Ok(source) => {
                                active = Some(Downloader::new(Arc::new(source)).spawn(request));
                                continue;
                            }
                            Err(e) => ui::print_status(Status::Error, &e.to_string()),
                        }
                    }
                }
                prompt();
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(!version.is_empty());
        // Version should be semantic versioning format
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["chub-card-downloader"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["chub-card-downloader", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["chub-card-downloader", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_download_command() {
        let cli = Cli::parse_from([
            "chub-card-downloader",
            "download",
            "Aria Test",
            "--output-dir",
            "/tmp/cards",
            "--bundle",
            "zip",
        ]);
        match cli.command {
            Some(Commands::Download {
                name,
                output_dir,
                bundle,
                ..
            }) => {
                assert_eq!(name, "Aria Test");
                assert_eq!(output_dir, Some(PathBuf::from("/tmp/cards")));
                assert_eq!(bundle, Some(BundleArg::Zip));
            }
            _ => panic!("Expected Download command"),
        }
    }

    #[test]
    fn test_cli_download_defaults_to_settings() {
        let cli = Cli::parse_from(["chub-card-downloader", "d", "Aria"]);
        match cli.command {
            Some(Commands::Download {
                output_dir, bundle, ..
            }) => {
                assert!(output_dir.is_none());
                assert!(bundle.is_none());
            }
            _ => panic!("Expected Download command"),
        }
    }

    #[test]
    fn test_cli_config_commands() {
        let cli = Cli::parse_from(["chub-card-downloader", "config", "set-bundle", "folder"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigCommands::SetBundle {
                mode: BundleArg::Folder
            }))
        ));

        let cli = Cli::parse_from(["chub-card-downloader", "config", "set-token", "abc"]);
        match cli.command {
            Some(Commands::Config(ConfigCommands::SetToken { token })) => assert_eq!(token, "abc"),
            _ => panic!("Expected SetToken command"),
        }
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::parse_from(["chub-card-downloader"]);
        assert_eq!(log_filter(&cli, "warn"), "chub_card_downloader=warn");

        let cli = Cli::parse_from(["chub-card-downloader", "-v"]);
        assert_eq!(log_filter(&cli, "warn"), "chub_card_downloader=debug");

        let cli = Cli::parse_from(["chub-card-downloader", "-q", "-vv"]);
        assert_eq!(log_filter(&cli, "info"), "chub_card_downloader=error");
    }

    #[test]
    fn test_save_setting_reloads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = save_setting(&path, |s| s.bundle_option = BundleMode::Zip).unwrap();
        assert_eq!(config.settings.bundle_option, BundleMode::Zip);
        assert!(path.exists());
    }

    #[test]
    fn test_failed_setting_keeps_current_config() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let path = blocker.join("config.toml");

        assert!(save_setting(&path, |s| s.bundle_option = BundleMode::Zip).is_err());

        let mut config = Config::default();
        apply_setting(
            &mut config,
            &path,
            |s| s.bundle_option = BundleMode::Zip,
            "Bundle option set to zip",
        );
        assert_eq!(config.settings.bundle_option, BundleMode::Folder);
    }

    #[test]
    fn test_parse_repl_line() {
        assert_eq!(parse_repl_line("   "), ReplCommand::Empty);
        assert_eq!(
            parse_repl_line(" Aria Test "),
            ReplCommand::Download("Aria Test".to_string())
        );
        assert_eq!(parse_repl_line(":q"), ReplCommand::Quit);
        assert_eq!(parse_repl_line(":token clear"), ReplCommand::SetToken(None));
        assert_eq!(
            parse_repl_line(":token abc"),
            ReplCommand::SetToken(Some("abc".to_string()))
        );
        assert_eq!(
            parse_repl_line(":dir /tmp/my cards"),
            ReplCommand::SetOutputDir(PathBuf::from("/tmp/my cards"))
        );
        assert_eq!(parse_repl_line(":bundle ZIP"), ReplCommand::SetBundle(BundleMode::Zip));
        assert!(matches!(parse_repl_line(":bundle tar"), ReplCommand::Invalid(_)));
        assert!(matches!(parse_repl_line(":nope"), ReplCommand::Invalid(_)));
    }
}
