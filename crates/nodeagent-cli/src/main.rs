use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use nodeagent_core::{LifecycleAction, Outcome};
use nodeagent_installer::{LifecycleManager, NpmRunner};
use tracing::{error, info};

mod completion;
mod logging;
mod render;
mod settings;

use completion::write_completions_script;
use logging::init_logging;
use render::{current_output_style, render_status_line, write_outcome};
use settings::{home_dir, load_file_config, resolve_settings};

#[derive(Parser, Debug)]
#[command(name = "splunk-otel-manager")]
#[command(
    about = "Splunk OpenTelemetry Node.js agent manager",
    long_about = "Install, uninstall, roll back and upgrade the @splunk/otel npm package in a \
                  destination folder, keeping one backup generation for rollback."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Config file, YAML or TOML by extension (default: $HOME/.splunk-otel-manager.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Destination folder for the agent installation
    #[arg(long, global = true, env = "DEST_FOLDER", value_name = "PATH")]
    dest_folder: Option<PathBuf>,
    /// Backup folder (default: <dest-folder>/backup)
    #[arg(long, global = true, env = "BACKUP_FOLDER", value_name = "PATH")]
    backup_folder: Option<PathBuf>,
    /// Agent version to install or upgrade to
    #[arg(
        long = "version",
        global = true,
        env = "AGENT_VERSION",
        value_name = "VERSION"
    )]
    agent_version: Option<String>,
    /// Splunk access token
    #[arg(long, global = true, env = "ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    /// OTLP endpoint URL
    #[arg(long, global = true, env = "OTLP_ENDPOINT", value_name = "URL")]
    otlp_endpoint: Option<String>,
    /// Keep backup files after uninstall [default: true]
    #[arg(
        long,
        global = true,
        env = "KEEP_BACKUP",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    keep_backup: Option<bool>,
    /// npm registry URL
    #[arg(long, global = true, env = "NPM_REGISTRY", value_name = "URL")]
    npm_registry: Option<String>,
    /// Agent node name
    #[arg(long, global = true, env = "AGENT_NODE_NAME", value_name = "NAME")]
    node_name: Option<String>,
    /// Don't add the -0 suffix to the node name
    #[arg(
        long,
        global = true,
        env = "NO_NODE_NAME_SUFFIX",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    no_node_name_suffix: Option<bool>,
    /// npm executable used for install and uninstall
    #[arg(long, global = true, env = "NPM_BIN", value_name = "PATH")]
    npm_bin: Option<PathBuf>,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install the Splunk OpenTelemetry Node.js agent
    Install,
    /// Uninstall the Splunk OpenTelemetry Node.js agent
    Uninstall,
    /// Roll back to the previously backed up agent version
    Rollback,
    /// Upgrade the agent, backing up the current version first
    Upgrade,
    /// Print a shell completion script
    Completions { shell: Shell },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Install => run_lifecycle(&cli.global, LifecycleAction::Install),
        Commands::Uninstall => run_lifecycle(&cli.global, LifecycleAction::Uninstall),
        Commands::Rollback => run_lifecycle(&cli.global, LifecycleAction::Rollback),
        Commands::Upgrade => run_lifecycle(&cli.global, LifecycleAction::Upgrade),
        Commands::Completions { shell } => {
            write_completions_script(shell, &mut io::stdout())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_lifecycle(global: &GlobalArgs, action: LifecycleAction) -> Result<ExitCode> {
    init_logging(global.verbose);
    let mut stdout = io::stdout();

    let file_config = match load_file_config(global.config.as_deref(), home_dir().as_deref()) {
        Ok(file_config) => file_config,
        Err(err) => {
            error!(error = %format!("{err:#}"), "failed to load config file");
            let outcome = Outcome::failure(action, format!("Configuration failed: {err:#}"));
            write_outcome(&outcome, &mut stdout)?;
            return Ok(ExitCode::FAILURE);
        }
    };
    if let Some((path, _)) = &file_config {
        info!(path = %path.display(), "using config file");
    }

    let settings = resolve_settings(global, file_config.map(|(_, config)| config));
    let manager = LifecycleManager::new(settings.agent, NpmRunner::new(settings.npm_bin));

    let style = current_output_style();
    match manager.run(action) {
        Ok(outcome) => {
            write_outcome(&outcome, &mut stdout)?;
            if let Some(line) = render_status_line(style, &outcome) {
                eprintln!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            write_outcome(&failure.outcome, &mut stdout)?;
            if let Some(line) = render_status_line(style, &failure.outcome) {
                eprintln!("{line}");
            }
            error!(error = %format!("{:#}", failure.error), "{failure}");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests;
