use super::*;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::error::ErrorKind;
use clap_complete::Shell;
use nodeagent_core::DEFAULT_NPM_REGISTRY;

use crate::render::OutputStyle;
use crate::settings::{ConfigFormat, FileConfig, DEFAULT_CONFIG_FILE_NAME};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let sequence = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!(
        "nodeagent-cli-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        sequence
    ));
    std::fs::create_dir_all(&path).expect("must create test dir");
    path
}

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["splunk-otel-manager"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("cli args must parse")
}

#[test]
fn cli_parses_global_flags_after_subcommand() {
    let cli = parse(&[
        "install",
        "--dest-folder",
        "/srv/agent",
        "--version",
        "^2.1.0",
        "--node-name",
        "web",
        "--npm-registry",
        "https://npm.internal.test",
    ]);
    assert!(matches!(cli.command, Commands::Install));
    assert_eq!(cli.global.dest_folder, Some(PathBuf::from("/srv/agent")));
    assert_eq!(cli.global.agent_version.as_deref(), Some("^2.1.0"));
    assert_eq!(cli.global.node_name.as_deref(), Some("web"));
    assert_eq!(
        cli.global.npm_registry.as_deref(),
        Some("https://npm.internal.test")
    );
}

#[test]
fn cli_bool_flags_accept_bare_and_explicit_values() {
    let cli = parse(&["uninstall", "--keep-backup=false", "--no-node-name-suffix"]);
    assert_eq!(cli.global.keep_backup, Some(false));
    assert_eq!(cli.global.no_node_name_suffix, Some(true));

    let cli = parse(&["--keep-backup", "rollback"]);
    assert!(matches!(cli.command, Commands::Rollback));
    assert_eq!(cli.global.keep_backup, Some(true));
}

#[test]
fn cli_verbose_short_flag() {
    let cli = parse(&["-v", "upgrade"]);
    assert!(cli.global.verbose);
    assert!(matches!(cli.command, Commands::Upgrade));
}

#[test]
fn cli_requires_subcommand() {
    let err = Cli::try_parse_from(["splunk-otel-manager"]).expect_err("subcommand is required");
    assert!(matches!(
        err.kind(),
        ErrorKind::MissingSubcommand | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ));
}

#[test]
fn cli_rejects_non_boolean_keep_backup() {
    let err = Cli::try_parse_from(["splunk-otel-manager", "install", "--keep-backup=maybe"])
        .expect_err("invalid bool must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn resolve_settings_uses_builtin_defaults() {
    let settings = resolve_settings(&GlobalArgs::default(), None);
    assert_eq!(
        settings.agent.dest_folder,
        PathBuf::from("/opt/splunk-nodejs-agent")
    );
    assert_eq!(
        settings.agent.backup_folder,
        PathBuf::from("/opt/splunk-nodejs-agent/backup")
    );
    assert_eq!(settings.agent.agent_version, "latest");
    assert_eq!(settings.agent.npm_registry, DEFAULT_NPM_REGISTRY);
    assert!(settings.agent.keep_backup);
    assert!(!settings.agent.no_node_name_suffix);
    assert_eq!(settings.npm_bin, PathBuf::from("npm"));
}

#[test]
fn resolve_settings_prefers_args_over_file() {
    let args = GlobalArgs {
        dest_folder: Some(PathBuf::from("/from/flag")),
        keep_backup: Some(false),
        ..GlobalArgs::default()
    };
    let file = FileConfig {
        dest_folder: Some(PathBuf::from("/from/file")),
        agent_version: Some("1.9.0".to_string()),
        keep_backup: Some(true),
        agent_node_name: Some("api".to_string()),
        npm_bin: Some(PathBuf::from("/usr/local/bin/npm")),
        ..FileConfig::default()
    };

    let settings = resolve_settings(&args, Some(file));
    assert_eq!(settings.agent.dest_folder, PathBuf::from("/from/flag"));
    assert_eq!(
        settings.agent.backup_folder,
        PathBuf::from("/from/flag/backup")
    );
    assert_eq!(settings.agent.agent_version, "1.9.0");
    assert!(!settings.agent.keep_backup);
    assert_eq!(settings.agent.agent_node_name, "api");
    assert_eq!(settings.npm_bin, PathBuf::from("/usr/local/bin/npm"));
}

#[test]
fn file_config_parses_known_keys() {
    let config = FileConfig::parse(
        r#"
dest_folder = "/srv/agent"
agent_version = "~2.3.0"
access_token = "token"
otlp_endpoint = "http://collector:4318"
keep_backup = false
npm_registry = "https://npm.internal.test"
agent_node_name = "web"
no_node_name_suffix = true
"#,
        ConfigFormat::Toml,
    )
    .expect("config should parse");
    assert_eq!(config.dest_folder, Some(PathBuf::from("/srv/agent")));
    assert_eq!(config.agent_version.as_deref(), Some("~2.3.0"));
    assert_eq!(config.keep_backup, Some(false));
    assert_eq!(config.no_node_name_suffix, Some(true));
    assert_eq!(config.backup_folder, None);
}

#[test]
fn file_config_rejects_unknown_keys() {
    let err = FileConfig::parse("dest_foldr: /typo\n", ConfigFormat::Yaml)
        .expect_err("unknown key must be rejected");
    assert!(
        err.to_string().contains("failed to parse config file"),
        "unexpected error: {err}"
    );
}

#[test]
fn load_file_config_skips_missing_default_file() {
    let home = test_dir();
    let loaded = load_file_config(None, Some(&home)).expect("missing default is not an error");
    assert_eq!(loaded, None);
    assert_eq!(load_file_config(None, None).expect("no home, no config"), None);

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn load_file_config_reads_default_file_from_home() {
    let home = test_dir();
    std::fs::write(
        home.join(DEFAULT_CONFIG_FILE_NAME),
        "agent_node_name: from-home\ndest_folder: /srv/agent\n",
    )
    .expect("must write config");

    let (path, config) = load_file_config(None, Some(&home))
        .expect("must load config")
        .expect("default config must be found");
    assert_eq!(path, home.join(DEFAULT_CONFIG_FILE_NAME));
    assert_eq!(config.agent_node_name.as_deref(), Some("from-home"));
    assert_eq!(config.dest_folder, Some(PathBuf::from("/srv/agent")));

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn file_config_parses_yaml_keys() {
    let config = FileConfig::parse(
        r#"
dest_folder: /srv/agent
agent_version: "^2.3.0"
keep_backup: false
agent_node_name: web
"#,
        ConfigFormat::Yaml,
    )
    .expect("yaml config should parse");
    assert_eq!(config.dest_folder, Some(PathBuf::from("/srv/agent")));
    assert_eq!(config.agent_version.as_deref(), Some("^2.3.0"));
    assert_eq!(config.keep_backup, Some(false));
    assert_eq!(config.agent_node_name.as_deref(), Some("web"));
}

#[test]
fn config_format_follows_extension() {
    for (name, format) in [
        ("cfg.yaml", ConfigFormat::Yaml),
        ("cfg.YML", ConfigFormat::Yaml),
        ("cfg", ConfigFormat::Yaml),
        ("cfg.toml", ConfigFormat::Toml),
        ("cfg.json", ConfigFormat::Json),
    ] {
        assert_eq!(
            ConfigFormat::from_path(Path::new(name)).expect("format must resolve"),
            format,
            "{name}"
        );
    }
    let err = ConfigFormat::from_path(Path::new("cfg.ini")).expect_err("ini is unsupported");
    assert!(
        err.to_string().contains("unsupported config file format 'ini'"),
        "unexpected error: {err}"
    );
}

#[test]
fn load_file_config_picks_parser_from_explicit_extension() {
    let home = test_dir();
    let yaml = home.join("manager.yml");
    std::fs::write(&yaml, "dest_folder: /srv/agent\n").expect("must write yaml config");
    let (_, config) = load_file_config(Some(&yaml), Some(&home))
        .expect("yaml config must load")
        .expect("explicit config must be returned");
    assert_eq!(config.dest_folder, Some(PathBuf::from("/srv/agent")));

    let toml = home.join("manager.toml");
    std::fs::write(&toml, "dest_folder = \"/srv/toml\"\n").expect("must write toml config");
    let (_, config) = load_file_config(Some(&toml), Some(&home))
        .expect("toml config must load")
        .expect("explicit config must be returned");
    assert_eq!(config.dest_folder, Some(PathBuf::from("/srv/toml")));

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn load_file_config_requires_explicit_file() {
    let home = test_dir();
    let missing = home.join("missing.toml");
    let err = load_file_config(Some(&missing), Some(&home))
        .expect_err("explicit missing config must fail");
    assert!(
        err.to_string().contains("failed to read config file"),
        "unexpected error: {err}"
    );

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn write_outcome_emits_indented_json_line() {
    let outcome = Outcome::failure(LifecycleAction::Rollback, "No backup version found");
    let mut buffer = Vec::new();
    write_outcome(&outcome, &mut buffer).expect("must write outcome");

    let text = String::from_utf8(buffer).expect("utf8");
    assert!(text.starts_with("{\n  \"node\": \"\""), "got: {text}");
    assert!(text.ends_with("}\n"));
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["error"], true);
    assert_eq!(value["action"], "rollback");
}

#[test]
fn render_status_line_plain_is_silent() {
    let outcome = Outcome::failure(LifecycleAction::Install, "Backup failed: boom");
    assert_eq!(render_status_line(OutputStyle::Plain, &outcome), None);
}

#[test]
fn render_status_line_rich_includes_badge_and_message() {
    let outcome = Outcome::failure(LifecycleAction::Install, "Backup failed: boom");
    let line = render_status_line(OutputStyle::Rich, &outcome).expect("rich renders a line");
    assert!(line.contains("[ERR]"), "got: {line}");
    assert!(line.contains("install"), "got: {line}");
    assert!(line.ends_with(": Backup failed: boom"), "got: {line}");
}

#[test]
fn completions_script_names_binary() {
    let mut buffer = Vec::new();
    write_completions_script(Shell::Bash, &mut buffer).expect("must render completions");
    let script = String::from_utf8(buffer).expect("utf8");
    assert!(script.contains("splunk-otel-manager"));
    assert!(script.contains("rollback"));
}
