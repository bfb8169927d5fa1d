use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use datapuller::{
    list_programs, list_users, program_sources, transfer_files, AppConfig, FailurePolicy, FilterConfig, LogNotifier,
    Notifier, Outcome, SourceSelection, TerminalNotifier, TransferError, TransferReport,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

const EXIT_NOTHING_MATCHED: u8 = 1;
const EXIT_PRECONDITION: u8 = 2;

const FILE_RULES: &str = "\
File rules:
  .csv files are always transferred (unless --no-csv).
  .txt files (with --txt) are transferred unless the name starts with 'para'.
  --exclude-monkey / --exclude-block / --exclude-prefix skip more .txt files.
  With --move, transferred originals go to <program>/copied/.";

fn main() -> Result<ExitCode> {
    let matches = build_cli().get_matches();

    // .env is optional; it only feeds the DATAPULLER_* variables
    let env_file = dotenvy::dotenv().ok();

    let (command, sub_matches) = matches
        .subcommand()
        .context("A subcommand is required")?;

    // Initialize configuration from environment and command line arguments
    let config = create_app_config(sub_matches)?;

    // Initialize logging
    initialize_logging(&config.log_level)?;

    match env_file {
        Some(path) => info!("Loaded environment from {}", path.display()),
        None => info!("No .env file found, using system environment variables"),
    }

    match command {
        "list" => run_list(sub_matches, &config),
        "transfer" => run_transfer(sub_matches, config),
        other => anyhow::bail!("Unknown command: {}", other),
    }
}

fn build_cli() -> Command {
    Command::new("DataPuller")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Copies end-of-day task data files from program folders to a removable drive")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .global(true)
                .help("Set the log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("tasks-root")
                .long("tasks-root")
                .value_name("DIR")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Folder holding <user>/<program> folders"),
        )
        .subcommand(
            Command::new("list")
                .about("List users, or the program folders of USER")
                .arg(Arg::new("user").value_name("USER")),
        )
        .subcommand(
            Command::new("transfer")
                .about("Copy eligible files from the selected folders to the destination")
                .after_help(FILE_RULES)
                .arg(
                    Arg::new("sources")
                        .value_name("SOURCE")
                        .num_args(0..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Source folders; bare names are program folders of --user"),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .short('u')
                        .value_name("USER")
                        .help("Resolve bare SOURCE names under <tasks-root>/<USER>"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .requires("user")
                        .action(ArgAction::SetTrue)
                        .help("Select every program folder of --user"),
                )
                .arg(
                    Arg::new("no-csv")
                        .long("no-csv")
                        .action(ArgAction::SetTrue)
                        .help("Do not transfer .csv files"),
                )
                .arg(
                    Arg::new("txt")
                        .long("txt")
                        .action(ArgAction::SetTrue)
                        .help("Transfer .txt files (never those starting with 'para')"),
                )
                .arg(
                    Arg::new("exclude-monkey")
                        .long("exclude-monkey")
                        .action(ArgAction::SetTrue)
                        .help("Skip .txt files starting with 'monkey'"),
                )
                .arg(
                    Arg::new("exclude-block")
                        .long("exclude-block")
                        .action(ArgAction::SetTrue)
                        .help("Skip .txt files starting with 'block'"),
                )
                .arg(
                    Arg::new("exclude-prefix")
                        .long("exclude-prefix")
                        .value_name("PREFIX")
                        .help("Skip .txt files starting with PREFIX"),
                )
                .arg(
                    Arg::new("move")
                        .long("move")
                        .action(ArgAction::SetTrue)
                        .help("Move transferred originals into a 'copied' subfolder"),
                )
                .arg(
                    Arg::new("destination")
                        .long("destination")
                        .short('d')
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Destination folder (created if missing)"),
                )
                .arg(
                    Arg::new("volume-root")
                        .long("volume-root")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .conflicts_with("no-volume-check")
                        .help("Drive that must be present before copying"),
                )
                .arg(
                    Arg::new("no-volume-check")
                        .long("no-volume-check")
                        .action(ArgAction::SetTrue)
                        .help("Do not require the destination drive to be present"),
                )
                .arg(
                    Arg::new("on-error")
                        .long("on-error")
                        .value_name("POLICY")
                        .value_parser(["abort", "continue"])
                        .help("Stop at the first failed file, or record it and continue"),
                )
                .arg(
                    Arg::new("no-preserve-times")
                        .long("no-preserve-times")
                        .action(ArgAction::SetTrue)
                        .help("Do not carry modification times over to the copies"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the transfer report as JSON"),
                )
                .arg(
                    Arg::new("bell")
                        .long("bell")
                        .action(ArgAction::SetTrue)
                        .help("Ring the terminal bell when done"),
                ),
        )
}

/// Environment defaults with command line overrides on top
fn create_app_config(matches: &ArgMatches) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level = level.clone();
    }
    if let Some(root) = matches.get_one::<PathBuf>("tasks-root") {
        config.tasks_root = root.clone();
    }

    Ok(config)
}

/// Destination and failure handling overrides from `transfer` flags
fn apply_transfer_overrides(matches: &ArgMatches, config: &mut AppConfig) -> Result<()> {
    if let Some(destination) = matches.get_one::<PathBuf>("destination") {
        config.transfer.destination = destination.clone();
    }
    if let Some(volume) = matches.get_one::<PathBuf>("volume-root") {
        config.transfer.volume_root = Some(volume.clone());
    }
    if matches.get_flag("no-volume-check") {
        config.transfer.volume_root = None;
    }
    if let Some(policy) = matches.get_one::<String>("on-error") {
        config.transfer.on_error = policy
            .parse::<FailurePolicy>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if matches.get_flag("no-preserve-times") {
        config.transfer.preserve_modified = false;
    }

    Ok(())
}

/// Filter options for one run, built once from the flags
fn create_filter_config(matches: &ArgMatches) -> FilterConfig {
    FilterConfig {
        include_csv: !matches.get_flag("no-csv"),
        include_txt: matches.get_flag("txt"),
        exclude_monkey_prefix: matches.get_flag("exclude-monkey"),
        exclude_block_prefix: matches.get_flag("exclude-block"),
        custom_exclude_prefix: matches
            .get_one::<String>("exclude-prefix")
            .cloned()
            .unwrap_or_default(),
        move_after_copy: matches.get_flag("move"),
    }
}

/// Turn SOURCE arguments (and --user/--all) into the engine's selection
fn resolve_sources(matches: &ArgMatches, config: &AppConfig) -> Result<SourceSelection, TransferError> {
    let user = matches.get_one::<String>("user");
    let sources: Vec<&PathBuf> = matches
        .get_many::<PathBuf>("sources")
        .map(|values| values.collect())
        .unwrap_or_default();

    let mut selection = match user {
        Some(user) if matches.get_flag("all") => {
            let programs = list_programs(&config.tasks_root, user)?;
            program_sources(&config.tasks_root, user, programs)
        }
        _ => SourceSelection::default(),
    };

    for source in sources {
        match user {
            Some(user) if is_bare_name(source) => {
                selection.push(config.tasks_root.join(user).join(source));
            }
            _ => selection.push(source.clone()),
        }
    }

    Ok(selection)
}

fn is_bare_name(path: &Path) -> bool {
    path.is_relative() && path.components().count() == 1
}

/// Initialize structured logging with tracing
fn initialize_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

fn run_list(matches: &ArgMatches, config: &AppConfig) -> Result<ExitCode> {
    let listing = match matches.get_one::<String>("user") {
        Some(user) => list_programs(&config.tasks_root, user),
        None => list_users(&config.tasks_root),
    };

    match listing {
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => handle_selection_error(e, notifier(false, false)),
    }
}

fn run_transfer(matches: &ArgMatches, mut config: AppConfig) -> Result<ExitCode> {
    apply_transfer_overrides(matches, &mut config)?;
    let filter = create_filter_config(matches);
    let json = matches.get_flag("json");
    let bell = matches.get_flag("bell");

    let sources = match resolve_sources(matches, &config) {
        Ok(sources) => sources,
        Err(e) => return handle_selection_error(e, notifier(json, bell)),
    };

    info!("Configuration: {:#?}", config);

    let report = match transfer_files(&sources, &filter, &config.transfer) {
        Ok(report) => report,
        Err(e) => return handle_transfer_error(e, notifier(json, bell)),
    };

    if json {
        let rendered = serde_json::to_string_pretty(&report).context("Failed to serialize transfer report")?;
        println!("{}", rendered);
    } else {
        print_transfer_report(&report, filter.move_after_copy);
    }

    let outcome = Outcome::from_report(&report);
    notifier(json, bell).notify(&outcome);

    if outcome.copied_any() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_NOTHING_MATCHED))
    }
}

/// Give feedback for a failed attempt, then pick the exit status.
/// Precondition failures exit with status 2; anything else propagates.
fn handle_transfer_error(error: TransferError, notifier: Box<dyn Notifier>) -> Result<ExitCode> {
    finish_with_error(error, notifier, false)
}

/// Failures while resolving folder names (unknown user included) are bad input
fn handle_selection_error(error: TransferError, notifier: Box<dyn Notifier>) -> Result<ExitCode> {
    finish_with_error(error, notifier, true)
}

fn finish_with_error(error: TransferError, mut notifier: Box<dyn Notifier>, selecting: bool) -> Result<ExitCode> {
    notifier.notify(&Outcome::from_error(&error));

    match precondition_status(&error, selecting) {
        Some(status) => {
            warn!("{}", error);
            Ok(ExitCode::from(status))
        }
        None => Err(anyhow::Error::new(error).context("DataPuller could not finish")),
    }
}

/// Exit status for errors the caller can fix by changing the selection; `None` means fatal
fn precondition_status(error: &TransferError, selecting: bool) -> Option<u8> {
    let unknown_folder = selecting && matches!(error, TransferError::SourceUnavailable { .. });
    (error.is_precondition() || unknown_folder).then_some(EXIT_PRECONDITION)
}

/// JSON runs report through the log so stderr stays machine-friendly, unless a bell was asked for
fn notifier(json: bool, bell: bool) -> Box<dyn Notifier> {
    if json && !bell {
        Box::new(LogNotifier)
    } else {
        Box::new(TerminalNotifier::new(std::io::stderr(), bell))
    }
}

fn print_transfer_report(report: &TransferReport, moved: bool) {
    if report.count() > 0 {
        println!("Copied {} file(s) to {}.", report.count(), report.destination.display());
        if moved {
            println!("Moved originals to copied/ folders.");
        }
    }

    for file in &report.copied_files {
        println!("  {} -> {}", file.source.display(), file.destination.display());
    }

    if report.has_failures() {
        println!("{} failure(s):", report.failures.len());
        for failure in &report.failures {
            println!("  {}", failure.error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn transfer_matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["datapuller", "transfer"];
        argv.extend_from_slice(args);
        let matches = build_cli().try_get_matches_from(argv).unwrap();
        matches.subcommand_matches("transfer").unwrap().clone()
    }

    fn config_with_root(root: &str) -> AppConfig {
        AppConfig {
            tasks_root: PathBuf::from(root),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_filter_flags_mirror_config() {
        let matches = transfer_matches(&[
            "--txt",
            "--no-csv",
            "--exclude-monkey",
            "--exclude-block",
            "--exclude-prefix",
            "test",
            "--move",
        ]);
        let filter = create_filter_config(&matches);
        assert_eq!(
            filter,
            FilterConfig {
                include_csv: false,
                include_txt: true,
                exclude_monkey_prefix: true,
                exclude_block_prefix: true,
                custom_exclude_prefix: "test".to_string(),
                move_after_copy: true,
            }
        );
    }

    #[test]
    fn test_default_flags_match_default_filter() {
        let matches = transfer_matches(&[]);
        assert_eq!(create_filter_config(&matches), FilterConfig::default());
    }

    #[test]
    fn test_no_sources_gives_empty_selection() {
        let matches = transfer_matches(&[]);
        let selection = resolve_sources(&matches, &config_with_root("/tasks")).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_bare_names_resolve_under_user() {
        let matches = transfer_matches(&["--user", "smith", "recall", "/abs/folder"]);
        let selection = resolve_sources(&matches, &config_with_root("/tasks")).unwrap();
        let paths: Vec<&Path> = selection.iter().collect();
        assert_eq!(paths, vec![Path::new("/tasks/smith/recall"), Path::new("/abs/folder")]);
    }

    #[test]
    fn test_sources_without_user_are_taken_verbatim() {
        let matches = transfer_matches(&["recall"]);
        let selection = resolve_sources(&matches, &config_with_root("/tasks")).unwrap();
        let paths: Vec<&Path> = selection.iter().collect();
        assert_eq!(paths, vec![Path::new("recall")]);
    }

    #[test]
    fn test_transfer_overrides() {
        let matches = transfer_matches(&[
            "--destination",
            "/media/usb/out",
            "--no-volume-check",
            "--on-error",
            "abort",
            "--no-preserve-times",
        ]);
        let mut config = AppConfig::default();
        apply_transfer_overrides(&matches, &mut config).unwrap();

        assert_eq!(config.transfer.destination, PathBuf::from("/media/usb/out"));
        assert_eq!(config.transfer.volume_root, None);
        assert_eq!(config.transfer.on_error, FailurePolicy::Abort);
        assert!(!config.transfer.preserve_modified);
    }

    #[test]
    fn test_unknown_user_with_all_is_a_precondition_failure() {
        let root = tempfile::TempDir::new().unwrap();
        fs::create_dir(root.path().join("smith")).unwrap();
        let config = config_with_root(&root.path().to_string_lossy());
        let matches = transfer_matches(&["--user", "nobody", "--all"]);

        let error = resolve_sources(&matches, &config).unwrap_err();

        assert!(matches!(error, TransferError::SourceUnavailable { .. }));
        assert_eq!(precondition_status(&error, true), Some(EXIT_PRECONDITION));
    }

    #[test]
    fn test_precondition_status_during_transfer() {
        let missing_source = TransferError::SourceUnavailable {
            path: PathBuf::from("/tasks/smith/recall"),
            reason: "does not exist".to_string(),
        };
        assert_eq!(precondition_status(&missing_source, false), None);
        assert_eq!(
            precondition_status(&TransferError::NoSourcesSelected, false),
            Some(EXIT_PRECONDITION)
        );
    }

    #[test]
    fn test_all_requires_user() {
        let result = build_cli().try_get_matches_from(["datapuller", "transfer", "--all"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_policy_rejected_by_parser() {
        let result = build_cli().try_get_matches_from(["datapuller", "transfer", "--on-error", "retry"]);
        assert!(result.is_err());
    }
}
