use clap::{Arg, ArgMatches, Command};

use chrono::prelude::*;
use simplelog::*;

use std::{fs::File, path::Path, process::ExitCode};

pub mod commands;
pub mod error;
pub mod utils;

use error::Error;
use utils::{
    config::{ensure_valid, AdminConfig},
    gateway::Midclt,
    tools::get_password,
};

fn cli() -> Command<'static> {
    Command::new("nas-bootstrap")
        .version("0.1.0")
        .about("Provisions the NAS admin account and hardens SSH through midclt")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .global(true)
                .help("JSON file with username, password, full_name and ssh_pub_key"),
        )
        .arg(
            Arg::new("ask-password")
                .long("ask-password")
                .global(true)
                .help("Prompt for the password if the config leaves it empty"),
        )
        .arg(
            Arg::new("midclt")
                .long("midclt")
                .takes_value(true)
                .global(true)
                .default_value(Midclt::DEFAULT_PROGRAM)
                .help("Middleware client used for every call"),
        )
        .subcommand(
            Command::new("setup")
                .about("Create or update the admin user, harden SSH and verify the result"),
        )
        .subcommand(Command::new("verify").about("Check the admin user against the config"))
}

fn init_logging(command: &str) -> Result<(), Error> {
    let dt = Local::now();
    let path = format!(
        "nas_bootstrap_{}_{}.log",
        command,
        dt.format("%Y_%m_%d_%H_%M_%S")
    );
    let file = File::create(&path).map_err(|source| Error::LogFile { path, source })?;
    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), file),
    ])?;
    Ok(())
}

fn load_config(args: &ArgMatches) -> Result<AdminConfig, Error> {
    let config = match args.value_of("config") {
        Some(path) => AdminConfig::from_file(Path::new(path))?,
        None => AdminConfig::builtin(),
    };
    if args.is_present("ask-password") && config.password.trim().is_empty() {
        let password = get_password(&config.username)?;
        return Ok(AdminConfig { password, ..config });
    }
    Ok(config)
}

fn run(args: &ArgMatches) -> Result<(), Error> {
    let (command, sub) = match args.subcommand() {
        Some(found) => found,
        None => return Ok(()),
    };
    init_logging(command)?;
    let config = load_config(sub)?;
    ensure_valid(&config)?;
    let gateway = Midclt::new(sub.value_of("midclt").unwrap_or(Midclt::DEFAULT_PROGRAM));
    match command {
        "setup" => {
            commands::setup::provision(&config, &gateway);
        }
        "verify" => {
            commands::verify::main(&config, &gateway);
        }
        _ => unreachable!("subcommands are declared in cli()"),
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(&cli().get_matches()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_reach_subcommands() -> TestResult {
        let matches = cli().try_get_matches_from([
            "nas-bootstrap",
            "setup",
            "--midclt",
            "/opt/midclt",
            "-c",
            "/tmp/admin.json",
        ])?;
        let (name, sub) = matches.subcommand().ok_or("no subcommand")?;
        assert_eq!(name, "setup");
        assert_eq!(sub.value_of("midclt"), Some("/opt/midclt"));
        assert_eq!(sub.value_of("config"), Some("/tmp/admin.json"));
        Ok(())
    }

    #[test]
    fn midclt_defaults_to_path_lookup() -> TestResult {
        let matches = cli().try_get_matches_from(["nas-bootstrap", "verify"])?;
        let (_, sub) = matches.subcommand().ok_or("no subcommand")?;
        assert_eq!(sub.value_of("midclt"), Some(Midclt::DEFAULT_PROGRAM));
        assert!(!sub.is_present("ask-password"));
        Ok(())
    }

    #[test]
    fn subcommand_is_required() {
        assert!(cli().try_get_matches_from(["nas-bootstrap"]).is_err());
    }

    #[test]
    fn builtin_config_used_without_file() -> TestResult {
        let matches = cli().try_get_matches_from(["nas-bootstrap", "verify"])?;
        let (_, sub) = matches.subcommand().ok_or("no subcommand")?;
        assert_eq!(load_config(sub)?, AdminConfig::builtin());
        Ok(())
    }
}
