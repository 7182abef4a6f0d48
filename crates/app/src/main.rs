mod console;

use std::fmt;

use prep_core::model::{DisasterType, Level, ModuleKey, Needs};
use services::{AppServices, Clock, RemoteGeneratorConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingOperand { command: &'static str, what: &'static str },
    InvalidOperand { what: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingOperand { command, what } => {
                write!(f, "{command} requires a {what}")
            }
            ArgsError::InvalidOperand { what, raw } => write!(f, "invalid {what}: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  prep [--db <sqlite_url>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  stats                      progress summary (default)");
    eprintln!("  quiz <level>               take the quiz for level 1-3");
    eprintln!("  drill <type>               earthquake | fire | flood");
    eprintln!("  ask <text...>              ask the safety assistant");
    eprintln!("  module <key> [--complete]  read a module, optionally mark it done");
    eprintln!("  contacts [<region>]        helplines, plus a state's authority");
    eprintln!("  profile [<needs>]          show or set accessibility needs");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://prep.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_DB_URL, RUST_LOG");
    eprintln!("  PREP_AI_API_KEY, PREP_AI_BASE_URL, PREP_AI_MODEL, PREP_AI_TIMEOUT_SECS");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Stats,
    Quiz(Level),
    Drill(DisasterType),
    Ask(String),
    Module { key: ModuleKey, complete: bool },
    Contacts(Option<String>),
    Profile(Option<Needs>),
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("PREP_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| "sqlite://prep.sqlite3".into(), normalize_sqlite_url);
        let mut complete = false;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--complete" => complete = true,
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let command = parse_command(positional, complete)?;
        Ok(Some(Self { db_url, command }))
    }
}

fn parse_command(positional: Vec<String>, complete: bool) -> Result<Command, ArgsError> {
    let mut words = positional.into_iter();
    let Some(name) = words.next() else {
        return Ok(Command::Stats);
    };
    let operand = |words: &mut std::vec::IntoIter<String>, command, what| {
        words
            .next()
            .ok_or(ArgsError::MissingOperand { command, what })
    };

    let command = match name.as_str() {
        "stats" => Command::Stats,
        "quiz" => {
            let raw = operand(&mut words, "quiz", "level")?;
            let level = raw
                .parse::<Level>()
                .map_err(|_| ArgsError::InvalidOperand { what: "level", raw })?;
            Command::Quiz(level)
        }
        "drill" => {
            let raw = operand(&mut words, "drill", "disaster type")?;
            let disaster = raw.parse::<DisasterType>().map_err(|_| ArgsError::InvalidOperand {
                what: "disaster type",
                raw,
            })?;
            Command::Drill(disaster)
        }
        "ask" => {
            let text = words.by_ref().collect::<Vec<_>>().join(" ");
            Command::Ask(text)
        }
        "module" => {
            let raw = operand(&mut words, "module", "module key")?;
            let key = raw
                .parse::<ModuleKey>()
                .map_err(|_| ArgsError::InvalidOperand { what: "module key", raw })?;
            Command::Module { key, complete }
        }
        "contacts" => Command::Contacts(words.next()),
        "profile" => match words.next() {
            None => Command::Profile(None),
            Some(raw) => {
                let needs = raw
                    .parse::<Needs>()
                    .map_err(|_| ArgsError::InvalidOperand { what: "needs", raw })?;
                Command::Profile(Some(needs))
            }
        },
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = words.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    if complete && !matches!(command, Command::Module { .. }) {
        return Err(ArgsError::UnknownArg("--complete".into()));
    }
    Ok(command)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };
    debug!(db_url = %parsed.db_url, command = ?parsed.command, "starting");

    prepare_sqlite_file(&parsed.db_url)?;
    let remote = RemoteGeneratorConfig::from_env()?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), remote).await?;

    match parsed.command {
        Command::Stats => console::stats(&services).await?,
        Command::Quiz(level) => console::quiz(&services, level).await?,
        Command::Drill(disaster) => console::drill(&services, disaster).await?,
        Command::Ask(text) => console::ask(&services, text).await,
        Command::Module { key, complete } => console::module(&services, key, complete).await?,
        Command::Contacts(region) => console::contacts(&services, region.as_deref()),
        Command::Profile(needs) => console::profile(&services, needs).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| (*a).to_string()).collect()
    }

    #[test]
    fn no_command_means_stats() {
        assert_eq!(parse_command(Vec::new(), false).unwrap(), Command::Stats);
    }

    #[test]
    fn parses_operands() {
        assert_eq!(
            parse_command(words(&["quiz", "2"]), false).unwrap(),
            Command::Quiz(Level::new(2).unwrap())
        );
        assert_eq!(
            parse_command(words(&["drill", "Flood"]), false).unwrap(),
            Command::Drill(DisasterType::Flood)
        );
        assert_eq!(
            parse_command(words(&["ask", "first", "aid"]), false).unwrap(),
            Command::Ask("first aid".into())
        );
        assert_eq!(
            parse_command(words(&["module", "fire"]), true).unwrap(),
            Command::Module {
                key: ModuleKey::Fire,
                complete: true
            }
        );
    }

    #[test]
    fn rejects_bad_operands() {
        assert!(matches!(
            parse_command(words(&["quiz", "4"]), false),
            Err(ArgsError::InvalidOperand { what: "level", .. })
        ));
        assert!(matches!(
            parse_command(words(&["drill"]), false),
            Err(ArgsError::MissingOperand { command: "drill", .. })
        ));
        assert!(matches!(
            parse_command(words(&["stats"]), true),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse_command(words(&["launch"]), false),
            Err(ArgsError::UnknownCommand(_))
        ));
    }

    #[test]
    fn db_flag_is_normalised() {
        let args = Args::parse(words(&["--db", "sqlite::memory:", "stats"]))
            .unwrap()
            .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.command, Command::Stats);
        assert!(Args::parse(words(&["--help"])).unwrap().is_none());
    }
}
