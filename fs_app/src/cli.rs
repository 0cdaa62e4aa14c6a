use std::time::Duration;

use thiserror::Error;

use crate::config_loader::DEFAULT_CONFIG_PATH;

pub const USAGE: &str = "\
Usage: flowstop [--config PATH] [--memory] <COMMAND>

Commands:
  pass <item>               Record an occurrence of <item>; exits 2 if rejected
  peek <item>               Print the number of stored occurrences of <item>
  watch <item> <period_ms>  Pass <item> every <period_ms> until Ctrl+C

Options:
  --config PATH  Config file (default: flowstop.toml)
  --memory       Use an in-process store instead of Redis";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("missing command")]
    MissingCommand,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("missing value for {0}")]
    MissingArgument(&'static str),

    #[error("invalid period '{0}': expected a positive number of milliseconds")]
    InvalidPeriod(String),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

/// What the binary was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pass { item: String },
    Peek { item: String },
    Watch { item: String, period: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: String,
    pub memory: bool,
    pub command: Command,
}

/// Parses the process arguments, skipping the program name
pub fn from_env() -> Result<Invocation, CliError> {
    parse(std::env::args().skip(1))
}

/// Parses arguments (without the program name)
pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Invocation, CliError> {
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut memory = false;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().ok_or(CliError::MissingArgument("--config"))?,
            "--memory" => memory = true,
            flag if flag.starts_with("--") => return Err(CliError::UnknownOption(arg)),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or(CliError::MissingCommand)?;
    let item = positional.next().ok_or(CliError::MissingArgument("<item>"));

    let command = match name.as_str() {
        "pass" => Command::Pass { item: item? },
        "peek" => Command::Peek { item: item? },
        "watch" => {
            let item = item?;
            let raw = positional.next().ok_or(CliError::MissingArgument("<period_ms>"))?;
            let period = match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(CliError::InvalidPeriod(raw)),
            };
            Command::Watch { item, period }
        }
        _ => return Err(CliError::UnknownCommand(name)),
    };

    if let Some(extra) = positional.next() {
        return Err(CliError::UnexpectedArgument(extra));
    }

    Ok(Invocation { config_path, memory, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_pass() {
        let invocation = parse(args("pass alice")).unwrap();
        assert_eq!(
            invocation,
            Invocation { config_path: "flowstop.toml".to_string(), memory: false, command: Command::Pass { item: "alice".to_string() } }
        );
    }

    #[test]
    fn test_options_anywhere() {
        let invocation = parse(args("peek --memory bob --config /etc/flowstop.toml")).unwrap();
        assert_eq!(invocation.config_path, "/etc/flowstop.toml");
        assert!(invocation.memory);
        assert_eq!(invocation.command, Command::Peek { item: "bob".to_string() });
    }

    #[test]
    fn test_watch() {
        let invocation = parse(args("watch alice 250")).unwrap();
        assert_eq!(invocation.command, Command::Watch { item: "alice".to_string(), period: Duration::from_millis(250) });
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(args("")), Err(CliError::MissingCommand));
        assert_eq!(parse(args("pass")), Err(CliError::MissingArgument("<item>")));
        assert_eq!(parse(args("watch alice")), Err(CliError::MissingArgument("<period_ms>")));
        assert_eq!(parse(args("watch alice 0")), Err(CliError::InvalidPeriod("0".to_string())));
        assert_eq!(parse(args("watch alice soon")), Err(CliError::InvalidPeriod("soon".to_string())));
        assert_eq!(parse(args("reset alice")), Err(CliError::UnknownCommand("reset".to_string())));
        assert_eq!(parse(args("pass alice bob")), Err(CliError::UnexpectedArgument("bob".to_string())));
        assert_eq!(parse(args("pass alice --verbose")), Err(CliError::UnknownOption("--verbose".to_string())));
        assert_eq!(parse(args("pass alice --config")), Err(CliError::MissingArgument("--config")));
    }
}
