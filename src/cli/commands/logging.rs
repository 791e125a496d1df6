use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Accepts a digit (as the env var form of repeated `-v`) or a level name.
fn parse_level(level: &str) -> Result<u8, String> {
    if let Ok(count) = level.parse::<u8>() {
        if count <= 5 {
            return Ok(count);
        }
        return Err(format!("verbosity out of range: {count}"));
    }
    match level.to_ascii_lowercase().as_str() {
        "error" => Ok(0),
        "warn" => Ok(1),
        "info" => Ok(2),
        "debug" => Ok(3),
        "trace" => Ok(4),
        _ => Err(format!("unknown log level: {level}")),
    }
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| parse_level(level))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity: repeat the flag or name a level, ERROR through TRACE (default: ERROR)")
            .env("CHIAVE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_and_digits_parse() {
        assert_eq!(parse_level("warn"), Ok(1));
        assert_eq!(parse_level("TRACE"), Ok(4));
        assert_eq!(parse_level("3"), Ok(3));
        assert!(parse_level("9").is_err());
        assert!(parse_level("loud").is_err());
    }
}
