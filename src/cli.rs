//! Command-line interface for session-keeper.
//!
//! Uses lexopt for minimal binary size overhead. Usage and help text are
//! rendered by the console descriptor (see [`crate::commands`]).

use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::HandlerKind;
use crate::online::ShowMode;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Storage driver (overrides config file).
    pub handler: Option<HandlerKind>,
    /// Session directory for the file driver.
    pub path: Option<PathBuf>,
    /// Session lifetime in seconds.
    pub lifetime: Option<u64>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Who-is-online report mode.
    pub mode: Option<ShowMode>,
    /// 1-based page for listings.
    pub page: Option<usize>,
    /// Rows per page for listings.
    pub limit: Option<usize>,
    /// Write output without style markup.
    pub raw: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
    /// Command name; the first positional argument.
    pub command: Option<String>,
    /// Remaining positional arguments.
    pub positionals: Vec<String>,
}

impl Args {
    /// Positional argument `index` after the command name.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).map(String::as_str)
    }
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Long("handler") => {
                let value: String = parser.value()?.parse()?;
                result.handler = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("handler", value))?,
                );
            }
            Short('d') | Long("path") => {
                result.path = Some(parser.value()?.parse()?);
            }
            Long("lifetime") => {
                let value: String = parser.value()?.parse()?;
                result.lifetime = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("lifetime", value))?,
                );
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Short('m') | Long("mode") => {
                let value: String = parser.value()?.parse()?;
                result.mode = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("mode", value))?,
                );
            }
            Short('p') | Long("page") => {
                let value: String = parser.value()?.parse()?;
                result.page = Some(parse_positive("page", value)?);
            }
            Long("limit") => {
                let value: String = parser.value()?.parse()?;
                result.limit = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("limit", value))?,
                );
            }
            Long("raw") => {
                result.raw = true;
            }
            Value(val) => {
                let val: String = val
                    .into_string()
                    .map_err(|v| ArgsError::UnexpectedArgument(v.to_string_lossy().into()))?;
                if result.command.is_none() {
                    result.command = Some(val);
                } else {
                    result.positionals.push(val);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn parse_positive(name: &'static str, value: String) -> Result<usize, ArgsError> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ArgsError::InvalidValue(name, value)),
    }
}

/// Print version.
pub fn print_version() {
    println!("session-keeper {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Positional argument that is not valid UTF-8.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("session-keeper")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.command.is_none());
        assert!(result.positionals.is_empty());
        assert!(result.handler.is_none());
        assert!(!result.raw);
    }

    #[test]
    fn test_command_and_positionals() {
        let result = parse_args_from(args(&["session:show", "abc123"])).unwrap();
        assert_eq!(result.command.as_deref(), Some("session:show"));
        assert_eq!(result.positional(0), Some("abc123"));
        assert_eq!(result.positional(1), None);
    }

    #[test]
    fn test_options_after_command() {
        let result =
            parse_args_from(args(&["session:list", "--page", "2", "--limit", "5"])).unwrap();
        assert_eq!(result.command.as_deref(), Some("session:list"));
        assert_eq!(result.page, Some(2));
        assert_eq!(result.limit, Some(5));
    }

    #[test]
    fn test_handler_and_path() {
        let result =
            parse_args_from(args(&["--handler", "memory", "-d", "/tmp/sessions"])).unwrap();
        assert_eq!(result.handler, Some(HandlerKind::Memory));
        assert_eq!(result.path, Some(PathBuf::from("/tmp/sessions")));
    }

    #[test]
    fn test_invalid_handler() {
        let result = parse_args_from(args(&["--handler", "redis"]));
        assert!(matches!(result, Err(ArgsError::InvalidValue("handler", _))));
    }

    #[test]
    fn test_lifetime() {
        let result = parse_args_from(args(&["--lifetime", "60"])).unwrap();
        assert_eq!(result.lifetime, Some(60));

        assert!(parse_args_from(args(&["--lifetime", "soon"])).is_err());
    }

    #[test]
    fn test_mode() {
        let result = parse_args_from(args(&["whosonline", "-m", "both"])).unwrap();
        assert_eq!(result.mode, Some(ShowMode::Both));

        assert!(parse_args_from(args(&["--mode", "all"])).is_err());
    }

    #[test]
    fn test_page_must_be_positive() {
        assert!(parse_args_from(args(&["-p", "0"])).is_err());
        assert!(parse_args_from(args(&["-p", "x"])).is_err());
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/config.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/config.json")));
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["session:gc", "--help"])).unwrap();
        assert!(result.help);
        assert_eq!(result.command.as_deref(), Some("session:gc"));
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);

        let result = parse_args_from(args(&["--version"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_log_level_and_raw() {
        let result = parse_args_from(args(&["-l", "debug", "--raw"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
        assert!(result.raw);
    }

    #[test]
    fn test_unknown_option() {
        let result = parse_args_from(args(&["--port", "3000"]));
        assert!(matches!(result, Err(ArgsError::Lexopt(_))));
    }
}
