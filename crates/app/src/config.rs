//! App configuration

use std::path::PathBuf;

use clap::Args;

use crate::storage::FileStorage;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Settings shared by every command.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// JSON file holding the cart and session
    #[arg(
        long,
        env = "MARKETPLACE_STORAGE_PATH",
        default_value = "marketplace.json",
        global = true
    )]
    pub storage_path: PathBuf,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Local storage at the configured path.
    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(&self.storage_path)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: AppConfig,
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let cli = TestCli::try_parse_from([
            "marketplace",
            "--storage-path",
            "/tmp/cart.json",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ])?;

        assert_eq!(cli.config.storage_path, PathBuf::from("/tmp/cart.json"));
        assert_eq!(cli.config.logging.log_level, "debug");
        assert_eq!(cli.config.logging.log_format, LogFormat::Json);
        assert_eq!(cli.config.storage().path(), PathBuf::from("/tmp/cart.json"));

        Ok(())
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let result = TestCli::try_parse_from(["marketplace", "--log-format", "pretty"]);

        assert!(result.is_err(), "expected an error for an unknown format");
    }
}
