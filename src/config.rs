use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fern::colors::{Color, ColoredLevelConfig};

use log::LevelFilter;

use serde::{Deserialize, Serialize};

use crate::models::{BoardCheck, ConnectionOptions};
use crate::{Error, Result};

/// Configuration for a postboard instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind to
    pub address: String,
    /// Port to bind to
    pub port: u16,
    /// Path of the SQLite database file
    pub database_url: String,
    /// Maximum number of pooled database connections
    pub pool_size: u32,
    /// How long a connection waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
    /// File to log to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Most verbose level that gets logged
    pub log_level: LevelFilter,
    /// Reject posts to boards that don't exist
    pub require_existing_board: bool,
    /// Fixed seed for the demo data generator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_seed: Option<u64>,
}

impl Config {
    /// Open a config file at the given path.
    pub fn open<P>(path: P) -> Result<Config>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let msg = format!("Couldn't open config file at {}", path.display());

        let reader = File::open(path).map_err(|err| Error::from_io_error(err, msg))?;

        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Open the config file at `path`, or the default one. A missing default
    /// file gives the default config; a missing explicit file is an error.
    pub fn open_or_default(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Config::open(path),
            None => {
                let path = Config::default_path();
                if path.exists() {
                    Config::open(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    /// Generate a new config file from default values.
    pub fn generate<W>(mut out: W) -> Result<()>
    where
        W: std::io::Write,
    {
        writeln!(&mut out, "# Configuration for postboard")?;
        writeln!(&mut out, "#")?;
        writeln!(&mut out, "# Optional keys:")?;
        writeln!(&mut out, "#   log_file: /var/log/postboard/postboard.log")?;
        writeln!(&mut out, "#   demo_seed: 42")?;
        serde_yaml::to_writer(&mut out, &Config::default())?;
        Ok(())
    }

    /// Get the default location of the config file.
    pub fn default_path() -> PathBuf {
        if cfg!(debug_assertions) {
            PathBuf::from("contrib/dev-config.yaml")
        } else {
            PathBuf::from("/etc/postboard/config.yaml")
        }
    }

    /// Pragmas for each database connection.
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    /// How new posts treat unknown board IDs.
    pub fn board_check(&self) -> BoardCheck {
        if self.require_existing_board {
            BoardCheck::Require
        } else {
            BoardCheck::Skip
        }
    }

    /// Install the global logger: coloured lines on stdout, plus plain lines
    /// in `log_file` when one is set.
    pub fn init_logging(&self) -> Result<()> {
        let colors = ColoredLevelConfig::new()
            .info(Color::Green)
            .debug(Color::Blue)
            .trace(Color::Magenta);

        let stdout = fern::Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{} {:5} [{}] {}",
                    chrono::Local::now().format("%F %T"),
                    colors.color(record.level()),
                    record.target(),
                    message
                ))
            })
            .chain(std::io::stdout());

        let mut dispatch = fern::Dispatch::new()
            .level(self.log_level)
            .chain(stdout);

        if let Some(ref log_file) = self.log_file {
            let msg = format!("Couldn't open log file at {}", log_file.display());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|err| Error::from_io_error(err, msg))?;

            dispatch = dispatch.chain(
                fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "{} {:5} [{}] {}",
                            chrono::Local::now().format("%F %T"),
                            record.level(),
                            record.target(),
                            message
                        ))
                    })
                    .chain(file),
            );
        }

        dispatch.apply()?;

        Ok(())
    }

    /// Dump configuration info to the log.
    pub fn debug_log(&self) {
        use log::debug;

        debug!("  address {}", self.address);
        debug!("  port {}", self.port);
        debug!("  database url {}", self.database_url);
        debug!("  pool size {}", self.pool_size);
        debug!("  busy timeout {}ms", self.busy_timeout_ms);
        debug!("  log level {}", self.log_level);
        debug!("  require existing board {}", self.require_existing_board);
        if let Some(ref log_file) = self.log_file {
            debug!("  log file {}", log_file.display());
        }
        if let Some(seed) = self.demo_seed {
            debug!("  demo seed {}", seed);
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            address: "0.0.0.0".into(),
            port: 5000,
            database_url: "postboard.sqlite".into(),
            pool_size: 8,
            busy_timeout_ms: 5000,
            log_file: None,
            log_level: LevelFilter::Info,
            require_existing_board: true,
            demo_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() -> Result<()> {
        let config: Config = serde_yaml::from_str(
            "port: 8080\nlog_level: debug\nrequire_existing_board: false\n",
        )?;

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.board_check(), BoardCheck::Skip);
        assert_eq!(config.database_url, "postboard.sqlite");
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.demo_seed, None);

        Ok(())
    }

    #[test]
    fn generated_file_parses_to_defaults() -> Result<()> {
        let mut out = Vec::new();
        Config::generate(&mut out)?;

        let config: Config = serde_yaml::from_slice(&out)?;
        assert_eq!(config, Config::default());
        assert_eq!(config.board_check(), BoardCheck::Require);
        assert_eq!(
            config.connection_options().busy_timeout,
            Duration::from_millis(5000)
        );

        Ok(())
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = Path::new("/nonexistent/postboard/config.yaml");

        match Config::open_or_default(Some(path)) {
            Err(Error::IoErrorMsg { .. }) => {}
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
