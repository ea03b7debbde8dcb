//! Logger setup.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::Path;

pub const LOG_CONFIG_FILE: &str = "log4rs.yml";

const CONSOLE_PATTERN: &str = "{d(%H:%M:%S)} {h({l})} {t} - {m}{n}";

/// Warn-level stderr logger used when no `log4rs.yml` is around.
pub fn console_config(level: LevelFilter) -> Result<Config, Box<dyn Error>> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    Ok(Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?)
}

/// Initialise log4rs from `path`, or from [`console_config`] when the file
/// is missing.
pub fn init(path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    if path.exists() {
        log4rs::init_file(path, Default::default())?;
        log::debug!("logging configured from {}", path.display());
    } else {
        log4rs::init_config(console_config(LevelFilter::Warn)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_config_builds() {
        let config = console_config(LevelFilter::Info).expect("valid config");
        assert_eq!(config.root().level(), LevelFilter::Info);
        assert_eq!(config.appenders().len(), 1);
    }
}
