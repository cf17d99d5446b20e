//! Stderr logging for the `fieldplots` binaries and tests.
//!
//! Records are tagged with the workspace component that emitted them:
//! `[  0.012s  INFO grid] generated 96 cells`. Dependencies (GeoTIFF and
//! GeoJSON parsers and the like) only get through at `warn` and above, so a
//! `debug` run shows grid and zonal detail without decoder chatter.
//!
//! With the `tracing` feature, [`init_tracing`] installs a
//! `tracing-subscriber` formatter with the same per-component filter.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Crate names of the workspace and the tag printed for each.
const COMPONENTS: [(&str, &str); 4] = [
    ("fieldplots_core", "core"),
    ("fieldplots_grid", "grid"),
    ("fieldplots_zonal", "zonal"),
    ("fieldplots", "fieldplots"),
];

/// Short tag of a log target, or `None` for targets outside the workspace.
fn component(target: &str) -> Option<&'static str> {
    let krate = target.split("::").next().unwrap_or(target);
    COMPONENTS
        .iter()
        .find(|(name, _)| *name == krate)
        .map(|(_, tag)| *tag)
}

/// Level cap applied to records from outside the workspace.
fn dependency_level(level: LevelFilter) -> LevelFilter {
    level.min(LevelFilter::Warn)
}

fn format_line(elapsed: f64, level: Level, target: &str, args: std::fmt::Arguments) -> String {
    let tag = component(target).unwrap_or(target);
    format!("[{elapsed:7.3}s {level:>5} {tag}] {args}")
}

struct ComponentLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for ComponentLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let max = match component(metadata.target()) {
            Some(_) => self.level,
            None => dependency_level(self.level),
        };
        metadata.level() <= max
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            *record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<ComponentLogger> = OnceLock::new();

/// Install the stderr logger; workspace crates log up to `level`.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| ComponentLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// `EnvFilter` directives matching [`init_with_level`]: workspace crates at
/// `level`, everything else capped at `warn`.
pub fn filter_directives(level: LevelFilter) -> String {
    let level_name = |l: LevelFilter| l.as_str().to_ascii_lowercase();
    let mut directives = vec![level_name(dependency_level(level))];
    directives.extend(
        COMPONENTS
            .iter()
            .map(|(krate, _)| format!("{krate}={}", level_name(level))),
    );
    directives.join(",")
}

/// Install a `tracing` subscriber. `RUST_LOG` wins when set; otherwise the
/// filter comes from [`filter_directives`].
///
/// Span close events are emitted so `instrument`ed entry points report their
/// duration.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .with_writer(std::io::stderr)
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_map_to_components() {
        assert_eq!(component("fieldplots_grid::generator"), Some("grid"));
        assert_eq!(component("fieldplots_zonal"), Some("zonal"));
        assert_eq!(component("fieldplots::io::geotiff"), Some("fieldplots"));
        assert_eq!(component("tiff::decoder"), None);
        assert_eq!(component("fieldplots_extra"), None);
    }

    #[test]
    fn lines_carry_component_tag() {
        let line = format_line(
            1.5,
            Level::Info,
            "fieldplots_zonal::analyze::coverage",
            format_args!("coverage recorded for {} regions", 3),
        );
        assert_eq!(line, "[  1.500s  INFO zonal] coverage recorded for 3 regions");
        let line = format_line(0.0, Level::Warn, "tiff::decoder", format_args!("odd tag"));
        assert!(line.ends_with("tiff::decoder] odd tag"));
    }

    #[test]
    fn dependencies_are_capped_at_warn() {
        let logger = ComponentLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        let meta = |level, target| Metadata::builder().level(level).target(target).build();
        assert!(logger.enabled(&meta(Level::Debug, "fieldplots_grid::generator")));
        assert!(!logger.enabled(&meta(Level::Debug, "tiff::decoder")));
        assert!(logger.enabled(&meta(Level::Warn, "tiff::decoder")));
    }

    #[test]
    fn tracing_directives_follow_level() {
        assert_eq!(
            filter_directives(LevelFilter::Debug),
            "warn,fieldplots_core=debug,fieldplots_grid=debug,fieldplots_zonal=debug,fieldplots=debug"
        );
        assert!(filter_directives(LevelFilter::Error).starts_with("error,"));
    }
}
