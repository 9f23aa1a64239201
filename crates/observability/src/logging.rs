//! Logging configuration.

use clap::Args;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count)]
    #[serde(skip)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "opennet_announcer=trace").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub json: bool,
}

impl LogArgs {
    /// Base level implied by the verbosity flags.
    pub fn base_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Build the filter with the following precedence:
    /// 1. If `--quiet` is set, only errors are shown
    /// 2. Otherwise, start with `RUST_LOG` if set, or the verbosity level
    /// 3. Apply any custom directives from `--log.filter`
    pub fn env_filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::new("error");
        }

        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.base_level()));

        if let Some(custom) = &self.filter {
            for directive in custom.split(',') {
                if let Ok(d) = directive.parse() {
                    filter = filter.add_directive(d);
                }
            }
        }

        filter
    }
}

/// Initialize the global tracing subscriber.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let fmt_layer = if args.json {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(args.env_filter())
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_level() {
        let mut args = LogArgs::default();
        assert_eq!(args.base_level(), "info");

        args.verbosity = 1;
        assert_eq!(args.base_level(), "debug");

        args.verbosity = 3;
        assert_eq!(args.base_level(), "trace");

        args.quiet = true;
        assert_eq!(args.base_level(), "error");
    }

    #[test]
    fn test_quiet_filter() {
        let args = LogArgs {
            quiet: true,
            filter: Some("opennet_announcer=trace".to_string()),
            ..Default::default()
        };
        assert_eq!(args.env_filter().to_string(), "error");
    }

    #[test]
    fn test_invalid_directive_skipped() {
        let args = LogArgs {
            filter: Some("opennet_announcer=trace,opennet=notalevel".to_string()),
            ..Default::default()
        };
        assert!(args.env_filter().to_string().contains("opennet_announcer=trace"));
    }
}
