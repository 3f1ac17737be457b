use std::sync::Once;

use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    fmt, EnvFilter,
};

pub const DEFAULT_LOG_FILTER: &str = "cardledger_core=info";

static TRACING_INIT: Once = Once::new();

/// Installs the global `fmt` subscriber. `RUST_LOG` wins; `default_directive`
/// applies when it is absent or unparsable.
pub fn init_tracing(default_directive: &str) {
    TRACING_INIT.call_once(|| {
        let directive: Directive = default_directive
            .parse()
            .or_else(|_| DEFAULT_LOG_FILTER.parse())
            .unwrap_or_else(|_| Directive::from(LevelFilter::INFO));
        let filter = EnvFilter::builder()
            .with_default_directive(directive)
            .from_env_lossy();

        // A host application may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
