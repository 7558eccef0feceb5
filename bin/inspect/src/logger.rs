use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `fmt` subscriber on stderr. `RUST_LOG` directives are combined with the level
/// selected by the `-v` count.
pub(crate) fn init_tracing(verbosity_level: u8) {
    let Some(level) = level(verbosity_level) else {
        return;
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let fmt_layer =
        tracing_subscriber::fmt::layer().with_thread_names(true).with_writer(std::io::stderr);
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Maps the `-v` count to a level. Zero disables logging.
pub(crate) const fn level(verbosity_level: u8) -> Option<Level> {
    Some(match verbosity_level {
        0 => return None,
        1 => Level::ERROR,
        2 => Level::WARN,
        3 => Level::INFO,
        4 => Level::DEBUG,
        _ => Level::TRACE,
    })
}
