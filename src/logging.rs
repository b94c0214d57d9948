use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Only the binary calls this; the library never installs a subscriber.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("gqlkit={default_level}")));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false).compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(env_filter).with(stderr_layer).try_init();
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(true);
        tracing::debug!("still logging after a second init");
    }
}
