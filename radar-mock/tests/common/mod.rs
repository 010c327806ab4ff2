#![allow(dead_code)]

use radar_mock::{Error, Result};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_tracing() -> Result<DefaultGuard> {
    Ok(tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_level(true)
            .with_line_number(true)
            .with_thread_names(false)
            .with_target(true)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(
                    format!("{}=debug", env!("CARGO_PKG_NAME").replace("-", "_"))
                        .parse()
                        .map_err(|err| Error::Message(format!("{err}")))?,
                ),
            )
            .with_test_writer()
            .finish(),
    ))
}
