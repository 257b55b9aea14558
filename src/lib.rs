pub mod poolstore;
#[cfg(test)]
mod tests;

pub use crate::poolstore::*;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_tracing(max_level: Level) {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than TRACE (e.g, debug, info, warn, etc.)
        // will be written to stdout.
        .with_max_level(max_level)
        // completes the builder.
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");
}
