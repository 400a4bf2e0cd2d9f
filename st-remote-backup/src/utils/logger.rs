//! Logging configuration using tracing.
//!
//! WARN and ERROR events go to stderr, everything else to stdout. At INFO
//! and above events are also kept in the in-memory [`LogBuffer`] served by
//! `/logs`.

use crate::logs::{layer::LogBufferLayer, LogBuffer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt, OrElse, WithMaxLevel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the specified level, mirroring events into `buffer`
pub fn init(level: &str, buffer: Arc<LogBuffer>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(split_by_level(
            std::io::stderr,
            std::io::stdout,
        )))
        .with(LogBufferLayer::new(buffer))
        .try_init()?;

    Ok(())
}

/// Route WARN and ERROR to `errors`, the rest to `rest`
fn split_by_level<E, O>(errors: E, rest: O) -> OrElse<WithMaxLevel<E>, O>
where
    E: for<'w> MakeWriter<'w>,
    O: for<'w> MakeWriter<'w>,
{
    errors.with_max_level(Level::WARN).or_else(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_errors_and_warnings_go_to_their_own_stream() {
        let errors = Captured::default();
        let rest = Captured::default();

        let err_sink = errors.clone();
        let out_sink = rest.clone();
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(split_by_level(move || err_sink.clone(), move || out_sink.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("[list] ok count=1");
            tracing::warn!("[auth] open");
            tracing::error!("[delete] error: gone");
        });

        let errors = errors.text();
        let rest = rest.text();
        assert!(errors.contains("[auth] open"));
        assert!(errors.contains("[delete] error: gone"));
        assert!(!errors.contains("[list] ok"));
        assert!(rest.contains("[list] ok count=1"));
        assert!(!rest.contains("[delete]"));
    }
}
