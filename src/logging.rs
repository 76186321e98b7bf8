use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

/// Collaborator warnings always reach stderr; `verbose` adds stage traces.
pub fn init(verbose: bool) -> Result<()> {
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_max_level(max_level(verbose))
        .with_target(false)
        .without_time()
        .try_init();
    Ok(())
}

fn max_level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}
