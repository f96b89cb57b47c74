//! Error types for the switchboard crate.

use thiserror::Error;

use crate::pane::PtyId;

/// Result type alias using switchboard's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in switchboard operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The process-spawn service refused or failed to create a process.
    #[error("failed to spawn PTY: {0}")]
    Spawn(String),

    /// Failure reported by a process-spawn service implementation.
    #[error("PTY error: {0}")]
    Pty(#[from] anyhow::Error),

    /// A newer spawn on the same bridge overtook this one before it resolved.
    #[error("spawn of {0} was superseded by a newer spawn")]
    SpawnSuperseded(PtyId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_converts_with_context() {
        fn service_call() -> Result<()> {
            Err(anyhow::anyhow!("pty closed"))?;
            Ok(())
        }

        let err = service_call().unwrap_err();
        assert!(matches!(err, Error::Pty(_)));
        assert_eq!(err.to_string(), "PTY error: pty closed");
    }

    #[test]
    fn test_superseded_names_the_process() {
        let err = Error::SpawnSuperseded(PtyId::new("pty-7"));
        assert_eq!(err.to_string(), "spawn of pty-7 was superseded by a newer spawn");
    }
}
