use iso_core::IsoError;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors surfaced by the simulation crate.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A movement request named an actor that does not exist.
    #[error("actor not found in simulation: {0}")]
    ActorNotFound(usize),

    /// A configuration value is out of its valid range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read or parsed.
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Loading world data failed.
    #[error(transparent)]
    Core(#[from] IsoError),
}
