use thiserror::Error;

/// Errors produced while parsing or validating archive types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The input is not a `major.minor.patch` version string.
    #[error("malformed version {0:?}: expected major.minor.patch")]
    MalformedVersion(String),

    /// The module name is not part of [`crate::MODULE_CATALOG`].
    #[error("module {0:?} is not in the module catalog")]
    UnknownModule(String),
}
