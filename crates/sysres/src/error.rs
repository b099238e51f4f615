/// Errors surfaced by the resource resolvers.
///
/// A missing or malformed source file is not an error; it only moves
/// resolution to the next tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SysresError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(&'static str),

    #[error("no source reported {0}")]
    Unavailable(&'static str),
}

pub type Result<T> = std::result::Result<T, SysresError>;
