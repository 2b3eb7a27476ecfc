use thiserror::Error;

/// Precondition violations inside the tracking and control core.
///
/// Normal steady-state conditions (an identity with no candidate this frame, a
/// controller still settling) are not errors and never produce one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// `dir_vec`/`flag_vec` were read before `update_vectors` ever ran
    #[error("direction vectors have not been computed yet")]
    VectorsNotComputed,
    /// `update_vectors` was called before the start, end or target flag was set
    #[error("vector {0} must be set before updating vectors")]
    VectorsNotReady(&'static str),
    /// Identities must remember at least their current position
    #[error("position history length must be at least 1")]
    EmptyHistory,
    /// A handle refers to an identity that is not (or no longer) registered
    #[error("no identity registered with id {0}")]
    UnknownIdentity(usize),
}
