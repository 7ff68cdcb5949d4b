//! Error types for container requests and key path traversal.

use thiserror::Error;

/// Errors raised while building or walking a [`KeyPath`](crate::KeyPath).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
	/// A key path needs at least one segment.
	#[error("key path must contain at least one segment")]
	Empty,
	/// The value selected by segment `depth` is not a nested container, so the
	/// remaining segments cannot be resolved.
	#[error("segment {depth} of key path does not resolve to a nested container")]
	NotTraversable {
		/// Index of the segment whose value could not be descended into.
		depth: usize,
	},
}

/// Errors returned by an [`OperationPolicy`](crate::OperationPolicy) method.
///
/// These are sent back to the caller that issued the request; the actor keeps
/// serving other requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
	/// Composite key path could not be resolved.
	#[error(transparent)]
	Path(#[from] PathError),
	/// The read output could not be encoded.
	#[error("failed to encode value: {0}")]
	Encode(String),
	/// The policy refused the request.
	#[error("request rejected: {0}")]
	Rejected(String),
}

/// Errors surfaced to callers of a [`SyncMap`](crate::SyncMap).
#[derive(Debug, Error)]
pub enum Error {
	/// The container no longer accepts requests.
	#[error("container is closed")]
	Closed,
	/// The request was accepted but discarded before a reply was produced,
	/// either by an immediate shutdown or because the actor died.
	#[error("request was dropped without a reply")]
	Dropped,
	/// The policy reported a failure for this request.
	#[error(transparent)]
	Policy(#[from] PolicyError),
	/// A stored value did not have the shape the caller asked for.
	#[error("type mismatch: expected {expected}, found {found}")]
	TypeMismatch {
		/// Shape requested by the caller.
		expected: &'static str,
		/// Shape actually stored.
		found: &'static str,
	},
	/// Serialized read output could not be decoded into the requested type.
	#[error("failed to decode value: {0}")]
	Decode(#[from] serde_json::Error),
}

impl From<PathError> for Error {
	fn from(err: PathError) -> Self {
		Self::Policy(PolicyError::Path(err))
	}
}

/// Result type for container requests.
pub type Result<T> = std::result::Result<T, Error>;
