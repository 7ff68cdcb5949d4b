//! Composite keys for addressing entries inside nested containers.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::PathError;

/// Non-empty ordered sequence of key segments.
///
/// Segment 0 selects a top-level entry, segment 1 selects an entry inside that
/// entry's sub-container, and so on. A single-segment path addresses a
/// top-level entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath<K> {
	segments: Vec<K>,
}

impl<K> KeyPath<K> {
	/// Builds a path from its segments.
	pub fn new(segments: Vec<K>) -> Result<Self, PathError> {
		if segments.is_empty() {
			return Err(PathError::Empty);
		}
		Ok(Self { segments })
	}

	/// Single-segment path addressing a top-level entry.
	pub fn single(key: K) -> Self {
		Self { segments: vec![key] }
	}

	/// Appends one segment, descending one level further.
	#[must_use]
	pub fn child(mut self, key: K) -> Self {
		self.segments.push(key);
		self
	}

	/// Number of segments. Always at least one.
	pub fn len(&self) -> usize {
		self.segments.len()
	}

	/// Always `false`; present for API symmetry with collections.
	pub fn is_empty(&self) -> bool {
		false
	}

	/// Returns `true` when the path addresses a top-level entry.
	pub fn is_top_level(&self) -> bool {
		self.segments.len() == 1
	}

	/// First segment.
	pub fn head(&self) -> &K {
		&self.segments[0]
	}

	/// Final segment, the one that is removed on delete.
	pub fn leaf(&self) -> &K {
		&self.segments[self.segments.len() - 1]
	}

	/// All segments in descent order.
	pub fn segments(&self) -> &[K] {
		&self.segments
	}

	/// Consumes the path and returns its segments.
	pub fn into_segments(self) -> Vec<K> {
		self.segments
	}
}

impl<K> From<K> for KeyPath<K> {
	fn from(key: K) -> Self {
		Self::single(key)
	}
}

impl<K> TryFrom<Vec<K>> for KeyPath<K> {
	type Error = PathError;

	fn try_from(segments: Vec<K>) -> Result<Self, Self::Error> {
		Self::new(segments)
	}
}

/// Value that may hold a like-shaped sub-container.
///
/// Implemented by value types used in maps of maps, so composite-key deletion
/// can descend into them.
pub trait Nested<K>: Sized {
	/// Returns the sub-container when this value is one.
	fn children_mut(&mut self) -> Option<&mut HashMap<K, Self>>;
}

/// Deletes the entry addressed by `path` from `map`.
///
/// Returns `Ok(true)` when an entry was removed and `Ok(false)` when any
/// segment along the way is absent. Fails with
/// [`PathError::NotTraversable`] when an intermediate segment resolves to a
/// value that is not a sub-container.
pub fn delete_path<K, V>(map: &mut HashMap<K, V>, path: &KeyPath<K>) -> Result<bool, PathError>
where
	K: Eq + Hash,
	V: Nested<K>,
{
	let (leaf, parents) = path.segments.split_last().ok_or(PathError::Empty)?;
	let mut current = map;
	for (depth, segment) in parents.iter().enumerate() {
		let Some(entry) = current.get_mut(segment) else {
			return Ok(false);
		};
		current = entry.children_mut().ok_or(PathError::NotTraversable { depth })?;
	}
	Ok(current.remove(leaf).is_some())
}
