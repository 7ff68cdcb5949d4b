//! Operation policies: how each request mutates the container state.
//!
//! The actor never inspects the state itself. It hands `&mut State` to the
//! matching policy method and sends whatever that method returns back to the
//! caller.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::Serialize;

use crate::error::{PathError, PolicyError};
use crate::path::{KeyPath, Nested, delete_path};

/// Read, update and delete semantics for one container.
///
/// Methods run on the actor task with exclusive access to the state; no two
/// of them ever run concurrently for the same container.
pub trait OperationPolicy: Send + 'static {
	/// Key of a read or update, and segment type of delete paths.
	type Key: Send + 'static;
	/// Value written by an update.
	type Value: Send + 'static;
	/// State owned by the actor.
	type State: Send + 'static;
	/// Value returned by a read.
	type Output: Send + 'static;

	/// Runs once before the first request is served.
	fn on_start(&mut self, _state: &mut Self::State) {}

	/// Looks up `key`. `Ok(None)` means the key is absent.
	fn read(&mut self, state: &mut Self::State, key: &Self::Key) -> Result<Option<Self::Output>, PolicyError>;

	/// Inserts or overwrites `key`.
	fn update(&mut self, state: &mut Self::State, key: Self::Key, value: Self::Value) -> Result<(), PolicyError>;

	/// Removes the entry addressed by `path`. Returns whether an entry was removed.
	fn delete(&mut self, state: &mut Self::State, path: &KeyPath<Self::Key>) -> Result<bool, PolicyError>;

	/// Runs once when the actor exits, with the final state.
	fn on_stop(&mut self, _state: &mut Self::State) {}
}

/// Plain key lookup, assignment and removal over a `HashMap`.
///
/// Delete paths longer than one segment fail with
/// [`PathError::NotTraversable`] once their first segment resolves, since
/// values here are never containers.
pub struct DirectPolicy<K, V> {
	_marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> DirectPolicy<K, V> {
	pub fn new() -> Self {
		Self { _marker: PhantomData }
	}
}

impl<K, V> Default for DirectPolicy<K, V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K, V> fmt::Debug for DirectPolicy<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("DirectPolicy")
	}
}

impl<K, V> OperationPolicy for DirectPolicy<K, V>
where
	K: Eq + Hash + Send + 'static,
	V: Clone + Send + 'static,
{
	type Key = K;
	type Value = V;
	type State = HashMap<K, V>;
	type Output = V;

	fn read(&mut self, state: &mut Self::State, key: &K) -> Result<Option<V>, PolicyError> {
		Ok(state.get(key).cloned())
	}

	fn update(&mut self, state: &mut Self::State, key: K, value: V) -> Result<(), PolicyError> {
		state.insert(key, value);
		Ok(())
	}

	fn delete(&mut self, state: &mut Self::State, path: &KeyPath<K>) -> Result<bool, PolicyError> {
		if path.is_top_level() {
			return Ok(state.remove(path.head()).is_some());
		}
		if state.contains_key(path.head()) {
			return Err(PathError::NotTraversable { depth: 0 }.into());
		}
		Ok(false)
	}
}

/// Map-of-maps policy: like [`DirectPolicy`], but deletes descend into
/// sub-containers exposed through [`Nested`].
pub struct NestedPolicy<K, V> {
	_marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> NestedPolicy<K, V> {
	pub fn new() -> Self {
		Self { _marker: PhantomData }
	}
}

impl<K, V> Default for NestedPolicy<K, V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K, V> fmt::Debug for NestedPolicy<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("NestedPolicy")
	}
}

impl<K, V> OperationPolicy for NestedPolicy<K, V>
where
	K: Eq + Hash + Send + 'static,
	V: Nested<K> + Clone + Send + 'static,
{
	type Key = K;
	type Value = V;
	type State = HashMap<K, V>;
	type Output = V;

	fn read(&mut self, state: &mut Self::State, key: &K) -> Result<Option<V>, PolicyError> {
		Ok(state.get(key).cloned())
	}

	fn update(&mut self, state: &mut Self::State, key: K, value: V) -> Result<(), PolicyError> {
		state.insert(key, value);
		Ok(())
	}

	fn delete(&mut self, state: &mut Self::State, path: &KeyPath<K>) -> Result<bool, PolicyError> {
		Ok(delete_path(state, path)?)
	}
}

/// Adapter that returns reads of the inner policy as JSON bytes.
#[derive(Debug, Default)]
pub struct JsonPolicy<P> {
	inner: P,
}

impl<P> JsonPolicy<P> {
	pub fn new(inner: P) -> Self {
		Self { inner }
	}

	pub fn into_inner(self) -> P {
		self.inner
	}
}

impl<P> OperationPolicy for JsonPolicy<P>
where
	P: OperationPolicy,
	P::Output: Serialize,
{
	type Key = P::Key;
	type Value = P::Value;
	type State = P::State;
	type Output = Vec<u8>;

	fn on_start(&mut self, state: &mut Self::State) {
		self.inner.on_start(state);
	}

	fn read(&mut self, state: &mut Self::State, key: &Self::Key) -> Result<Option<Vec<u8>>, PolicyError> {
		self.inner
			.read(state, key)?
			.map(|value| serde_json::to_vec(&value))
			.transpose()
			.map_err(|err| PolicyError::Encode(err.to_string()))
	}

	fn update(&mut self, state: &mut Self::State, key: Self::Key, value: Self::Value) -> Result<(), PolicyError> {
		self.inner.update(state, key, value)
	}

	fn delete(&mut self, state: &mut Self::State, path: &KeyPath<Self::Key>) -> Result<bool, PolicyError> {
		self.inner.delete(state, path)
	}

	fn on_stop(&mut self, state: &mut Self::State) {
		self.inner.on_stop(state);
	}
}

type ReadFn<S, K, O> = dyn FnMut(&mut S, &K) -> Result<Option<O>, PolicyError> + Send;
type UpdateFn<S, K, V> = dyn FnMut(&mut S, K, V) -> Result<(), PolicyError> + Send;
type DeleteFn<S, K> = dyn FnMut(&mut S, &KeyPath<K>) -> Result<bool, PolicyError> + Send;

/// Policy assembled from three closures.
pub struct FnPolicy<S, K, V, O> {
	read: Box<ReadFn<S, K, O>>,
	update: Box<UpdateFn<S, K, V>>,
	delete: Box<DeleteFn<S, K>>,
}

impl<S, K, V, O> FnPolicy<S, K, V, O> {
	pub fn new(
		read: impl FnMut(&mut S, &K) -> Result<Option<O>, PolicyError> + Send + 'static,
		update: impl FnMut(&mut S, K, V) -> Result<(), PolicyError> + Send + 'static,
		delete: impl FnMut(&mut S, &KeyPath<K>) -> Result<bool, PolicyError> + Send + 'static,
	) -> Self {
		Self {
			read: Box::new(read),
			update: Box::new(update),
			delete: Box::new(delete),
		}
	}
}

impl<S, K, V, O> OperationPolicy for FnPolicy<S, K, V, O>
where
	S: Send + 'static,
	K: Send + 'static,
	V: Send + 'static,
	O: Send + 'static,
{
	type Key = K;
	type Value = V;
	type State = S;
	type Output = O;

	fn read(&mut self, state: &mut S, key: &K) -> Result<Option<O>, PolicyError> {
		(self.read)(state, key)
	}

	fn update(&mut self, state: &mut S, key: K, value: V) -> Result<(), PolicyError> {
		(self.update)(state, key, value)
	}

	fn delete(&mut self, state: &mut S, path: &KeyPath<K>) -> Result<bool, PolicyError> {
		(self.delete)(state, path)
	}
}
