//! Request and response shapes exchanged with the serialization actor.
//!
//! Every request carries a one-shot reply sender. Callers never write to it;
//! the actor consumes the request and delivers exactly one reply, so a policy
//! cannot forget to answer.

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use crate::error::{Error, PolicyError, Result};
use crate::path::KeyPath;
use crate::value::Value;

/// Outcome carried on a reply channel.
pub(crate) type Outcome<T> = std::result::Result<T, PolicyError>;

/// Caller side of a reply channel.
#[derive(Debug)]
pub struct PendingReply<T> {
	rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> PendingReply<T> {
	/// Waits for the actor's reply.
	pub async fn recv(self) -> Result<T> {
		match self.rx.await {
			Ok(outcome) => Ok(outcome?),
			Err(_) => Err(Error::Dropped),
		}
	}

	/// Blocks the current thread until the actor replies.
	///
	/// # Panics
	///
	/// Panics when called from within an asynchronous execution context.
	pub fn blocking_recv(self) -> Result<T> {
		match self.rx.blocking_recv() {
			Ok(outcome) => Ok(outcome?),
			Err(_) => Err(Error::Dropped),
		}
	}
}

/// Actor side of a reply channel. Consumed by the single send.
#[derive(Debug)]
pub(crate) struct Reply<T> {
	tx: oneshot::Sender<Outcome<T>>,
}

impl<T> Reply<T> {
	/// Delivers the outcome. Returns `false` when the caller stopped waiting.
	pub(crate) fn deliver(self, outcome: Outcome<T>) -> bool {
		self.tx.send(outcome).is_ok()
	}
}

fn reply_channel<T>() -> (Reply<T>, PendingReply<T>) {
	let (tx, rx) = oneshot::channel();
	(Reply { tx }, PendingReply { rx })
}

/// Lookup of one key.
#[derive(Debug)]
pub struct ReadRequest<K, R> {
	pub(crate) key: K,
	pub(crate) reply: Reply<ReadResponse<R>>,
}

impl<K, R> ReadRequest<K, R> {
	/// Builds a read request and the reply the caller waits on.
	pub fn new(key: K) -> (Self, PendingReply<ReadResponse<R>>) {
		let (reply, pending) = reply_channel();
		(Self { key, reply }, pending)
	}

	pub fn key(&self) -> &K {
		&self.key
	}
}

/// Insert-or-overwrite of one key.
#[derive(Debug)]
pub struct UpdateRequest<K, V> {
	pub(crate) key: K,
	pub(crate) value: V,
	pub(crate) reply: Reply<()>,
}

impl<K, V> UpdateRequest<K, V> {
	/// Builds an update request and the acknowledgment the caller waits on.
	pub fn new(key: K, value: V) -> (Self, PendingReply<()>) {
		let (reply, pending) = reply_channel();
		(Self { key, value, reply }, pending)
	}

	pub fn key(&self) -> &K {
		&self.key
	}
}

/// Removal of the entry addressed by a key path.
///
/// The acknowledgment is `true` when an entry was removed and `false` when the
/// path did not resolve to one.
#[derive(Debug)]
pub struct DeleteRequest<K> {
	pub(crate) path: KeyPath<K>,
	pub(crate) reply: Reply<bool>,
}

impl<K> DeleteRequest<K> {
	/// Builds a delete request and the acknowledgment the caller waits on.
	pub fn new(path: KeyPath<K>) -> (Self, PendingReply<bool>) {
		let (reply, pending) = reply_channel();
		(Self { path, reply }, pending)
	}

	pub fn path(&self) -> &KeyPath<K> {
		&self.path
	}
}

/// Reply to a read.
///
/// Absence is expressed by [`found`](Self::found) returning `false`, never by
/// an empty value, so a stored empty value stays distinguishable.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResponse<R> {
	value: Option<R>,
}

impl<R> ReadResponse<R> {
	pub(crate) fn new(value: Option<R>) -> Self {
		Self { value }
	}

	/// Whether the key was present.
	pub fn found(&self) -> bool {
		self.value.is_some()
	}

	pub fn value(&self) -> Option<&R> {
		self.value.as_ref()
	}

	pub fn into_value(self) -> Option<R> {
		self.value
	}
}

impl ReadResponse<Value> {
	/// Converts the found value into `T`.
	///
	/// Returns `Ok(None)` when the key was absent and
	/// [`Error::TypeMismatch`] when the stored value has another shape.
	pub fn get<T>(self) -> Result<Option<T>>
	where
		T: TryFrom<Value, Error = Error>,
	{
		self.value.map(T::try_from).transpose()
	}

	/// Like [`get`](Self::get), treating a shape mismatch as a broken caller
	/// contract.
	///
	/// # Panics
	///
	/// Panics when the stored value is not convertible to `T`.
	#[track_caller]
	pub fn expect<T>(self) -> Option<T>
	where
		T: TryFrom<Value, Error = Error>,
	{
		match self.get() {
			Ok(value) => value,
			Err(err) => panic!("read reply does not match the expected shape: {err}"),
		}
	}
}

impl ReadResponse<Vec<u8>> {
	/// Decodes JSON read output produced by [`JsonPolicy`](crate::JsonPolicy).
	pub fn decode<T>(&self) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		self.value
			.as_deref()
			.map(|bytes| serde_json::from_slice::<T>(bytes))
			.transpose()
			.map_err(Error::from)
	}
}
