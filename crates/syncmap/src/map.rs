//! Caller-facing handle and builder.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::actor::{self, Actor, Inbox, Signals};
use crate::config::ContainerConfig;
use crate::error::{Error, Result};
use crate::lifecycle::{ActorExit, Counters, JoinCtrl, ShutdownMode, ShutdownReport, Stats};
use crate::path::KeyPath;
use crate::policy::OperationPolicy;
use crate::request::{DeleteRequest, ReadRequest, ReadResponse, UpdateRequest};
use crate::spawn::spawn_actor;

/// Builder for one container.
pub struct MapSpec<P: OperationPolicy> {
	config: ContainerConfig,
	policy: P,
	state: P::State,
}

impl<P> MapSpec<P>
where
	P: OperationPolicy,
	P::State: Default,
{
	/// Builder starting from an empty state.
	pub fn new(policy: P) -> Self {
		Self::with_state(policy, P::State::default())
	}
}

impl<P: OperationPolicy> MapSpec<P> {
	/// Builder starting from `state`. The state moves into the actor.
	pub fn with_state(policy: P, state: P::State) -> Self {
		Self {
			config: ContainerConfig::default(),
			policy,
			state,
		}
	}

	/// Replaces the whole config.
	///
	/// # Panics
	///
	/// Panics if `config` fails [`ContainerConfig::validate`].
	#[must_use]
	#[track_caller]
	pub fn config(mut self, config: ContainerConfig) -> Self {
		if let Err(err) = config.validate() {
			panic!("invalid container config: {err}");
		}
		self.config = config;
		self
	}

	#[must_use]
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.config.name = name.into();
		self
	}

	/// Sets the per-channel request capacity.
	///
	/// # Panics
	///
	/// Panics if `capacity` is zero.
	#[must_use]
	pub fn capacity(mut self, capacity: usize) -> Self {
		assert!(capacity > 0, "request channel capacity must be > 0");
		self.config.capacity = capacity;
		self
	}

	/// Starts the actor and returns the first handle.
	///
	/// Outside a tokio runtime the actor runs on a shared background runtime.
	pub fn spawn(self) -> SyncMap<P> {
		let capacity = self.config.capacity;
		let (read_tx, reads) = mpsc::channel(capacity);
		let (update_tx, updates) = mpsc::channel(capacity);
		let (delete_tx, deletes) = mpsc::channel(capacity);

		let counters = Arc::new(Counters::default());
		let signals = Signals {
			cancel: CancellationToken::new(),
			close: CancellationToken::new(),
		};
		let actor = Actor {
			name: self.config.name.clone(),
			policy: self.policy,
			state: self.state,
			counters: Arc::clone(&counters),
		};
		let inbox = Inbox { reads, updates, deletes };
		let task = spawn_actor(&self.config.name, actor::run(actor, inbox, signals.clone()));

		SyncMap {
			reads: read_tx,
			updates: update_tx,
			deletes: delete_tx,
			control: Arc::new(Control {
				config: self.config,
				signals,
				counters,
				join: JoinCtrl::new(task),
			}),
		}
	}
}

struct Control {
	config: ContainerConfig,
	signals: Signals,
	counters: Arc<Counters>,
	join: JoinCtrl,
}

/// Cloneable handle to a container.
///
/// Every operation is a message to the container's actor; the handle never
/// touches the state. Dropping the last handle lets the actor finish the
/// queued requests and exit.
pub struct SyncMap<P: OperationPolicy> {
	reads: mpsc::Sender<ReadRequest<P::Key, P::Output>>,
	updates: mpsc::Sender<UpdateRequest<P::Key, P::Value>>,
	deletes: mpsc::Sender<DeleteRequest<P::Key>>,
	control: Arc<Control>,
}

impl<P: OperationPolicy> Clone for SyncMap<P> {
	fn clone(&self) -> Self {
		Self {
			reads: self.reads.clone(),
			updates: self.updates.clone(),
			deletes: self.deletes.clone(),
			control: Arc::clone(&self.control),
		}
	}
}

impl<P: OperationPolicy> fmt::Debug for SyncMap<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SyncMap")
			.field("name", &self.control.config.name)
			.field("closed", &self.is_closed())
			.finish_non_exhaustive()
	}
}

impl<P> SyncMap<P>
where
	P: OperationPolicy,
	P::State: Default,
{
	/// Starts a container with the default config and an empty state.
	pub fn spawn(policy: P) -> Self {
		MapSpec::new(policy).spawn()
	}

	/// Starts a container with `config` and an empty state.
	///
	/// # Panics
	///
	/// Panics if `config` fails [`ContainerConfig::validate`].
	#[track_caller]
	pub fn spawn_with(config: ContainerConfig, policy: P) -> Self {
		MapSpec::new(policy).config(config).spawn()
	}
}

impl<P: OperationPolicy> SyncMap<P> {
	/// Looks up `key`.
	pub async fn read(&self, key: P::Key) -> Result<ReadResponse<P::Output>> {
		let (request, pending) = ReadRequest::new(key);
		self.send_read(request).await?;
		pending.recv().await
	}

	/// Inserts or overwrites `key`.
	pub async fn update(&self, key: P::Key, value: P::Value) -> Result<()> {
		let (request, pending) = UpdateRequest::new(key, value);
		self.send_update(request).await?;
		pending.recv().await
	}

	/// Removes the entry addressed by `path`.
	///
	/// Returns `Ok(false)` when nothing was there. A path that runs through a
	/// value that is not a sub-container is an error.
	pub async fn delete(&self, path: KeyPath<P::Key>) -> Result<bool> {
		let (request, pending) = DeleteRequest::new(path);
		self.send_delete(request).await?;
		pending.recv().await
	}

	/// Removes a top-level entry.
	pub async fn delete_key(&self, key: P::Key) -> Result<bool> {
		self.delete(KeyPath::single(key)).await
	}

	/// Queues a prebuilt read. The caller awaits the paired
	/// [`PendingReply`](crate::PendingReply).
	pub async fn send_read(&self, request: ReadRequest<P::Key, P::Output>) -> Result<()> {
		self.reads.send(request).await.map_err(|_| Error::Closed)
	}

	/// Queues a prebuilt update.
	pub async fn send_update(&self, request: UpdateRequest<P::Key, P::Value>) -> Result<()> {
		self.updates.send(request).await.map_err(|_| Error::Closed)
	}

	/// Queues a prebuilt delete.
	pub async fn send_delete(&self, request: DeleteRequest<P::Key>) -> Result<()> {
		self.deletes.send(request).await.map_err(|_| Error::Closed)
	}

	/// Synchronous view for callers on plain threads.
	pub fn blocking(&self) -> BlockingSyncMap<P> {
		BlockingSyncMap { map: self.clone() }
	}

	pub fn name(&self) -> &str {
		&self.control.config.name
	}

	pub fn config(&self) -> &ContainerConfig {
		&self.control.config
	}

	/// Whether the container has stopped accepting requests.
	pub fn is_closed(&self) -> bool {
		self.reads.is_closed()
	}

	/// Requests served so far.
	pub fn stats(&self) -> Stats {
		self.control.counters.snapshot()
	}

	/// Exit summary, once the actor has stopped.
	pub async fn last_exit(&self) -> Option<ActorExit> {
		self.control.join.last_exit().await
	}

	/// Cancels the actor without waiting for it. Queued requests are rejected.
	pub fn cancel(&self) {
		self.control.signals.cancel.cancel();
	}

	/// Shuts the container down.
	///
	/// Safe to call from several handles at once; every caller waits for the
	/// same actor exit.
	pub async fn shutdown(&self, mode: ShutdownMode) -> ShutdownReport {
		let control = &self.control;
		let (completed, timed_out) = match mode {
			ShutdownMode::Immediate => {
				control.signals.cancel.cancel();
				control.join.join().await;
				(true, false)
			}
			ShutdownMode::Graceful { timeout } => {
				control.signals.close.cancel();
				let completed = control.join.join_with_timeout(timeout).await;
				if !completed {
					control.signals.cancel.cancel();
				}
				(completed, !completed)
			}
		};
		ShutdownReport {
			completed,
			timed_out,
			drained: control.counters.drained.load(Ordering::Relaxed),
			rejected: control.counters.rejected.load(Ordering::Relaxed),
			last_exit: control.join.last_exit().await,
		}
	}

	/// Graceful shutdown, escalating to immediate when `timeout` elapses.
	pub async fn shutdown_graceful_or_force(&self, timeout: Duration) -> ShutdownReport {
		let report = self.shutdown(ShutdownMode::Graceful { timeout }).await;
		if report.timed_out() {
			tracing::warn!(actor = %self.name(), "syncmap.shutdown.timeout");
			let mut forced = self.shutdown(ShutdownMode::Immediate).await;
			forced.timed_out = true;
			return forced;
		}
		report
	}

	/// [`shutdown_graceful_or_force`](Self::shutdown_graceful_or_force) with
	/// the configured timeout.
	pub async fn stop(&self) -> ShutdownReport {
		self.shutdown_graceful_or_force(self.control.config.shutdown_timeout()).await
	}

	/// Whether the actor task has ended.
	pub fn is_finished(&self) -> bool {
		self.control.join.is_finished()
	}
}

/// Blocking counterpart of [`SyncMap`].
///
/// Methods park the calling thread and must not be used from async code.
pub struct BlockingSyncMap<P: OperationPolicy> {
	map: SyncMap<P>,
}

impl<P: OperationPolicy> Clone for BlockingSyncMap<P> {
	fn clone(&self) -> Self {
		Self { map: self.map.clone() }
	}
}

impl<P: OperationPolicy> BlockingSyncMap<P> {
	pub fn read(&self, key: P::Key) -> Result<ReadResponse<P::Output>> {
		let (request, pending) = ReadRequest::new(key);
		self.map.reads.blocking_send(request).map_err(|_| Error::Closed)?;
		pending.blocking_recv()
	}

	pub fn update(&self, key: P::Key, value: P::Value) -> Result<()> {
		let (request, pending) = UpdateRequest::new(key, value);
		self.map.updates.blocking_send(request).map_err(|_| Error::Closed)?;
		pending.blocking_recv()
	}

	pub fn delete(&self, path: KeyPath<P::Key>) -> Result<bool> {
		let (request, pending) = DeleteRequest::new(path);
		self.map.deletes.blocking_send(request).map_err(|_| Error::Closed)?;
		pending.blocking_recv()
	}

	pub fn delete_key(&self, key: P::Key) -> Result<bool> {
		self.delete(KeyPath::single(key))
	}

	/// The async handle this view wraps.
	pub fn as_async(&self) -> &SyncMap<P> {
		&self.map
	}
}
