//! Shutdown modes, exit reporting and join coordination for the actor task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::sync::futures::Notified;
use tokio::task::{JoinError, JoinHandle};

/// How [`SyncMap::shutdown`](crate::SyncMap::shutdown) treats queued requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
	/// Cancel the actor now. Requests still queued are rejected; their callers
	/// observe [`Error::Dropped`](crate::Error::Dropped).
	Immediate,
	/// Stop accepting requests, finish every request already queued, then
	/// exit. Falls back to cancellation when `timeout` elapses first.
	Graceful { timeout: Duration },
}

/// Why the actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActorExitKind {
	/// Graceful shutdown drained the queues.
	Stopped,
	/// Every handle was dropped.
	Closed,
	/// Immediate shutdown or a timed-out graceful one.
	Cancelled,
	/// A policy method panicked. The state is discarded.
	Panicked,
	/// The actor task failed to join for another reason.
	JoinFailed,
}

/// Exit summary of the actor task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorExit {
	kind: ActorExitKind,
	message: Option<String>,
}

impl ActorExit {
	pub(crate) fn new(kind: ActorExitKind) -> Self {
		Self { kind, message: None }
	}

	pub(crate) fn with_message(kind: ActorExitKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: Some(message.into()),
		}
	}

	pub fn kind(&self) -> ActorExitKind {
		self.kind
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	pub fn is_failure(&self) -> bool {
		matches!(self.kind, ActorExitKind::Panicked | ActorExitKind::JoinFailed)
	}
}

/// Result of a shutdown call.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
	pub(crate) completed: bool,
	pub(crate) timed_out: bool,
	pub(crate) drained: u64,
	pub(crate) rejected: u64,
	pub(crate) last_exit: Option<ActorExit>,
}

impl ShutdownReport {
	/// The actor task has finished.
	pub fn completed(&self) -> bool {
		self.completed
	}

	/// A graceful drain did not finish within its budget.
	pub fn timed_out(&self) -> bool {
		self.timed_out
	}

	/// Requests served after shutdown began.
	pub fn drained(&self) -> u64 {
		self.drained
	}

	/// Queued requests discarded without being served.
	pub fn rejected(&self) -> u64 {
		self.rejected
	}

	pub fn last_exit(&self) -> Option<&ActorExit> {
		self.last_exit.as_ref()
	}
}

/// Request counters shared between the actor and its handles.
#[derive(Debug, Default)]
pub(crate) struct Counters {
	pub(crate) reads: AtomicU64,
	pub(crate) updates: AtomicU64,
	pub(crate) deletes: AtomicU64,
	pub(crate) failures: AtomicU64,
	pub(crate) drained: AtomicU64,
	pub(crate) rejected: AtomicU64,
}

impl Counters {
	pub(crate) fn bump(counter: &AtomicU64) {
		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> Stats {
		Stats {
			reads: self.reads.load(Ordering::Relaxed),
			updates: self.updates.load(Ordering::Relaxed),
			deletes: self.deletes.load(Ordering::Relaxed),
			failures: self.failures.load(Ordering::Relaxed),
		}
	}
}

/// Requests served so far, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
	pub reads: u64,
	pub updates: u64,
	pub deletes: u64,
	/// Requests whose policy method returned an error.
	pub failures: u64,
}

impl Stats {
	pub fn total(&self) -> u64 {
		self.reads + self.updates + self.deletes
	}
}

enum JoinState {
	/// Actor task still owned; the first joiner takes it.
	Handle(JoinHandle<ActorExit>),
	/// A caller is awaiting the handle.
	Joining,
	Done,
}

/// Lets any number of shutdown callers wait on the same actor task.
///
/// Only one caller awaits the [`JoinHandle`]; the others wait on a [`Notify`]
/// until that caller records the exit. The locks are never held across an
/// await, so a leader that is dropped mid-join can hand the task back.
pub(crate) struct JoinCtrl {
	state: Mutex<JoinState>,
	exit: Mutex<Option<ActorExit>>,
	done: Notify,
}

enum JoinStep<'a> {
	Done,
	Wait(Notified<'a>),
	Lead(JoinHandle<ActorExit>),
}

/// Holds the actor's join handle while one caller awaits it.
///
/// Dropping the leader before the task finishes puts the handle back and
/// wakes the waiters, so one of them takes over.
struct Leader<'a> {
	ctrl: &'a JoinCtrl,
	handle: Option<JoinHandle<ActorExit>>,
}

impl Leader<'_> {
	/// Result of the task, or `None` when `deadline` passes first.
	async fn wait(&mut self, deadline: Option<tokio::time::Instant>) -> Option<Result<ActorExit, JoinError>> {
		let handle = self.handle.as_mut()?;
		let res = match deadline {
			Some(deadline) => tokio::select! {
				res = handle => res,
				_ = tokio::time::sleep_until(deadline) => return None,
			},
			None => handle.await,
		};
		self.handle = None;
		Some(res)
	}
}

impl Drop for Leader<'_> {
	fn drop(&mut self) {
		if let Some(handle) = self.handle.take() {
			*lock(&self.ctrl.state) = JoinState::Handle(handle);
			self.ctrl.done.notify_waiters();
		}
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JoinCtrl {
	pub(crate) fn new(handle: JoinHandle<ActorExit>) -> Self {
		Self {
			state: Mutex::new(JoinState::Handle(handle)),
			exit: Mutex::new(None),
			done: Notify::new(),
		}
	}

	/// Exit of the actor task, collecting it first if the task already ended
	/// without anyone joining it.
	pub(crate) async fn last_exit(&self) -> Option<ActorExit> {
		let finished = matches!(&*lock(&self.state), JoinState::Handle(handle) if handle.is_finished());
		if finished {
			self.join().await;
		}
		lock(&self.exit).clone()
	}

	/// Whether the actor task has ended.
	pub(crate) fn is_finished(&self) -> bool {
		match &*lock(&self.state) {
			JoinState::Handle(handle) => handle.is_finished(),
			JoinState::Joining => false,
			JoinState::Done => true,
		}
	}

	/// Waits until the actor task finishes.
	pub(crate) async fn join(&self) {
		self.join_until(None).await;
	}

	/// Waits at most `timeout`. Returns `true` once the task has finished.
	pub(crate) async fn join_with_timeout(&self, timeout: Duration) -> bool {
		self.join_until(Some(tokio::time::Instant::now() + timeout)).await
	}

	fn step(&self) -> JoinStep<'_> {
		let mut state = lock(&self.state);
		match &*state {
			JoinState::Done => JoinStep::Done,
			// Created under the lock so the leader's notify is not missed.
			JoinState::Joining => JoinStep::Wait(self.done.notified()),
			JoinState::Handle(_) => match std::mem::replace(&mut *state, JoinState::Joining) {
				JoinState::Handle(handle) => JoinStep::Lead(handle),
				_ => unreachable!(),
			},
		}
	}

	async fn join_until(&self, deadline: Option<tokio::time::Instant>) -> bool {
		loop {
			match self.step() {
				JoinStep::Done => return true,
				JoinStep::Wait(notified) => match deadline {
					Some(deadline) => {
						tokio::select! {
							_ = notified => continue,
							_ = tokio::time::sleep_until(deadline) => return false,
						}
					}
					None => notified.await,
				},
				JoinStep::Lead(handle) => {
					let mut leader = Leader {
						ctrl: self,
						handle: Some(handle),
					};
					// On timeout the leader drops here and returns the handle.
					let Some(res) = leader.wait(deadline).await else {
						return false;
					};
					let exit = match res {
						Ok(exit) => exit,
						Err(err) if err.is_panic() => ActorExit::with_message(ActorExitKind::Panicked, panic_message(err)),
						Err(err) if err.is_cancelled() => ActorExit::new(ActorExitKind::Cancelled),
						Err(err) => ActorExit::with_message(ActorExitKind::JoinFailed, err.to_string()),
					};
					*lock(&self.exit) = Some(exit);
					*lock(&self.state) = JoinState::Done;
					self.done.notify_waiters();
					return true;
				}
			}
		}
	}
}

fn panic_message(err: JoinError) -> String {
	let payload = err.into_panic();
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"policy panicked".to_string()
	}
}
