//! The serialization actor: sole owner of a container's state.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{ActorExit, ActorExitKind, Counters};
use crate::policy::OperationPolicy;
use crate::request::{DeleteRequest, Outcome, ReadRequest, ReadResponse, Reply, UpdateRequest};

/// Receiving ends of the three request channels.
pub(crate) struct Inbox<P: OperationPolicy> {
	pub(crate) reads: mpsc::Receiver<ReadRequest<P::Key, P::Output>>,
	pub(crate) updates: mpsc::Receiver<UpdateRequest<P::Key, P::Value>>,
	pub(crate) deletes: mpsc::Receiver<DeleteRequest<P::Key>>,
}

impl<P: OperationPolicy> Inbox<P> {
	/// Refuses new requests. Already queued requests stay receivable.
	fn close(&mut self) {
		self.reads.close();
		self.updates.close();
		self.deletes.close();
	}

	/// Drops every queued request, waking its caller with a dropped reply.
	fn discard_queued(&mut self) -> u64 {
		self.close();
		let mut discarded = 0u64;
		while self.reads.try_recv().is_ok() {
			discarded += 1;
		}
		while self.updates.try_recv().is_ok() {
			discarded += 1;
		}
		while self.deletes.try_recv().is_ok() {
			discarded += 1;
		}
		discarded
	}
}

/// Channels that may still yield requests. A channel reports closed once all
/// senders are gone (or the inbox was closed) and its queue is empty.
struct OpenChannels {
	reads: bool,
	updates: bool,
	deletes: bool,
}

impl Default for OpenChannels {
	fn default() -> Self {
		Self {
			reads: true,
			updates: true,
			deletes: true,
		}
	}
}

impl OpenChannels {
	fn any(&self) -> bool {
		self.reads || self.updates || self.deletes
	}
}

/// Shutdown signals observed by the actor loop.
#[derive(Clone)]
pub(crate) struct Signals {
	/// Stop now, rejecting queued requests.
	pub(crate) cancel: CancellationToken,
	/// Stop accepting requests and drain the queues.
	pub(crate) close: CancellationToken,
}

pub(crate) struct Actor<P: OperationPolicy> {
	pub(crate) name: String,
	pub(crate) policy: P,
	pub(crate) state: P::State,
	pub(crate) counters: Arc<Counters>,
}

impl<P: OperationPolicy> Actor<P> {
	fn serve_read(&mut self, request: ReadRequest<P::Key, P::Output>) {
		Counters::bump(&self.counters.reads);
		let ReadRequest { key, reply } = request;
		let outcome = self.policy.read(&mut self.state, &key).map(ReadResponse::new);
		self.finish("read", reply, outcome);
	}

	fn serve_update(&mut self, request: UpdateRequest<P::Key, P::Value>) {
		Counters::bump(&self.counters.updates);
		let UpdateRequest { key, value, reply } = request;
		let outcome = self.policy.update(&mut self.state, key, value);
		self.finish("update", reply, outcome);
	}

	fn serve_delete(&mut self, request: DeleteRequest<P::Key>) {
		Counters::bump(&self.counters.deletes);
		let DeleteRequest { path, reply } = request;
		let outcome = self.policy.delete(&mut self.state, &path);
		self.finish("delete", reply, outcome);
	}

	fn finish<T>(&self, op: &'static str, reply: Reply<T>, outcome: Outcome<T>) {
		if let Err(err) = &outcome {
			Counters::bump(&self.counters.failures);
			tracing::debug!(actor = %self.name, op, error = %err, "syncmap.request.failed");
		}
		if !reply.deliver(outcome) {
			tracing::trace!(actor = %self.name, op, "syncmap.reply.dropped");
		}
	}

	fn served(&self, draining: bool) {
		if draining {
			Counters::bump(&self.counters.drained);
		}
	}
}

/// Runs the actor until its handles are gone or a shutdown signal fires.
///
/// Requests are taken from whichever channel is ready; `select!` picks among
/// ready branches at random, so no ordering holds across channels. Once the
/// close signal fires the inbox refuses new requests and the loop keeps
/// serving until every queue is empty.
pub(crate) async fn run<P: OperationPolicy>(mut actor: Actor<P>, mut inbox: Inbox<P>, signals: Signals) -> ActorExit {
	actor.policy.on_start(&mut actor.state);
	tracing::debug!(actor = %actor.name, "syncmap.actor.start");

	let mut open = OpenChannels::default();
	let mut draining = false;
	let kind = loop {
		if signals.cancel.is_cancelled() {
			break ActorExitKind::Cancelled;
		}
		if !draining && signals.close.is_cancelled() {
			draining = true;
			inbox.close();
		}
		if !open.any() {
			break if draining { ActorExitKind::Stopped } else { ActorExitKind::Closed };
		}
		tokio::select! {
			_ = signals.cancel.cancelled() => break ActorExitKind::Cancelled,
			_ = signals.close.cancelled(), if !draining => continue,
			request = inbox.reads.recv(), if open.reads => match request {
				Some(request) => {
					actor.serve_read(request);
					actor.served(draining);
				}
				None => open.reads = false,
			},
			request = inbox.updates.recv(), if open.updates => match request {
				Some(request) => {
					actor.serve_update(request);
					actor.served(draining);
				}
				None => open.updates = false,
			},
			request = inbox.deletes.recv(), if open.deletes => match request {
				Some(request) => {
					actor.serve_delete(request);
					actor.served(draining);
				}
				None => open.deletes = false,
			},
		}
	};

	if kind == ActorExitKind::Cancelled {
		let rejected = inbox.discard_queued();
		actor.counters.rejected.fetch_add(rejected, Ordering::Relaxed);
	}
	actor.policy.on_stop(&mut actor.state);

	let stats = actor.counters.snapshot();
	tracing::debug!(
		actor = %actor.name,
		reason = ?kind,
		reads = stats.reads,
		updates = stats.updates,
		deletes = stats.deletes,
		failures = stats.failures,
		"syncmap.actor.exit"
	);
	ActorExit::new(kind)
}
