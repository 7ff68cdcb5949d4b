use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

/// Current runtime, or a small shared one when the caller runs on plain threads.
fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(1)
			.thread_name("syncmap-actor")
			.build()
			.expect("failed to build syncmap global tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns an actor task on the active runtime.
pub(crate) fn spawn_actor<F>(name: &str, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(actor = name, "syncmap.spawn");
	runtime_handle().spawn(fut)
}
