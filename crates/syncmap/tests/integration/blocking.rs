use std::thread;

use pretty_assertions::assert_eq;
use syncmap::{DirectPolicy, Error, MapSpec, ShutdownMode, SyncMap};

#[test]
fn plain_threads_use_the_shared_runtime() {
	let _ = tracing_subscriber::fmt::try_init();
	// No runtime is active here, so the actor lands on the background one.
	let map = MapSpec::new(DirectPolicy::<String, i64>::new()).name("threads").spawn();
	let blocking = map.blocking();

	let workers: Vec<_> = (1..=10i64)
		.map(|n| {
			let blocking = blocking.clone();
			thread::spawn(move || blocking.update(n.to_string(), n * 10))
		})
		.collect();
	for worker in workers {
		worker.join().unwrap().unwrap();
	}

	for n in 1..=10i64 {
		assert_eq!(blocking.read(n.to_string()).unwrap().into_value(), Some(n * 10));
	}
	assert!(blocking.delete_key("3".to_string()).unwrap());
	assert!(!blocking.delete_key("3".to_string()).unwrap());
	assert!(!blocking.read("3".to_string()).unwrap().found());
	assert_eq!(blocking.as_async().stats().updates, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_and_async_handles_share_state() {
	let map = SyncMap::spawn(DirectPolicy::<u32, u32>::new());
	map.update(1, 10).await.unwrap();

	let blocking = map.blocking();
	let seen = tokio::task::spawn_blocking(move || {
		let seen = blocking.read(1).unwrap().into_value();
		blocking.update(2, 20).unwrap();
		seen
	})
	.await
	.unwrap();

	assert_eq!(seen, Some(10));
	assert_eq!(map.read(2).await.unwrap().into_value(), Some(20));

	map.shutdown(ShutdownMode::Immediate).await;
	let blocking = map.blocking();
	let after = tokio::task::spawn_blocking(move || blocking.update(3, 30)).await.unwrap();
	assert!(matches!(after, Err(Error::Closed)));
}
