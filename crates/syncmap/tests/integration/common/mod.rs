//! Shared fixtures for container integration tests.

use syncmap::{DirectPolicy, MapSpec, NestedPolicy, SyncMap, Value};

pub type NumberMap = SyncMap<DirectPolicy<String, i64>>;
pub type TreeMap = SyncMap<NestedPolicy<String, Value>>;

/// Keys `"1"` through `"10"`.
pub fn keys() -> impl Iterator<Item = (String, i64)> {
	(1..=10).map(|n| (n.to_string(), n))
}

/// Spawns a string-to-integer container with tracing enabled.
pub fn number_map(name: &str) -> NumberMap {
	let _ = tracing_subscriber::fmt::try_init();
	MapSpec::new(DirectPolicy::new()).name(name).spawn()
}

/// Spawns a map-of-maps container with tracing enabled.
pub fn tree_map(name: &str) -> TreeMap {
	let _ = tracing_subscriber::fmt::try_init();
	MapSpec::new(NestedPolicy::new()).name(name).spawn()
}

/// Runs `update(key, value)` for every pair on its own task and waits for all of them.
pub async fn update_all(map: &NumberMap, pairs: impl IntoIterator<Item = (String, i64)>) {
	let mut tasks = tokio::task::JoinSet::new();
	for (key, value) in pairs {
		let map = map.clone();
		tasks.spawn(async move { map.update(key, value).await });
	}
	while let Some(joined) = tasks.join_next().await {
		joined.expect("update task panicked").expect("update failed");
	}
}
