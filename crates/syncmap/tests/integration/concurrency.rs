use std::collections::HashMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use syncmap::{DirectPolicy, FnPolicy, KeyPath, MapSpec, SyncMap};

type Counters = SyncMap<FnPolicy<HashMap<u32, u64>, u32, u64, u64>>;

/// Updates add to the stored count instead of replacing it.
fn counters() -> Counters {
	let _ = tracing_subscriber::fmt::try_init();
	let policy = FnPolicy::new(
		|state: &mut HashMap<u32, u64>, key: &u32| Ok(state.get(key).copied()),
		|state: &mut HashMap<u32, u64>, key: u32, delta: u64| {
			*state.entry(key).or_default() += delta;
			Ok(())
		},
		|state: &mut HashMap<u32, u64>, path: &KeyPath<u32>| Ok(state.remove(path.head()).is_some()),
	);
	MapSpec::new(policy).name("counters").capacity(8).spawn()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn read_modify_write_updates_are_never_lost() {
	let map = counters();

	let mut tasks = tokio::task::JoinSet::new();
	for _ in 0..64 {
		let map = map.clone();
		tasks.spawn(async move {
			for _ in 0..25 {
				map.update(0, 1).await.unwrap();
			}
		});
	}
	while let Some(joined) = tasks.join_next().await {
		joined.unwrap();
	}

	assert_eq!(map.read(0).await.unwrap().into_value(), Some(64 * 25));
	assert_eq!(map.stats().updates, 64 * 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_keys_see_their_own_writes() {
	let map = counters();

	let mut tasks = tokio::task::JoinSet::new();
	for key in 0..32u32 {
		let map = map.clone();
		tasks.spawn(async move {
			for round in 1..=10u64 {
				map.update(key, round).await.unwrap();
			}
			map.read(key).await.unwrap().into_value()
		});
	}
	while let Some(joined) = tasks.join_next().await {
		assert_eq!(joined.unwrap(), Some(55));
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_traffic_from_many_handles() {
	let map = MapSpec::new(DirectPolicy::<u32, u32>::new()).capacity(2).spawn();

	let mut tasks = tokio::task::JoinSet::new();
	for worker in 0..16u32 {
		let map = map.clone();
		tasks.spawn(async move {
			let key = worker * 100;
			map.update(key, worker).await.unwrap();
			assert_eq!(map.read(key).await.unwrap().into_value(), Some(worker));
			assert!(map.delete_key(key).await.unwrap());
			assert!(!map.read(key).await.unwrap().found());
		});
	}
	while let Some(joined) = tasks.join_next().await {
		joined.unwrap();
	}

	let stats = map.stats();
	assert_eq!((stats.reads, stats.updates, stats.deletes), (32, 16, 16));
	assert_eq!(stats.failures, 0);
}

#[derive(Debug, Clone)]
enum Op {
	Update(u8, i32),
	Delete(u8),
	Read(u8),
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(0u8..8, any::<i32>()).prop_map(|(k, v)| Op::Update(k, v)),
		(0u8..8).prop_map(Op::Delete),
		(0u8..8).prop_map(Op::Read),
	]
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	/// Sequential requests from one caller behave like a plain `HashMap`.
	#[test]
	fn sequential_requests_match_a_hash_map(ops in prop::collection::vec(op(), 1..48)) {
		let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
		runtime.block_on(async {
			let map = SyncMap::spawn(DirectPolicy::<u8, i32>::new());
			let mut model = HashMap::new();

			for op in ops {
				match op {
					Op::Update(key, value) => {
						map.update(key, value).await.unwrap();
						model.insert(key, value);
					}
					Op::Delete(key) => {
						let removed = map.delete_key(key).await.unwrap();
						assert_eq!(removed, model.remove(&key).is_some());
					}
					Op::Read(key) => {
						let reply = map.read(key).await.unwrap();
						assert_eq!(reply.into_value(), model.get(&key).copied());
					}
				}
			}

			for key in 0u8..8 {
				assert_eq!(map.read(key).await.unwrap().into_value(), model.get(&key).copied());
			}
			map.stop().await;
		});
	}
}
