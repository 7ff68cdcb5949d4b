use pretty_assertions::assert_eq;
use syncmap::{KeyPath, Value};

use crate::common::{keys, number_map, tree_map, update_all};

async fn current_values(map: &crate::common::NumberMap) -> Vec<Option<i64>> {
	let mut values = Vec::new();
	for (key, _) in keys() {
		values.push(map.read(key).await.unwrap().into_value());
	}
	values
}

/// Inserts, overwrites, deletes and lookups run in order against one container.
#[tokio::test(flavor = "multi_thread")]
async fn insert_overwrite_delete_lookup_sequence() {
	let map = number_map("scenarios");

	// Concurrent inserts of key * 10.
	update_all(&map, keys().map(|(key, n)| (key, n * 10))).await;
	let expected: Vec<_> = (1..=10).map(|n| Some(n * 10)).collect();
	assert_eq!(current_values(&map).await, expected);

	// Overwrite every key with value * 10 - 1.
	update_all(&map, keys().map(|(key, n)| (key, n * 10 - 1))).await;
	assert_eq!(
		current_values(&map).await,
		vec![Some(9), Some(19), Some(29), Some(39), Some(49), Some(59), Some(69), Some(79), Some(89), Some(99)]
	);

	// Delete the odd keys concurrently.
	let mut deletes = tokio::task::JoinSet::new();
	for (key, _) in keys().filter(|(_, n)| n % 2 == 1) {
		let map = map.clone();
		deletes.spawn(async move { map.delete_key(key).await });
	}
	while let Some(removed) = deletes.join_next().await {
		assert!(removed.unwrap().unwrap());
	}
	assert_eq!(
		current_values(&map).await,
		vec![None, Some(19), None, Some(39), None, Some(59), None, Some(79), None, Some(99)]
	);

	// A second delete of the same key finds nothing and leaves the state alone.
	assert!(!map.delete_key("1".to_string()).await.unwrap());
	assert_eq!(map.read("2".to_string()).await.unwrap().into_value(), Some(19));

	// Absent and present lookups.
	let missing = map.read("11".to_string()).await.unwrap();
	assert!(!missing.found());
	assert_eq!(missing.value(), None);

	let present = map.read("4".to_string()).await.unwrap();
	assert!(present.found());
	assert_eq!(present.value(), Some(&39));

	map.stop().await;
}

#[tokio::test]
async fn nested_delete_empties_sub_container() {
	let map = tree_map("scenario-e");
	map.update("A".to_string(), Value::map([("AA", Value::from("AAA"))]))
		.await
		.unwrap();
	map.update("B".to_string(), Value::map([("AA", Value::from("BAA"))]))
		.await
		.unwrap();

	let path = KeyPath::new(vec!["A".to_string(), "AA".to_string()]).unwrap();
	assert!(map.delete(path.clone()).await.unwrap());
	assert!(!map.delete(path).await.unwrap());

	let a = map.read("A".to_string()).await.unwrap().into_value().unwrap();
	assert_eq!(a, Value::empty_map());
	assert!(!a.as_map().unwrap().contains_key("AA"));

	// Sibling sub-containers are untouched.
	let b = map.read("B".to_string()).await.unwrap().into_value().unwrap();
	assert_eq!(b.as_map().and_then(|m| m.get("AA")).and_then(Value::as_text), Some("BAA"));
}

#[tokio::test]
async fn nested_delete_through_missing_parent_is_a_no_op() {
	let map = tree_map("missing-parent");
	map.update("A".to_string(), Value::empty_map()).await.unwrap();

	let path = KeyPath::single("Z".to_string()).child("ZZ".to_string());
	assert!(!map.delete(path).await.unwrap());
	assert_eq!(map.read("A".to_string()).await.unwrap().into_value(), Some(Value::empty_map()));
}

#[tokio::test]
async fn three_level_paths_descend() {
	let map = tree_map("deep");
	let inner = Value::map([("c", Value::from(1)), ("d", Value::from(2))]);
	map.update("a".to_string(), Value::map([("b", inner)])).await.unwrap();

	let path = KeyPath::single("a".to_string()).child("b".to_string()).child("c".to_string());
	assert!(map.delete(path).await.unwrap());

	let a = map.read("a".to_string()).await.unwrap().into_value().unwrap();
	assert_eq!(a, Value::map([("b", Value::map([("d", Value::from(2))]))]));
}
