use std::collections::HashMap;

use pretty_assertions::assert_eq;
use serde::Deserialize;
use syncmap::{ContainerConfig, DirectPolicy, Error, JsonPolicy, KeyPath, NestedPolicy, SyncMap, Value};

#[derive(Debug, PartialEq, Deserialize)]
struct Session {
	user: String,
	hits: i64,
}

#[tokio::test]
async fn reads_arrive_as_json() {
	let _ = tracing_subscriber::fmt::try_init();
	let config = ContainerConfig::from_toml_str("name = \"sessions\"\ncapacity = 4\n").unwrap();
	let map = SyncMap::spawn_with(config, JsonPolicy::new(NestedPolicy::<String, Value>::new()));
	assert_eq!(map.name(), "sessions");
	assert_eq!(map.config().capacity, 4);

	let session = Value::map([("user", Value::from("ada")), ("hits", Value::from(3))]);
	map.update("s1".to_string(), session).await.unwrap();

	let reply = map.read("s1".to_string()).await.unwrap();
	assert_eq!(
		reply.decode::<Session>().unwrap(),
		Some(Session {
			user: "ada".to_string(),
			hits: 3,
		})
	);
	assert!(matches!(reply.decode::<Vec<u8>>(), Err(Error::Decode(_))));

	let missing = map.read("s2".to_string()).await.unwrap();
	assert_eq!(missing.decode::<Session>().unwrap(), None);

	// Deletes pass through to the wrapped policy.
	let path = KeyPath::single("s1".to_string()).child("hits".to_string());
	assert!(map.delete(path).await.unwrap());
	let reply = map.read("s1".to_string()).await.unwrap();
	assert_eq!(
		reply.decode::<HashMap<String, String>>().unwrap(),
		Some(HashMap::from([("user".to_string(), "ada".to_string())]))
	);
}

#[tokio::test]
async fn scalar_values_encode_directly() {
	let map = SyncMap::spawn(JsonPolicy::new(DirectPolicy::<u32, f64>::new()));
	map.update(7, 2.5).await.unwrap();

	let reply = map.read(7).await.unwrap();
	assert_eq!(reply.value().map(Vec::as_slice), Some(&b"2.5"[..]));
	assert_eq!(reply.decode::<f64>().unwrap(), Some(2.5));
}
