//! Closed value type for heterogeneous and nested containers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::path::Nested;

/// Tagged value stored in heterogeneous containers.
///
/// [`Value::Map`] makes the container a map of maps; composite-key deletes
/// descend through it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
	Map(HashMap<String, Value>),
}

impl Value {
	/// Builds a [`Value::Map`] from key/value pairs.
	pub fn map<K, I>(entries: I) -> Self
	where
		K: Into<String>,
		I: IntoIterator<Item = (K, Value)>,
	{
		Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}

	/// Empty sub-container.
	pub fn empty_map() -> Self {
		Self::Map(HashMap::new())
	}

	/// Name of the variant, used in type mismatch reports.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::Text(_) => "text",
			Self::Map(_) => "map",
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
		match self {
			Self::Map(v) => Some(v),
			_ => None,
		}
	}
}

impl Nested<String> for Value {
	fn children_mut(&mut self) -> Option<&mut HashMap<String, Value>> {
		match self {
			Self::Map(children) => Some(children),
			_ => None,
		}
	}
}

macro_rules! value_conversions {
	($($ty:ty => $variant:ident, $name:literal;)*) => {
		$(
			impl From<$ty> for Value {
				fn from(v: $ty) -> Self {
					Self::$variant(v.into())
				}
			}

			impl TryFrom<Value> for $ty {
				type Error = Error;

				fn try_from(value: Value) -> Result<Self, Self::Error> {
					match value {
						Value::$variant(v) => Ok(v),
						other => Err(Error::TypeMismatch { expected: $name, found: other.kind() }),
					}
				}
			}
		)*
	};
}

value_conversions! {
	bool => Bool, "bool";
	i64 => Int, "int";
	f64 => Float, "float";
	String => Text, "text";
	HashMap<String, Value> => Map, "map";
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Self::Int(v.into())
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Self::Text(v.to_string())
	}
}
