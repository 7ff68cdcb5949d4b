//! Single-writer associative container driven by message passing.
//!
//! A [`SyncMap`] hands every read, update and delete to one actor task that
//! owns the container state. Callers on any number of tasks or threads send
//! requests over three channels and wait for a one-shot reply, so access to
//! the state is linearized without a lock around it.
//!
//! How each request changes the state is decided by an [`OperationPolicy`]
//! injected at construction. [`DirectPolicy`] covers plain maps,
//! [`NestedPolicy`] adds composite-key deletes into maps of maps, and
//! [`JsonPolicy`] returns reads as JSON bytes.
//!
//! ```no_run
//! use syncmap::{DirectPolicy, SyncMap};
//!
//! # async fn demo() -> syncmap::Result<()> {
//! let map = SyncMap::spawn(DirectPolicy::<String, i64>::new());
//! map.update("4".to_string(), 40).await?;
//! let reply = map.read("4".to_string()).await?;
//! assert_eq!(reply.value(), Some(&40));
//! map.stop().await;
//! # Ok(())
//! # }
//! ```

mod actor;
pub mod config;
pub mod error;
pub mod lifecycle;
mod map;
pub mod path;
pub mod policy;
pub mod request;
mod spawn;
pub mod value;

pub use config::{ConfigError, ContainerConfig};
pub use error::{Error, PathError, PolicyError, Result};
pub use lifecycle::{ActorExit, ActorExitKind, ShutdownMode, ShutdownReport, Stats};
pub use map::{BlockingSyncMap, MapSpec, SyncMap};
pub use path::{KeyPath, Nested, delete_path};
pub use policy::{DirectPolicy, FnPolicy, JsonPolicy, NestedPolicy, OperationPolicy};
pub use request::{DeleteRequest, PendingReply, ReadRequest, ReadResponse, UpdateRequest};
pub use value::Value;
