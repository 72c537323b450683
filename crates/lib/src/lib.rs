//! devgen-lib: cooperative code generation for device configurations.
//!
//! A configuration tree is turned into an ordered stream of construction
//! records:
//! - `config`: YAML loading into an order-preserving tree
//! - `catalog` and `schema`: the known components and their validation
//! - `plan`: build tasks and identifiers for every configuration node
//! - `schedule`: runs tasks, suspending each one until its dependencies are built
//! - `emit`: sinks for finished records (memory, JSON lines, C++)
//!
//! [`compile()`] wires these together for the common case.

pub mod catalog;
pub mod compile;
pub mod config;
pub mod consts;
pub mod emit;
pub mod plan;
pub mod record;
pub mod registry;
pub mod schedule;
pub mod schema;
pub mod util;

pub use compile::{EmitFormat, compile, compile_to, plan_config};
