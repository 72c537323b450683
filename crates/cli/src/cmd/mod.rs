mod compile;
mod components;
mod graph;
mod plan;

use serde_json::{Value, json};

use devgen_lib::schedule::BuildError;

pub use compile::{CompileArgs, cmd_compile};
pub use components::cmd_components;
pub use graph::cmd_graph;
pub use plan::cmd_plan;

/// JSON form of a build error shared by every command.
fn error_json(error: &BuildError) -> Value {
  json!({
    "kind": error.kind(),
    "message": error.to_string(),
    "identifiers": error.identifiers().iter().map(|id| id.as_str()).collect::<Vec<_>>(),
  })
}
