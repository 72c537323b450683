//! Declarative device configuration.
//!
//! A configuration file is a YAML mapping from component domain to either a
//! single component mapping or a list of them:
//!
//! ```yaml
//! remote_transmitter:
//!   id: ir_tx
//!   pin: GPIO4
//! climate:
//!   - platform: mitsubishi_sez
//!     id: living_room
//!     name: Living Room
//!     receiver:
//!       pin: GPIO14
//! ```
//!
//! The loader keeps key order exactly as written: sibling order in the file
//! becomes request order during planning, and therefore emission order.
//!
//! # Submodules
//!
//! - [`value`] - the order-preserving value tree and configuration paths
//! - [`load`] - reading and converting YAML documents

mod load;
mod value;

pub use load::*;
pub use value::*;
