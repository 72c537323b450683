//! Configuration schema and validation.
//!
//! Validation is the boundary between raw configuration and planning: a
//! [`Validator`] takes one component mapping plus the catalog entry it was
//! matched to, and returns either a [`ValidatedNode`] or every problem it
//! found in that mapping. The planner never looks at raw values again.
//!
//! # Field types
//!
//! | Type        | Accepts                                   | Produces                    |
//! |-------------|-------------------------------------------|-----------------------------|
//! | `Bool`      | `true` / `false`                          | `Literal::Bool`             |
//! | `Int`       | integer within `min..=max`                | `Literal::Int`              |
//! | `Str`       | string                                    | `Literal::String`           |
//! | `Pin`       | `GPIO14` or `14`                          | `Literal::Int`              |
//! | `Duration`  | `10ms`, `50us`, `60s`, `1min` or integer  | `Literal::Int` in the unit  |
//! | `Use`       | identifier of a component of a domain     | `ValidatedValue::Reference` |
//! | `Nested`    | inline component mapping                  | `ValidatedValue::Nested`    |

mod types;
mod validate;

pub use types::*;
pub use validate::*;
