//! The build task body for catalog components.

use tracing::trace;

use crate::catalog::ComponentDef;
use crate::config::ConfigPath;
use crate::record::{AssignStyle, ConstructionRecord, FieldAssignment, Literal};
use crate::registry::{Handle, Identifier, IdentifierRegistry};
use crate::schedule::{BuildCtx, BuildError, Buildable, DependencyRequest, Step};
use crate::schema::{FieldSpec, FieldType};

/// One field of a planned component, in request order.
#[derive(Debug, Clone)]
pub(crate) enum PlannedField {
  Literal {
    spec: &'static FieldSpec,
    value: Literal,
  },
  Reference {
    spec: &'static FieldSpec,
    id: Identifier,
    nested: bool,
    path: ConfigPath,
  },
  /// The only object of `domain`, looked up when the field is reached.
  Sole {
    spec: &'static FieldSpec,
    domain: &'static str,
    path: ConfigPath,
  },
}

/// Builds one catalog component, awaiting each referenced object in turn.
#[derive(Debug)]
pub struct ComponentBuild {
  def: &'static ComponentDef,
  fields: Vec<PlannedField>,
  cursor: usize,
  awaiting: Option<(&'static FieldSpec, ConfigPath)>,
  assigned: Vec<(&'static FieldSpec, FieldAssignment)>,
}

impl ComponentBuild {
  pub(crate) fn new(def: &'static ComponentDef, fields: Vec<PlannedField>) -> Self {
    Self {
      def,
      fields,
      cursor: 0,
      awaiting: None,
      assigned: Vec::new(),
    }
  }

  pub fn def(&self) -> &'static ComponentDef {
    self.def
  }

  /// Accept the handle for the field we suspended on.
  fn assign(&mut self, handle: Option<Handle>) -> Result<(), BuildError> {
    let Some((spec, path)) = self.awaiting.take() else {
      return Ok(());
    };
    let Some(handle) = handle else {
      return Err(BuildError::config(
        &path,
        format!("resumed without a handle for '{}'", spec.key),
      ));
    };

    if let Some(expected) = expected_domain(spec) {
      if handle.kind.domain != expected {
        return Err(BuildError::config(
          &path,
          format!(
            "'{}' is a {} component, expected a {}",
            handle.id, handle.kind.domain, expected
          ),
        ));
      }
    }

    self
      .assigned
      .push((spec, FieldAssignment::reference(spec.field, handle.id, spec.style)));
    Ok(())
  }

  /// Constructor arguments first in schema order, everything else in request order.
  fn record(&mut self, id: Identifier) -> ConstructionRecord {
    let mut assigned = std::mem::take(&mut self.assigned);
    let def = self.def;
    assigned.sort_by_key(|(spec, _)| match spec.style {
      AssignStyle::Constructor => (0, def.fields.iter().position(|s| s.key == spec.key).unwrap_or(0)),
      AssignStyle::Setter | AssignStyle::Listener => (1, 0),
    });

    let mut record = ConstructionRecord::new(id, def.kind());
    record.fields = assigned.into_iter().map(|(_, field)| field).collect();
    record.registrations = def.registrations.iter().map(|r| r.to_string()).collect();
    record
  }
}

impl Buildable for ComponentBuild {
  fn step(&mut self, ctx: &BuildCtx<'_>, resumed: Option<Handle>) -> Result<Step, BuildError> {
    self.assign(resumed)?;

    while let Some(field) = self.fields.get(self.cursor) {
      self.cursor += 1;
      match field {
        PlannedField::Literal { spec, value } => {
          self
            .assigned
            .push((*spec, FieldAssignment::literal(spec.field, value.clone(), spec.style)));
        }
        PlannedField::Reference { spec, id, nested, path } => {
          self.awaiting = Some((*spec, path.clone()));
          let request = if *nested {
            DependencyRequest::nested(spec.field, id.clone())
          } else {
            DependencyRequest::new(spec.field, id.clone())
          };
          return Ok(Step::Await(request));
        }
        PlannedField::Sole { spec, domain, path } => {
          let candidates = ctx.registry().declared_in_domain(domain);
          let [only] = candidates.as_slice() else {
            let message = if candidates.is_empty() {
              format!("no {} is configured to use as '{}'", domain, spec.key)
            } else {
              format!(
                "{} {} components are configured; set '{}' to choose one",
                candidates.len(),
                domain,
                spec.key
              )
            };
            return Err(BuildError::config(path, message));
          };

          trace!(task = %ctx.id(), field = spec.field, sole = %only.id, "resolved default reference");
          self.awaiting = Some((*spec, path.clone()));
          return Ok(Step::Await(DependencyRequest::new(spec.field, only.id.clone())));
        }
      }
    }

    Ok(Step::Done(self.record(ctx.id().clone())))
  }

  fn static_dependencies(&self, registry: &IdentifierRegistry) -> Vec<Identifier> {
    self
      .fields
      .iter()
      .filter_map(|field| match field {
        PlannedField::Literal { .. } => None,
        PlannedField::Reference { id, .. } => Some(id.clone()),
        PlannedField::Sole { domain, .. } => match registry.declared_in_domain(domain).as_slice() {
          [only] => Some(only.id.clone()),
          _ => None,
        },
      })
      .collect()
  }
}

fn expected_domain(spec: &FieldSpec) -> Option<&'static str> {
  match spec.ty {
    FieldType::Use { domain } | FieldType::Nested { domain } => Some(domain),
    _ => None,
  }
}
