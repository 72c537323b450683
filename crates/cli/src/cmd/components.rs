//! Implementation of the `devgen components` command.

use anyhow::Result;
use serde_json::json;

use devgen_lib::catalog::Catalog;
use devgen_lib::schema::Presence;

use crate::output::{print_info, print_json, print_stat};

pub fn cmd_components(json: bool) -> Result<()> {
  let catalog = Catalog::builtin();

  if json {
    let components: Vec<_> = catalog
      .iter()
      .map(|def| {
        let fields: Vec<_> = def
          .fields
          .iter()
          .map(|spec| {
            json!({
              "key": spec.key,
              "type": spec.ty.describe(),
              "required": spec.presence == Presence::Required,
            })
          })
          .collect();
        json!({
          "name": def.qualified_name(),
          "class": def.class,
          "description": def.description,
          "fields": fields,
          "requires": def.requires,
          "auto_load": def.auto_load,
        })
      })
      .collect();
    return print_json(&components);
  }

  for def in catalog.iter() {
    print_info(&format!("{} ({})", def.qualified_name(), def.class));
    print_stat("About", def.description);
    let keys: Vec<String> = def
      .fields
      .iter()
      .map(|spec| match spec.presence {
        Presence::Required => format!("{}*", spec.key),
        _ => spec.key.to_string(),
      })
      .collect();
    print_stat("Keys", &keys.join(", "));
    if !def.requires.is_empty() {
      print_stat("Requires", &def.requires.join(", "));
    }
  }
  Ok(())
}
