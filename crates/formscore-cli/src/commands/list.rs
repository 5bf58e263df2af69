//! The `formscore list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use formscore_core::access::resolve;

use super::{build_engine, preload, principal_from};

pub async fn execute(
    as_email: Option<String>,
    admin: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, mut engine) = build_engine(config_path.as_deref())?;
    preload(&mut engine).await?;

    let principal = principal_from(as_email, admin, &config);

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Private", "Scoring", "Fields", "Access"]);

    let mut visible = 0usize;
    for form in engine.list_forms() {
        let caps = resolve(principal.as_ref(), None, form);
        if !caps.can_view {
            continue;
        }
        visible += 1;
        let access = if caps.can_edit {
            "edit"
        } else if caps.can_respond {
            "respond"
        } else {
            "view"
        };
        table.add_row(vec![
            Cell::new(&form.id),
            Cell::new(&form.title),
            Cell::new(if form.is_private { "yes" } else { "no" }),
            Cell::new(if form.show_total_score { "on" } else { "off" }),
            Cell::new(form.fields.len()),
            Cell::new(access),
        ]);
    }

    println!("{table}");
    println!("{visible} form(s) visible.");

    Ok(())
}
