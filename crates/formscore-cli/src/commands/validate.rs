//! The `formscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(form_path: PathBuf) -> Result<()> {
    let drafts = if form_path.is_dir() {
        formscore_core::parser::load_form_directory(&form_path)?
    } else {
        vec![formscore_core::parser::parse_form_file(&form_path)?]
    };

    let mut total_warnings = 0;

    for draft in &drafts {
        println!("Form: {} ({} fields)", draft.title, draft.fields.len());

        let warnings = formscore_core::parser::validate_form(draft);
        for w in &warnings {
            let prefix = w
                .field_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All form definitions valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
