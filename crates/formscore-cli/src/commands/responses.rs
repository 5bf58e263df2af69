//! The `formscore responses` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use formscore_core::access::resolve;
use formscore_core::validate::normalize_email;

use super::{build_engine, preload, principal_from};

pub async fn execute(
    form_id: String,
    as_email: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, mut engine) = build_engine(config_path.as_deref())?;
    preload(&mut engine).await?;

    let principal = principal_from(as_email, false, &config);
    let form = engine.get_form(&form_id).await?;
    let caps = resolve(principal.as_ref(), None, &form);

    let mut responses = engine.list_responses(&form_id).await?;

    // Editors see everything; a respondent sees their own submissions
    // when the form allows it.
    if !caps.can_edit {
        let Some(principal) = &principal else {
            anyhow::bail!("permission denied: identify yourself to view responses");
        };
        if !form.allow_view_own_responses {
            anyhow::bail!("permission denied: this form does not allow viewing own responses");
        }
        let me = normalize_email(&principal.email);
        responses.retain(|r| r.respondent.as_deref() == Some(me.as_str()));
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Respondent", "Score", "Feedback", "Submitted"]);
    for r in &responses {
        table.add_row(vec![
            Cell::new(&r.id),
            Cell::new(r.respondent.as_deref().unwrap_or("anonymous")),
            Cell::new(
                r.total_score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(r.feedback.as_deref().unwrap_or("-")),
            Cell::new(r.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    println!("{table}");
    println!("{} response(s).", responses.len());

    Ok(())
}
