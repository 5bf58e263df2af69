//! The `formscore create` command.

use std::path::PathBuf;

use anyhow::Result;

use formscore_core::error::EngineError;
use formscore_core::parser;

use super::{build_engine, principal_from};

pub async fn execute(
    form_path: PathBuf,
    as_email: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, mut engine) = build_engine(config_path.as_deref())?;

    let Some(owner) = principal_from(as_email, false, &config) else {
        anyhow::bail!("creating a form requires an identity; pass --as or set operator_email");
    };

    let draft = parser::parse_form_file(&form_path)?;

    for w in parser::validate_form(&draft) {
        eprintln!("Warning: {}", w.message);
    }

    let form = match engine.create_form(&owner.email, draft).await {
        Ok(form) => form,
        Err(EngineError::RemoteUnavailable { source }) => {
            // The record is retained locally; report, don't discard.
            eprintln!("Warning: remote store unavailable ({source}); form kept locally.");
            let forms = engine.list_forms();
            forms
                .last()
                .map(|f| (*f).clone())
                .ok_or_else(|| anyhow::anyhow!("form was not retained"))?
        }
        Err(e) => return Err(e.into()),
    };

    println!("Created form: {}", form.id);
    println!("Title:        {}", form.title);
    if form.is_private {
        println!("Access link:  formscore://respond/{}?token={}", form.id, form.access_token);
    }

    Ok(())
}
