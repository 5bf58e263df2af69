//! The `formscore delete` command.

use std::path::PathBuf;

use anyhow::Result;

use formscore_core::access::resolve;

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

    // Mutations are rejected here, before the engine is reached.
    let caps = resolve(principal.as_ref(), None, &form);
    if !caps.can_edit {
        anyhow::bail!("permission denied: only the owner or a collaborator may delete this form");
    }

    engine.delete_form(&form_id).await?;
    println!("Deleted form {form_id} and its responses.");

    Ok(())
}
