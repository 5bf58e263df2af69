//! The `formscore link` command.

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

    let caps = resolve(principal.as_ref(), None, &form);
    if !caps.can_edit {
        anyhow::bail!("permission denied: only the owner or a collaborator may manage links");
    }

    let token = engine.generate_access_link(&form_id).await?;
    println!("Access link: formscore://respond/{form_id}?token={token}");
    println!("Previous links for this form are no longer valid.");

    Ok(())
}
