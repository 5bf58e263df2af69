//! The `formscore submit` command.

use std::path::PathBuf;

use anyhow::Result;

use formscore_core::access::resolve;

use super::{build_engine, preload, principal_from, read_answers};

pub async fn execute(
    form_id: String,
    answers_path: PathBuf,
    as_email: Option<String>,
    admin: bool,
    token: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, mut engine) = build_engine(config_path.as_deref())?;
    preload(&mut engine).await?;

    let principal = principal_from(as_email, admin, &config);
    let form = engine.get_form(&form_id).await?;

    let caps = resolve(principal.as_ref(), token.as_deref(), &form);
    if !caps.can_respond {
        anyhow::bail!("permission denied: you may not respond to this form");
    }

    let answers = read_answers(&answers_path)?;
    let respondent = principal.as_ref().map(|p| p.email.as_str());

    let receipt = engine.submit_response(&form_id, respondent, answers).await?;

    if !receipt.synced {
        eprintln!("Warning: remote store unavailable; response kept locally.");
    }
    println!("Submitted response {}", receipt.response.id);
    if let Some(score) = receipt.response.total_score {
        println!("Total score: {score}");
    }
    if let Some(feedback) = &receipt.response.feedback {
        println!("Feedback: {feedback}");
    }

    Ok(())
}
