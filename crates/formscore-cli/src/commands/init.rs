//! The `formscore init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create formscore.toml
    if std::path::Path::new("formscore.toml").exists() {
        println!("formscore.toml already exists, skipping.");
    } else {
        std::fs::write("formscore.toml", SAMPLE_CONFIG)?;
        println!("Created formscore.toml");
    }

    // Create example form definition
    std::fs::create_dir_all("forms")?;
    let example_path = std::path::Path::new("forms/example.toml");
    if example_path.exists() {
        println!("forms/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_FORM)?;
        println!("Created forms/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit formscore.toml with your store credentials");
    println!("  2. Run: formscore validate --form forms/example.toml");
    println!("  3. Run: formscore create --form forms/example.toml --as you@example.com");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# formscore configuration

cache_dir = "./.formscore-cache"
cache_quota_bytes = 4194304
response_cache_cap = 50
operator_email = "you@example.com"

# Remote store backend. Use type = "memory" for local experiments.
[store]
type = "http"
base_url = "https://rows.example.com"
api_key = "${FORMSCORE_API_KEY}"
"#;

const EXAMPLE_FORM: &str = r#"[form]
title = "Team health check"
description = "A short scored survey"
is_private = false
show_total_score = true

[[form.score_ranges]]
min = 0
max = 5
message = "Let's talk. Book a 1:1 with your lead."

[[form.score_ranges]]
min = 6
max = 12
message = "Doing fine, keep an eye on the trend."

[[form.score_ranges]]
min = 13
max = 100
message = "Great shape!"

[[fields]]
id = "mood"
type = "opinion-scale"
label = "How was your week, 1-10?"
required = true
has_numeric_values = true

[[fields]]
id = "support"
type = "yes-no"
label = "Do you feel supported by the team?"
has_numeric_values = true

[[fields.options]]
label = "Yes"
value = "yes"
numeric_value = 3

[[fields.options]]
label = "No"
value = "no"
numeric_value = 0

[[fields]]
id = "notes"
type = "long-text"
label = "Anything else?"
"#;
