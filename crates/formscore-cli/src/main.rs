//! formscore CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "formscore", version, about = "Form scoring and access-resolution engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example form definition
    Init,

    /// Validate form definition TOML files
    Validate {
        /// Path to a form definition file or directory
        #[arg(long)]
        form: PathBuf,
    },

    /// Create a form from a definition file
    Create {
        /// Path to the form definition TOML
        #[arg(long)]
        form: PathBuf,

        /// Act as this email (defaults to operator_email from config)
        #[arg(long = "as")]
        as_email: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List forms
    List {
        /// Act as this email
        #[arg(long = "as")]
        as_email: Option<String>,

        /// Act with administrator standing
        #[arg(long)]
        admin: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete a form and its responses
    Delete {
        /// Form id
        #[arg(long)]
        id: String,

        /// Act as this email
        #[arg(long = "as")]
        as_email: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Submit a response to a form
    Submit {
        /// Form id
        #[arg(long)]
        id: String,

        /// Path to a JSON file of answers keyed by field id
        #[arg(long)]
        answers: PathBuf,

        /// Act as this email
        #[arg(long = "as")]
        as_email: Option<String>,

        /// Act with administrator standing
        #[arg(long)]
        admin: bool,

        /// Present an access token for a private form
        #[arg(long)]
        token: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List responses for a form
    Responses {
        /// Form id
        #[arg(long)]
        id: String,

        /// Act as this email
        #[arg(long = "as")]
        as_email: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Rotate and print the access link for a private form
    Link {
        /// Form id
        #[arg(long)]
        id: String,

        /// Act as this email
        #[arg(long = "as")]
        as_email: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score an answers file against a form definition, offline
    Score {
        /// Path to the form definition TOML
        #[arg(long)]
        form: PathBuf,

        /// Path to a JSON file of answers keyed by field id
        #[arg(long)]
        answers: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("formscore=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { form } => commands::validate::execute(form),
        Commands::Create {
            form,
            as_email,
            config,
        } => commands::create::execute(form, as_email, config).await,
        Commands::List {
            as_email,
            admin,
            config,
        } => commands::list::execute(as_email, admin, config).await,
        Commands::Delete {
            id,
            as_email,
            config,
        } => commands::delete::execute(id, as_email, config).await,
        Commands::Submit {
            id,
            answers,
            as_email,
            admin,
            token,
            config,
        } => commands::submit::execute(id, answers, as_email, admin, token, config).await,
        Commands::Responses {
            id,
            as_email,
            config,
        } => commands::responses::execute(id, as_email, config).await,
        Commands::Link {
            id,
            as_email,
            config,
        } => commands::link::execute(id, as_email, config).await,
        Commands::Score { form, answers } => commands::score::execute(form, answers),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
