use agent_explorer_rs::adk::agent::Agent;
use agent_explorer_rs::adk::model::gemini::GeminiModel;
use agent_explorer_rs::adk::model::Model;
use agent_explorer_rs::explorer::config::{ExplorerConfig, RetryMode};
use agent_explorer_rs::explorer::pipelines::{Pipelines, UseCase};
use agent_explorer_rs::explorer::server;
use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simple prompt directly
    Run {
        /// The prompt to send
        #[arg(short, long)]
        prompt: String,

        /// The model to use
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Run one of the use cases
    Pipeline {
        /// single-agent, multi-agent or cyclic-graph
        #[arg(short, long)]
        use_case: String,

        /// Input to the use case
        #[arg(short, long)]
        input: String,
    },
    /// Check a subject text (e.g. a resume) against criteria
    Review {
        /// File holding the subject text
        #[arg(short, long)]
        subject_file: PathBuf,

        /// File holding the criteria; defaults to the configured job description
        #[arg(long)]
        criteria_file: Option<PathBuf>,

        #[arg(long)]
        max_attempts: Option<u32>,

        #[arg(long, value_enum)]
        retry_mode: Option<RetryMode>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn build_model(config: &ExplorerConfig) -> anyhow::Result<Arc<dyn Model>> {
    log::info!("Using provider: Gemini with model: {}", config.model.name);
    let model = GeminiModel::new(config.model.name.clone())
        .context("failed to initialise the Gemini client")?;
    Ok(Arc::new(model))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let mut config = ExplorerConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Run { prompt, model } => {
            if let Some(model) = model {
                config.model.name = model;
            }
            let pipelines = Pipelines::new(build_model(&config)?, Arc::new(config));

            println!("Sending prompt: {}", prompt);
            let response = pipelines.single_agent().run(prompt).await?;
            println!("Response: {}", response);
        }
        Commands::Pipeline { use_case, input } => {
            let use_case: UseCase = use_case.parse()?;
            let pipelines = Pipelines::new(build_model(&config)?, Arc::new(config));

            println!("Running use case: {}", use_case.title());
            let outputs = pipelines.run(use_case, input).await?;
            println!("{}", serde_json::to_string_pretty(&outputs)?);
        }
        Commands::Review {
            subject_file,
            criteria_file,
            max_attempts,
            retry_mode,
        } => {
            let subject = std::fs::read_to_string(&subject_file)
                .with_context(|| format!("cannot read {}", subject_file.display()))?;
            let criteria = match criteria_file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?,
                None => config.review.criteria.clone(),
            };
            if let Some(max_attempts) = max_attempts {
                config.review.retry.max_attempts = max_attempts;
            }
            if let Some(mode) = retry_mode {
                config.review.mode = mode;
            }

            let pipelines = Pipelines::new(build_model(&config)?, Arc::new(config));
            let verdict = pipelines.evaluator().evaluate(&criteria, &subject).await?;

            if verdict.approved {
                println!("Resume PASSES the requirements.");
            } else {
                println!("Resume DOES NOT meet the requirements.");
            }
            println!("Reason: {}", verdict.reason);
            println!("Attempts: {}", verdict.attempts);
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let pipelines = Pipelines::new(build_model(&config)?, Arc::new(config));
            server::serve(Arc::new(pipelines), port).await?;
        }
    }

    Ok(())
}
