use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tutor_cli::{
    api_client::{API_URL, HttpTutorApi},
    repl,
};
use uuid::Uuid;

/// Interactive teaching assistant. Ask a question, or type a suggestion's
/// number to follow up on it. Type 'exit' to quit.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _args = Args::parse();

    // Logs go to stderr so they never interleave with the rendered panels.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let session_id = Uuid::new_v4().to_string();
    let api = HttpTutorApi::new(API_URL, session_id).context("Failed to build HTTP client")?;
    tracing::debug!(session_id = %api.session_id(), url = API_URL, "Starting tutor client");

    repl::run(api).await
}
