//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'rosana-desk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let spinner = Output::spinner("Building knowledge base...");
    let orchestrator = match Orchestrator::bootstrap(settings).await {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Startup failed: {}", e));
            return Err(e.into());
        }
    };

    spinner.set_message("Searching knowledge base...");

    let result = orchestrator.engine().ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::source(&source.table, source.score);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    orchestrator.shutdown();
    Ok(())
}
