//! Doctor command - verify configuration and database connectivity.

use crate::cli::Output;
use crate::config::Settings;
use crate::database::Database;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Rosana Desk Doctor");
    println!();
    println!("Checking configuration and connectivity...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let api_check = check_api_key(settings);
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Database").bold());
    let db_checks = check_database(settings).await;
    for check in &db_checks {
        check.print();
    }
    checks.extend(db_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before starting the service.",
            errors
        ));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Rosana Desk is ready to serve.");
    }

    Ok(())
}

fn check_api_key(settings: &Settings) -> CheckResult {
    match settings.openai.require_api_key() {
        Ok(_) => CheckResult::ok("OpenAI API key", "configured"),
        Err(e) => CheckResult::error(
            "OpenAI API key",
            &e.to_string(),
            "export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check the database parameters, connectivity and the configured tables.
async fn check_database(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let params = match settings.database.validate() {
        Ok(params) => {
            results.push(CheckResult::ok(
                "Connection parameters",
                &format!("{}@{}:{}/{}", params.user, params.host, params.port, params.name),
            ));
            params
        }
        Err(e) => {
            results.push(CheckResult::error(
                "Connection parameters",
                &e.to_string(),
                "Set DB_HOST, DB_NAME, DB_USER, DB_PASS and DB_PORT",
            ));
            return results;
        }
    };

    let mut database = match Database::new(&params) {
        Ok(database) => database,
        Err(e) => {
            results.push(CheckResult::error(
                "Connection parameters",
                &e.to_string(),
                "Use one of: disable, prefer, require, verify-ca, verify-full",
            ));
            return results;
        }
    };

    let tables = match database.session().await {
        Ok(mut session) => {
            let tables = session.list_tables("public").await;
            session.close().await;
            tables
        }
        Err(e) => Err(e),
    };

    match tables {
        Ok(tables) => {
            results.push(CheckResult::ok("Connectivity", "connected"));
            results.push(check_corpus_tables(&settings.corpus.tables, &tables));
        }
        Err(e) => results.push(CheckResult::error(
            "Connectivity",
            &e.to_string(),
            "Check that the database is reachable and the credentials are valid",
        )),
    }

    results
}

/// Compare the configured corpus tables with what exists in the database.
fn check_corpus_tables(configured: &[String], existing: &[String]) -> CheckResult {
    let missing: Vec<&str> = configured
        .iter()
        .filter(|t| !t.contains('.') && !existing.contains(*t))
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        CheckResult::ok(
            "Corpus tables",
            &format!("{} tables found", configured.len()),
        )
    } else {
        CheckResult::warning(
            "Corpus tables",
            &format!("missing in schema 'public': {}", missing.join(", ")),
            "Missing tables are indexed as empty documents",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Database and API settings are read from the environment",
        )
    }
}
