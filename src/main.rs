use std::io;
use std::process;
use std::sync::Arc;

use almighty_quiz::{
    App, Config, FileStorage, QuestionBank, ResultStore, SessionContext, SessionController,
    TerminalRenderer,
};
use tokio::io::BufReader;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };
    init_tracing(&config);

    let bank = match &config.catalog_path {
        Some(path) => QuestionBank::from_file(path).await,
        None => QuestionBank::builtin(),
    };
    let bank = match bank {
        Ok(bank) => Arc::new(bank),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load the question catalog");
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let store = ResultStore::new(FileStorage, &config.data_dir);
    if let Err(e) = store.init().await {
        tracing::error!(error = %e, "Cannot continue without an application data folder");
        eprintln!("{e}");
        process::exit(1);
    }

    log::info!("Starting quiz...");
    let controller = SessionController::new(
        SessionContext::new(bank, &config),
        store,
        TerminalRenderer::new(io::stdout()),
    );
    let mut app = App::new(controller);
    if let Err(e) = app.run(BufReader::new(tokio::io::stdin())).await {
        tracing::error!(error = %e, "Quiz stopped unexpectedly");
        process::exit(1);
    }
}

fn init_tracing(config: &Config) {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to forward log records: {e}");
    }

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("error"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_span_events(FmtSpan::ENTER)
        .with_line_number(true)
        .with_target(false);

    let installed = if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    if let Err(e) = installed {
        eprintln!("Failed to install the tracing subscriber: {e}");
    }
}
