mod config;
mod render;
mod repl;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AnnotationClient, AnnotationService, AnnotationView, InMemoryHistory, LifecycleEvent,
    SubmitOutcome,
};
use shared::{
    domain::{ModelId, Route},
    protocol::SubmitInputs,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(about = "Dependency-parse viewer for a spaCy annotation service")]
struct Cli {
    /// Annotation service root, e.g. http://localhost:8080
    #[arg(long)]
    service_root: Option<String>,
    /// Model route to open, defaults to the configured model
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate one sentence and print the parse tree
    Annotate {
        sentence: Option<String>,
        /// Use a demo sentence instead of SENTENCE
        #[arg(long, conflicts_with = "sentence")]
        example: Option<usize>,
        /// Merge noun phrases into single nodes
        #[arg(long)]
        merge_np: bool,
        /// Print the raw response document
        #[arg(long)]
        json: bool,
    },
    /// List models served by the annotation service
    Models,
    /// List demo sentences
    Examples,
    /// Interactive session with back/forward history
    Repl,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.service_root {
            settings.service_root = v.clone();
        }
        if let Some(v) = &self.model {
            settings.default_model = v.clone();
        }
        if let Some(v) = self.timeout_secs {
            settings.request_timeout_secs = v;
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn spawn_event_logger(view: &AnnotationView) {
    let mut events = view.controller().subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(LifecycleEvent::StateChanged(state)) => {
                    tracing::debug!(phase = %state.phase(), "view state changed");
                }
                Ok(LifecycleEvent::RequestFailed { request, message }) => {
                    tracing::error!(model = %request.model, %message, "annotation request failed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = config::load_settings();
    cli.apply(&mut settings);
    settings.validate()?;

    let client = AnnotationClient::with_timeout(&settings.service_root, settings.request_timeout())
        .context("failed to build annotation client")?;
    tracing::info!(service_root = %client.service_root(), "annotation service configured");
    let service: Arc<dyn AnnotationService> = Arc::new(client);

    let default_model = ModelId::new(settings.default_model.clone());
    let history = Arc::new(InMemoryHistory::with_capacity(
        Route::for_model(&default_model),
        settings.history_capacity,
    ));

    match cli.command {
        Command::Annotate {
            sentence,
            example,
            merge_np,
            json,
        } => {
            let mut view = AnnotationView::mount(service, history, default_model.clone()).await;
            spawn_event_logger(&view);

            let inputs = match (sentence, example) {
                (_, Some(index)) => SubmitInputs::from_example(index, default_model)?,
                (Some(sentence), None) => SubmitInputs::new(sentence, default_model),
                (None, None) => bail!("provide a sentence or --example <n>"),
            };
            let outcome = view.submit(inputs.with_merge_np(merge_np)).await?;
            let state = view.snapshot().await;

            if outcome == SubmitOutcome::Failed {
                bail!(
                    "{}",
                    state.error_message().unwrap_or("annotation request failed")
                );
            }
            match (json, state.response()) {
                (true, Some(response)) => {
                    println!("{}", serde_json::to_string_pretty(response)?);
                }
                _ => println!("{}", render::render_state(&state)),
            }
        }
        Command::Models => repl::print_models(service.as_ref()).await?,
        Command::Examples => repl::print_examples(),
        Command::Repl => {
            let mut view = AnnotationView::mount(service.clone(), history, default_model).await;
            spawn_event_logger(&view);
            repl::run(&mut view, service).await?;
        }
    }

    Ok(())
}
