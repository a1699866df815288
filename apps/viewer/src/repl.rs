use std::{io::Write as _, sync::Arc};

use anyhow::{bail, Context, Result};
use client_core::{AnnotationService, AnnotationView, SubmitOutcome};
use shared::{
    catalog,
    domain::{ModelId, Route},
    protocol::SubmitInputs,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::render_state;

const HELP: &str = "\
commands:
  submit <sentence>   annotate a sentence
  example <n>         annotate demo sentence n (see `examples`)
  merge on|off        merge noun phrases
  model <id>          switch to /<id>
  back | forward      navigate history
  show                print current state
  history             list navigation entries
  models              list service models
  examples            list demo sentences
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Submit(String),
    Example(usize),
    Merge(bool),
    Model(ModelId),
    Back,
    Forward,
    Show,
    History,
    Models,
    Examples,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<ReplCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    let command = match verb {
        "submit" | "s" => {
            if rest.is_empty() {
                bail!("usage: submit <sentence>");
            }
            ReplCommand::Submit(rest.to_string())
        }
        "example" | "e" => ReplCommand::Example(
            rest.parse::<usize>()
                .with_context(|| format!("example index must be a number, got '{rest}'"))?,
        ),
        "merge" => match rest {
            "on" | "true" => ReplCommand::Merge(true),
            "off" | "false" => ReplCommand::Merge(false),
            _ => bail!("usage: merge on|off"),
        },
        "model" | "m" => {
            if rest.is_empty() {
                bail!("usage: model <id>");
            }
            ReplCommand::Model(ModelId::new(rest))
        }
        "back" | "b" => ReplCommand::Back,
        "forward" | "f" => ReplCommand::Forward,
        "show" => ReplCommand::Show,
        "history" | "h" => ReplCommand::History,
        "models" => ReplCommand::Models,
        "examples" => ReplCommand::Examples,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => bail!("unknown command '{other}', try `help`"),
    };
    Ok(Some(command))
}

pub fn print_examples() {
    for (i, sentence) in catalog::DEMO_SENTENCES.iter().enumerate() {
        println!("{i}: {sentence}");
    }
}

pub async fn print_models(service: &dyn AnnotationService) -> Result<()> {
    let models = service
        .models()
        .await
        .context("failed to list annotation models")?;
    for (model, description) in models {
        println!("{model}\t{description}");
    }
    Ok(())
}

pub fn describe_outcome(outcome: SubmitOutcome) -> Option<&'static str> {
    match outcome {
        SubmitOutcome::Ignored => Some("a request is already in flight"),
        SubmitOutcome::Stale => Some("result discarded after model switch"),
        SubmitOutcome::Received { .. } | SubmitOutcome::Failed => None,
    }
}

pub async fn run(view: &mut AnnotationView, service: Arc<dyn AnnotationService>) -> Result<()> {
    let mut merge_np = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        let model = view.active_model().cloned().unwrap_or_else(catalog::default_model);
        print!("{model}> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            return Ok(());
        };
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err:#}");
                continue;
            }
        };

        let inputs = match command {
            ReplCommand::Submit(sentence) => Some(SubmitInputs::new(sentence, model)),
            ReplCommand::Example(index) => match SubmitInputs::from_example(index, model) {
                Ok(inputs) => Some(inputs),
                Err(err) => {
                    println!("{err}");
                    None
                }
            },
            ReplCommand::Merge(enabled) => {
                merge_np = enabled;
                println!("merge noun phrases: {}", if enabled { "on" } else { "off" });
                None
            }
            ReplCommand::Model(model) => {
                if !catalog::is_known_model(&model) {
                    println!("warning: '{model}' is not a known model");
                }
                view.navigate(Route::for_model(&model)).await;
                None
            }
            ReplCommand::Back => {
                if !view.back().await {
                    println!("already at the oldest entry");
                }
                println!("{}", render_state(&view.snapshot().await));
                None
            }
            ReplCommand::Forward => {
                if !view.forward().await {
                    println!("already at the newest entry");
                }
                println!("{}", render_state(&view.snapshot().await));
                None
            }
            ReplCommand::Show => {
                println!("{}", render_state(&view.snapshot().await));
                None
            }
            ReplCommand::History => {
                let position = view.history().position().await;
                for (i, entry) in view.history().entries().await.iter().enumerate() {
                    let marker = if i == position { "*" } else { " " };
                    let text = entry
                        .state
                        .as_ref()
                        .and_then(|state| state.request_data.as_ref())
                        .map(|request| request.text.as_str())
                        .unwrap_or("");
                    println!(
                        "{marker}{i:>3} {} {} {text}",
                        entry.created_at.format("%H:%M:%S"),
                        entry.route
                    );
                }
                None
            }
            ReplCommand::Models => {
                if let Err(err) = print_models(service.as_ref()).await {
                    println!("{err:#}");
                }
                None
            }
            ReplCommand::Examples => {
                print_examples();
                None
            }
            ReplCommand::Help => {
                println!("{HELP}");
                None
            }
            ReplCommand::Quit => return Ok(()),
        };

        if let Some(inputs) = inputs {
            match view.submit(inputs.with_merge_np(merge_np)).await {
                Ok(outcome) => {
                    if let Some(note) = describe_outcome(outcome) {
                        println!("{note}");
                    }
                    println!("{}", render_state(&view.snapshot().await));
                }
                Err(err) => println!("{err:#}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_with_sentence() {
        assert_eq!(
            parse_command("submit  John likes ice cream. ").expect("parse"),
            Some(ReplCommand::Submit("John likes ice cream.".into()))
        );
        assert!(parse_command("submit").is_err());
    }

    #[test]
    fn parses_navigation_and_options() {
        assert_eq!(parse_command("b").expect("parse"), Some(ReplCommand::Back));
        assert_eq!(
            parse_command("forward").expect("parse"),
            Some(ReplCommand::Forward)
        );
        assert_eq!(
            parse_command("merge on").expect("parse"),
            Some(ReplCommand::Merge(true))
        );
        assert_eq!(
            parse_command("model de_core_news_sm").expect("parse"),
            Some(ReplCommand::Model(ModelId::new("de_core_news_sm")))
        );
        assert_eq!(
            parse_command("example 2").expect("parse"),
            Some(ReplCommand::Example(2))
        );
    }

    #[test]
    fn blank_lines_and_unknown_verbs() {
        assert_eq!(parse_command("   ").expect("parse"), None);
        assert!(parse_command("dance").is_err());
        assert!(parse_command("example two").is_err());
        assert!(parse_command("merge maybe").is_err());
    }

    #[test]
    fn only_ignored_and_stale_outcomes_need_a_note() {
        assert!(describe_outcome(SubmitOutcome::Ignored).is_some());
        assert!(describe_outcome(SubmitOutcome::Stale).is_some());
        assert!(describe_outcome(SubmitOutcome::Failed).is_none());
    }
}
