/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`    — Interactive tutoring session
- `ask`     — One-shot question
- `history` — Stored history as a table
- `export`  — Stored history written to a text or PDF file

The handlers are thin: they wire the configured Tutor Service into an
`ExchangeController` and print what it returns.
*/

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::controller::ExchangeController;
use crate::error::Result;
use crate::export::{write_artifact, ExportFormat, Exporter};
use crate::service::create_service;
use crate::transcript::Exchange;

// Special commands parser for the chat loop
pub mod special_commands;

/// Builds a controller around the configured Tutor Service
pub fn connect(config: &Config) -> Result<ExchangeController> {
    let service = create_service(&config.service)?;
    Ok(ExchangeController::new(Arc::from(service)))
}

/// Renders `exchanges` and writes the artifact into `dir`
///
/// # Errors
///
/// Returns [`crate::error::TutorError::Export`] for an empty transcript or
/// a failed render or write.
pub fn export_transcript(
    exporter: &Exporter,
    exchanges: &[Exchange],
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let artifact = exporter.export(exchanges, format, Utc::now())?;
    if let Some(pages) = artifact.page_count {
        tracing::debug!("Export spans {} pages", pages);
    }
    write_artifact(&artifact, dir)
}

/// Shortens `text` to at most `max` characters, marking the cut with `...`
fn truncate(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let kept: String = single_line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

// Chat command handler
pub mod chat {
    //! Interactive tutoring session.
    //!
    //! Hydrates the transcript from the service history, then runs a
    //! readline loop: plain lines are questions for the current topic and
    //! `/` lines are special commands.

    use super::special_commands::{
        parse_special_command, print_help, print_suggestions, SpecialCommand, SUGGESTIONS,
    };
    use super::*;
    use crate::controller::{Phase, ResetOutcome, SubmitOutcome};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start an interactive tutoring session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `topic` - Optional initial topic
    pub async fn run_chat(config: Config, topic: Option<String>) -> Result<()> {
        let controller = connect(&config)?;
        let exporter = Exporter::new(&config.export);

        match controller.load_history().await {
            Ok(count) => tracing::debug!("Hydrated {} exchanges", count),
            Err(e) => {
                tracing::warn!("Failed to load tutor history: {}", e);
                println!(
                    "{}",
                    format!("Could not load previous conversations: {}", e).yellow()
                );
            }
        }

        let mut topic = topic.unwrap_or_default();
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&topic, controller.len());

        loop {
            let prompt = format_prompt(&topic);
            let draft = controller.draft();
            let read = if draft.question.is_empty() {
                rl.readline(&prompt)
            } else {
                rl.readline_with_initial(&prompt, (draft.question.as_str(), ""))
            };

            match read {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::SetTopic(new_topic)) => {
                            println!("Topic set to {}\n", new_topic.cyan());
                            topic = new_topic;
                            continue;
                        }
                        Ok(SpecialCommand::NewConversation) => {
                            match controller.start_new() {
                                ResetOutcome::Applied => {
                                    println!("{}\n", "Started a new conversation.".green())
                                }
                                ResetOutcome::Deferred => println!(
                                    "{}\n",
                                    "A question is in flight; the conversation resets when it settles."
                                        .yellow()
                                ),
                            }
                            topic.clear();
                            continue;
                        }
                        Ok(SpecialCommand::Export { format, dir }) => {
                            let dir = dir.unwrap_or_else(|| config.export.output_dir.clone());
                            handle_export(&controller, &exporter, format, &dir);
                            continue;
                        }
                        Ok(SpecialCommand::ShowHistory) => {
                            super::history::print_transcript(&controller.snapshot());
                            continue;
                        }
                        Ok(SpecialCommand::Suggest(None)) => {
                            print_suggestions();
                            continue;
                        }
                        Ok(SpecialCommand::Suggest(Some(n))) => {
                            if let Some(suggestion) =
                                n.checked_sub(1).and_then(|i| SUGGESTIONS.get(i))
                            {
                                topic = suggestion.topic.to_string();
                                controller.set_draft(suggestion.topic, suggestion.question);
                                println!(
                                    "Topic set to {}. Press Enter to ask.\n",
                                    suggestion.topic.cyan()
                                );
                            }
                            continue;
                        }
                        Ok(SpecialCommand::ShowStatus) => {
                            print_status_display(&controller, &topic);
                            continue;
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {
                            // Regular question
                        }
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    }

                    println!("{}", "Thinking...".dimmed());
                    match controller.submit(&topic, trimmed).await {
                        Ok(SubmitOutcome::Committed(exchange)) => {
                            print_exchange(controller.len(), &exchange);
                        }
                        Ok(SubmitOutcome::Failed { message }) => {
                            eprintln!("{}\n", format!("Error: {}", message).red());
                        }
                        Ok(outcome) => {
                            tracing::debug!("Submission not committed: {:?}", outcome);
                        }
                        Err(e) => {
                            eprintln!("{}", format!("Error: {}", e).red());
                            if topic.trim().is_empty() {
                                println!("Set a topic first with {}\n", "/topic <text>".cyan());
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        controller.close();
        println!("Goodbye!");
        Ok(())
    }

    fn handle_export(
        controller: &ExchangeController,
        exporter: &Exporter,
        format: ExportFormat,
        dir: &Path,
    ) {
        if controller.is_empty() {
            println!("{}\n", "Nothing to export yet. Ask a question first.".yellow());
            return;
        }
        match export_transcript(exporter, &controller.snapshot(), format, dir) {
            Ok(path) => println!("{} {}\n", "Exported to".green(), path.display()),
            Err(e) => eprintln!("{}\n", format!("Export failed: {}", e).red()),
        }
    }

    /// Prompt showing the current topic
    pub(crate) fn format_prompt(topic: &str) -> String {
        if topic.trim().is_empty() {
            format!("{} >> ", "[no topic]".dimmed())
        } else {
            format!("[{}] >> ", topic.cyan())
        }
    }

    fn print_exchange(number: usize, exchange: &Exchange) {
        println!(
            "\n{} {}",
            format!("Q{}.", number).cyan().bold(),
            exchange.topic.bold()
        );
        println!("{}\n", exchange.question.italic());
        println!("{}\n", exchange.answer);
        println!(
            "{}\n",
            exchange
                .created_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .dimmed()
        );
    }

    fn print_welcome_banner(topic: &str, loaded: usize) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              Study Tutor Interactive Session                 ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        if topic.is_empty() {
            println!("Topic:   {} (set one with /topic <text>)", "none".dimmed());
        } else {
            println!("Topic:   {}", topic.cyan());
        }
        println!("History: {} previous exchanges\n", loaded);
        if loaded == 0 {
            print_suggestions();
        }
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_status_display(controller: &ExchangeController, topic: &str) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Study Tutor Session Status                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Topic:          {}",
            if topic.is_empty() {
                "none".dimmed().to_string()
            } else {
                topic.cyan().to_string()
            }
        );
        println!("Exchanges:      {}", controller.len());
        println!(
            "State:          {}",
            match controller.phase() {
                Phase::Idle => "idle".green(),
                Phase::Submitting => "submitting".yellow(),
            }
        );
        if let Some(error) = controller.error() {
            println!("Last error:     {}", error.red());
        }
        println!();
    }

}

// One-shot question handler
pub mod ask {
    //! Single question without a session.

    use super::*;
    use crate::controller::SubmitOutcome;
    use crate::error::TutorError;

    /// Ask one question and print the answer
    pub async fn run_ask(config: Config, topic: String, question: String) -> Result<()> {
        let controller = connect(&config)?;
        let exchange = ask_question(&controller, &topic, &question).await?;
        println!("{}", exchange.answer);
        Ok(())
    }

    /// Submits through `controller`, turning a failed outcome into an error
    ///
    /// # Errors
    ///
    /// Returns the validation error, or [`TutorError::Service`] with the
    /// service's message when the call fails.
    pub async fn ask_question(
        controller: &ExchangeController,
        topic: &str,
        question: &str,
    ) -> Result<Exchange> {
        match controller.submit(topic, question).await? {
            SubmitOutcome::Committed(exchange) => Ok(exchange),
            SubmitOutcome::Failed { message } => Err(TutorError::service(message).into()),
            other => Err(TutorError::service(format!("question was not answered ({:?})", other)).into()),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::test_utils::ScriptedTutor;

        #[tokio::test]
        async fn test_ask_question_returns_answer() {
            let controller = ExchangeController::new(Arc::new(ScriptedTutor::answering()));
            let exchange = ask_question(&controller, "Python", "What is a generator?")
                .await
                .unwrap();
            assert_eq!(exchange.answer, "Answer to What is a generator?");
            assert_eq!(controller.len(), 1);
        }

        #[tokio::test]
        async fn test_ask_question_surfaces_service_message() {
            let controller =
                ExchangeController::new(Arc::new(ScriptedTutor::failing("Topic not supported")));
            let err = ask_question(&controller, "Python", "What is a generator?")
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<TutorError>(),
                Some(TutorError::Service { message }) if message == "Topic not supported"
            ));
        }

        #[tokio::test]
        async fn test_ask_question_validates_before_calling() {
            let tutor = ScriptedTutor::answering();
            let calls = tutor.calls();
            let controller = ExchangeController::new(Arc::new(tutor));
            assert!(ask_question(&controller, "", "Why?").await.is_err());
            assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        }
    }
}

// History command handler
pub mod history {
    //! Stored history as a table.

    use super::*;
    use colored::Colorize;
    use prettytable::{format, Table};

    /// Fetch the stored history and print it
    pub async fn run_history(config: Config) -> Result<()> {
        let controller = connect(&config)?;
        controller.load_history().await?;
        print_transcript(&controller.snapshot());
        Ok(())
    }

    /// Print exchanges as a table, oldest first
    pub fn print_transcript(exchanges: &[Exchange]) {
        if exchanges.is_empty() {
            println!("{}", "No conversation history found.".yellow());
            return;
        }

        println!("\nConversation History:");
        transcript_table(exchanges).printstd();
        println!();
    }

    pub(crate) fn transcript_table(exchanges: &[Exchange]) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

        table.add_row(prettytable::row![
            "#".bold(),
            "Topic".bold(),
            "Question".bold(),
            "Answer".bold(),
            "Asked".bold()
        ]);

        for (idx, exchange) in exchanges.iter().enumerate() {
            table.add_row(prettytable::row![
                (idx + 1).to_string().cyan(),
                truncate(&exchange.topic, 20),
                truncate(&exchange.question, 40),
                truncate(&exchange.answer, 40),
                exchange.created_at.format("%Y-%m-%d %H:%M").to_string()
            ]);
        }

        table
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::test_utils::exchange_at;

        #[test]
        fn test_table_has_header_and_one_row_per_exchange() {
            let exchanges = vec![exchange_at("1", 0), exchange_at("2", 1)];
            assert_eq!(transcript_table(&exchanges).len(), 3);
        }
    }
}

// Export command handler
pub mod export {
    //! Stored history written to a file.

    use super::*;

    /// Fetch the stored history and export it
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `format` - Output format
    /// * `output` - Target directory, defaulting to `export.output_dir`
    pub async fn run_export(
        config: Config,
        format: ExportFormat,
        output: Option<PathBuf>,
    ) -> Result<()> {
        let controller = connect(&config)?;
        controller.load_history().await?;

        let dir = output.unwrap_or_else(|| config.export.output_dir.clone());
        let exporter = Exporter::new(&config.export);
        let path = export_transcript(&exporter, &controller.snapshot(), format, &dir)?;
        println!("{}", path.display());
        Ok(())
    }
}
