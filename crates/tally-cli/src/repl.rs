//! Interactive chat over the stored orders.

use crate::commands;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::warn;

/// Run the interactive chat.
///
/// Each line is one request to the assistant. History is kept in
/// `~/.tally/history.txt`.
pub async fn run_chat(config: &Config, formatter: &Formatter) -> Result<()> {
    let assistant = commands::build_assistant(config)?;

    println!(
        "{}",
        formatter.info(&format!(
            "Tally chat against {} - Type 'help' for commands, 'exit' to quit",
            config.api_base_url
        ))
    );
    println!();

    let editor_config = rustyline::Config::builder()
        .max_history_size(config.settings.history_size)?
        .auto_add_history(false)
        .build();
    let mut editor = DefaultEditor::with_config(editor_config)?;

    let history_path = history_path();
    if let Some(path) = &history_path {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("tally> ") {
            Ok(line) => match parse_line(&line) {
                ReplInput::Empty => continue,
                ReplInput::Exit => {
                    println!("{}", formatter.info("Goodbye!"));
                    break;
                }
                ReplInput::Help => print_help(formatter),
                ReplInput::Query(query) => {
                    editor.add_history_entry(query).ok();
                    let reply = assistant.ask(query).await;
                    match formatter.format_reply(&reply) {
                        Ok(text) => println!("{}\n", text),
                        Err(e) => eprintln!("{}", formatter.error(&e.to_string())),
                    }
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        if let Err(e) = editor.save_history(path) {
            warn!("Failed to save chat history: {}", e);
        }
    }

    Ok(())
}

/// One line of chat input.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput<'a> {
    Empty,
    Exit,
    Help,
    Query(&'a str),
}

fn parse_line(line: &str) -> ReplInput<'_> {
    let line = line.trim();
    match line {
        "" => ReplInput::Empty,
        "exit" | "quit" | "q" => ReplInput::Exit,
        "help" | "?" => ReplInput::Help,
        query => ReplInput::Query(query),
    }
}

fn history_path() -> Option<PathBuf> {
    let dir = Config::dir().ok()?;
    if let Err(e) = std::fs::create_dir_all(&dir) {
        warn!("Chat history disabled: {}", e);
        return None;
    }
    Some(dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Ask anything about the stored orders, for example:"));
    println!();
    println!("  list all orders");
    println!("  show me order A100");
    println!("  set the email of order A100 to jane@example.com");
    println!("  delete order A100");
    println!();
    println!("  help, ?        - Show this help");
    println!("  exit, quit, q  - Leave the chat");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), ReplInput::Empty);
        assert_eq!(parse_line("exit"), ReplInput::Exit);
        assert_eq!(parse_line(" q "), ReplInput::Exit);
        assert_eq!(parse_line("?"), ReplInput::Help);
        assert_eq!(
            parse_line("  show me order A100 "),
            ReplInput::Query("show me order A100")
        );
    }

    #[test]
    fn test_commands_are_exact_words() {
        assert_eq!(parse_line("exit the order"), ReplInput::Query("exit the order"));
    }
}
