//! Interactive session loop.
//!
//! Lines starting with `:` are commands; anything else is taken as prompt
//! text. Finished requests are applied while the loop waits for input, so a
//! second `:generate` supersedes a chat request that is still running.

use crate::catalog::{self, TASKS};
use crate::compose::Mode;
use crate::session::{Applied, Session};
use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Mode(Mode),
    Source(String),
    Prompt(String),
    Writer(String),
    Style(String),
    Quality(String),
    Task(usize),
    Generate,
    Clear,
    Show,
    Status,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  :mode <selections|freeform|tasks|images>
  :source <text>      sample text spliced into []
  :prompt <text>      prompt text (freeform and images); bare lines do the same
  :writer [name]      empty clears
  :style [name]       empty clears
  :quality <name>     toggle a quality
  :task <n>           pick a task preset (see `writegpt list tasks`)
  :generate           send the prompt
  :clear              clear the results
  :show               print all results
  :status             print the current mode and prompt
  :quit";

pub fn parse_command(line: &str) -> std::result::Result<ReplCommand, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(ReplCommand::Prompt(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "mode" => arg.parse().map(ReplCommand::Mode),
        "source" => Ok(ReplCommand::Source(arg.to_string())),
        "prompt" => Ok(ReplCommand::Prompt(arg.to_string())),
        "writer" => Ok(ReplCommand::Writer(arg.to_string())),
        "style" => Ok(ReplCommand::Style(arg.to_string())),
        "quality" if !arg.is_empty() => Ok(ReplCommand::Quality(arg.to_string())),
        "task" => arg
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=TASKS.len()).contains(n))
            .map(|n| ReplCommand::Task(n - 1))
            .ok_or_else(|| format!("Task must be a number between 1 and {}", TASKS.len())),
        "generate" | "g" => Ok(ReplCommand::Generate),
        "clear" => Ok(ReplCommand::Clear),
        "show" => Ok(ReplCommand::Show),
        "status" => Ok(ReplCommand::Status),
        "help" | "h" => Ok(ReplCommand::Help),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        _ => Err(format!("Unknown command '{}'. Type :help", line)),
    }
}

/// Apply a command to the session. Returns the text to show the user, if
/// any; `None` for `Quit` is handled by the caller.
pub fn apply_command(session: &mut Session, command: ReplCommand) -> Option<String> {
    let state = &mut session.state;
    match command {
        ReplCommand::Mode(mode) => {
            state.mode = mode;
            if mode == Mode::Tasks {
                state.select_task(state.selected_task);
            }
            Some(format!("mode: {}", mode))
        }
        ReplCommand::Source(text) => {
            state.source_text = text;
            None
        }
        ReplCommand::Prompt(text) => {
            state.prompt_text = text;
            None
        }
        ReplCommand::Writer(name) => {
            state.selection.writer = name;
            None
        }
        ReplCommand::Style(name) => {
            state.selection.style = name;
            None
        }
        ReplCommand::Quality(name) => Some(match state.selection.toggle(&name) {
            Some(on) => format!("{}: {}", name, if on { "on" } else { "off" }),
            None => format!(
                "Unknown quality '{}'. Known: {}",
                name,
                catalog::QUALITIES.join(", ")
            ),
        }),
        ReplCommand::Task(index) => {
            state.select_task(&TASKS[index]);
            Some(format!("task: {}", TASKS[index].label))
        }
        ReplCommand::Generate => match session.generate() {
            Some(id) => Some(format!("request #{} sent", id)),
            None => Some("Nothing to send".to_string()),
        },
        ReplCommand::Clear => {
            session.clear_results();
            None
        }
        ReplCommand::Show => Some(session.output().to_string()),
        ReplCommand::Status => Some(format!(
            "mode: {}\nprompt: {}\nloading: {}",
            session.state.mode,
            session.state.prompt_text,
            session.is_loading()
        )),
        ReplCommand::Help => Some(HELP.to_string()),
        ReplCommand::Quit => None,
    }
}

pub async fn run_session(session: &mut Session) -> Result<()> {
    println!("writegpt session (mode: {})", session.state.mode);
    println!("type :help for commands, :quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            Some(applied) = session.next_completion(), if session.is_loading() => {
                if let Applied::Appended(text) = applied {
                    println!("\n{}", text);
                }
                continue;
            }
        };

        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(ReplCommand::Quit) => break,
            Ok(command) => {
                if let Some(reply) = apply_command(session, command) {
                    println!("{}", reply);
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}
