//! Chat command - interactive coaching conversation.

use rai_coach::{CoachConfig, CoachError, CoachSession, Role, LABEL_FAILED};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::progress::track_load;

const COMMANDS: &[&str] = &["/clear", "/history", "/switch", "/retry", "/status", "/quit"];

/// Slash-command completion and hints for the prompt.
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Highlighter for ChatHelper {}

impl Validator for ChatHelper {}

pub(crate) async fn run(model: Option<&str>) -> miette::Result<()> {
    let mut config = CoachConfig::from_env();
    if let Some(model) = model {
        config.default_model = Some(model.to_string());
    }

    let session = CoachSession::open(config)
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    println!("RAI - Resilience AI wellness coach");
    println!("Engine: {}", session.backend_name());
    println!("{}", session.state().progress_label);
    println!();

    load(&session, session.initialize(None)).await;

    let history = session.conversation_history();
    if !history.is_empty() {
        println!("Continuing your conversation ({} messages).", history.len());
    }
    println!("Type /quit to exit, /clear to start over. Tab completes commands.");
    println!();

    let mut rl: Editor<ChatHelper, rustyline::history::DefaultHistory> =
        Editor::new().map_err(|e| miette::miette!("Failed to start line editor: {}", e))?;
    rl.set_helper(Some(ChatHelper));

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                if input.starts_with('/') {
                    if !command(&session, input).await {
                        break;
                    }
                    continue;
                }

                match session.generate_response(input).await {
                    Ok(reply) => println!("\nrai> {}\n", reply),
                    Err(e @ CoachError::EngineNotReady) => {
                        println!("{}", e);
                        println!("Use /retry or /switch <model> to load a model.\n");
                    }
                    Err(e) => println!("{}\n", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Type /quit to exit.");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(miette::miette!("Readline error: {}", e)),
        }
    }

    session.shutdown().await;
    println!("Take care.");
    Ok(())
}

async fn load<F>(session: &CoachSession, load: F)
where
    F: std::future::Future<Output = Result<(), CoachError>>,
{
    match track_load(session, load).await {
        Ok(()) => {}
        Err(e @ CoachError::Configuration(_)) => {
            println!("{}. Type /switch to list the available models.", e);
        }
        Err(e) => {
            tracing::debug!("Load failed: {}", e);
            println!("{}. Use /retry or /switch <model> to try again.", LABEL_FAILED);
        }
    }
    println!();
}

/// Run a slash command. Returns `false` when the chat should end.
async fn command(session: &CoachSession, input: &str) -> bool {
    let mut parts = input.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match name {
        "/quit" | "/exit" => return false,
        "/clear" => {
            match session.clear_conversation() {
                Ok(()) => println!("Conversation cleared.\n"),
                Err(e) => println!("Conversation cleared, but the saved copy remains: {}\n", e),
            }
        }
        "/history" => {
            let history = session.conversation_history();
            if history.is_empty() {
                println!("No messages yet.\n");
            }
            for message in history {
                let who = match message.role {
                    Role::User => "you",
                    Role::Assistant => "rai",
                    Role::System => "system",
                };
                println!(
                    "[{}] {}> {}",
                    message.timestamp.format("%Y-%m-%d %H:%M"),
                    who,
                    message.content
                );
            }
            println!();
        }
        "/switch" => match arg {
            Some(id) => load(session, session.switch_model(id)).await,
            None => {
                println!("Usage: /switch <model-id>. Available models:");
                for model in session.list_available() {
                    println!("  {:<32} {}", model.id, model.name);
                }
                println!();
            }
        },
        "/retry" => load(session, session.retry_initialization()).await,
        "/status" => {
            let state = session.state();
            let model = session
                .current_model_info()
                .map(|m| m.name)
                .unwrap_or("none");
            println!("Model:   {}", model);
            println!("Phase:   {}", session.phase().as_str());
            println!("Device:  {}", state.device);
            println!(
                "Cache:   {} ({:.2} GB)",
                if state.cached { "cached" } else { "empty" },
                state.cache_size_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
            );
            println!("Status:  {}\n", state.progress_label);
        }
        other => println!("Unknown command: {}\n", other),
    }
    true
}
