use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ai::chat::{
    BoxedCompletionProvider, BoxedTranscriptionProvider, ChatError, ConversationSession, Role,
    UserInput,
};
use crate::core::{AppConfig, logging};
use crate::openai::OpenAiProvider;

const HELP: &str = r"Commands:
  /characters                 List available characters
  /character <name>           Switch character (starts a new conversation)
  /custom <name> | <prompt>   Create and switch to a custom character
  /history                    Show the conversation so far
  /audio <path>               Send an audio file as your message
  /quit                       Exit";

#[derive(Debug, PartialEq)]
enum Command {
    Say(String),
    Characters,
    Character(String),
    Custom { name: String, prompt: String },
    History,
    Audio(String),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line.to_string());
    };
    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };

    match cmd {
        "characters" => Command::Characters,
        "character" => Command::Character(arg.to_string()),
        "custom" => match arg.split_once('|') {
            Some((name, prompt)) => Command::Custom {
                name: name.trim().to_string(),
                prompt: prompt.trim().to_string(),
            },
            None => Command::Unknown(line.to_string()),
        },
        "history" => Command::History,
        "audio" => Command::Audio(arg.to_string()),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Selects the requested character, falling back to the first built-in
/// (like a select box would) when none is given or it can't be found.
fn select_initial_character(
    session: &mut ConversationSession,
    requested: Option<&str>,
) -> Result<String> {
    if let Some(name) = requested {
        match session.select_character(name, None) {
            Ok(_) => return active_name(session),
            Err(e) => print_error(&e),
        }
    }

    let default = session
        .catalog()
        .builtins()
        .first()
        .map(|c| c.name.clone())
        .context("No built-in characters available")?;
    session.select_character(&default, None)?;
    active_name(session)
}

fn active_name(session: &ConversationSession) -> Result<String> {
    session
        .active_character()
        .map(|c| c.name.clone())
        .context("No active character")
}

fn print_characters(session: &ConversationSession) {
    let active = session.active_character().map(|c| c.name.as_str());
    for character in session.catalog().iter() {
        let marker = if Some(character.name.as_str()) == active {
            "*"
        } else {
            " "
        };
        println!("{} {}", marker, character.name);
    }
}

fn print_history(session: &ConversationSession) {
    for msg in session.history() {
        let speaker = match msg.role {
            Role::User => session.user_id().unwrap_or("you"),
            Role::Assistant => session
                .active_character()
                .map(|c| c.name.as_str())
                .unwrap_or("assistant"),
            Role::System => "system",
        };
        println!("[{}] {}: {}", msg.sequence, speaker, msg.content);
    }
}

// Errors are shown and the conversation carries on
fn print_error(err: &ChatError) {
    match err {
        ChatError::Provider(_) => println!("Something went wrong, please try again. ({})", err),
        _ => println!("{}", err),
    }
}

async fn send(session: &mut ConversationSession, input: UserInput) {
    match session.handle_turn(input).await {
        Ok(outcome) => {
            let name = session
                .active_character()
                .map(|c| c.name.clone())
                .unwrap_or_default();
            println!("{}: {}", name, outcome.reply);
        }
        Err(e) => print_error(&e),
    }
}

fn read_username(rl: &mut DefaultEditor) -> Result<Option<String>> {
    loop {
        match rl.readline("Enter your username to start: ") {
            Ok(line) if !line.trim().is_empty() => return Ok(Some(line)),
            Ok(_) => continue,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }
}

pub async fn run(user: Option<String>, character: Option<String>) -> Result<()> {
    logging::init(&format!("{}=warn", env!("CARGO_CRATE_NAME")));

    let config = AppConfig::from_env()?;
    let provider = Arc::new(OpenAiProvider::new(
        &config.api_hostname,
        &config.api_key,
        &config.transcription_model,
    ));
    let completion: BoxedCompletionProvider = provider.clone();
    let transcription: BoxedTranscriptionProvider = provider;

    let mut session = ConversationSession::builder(completion)
        .transcription(transcription)
        .token_budget(config.token_budget)
        .structured_persona(config.structured_persona)
        .model_config(config.model_config())
        .build()?;

    let mut rl = DefaultEditor::new().context("Failed to start line editor")?;

    let username = match user.filter(|u| !u.trim().is_empty()) {
        Some(user) => user,
        None => match read_username(&mut rl)? {
            Some(user) => user,
            None => return Ok(()),
        },
    };
    session.set_user(&username)?;
    println!("Welcome, {}!", session.user_id().unwrap_or_default());

    let initial = select_initial_character(&mut session, character.as_deref())?;
    println!("Chatting with {}. Type /help for commands.", initial);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match parse_command(&line) {
                    Command::Say(text) if text.is_empty() => continue,
                    Command::Say(text) => send(&mut session, UserInput::Text(text)).await,
                    Command::Characters => print_characters(&session),
                    Command::Character(name) => match session.select_character(&name, None) {
                        Ok(_) => println!("Now chatting with {}.", name.trim()),
                        Err(e) => print_error(&e),
                    },
                    Command::Custom { name, prompt } => {
                        if session.catalog().resolve(&name).is_some() {
                            println!("{} already exists, its prompt is unchanged.", name);
                        }
                        match session.select_character(&name, Some(&prompt)) {
                            Ok(_) => println!("Now chatting with {}.", name),
                            Err(e) => print_error(&e),
                        }
                    }
                    Command::History => print_history(&session),
                    Command::Audio(path) => match tokio::fs::read(&path).await {
                        Ok(audio) => send(&mut session, UserInput::Audio(audio)).await,
                        Err(e) => println!("Unable to read {}: {}", path, e),
                    },
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                    Command::Unknown(cmd) => println!("Unknown command: {}\n{}", cmd, HELP),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
