use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod characters;
pub mod chat;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "2222")]
        port: String,
    },
    /// Start an interactive chat with a character
    Chat {
        /// Username, prompted for if not given
        #[arg(long)]
        user: Option<String>,

        /// Character to start with
        #[arg(long)]
        character: Option<String>,
    },
    /// List the built-in characters
    Characters {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Chat { user, character }) => {
            chat::run(user, character).await?;
        }
        Some(Command::Characters {}) => {
            characters::run();
        }
        None => {}
    }

    Ok(())
}
