use std::io::Write;

use clinic_chat::adapters::FileCredentialsProvider;
use clinic_chat::cli::{self, ChatOptions, ReplOutcome, StreamEcho};
use clinic_chat::config::{ChatConfig, TransportMode};
use clinic_chat::controller::ChatController;
use clinic_chat::logging::init_logging;
use clinic_chat::traits::CredentialsProvider;

use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

fn main() -> Result<()> {
    let Some(options) = cli::run_cli_command(cli::parse_args(std::env::args())) else {
        return Ok(());
    };

    color_eyre::install()?;
    init_logging();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(options))
}

async fn run(options: ChatOptions) -> Result<()> {
    let mut config = ChatConfig::from_env();
    if options.streaming {
        config = config.with_transport(TransportMode::Streaming);
    }
    if let Some(specialty) = options.specialty {
        config = config.with_specialty(specialty);
    }

    let credentials = FileCredentialsProvider::new()?;
    if credentials.access_token().await.is_none() {
        eprintln!(
            "No usable token in {}; requests will be rejected until you sign in.",
            credentials.credentials_path().display()
        );
    }

    info!(
        "Starting clinic-chat against {} ({:?} transport)",
        config.api_base_url, config.transport
    );
    let mut controller = ChatController::from_config(config)?;
    controller.activate();

    // Streamed replies arrive between prompts, so they are echoed from state.
    let echo_task = (controller.transport() == TransportMode::Streaming).then(|| {
        let mut state_rx = controller.subscribe();
        tokio::spawn(async move {
            let mut echo = StreamEcho::new();
            while state_rx.changed().await.is_ok() {
                let state = state_rx.borrow_and_update().clone();
                if let Some(text) = echo.update(&state) {
                    let mut stdout = std::io::stdout();
                    let _ = write!(stdout, "{}", text);
                    let _ = stdout.flush();
                }
            }
        })
    });

    println!("clinic-chat {}. Type /help for commands.", cli::VERSION);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            debug!("stdin closed");
            break;
        };
        let command = cli::parse_command(&line);
        if cli::execute(&controller, command, &mut stdout).await? == ReplOutcome::Quit {
            break;
        }
    }

    controller.disconnect();
    controller.closed().await;
    if let Some(task) = echo_task {
        task.abort();
    }
    Ok(())
}
