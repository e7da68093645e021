mod render;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use livechat_core::paths::{config_json_path, save_config_json};
use livechat_core::{FileUpload, LiveChatConfig, RegistrationData};
use livechat_session::{ChatSnapshot, SessionCore};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::render::{print_affordances, print_error, print_history, print_message, print_status};

#[derive(Parser)]
#[command(name = "livechat")]
#[command(about = "Terminal client for the live chat service")]
#[command(version)]
struct Cli {
    /// Base URL of the chat service
    #[arg(long)]
    api_url: Option<String>,

    /// Deployment token
    #[arg(long)]
    token: Option<String>,

    /// Directory of the saved user and session
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat,
    /// Register and start a session
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Send a single message
    Send {
        /// Message content
        message: String,
    },
    /// Upload a JPG or PNG file
    SendFile {
        path: PathBuf,
        /// Text sent along with the file
        #[arg(long)]
        message: Option<String>,
    },
    /// Show the conversation
    History,
    /// Forget the saved user and session
    Reset,
    /// Save the endpoint settings to ~/.livechat/config.json
    Configure,
}

impl Cli {
    fn config(&self) -> LiveChatConfig {
        let mut config = LiveChatConfig::new();
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(token) = &self.token {
            config.token = token.clone();
        }
        if let Some(dir) = &self.storage_dir {
            config.storage_dir = Some(dir.clone());
        }
        config
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(debug)
                .with_file(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = cli.config();
    if let Commands::Configure = cli.command {
        return configure(&config);
    }
    if !config.is_configured() {
        anyhow::bail!("no API URL or token configured, pass --api-url and --token or run `livechat configure`");
    }

    let core = SessionCore::from_config(&config)?;
    core.start().await;

    match cli.command {
        Commands::Chat => run_interactive_chat(&core).await,
        Commands::Register { name, phone, email } => {
            let mut registration = RegistrationData::new(name, phone);
            registration.email = email;
            register(&core, registration).await
        }
        Commands::Send { message } => {
            require_user(&core)?;
            send(&core, &message, true).await;
            Ok(())
        }
        Commands::SendFile { path, message } => {
            require_user(&core)?;
            send_file(&core, &path, message.as_deref(), true).await;
            Ok(())
        }
        Commands::History => {
            let snapshot = core.snapshot();
            print_status(&snapshot);
            print_history(&snapshot);
            print_affordances(&snapshot);
            Ok(())
        }
        Commands::Reset => {
            core.reset_chat();
            println!("{}", "✅ Chat reset".green());
            Ok(())
        }
        Commands::Configure => Ok(()),
    }
}

fn configure(config: &LiveChatConfig) -> anyhow::Result<()> {
    let path = config_json_path();
    save_config_json(&path, config)?;
    println!("{}", format!("✅ Saved {}", path.display()).green());
    Ok(())
}

fn require_user(core: &SessionCore) -> anyhow::Result<()> {
    if core.snapshot().is_initialized {
        Ok(())
    } else {
        anyhow::bail!("not registered, run `livechat register` first")
    }
}

async fn register(core: &SessionCore, registration: RegistrationData) -> anyhow::Result<()> {
    if core.snapshot().is_initialized {
        println!("{}", "Already registered. Run `livechat reset` to start over.".yellow());
        return Ok(());
    }
    core.init_session(registration).await?;

    let snapshot = core.snapshot();
    if let Some(user) = &snapshot.user {
        println!("{}", format!("✅ Registered as {} (id {})", user.name, user.id).green());
    }
    print_history(&snapshot);
    print_affordances(&snapshot);
    Ok(())
}

/// Send a line. With `echo` the replies it produced are printed; the
/// interactive loop leaves that to its printer task.
async fn send(core: &SessionCore, message: &str, echo: bool) {
    let before = core.snapshot().messages.len();
    match core.send_message(message).await {
        Ok(()) if echo => print_replies(&core.snapshot(), before),
        Ok(()) => {}
        Err(e) => print_error(&e.to_string()),
    }
}

async fn send_file(core: &SessionCore, path: &Path, message: Option<&str>, echo: bool) {
    let file = match FileUpload::from_path(path) {
        Ok(file) => file,
        Err(e) => {
            print_error(&format!("Cannot read {}: {}", path.display(), e));
            return;
        }
    };
    let before = core.snapshot().messages.len();
    match core.send_file_with_message(&file, message).await {
        Ok(()) if echo => print_replies(&core.snapshot(), before),
        Ok(()) => {}
        Err(e) => print_error(&e.to_string()),
    }
}

fn print_replies(snapshot: &ChatSnapshot, before: usize) {
    for message in snapshot.messages.iter().skip(before) {
        if !message.is_from_user() {
            print_message(message);
        }
    }
    print_affordances(snapshot);
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{} ", label.cyan().bold()).as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

/// Ask for registration details until the service accepts them. Returns
/// `false` when input ended.
async fn register_interactively(
    core: &SessionCore,
    lines: &mut Lines<BufReader<Stdin>>,
) -> anyhow::Result<bool> {
    println!("{}", "Please introduce yourself to start chatting.".dimmed());
    loop {
        let Some(name) = prompt(lines, "Name:").await? else {
            return Ok(false);
        };
        let Some(phone) = prompt(lines, "Phone:").await? else {
            return Ok(false);
        };
        let Some(email) = prompt(lines, "Email (optional):").await? else {
            return Ok(false);
        };

        let registration = RegistrationData::new(name, phone).with_email(email);
        match core.init_session(registration).await {
            Ok(()) => {
                let snapshot = core.snapshot();
                print_history(&snapshot);
                print_affordances(&snapshot);
                return Ok(true);
            }
            Err(e) => print_error(&e.to_string()),
        }
    }
}

/// Print bot and agent replies as they land in the conversation, whether
/// from a send or from live-agent polling.
fn spawn_printer(core: &SessionCore) -> tokio::task::JoinHandle<()> {
    let mut updates = core.subscribe();
    let mut printed = replies(&updates.borrow_and_update());

    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.is_loading {
                continue;
            }
            let count = replies(&snapshot);
            if count > printed {
                let new = snapshot
                    .messages
                    .iter()
                    .filter(|message| !message.is_from_user())
                    .skip(printed);
                for message in new {
                    print_message(message);
                }
                print_affordances(&snapshot);
            }
            printed = count;
        }
    })
}

fn replies(snapshot: &ChatSnapshot) -> usize {
    snapshot
        .messages
        .iter()
        .filter(|message| !message.is_from_user())
        .count()
}

async fn run_interactive_chat(core: &SessionCore) -> anyhow::Result<()> {
    let snapshot = core.snapshot();
    print_status(&snapshot);
    if let Some(error) = snapshot.error_message() {
        print_error(&error);
        core.dismiss_error();
    }
    println!("{}", "Commands: /file <path>, /option <n>, /reset, /quit".dimmed());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if snapshot.is_initialized {
        print_history(&snapshot);
        print_affordances(&snapshot);
    } else if !register_interactively(core, &mut lines).await? {
        return Ok(());
    }

    let mut printer = spawn_printer(core);

    loop {
        let Some(input) = prompt(&mut lines, "You:").await? else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        match parse_command(&input) {
            Command::Quit => break,
            Command::Reset => {
                printer.abort();
                core.reset_chat();
                println!("{}", "✅ Chat reset".green());
                if !register_interactively(core, &mut lines).await? {
                    return Ok(());
                }
                printer = spawn_printer(core);
            }
            Command::File(path) => send_file(core, Path::new(path), None, false).await,
            Command::Option(index) => {
                let snapshot = core.snapshot();
                match index
                    .checked_sub(1)
                    .and_then(|i| snapshot.visible_options().get(i))
                {
                    Some(option) => {
                        if let Err(e) = core.select_option(option).await {
                            print_error(&e.to_string());
                        }
                    }
                    None => print_error("No such option"),
                }
            }
            Command::Invalid(message) => print_error(message),
            Command::Text(text) => {
                let snapshot = core.snapshot();
                if snapshot.text_input_enabled() {
                    send(core, text, false).await;
                } else {
                    print_affordances(&snapshot);
                }
            }
        }
    }

    printer.abort();
    println!("{}", "👋 Goodbye!".cyan());
    Ok(())
}

enum Command<'a> {
    Quit,
    Reset,
    File(&'a str),
    Option(usize),
    Text(&'a str),
    Invalid(&'static str),
}

fn parse_command(input: &str) -> Command<'_> {
    if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        return Command::Quit;
    }
    let Some(rest) = input.strip_prefix('/') else {
        return Command::Text(input);
    };

    let (name, argument) = rest.split_once(' ').unwrap_or((rest, ""));
    let argument = argument.trim();
    match name {
        "quit" | "exit" => Command::Quit,
        "reset" => Command::Reset,
        "file" if !argument.is_empty() => Command::File(argument),
        "file" => Command::Invalid("Usage: /file <path>"),
        "option" => argument
            .parse()
            .map(Command::Option)
            .unwrap_or(Command::Invalid("Usage: /option <n>")),
        _ => Command::Text(input),
    }
}
