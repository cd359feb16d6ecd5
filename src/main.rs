use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use writegpt::catalog::{self, TASKS};
use writegpt::compose::Mode;
use writegpt::config::Config;
use writegpt::credentials;
use writegpt::dispatch::Dispatcher;
use writegpt::repl::run_session;
use writegpt::session::Session;

#[derive(Debug, Parser)]
#[command(name = "writegpt")]
#[command(about = "Compose writing prompts and send them to OpenAI")]
struct CliArgs {
    /// API key file (JSON with ChatGptApiKey and ChatGptOrganization).
    #[arg(long, global = true, value_name = "PATH")]
    keys: Option<PathBuf>,

    #[arg(long, global = true)]
    chat_model: Option<String>,

    #[arg(long, global = true)]
    image_model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the available writers, styles, qualities or task presets.
    List {
        #[arg(value_enum)]
        catalog: Option<CatalogKind>,
    },
    /// Send one prompt and print the result.
    Generate(GenerateArgs),
    /// Interactive session (the default).
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CatalogKind {
    Writers,
    Styles,
    Qualities,
    Tasks,
}

#[derive(Debug, clap::Args)]
struct GenerateArgs {
    #[arg(long, default_value = "selections", value_parser = parse_mode_arg)]
    mode: Mode,

    /// Prompt text for freeform and image modes. Use [] for the sample text.
    #[arg(long)]
    prompt: Option<String>,

    /// Sample text to refine.
    #[arg(long, conflicts_with = "source_file")]
    source: Option<String>,

    #[arg(long, value_name = "PATH")]
    source_file: Option<PathBuf>,

    #[arg(long)]
    writer: Option<String>,

    #[arg(long)]
    style: Option<String>,

    /// Quality to apply; repeat for several.
    #[arg(long = "quality")]
    qualities: Vec<String>,

    /// Task preset number, as shown by `writegpt list tasks`.
    #[arg(long)]
    task: Option<usize>,
}

fn parse_mode_arg(input: &str) -> std::result::Result<Mode, String> {
    input.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "writegpt=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let command = args.command.unwrap_or(Command::Session);
    if let Command::List { catalog } = command {
        print_catalog(catalog);
        return Ok(());
    }

    let mut config = Config::from_env();
    if let Some(keys) = args.keys {
        config.key_file = keys;
    }
    if let Some(model) = args.chat_model {
        config.chat_model = model;
    }
    if let Some(model) = args.image_model {
        config.image_model = model;
    }

    info!("Starting writegpt");
    let keys = credentials::load(&config);
    let dispatcher = Dispatcher::from_credentials(keys.as_ref(), &config);
    let mut session = Session::new(dispatcher);

    match command {
        Command::Generate(generate) => {
            configure_session(&mut session, generate)?;
            if session.generate().is_none() {
                bail!("Image mode needs a non-empty --prompt");
            }
            session.wait_idle().await;
            println!("{}", session.output());
            Ok(())
        }
        Command::Session => run_session(&mut session).await,
        Command::List { .. } => Ok(()),
    }
}

fn configure_session(session: &mut Session, args: GenerateArgs) -> Result<()> {
    let state = &mut session.state;
    state.mode = args.mode;

    if let Some(path) = args.source_file {
        state.source_text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    } else if let Some(source) = args.source {
        state.source_text = source;
    }

    if let Some(prompt) = args.prompt {
        state.prompt_text = prompt;
    }
    if let Some(writer) = args.writer {
        state.selection.writer = writer;
    }
    if let Some(style) = args.style {
        state.selection.style = style;
    }
    for quality in &args.qualities {
        if !state.selection.set_quality(quality, true) {
            bail!(
                "Unknown quality '{}'. Known: {}",
                quality,
                catalog::QUALITIES.join(", ")
            );
        }
    }
    if let Some(number) = args.task {
        let Some(task) = number.checked_sub(1).and_then(|i| TASKS.get(i)) else {
            bail!("Task must be between 1 and {}", TASKS.len());
        };
        state.select_task(task);
    }

    Ok(())
}

fn print_catalog(kind: Option<CatalogKind>) {
    let print_list = |title: &str, items: &[&str]| {
        println!("{}:", title);
        for item in items {
            println!("  {}", item);
        }
    };

    let show = |wanted: CatalogKind| kind.map_or(true, |k| k == wanted);

    if show(CatalogKind::Writers) {
        print_list("writers", catalog::WRITERS);
    }
    if show(CatalogKind::Styles) {
        print_list("styles", catalog::STYLES);
    }
    if show(CatalogKind::Qualities) {
        print_list("qualities", catalog::QUALITIES);
    }
    if show(CatalogKind::Tasks) {
        println!("tasks:");
        for (i, task) in TASKS.iter().enumerate() {
            println!("  {}. {}", i + 1, task.label);
        }
    }
}
