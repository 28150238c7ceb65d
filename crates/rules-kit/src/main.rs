//! Rules Kit CLI - AI coding assistant rules for your stack

use anyhow::Result;
use clap::{Parser, Subcommand};
use rules_kit_core::tui::GenerateArgs;
use rules_kit_core::Ide;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting the log level when `--debug` is not set
const LOG_ENV: &str = "RULES_KIT_LOG";

#[derive(Parser, Debug)]
#[command(name = "rules-kit")]
#[command(about = "Generate AI coding assistant rules for your stack")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory holding the templates and kit-config.json
    #[arg(long = "template-dir", global = true)]
    pub template_dir: Option<PathBuf>,

    /// Catalog file to use instead of <template-dir>/kit-config.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate rules for a project
    Generate(CliGenerateArgs),
    /// List stacks, versions, architectures and MCP tools
    List,
}

#[derive(Parser, Debug, Default)]
pub struct CliGenerateArgs {
    /// Stack to generate rules for (e.g. laravel)
    #[arg(short, long)]
    pub stack: Option<String>,

    /// Stack version (detected from the project when omitted)
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Architecture variant (stack default when omitted)
    #[arg(short, long)]
    pub architecture: Option<String>,

    /// Target AI assistant
    #[arg(short, long, value_enum)]
    pub ide: Option<Ide>,

    /// Project directory to write rules into
    #[arg(short, long = "project-path")]
    pub project_path: Option<PathBuf>,

    /// Application directory inside the project, exposed as {appDirectory}
    #[arg(long = "app-directory")]
    pub app_directory: Option<String>,

    /// Cursor rules folder relative to the project
    #[arg(long = "cursor-path")]
    pub cursor_path: Option<String>,

    /// Include global rules
    #[arg(long, overrides_with = "no_global")]
    pub global: bool,

    /// Skip global rules
    #[arg(long = "no-global", overrides_with = "global")]
    pub no_global: bool,

    /// MCP tool rule sets to add (comma-separated)
    #[arg(long = "mcp-tools", value_delimiter = ',')]
    pub mcp_tools: Option<Vec<String>>,

    /// Back up changed files and report rules that are no longer generated
    #[arg(short, long)]
    pub update: bool,

    /// Also write plain markdown copies to docs/rules-kit
    #[arg(long = "mirror-docs")]
    pub mirror_docs: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl CliGenerateArgs {
    fn into_generate_args(self, args: &Args) -> GenerateArgs {
        let global = match (self.global, self.no_global) {
            (_, true) => Some(false),
            (true, false) => Some(true),
            (false, false) => None,
        };

        GenerateArgs {
            template_dir: args.template_dir.clone(),
            config: args.config.clone(),
            stack: self.stack,
            version: self.version,
            architecture: self.architecture,
            ide: self.ide,
            project_path: self.project_path,
            app_directory: self.app_directory,
            cursor_path: self.cursor_path,
            global,
            mcp_tools: self.mcp_tools,
            update: self.update,
            mirror_docs: self.mirror_docs,
            yes: self.yes,
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug {
        "debug".to_string()
    } else {
        env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string())
    };

    let mut filter = EnvFilter::from_default_env();
    if env::var("RUST_LOG").is_err() {
        for crate_name in ["rules_kit", "rules_kit_core"] {
            if let Ok(directive) = format!("{}={}", crate_name, level).parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let mut args = Args::parse();
    init_logging(args.debug);
    debug!("{:?}", args);

    match args.command.take() {
        Some(Command::List) => {
            rules_kit_core::list(args.template_dir.as_deref(), args.config.as_deref())
        }
        Some(Command::Generate(generate_args)) => {
            let generate_args = generate_args.into_generate_args(&args);
            generate(generate_args).await
        }
        None => {
            // No subcommand provided, default to generate behavior (interactive mode)
            let generate_args = CliGenerateArgs::default().into_generate_args(&args);
            generate(generate_args).await
        }
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let result = rules_kit_core::run(args).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    if !result?.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
