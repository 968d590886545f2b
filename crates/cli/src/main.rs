mod config;
mod lineage_cmd;
mod render;
mod tree_cmd;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use chatforest_core::{SortConfig, SortKey, SortOrder};

#[derive(Parser)]
#[command(name = "chatforest", about = "chatforest CLI - inspect chat session lineage")]
struct Cli {
    /// Path to chatforest.toml (defaults to ~/.config/chatforest/chatforest.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the session forest of a JSON records file
    Tree {
        /// Path to a JSON array of chat records
        file: PathBuf,

        /// Sort key for roots (and siblings in --flat mode)
        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// Only show sessions whose name or previews contain this text
        #[arg(long)]
        search: Option<String>,

        /// Include checkpoint sessions
        #[arg(long)]
        show_checkpoints: bool,

        /// Print the flat root list instead of the grouped forest
        #[arg(long)]
        flat: bool,

        /// Expand every node
        #[arg(long)]
        expand_all: bool,
    },

    /// Print resolved child -> parent links of a JSON records file
    Lineage {
        /// Path to a JSON array of chat records
        file: PathBuf,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Updated,
    Created,
    Name,
    Messages,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Updated => SortKey::UpdatedAt,
            SortArg::Created => SortKey::CreatedAt,
            SortArg::Name => SortKey::Name,
            SortArg::Messages => SortKey::MessageCount,
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Tree {
            file,
            sort,
            asc,
            search,
            show_checkpoints,
            flat,
            expand_all,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let default_sort = config.sort.to_sort_config();
            let order = if asc { SortOrder::Asc } else { default_sort.order };
            let sort = sort.map(|key| SortConfig::new(key.into(), order)).or_else(|| {
                asc.then(|| SortConfig::new(default_sort.by, SortOrder::Asc))
            });
            tree_cmd::run_tree(
                &file,
                config,
                tree_cmd::TreeOptions {
                    sort,
                    search,
                    show_checkpoints,
                    flat,
                    expand_all,
                },
            )
            .await
        }
        Commands::Lineage { file } => {
            let config = config::load_config(cli.config.as_deref())?;
            lineage_cmd::run_lineage(&file, config.display.preview_length).await
        }
        Commands::Config => config::show_config(cli.config.as_deref()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
