use anyhow::Context;
use bookshelf_app::Store;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bookshelf", version, about = "Book catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the catalog over HTTP until Ctrl-C or SIGTERM
    Serve {
        #[arg(long, value_enum, default_value_t = StoreArg::Sqlite)]
        store: StoreArg,
    },
    /// Create the tables every module needs, skipping ones already applied
    Migrate,
    /// Print the effective settings as JSON
    Config,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreArg {
    Sqlite,
    Memory,
}

impl From<StoreArg> for Store {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Sqlite => Store::Sqlite,
            StoreArg::Memory => Store::Memory,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve { store } => {
            tracing::info!(env = ?settings.environment, store = ?store, "bookshelf serve");
            bookshelf_app::serve(&settings, store.into()).await
        }
        Command::Migrate => {
            let applied = bookshelf_app::migrate(&settings).await?;
            if applied.is_empty() {
                println!("database is up to date");
            }
            for name in applied {
                println!("applied {}", name);
            }
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .with_context(|| "failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}
