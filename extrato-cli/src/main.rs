use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use extrato_core::{Classification, ContextKey, Period, SubjectKind, classify};
use extrato_feed::{
    FeedDriver, HttpSource, MemorySource, PageSource, StatementFeed, SubjectSource, write_csv,
};

mod config;
mod render;
mod state;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("EXTRATO_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "extrato", version = VERSION, about = "Paginated account statements and card bills")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a statement or bill and print it
    View(ViewArgs),

    /// Classify a single transaction description
    Classify {
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: f64,
    },

    /// Manage ~/.extrato/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct ViewArgs {
    /// Account or credit card id
    #[arg(long)]
    subject: String,

    /// Treat the subject as a credit card and load its bill
    #[arg(long)]
    bill: bool,

    /// Month as YYYY-MM (default: current month in the configured timezone)
    #[arg(long)]
    period: Option<String>,

    #[arg(long)]
    search: Option<String>,

    /// Number of pages to load (default: 1)
    #[arg(long, conflicts_with = "all")]
    pages: Option<u32>,

    /// Load every page
    #[arg(long)]
    all: bool,

    /// Serve pages from a JSON fixture instead of the API
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Write the loaded rows as CSV ("-" for stdout)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the read-model as JSON
    #[arg(long, conflicts_with = "csv")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::View(args) => view(args).await?,

        Command::Classify { description, amount } => {
            print!("{}", describe(&classify(&description, amount)));
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn describe(c: &Classification) -> String {
    format!(
        "kind:         {}\nlabel:        {}\ncounterparty: {}\n",
        c.kind.as_str(),
        c.label,
        c.counterparty
    )
}

async fn view(args: ViewArgs) -> Result<()> {
    let cfg = config::load_config()?;

    let period = match &args.period {
        Some(p) => p.parse::<Period>()?,
        None => Period::current_in(&cfg.feed.timezone)?,
    };
    let kind = if args.bill {
        SubjectKind::Bill
    } else {
        SubjectKind::Statement
    };
    let context = ContextKey::new(kind, args.subject.clone(), period).with_search(args.search.as_deref());

    let mut feed = StatementFeed::new(cfg.feed_config());
    feed.set_categories(
        cfg.categories
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<HashMap<_, _>>(),
    );

    match &args.fixture {
        Some(path) => {
            let src = MemorySource::from_fixture_file(path)?;
            run_view(FeedDriver::new(feed, src.clone(), src), context, &args).await
        }
        None => {
            let mut src = HttpSource::new(cfg.api.base_url.clone());
            if let Some(token) = cfg.token() {
                src = src.with_token(token);
            }
            run_view(FeedDriver::new(feed, src.clone(), src), context, &args).await
        }
    }
}

async fn run_view<P, S>(mut driver: FeedDriver<P, S>, context: ContextKey, args: &ViewArgs) -> Result<()>
where
    P: PageSource,
    S: SubjectSource,
{
    driver.select(context).await;
    if args.all {
        driver.load_all(None).await;
    } else if let Some(n) = args.pages.filter(|n| *n > 1) {
        driver.load_all(Some(n - 1)).await;
    }

    let view = driver.view();
    if let Some(err) = &view.error {
        eprintln!("error: {err}");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if let Some(path) = &args.csv {
        let rows = if path.as_os_str() == "-" {
            write_csv(&view, io::stdout().lock())?
        } else {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_csv(&view, BufWriter::new(file))?
        };
        eprintln!("wrote {rows} rows");
    } else {
        print!("{}", render::render_view(&view));
    }

    if view.error.is_some() && view.transactions.is_empty() {
        bail!("nothing loaded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_flags() {
        let cli = Cli::try_parse_from([
            "extrato", "view", "--subject", "acc-1", "--period", "2026-03", "--search", "uber", "--all",
        ])
        .unwrap();
        let Command::View(args) = cli.command else {
            panic!("expected view");
        };
        assert_eq!(args.subject, "acc-1");
        assert!(args.all && !args.bill);
        assert_eq!(args.search.as_deref(), Some("uber"));
    }

    #[test]
    fn pages_and_all_conflict() {
        assert!(Cli::try_parse_from(["extrato", "view", "--subject", "x", "--pages", "2", "--all"]).is_err());
    }

    #[test]
    fn classify_output_shows_wire_kind_and_label() {
        let text = describe(&classify("Pix recebido - Maria Silva", 150.0));
        assert_eq!(
            text,
            "kind:         pix_received\nlabel:        Pix recebido\ncounterparty: Maria Silva\n"
        );
    }

    #[test]
    fn classify_accepts_negative_amount() {
        let cli = Cli::try_parse_from(["extrato", "classify", "Lançamento diverso", "-42"]).unwrap();
        assert!(matches!(cli.command, Command::Classify { amount, .. } if amount == -42.0));
    }
}
