//! quill CLI
//!
//! Command-line access to a database through a quill engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use quill_orm::{DialectRegistry, Engine, EngineOptions, SqlValue};

/// Run statements against a database through quill.
#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL, `driver:location`.
    #[arg(short, long, env = "DATABASE_URL")]
    database: Option<String>,

    /// Maximum pool connections.
    #[arg(long)]
    max_connections: Option<u32>,

    /// JSON file with engine options. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a statement and print the number of affected rows.
    Exec {
        /// SQL text with `?` placeholders.
        sql: String,
        /// Placeholder values.
        args: Vec<String>,
    },

    /// Run a query and print the rows tab-separated.
    Query {
        /// SQL text with `?` placeholders.
        sql: String,
        /// Placeholder values.
        args: Vec<String>,
    },

    /// Report whether a table exists.
    HasTable {
        /// Table name.
        name: String,
    },

    /// Drop a table if it exists.
    DropTable {
        /// Table name.
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut options = match &cli.config {
        Some(path) => EngineOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineOptions::default(),
    };
    if let Some(database) = cli.database {
        options.database_url = database;
    }
    if let Some(max) = cli.max_connections {
        options.max_connections = max;
    }

    let mut registry = DialectRegistry::new();
    quill_orm::sqlite::register(&mut registry);
    let engine = Engine::connect(&options, &registry).await?;
    let mut session = engine.new_session();

    match cli.command {
        Commands::Exec { sql, args } => {
            let affected = session
                .raw(&sql, args.iter().map(String::as_str).map(parse_arg))
                .exec()
                .await?;
            println!("{affected}");
        }

        Commands::Query { sql, args } => {
            let rows = session
                .raw(&sql, args.iter().map(String::as_str).map(parse_arg))
                .query_rows()
                .await?;
            println!("{}", rows.columns().join("\t"));
            for row in &rows {
                let cells: Vec<String> = row.values().iter().map(format_value).collect();
                println!("{}", cells.join("\t"));
            }
            info!("{} row(s)", rows.len());
        }

        Commands::HasTable { name } => {
            let exists = session.table_exists(&name).await?;
            println!("{exists}");
        }

        Commands::DropTable { name } => {
            session
                .raw(&format!("DROP TABLE IF EXISTS {name}"), [])
                .exec()
                .await?;
            info!("Dropped table {name}");
        }
    }

    engine.close().await;
    Ok(())
}

/// Parses a command-line value as an integer, then a float, else text.
fn parse_arg(arg: &str) -> SqlValue {
    if let Ok(i) = arg.parse::<i64>() {
        SqlValue::Int(i)
    } else if let Ok(f) = arg.parse::<f64>() {
        SqlValue::Float(f)
    } else {
        SqlValue::Text(arg.to_string())
    }
}

fn format_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
