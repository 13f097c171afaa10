//! tsdbwire CLI Client
//!
//! Command-line interface for inspecting a time-series database server.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};
use tsdbwire::{Config, Direction, RangeQuery, Row, Session, ValueClass};

/// tsdbwire CLI
#[derive(Parser, Debug)]
#[command(name = "tsdbwire-cli")]
#[command(about = "CLI for a time-series database server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7777")]
    server: String,

    /// Login name
    #[arg(short, long, default_value = "admin")]
    login: String,

    /// Password
    #[arg(short, long, default_value = "")]
    password: String,

    /// Read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and print the negotiated protocol version
    Version,

    /// List databases
    Bases,

    /// Show one database descriptor
    Base {
        /// Database name
        name: String,
    },

    /// Show the time range and row count of a series
    Boundary {
        /// Database name
        base: String,
        /// Numeric id to open the database under
        base_id: i64,
        /// Series id
        series_id: i64,
    },

    /// Print the rows of a series, following checkpoints page by page
    Scan {
        /// Database name
        base: String,
        /// Numeric id to open the database under
        base_id: i64,
        /// Series id
        series_id: i64,

        /// Value class of the series
        #[arg(long, value_enum, default_value = "fixed")]
        class: ClassArg,

        /// Lower time bound
        #[arg(long, default_value_t = i64::MIN, allow_negative_numbers = true)]
        from: i64,

        /// Upper time bound
        #[arg(long, default_value_t = i64::MAX, allow_negative_numbers = true)]
        to: i64,

        /// Rows per page
        #[arg(long, default_value = "1000")]
        limit: i64,

        /// Scan from newest to oldest
        #[arg(long)]
        backward: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClassArg {
    Fixed,
    Blob,
}

impl From<ClassArg> for ValueClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Fixed => ValueClass::Fixed,
            ClassArg::Blob => ValueClass::Blob,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tsdbwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .addr(&args.server)
        .credentials(&args.login, &args.password)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build();

    tracing::info!("tsdbwire CLI v{}", tsdbwire::VERSION);
    tracing::info!("Server: {}", config.addr);

    let session = match Session::connect(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = run(&session, args.command);
    session.close();

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(session: &Session, command: Commands) -> tsdbwire::Result<()> {
    match command {
        Commands::Version => {
            println!("protocol version: {}", session.protocol_version());
            println!("session key: {}", session.session_key());
        }
        Commands::Bases => {
            for db in session.list_databases()? {
                println!("{}\t{}\t{}\t{}", db.name, db.storage, db.size_limit, db.path);
            }
        }
        Commands::Base { name } => {
            println!("{:#?}", session.database_info(&name)?);
        }
        Commands::Boundary {
            base,
            base_id,
            series_id,
        } => {
            session.open_database(base_id, &base)?;
            let boundary = session.boundary(base_id, series_id)?;
            println!(
                "min={} max={} rows={}",
                boundary.min, boundary.max, boundary.row_count
            );
            session.close_database(base_id)?;
        }
        Commands::Scan {
            base,
            base_id,
            series_id,
            class,
            from,
            to,
            limit,
            backward,
        } => {
            let class = ValueClass::from(class);
            let direction = if backward {
                Direction::Backward
            } else {
                Direction::Forward
            };
            let query = RangeQuery::new(base_id, series_id, class)
                .direction(direction)
                .between(from, to)
                .limit(limit);

            session.open_database(base_id, &base)?;
            for page in session.pages(query) {
                for row in page?.rows {
                    println!("{}", format_row(&row, class));
                }
            }
            session.close_database(base_id)?;
        }
    }
    Ok(())
}

fn format_row(row: &Row, class: ValueClass) -> String {
    let value = match class {
        ValueClass::Fixed => row
            .as_i64()
            .map(|v| v.to_string())
            .unwrap_or_else(|| hex::encode(row.value())),
        ValueClass::Blob => row
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| hex::encode(row.value())),
    };
    format!("{}\t{}\tq={}", row.timestamp(), value, row.quality_u32())
}
