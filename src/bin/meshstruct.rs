//! Command-line front end for a schema file: generate C declarations, report
//! sizes, or convert single messages between hex and JSON.
//!
//! Usage:
//!   meshstruct SCHEMA header [--guard NAME]
//!   meshstruct SCHEMA c-decl TYPE [--name NAME] [--union-only]
//!   meshstruct SCHEMA decode TYPE HEX
//!   meshstruct SCHEMA encode TYPE JSON
//!   meshstruct SCHEMA size TYPE

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use meshstruct::{cgen, load_schema_file, Codec, Endianness};
use std::path::PathBuf;
use tracing::warn;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ByteOrder {
    Little,
    Big,
}

impl From<ByteOrder> for Endianness {
    fn from(b: ByteOrder) -> Self {
        match b {
            ByteOrder::Little => Endianness::Little,
            ByteOrder::Big => Endianness::Big,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
            LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "meshstruct", version, about = "Packed mesh message schemas: C headers and hex/JSON conversion")]
struct Cli {
    /// Schema definition file
    schema: PathBuf,

    /// Wire byte order
    #[arg(long, value_enum, default_value_t = ByteOrder::Little, env = "MESHSTRUCT_ENDIANNESS")]
    endianness: ByteOrder,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn, env = "MESHSTRUCT_LOG")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a C header with declarations for every type
    Header {
        #[arg(long, default_value = "MESH_MESSAGES_H")]
        guard: String,
    },
    /// Print the C declaration of one type
    CDecl {
        type_name: String,
        /// Typedef name (default: snake_case type name + "_t")
        #[arg(long)]
        name: Option<String>,
        /// Only the variant union block of a union base
        #[arg(long)]
        union_only: bool,
    },
    /// Decode a hex message and print it as JSON
    Decode { type_name: String, data: String },
    /// Encode a JSON message and print it as hex
    Encode { type_name: String, json: String },
    /// Print the minimum encoded size of a type
    Size { type_name: String },
}

fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let schema = load_schema_file(&cli.schema)
        .with_context(|| format!("loading schema {}", cli.schema.display()))?;
    let codec = Codec::new(schema, cli.endianness.into());

    match cli.command {
        Command::Header { guard } => {
            print!("{}", cgen::generate_c_header(codec.schema(), &guard)?);
        }
        Command::CDecl {
            type_name,
            name,
            union_only,
        } => {
            let decl = if union_only {
                cgen::generate_c_union_declaration(codec.schema(), &type_name, name.as_deref())?
            } else {
                codec.generate_c_declaration(&type_name, name.as_deref())?
            };
            println!("{}", decl);
        }
        Command::Decode { type_name, data } => {
            let digits: String = data.chars().filter(|c| !c.is_whitespace() && *c != ':').collect();
            let bytes = hex::decode(&digits).context("input is not valid hex")?;
            let (inst, rest) = codec.decode(&type_name, &bytes)?;
            if !rest.is_empty() {
                warn!(trailing = rest.len(), "trailing bytes after message");
            }
            let json = codec.to_json(&type_name, &inst)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Command::Encode { type_name, json } => {
            let value: serde_json::Value = serde_json::from_str(&json).context("input is not valid JSON")?;
            let inst = codec.from_json(&type_name, &value)?;
            println!("{}", hex::encode(codec.encode(&type_name, &inst)?));
        }
        Command::Size { type_name } => {
            let size = codec
                .minimum_size(&type_name)
                .with_context(|| format!("unknown struct type: {}", type_name))?;
            println!("{}", size);
        }
    }
    Ok(())
}
