use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oas_ir_core::{
    BasicNamer, Catalog, CompileOptions, DateType, Dialect, EnumMode, Include, Refs, SchemaCompiler,
    SchemaNode, UnknownType,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "oas-ir")]
#[command(about = "Compile OpenAPI schemas into a backend-agnostic node IR")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the schemas of an OpenAPI document into node sequences
    Compile {
        /// Input OpenAPI document (3.0 or 3.1, JSON)
        input: PathBuf,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compile only the named catalog entry
        #[arg(long)]
        schema: Option<String>,

        /// Components sections to extract
        #[arg(long, value_enum, value_delimiter = ',', default_values_t = vec![IncludeArg::Schemas])]
        include: Vec<IncludeArg>,

        /// Media type preferred for response and request body entries
        #[arg(long)]
        content_type: Option<String>,

        /// How date/time formats map onto nodes
        #[arg(long, value_enum, default_value_t = DateTypeArg::String)]
        date_type: DateTypeArg,

        /// Node emitted for unparseable schemas
        #[arg(long, value_enum, default_value_t = UnknownTypeArg::Any)]
        unknown_type: UnknownTypeArg,

        /// Enum rendering preference carried through to emitters
        #[arg(long, value_enum, default_value_t = EnumModeArg::AsConst)]
        enum_mode: EnumModeArg,

        /// Suffix appended to derived enum type names
        #[arg(long, default_value = "")]
        enum_suffix: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum IncludeArg {
    Schemas,
    Responses,
    RequestBodies,
}

impl From<IncludeArg> for Include {
    fn from(val: IncludeArg) -> Self {
        match val {
            IncludeArg::Schemas => Include::Schemas,
            IncludeArg::Responses => Include::Responses,
            IncludeArg::RequestBodies => Include::RequestBodies,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum DateTypeArg {
    Off,
    Date,
    String,
    StringOffset,
    StringLocal,
}

impl From<DateTypeArg> for DateType {
    fn from(val: DateTypeArg) -> Self {
        match val {
            DateTypeArg::Off => DateType::Off,
            DateTypeArg::Date => DateType::Date,
            DateTypeArg::String => DateType::String,
            DateTypeArg::StringOffset => DateType::StringOffset,
            DateTypeArg::StringLocal => DateType::StringLocal,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum UnknownTypeArg {
    Any,
    Unknown,
}

impl From<UnknownTypeArg> for UnknownType {
    fn from(val: UnknownTypeArg) -> Self {
        match val {
            UnknownTypeArg::Any => UnknownType::Any,
            UnknownTypeArg::Unknown => UnknownType::Unknown,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum EnumModeArg {
    Enum,
    AsConst,
    AsPascalConst,
    ConstEnum,
    Literal,
}

impl From<EnumModeArg> for EnumMode {
    fn from(val: EnumModeArg) -> Self {
        match val {
            EnumModeArg::Enum => EnumMode::Enum,
            EnumModeArg::AsConst => EnumMode::AsConst,
            EnumModeArg::AsPascalConst => EnumMode::AsPascalConst,
            EnumModeArg::ConstEnum => EnumMode::ConstEnum,
            EnumModeArg::Literal => EnumMode::Literal,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

/// One compiled catalog entry as printed to the output stream.
#[derive(Serialize)]
struct CompiledEntry {
    name: String,
    nodes: Vec<SchemaNode>,
    refs: Refs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            input,
            output,
            schema,
            include,
            content_type,
            date_type,
            unknown_type,
            enum_mode,
            enum_suffix,
            format,
        } => {
            let file = File::open(&input)
                .with_context(|| format!("Failed to open input file: {}", input.display()))?;
            let reader = BufReader::new(file);
            let document: serde_json::Value = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse document from: {}", input.display()))?;

            let dialect = Dialect::detect(&document);
            let includes: Vec<Include> = include.into_iter().map(Into::into).collect();

            let mut catalog = Catalog::from_document(&document, &includes, content_type.as_deref())
                .context("Failed to extract the schema catalog")?;

            if let Some(name) = &schema {
                let Some(entry) = catalog.get(name).cloned() else {
                    anyhow::bail!("schema `{name}` not found in the document");
                };
                let mut single = Catalog::new();
                single.insert(name.clone(), entry);
                catalog = single;
            }

            let options = CompileOptions {
                date_type: date_type.into(),
                unknown_type: unknown_type.into(),
                enum_mode: enum_mode.into(),
                enum_suffix,
                overrides: Vec::new(),
                schema_hook: None,
            };

            // Each entry gets a fresh compiler so entries stay independent;
            // ref aliases and enum names restart per entry.
            let result = catalog.build(|name, entry| {
                let namer = BasicNamer::default();
                let mut compiler = SchemaCompiler::new(options.clone(), &namer, dialect);
                let nodes = compiler.compile(Some(entry), Some(name));
                Ok(vec![CompiledEntry {
                    name: name.to_string(),
                    nodes,
                    refs: compiler.into_refs(),
                }])
            });

            for failure in &result.failures {
                eprintln!("Warning: entry `{}` failed: {}", failure.name, failure.error);
            }
            if result.artifacts.is_empty() && !result.failures.is_empty() {
                anyhow::bail!("no catalog entry compiled successfully");
            }

            write_json(&result.artifacts, output.as_ref(), format)?;
        }
    }

    Ok(())
}

fn write_json<T: Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    // Ensure trailing newline
    writeln!(writer).context("Failed to write trailing newline")?;

    Ok(())
}
