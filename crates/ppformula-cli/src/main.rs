//! ppf - evaluate ProcessPlan formulas from the command line

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ppformula::{builtin_registry, field_names, Formula, ImplementationStatus};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ppf")]
#[command(author, version, about = "ProcessPlan formula compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula and print the result
    Eval {
        /// Formula source text
        formula: Option<String>,

        /// Read the formula from a file
        #[arg(long, conflicts_with = "formula")]
        file: Option<PathBuf>,

        /// Field value as NAME=VALUE (repeatable)
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// JSON object of field values
        #[arg(long)]
        fields_json: Option<PathBuf>,

        /// List referenced fields that were not supplied on stderr
        #[arg(long)]
        warn_unresolved: bool,
    },

    /// List the fields a formula references
    Fields {
        /// Formula source text
        formula: Option<String>,

        /// Read the formula from a file
        #[arg(long, conflicts_with = "formula")]
        file: Option<PathBuf>,
    },

    /// Print the parsed syntax tree and its call nesting depth
    Inspect {
        /// Formula source text
        formula: Option<String>,

        /// Read the formula from a file
        #[arg(long, conflicts_with = "formula")]
        file: Option<PathBuf>,
    },

    /// List built-in functions
    Functions {
        /// Only show functions with this status (implemented, partial, not-implemented)
        #[arg(long)]
        status: Option<ImplementationStatus>,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the syntax and description of a function
    Describe {
        /// Function name
        name: String,
    },

    /// Evaluate a formula for every record of a CSV file
    Batch {
        /// Input CSV file with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Formula source text
        formula: Option<String>,

        /// Read the formula from a file
        #[arg(long, conflicts_with = "formula")]
        file: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Header of the result column
        #[arg(long, default_value = "result")]
        column: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            formula,
            file,
            fields,
            fields_json,
            warn_unresolved,
        } => eval(
            formula,
            file.as_deref(),
            fields,
            fields_json.as_deref(),
            warn_unresolved,
        ),
        Commands::Fields { formula, file } => list_fields(formula, file.as_deref()),
        Commands::Inspect { formula, file } => inspect(formula, file.as_deref()),
        Commands::Functions { status, json } => list_functions(status, json),
        Commands::Describe { name } => describe(&name),
        Commands::Batch {
            input,
            formula,
            file,
            output,
            column,
        } => batch(&input, formula, file.as_deref(), output.as_deref(), &column),
    }
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) => Ok((name.trim().to_string(), value.to_string())),
        None => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

/// Formula text from the positional argument or `--file`
fn formula_source(formula: Option<String>, file: Option<&Path>) -> Result<String> {
    match (formula, file) {
        (_, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display())),
        (Some(formula), None) => Ok(formula),
        (None, None) => bail!("No formula given: pass FORMULA or --file"),
    }
}

/// Field map from a JSON object; non-string values keep their JSON text
fn load_fields_json(path: &Path) -> Result<HashMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a JSON object", path.display()))?;

    Ok(object
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}

fn eval(
    formula: Option<String>,
    file: Option<&Path>,
    fields: Vec<(String, String)>,
    fields_json: Option<&Path>,
    warn_unresolved: bool,
) -> Result<()> {
    let source = formula_source(formula, file)?;
    let formula = Formula::parse(&source).context("Failed to parse formula")?;

    // Flags override values from the JSON file
    let mut values = match fields_json {
        Some(path) => load_fields_json(path)?,
        None => HashMap::new(),
    };
    values.extend(fields);

    if warn_unresolved {
        for name in formula.unresolved_fields(&values) {
            eprintln!("Warning: field '{}' has no value", name);
        }
    }

    println!("{}", formula.evaluate(&values));
    Ok(())
}

fn list_fields(formula: Option<String>, file: Option<&Path>) -> Result<()> {
    let source = formula_source(formula, file)?;
    for name in field_names(&source) {
        println!("{}", name);
    }
    Ok(())
}

fn inspect(formula: Option<String>, file: Option<&Path>) -> Result<()> {
    let source = formula_source(formula, file)?;
    let formula = Formula::parse(&source).context("Failed to parse formula")?;
    println!("{:#?}", formula.ast());
    println!("Depth: {}", formula.depth());
    Ok(())
}

fn list_functions(status: Option<ImplementationStatus>, json: bool) -> Result<()> {
    let registry = builtin_registry();
    let defs: Vec<_> = registry
        .iter()
        .filter(|def| status.map_or(true, |s| def.status == s))
        .collect();

    if json {
        let text = serde_json::to_string_pretty(&defs).context("Failed to serialize functions")?;
        println!("{}", text);
        return Ok(());
    }

    for def in &defs {
        println!("{:<22} {:<16} {}", def.name, def.status.as_str(), def.description);
    }

    let summary = registry.status_summary();
    eprintln!(
        "{} functions: {} implemented, {} partial, {} not available",
        summary.total(),
        summary.implemented,
        summary.partial,
        summary.not_implemented
    );
    Ok(())
}

fn describe(name: &str) -> Result<()> {
    let def = builtin_registry()
        .get(name)
        .with_context(|| format!("Unknown function '{}'", name))?;

    println!("{}", def.syntax());
    println!("Status: {}", def.status);
    println!();
    println!("{}", def.description);
    if !def.example.is_empty() {
        println!();
        println!("Example: {}", def.example);
    }
    Ok(())
}

fn batch(
    input: &Path,
    formula: Option<String>,
    file: Option<&Path>,
    output: Option<&Path>,
    column: &str,
) -> Result<()> {
    let source = formula_source(formula, file)?;
    let formula = Formula::parse(&source).context("Failed to parse formula")?;

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to open '{}'", input.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read headers from '{}'", input.display()))?
        .clone();

    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(sink);

    let mut header_row: Vec<&str> = headers.iter().collect();
    header_row.push(column);
    writer
        .write_record(&header_row)
        .context("Failed to write header")?;

    let mut rows = 0;
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read record {}", index + 1))?;
        let values: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let result = formula.evaluate(&values).as_string();
        let mut row: Vec<&str> = record.iter().collect();
        row.push(&result);
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write record {}", index + 1))?;
        rows += 1;
    }
    writer.flush().context("Failed to flush output")?;

    if let Some(path) = output {
        eprintln!("Wrote {} rows to '{}'", rows, path.display());
    }
    Ok(())
}
