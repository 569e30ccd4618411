//! Gridsheet - A spreadsheet core with a command-line front end

mod config;
mod error;
mod logging;

use anyhow::{Context, Result, bail};
use error::CliError;
use gridsheet_core::{CellAddress, Document, JsonFileStore, Sheet};
use gridsheet_engine::engine::{FUNCTIONS, evaluate_formula, parse_formula_with_cell_ref};
use std::env;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage: gridsheet [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --store <FILE>            Workbook file (JSON) to load and save");
    eprintln!("  --config <FILE>           Read settings from this TOML file");
    eprintln!("  --set <ADDR=TEXT>         Write a cell before running (can be repeated)");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula (or ADDR=FORMULA) and print it");
    eprintln!("  -p, --print               Print the active sheet as TSV");
    eprintln!("  --functions               List the built-in functions");
    eprintln!("  -v, --verbose             More logging (can be repeated)");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    help: bool,
    store: Option<PathBuf>,
    config: Option<PathBuf>,
    sets: Vec<(CellAddress, String)>,
    command: Option<String>,
    print: bool,
    functions: bool,
    verbose: u8,
}

fn parse_assignment(text: &str) -> Result<(CellAddress, String), CliError> {
    let Some((addr, value)) = text.split_once('=') else {
        return Err(CliError::InvalidAssignment(text.to_string()));
    };
    let addr = CellAddress::from_str(addr.trim())
        .ok_or_else(|| CliError::InvalidAddress(addr.to_string()))?;
    Ok((addr, value.to_string()))
}

fn parse_args(args: &[String]) -> Result<Options, CliError> {
    let mut opts = Options::default();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .ok_or_else(|| CliError::MissingValue(arg.to_string()))
        };
        match arg {
            "-h" | "--help" => opts.help = true,
            "--store" => opts.store = Some(PathBuf::from(value()?)),
            "--config" => opts.config = Some(PathBuf::from(value()?)),
            "--set" => {
                let text = value()?;
                opts.sets.push(parse_assignment(&text)?);
            }
            "-c" | "--command" => opts.command = Some(value()?),
            "-p" | "--print" => opts.print = true,
            "--functions" => opts.functions = true,
            "-v" | "--verbose" => opts.verbose += 1,
            "-vv" | "-vvv" => opts.verbose += (arg.len() - 1) as u8,
            arg if arg.starts_with('-') => return Err(CliError::UnknownOption(arg.to_string())),
            arg => return Err(CliError::UnexpectedArgument(arg.to_string())),
        }
        i += 1;
    }
    Ok(opts)
}

fn print_functions() {
    for info in FUNCTIONS {
        println!("{:<40} {}", info.usage, info.description);
    }
}

/// Display values of the active sheet as TSV, without trailing blank rows
/// and columns.
fn sheet_tsv(doc: &Document) -> String {
    let sheet: &Sheet = doc.sheet();
    let mut lines: Vec<Vec<String>> = (0..sheet.height())
        .map(|row| {
            (0..sheet.width())
                .map(|col| {
                    sheet
                        .address(row, col)
                        .map(|addr| doc.display_value(&addr))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    while lines.last().is_some_and(|l| l.iter().all(String::is_empty)) {
        lines.pop();
    }
    let width = lines
        .iter()
        .map(|l| l.iter().rposition(|c| !c.is_empty()).map_or(0, |p| p + 1))
        .max()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| l[..width].join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the command. Returns false when a formula produced an error token.
fn run(opts: Options) -> Result<bool> {
    let idle = opts.sets.is_empty() && opts.command.is_none() && !opts.print;
    let cfg = config::load(opts.config.as_deref())?;
    logging::init(logging::level_for(opts.verbose, cfg.log_level.as_deref()));

    if opts.functions {
        print_functions();
        return Ok(true);
    }
    if idle {
        bail!("Nothing to do: pass -c, --set or -p");
    }

    let store_path = opts
        .store
        .or(cfg.store)
        .or_else(config::default_store_path)
        .context("No workbook location: pass --store")?;
    log::info!("Using workbook {}", store_path.display());
    let mut doc = Document::with_store(Box::new(JsonFileStore::new(store_path)), cfg.sheet);

    for (addr, text) in &opts.sets {
        doc.commit_cell_edit(addr, text)
            .with_context(|| format!("Cannot set {}", addr))?;
    }

    let mut ok = true;
    if let Some(command) = opts.command {
        let parsed = parse_formula_with_cell_ref(command.trim());
        let value = match parsed.target {
            Some(target) => {
                doc.set_cell_value(&target, &parsed.formula)
                    .with_context(|| format!("Cannot set {}", target))?;
                doc.evaluate_cell(&target)
            }
            None => {
                let sheet = doc.sheet();
                evaluate_formula(&parsed.formula, &sheet.rows, &sheet.column_headers)
            }
        };
        println!("{}", value);
        ok = !value.is_error();
    }

    if opts.print {
        let tsv = sheet_tsv(&doc);
        if !tsv.is_empty() {
            println!("{}", tsv);
        }
    }
    Ok(ok)
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };
    if opts.help {
        print_usage();
        return;
    }

    match run(opts) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
