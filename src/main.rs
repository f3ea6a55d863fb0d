use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Context, Result, eyre};

use spro2tod::archive::SproArchive;
use spro2tod::report;

/// Extract all Time of Day values from a Vola SPRO timing archive into a
/// CSV report. Prompts for paths when run without arguments.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the .spro archive. Prompted for interactively when omitted.
    #[arg(value_name = "FILE.SPRO")]
    input: Option<PathBuf>,

    /// Output CSV path. Defaults to <input-basename>-tod.csv.
    #[arg(value_name = "OUTPUT.CSV")]
    output: Option<PathBuf>,

    /// Overwrite the output file without asking.
    #[arg(short, long)]
    force: bool,

    /// Suppress progress output.
    #[arg(short, long)]
    quiet: bool,
}

/// Set while a prompt is waiting on the operator, so the interrupt handler
/// can tell an aborted prompt from an interrupted conversion.
static PROMPTING: AtomicBool = AtomicBool::new(false);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Ctrl-C during a prompt cancels it cleanly: a bare newline and exit 0,
/// same as closing stdin. Outside a prompt it only flags the conversion,
/// which bails out at its next checkpoint and unwinds normally so the
/// extraction scratch directory is removed on the way out.
fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        if PROMPTING.load(Ordering::SeqCst) {
            println!();
            process::exit(0);
        }
        INTERRUPTED.store(true, Ordering::SeqCst);
    })
    .wrap_err("Failed to install interrupt handler")
}

fn check_interrupted() -> Result<()> {
    if INTERRUPTED.load(Ordering::SeqCst) {
        return Err(eyre!("Interrupted"));
    }
    Ok(())
}

/// Outcome of an interactive prompt. `Cancelled` means the operator closed
/// stdin; that path prints a bare newline and exits cleanly with status 0.
enum Prompted {
    Answer(String),
    Cancelled,
}

/// Read one answer line from stdin. `None` on EOF. An interrupt while
/// blocked here is handled by `install_interrupt_handler`.
fn read_answer() -> Result<Option<String>> {
    io::stdout().flush().wrap_err("Failed to flush prompt")?;
    PROMPTING.store(true, Ordering::SeqCst);
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line);
    PROMPTING.store(false, Ordering::SeqCst);
    let n = read.wrap_err("Failed to read from stdin")?;
    if n == 0 {
        Ok(None)
    } else {
        Ok(Some(line.trim().to_string()))
    }
}

fn prompt(label: &str, default: Option<&str>) -> Result<Prompted> {
    match default {
        Some(d) => print!("{label} [{d}]: "),
        None => print!("{label}: "),
    }
    match read_answer()? {
        None => Ok(Prompted::Cancelled),
        Some(answer) if answer.is_empty() => {
            Ok(Prompted::Answer(default.unwrap_or("").to_string()))
        }
        Some(answer) => Ok(Prompted::Answer(answer)),
    }
}

fn confirm_overwrite(path: &Path) -> Result<bool> {
    let shown = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    print!("File {} already exists. Overwrite? [y/N]: ", shown.display());
    match read_answer()? {
        None => {
            println!();
            Ok(false)
        }
        Some(answer) => Ok(answer.eq_ignore_ascii_case("y")),
    }
}

/// `foobar.spro` → `foobar-tod.csv`, in the current directory.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from(format!("{stem}-tod.csv"))
}

fn convert(input: &Path, output: &Path, quiet: bool) -> Result<()> {
    let shown_input = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
    if !quiet {
        println!("Reading {}", shown_input.display());
    }

    let archive = SproArchive::open(input)?;
    check_interrupted()?;

    if !quiet {
        println!("Extracting ToD");
    }
    let (records, summary) = report::collect_records(archive.connection())?;
    check_interrupted()?;
    if !quiet {
        println!(
            "Extracted times for {} bibs and {} runs",
            summary.bibs, summary.runs
        );
    }

    let shown_output = std::path::absolute(output).unwrap_or_else(|_| output.to_path_buf());
    if !quiet {
        println!("Writing to {}", shown_output.display());
    }
    let out = File::create(output)
        .wrap_err_with(|| format!("Failed to create output file: {}", output.display()))?;
    report::write_csv(out, &records)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    install_interrupt_handler()?;
    let interactive = cli.input.is_none();

    let input = match cli.input {
        Some(path) => path,
        None => match prompt("SPRO file", None)? {
            Prompted::Answer(answer) if !answer.is_empty() => PathBuf::from(answer),
            Prompted::Answer(_) => return Err(eyre!("No input file specified.")),
            Prompted::Cancelled => {
                println!();
                return Ok(());
            }
        },
    };

    if !input.exists() {
        return Err(eyre!("File not found: {}", input.display()));
    }

    let default_output = default_output_path(&input);
    let output = match cli.output {
        Some(path) => path,
        None if interactive => {
            match prompt("Output CSV file", Some(&default_output.to_string_lossy()))? {
                Prompted::Answer(answer) if !answer.is_empty() => PathBuf::from(answer),
                Prompted::Answer(_) => default_output,
                Prompted::Cancelled => {
                    println!();
                    return Ok(());
                }
            }
        }
        None => default_output,
    };

    if output.exists() && !cli.force && !confirm_overwrite(&output)? {
        println!("Aborted.");
        return Ok(());
    }

    convert(&input, &output, cli.quiet)
}
