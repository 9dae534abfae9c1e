mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use phdrscope_core::Binary;
use report::{ClassReport, Report};

/// ELF header and program header inspector
#[derive(Parser)]
#[command(
    name = "phdrscope",
    about = "Inspect ELF binaries (architecture, object type, entry point, and program headers)",
    version,
    author
)]
struct Cli {
    /// Path to binary file
    #[arg(required = true)]
    path: std::path::PathBuf,

    /// Print the structured report as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Full report: architecture, object type, entry point and every program header (default)
    Report,
    /// Only check the magic and report the architecture class
    Class,
    /// Program header table as a table
    Segments,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let bin = Binary::open(&cli.path)?;
    log::debug!("Decoding {} bytes of {}", bin.bytes().len(), bin.path);

    let command = cli.command.unwrap_or(Command::Report);
    if let Command::Class = command {
        let class = ClassReport::parse(&bin.path, bin.bytes())
            .with_context(|| format!("{} is not a readable ELF image", bin.path))?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&class)?);
        } else {
            println!("{class}");
        }
        return Ok(());
    }

    let elf = bin
        .elf()
        .with_context(|| format!("{} is not a readable ELF image", bin.path))?;
    let report = Report::build(&bin.path, &elf);

    match (command, cli.json) {
        (_, true) => println!("{}", serde_json::to_string_pretty(&report)?),
        (Command::Segments, false) => {
            if report.file_header.is_none() {
                eprintln!(
                    "{} program headers are only decoded for 64-bit images",
                    "warning:".yellow().bold()
                );
            }
            println!("{}", report.render_table());
        }
        (_, false) => print!("{report}"),
    }

    if let Some(stop) = &report.stopped {
        eprintln!("{} {}", "error:".red().bold(), stop.message);
        bail!(
            "program header walk stopped at entry #{} after {} of {} entries",
            stop.index,
            report.segments.len(),
            report.file_header.as_ref().map_or(0, |h| h.program_header_count)
        );
    }

    Ok(())
}
