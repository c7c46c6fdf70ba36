use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bsp_entities::{
    format_lump_table, format_raw, format_sorted_counts, read_header, verify_header, EntityLump,
    Header, MalformedLinePolicy, OffsetBase, Options,
};
use clap::Parser;
use log::info;

/// Print the entities of a Quake 2 map file
#[derive(Parser, Debug)]
#[command(name = "q2entities")]
struct Args {
    /// Show collated and sorted entity counts
    #[arg(short = 'c', long = "counts")]
    counts: bool,

    /// List the lump directory
    #[arg(short = 'l', long = "lumps")]
    lumps: bool,

    /// Treat stored lump offsets as absolute file positions
    #[arg(long)]
    absolute_offsets: bool,

    /// Fail on classname lines without a quoted value instead of skipping them
    #[arg(long)]
    strict: bool,

    path: Option<PathBuf>,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            offset_base: if self.absolute_offsets {
                OffsetBase::Absolute
            } else {
                OffsetBase::HeaderRelative
            },
            malformed_lines: if self.strict {
                MalformedLinePolicy::Reject
            } else {
                MalformedLinePolicy::Skip
            },
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let Some(path) = args.path.as_deref() else {
        println!("Usage: {} [-c] <q2mapfile.bsp>", env!("CARGO_BIN_NAME"));
        return ExitCode::SUCCESS;
    };

    // Build the whole report before printing so a failure leaves stdout untouched
    let report = match render(path, &args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(report.as_bytes()).and_then(|()| stdout.flush()) {
        eprintln!("error: writing output: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn render(path: &Path, args: &Args) -> bsp_entities::Result<String> {
    info!("reading {}", path.display());
    let mut file = BufReader::new(File::open(path)?);
    let options = args.options();

    if args.lumps {
        let header = read_header(&mut file)?;
        verify_header(&header)?;
        let header = Header::parse(&header)?;
        return Ok(lines(format_lump_table(header, options.offset_base)));
    }

    let lump = EntityLump::read(&mut file, &options)?;
    if args.counts {
        let counts = lump.classname_counts(&options)?;
        Ok(lines(format_sorted_counts(&counts)))
    } else {
        Ok(format_raw(&lump.text()))
    }
}

fn lines(rows: Vec<String>) -> String {
    rows.into_iter().map(|row| row + "\n").collect()
}
