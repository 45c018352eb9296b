use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::Rng;
use structopt::StructOpt;

use strata_json::Parser;

/// Deepest container nesting the driver accepts.
const MAX_DEPTH: usize = 1024;

/// Batch driver: parse each file, optionally in random network-sized
/// chunks, and report errors as `file: kind at byte N`.
#[derive(Debug, StructOpt)]
#[structopt(name = "strata", about = "Parse JSON files with the strata incremental parser.")]
struct Opts {
    /// Pretty-print each successfully parsed document to stdout.
    #[structopt(short = "d", long = "dump")]
    dump: bool,

    /// Network emulation: feed the file in random chunks of 8..4096 bytes
    /// instead of one slice.
    #[structopt(long = "nw")]
    network: bool,

    /// Print per-file statistics.
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,

    /// Files to parse.
    #[structopt(parse(from_os_str), required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    // `-h`, `--help`, and unknown flags all print usage and exit nonzero;
    // the default clap handling would exit 0 for help
    let opts = match Opts::clap().get_matches_safe() {
        Ok(matches) => Opts::from_clap(&matches),
        Err(err) => {
            eprintln!("{}", err.message);
            process::exit(2);
        }
    };
    match run(&opts) {
        Ok(0) => {}
        Ok(_) => process::exit(1),
        Err(err) => {
            eprintln!("strata: {err:#}");
            process::exit(2);
        }
    }
}

fn run(opts: &Opts) -> Result<usize> {
    let mut failures = 0;
    for path in &opts.files {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let started = Instant::now();

        // one node per byte is the worst case (unclosed `[[[[`), plus one
        // so empty files still get an arena
        let mut parser = Parser::new(bytes.len() + 1, MAX_DEPTH);
        match parse(&mut parser, &bytes, opts.network) {
            Ok(()) => {
                if opts.verbose {
                    let depth = parser.depth_usage();
                    println!(
                        "{}: {} bytes, {} nodes, depth {}/{}, {:.3?}",
                        path.display(),
                        bytes.len(),
                        parser.node_count(),
                        depth.high,
                        depth.limit,
                        started.elapsed()
                    );
                }
                if opts.dump {
                    dump(&parser, &bytes).context("writing to stdout")?;
                }
            }
            Err(err) => {
                failures += 1;
                eprintln!("{}: {} at byte {}", path.display(), err.kind(), err.offset());
                if opts.verbose {
                    eprint!("{}", err.annotate(&bytes));
                }
            }
        }
    }
    Ok(failures)
}

fn parse(parser: &mut Parser, bytes: &[u8], network: bool) -> Result<(), strata_json::Error> {
    if network {
        let mut rng = rand::thread_rng();
        let mut fed = 0;
        while fed < bytes.len() {
            let take = rng.gen_range(8..=4096).min(bytes.len() - fed);
            parser.feed(&bytes[fed..fed + take])?;
            fed += take;
        }
    } else {
        parser.feed(bytes)?;
    }
    parser.finish()
}

fn dump(parser: &Parser, bytes: &[u8]) -> io::Result<()> {
    let out = parser.document(bytes).to_bytes(true);
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    stdout.write_all(&out)?;
    stdout.write_all(b"\n")
}
