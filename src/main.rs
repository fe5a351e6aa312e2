//! inkpot - Inline CSS into HTML email

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use inkpot::{FileResolver, InlineOptions, Inliner, parse_base_url};

#[derive(Parser)]
#[command(name = "inkpot")]
#[command(version, about = "Inline CSS stylesheets into HTML email", long_about = None)]
#[command(after_help = "EXAMPLES:
    inkpot mail.html -o mail.inlined.html              Inline into a new file
    inkpot mail.html --root public --base-url example.com
                                                       Resolve <link> stylesheets from public/
    cat mail.html | inkpot -                           Read stdin, write stdout")]
struct Cli {
    /// Input HTML file, or `-` for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Base URL for relative url() references and linked stylesheets
    #[arg(short, long, value_name = "URL")]
    base_url: Option<String>,

    /// Directory linked stylesheets are loaded from
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Also write style attributes outside <body>
    #[arg(long)]
    whole_document: bool,

    /// Suppress warnings
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log progress (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut options = InlineOptions::new().with_body_only(!cli.whole_document);
    if let Some(base_url) = &cli.base_url {
        options = options.with_base_url(parse_base_url(base_url).map_err(|e| e.to_string())?);
    }

    let html = read_input(&cli.input).map_err(|e| format!("{}: {e}", cli.input))?;
    let inliner = Inliner::new(options);
    let resolver = FileResolver::new(cli.root.clone());
    let output = inliner.inline_bytes(&html, &resolver);
    log::info!("inlined {} ({} bytes -> {} bytes)", cli.input, html.len(), output.len());

    match &cli.output {
        Some(path) => fs::write(path, output).map_err(|e| format!("{}: {e}", path.display())),
        None => io::stdout()
            .write_all(output.as_bytes())
            .map_err(|e| e.to_string()),
    }
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(input)
    }
}
