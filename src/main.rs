use std::path::PathBuf;
use std::process::exit;

use clap::{CommandFactory, Parser};
use log::error;
use rdescribe::{describe_file, Calculator, Config, DescriptorEngine};

#[derive(Parser)]
#[command(version, about = "Append molecular descriptors to tab-separated SMILES files")]
struct Cli {
    /// The tab-separated input file. The last field on each line is taken as
    /// the SMILES string and any preceding fields are carried through as-is.
    input: Option<PathBuf>,

    /// Where to write the input lines with descriptors appended.
    output: Option<PathBuf>,

    /// Print the name and a short description of each computed descriptor, in
    /// output order.
    #[arg(short, long, exclusive = true)]
    list_descriptors: bool,

    /// The number of threads to use. Defaults to the number of logical CPUs as
    /// detected by rayon.
    #[arg(short, long)]
    threads: Option<usize>,

    /// A TOML file of pipeline settings. Command line flags take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Don't count the input lines up front or show a progress bar.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> rdescribe::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.quiet {
            config.progress = false;
        }
        Ok(config)
    }
}

/// flags that still mean something when given on their own
const STANDALONE: [&str; 6] =
    ["-l", "--list-descriptors", "-h", "--help", "-V", "--version"];

fn main() {
    env_logger::init();

    // any other lone argument, flag or not, just gets the help text
    let args: Vec<_> = std::env::args_os().skip(1).collect();
    if let [arg] = args.as_slice() {
        if !STANDALONE.contains(&arg.to_string_lossy().as_ref()) {
            println!("{}", Cli::command().render_help());
            return;
        }
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            e.print().ok();
            exit(1);
        }
        Err(e) => e.exit(),
    };

    if cli.list_descriptors {
        for d in DescriptorEngine::new().describe() {
            println!("{}\t{}", d.name, d.summary);
        }
        return;
    }

    let (input, output) = match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => (input, output),
        // an input with flags but no output
        (Some(_), None) => {
            println!("{}", Cli::command().render_help());
            return;
        }
        _ => {
            eprintln!("{}", Cli::command().render_usage());
            exit(1);
        }
    };

    let result = cli
        .config()
        .and_then(|config| describe_file(input, output, &config));
    if let Err(e) = result {
        error!("run failed: {e}");
        eprintln!("error: {e}");
        exit(1);
    }
}
