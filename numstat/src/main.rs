use clap::{ArgAction, Parser};
use numstat::config::{DEFAULT_PARALLELISM, DEFAULT_PRECISION};
use numstat::{input, run_batch, run_repeat, CommandLine, ProcessLauncher, RenderMode, RunConfig};
use numstat_common::{Algorithm, NumstatError, SampleMode};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_CONFIG: i32 = 2;
const EXIT_IO: i32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "numstat",
    about = "Percentile report over numbers read from files, or over repeated command runs",
    disable_version_flag = true
)]
struct Args {
    /// Show version and exit
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue)]
    show_version: bool,

    /// Percentile algorithm: simple or linear-interpolation
    #[arg(short, long, default_value = "linear-interpolation", value_parser = parse_algorithm)]
    algorithm: Algorithm,

    /// Run the command this many times instead of reading numbers from input
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Maximum number of command runs in flight
    #[arg(short, long, default_value_t = DEFAULT_PARALLELISM)]
    parallelism: usize,

    /// Take each sample from the command's stdout instead of its run time
    #[arg(short = 'r', long)]
    use_output: bool,

    /// Hand this process's stdin to every command run
    #[arg(long)]
    forward_stdin: bool,

    /// Significant digits in reported values
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: usize,

    /// Input files (batch mode) or the command and its arguments (with --count)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

impl Args {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            count: self.count.unwrap_or(1),
            parallelism: self.parallelism,
            algorithm: self.algorithm,
            precision: self.precision,
            mode: if self.use_output { SampleMode::Parse } else { SampleMode::Timing },
        }
    }
}

fn parse_algorithm(name: &str) -> Result<Algorithm, String> {
    Algorithm::from_name(name).ok_or_else(|| {
        format!(
            "unknown algorithm {name:?}, expected {} or {}",
            Algorithm::Simple.as_name(),
            Algorithm::LinearInterpolation.as_name()
        )
    })
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if args.show_version {
        println!("{}", numstat::version_line());
        return;
    }

    let config = args.run_config();
    let stdout = io::stdout();
    let result = match args.count {
        Some(_) => {
            let Some(command) = CommandLine::from_argv(&args.rest, args.forward_stdin) else {
                exit_with(NumstatError::Config("missing command".to_string()));
            };
            let render_mode = if stdout.is_terminal() { RenderMode::Live } else { RenderMode::Batch };
            run_repeat(
                &config,
                &command,
                ProcessLauncher::new(config.mode),
                stdout.lock(),
                render_mode,
                io::stderr(),
            )
            .await
        }
        None => {
            if args.use_output || args.forward_stdin {
                exit_with(NumstatError::Config(
                    "--use-output and --forward-stdin require --count".to_string(),
                ));
            }
            let paths: Vec<PathBuf> = args.rest.iter().map(PathBuf::from).collect();
            input::open_sources(&paths)
                .and_then(|reader| run_batch(&config, reader, stdout.lock(), io::stderr()))
        }
    };

    match result {
        Ok(summary) => {
            if summary.aggregate.samples == 0 {
                eprintln!("no samples collected");
            }
            process::exit(summary.exit_code());
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(err: NumstatError) -> ! {
    eprintln!("{err}");
    io::stderr().flush().ok();
    let code = match err {
        NumstatError::Config(_) => EXIT_CONFIG,
        _ => EXIT_IO,
    };
    process::exit(code);
}
