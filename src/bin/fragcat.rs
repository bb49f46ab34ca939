//
// fragcat - CLI entry point
//

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use fragcat::config::{Config, DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT};
use fragcat::fetch::ReqwestFetcher;
use fragcat::{orchestrator, Error};

/// Fetches sharded PNG strips concurrently from a fragment server and
/// reassembles them into one image.
#[derive(Parser, Debug)]
#[command(name = "fragcat", version, about)]
struct Cli {
    /// Base URL of the fragment server, e.g. http://example.test/image
    #[arg(long)]
    endpoint: String,

    /// Which of the server's images to fetch
    #[arg(short = 'n', long = "img", default_value_t = 1)]
    image_num: u32,

    /// Bounded queue capacity between producers and consumers
    #[arg(short = 'b', long = "buffer-size", default_value_t = 20)]
    buffer_size: usize,

    /// Number of producer (fetch) threads
    #[arg(short = 'p', long = "producers", default_value_t = 4)]
    num_producers: usize,

    /// Number of consumer (decode/place) threads
    #[arg(short = 'c', long = "consumers", default_value_t = 4)]
    num_consumers: usize,

    /// Artificial delay, in milliseconds, before each consumer processes a fragment
    #[arg(short = 'd', long = "delay-ms", default_value_t = 0)]
    consumer_delay_ms: u64,

    /// How many times to retry a fragment before giving up on it
    #[arg(short = 'r', long = "max-retries", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Path to write the assembled PNG to
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    output: String,

    /// Increase log verbosity; repeat for more (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config {
        endpoint: cli.endpoint,
        image_num: cli.image_num,
        buffer_size: cli.buffer_size,
        num_producers: cli.num_producers,
        num_consumers: cli.num_consumers,
        consumer_delay_ms: cli.consumer_delay_ms,
        max_retries: cli.max_retries,
        output: cli.output,
    };

    let fetcher = match ReqwestFetcher::new(config.endpoint.clone(), Duration::from_secs(10)) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(err) => return report_and_exit(&err),
    };

    match orchestrator::run(&config, fetcher) {
        Ok(report) => {
            log::info!("wrote {} in {:.2?}", report.output_path, report.elapsed);
            if !report.missing.is_empty() {
                eprintln!("warning: {} fragment(s) never decoded: {:?}", report.missing.len(), report.missing);
            }
            ExitCode::SUCCESS
        }
        Err(err) => report_and_exit(&err),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn report_and_exit(err: &Error) -> ExitCode {
    log::error!("{err}");
    let code: u8 = match err {
        Error::Configuration(_) => 2,
        Error::Resource(_) => 3,
        Error::Io(_) => 4,
        _ => 1,
    };
    ExitCode::from(code)
}
