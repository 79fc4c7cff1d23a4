use std::env;
use std::process;
use std::sync::Arc;

use async_logsink::blocklist::{BlockList, DEFAULT_KEYWORDS_FILE};
use async_logsink::logger::AsyncLogger;
use async_logsink::model::error::AppError;
use async_logsink::replay::EventReplayer;

const USAGE: &str = "Usage: async_logsink <events.csv> [--log <path>] [--keywords <path>]";

struct Args {
    events: String,
    log_path: String,
    keywords_path: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Args, AppError> {
    let mut events = None;
    let mut log_path = None;
    let mut keywords_path = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--log" => log_path = iter.next().cloned(),
            "--keywords" => keywords_path = iter.next().cloned(),
            flag if flag.starts_with("--") => {
                return Err(AppError::InvalidArguments(format!("unknown flag {}\n{}", flag, USAGE)))
            }
            _ if events.is_none() => events = Some(arg.clone()),
            _ => return Err(AppError::InvalidArguments(USAGE.to_string())),
        }
    }

    let Some(events) = events else {
        return Err(AppError::InvalidArguments(USAGE.to_string()));
    };

    Ok(Args {
        events,
        log_path: log_path.unwrap_or_else(default_log_path),
        keywords_path: keywords_path.unwrap_or_else(|| DEFAULT_KEYWORDS_FILE.to_string()),
    })
}

fn default_log_path() -> String {
    format!("BrowserLog_{}.txt", chrono::Local::now().format("%Y%m%d"))
}

fn run() -> Result<(), AppError> {
    let args: Vec<String> = env::args().collect();
    let args = parse_args(&args)?;

    let logger = Arc::new(AsyncLogger::open(&args.log_path)?);
    logger.log_event("Application started");

    let blocklist = Arc::new(BlockList::load(&args.keywords_path, Arc::clone(&logger)));

    let mut replayer = EventReplayer::new(Arc::clone(&logger), blocklist);
    let result = replayer
        .process_file(&args.events)
        .and_then(|()| replayer.output_summaries());

    if let Err(e) = &result {
        logger.log_event(&format!("ERROR: {}", e));
    }
    logger.log_event("Application closing");
    logger.close();

    result
}
