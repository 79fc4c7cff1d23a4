use std::fmt;

/// Construction failure of the logger. The only error the logger surfaces.
#[derive(Debug)]
pub enum LoggerError {
    Open { path: String, source: std::io::Error },
    Spawn(std::io::Error),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoggerError::Open { path, source } => {
                write!(f, "cannot open log file {}: {}", path, source)
            }
            LoggerError::Spawn(err) => write!(f, "cannot start writer thread: {}", err),
        }
    }
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggerError::Open { source, .. } => Some(source),
            LoggerError::Spawn(err) => Some(err),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    InvalidArguments(String),
    IoError(std::io::Error),
    CsvError(csv::Error),
    LoggerError(LoggerError),
    ReplayError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            AppError::IoError(err) => write!(f, "I/O error: {}", err),
            AppError::CsvError(err) => write!(f, "CSV error: {}", err),
            AppError::LoggerError(err) => write!(f, "Logger error: {}", err),
            AppError::ReplayError(msg) => write!(f, "Replay error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::CsvError(err)
    }
}

impl From<LoggerError> for AppError {
    fn from(err: LoggerError) -> Self {
        AppError::LoggerError(err)
    }
}
