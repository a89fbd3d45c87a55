use std::fs::{File, OpenOptions};
use std::path::Path;
use std::io::{IsTerminal, Write};

use crate::LogMessage;

pub trait LogTarget {
    fn log(&self,
           message: &LogMessage
    );
}

pub struct NoopLogTarget;

impl LogTarget for NoopLogTarget {
    fn log(&self,
           _message: &LogMessage
    ) {}
}

pub struct ConsoleLogTarget;

impl LogTarget for ConsoleLogTarget {
    fn log(&self,
           message: &LogMessage
    ) {
        let mut stdout = std::io::stdout();
        let result = if stdout.is_terminal() {
            writeln!(stdout, "\x1b[{}m{}\x1b[0m", message.color_code(), message)
        } else {
            writeln!(stdout, "{}", message)
        };
        if result.is_err() {
            eprintln!("Failed to write to stdout!");
        }
    }
}

// Always plain text, whatever stdout is attached to.
pub struct FileLogTarget {
    file: File
}

impl FileLogTarget {
    pub fn new(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(FileLogTarget { file })
    }
}

impl LogTarget for FileLogTarget {
    fn log(&self,
           message: &LogMessage
    ) {
        if writeln!(&self.file, "{}", message).is_err() {
            eprintln!("Failed to write to log file!");
        }
    }
}
