//! A logging implementation which hands every formatted byte to a sink function
use core::fmt::Write;

use crate::print::{Sink, SinkWriter};
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// A logger that formats records as `LEVEL - target: message` lines.
///
/// The logger owns no buffer.
/// Every byte is immediately passed to `sink`, which usually busy-waits on a console.
pub struct MachineLogger {
    pub max_log_level: Level,
    sink: Sink,
}

impl MachineLogger {
    pub const fn new(max_log_level: Level, sink: Sink) -> MachineLogger {
        MachineLogger { max_log_level, sink }
    }

    /// Install this logger as the global logger.
    ///
    /// # Safety
    /// This uses the racy variants of the `log` setters so that no atomic read-modify-write instructions are
    /// emitted.
    /// It must be called while no other hart or trap handler can log, i.e. during single threaded boot.
    pub unsafe fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger_racy(self)?;
        log::set_max_level_racy(self.max_log_level.to_level_filter());
        Ok(())
    }
}

impl Log for MachineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_log_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // the sink cannot fail so neither can formatting into it
            let _ = SinkWriter::new(self.sink).write_fmt(format_args!(
                "{} - {}: {}\n",
                record.level(),
                record.target(),
                record.args(),
            ));
        }
    }

    fn flush(&self) {}
}
