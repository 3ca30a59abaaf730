use core::fmt;

/// A function that puts one byte onto some output device
pub type Sink = fn(u8);

/// Dummy struct that makes converting [`fmt::Arguments`] to bytes easier
/// by offloading that to the [`Write`](fmt::Write) trait.
#[derive(Copy, Clone)]
pub struct SinkWriter {
    sink: Sink,
}

impl SinkWriter {
    pub const fn new(sink: Sink) -> Self {
        Self { sink }
    }
}

impl fmt::Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes().for_each(self.sink);
        Ok(())
    }
}
