use crate::config::types::OutputConfig;
use std::fs::OpenOptions;
use std::io::{self, Write};

/// Destination for notification lines.
pub trait LineSink: Send {
    /// Write one line. It must be visible to readers when this returns.
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

/// Writes each line followed by a newline and flushes immediately.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> LineSink for WriterSink<W> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Collects lines in memory.
impl LineSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

impl<K: LineSink + ?Sized> LineSink for Box<K> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        (**self).emit(line)
    }
}

/// Open the sink described by `config`.
pub fn open_sink(config: &OutputConfig) -> io::Result<Box<dyn LineSink>> {
    match config {
        OutputConfig::Stdout => Ok(Box::new(WriterSink::new(io::stdout()))),
        OutputConfig::File { path } => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(Box::new(WriterSink::new(file)))
        }
    }
}
