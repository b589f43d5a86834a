use std::io::{self, Write};

/// Line-based command output.
///
/// Progress lines are only written in verbose mode, results of the query
/// commands are always written.
pub struct Output<W: Write> {
    writer: W,
    verbose: bool,
}

impl<W: Write> Output<W> {
    pub fn new(writer: W, verbose: bool) -> Self {
        Self { writer, verbose }
    }

    /// Writes `line` when running verbosely.
    pub fn progress(&mut self, line: &str) -> io::Result<()> {
        if self.verbose {
            self.line(line)?;
        }
        Ok(())
    }

    /// Writes `line` unconditionally.
    pub fn line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
