// Console output for test progress.
//
// Every line ends with "\r\n" and the spinner is redrawn in place with a
// backspace, so the output looks the same on a serial terminal as on a
// local one. Writes are best effort: a broken console must not stop a run.

use std::io::{self, BufRead, IsTerminal, Write};

/// Iterations between two spinner updates.
pub const SPINNER_UPDATE_FREQUENCY: usize = 4096;

const SPINNER: [char; 4] = ['\\', '|', '/', '-'];
const BACKSPACE: char = '\x08';

pub struct Console<W: Write> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Plain line of text.
    pub fn line(&mut self, text: &str) {
        let _ = write!(self.out, "{}\r\n", text);
        let _ = self.out.flush();
    }

    /// Starts a test line. The trailing blank is what the first spinner glyph overwrites.
    pub fn begin_test(&mut self, label: &str) {
        let _ = write!(self.out, "- Testing {}...  ", label);
        let _ = self.out.flush();
    }

    /// Redraws the spinner every `SPINNER_UPDATE_FREQUENCY` iterations.
    pub fn spin(&mut self, iteration: usize) {
        if iteration % SPINNER_UPDATE_FREQUENCY == 0 {
            let glyph = SPINNER[(iteration / SPINNER_UPDATE_FREQUENCY) % SPINNER.len()];
            let _ = write!(self.out, "{}{}", BACKSPACE, glyph);
            let _ = self.out.flush();
        }
    }

    /// Replaces the spinner with the final verdict of a test.
    pub fn finish_test(&mut self, text: &str) {
        let _ = write!(self.out, "{}{}\r\n", BACKSPACE, text);
        let _ = self.out.flush();
    }

    /// Ends the current test line and prints an error below it.
    pub fn fail_test(&mut self, text: &str) {
        let _ = write!(self.out, "\r\n    x Error: {}\r\n", text);
        let _ = self.out.flush();
    }
}

/// Hides the terminal cursor while tests run and brings it back on drop.
pub struct DisplayGuard {
    active: bool,
}

impl DisplayGuard {
    pub fn enter() -> Self {
        let active = io::stdout().is_terminal();
        if active {
            let mut out = io::stdout();
            let _ = write!(out, "\x1b[?25l");
            let _ = out.flush();
        }
        Self { active }
    }
}

impl Drop for DisplayGuard {
    fn drop(&mut self) {
        if self.active {
            let mut out = io::stdout();
            let _ = write!(out, "\x1b[?25h");
            let _ = out.flush();
        }
    }
}

/// Blocks until a line (normally just enter) arrives on `input`.
pub fn wait_for_enter<W: Write, R: BufRead>(console: &mut Console<W>, mut input: R) {
    console.line("Press enter to exit...");
    let mut line = String::new();
    let _ = input.read_line(&mut line);
}
