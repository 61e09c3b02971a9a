use colored::*;

/// A coloring tag plus a `.log()` that renders single- and multi-line
/// messages differently. Message-agnostic -- callers format
/// `Syntax`/`Trace` values into strings before logging them.
/// `Kind::Info` backs the REPL's startup banner; `Kind::Fatal` backs
/// usage and I/O errors that short-circuit before a diagnostic report.
pub enum Kind {
    Info,
    Fatal,
}

pub struct Status(pub Kind, pub &'static str);

impl Status {
    pub fn info() -> Status {
        Status(Kind::Info, "Info")
    }

    pub fn fatal() -> Status {
        Status(Kind::Fatal, "Error")
    }

    fn tag(&self) -> ColoredString {
        match self.0 {
            Kind::Info => self.1.blue(),
            Kind::Fatal => self.1.red(),
        }
        .bold()
    }

    fn multiline(&self, lines: Vec<&str>) {
        eprint!("\n{} ", self.tag());
        for line in lines {
            eprintln!("{}", line);
        }
        eprintln!()
    }

    pub fn log(&self, message: &str) {
        let lines = message.lines().collect::<Vec<&str>>();

        if lines.len() > 1 {
            self.multiline(lines);
        } else {
            eprintln!("{:>9} {}", self.tag(), message);
        }
    }
}
