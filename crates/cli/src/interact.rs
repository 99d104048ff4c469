//! Terminal-backed interactive I/O.

use std::io::{BufRead, Write};

use fleetkey_core::{Error, Interact, Result};

/// Prompts on stdout, reads answers from stdin, and reports interactivity
/// from the attached terminal.
#[derive(Default)]
pub struct TerminalInteract;

impl TerminalInteract {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Interact for TerminalInteract {
    fn prompt_line(&self, prompt: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(prompt.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| Error::configuration(format!("failed to write prompt: {e}")))?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| Error::configuration(format!("failed to read prompt answer: {e}")))?;
        if read == 0 {
            return Err(Error::configuration("end of input while awaiting answer"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn info(&self, line: &str) {
        println!("{line}");
    }

    fn is_interactive(&self) -> bool {
        atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
    }
}
