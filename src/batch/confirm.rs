// ABOUTME: Interactive yes/no gate guarding irreversible batch runs.
// ABOUTME: Reads answers from any BufRead so tests can script the user.

use std::io::{self, BufRead, BufReader, Write};

const PROMPT: &str = "Are you sure? (yes/no): ";
const REPROMPT: &str = "Please type yes or no and then press enter:";

/// Asks the user whether a pending action should go ahead.
pub trait Confirm: Send {
    /// Show `message` and block until the user answers.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Answer parsed from one line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// Parse an answer. Matching ignores case and surrounding whitespace.
pub fn parse_answer(line: &str) -> Option<Answer> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Answer::Yes),
        "n" | "no" => Some(Answer::No),
        _ => None,
    }
}

/// Line-oriented confirmation prompt.
pub struct ConfirmationGate<R, W> {
    input: R,
    output: W,
}

impl ConfirmationGate<BufReader<io::Stdin>, io::Stderr> {
    /// Prompt on stderr, read from stdin.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConfirmationGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read lines until one is a recognizable answer. End of input or a read
    /// error counts as "no".
    fn read_answer(&mut self) -> bool {
        let mut line = String::new();
        loop {
            line.clear();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    tracing::debug!("confirmation input closed");
                    return false;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("failed to read confirmation: {}", e);
                    return false;
                }
            }

            match parse_answer(&line) {
                Some(answer) => return answer == Answer::Yes,
                None => {
                    let _ = writeln!(self.output, "{REPROMPT}");
                    let _ = self.output.flush();
                }
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> Confirm for ConfirmationGate<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        let _ = writeln!(self.output, "{message}");
        let _ = write!(self.output, "{PROMPT}");
        let _ = self.output.flush();
        self.read_answer()
    }
}

/// Gate that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&mut self, message: &str) -> bool {
        tracing::debug!("{} (answered {})", message, self.0);
        self.0
    }
}
