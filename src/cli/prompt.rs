//! Line-oriented terminal prompts
//!
//! Generic over reader and writer so the drivers can be exercised with
//! in-memory buffers.

use std::io::{BufRead, Write};

use crate::error::{FlowError, FlowResult};
use crate::models::DirectoryEntry;

/// Reads answers from `input` and writes prompts to `output`
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Write one line of output
    pub fn say(&mut self, text: impl AsRef<str>) -> FlowResult<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        Ok(())
    }

    /// Ask for a line of input; the answer is trimmed
    ///
    /// Fails once input is exhausted so a closed stdin cannot loop forever.
    pub fn prompt_string(&mut self, prompt: &str) -> FlowResult<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(FlowError::Io("Input closed before an answer was given".into()));
        }

        Ok(line.trim().to_string())
    }

    /// Ask with a pre-filled value used when the answer is empty
    pub fn prompt_with_default(&mut self, label: &str, default: Option<&str>) -> FlowResult<String> {
        match default.filter(|d| !d.is_empty()) {
            Some(default) => {
                let answer = self.prompt_string(&format!("{} [{}]: ", label, default))?;
                Ok(if answer.is_empty() {
                    default.to_string()
                } else {
                    answer
                })
            }
            None => self.prompt_string(&format!("{}: ", label)),
        }
    }

    /// Yes/no question; anything other than y/yes is no
    pub fn confirm(&mut self, prompt: &str) -> FlowResult<bool> {
        let answer = self.prompt_string(&format!("{} [y/N]: ", prompt))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Pick from a numbered list; returns the entry id
    ///
    /// A number selects by position. Any other answer is returned as typed so
    /// that validation reports it.
    pub fn choose(
        &mut self,
        label: &str,
        entries: &[DirectoryEntry],
        default: Option<&str>,
    ) -> FlowResult<String> {
        self.say(format!("{}:", label))?;
        for (i, entry) in entries.iter().enumerate() {
            self.say(format!("  {}. {}", i + 1, entry.name))?;
        }

        let answer = self.prompt_with_default("Select", default)?;
        let picked = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| entries.get(i))
            .map(|entry| entry.id.clone());

        Ok(picked.unwrap_or(answer))
    }
}
