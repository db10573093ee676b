//! Terminal rendering of a run's output events

use std::io::{self, Write};

use colored::Colorize;
use privy::OutputEvent;

/// Tool results at least this long are not echoed
const MAX_RESULT_CHARS: usize = 200;

/// Tool whose calls are not announced; its output is the answer
const QUIET_TOOL: &str = "dad_joke_tool";

/// Writes events as they arrive and keeps the streamed answer text
pub struct Renderer<W: Write> {
    out: W,
    answer: String,
    failed: bool,
}

impl Renderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            answer: String::new(),
            failed: false,
        }
    }

    pub fn render(&mut self, event: &OutputEvent) -> io::Result<()> {
        if let OutputEvent::Token { content } = event {
            self.answer.push_str(content);
            write!(self.out, "{}", content)?;
            return self.out.flush();
        }

        self.failed |= event.is_error();
        if let Some(line) = describe(event) {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()
    }

    /// Concatenated token text; `None` once the run reported an error
    pub fn into_answer(self) -> Option<String> {
        (!self.failed).then_some(self.answer)
    }
}

/// One colored line for non-token events
fn describe(event: &OutputEvent) -> Option<String> {
    match event {
        OutputEvent::Token { .. } => None,
        OutputEvent::ToolStart { name, .. } if name == QUIET_TOOL => None,
        OutputEvent::ToolEnd { name, .. } if name == QUIET_TOOL => None,
        OutputEvent::ToolStart { name, .. } => {
            Some(format!("\n\n🛠️ Calling Tool: {}", name).yellow().to_string())
        }
        OutputEvent::ToolEnd { output, .. } => {
            let shown = if !output.is_empty() && output.chars().count() < MAX_RESULT_CHARS {
                output.as_str()
            } else {
                "[Output too long to display]"
            };
            Some(format!("🔍 Tool Result: {}", shown).magenta().to_string())
        }
        OutputEvent::Error { message } => {
            Some(format!("\n❌ An error occurred: {}", message).red().to_string())
        }
    }
}
