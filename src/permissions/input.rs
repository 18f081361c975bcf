//! Interactive terminal input shared by the permission gate and `AskUser`.
//!
//! There is exactly one terminal, so every prompt goes through a single
//! [`SharedInput`]. Its mutex is held for the whole warning-plus-answer
//! exchange, which makes a pending prompt globally exclusive.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

/// A source of interactive answers.
///
/// Implementations are synchronous; [`SharedInput`] runs them on a blocking
/// thread so the async runtime is not stalled while the user types.
pub trait UserInput: Send {
    /// Displays a message (warning, question) to the user.
    fn show(&mut self, message: &str);

    /// Shows `prompt` and reads one line. Returns `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream fails.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Returns `true` for the answers that approve a yes/no prompt.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Reads answers from the process's stdin, writing prompts to stderr.
///
/// Prompts go to stderr because stdout carries the JSON responses.
#[derive(Debug, Default)]
pub struct StdinInput;

impl UserInput for StdinInput {
    fn show(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stderr = io::stderr();
        write!(stderr, "{prompt}")?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Transcript of everything shown to a [`ScriptedInput`].
pub type PromptLog = Arc<Mutex<Vec<String>>>;

/// Answers prompts from a fixed script.
///
/// Once the script is exhausted every read returns end-of-input, which the
/// permission gate treats as "no". With an empty script this is the
/// non-interactive mode of the CLI.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    log: PromptLog,
}

impl ScriptedInput {
    /// Creates an input that replies with `answers` in order.
    #[must_use]
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            log: PromptLog::default(),
        }
    }

    /// Creates an input that answers nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a handle to the transcript of messages and prompts.
    #[must_use]
    pub fn log(&self) -> PromptLog {
        Arc::clone(&self.log)
    }

    fn record(&self, entry: &str) {
        if let Ok(mut log) = self.log.lock() {
            log.push(entry.to_string());
        }
    }
}

impl UserInput for ScriptedInput {
    fn show(&mut self, message: &str) {
        self.record(message);
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.record(prompt);
        Ok(self.answers.pop_front())
    }
}

/// The process-wide terminal, shared by every component that prompts.
#[derive(Clone)]
pub struct SharedInput {
    inner: Arc<Mutex<Box<dyn UserInput>>>,
}

impl std::fmt::Debug for SharedInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedInput").finish_non_exhaustive()
    }
}

impl SharedInput {
    /// Wraps an input source.
    #[must_use]
    pub fn new(input: impl UserInput + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(input))),
        }
    }

    /// The real terminal.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(StdinInput)
    }

    /// Shows `message` (if any), then reads one answer to `prompt`.
    ///
    /// The caller is suspended until the answer arrives; no other prompt can
    /// interleave with this one.
    ///
    /// # Errors
    ///
    /// Returns an error if the input stream fails or the blocking task dies.
    pub async fn ask(&self, message: Option<String>, prompt: String) -> io::Result<Option<String>> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut input = inner
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "terminal input lock poisoned"))?;
            if let Some(message) = message {
                input.show(&message);
            }
            input.read_line(&prompt)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    /// Asks a yes/no question. Anything but "y"/"yes" counts as no,
    /// including end of input and read errors.
    pub async fn confirm(&self, message: Option<String>, prompt: String) -> bool {
        match self.ask(message, prompt).await {
            Ok(Some(answer)) => is_affirmative(&answer),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read confirmation, treating as no");
                false
            }
        }
    }
}
