//! Prompts on the controlling terminal.
//!
//! Questions are written to stderr and answers are read from stdin. When
//! stdin is a terminal, answers are read key by key in raw mode, and
//! passwords are not echoed. Otherwise stdin is read line by line on a
//! background thread.
//!
//! With a timeout set, a prompt left unanswered is dismissed once the
//! timeout expires.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;
use parking_lot::Mutex;
use signet_core::{MessageKind, Prompter, Secret};
use tracing::{debug, info, warn};

/// One read from the operator.
enum Reply {
    Text(String),
    Dismissed,
    TimedOut,
}

/// Where answers come from.
enum Input {
    /// Lines from a reader.
    Lines(LineFeed),
    /// Key events from the controlling terminal.
    Keys,
}

/// Lines read on a background thread so that a prompt can stop waiting.
struct LineFeed {
    lines: Receiver<io::Result<String>>,
    /// A prompt timed out; a line still in flight was meant for it.
    stale: bool,
}

impl LineFeed {
    fn spawn(input: impl BufRead + Send + 'static) -> Self {
        let (tx, lines) = mpsc::sync_channel(0);
        thread::spawn(move || feed_lines(input, tx));
        Self { lines, stale: false }
    }

    fn next(&mut self, deadline: Option<Instant>) -> io::Result<Reply> {
        if self.stale {
            while self.lines.try_recv().is_ok() {
                debug!("discarding an answer to a timed-out prompt");
            }
            self.stale = false;
        }

        let received = match deadline {
            Some(deadline) => self
                .lines
                .recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => self.lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(line) => line.map(Reply::Text),
            Err(RecvTimeoutError::Timeout) => {
                self.stale = true;
                Ok(Reply::TimedOut)
            }
            Err(RecvTimeoutError::Disconnected) => Ok(Reply::Dismissed),
        }
    }
}

fn feed_lines(mut input: impl BufRead, tx: SyncSender<io::Result<String>>) {
    loop {
        let mut line = String::new();
        let item = match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\r', '\n']).len();
                line.truncate(trimmed);
                Ok(line)
            }
            Err(e) => Err(e),
        };

        let failed = item.is_err();
        if tx.send(item).is_err() || failed {
            break;
        }
    }
}

struct TerminalIo {
    input: Input,
    output: Box<dyn Write + Send>,
}

/// [`Prompter`] backed by the terminal.
pub struct TerminalPrompter {
    io: Mutex<TerminalIo>,
    timeout: Option<Duration>,
}

impl TerminalPrompter {
    /// Prompt on stderr and read from stdin.
    pub fn stdio() -> Self {
        let input = if io::stdin().is_tty() {
            Input::Keys
        } else {
            Input::Lines(LineFeed::spawn(BufReader::new(io::stdin())))
        };
        Self {
            io: Mutex::new(TerminalIo {
                input,
                output: Box::new(io::stderr()),
            }),
            timeout: None,
        }
    }

    /// Prompt on `output` and read answers line by line from `input`.
    /// Passwords are read as plain lines.
    pub fn new(input: impl BufRead + Send + 'static, output: impl Write + Send + 'static) -> Self {
        Self {
            io: Mutex::new(TerminalIo {
                input: Input::Lines(LineFeed::spawn(input)),
                output: Box::new(output),
            }),
            timeout: None,
        }
    }

    /// Dismiss any prompt left unanswered for `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|timeout| Instant::now() + timeout)
    }
}

impl TerminalIo {
    fn header(&mut self, title: &str, text: &str) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "== {} ==", title)?;
        if !text.is_empty() {
            writeln!(self.output, "{}", text)?;
        }
        Ok(())
    }

    /// `None` when the prompt was dismissed, timed out, or input ended.
    fn read_answer(
        &mut self,
        deadline: Option<Instant>,
        echo: bool,
    ) -> io::Result<Option<String>> {
        let reply = match &mut self.input {
            Input::Lines(feed) => feed.next(deadline)?,
            Input::Keys => {
                let reply = read_keys(deadline, echo, self.output.as_mut())?;
                writeln!(self.output)?;
                reply
            }
        };

        match reply {
            Reply::Text(text) => Ok(Some(text)),
            Reply::Dismissed => Ok(None),
            Reply::TimedOut => {
                info!("prompt timed out, treating as dismissed");
                writeln!(self.output, "(timed out)")?;
                self.output.flush()?;
                Ok(None)
            }
        }
    }

    fn confirm(
        &mut self,
        title: &str,
        text: &str,
        deadline: Option<Instant>,
    ) -> io::Result<Option<bool>> {
        self.header(title, text)?;
        loop {
            write!(self.output, "Approve? [y/N] ")?;
            self.output.flush()?;

            let Some(answer) = self.read_answer(deadline, true)? else {
                return Ok(None);
            };
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "" | "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    fn password(
        &mut self,
        title: &str,
        text: &str,
        deadline: Option<Instant>,
    ) -> io::Result<Option<Secret>> {
        self.header(title, "")?;
        write!(self.output, "{}: ", text)?;
        self.output.flush()?;

        Ok(self.read_answer(deadline, false)?.map(Secret::new))
    }

    fn entry(
        &mut self,
        title: &str,
        text: &str,
        deadline: Option<Instant>,
    ) -> io::Result<Option<String>> {
        self.header(title, "")?;
        write!(self.output, "{}: ", text)?;
        self.output.flush()?;

        self.read_answer(deadline, true)
    }

    fn select(
        &mut self,
        title: &str,
        text: &str,
        items: &[String],
        deadline: Option<Instant>,
    ) -> io::Result<Option<usize>> {
        if items.is_empty() {
            return Ok(None);
        }

        self.header(title, text)?;
        for (i, item) in items.iter().enumerate() {
            writeln!(self.output, "  [{}] {}", i + 1, item)?;
        }

        loop {
            write!(self.output, "Select 1-{} (empty to cancel): ", items.len())?;
            self.output.flush()?;

            let Some(answer) = self.read_answer(deadline, true)? else {
                return Ok(None);
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(None);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(
                    self.output,
                    "Please enter a number between 1 and {}.",
                    items.len()
                )?,
            }
        }
    }

    fn message(&mut self, kind: MessageKind, title: &str, text: &str) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "[{}] {}", kind, title)?;
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }
}

/// Leaves raw mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Read keys until Enter. Escape or Ctrl+C dismisses.
fn read_keys(deadline: Option<Instant>, echo: bool, output: &mut dyn Write) -> io::Result<Reply> {
    let _raw = RawModeGuard::enable()?;
    let mut buffer = String::new();

    loop {
        if let Some(deadline) = deadline {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() || !event::poll(left)? {
                return Ok(Reply::TimedOut);
            }
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(Reply::Text(buffer)),
            KeyCode::Esc => return Ok(Reply::Dismissed),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(Reply::Dismissed);
            }
            KeyCode::Backspace => {
                if buffer.pop().is_some() && echo {
                    write!(output, "\x08 \x08")?;
                    output.flush()?;
                }
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                if echo {
                    write!(output, "{}", c)?;
                    output.flush()?;
                }
            }
            _ => {}
        }
    }
}

fn log_failure<T>(e: io::Error) -> Option<T> {
    warn!("terminal prompt failed: {}", e);
    None
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, title: &str, text: &str) -> Option<bool> {
        let deadline = self.deadline();
        self.io
            .lock()
            .confirm(title, text, deadline)
            .unwrap_or_else(log_failure)
    }

    fn password(&self, title: &str, text: &str) -> Option<Secret> {
        let deadline = self.deadline();
        self.io
            .lock()
            .password(title, text, deadline)
            .unwrap_or_else(log_failure)
    }

    fn entry(&self, title: &str, text: &str) -> Option<String> {
        let deadline = self.deadline();
        self.io
            .lock()
            .entry(title, text, deadline)
            .unwrap_or_else(log_failure)
    }

    fn select(&self, title: &str, text: &str, items: &[String]) -> Option<usize> {
        let deadline = self.deadline();
        self.io
            .lock()
            .select(title, text, items, deadline)
            .unwrap_or_else(log_failure)
    }

    fn message(&self, kind: MessageKind, title: &str, text: &str) {
        if let Err(e) = self.io.lock().message(kind, title, text) {
            warn!("terminal output failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::sync::Arc;

    use serde_json::json;
    use signet_core::handler::ApproveExport;
    use signet_core::{Handler, HandlerContext, Params};

    /// Output sink that can be inspected after the prompter took ownership.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    /// Input where nobody ever types; reads block until the sender is dropped.
    struct Silent(mpsc::Receiver<()>);

    impl Read for Silent {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    fn prompter(input: &str) -> (TerminalPrompter, Shared) {
        let output = Shared::default();
        let prompter = TerminalPrompter::new(Cursor::new(input.to_string()), output.clone());
        (prompter, output)
    }

    fn silent_prompter(timeout: Duration) -> (TerminalPrompter, Shared, mpsc::Sender<()>) {
        let (keep_open, rx) = mpsc::channel();
        let output = Shared::default();
        let prompter =
            TerminalPrompter::new(BufReader::new(Silent(rx)), output.clone()).with_timeout(timeout);
        (prompter, output, keep_open)
    }

    #[test]
    fn test_confirm_answers() {
        let (p, _) = prompter("y\nNO\n\nmaybe\nyes\n");
        assert_eq!(p.confirm("Transaction", "send 1 wei"), Some(true));
        assert_eq!(p.confirm("Transaction", "send 1 wei"), Some(false));
        assert_eq!(p.confirm("Transaction", "send 1 wei"), Some(false));
        assert_eq!(p.confirm("Transaction", "send 1 wei"), Some(true));
        assert_eq!(p.confirm("Transaction", "send 1 wei"), None);
    }

    #[test]
    fn test_confirm_writes_the_request() {
        let (p, output) = prompter("n\n");
        p.confirm("Sign data", "-- Request --\n  *  from : 0xabc");
        let text = output.text();
        assert!(text.contains("== Sign data =="));
        assert!(text.contains("  *  from : 0xabc"));
        assert!(text.contains("Approve? [y/N]"));
    }

    #[test]
    fn test_password_line() {
        let (p, output) = prompter("correct horse\r\n");
        let password = p.password("Password", "Enter password");
        assert_eq!(password, Some(Secret::new("correct horse")));
        assert_eq!(p.password("Password", "Enter password"), None);
        assert!(output.text().contains("Enter password: "));
        assert!(!output.text().contains("correct horse"));
    }

    #[test]
    fn test_confirm_with_password() {
        let (p, _) = prompter("y\nhunter2\n");
        let (approved, password) = p.confirm_with_password("Transaction", "");
        assert!(approved);
        assert_eq!(password, Some(Secret::new("hunter2")));
    }

    #[test]
    fn test_entry() {
        let (p, output) = prompter("my label  \n");
        assert_eq!(p.entry("New account", "Label").as_deref(), Some("my label  "));
        assert_eq!(p.entry("New account", "Label"), None);
        assert!(output.text().contains("Label: "));
    }

    #[test]
    fn test_select() {
        let (p, output) = prompter("0\nthree\n2\n\n");
        let items = vec!["0xaaa".to_string(), "0xbbb".to_string()];

        assert_eq!(p.select("Pick account", "Accounts", &items), Some(1));
        assert_eq!(p.select("Pick account", "Accounts", &items), None);

        let text = output.text();
        assert!(text.contains("  [1] 0xaaa\n  [2] 0xbbb\n"));
        assert!(text.contains("Select 1-2 (empty to cancel): "));
        assert_eq!(text.matches("Please enter a number between 1 and 2.").count(), 2);
    }

    #[test]
    fn test_select_from_nothing_is_dismissed() {
        let (p, output) = prompter("1\n");
        assert_eq!(p.select("Pick account", "Accounts", &[]), None);
        assert!(output.text().is_empty());
    }

    #[test]
    fn test_answer_within_timeout() {
        let (p, _) = prompter("y\n");
        let p = p.with_timeout(Duration::from_secs(30));
        assert_eq!(p.confirm("Transaction", ""), Some(true));
    }

    #[test]
    fn test_unanswered_prompt_times_out() {
        let (p, output, _keep_open) = silent_prompter(Duration::from_millis(50));

        let started = Instant::now();
        assert_eq!(p.confirm("Transaction", "send 1 wei"), None);
        assert!(p.password("Password", "Enter password").is_none());
        assert_eq!(p.select("Pick", "", &["a".to_string()]), None);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(output.text().matches("(timed out)").count(), 3);
    }

    #[test]
    fn test_timed_out_approval_is_declined() {
        let (p, _, _keep_open) = silent_prompter(Duration::from_millis(50));
        let ctx = HandlerContext::new(Arc::new(p));

        let result = ApproveExport.call(&ctx, Params::new()).unwrap();
        assert_eq!(result, json!({"approved": false}));
    }

    #[test]
    fn test_message() {
        let (p, output) = prompter("");
        p.message(MessageKind::Error, "Signer error", "account locked");
        let text = output.text();
        assert!(text.contains("[error] Signer error"));
        assert!(text.contains("account locked"));
    }
}
