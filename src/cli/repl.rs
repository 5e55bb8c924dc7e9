use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};
use tracing::debug;

use super::commands::{execute, Command, COMMAND_HELP};
use crate::identity::{SessionEvent, SessionStore};

/// Interactive interpreter. Session events raised by a command are handled before the next
/// prompt, so a 401 anywhere ends the session and the prompt says so.
pub fn run_repl(rt: &tokio::runtime::Runtime, store: &SessionStore) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut events = store.api().events().subscribe();
    println!("commission-desk interpreter. Type 'help' for commands.");
    loop {
        let prompt = match store.identity() {
            Some(id) => format!("{}> ", id.email),
            None => "> ".to_string(),
        };
        let line = match rl.readline(&prompt) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() { continue; }
        let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        // Keep passwords out of history.
        if !words[0].eq_ignore_ascii_case("login") {
            if let Err(e) = rl.add_history_entry(line) {
                debug!(target: "commission_desk::cli", "history entry not recorded: {}", e);
            }
        }
        match words[0].to_ascii_lowercase().as_str() {
            "quit" | "exit" => break,
            "help" => { println!("{}", COMMAND_HELP); continue; }
            _ => {}
        }
        match Command::parse(&words) {
            Ok(cmd) => {
                if let Err(e) = rt.block_on(execute(&cmd, store)) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(e) => eprintln!("{}", e),
        }
        drain_events(&mut events, store);
    }
    Ok(())
}

fn drain_events(rx: &mut Receiver<SessionEvent>, store: &SessionStore) {
    let mut ended = false;
    loop {
        match rx.try_recv() {
            Ok(ev) => ended |= store.handle_event(&ev),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    if ended {
        println!("Your session has expired. Please log in again.");
    }
}
