//! Interactive lock screen and vault view.
//!
//! # Invariants
//! - Exactly one vault session is open at a time; locking returns the
//!   storage so another code can be unlocked with it.
//! - Save failures are printed as warnings and never end the session.

use crate::command::{parse_command, Command, NoteRef, HELP};
use log::info;
use rvault_core::{
    AccessCode, AiOutcome, AiTextService, Clock, CodeEntry, DeleteOutcome, GeminiClient,
    KeyValueStorage, Note, NoteId, SessionError, SystemClock, VaultSession, UNLOCK_DELAY,
};
use std::io::{self, BufRead, Write};

const EDIT_TERMINATOR: &str = ".";

enum Flow {
    Continue,
    Lock,
    Quit,
}

/// Runs lock screen and vault view until the user quits or input ends.
pub async fn run<S: KeyValueStorage>(storage: S, ai: AiTextService<GeminiClient>) {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut storage = storage;

    loop {
        let Some(code) = lock_screen(&mut input).await else {
            break;
        };
        let session = VaultSession::unlock(storage, &code);
        let mut view = VaultView {
            session,
            ai: &ai,
            search: String::new(),
            listing: Vec::new(),
        };
        println!(
            "\nRV Vault #{}: {} note(s). Type `help` for commands.",
            view.session.code(),
            view.session.notes().len()
        );
        view.print_list();

        let flow = view.run(&mut input).await;
        storage = view.session.lock();
        if matches!(flow, Flow::Quit) {
            break;
        }
    }
    info!("event=cli_exit module=cli status=ok");
}

async fn lock_screen(input: &mut impl BufRead) -> Option<AccessCode> {
    let mut entry = CodeEntry::new();
    println!("\nRV Vault is locked. Enter your 3-digit access code (`<` erases, `quit` exits).");
    loop {
        prompt(&format!("code [{}] ", entry.display()));
        let line = read_line(input)?;
        if line.trim().eq_ignore_ascii_case("quit") {
            return None;
        }
        for ch in line.chars() {
            if ch == '<' {
                entry.backspace();
            } else {
                entry.push_digit(ch);
            }
        }
        if entry.is_complete() {
            println!("code [{}]", entry.display());
            tokio::time::sleep(UNLOCK_DELAY).await;
            return entry.submit().ok();
        }
    }
}

struct VaultView<'a, S: KeyValueStorage> {
    session: VaultSession<S>,
    ai: &'a AiTextService<GeminiClient>,
    search: String,
    /// Ids in the order of the last printed list, for `open <n>`.
    listing: Vec<NoteId>,
}

impl<S: KeyValueStorage> VaultView<'_, S> {
    async fn run(&mut self, input: &mut impl BufRead) -> Flow {
        loop {
            let label = match self.session.active_note() {
                Some(note) => format!("#{} {}> ", self.session.code(), short_title(note)),
                None => format!("#{}> ", self.session.code()),
            };
            prompt(&label);
            let Some(line) = read_line(input) else {
                return Flow::Quit;
            };
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            };

            let flow = self.handle(command, input).await;
            if let Some(err) = self.session.take_save_warning() {
                println!("warning: change kept in memory but not saved: {err}");
            }
            if !matches!(flow, Flow::Continue) {
                return flow;
            }
        }
    }

    async fn handle(&mut self, command: Command, input: &mut impl BufRead) -> Flow {
        match command {
            Command::Help => println!("{HELP}"),
            Command::List => self.print_list(),
            Command::New => {
                self.session.add_note();
                println!("New note created. Use `edit` or `append` to write.");
            }
            Command::Open(note_ref) => match self.resolve(note_ref) {
                Some(id) => match self.session.select(&id) {
                    Ok(()) => self.print_active(),
                    Err(err) => println!("{err}"),
                },
                None => println!("No such note in the list."),
            },
            Command::Close => self.session.deselect(),
            Command::Edit => self.edit(input),
            Command::Append(text) => self.append(&text),
            Command::Tag(tags) => match self.session.add_tags_to_active(&tags) {
                Ok(added) => println!("{added} tag(s) added."),
                Err(err) => println!("{err}"),
            },
            Command::Delete(note_ref) => self.delete(note_ref, input),
            Command::Search(term) => {
                self.search = term;
                self.print_list();
            }
            Command::ClearSearch => {
                self.search.clear();
                self.print_list();
            }
            Command::Enhance => {
                println!("Processing...");
                match self.session.enhance_active(self.ai).await {
                    Ok(AiOutcome::Applied) => self.print_active(),
                    Ok(AiOutcome::Skipped) => println!("Nothing to enhance yet."),
                    Ok(AiOutcome::Discarded) => println!("The note was deleted meanwhile."),
                    Err(SessionError::Ai(err)) => println!("Failed to enhance note: {err}"),
                    Err(err) => println!("{err}"),
                }
            }
            Command::AutoTag => {
                println!("Processing...");
                match self.session.tag_active(self.ai).await {
                    Ok(AiOutcome::Applied) => self.print_active(),
                    Ok(AiOutcome::Skipped) => println!("Nothing to tag yet."),
                    Ok(AiOutcome::Discarded) => println!("The note was deleted meanwhile."),
                    Err(err) => println!("{err}"),
                }
            }
            Command::Summary => {
                println!("Thinking...");
                match self.session.summarize(self.ai).await {
                    Ok(AiOutcome::Skipped) => println!("No notes long enough to summarize."),
                    Ok(_) => self.print_summary(),
                    Err(err) => println!("{err}"),
                }
            }
            Command::Dismiss => self.session.dismiss_summary(),
            Command::Lock => return Flow::Lock,
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn edit(&mut self, input: &mut impl BufRead) {
        if self.session.active_note().is_none() {
            println!("{}", SessionError::NoActiveNote);
            return;
        }
        println!("Enter the new text. Finish with a line containing only `{EDIT_TERMINATOR}`.");
        let mut lines = Vec::new();
        while let Some(line) = read_line(input) {
            if line == EDIT_TERMINATOR {
                break;
            }
            lines.push(line);
        }
        match self.session.edit_active(lines.join("\n")) {
            Ok(()) => self.print_active(),
            Err(err) => println!("{err}"),
        }
    }

    fn append(&mut self, text: &str) {
        let Some(note) = self.session.active_note() else {
            println!("{}", SessionError::NoActiveNote);
            return;
        };
        let content = if note.content.is_empty() {
            text.to_string()
        } else {
            format!("{}\n{text}", note.content)
        };
        if let Err(err) = self.session.edit_active(content) {
            println!("{err}");
        }
    }

    fn delete(&mut self, note_ref: NoteRef, input: &mut impl BufRead) {
        let Some(id) = self.resolve(note_ref) else {
            println!("No such note in the list.");
            return;
        };
        let outcome = self.session.delete_note(&id, |note| {
            prompt(&format!(
                "Are you sure you want to delete \"{}\"? [y/N] ",
                short_title(note)
            ));
            read_line(input)
                .map(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
                .unwrap_or(false)
        });
        match outcome {
            DeleteOutcome::Deleted => {
                self.listing.retain(|listed| listed != &id);
                println!("Note deleted.");
            }
            DeleteOutcome::Declined => println!("Kept."),
            DeleteOutcome::NotFound => println!("No such note."),
        }
    }

    fn resolve(&self, note_ref: NoteRef) -> Option<NoteId> {
        match note_ref {
            NoteRef::Index(index) => index
                .checked_sub(1)
                .and_then(|position| self.listing.get(position))
                .cloned(),
            NoteRef::Id(id) => Some(id),
        }
    }

    fn print_list(&mut self) {
        let active = self.session.active_id().map(str::to_string);
        let notes = self.session.filter(&self.search);
        self.listing = notes.iter().map(|note| note.id.clone()).collect();

        if !self.search.is_empty() {
            println!("Search: \"{}\"", self.search);
        }
        if notes.is_empty() {
            println!("No notes found.");
            return;
        }
        for (position, note) in notes.iter().enumerate() {
            let marker = if active.as_deref() == Some(note.id.as_str()) {
                '*'
            } else {
                ' '
            };
            let tags = note
                .tags
                .iter()
                .map(|tag| format!("#{tag}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{marker}{:>3}. {} {tags}", position + 1, short_title(note));
        }
        self.print_summary();
    }

    fn print_active(&self) {
        let Some(note) = self.session.active_note() else {
            return;
        };
        println!("----------------------------------------");
        if note.content.is_empty() {
            println!("(empty)");
        } else {
            println!("{}", note.content);
        }
        println!("----------------------------------------");
        if !note.tags.is_empty() {
            println!("tags: {}", note.tags.join(", "));
        }
        println!("last edited: {}", edited_ago(note));
    }

    fn print_summary(&self) {
        if let Some(summary) = self.session.summary() {
            println!("\nSummary: {summary}\n(`dismiss` to hide)");
        }
    }
}

fn short_title(note: &Note) -> String {
    const MAX_TITLE_CHARS: usize = 40;
    let title = note.title();
    if title.is_empty() {
        return "Empty Note".to_string();
    }
    let mut short: String = title.chars().take(MAX_TITLE_CHARS).collect();
    if title.chars().count() > MAX_TITLE_CHARS {
        short.push_str("...");
    }
    short
}

fn edited_ago(note: &Note) -> String {
    format_age(SystemClock.now_ms().saturating_sub(note.updated_at))
}

/// Renders an age in milliseconds; negative ages read as "just now".
fn format_age(elapsed_ms: i64) -> String {
    let seconds = elapsed_ms.max(0) / 1000;
    match seconds {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{} min ago", seconds / 60),
        3600..=86_399 => format!("{} h ago", seconds / 3600),
        _ => format!("{} day(s) ago", seconds / 86_400),
    }
}

fn prompt(label: &str) {
    print!("{label}");
    let _ = io::stdout().flush();
}

/// Reads one line without its terminator; `None` at end of input.
fn read_line(input: &mut impl BufRead) -> Option<String> {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}
