//! Parsing of vault-view commands typed at the prompt.

/// A note reference: a position in the last listing or a raw id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteRef {
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    New,
    Open(NoteRef),
    Close,
    Edit,
    Append(String),
    Tag(Vec<String>),
    Delete(NoteRef),
    Search(String),
    ClearSearch,
    Enhance,
    AutoTag,
    Summary,
    Dismiss,
    Lock,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "type a command, or `help`"),
            Self::Unknown(word) => write!(f, "unknown command `{word}`; try `help`"),
            Self::MissingArgument(usage) => write!(f, "usage: {usage}"),
        }
    }
}

pub const HELP: &str = "\
list                 show notes (filtered by the current search)
new                  create a note and open it
open <n|id>          open a note from the list
close                close the open note
edit                 replace the open note (finish with a lone `.`)
append <text>        add a line to the open note
tag <a, b, ...>      add tags to the open note
delete <n|id>        delete a note (asks first)
search <term>        filter by content or tag
clear                drop the search filter
enhance              AI: rewrite the open note
autotag              AI: suggest tags for the open note
summary              AI: summarize the vault
dismiss              hide the summary
lock                 lock the vault
quit                 exit";

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Err(ParseError::Empty),
        "help" | "?" => Command::Help,
        "list" | "ls" => Command::List,
        "new" => Command::New,
        "open" => Command::Open(parse_ref(rest, "open <n|id>")?),
        "close" | "back" => Command::Close,
        "edit" => Command::Edit,
        "append" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("append <text>"));
            }
            Command::Append(rest.to_string())
        }
        "tag" => {
            let tags: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
            if tags.is_empty() {
                return Err(ParseError::MissingArgument("tag <a, b, ...>"));
            }
            Command::Tag(tags)
        }
        "delete" | "rm" => Command::Delete(parse_ref(rest, "delete <n|id>")?),
        "search" | "find" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("search <term>"));
            }
            Command::Search(rest.to_string())
        }
        "clear" => Command::ClearSearch,
        "enhance" => Command::Enhance,
        "autotag" => Command::AutoTag,
        "summary" | "summarize" => Command::Summary,
        "dismiss" => Command::Dismiss,
        "lock" | "logout" => Command::Lock,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn parse_ref(raw: &str, usage: &'static str) -> Result<NoteRef, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingArgument(usage));
    }
    Ok(match raw.parse::<usize>() {
        Ok(index) => NoteRef::Index(index),
        Err(_) => NoteRef::Id(raw.to_string()),
    })
}
