//! Command parsing and dispatch for the line-oriented front end.

use usertable_core::{RecordKey, SyncError, TableView};

use crate::render;

pub const HELP: &str = "\
Commands:
  list                  show the current page
  page <n> | next | prev
  size <n>              rows per page
  edit <key>            open a row for editing
  set <field> <value>   change name, age or address in the open row
  save                  save the open row
  cancel                discard the open row's changes
  delete <key>          delete a row
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Page(usize),
    Next,
    Prev,
    Size(usize),
    Edit(RecordKey),
    Set { field: String, value: String },
    Save,
    Cancel,
    Delete(RecordKey),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "" | "list" | "ls" => Ok(Command::List),
            "page" => parse_number(rest).map(Command::Page),
            "next" => Ok(Command::Next),
            "prev" => Ok(Command::Prev),
            "size" => parse_number(rest).map(Command::Size),
            "edit" => parse_key(rest).map(Command::Edit),
            "set" => match rest.split_once(char::is_whitespace) {
                Some((field, value)) => Ok(Command::Set {
                    field: field.to_string(),
                    value: value.trim().to_string(),
                }),
                None if !rest.is_empty() => Ok(Command::Set {
                    field: rest.to_string(),
                    value: String::new(),
                }),
                None => Err("usage: set <field> <value>".to_string()),
            },
            "save" => Ok(Command::Save),
            "cancel" => Ok(Command::Cancel),
            "delete" | "rm" => parse_key(rest).map(Command::Delete),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command: {} (try 'help')", other)),
        }
    }
}

fn parse_number(s: &str) -> Result<usize, String> {
    s.parse::<usize>()
        .map_err(|_| format!("expected a number, got {:?}", s))
}

fn parse_key(s: &str) -> Result<RecordKey, String> {
    s.parse::<u64>()
        .map(RecordKey)
        .map_err(|_| format!("expected a row key, got {:?}", s))
}

/// Run one command against the table. Returns false when the user quits.
pub fn execute(view: &mut TableView, command: Command) -> bool {
    let editing = view.sync().current_edit().map(|(key, _)| key);
    let result: Result<(), SyncError> = match command {
        Command::List => Ok(()),
        Command::Page(page) => {
            view.go_to_page(page);
            Ok(())
        }
        Command::Next => {
            view.next_page();
            Ok(())
        }
        Command::Prev => {
            view.prev_page();
            Ok(())
        }
        Command::Size(size) => {
            view.set_page_size(size);
            Ok(())
        }
        Command::Edit(key) => view.sync_mut().begin_edit(key),
        Command::Set { field, value } => match editing {
            Some(key) => view.sync_mut().update_draft(key, &field, &value),
            None => {
                println!("Nothing is being edited (use 'edit <key>')");
                return true;
            }
        },
        Command::Save => match editing {
            Some(key) => view.sync_mut().save_edit(key).map(|request| {
                println!("Saved row {} locally, sending {}", key, request);
            }),
            None => {
                println!("Nothing is being edited");
                return true;
            }
        },
        Command::Cancel => {
            if view.sync_mut().cancel_edit().is_none() {
                println!("Nothing is being edited");
            }
            Ok(())
        }
        Command::Delete(key) => view.sync_mut().delete_record(key).map(|request| {
            println!("Deleting row {} ({})", key, request);
        }),
        Command::Help => {
            println!("{}", HELP);
            return true;
        }
        Command::Quit => return false,
    };

    match result {
        Ok(()) => print!("{}", render::table(view)),
        Err(e) => println!("Error: {}", e),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(""), Ok(Command::List));
        assert_eq!(Command::parse("page 2"), Ok(Command::Page(2)));
        assert_eq!(Command::parse("EDIT 3"), Ok(Command::Edit(RecordKey(3))));
        assert_eq!(Command::parse("rm 4"), Ok(Command::Delete(RecordKey(4))));
        assert_eq!(
            Command::parse("set address  London, Park Lane no. 1 "),
            Ok(Command::Set {
                field: "address".to_string(),
                value: "London, Park Lane no. 1".to_string(),
            })
        );
        assert_eq!(
            Command::parse("set name"),
            Ok(Command::Set {
                field: "name".to_string(),
                value: String::new(),
            })
        );
        assert_eq!(Command::parse("q"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("page two").is_err());
        assert!(Command::parse("edit").is_err());
        assert!(Command::parse("set").is_err());
        assert!(Command::parse("frobnicate").unwrap_err().contains("unknown command"));
    }
}
