//! Command-line protocol parsing
//!
//! A command is one line split on single spaces into at most three fields;
//! the third field keeps the rest of the line, spaces included.
//!
//! | Command     | Fields     |
//! |-------------|------------|
//! | `name X`    | exactly 2  |
//! | `sub X`     | exactly 2  |
//! | `unsub X`   | exactly 2  |
//! | `pub X V`   | 3, V non-empty |
//!
//! `X` must be a valid token (see [`is_valid_token`]).

use crate::utils::ProtocolError;

const MAX_FIELDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Name(&'a str),
    Sub(&'a str),
    Unsub(&'a str),
    Pub { topic: &'a str, value: &'a str },
}

/// A token is non-empty and contains no space, colon or newline.
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && !token.contains([' ', ':', '\n'])
}

fn token(field: &str) -> Result<&str, ProtocolError> {
    if is_valid_token(field) {
        Ok(field)
    } else {
        Err(ProtocolError::InvalidToken(field.to_string()))
    }
}

/// Parses one command line (without its trailing newline).
pub fn parse(line: &str) -> Result<Command<'_>, ProtocolError> {
    let fields: Vec<&str> = line.splitn(MAX_FIELDS, ' ').collect();

    match fields[..] {
        ["name", name] => Ok(Command::Name(token(name)?)),
        ["sub", topic] => Ok(Command::Sub(token(topic)?)),
        ["unsub", topic] => Ok(Command::Unsub(token(topic)?)),
        ["pub", topic, value] => {
            let topic = token(topic)?;
            if value.is_empty() {
                return Err(ProtocolError::EmptyValue);
            }
            Ok(Command::Pub { topic, value })
        }
        [cmd @ ("name" | "sub" | "unsub" | "pub"), ..] => {
            Err(ProtocolError::WrongFieldCount(cmd.to_string()))
        }
        [cmd, ..] => Err(ProtocolError::UnknownCommand(cmd.to_string())),
        [] => Err(ProtocolError::UnknownCommand(String::new())),
    }
}
