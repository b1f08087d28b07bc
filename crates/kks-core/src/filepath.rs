use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::command::quote;
use crate::error::{KakError, Result};

/// Kakoune-style position argument: `+line` or `+line:column`
static POSITION_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+(\d+)(?::(\d+))?$").expect("Invalid POSITION_ARG regex"));

/// A file to open, with an optional position. `0` means unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filepath {
    pub name: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl Filepath {
    /// Parse `name`, `name:line` or `name:line:column`
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = |reason| KakError::MalformedTarget {
            input: input.to_string(),
            reason,
        };

        let mut parts = input.split(':');
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed("empty file name"));
        }

        let number = |segment: Option<&str>| -> Result<u32> {
            match segment {
                None => Ok(0),
                Some(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                    s.parse().map_err(|_| malformed("position out of range"))
                }
                Some(_) => Err(malformed("line and column must be numbers")),
            }
        };
        let line = number(parts.next())?;
        let column = number(parts.next())?;

        if parts.next().is_some() {
            return Err(malformed("expected file[:line[:column]]"));
        }

        Ok(Self {
            name: PathBuf::from(name),
            line,
            column,
        })
    }

    /// Build from command-line arguments: one file, optionally followed or
    /// preceded by a `+line[:column]` argument that overrides any position
    /// in the file argument.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let joined = || {
            args.iter()
                .map(|a| a.as_ref())
                .collect::<Vec<&str>>()
                .join(" ")
        };

        let mut file: Option<Filepath> = None;
        let mut position = None;

        for arg in args {
            let arg: &str = arg.as_ref();
            if let Some(caps) = POSITION_ARG.captures(arg) {
                if position.is_some() {
                    return Err(KakError::MalformedTarget {
                        input: joined(),
                        reason: "more than one position",
                    });
                }
                let number = |i: usize| -> Result<u32> {
                    caps.get(i).map_or(Ok(0), |m| {
                        m.as_str().parse().map_err(|_| KakError::MalformedTarget {
                            input: arg.to_string(),
                            reason: "position out of range",
                        })
                    })
                };
                position = Some((number(1)?, number(2)?));
            } else if file.is_some() {
                return Err(KakError::MalformedTarget {
                    input: joined(),
                    reason: "more than one file",
                });
            } else {
                file = Some(Filepath::parse(arg)?);
            }
        }

        let mut file = file.ok_or_else(|| KakError::MalformedTarget {
            input: joined(),
            reason: "no file given",
        })?;
        if let Some((line, column)) = position {
            file.line = line;
            file.column = column;
        }
        Ok(file)
    }

    /// Resolve a relative name against `cwd`; the editor session usually
    /// runs in a different directory than the caller.
    pub fn absolutize(&self, cwd: &Path) -> Self {
        let name = if self.name.is_absolute() {
            self.name.clone()
        } else {
            cwd.join(&self.name)
        };
        Self {
            name,
            ..self.clone()
        }
    }

    /// `+line[:column]` for the editor command line, if a line is set
    pub fn position_arg(&self) -> Option<String> {
        match (self.line, self.column) {
            (0, _) => None,
            (line, 0) => Some(format!("+{}", line)),
            (line, column) => Some(format!("+{}:{}", line, column)),
        }
    }

    /// Command opening the file in a running client
    pub fn edit_command(&self) -> String {
        let mut command = format!("edit -existing {}", quote(&self.name.to_string_lossy()));
        if self.line > 0 {
            command.push_str(&format!(" {}", self.line));
            if self.column > 0 {
                command.push_str(&format!(" {}", self.column));
            }
        }
        command
    }
}
