//! The user database and the login flow.
//!
//! Credentials live in a colon-separated text file, one user per line:
//! `username:password:home-dir`. The file is read line by line on every
//! lookup and appended to by `adduser`.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use thiserror::Error;

use crate::report;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Could not open {0} file.")]
    Open(String),
    #[error("Could not write to {0} file.")]
    Write(String),
}

/// One line of the credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub password: String,
    pub home: PathBuf,
}

impl UserRecord {
    fn parse(line: &str) -> Option<UserRecord> {
        let mut fields = line.splitn(3, ':');
        let name = fields.next()?;
        let password = fields.next()?;
        let home = fields.next()?.trim_end();
        if name.is_empty() {
            return None;
        }
        Some(UserRecord {
            name: name.to_string(),
            password: password.to_string(),
            home: PathBuf::from(home),
        })
    }
}

/// Handle on the credential file.
#[derive(Debug, Clone)]
pub struct UserDb {
    path: PathBuf,
}

impl UserDb {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UserDb { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_error(&self) -> AuthError {
        AuthError::Open(self.path.display().to_string())
    }

    fn records(&self) -> Result<Vec<UserRecord>, AuthError> {
        let text = fs::read_to_string(&self.path).map_err(|_| self.open_error())?;
        Ok(text.lines().filter_map(UserRecord::parse).collect())
    }

    /// Look `name` up and compare passwords. `Ok(None)` is a failed login.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self
            .records()?
            .into_iter()
            .find(|r| r.name == name && r.password == password))
    }

    pub fn user_exists(&self, name: &str) -> Result<bool, AuthError> {
        Ok(self.records()?.iter().any(|r| r.name == name))
    }

    /// Append one credential line, `name:password:home\n`, verifying the
    /// write landed in full.
    pub fn append(&self, record: &UserRecord) -> Result<(), AuthError> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|_| self.open_error())?;
        let line = format!(
            "{}:{}:{}\n",
            record.name,
            record.password,
            record.home.display()
        );
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|_| AuthError::Write(self.path.display().to_string()))
    }
}

/// Interactive login loop: prompt for a username and password until a pair
/// authenticates. Typing `quit` at the username prompt exits the shell.
pub fn login(db: &UserDb) -> UserRecord {
    loop {
        let Some(name) = read_token("username: ") else {
            process::exit(0);
        };
        if name == "quit" {
            process::exit(0);
        }
        let Some(password) = read_token("password: ") else {
            process::exit(0);
        };

        match db.authenticate(&name, &password) {
            Ok(Some(user)) => return user,
            Ok(None) => {}
            Err(err) => report::reset_state_error(&err.to_string()),
        }
        report::user_error("User Authentication failed. Please try again.");
    }
}

/// Prompt and read one whitespace-delimited token. `None` on EOF.
fn read_token(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut line = String::new();
    loop {
        line.clear();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => return None,
            Ok(_) => {
                if let Some(token) = line.split_whitespace().next() {
                    return Some(token.to_string());
                }
                // Blank line; keep reading like scanf would.
            }
            Err(_) => return None,
        }
    }
}
