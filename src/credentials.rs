//! Flat-file login for the report flow.
//!
//! The file is a headerless `id,password` CSV compared with plain string
//! equality. It only keeps casual users out; it is not a security boundary.

use std::collections::HashMap;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Who is running the current report flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

#[derive(Debug, Default)]
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut users = HashMap::new();
        for result in rdr.records() {
            let row = result?;
            // Malformed lines are ignored rather than rejected
            if row.len() != 2 {
                continue;
            }
            users.insert(row[0].to_string(), row[1].to_string());
        }
        debug!(path = %path.display(), users = users.len(), "loaded credentials");
        Ok(Self { users })
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn authenticate(&self, user_id: &str, password: &str) -> Result<Session> {
        match self.users.get(user_id) {
            Some(expected) if expected == password => {
                info!(user_id, "login succeeded");
                Ok(Session {
                    user_id: user_id.to_string(),
                })
            }
            _ => Err(Error::AuthenticationFailed),
        }
    }
}
