//! # Startup Configuration
//!
//! Parses the positional startup parameters into a [`StoreConfig`].
//!
//! ```text
//! stockroom <db-url> <db-user> <db-pass> [command...]
//!            │        │         │         │
//!            └────────┴─────────┘         └── returned as `rest`
//!                 StoreConfig
//! ```
//!
//! Parameters are validated for presence only.

use std::fmt;

use crate::error::{ClassifiedError, CoreResult};

/// Usage line reported when parameters are missing.
pub const USAGE: &str = "Usage: stockroom <db-url> <db-user> <db-pass> [command]";

/// Store endpoint and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store endpoint URL, e.g. `sqlite://./stockroom.db`.
    pub db_url: String,
    pub db_user: String,
    pub db_pass: String,
}

impl StoreConfig {
    pub fn new(
        db_url: impl Into<String>,
        db_user: impl Into<String>,
        db_pass: impl Into<String>,
    ) -> Self {
        StoreConfig {
            db_url: db_url.into(),
            db_user: db_user.into(),
            db_pass: db_pass.into(),
        }
    }

    /// Parses the arguments that follow the program name.
    ///
    /// ## Returns
    /// * `Ok((config, rest))` - the config and any remaining arguments
    /// * `Err(ClassifiedError::Argument)` - fewer than three arguments
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::StoreConfig;
    ///
    /// let args = ["sqlite::memory:", "admin", "secret", "list"].map(String::from);
    /// let (config, rest) = StoreConfig::parse(args).unwrap();
    /// assert_eq!(config.db_user, "admin");
    /// assert_eq!(rest, vec!["list".to_string()]);
    /// ```
    pub fn parse<I>(args: I) -> CoreResult<(Self, Vec<String>)>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        match (args.next(), args.next(), args.next()) {
            (Some(url), Some(user), Some(pass)) => {
                Ok((StoreConfig::new(url, user, pass), args.collect()))
            }
            _ => Err(ClassifiedError::argument(USAGE)),
        }
    }
}

// The password never reaches logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("db_url", &self.db_url)
            .field("db_user", &self.db_user)
            .field("db_pass", &"***")
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
