//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Builder for creating a [`FileMaker Session`](crate::Session)
//!

use std::default::Default;
use std::env;
use std::result::Result;
use std::time::Duration;

use crate::error::{config_err, ia_err, FMError};
use crate::session::Session;
use reqwest::Client;

/// Builder used to set all the parameters to create a [`FileMaker Session`](crate::Session).
///
/// A session needs a host, a database name and a username (the password may be empty).
/// These are checked when [`build()`](SessionBuilder::build()) or
/// [`resume()`](SessionBuilder::resume()) is called, before any network traffic.
#[derive(Default, Debug, Clone)]
pub struct SessionBuilder {
    pub(crate) protocol: String,
    pub(crate) host: String,
    pub(crate) database: String,
    pub(crate) credentials: Credentials,
    pub(crate) token: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) client: Option<Client>,
    pub(crate) accept_invalid_certs: bool,
    // For error messaging
    pub(crate) from_environment: bool,
}

#[derive(Default, Clone)]
pub(crate) struct Credentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

// never print the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

impl SessionBuilder {
    /// Create a new, empty SessionBuilder.
    ///
    /// Consider calling [`from_environment()`](SessionBuilder::from_environment()) to
    /// collect all parameters from the local environment.
    pub fn new() -> Self {
        SessionBuilder {
            protocol: "https://".to_string(),
            ..Default::default()
        }
    }
    /// Log in and build a new [`Session`].
    ///
    /// This sends `POST .../sessions` using the configured username and password, and
    /// keeps the returned access token for all later calls.
    ///
    /// Note: Internally, if the [`SessionBuilder`] contains
    /// a reference to an existing [`reqwest::Client`], it will clone and
    /// use that. Otherwise, it will create a new [`reqwest::Client`] for its
    /// own internal use. See [`reqwest_client()`](SessionBuilder::reqwest_client()).
    pub async fn build(self) -> Result<Session, FMError> {
        Session::login(&self).await
    }
    /// Build a [`Session`] around an existing access token without contacting the host.
    ///
    /// The token must have been given with [`token()`](SessionBuilder::token()). It is not
    /// validated: if it has expired, the first request made with the session will fail.
    pub fn resume(self) -> Result<Session, FMError> {
        let token = match &self.token {
            Some(t) if !t.is_empty() => t.clone(),
            _ => {
                if self.from_environment {
                    return config_err!("cannot resume session: no token given. set FILEMAKER_TOKEN environment.");
                }
                return config_err!("cannot resume session: no token given. call SessionBuilder::token()");
            }
        };
        Session::new(&self, token)
    }
    /// Gather configuration settings from the current environment.
    ///
    /// This method will scan the process [`standard environment`](std::env::Vars) to collect and
    /// set the configuration parameters. The values can be overridden in code if this method is
    /// called first and other methods are called afterwards, for example:
    ///```no_run
    /// # use filemaker_rust_sdk::Session;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    ///   let session = Session::builder()
    ///       .from_environment()?
    ///       .database("Contacts")?
    ///       .build()
    ///       .await?;
    /// # Ok(())
    /// # }
    ///```
    /// The following environment variables are used:
    ///
    /// | variable | description |
    /// | -------- | ----------- |
    /// | `FILEMAKER_HOST` | The host to connect to. See [`SessionBuilder::host()`]. |
    /// | `FILEMAKER_DATABASE` | The database name. See [`SessionBuilder::database()`]. |
    /// | `FILEMAKER_USERNAME` | The account name to log in with. |
    /// | `FILEMAKER_PASSWORD` | The password for the account. |
    /// | `FILEMAKER_CREDENTIALS_FILE` | Path to a username/password file (see [`SessionBuilder::credentials_from_file()`]). Used when `FILEMAKER_USERNAME` is not set. |
    /// | `FILEMAKER_TOKEN` | An existing access token, for use with [`SessionBuilder::resume()`]. |
    /// | `FILEMAKER_ACCEPT_INVALID_CERTS` | If this is set to `1` or `true`, do not check certificates (see [`SessionBuilder::danger_accept_invalid_certs()`]). |
    ///
    pub fn from_environment(mut self) -> Result<Self, FMError> {
        self.from_environment = true;
        if let Ok(val) = env::var("FILEMAKER_HOST") {
            self = self.host(&val)?;
        }
        if let Ok(val) = env::var("FILEMAKER_DATABASE") {
            self = self.database(&val)?;
        }
        if let Ok(user) = env::var("FILEMAKER_USERNAME") {
            let pass = env::var("FILEMAKER_PASSWORD").unwrap_or_default();
            self = self.credentials(&user, &pass)?;
        } else if let Ok(fname) = env::var("FILEMAKER_CREDENTIALS_FILE") {
            self = self.credentials_from_file(&fname)?;
        }
        if let Ok(val) = env::var("FILEMAKER_TOKEN") {
            self = self.token(&val)?;
        }
        if let Ok(val) = env::var("FILEMAKER_ACCEPT_INVALID_CERTS") {
            let lv = val.to_lowercase();
            if lv == "true" || lv == "1" {
                self = self.danger_accept_invalid_certs(true)?;
            }
        }
        Ok(self)
    }
    /// Set the FileMaker host to connect to.
    ///
    /// The host may carry an explicit `http://` or `https://` scheme, which is kept.
    /// Without one, `https://` is used. A port may be given as usual.
    ///
    /// Examples:
    /// ```text
    ///     fms.example.com
    ///     https://fms.example.com
    ///     http://localhost:8080
    /// ```
    pub fn host(mut self, host: &str) -> Result<Self, FMError> {
        let host = host.trim();
        if let Some(h) = host.strip_prefix("https://") {
            self.protocol = "https://".to_string();
            self.host = h.to_string();
        } else if let Some(h) = host.strip_prefix("http://") {
            self.protocol = "http://".to_string();
            self.host = h.to_string();
        } else {
            self.protocol = "https://".to_string();
            self.host = host.to_string();
        }
        while self.host.ends_with('/') {
            self.host.pop();
        }
        Ok(self)
    }
    /// Set the name of the hosted database (the file name without `.fmp12`).
    pub fn database(mut self, database: &str) -> Result<Self, FMError> {
        self.database = database.to_string();
        Ok(self)
    }
    /// Specify the account name and password used to log in.
    pub fn credentials(mut self, username: &str, password: &str) -> Result<Self, FMError> {
        self.credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        Ok(self)
    }
    /// Specify the account name and password from a local file.
    ///
    /// The format of the file is one value per line, using
    /// a `key=value` pair syntax, such as:
    ///```text
    /// username=admin
    /// password=1234567
    ///```
    pub fn credentials_from_file(self, filename: &str) -> Result<Self, FMError> {
        let mut user = "".to_string();
        let mut pass = "".to_string();
        let data = file_to_string(filename)?;
        // format: one k/v per line, k=v pairs
        for line in data.lines() {
            if let Some((k, v)) = line.split_once('=') {
                match k.trim() {
                    "username" => user = v.trim().to_string(),
                    "password" => pass = v.trim_end_matches('\r').to_string(),
                    _ => {}
                }
            }
        }
        if user.is_empty() {
            return ia_err!("username field missing from credentials file {}", filename);
        }
        self.credentials(&user, &pass)
    }
    /// Specify an existing access token, for use with [`resume()`](SessionBuilder::resume()).
    pub fn token(mut self, token: &str) -> Result<Self, FMError> {
        self.token = Some(token.to_string());
        Ok(self)
    }
    // see https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#method.danger_accept_invalid_certs
    /// Allow https connection without validating certificates.
    ///
    /// **Warning:** This is only recommended for local testing purposes against hosts with
    /// self-signed certificates. Its use is insecure. See [`reqwest::ClientBuilder::danger_accept_invalid_certs()`] for details.
    ///
    pub fn danger_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Result<Self, FMError> {
        self.accept_invalid_certs = accept_invalid_certs;
        Ok(self)
    }
    /// Specify a [`reqwest::Client`] to use for all http/s connections.
    ///
    /// By default, the [`Session`] creates an internal [`reqwest::Client`] to use for
    /// all communications. If your application already has a reqwest Client, you can pass that
    /// into the SessionBuilder to avoid creating multiple connection pools.
    pub fn reqwest_client(mut self, client: &Client) -> Result<Self, FMError> {
        self.client = Some(client.clone());
        Ok(self)
    }
    /// Specify the timeout used for each request.
    ///
    /// The default timeout is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Result<Self, FMError> {
        if timeout.is_zero() {
            return ia_err!("timeout must be greater than zero");
        }
        self.timeout = Some(timeout);
        Ok(self)
    }

    // Missing connection settings are reported before anything is sent.
    pub(crate) fn validate(&self) -> Result<(), FMError> {
        let hint = |var: &str, method: &str| {
            if self.from_environment {
                format!("set {} environment", var)
            } else {
                format!("call SessionBuilder::{}()", method)
            }
        };
        if self.host.is_empty() {
            return config_err!("no host specified: {}", hint("FILEMAKER_HOST", "host"));
        }
        if self.database.is_empty() {
            return config_err!(
                "no database specified: {}",
                hint("FILEMAKER_DATABASE", "database")
            );
        }
        if self.credentials.username.is_empty() {
            return config_err!(
                "no username specified: {}",
                hint("FILEMAKER_USERNAME", "credentials")
            );
        }
        Ok(())
    }
}

fn file_to_string(filename: &str) -> Result<String, FMError> {
    match std::fs::read_to_string(filename) {
        Ok(s) => Ok(s),
        Err(e) => ia_err!("error reading file {}: {}", filename, e.to_string()),
    }
}
