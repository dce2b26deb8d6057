//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder};

use crate::envelope::{Envelope, Operation, ResponseBody};
use crate::error::{ia_err, user_agent};
use crate::error::{FMError, FMErrorCode};
use crate::find_request::FindCommand;
use crate::record::Record;
use crate::session_builder::SessionBuilder;

use std::result::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// **An authenticated connection to one hosted FileMaker database**.
///
/// A session is created by logging in with [`Session::open()`] (or
/// [`SessionBuilder::build()`]), or by wrapping an existing access token with
/// [`Session::resume()`]. The token is fixed for the life of the session, and is
/// released on the host with [`Session::close()`].
///
/// Note: there is no need to enclose this struct in an `Rc` or [`Arc`], as it uses an
/// [`Arc`] internally, so calling `.clone()` on this struct will always return the
/// same underlying session. Every [`Record`] returned by a session holds such a clone.
///
/// A session may be used from several tasks at once, but nothing orders a
/// [`close()`](Session::close()) against requests still in flight on other tasks.
#[derive(Clone, Debug)]
pub struct Session {
    // Use an inner Arc so cloning keeps the same contents
    pub(crate) inner: Arc<SessionRef>,
}

pub(crate) struct SessionRef {
    pub(crate) client: reqwest::Client,
    pub(crate) protocol: String,
    pub(crate) host: String,
    pub(crate) database: String,
    pub(crate) username: String,
    password: String,
    token: String,
    timeout: Duration,
}

// never print the password or token
impl std::fmt::Debug for SessionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Session {
    /// Create a new [`SessionBuilder`].
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Log in to `database` on `host` and return the new session.
    ///
    /// `host` may carry an `http://` or `https://` prefix; `https://` is used otherwise.
    /// Missing host, database or username is reported as
    /// [`Config`](FMErrorCode::Config) before any request is sent. A login refused by
    /// the host is reported as [`Host`](FMErrorCode::Host).
    ///
    ///```no_run
    /// # use filemaker_rust_sdk::Session;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::open("fms.example.com", "Contacts", "admin", "secret").await?;
    /// // ... use the session ...
    /// session.close().await?;
    /// # Ok(())
    /// # }
    ///```
    pub async fn open(
        host: &str,
        database: &str,
        username: &str,
        password: &str,
    ) -> Result<Session, FMError> {
        SessionBuilder::new()
            .host(host)?
            .database(database)?
            .credentials(username, password)?
            .build()
            .await
    }

    /// Build a session around an access token obtained earlier, without contacting the host.
    ///
    /// The token is not validated here.
    pub fn resume(
        host: &str,
        database: &str,
        username: &str,
        password: &str,
        token: &str,
    ) -> Result<Session, FMError> {
        SessionBuilder::new()
            .host(host)?
            .database(database)?
            .credentials(username, password)?
            .token(token)?
            .resume()
    }

    // Create the new Session based on builder configuration
    pub(crate) fn new(b: &SessionBuilder, token: String) -> Result<Session, FMError> {
        b.validate()?;
        // default timeout to 30 seconds
        let timeout = b.timeout.unwrap_or(Duration::new(30, 0));
        let c = {
            if let Some(c) = &b.client {
                c.clone()
            } else {
                let mut cb = reqwest::Client::builder()
                    .timeout(timeout)
                    .connect_timeout(timeout);
                if b.accept_invalid_certs {
                    cb = cb.danger_accept_invalid_certs(true);
                }
                cb.build()?
            }
        };
        debug!(
            "Creating new Session: {}{} database={} username={}",
            b.protocol, b.host, b.database, b.credentials.username
        );
        Ok(Session {
            inner: Arc::new(SessionRef {
                client: c,
                protocol: b.protocol.clone(),
                host: b.host.clone(),
                database: b.database.clone(),
                username: b.credentials.username.clone(),
                password: b.credentials.password.clone(),
                token,
                timeout,
            }),
        })
    }

    // Log in with basic auth and wrap the returned token
    pub(crate) async fn login(b: &SessionBuilder) -> Result<Session, FMError> {
        // a session with no token yet, used to build the login url and client
        let s = Session::new(b, String::new())?;
        let url = s.url(&["sessions"])?;
        debug!("POST {}", url);
        let up = format!("{}:{}", s.inner.username, s.inner.password);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", BASE64_STANDARD.encode(up)))?,
        );
        let rb = s
            .base_request(Method::POST, url)?
            .headers(headers)
            .json(&serde_json::json!({}));
        let resp = s.send(rb, Operation::Login).await?;
        let token = match resp.token {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(FMError::new(
                    FMErrorCode::Decode,
                    "login response did not contain an access token",
                ))
            }
        };
        debug!("Logged in to {}{} as {}", s.protocol(), s.host(), s.username());
        Ok(s.with_token(token))
    }

    fn with_token(&self, token: String) -> Session {
        Session {
            inner: Arc::new(SessionRef {
                client: self.inner.client.clone(),
                protocol: self.inner.protocol.clone(),
                host: self.inner.host.clone(),
                database: self.inner.database.clone(),
                username: self.inner.username.clone(),
                password: self.inner.password.clone(),
                token,
                timeout: self.inner.timeout,
            }),
        }
    }

    /// Log out, releasing the access token on the host.
    ///
    /// This sends `DELETE .../sessions/{token}` without an `Authorization` header.
    /// Closing a session twice is not prevented: the host's answer to the second
    /// call (normally an invalid token error) is returned as a
    /// [`Host`](FMErrorCode::Host) error.
    pub async fn close(&self) -> Result<(), FMError> {
        let url = self.url(&["sessions", &self.inner.token])?;
        debug!("DELETE session on {}{}", self.protocol(), self.host());
        let rb = self.base_request(Method::DELETE, url)?;
        self.send(rb, Operation::Logout).await?;
        Ok(())
    }

    /// Find records on `layout` matching `command`.
    ///
    /// A find that matches no records returns an empty vector. See
    /// [`FindCommand::execute()`] for a variant that also returns the found set
    /// information.
    pub async fn find(&self, layout: &str, command: &FindCommand) -> Result<Vec<Record>, FMError> {
        Ok(command.execute(self, layout).await?.into_records())
    }

    /// Fetch a single record by id.
    ///
    /// A record that does not exist is reported as [`NotFound`](FMErrorCode::NotFound).
    pub async fn get_record(&self, layout: &str, id: &str) -> Result<Record, FMError> {
        if layout.is_empty() {
            return ia_err!("no layout specified");
        }
        if id.is_empty() {
            return ia_err!("no record id specified");
        }
        let url = self.url(&["layouts", layout, "records", id])?;
        let rb = self.request(Method::GET, url)?;
        let mut resp = self.send(rb, Operation::GetRecord).await?;
        if resp.data.is_empty() {
            return Err(FMError::new(
                FMErrorCode::NotFound,
                &format!("record {} not returned by host", id),
            ));
        }
        let data = resp.data.swap_remove(0);
        Ok(Record::from_data(self, layout, data))
    }

    /// Create a new, empty record on `layout`, bound to this session.
    ///
    /// Nothing is sent to the host until the record is committed.
    pub fn new_record(&self, layout: &str) -> Record {
        Record::new(self, layout)
    }

    /// The access token of this session.
    pub fn token(&self) -> &str {
        &self.inner.token
    }

    /// The host name (and port, if any), without scheme.
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// The scheme prefix used for all requests: `https://` or `http://`.
    pub fn protocol(&self) -> &str {
        &self.inner.protocol
    }

    pub fn database(&self) -> &str {
        &self.inner.database
    }

    pub fn username(&self) -> &str {
        &self.inner.username
    }

    /// Build `{protocol}{host}/fmi/data/v1/databases/{database}/{segments...}`.
    ///
    /// Each segment is percent-encoded as a single path segment.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, FMError> {
        let mut u = Url::parse(&format!("{}{}", self.inner.protocol, self.inner.host))?;
        match u.path_segments_mut() {
            Ok(mut p) => {
                p.pop_if_empty()
                    .extend(["fmi", "data", "v1", "databases", self.inner.database.as_str()])
                    .extend(segments);
            }
            Err(_) => {
                return ia_err!(
                    "host {} cannot be used as a base url",
                    self.inner.host
                );
            }
        }
        Ok(u)
    }

    // Request with user agent and timeout, but no authorization
    fn base_request(&self, method: Method, url: Url) -> Result<RequestBuilder, FMError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent())?);
        Ok(self
            .inner
            .client
            .request(method, url)
            .timeout(self.inner.timeout)
            .headers(headers))
    }

    /// Request carrying the session's bearer token.
    pub(crate) fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, FMError> {
        debug!("{} {}", method, url);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.inner.token))?,
        );
        Ok(self.base_request(method, url)?.headers(headers))
    }

    /// Send a request, parse the response envelope and classify it.
    pub(crate) async fn send(
        &self,
        rb: RequestBuilder,
        op: Operation,
    ) -> Result<ResponseBody, FMError> {
        let resp = rb.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        Envelope::parse(status, &text)?.check(op)
    }
}
