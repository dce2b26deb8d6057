//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! FileMaker Data API Rust SDK
//!
//! This is a Rust client for the [FileMaker Data API](https://help.claris.com/en/data-api-guide/) (`v1`).
//! It supports logging in and out of a hosted database, finding records, reading
//! and writing field data, creating and deleting records, and uploading files into
//! container fields.
//!
//! This SDK supplies and uses Rust `async` methods throughout, using the [tokio](https://crates.io/crates/tokio) runtime. There is currently no blocking support.
//!
//! The general flow for an application using the SDK is:
//! - Create a [`Session`] by logging in, either with [`Session::open()`] or through a [`SessionBuilder`]
//! - Build a [`FindCommand`] from one or more [`FindRequest`]s and execute it on a layout, receiving [`Record`]s
//! - Read fields with typed getters, or stage changes with [`Record::set()`] and send them with [`Record::commit()`]
//! - Log out with [`Session::close()`]
//!
//! ## Simple Example
//! The following code logs in using values from the current environment, finds some records and
//! updates them.
//! ```no_run
//! use filemaker_rust_sdk::{FindCommand, FindRequest, Session};
//! use std::error::Error;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     let session = Session::builder()
//!         .from_environment()?
//!         .build()
//!         .await?;
//!     let cmd = FindCommand::new()
//!         .request(FindRequest::new().criterion("City", "Boston"))
//!         .with_limit(20);
//!     for mut rec in session.find("Contacts", &cmd).await? {
//!         println!("{} is {} years old", rec.string("Name")?, rec.i64("Age")?);
//!         rec.set("Contacted", 1);
//!         rec.commit().await?;
//!     }
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Installation
//! Add the following dependency to your `Cargo.toml` file:
//! ```text
//! [dependencies]
//! filemaker-rust-sdk = "0.1"
//! ```
//!
//! ## Configuring the SDK
//!
//! A session needs the host (with an optional `http://` or `https://` prefix and port), the
//! database name, and an account name and password with the `fmrest` extended privilege.
//! These can be given in code with [`SessionBuilder`] methods, or collected from the
//! environment with [`SessionBuilder::from_environment()`]:
//!
//! | variable | description |
//! | -------- | ----------- |
//! | `FILEMAKER_HOST` | host, e.g. `https://fms.example.com` |
//! | `FILEMAKER_DATABASE` | database name |
//! | `FILEMAKER_USERNAME` / `FILEMAKER_PASSWORD` | account credentials |
//! | `FILEMAKER_CREDENTIALS_FILE` | file with `username=` and `password=` lines |
//! | `FILEMAKER_TOKEN` | existing access token for [`SessionBuilder::resume()`] |
//! | `FILEMAKER_ACCEPT_INVALID_CERTS` | `true` to skip certificate checks (testing only) |
//!
//! An access token obtained earlier (for example by another process) can be reused without a
//! new login:
//!
//! ```no_run
//! # use filemaker_rust_sdk::Session;
//! # fn run(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::resume("fms.example.com", "Contacts", "admin", "secret", token)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Mapping records into structs
//!
//! Structs deriving [`FMRecord`](derive@FMRecord) can be filled from a record with
//! [`Record::map_to()`]:
//!
//! ```no_run
//! use filemaker_rust_sdk::{FMRecord, FixedOffset, Record};
//!
//! #[derive(Default, Debug, FMRecord)]
//! struct Address {
//!     #[fm(field = "City")]
//!     city: String,
//! }
//!
//! #[derive(Default, Debug, FMRecord)]
//! struct Contact {
//!     #[fm(field = "Name")]
//!     name: String,
//!     #[fm(field = "Age")]
//!     age: Option<i64>,
//!     #[fm(nested)]
//!     address: Address,
//! }
//!
//! # fn run(rec: &Record) -> Result<(), Box<dyn std::error::Error>> {
//! let mut c = Contact::default();
//! rec.map_to(&mut c, &FixedOffset::east_opt(0).unwrap())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! All operations return [`FMError`], classified by [`FMErrorCode`]. Errors reported by the
//! host carry its message code ([`FMError::host_code()`]). A find that matches no records is
//! not an error: it returns an empty result. Requests are never retried by the SDK.
//!
//! ## Logging
//!
//! The SDK logs through [tracing](https://crates.io/crates/tracing): each request's method and
//! URL at `debug` level, and each response's message code at `trace` level. Passwords and
//! tokens are never logged. No subscriber is installed by the SDK.

// the derive macro refers to this crate by name
extern crate self as filemaker_rust_sdk;

pub(crate) mod envelope;
pub use crate::envelope::DataInfo;

pub(crate) mod error;
pub use crate::error::{FMError, FMErrorCode};

pub(crate) mod find_request;
pub use crate::find_request::{FindCommand, FindRequest, FindResult};

pub(crate) mod record;
pub use crate::record::Record;

pub(crate) mod session_builder;
pub use crate::session_builder::SessionBuilder;

pub(crate) mod session;
pub use crate::session::Session;

pub mod types;
pub use crate::types::{
    parse_time, FMRecord, FieldData, FieldValue, FromFieldValue, ToFieldValue,
};


pub use chrono::FixedOffset;
