//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_derive::Serialize;
use std::path::Path;
use std::result::Result;
use tracing::debug;

use crate::envelope::{Operation, RecordData};
use crate::error::{ia_err, precondition_err, FMError, FMErrorCode};
use crate::session::Session;
use crate::types::{field_to_bool, FMRecord, FieldData, FieldValue, FromFieldValue, ToFieldValue};

static NULL_FIELD_VALUE: FieldValue = FieldValue::Null;

/// A single record of a FileMaker layout.
///
/// A record holds the field data last read from (or written to) the host, plus a set of
/// staged changes made with [`set()`](Record::set()). Reads always see staged changes
/// first. Staged changes are sent to the host with [`commit()`](Record::commit()), and
/// discarded with [`reset()`](Record::reset()).
///
/// Records are returned by [`Session::find()`], [`Session::get_record()`] and
/// [`FindCommand::execute()`](crate::FindCommand::execute()), or created empty with
/// [`Session::new_record()`]. Each record keeps a handle to the session it came from,
/// which it uses for all later operations.
///
/// Example:
///```no_run
/// # use filemaker_rust_sdk::Session;
/// # async fn run(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
/// let mut rec = session.new_record("Contacts");
/// rec.set("Name", "Ann Smith");
/// rec.set("Age", 31);
/// rec.set("VIP", true);
/// // inserts the record and reads back any auto-entered values
/// rec.commit().await?;
/// println!("created record {}", rec.id());
///
/// rec.set("Age", 32);
/// rec.commit().await?;
/// rec.delete().await?;
/// # Ok(())
/// # }
///```
#[derive(Debug, Clone)]
pub struct Record {
    pub(crate) id: String,
    pub(crate) layout: String,
    pub(crate) mod_id: Option<String>,
    pub(crate) field_data: FieldData,
    pub(crate) staged: FieldData,
    pub(crate) session: Session,
}

#[derive(Serialize)]
struct RecordBody<'a> {
    #[serde(rename = "fieldData")]
    field_data: &'a FieldData,
}

impl Record {
    pub(crate) fn new(session: &Session, layout: &str) -> Record {
        Record {
            id: String::new(),
            layout: layout.to_string(),
            mod_id: None,
            field_data: FieldData::new(),
            staged: FieldData::new(),
            session: session.clone(),
        }
    }

    pub(crate) fn from_data(session: &Session, layout: &str, data: RecordData) -> Record {
        Record {
            id: data.record_id,
            layout: layout.to_string(),
            mod_id: data.mod_id,
            field_data: data.field_data,
            staged: FieldData::new(),
            session: session.clone(),
        }
    }

    /// The host's record id. Empty if the record has not been created yet.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// The host's modification id, if known.
    pub fn mod_id(&self) -> Option<&str> {
        self.mod_id.as_deref()
    }

    /// The field data last read from or written to the host, without staged changes.
    pub fn field_data(&self) -> &FieldData {
        &self.field_data
    }

    /// Changes made with [`set()`](Record::set()) that have not been committed.
    pub fn staged_changes(&self) -> &FieldData {
        &self.staged
    }

    /// Returns `true` if there are staged changes.
    pub fn is_dirty(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the current value of a field: the staged value if there is one, otherwise
    /// the value read from the host. Unknown fields are [`FieldValue::Null`].
    pub fn get(&self, field: &str) -> &FieldValue {
        self.staged
            .get(field)
            .or_else(|| self.field_data.get(field))
            .unwrap_or(&NULL_FIELD_VALUE)
    }

    /// Stage a change to a field.
    ///
    /// Integers, floats and `bool` are stored as numbers (`true` as 1, `false` as 0).
    /// Nothing is sent to the host until [`commit()`](Record::commit()).
    pub fn set(&mut self, field: &str, value: impl ToFieldValue) {
        self.staged.insert(field.to_string(), value.to_field_value());
    }

    /// Discard all staged changes.
    pub fn reset(&mut self) {
        self.staged.clear();
    }

    /// Get a field converted to any type implementing [`FromFieldValue`].
    ///
    /// Dates and times are read in UTC; use [`time()`](Record::time()) to give an offset.
    pub fn value<T: FromFieldValue>(&self, field: &str) -> Result<T, FMError> {
        T::from_field(field, self.get(field), &Utc.fix())
    }

    /// Get a field as a string. Numbers are written in their shortest form,
    /// `Null` is an empty string.
    pub fn string(&self, field: &str) -> Result<String, FMError> {
        self.value(field)
    }

    pub fn i8(&self, field: &str) -> Result<i8, FMError> {
        self.value(field)
    }

    pub fn i16(&self, field: &str) -> Result<i16, FMError> {
        self.value(field)
    }

    pub fn i32(&self, field: &str) -> Result<i32, FMError> {
        self.value(field)
    }

    /// Get a numeric field as an integer, truncating any fraction.
    pub fn i64(&self, field: &str) -> Result<i64, FMError> {
        self.value(field)
    }

    pub fn f32(&self, field: &str) -> Result<f32, FMError> {
        self.value(field)
    }

    pub fn f64(&self, field: &str) -> Result<f64, FMError> {
        self.value(field)
    }

    /// Get a field as a boolean. Non-empty text and positive numbers are `true`,
    /// everything else is `false`.
    pub fn bool(&self, field: &str) -> bool {
        field_to_bool(self.get(field))
    }

    /// Get a date, time or timestamp field, reading the text as wall time in `tz`.
    ///
    /// Text in none of the recognized formats (see [`parse_time()`](crate::parse_time()))
    /// is reported as [`UnknownFormat`](FMErrorCode::UnknownFormat).
    pub fn time(&self, field: &str, tz: &FixedOffset) -> Result<DateTime<FixedOffset>, FMError> {
        DateTime::<FixedOffset>::from_field(field, self.get(field), tz)
    }

    pub fn string_or_default(&self, field: &str) -> String {
        self.string(field).unwrap_or_default()
    }

    pub fn i32_or_default(&self, field: &str) -> i32 {
        self.i32(field).unwrap_or_default()
    }

    pub fn i64_or_default(&self, field: &str) -> i64 {
        self.i64(field).unwrap_or_default()
    }

    pub fn f64_or_default(&self, field: &str) -> f64 {
        self.f64(field).unwrap_or_default()
    }

    /// Like [`time()`](Record::time()), returning the Unix epoch on error.
    pub fn time_or_default(&self, field: &str, tz: &FixedOffset) -> DateTime<FixedOffset> {
        self.time(field, tz).unwrap_or_default()
    }

    /// Fill `target` from this record's fields. See [`FMRecord`].
    pub fn map_to<T: FMRecord>(&self, target: &mut T, tz: &FixedOffset) -> Result<(), FMError> {
        target.map_from(self, tz)
    }

    // staged values become committed values
    fn merge_staged(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        self.field_data.extend(staged);
    }

    /// Send staged changes to the host.
    ///
    /// Does nothing if there are no staged changes. A record that has not been
    /// created yet is created (see [`create()`](Record::create())). Otherwise the staged
    /// fields are sent with `PATCH .../records/{id}`, and on success become part of the
    /// record's field data.
    pub async fn commit(&mut self) -> Result<(), FMError> {
        if self.staged.is_empty() {
            return Ok(());
        }
        if self.id.is_empty() {
            return self.create().await;
        }
        let url = self
            .session
            .url(&["layouts", &self.layout, "records", &self.id])?;
        let rb = self.session.request(Method::PATCH, url)?.json(&RecordBody {
            field_data: &self.staged,
        });
        let resp = self.session.send(rb, Operation::Edit).await?;
        debug!("updated record {} on {}", self.id, self.layout);
        self.merge_staged();
        if resp.mod_id.is_some() {
            self.mod_id = resp.mod_id;
        }
        Ok(())
    }

    /// Create this record on the host from its staged fields.
    ///
    /// On success the record gets the id assigned by the host, and is then read back
    /// so that auto-entered values become visible. If reading back fails, the error is
    /// returned but the id stays set, since the record does exist on the host.
    pub async fn create(&mut self) -> Result<(), FMError> {
        let url = self
            .session
            .url(&["layouts", &self.layout, "records"])?;
        let rb = self.session.request(Method::POST, url)?.json(&RecordBody {
            field_data: &self.staged,
        });
        let resp = self.session.send(rb, Operation::Create).await?;
        let id = match resp.record_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(FMError::new(
                    FMErrorCode::Decode,
                    "create response did not contain a record id",
                ))
            }
        };
        debug!("created record {} on {}", id, self.layout);
        self.id = id;
        self.mod_id = resp.mod_id;
        self.merge_staged();
        self.refresh().await
    }

    // Re-read the committed field data from the host
    async fn refresh(&mut self) -> Result<(), FMError> {
        let fresh = self.session.get_record(&self.layout, &self.id).await?;
        self.field_data.extend(fresh.field_data);
        if fresh.mod_id.is_some() {
            self.mod_id = fresh.mod_id;
        }
        Ok(())
    }

    /// Delete this record on the host.
    ///
    /// On success the record is cleared: it has no id, no field data and no staged
    /// changes. Deleting a record that was never created is a
    /// [`Precondition`](FMErrorCode::Precondition) error.
    pub async fn delete(&mut self) -> Result<(), FMError> {
        if self.id.is_empty() {
            return precondition_err!("cannot delete a record that has not been created");
        }
        let url = self
            .session
            .url(&["layouts", &self.layout, "records", &self.id])?;
        let rb = self.session.request(Method::DELETE, url)?;
        self.session.send(rb, Operation::Delete).await?;
        debug!("deleted record {} on {}", self.id, self.layout);
        self.id.clear();
        self.mod_id = None;
        self.field_data.clear();
        self.staged.clear();
        Ok(())
    }

    /// Upload `data` into the container field `field`, under the file name `filename`.
    ///
    /// The record must have been created on the host first; otherwise this is a
    /// [`Precondition`](FMErrorCode::Precondition) error and nothing is sent.
    pub async fn commit_to_container(
        &mut self,
        field: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<(), FMError> {
        if self.id.is_empty() {
            return precondition_err!(
                "cannot upload to container field {}: record has not been created",
                field
            );
        }
        if field.is_empty() {
            return ia_err!("no container field specified");
        }
        let url = self.session.url(&[
            "layouts",
            &self.layout,
            "records",
            &self.id,
            "containers",
            field,
        ])?;
        let part = Part::bytes(data).file_name(filename.to_string());
        let form = Form::new().part("upload", part);
        let rb = self.session.request(Method::POST, url)?.multipart(form);
        let resp = self.session.send(rb, Operation::Upload).await?;
        debug!(
            "uploaded {} to container {} of record {}",
            filename, field, self.id
        );
        if resp.mod_id.is_some() {
            self.mod_id = resp.mod_id;
        }
        Ok(())
    }

    /// Upload a local file into the container field `field`, under the file's own name.
    pub async fn commit_file_to_container(
        &mut self,
        field: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), FMError> {
        if self.id.is_empty() {
            return precondition_err!(
                "cannot upload to container field {}: record has not been created",
                field
            );
        }
        let path = path.as_ref();
        let filename = match path.file_name() {
            Some(n) => n.to_string_lossy().to_string(),
            None => return ia_err!("path {} has no file name", path.display()),
        };
        let data = match tokio::fs::read(path).await {
            Ok(d) => d,
            Err(e) => {
                return ia_err!("error reading file {}: {}", path.display(), e.to_string())
            }
        };
        self.commit_to_container(field, &filename, data).await
    }
}
