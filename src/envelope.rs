//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Response envelope returned by every Data API call, and its classification
//! into success, "no records" and error outcomes.

use serde::Deserializer;
use serde_derive::Deserialize;
use std::result::Result;
use tracing::trace;

use crate::error::{FMError, FMErrorCode};
use crate::types::FieldData;

// Message codes with a meaning of their own
pub(crate) const CODE_OK: &str = "0";
pub(crate) const CODE_RECORD_MISSING: &str = "101";
pub(crate) const CODE_NO_RECORDS_MATCH: &str = "401";

/// The kind of call an envelope answers. Some codes mean different things
/// depending on the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Operation {
    Login,
    Logout,
    Find,
    GetRecord,
    Create,
    Edit,
    Delete,
    Upload,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub(crate) messages: Vec<Message>,
    #[serde(default)]
    pub(crate) response: ResponseBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Message {
    #[serde(deserialize_with = "de_string")]
    pub(crate) code: String,
    #[serde(default)]
    pub(crate) message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResponseBody {
    #[serde(default)]
    pub(crate) token: Option<String>,
    #[serde(default, rename = "recordId", deserialize_with = "de_opt_string")]
    pub(crate) record_id: Option<String>,
    #[serde(default, rename = "modId", deserialize_with = "de_opt_string")]
    pub(crate) mod_id: Option<String>,
    #[serde(default)]
    pub(crate) data: Vec<RecordData>,
    #[serde(default, rename = "dataInfo")]
    pub(crate) data_info: Option<DataInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecordData {
    #[serde(default, rename = "recordId", deserialize_with = "de_string")]
    pub(crate) record_id: String,
    #[serde(default, rename = "modId", deserialize_with = "de_opt_string")]
    pub(crate) mod_id: Option<String>,
    #[serde(default, rename = "fieldData")]
    pub(crate) field_data: FieldData,
}

/// Information about the found set returned with a find or record fetch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataInfo {
    pub database: String,
    pub layout: String,
    pub table: String,
    pub total_record_count: u64,
    pub found_count: u64,
    pub returned_count: u64,
}

// The host sends ids and codes as strings; accept numbers too.
fn de_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = <serde_json::Value as serde::Deserialize>::deserialize(d)?;
    Ok(value_to_string(&v))
}

fn de_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = <serde_json::Value as serde::Deserialize>::deserialize(d)?;
    if v.is_null() {
        return Ok(None);
    }
    Ok(Some(value_to_string(&v)))
}

fn value_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Envelope {
    /// Parse a response body. `status` is only used to describe bodies that
    /// are not envelopes at all.
    pub(crate) fn parse(status: reqwest::StatusCode, body: &str) -> Result<Envelope, FMError> {
        match serde_json::from_str::<Envelope>(body) {
            Ok(e) => Ok(e),
            Err(e) => {
                if !status.is_success() {
                    return Err(FMError::new(
                        FMErrorCode::Transport,
                        &format!(
                            "got unexpected http status: {}, response text: {}",
                            status, body
                        ),
                    ));
                }
                Err(e.into())
            }
        }
    }

    /// Classify the envelope by its first message code.
    ///
    /// `"0"` is success. On a find, `"401"` (no records match) is also a success
    /// with an empty result. On a single record fetch, `"101"` (record is missing)
    /// is [`NotFound`](FMErrorCode::NotFound). Any other code is a host error.
    pub(crate) fn check(self, op: Operation) -> Result<ResponseBody, FMError> {
        let m = match self.messages.first() {
            Some(m) => m,
            None => {
                return Err(FMError::new(
                    FMErrorCode::Decode,
                    "response envelope contains no messages",
                ))
            }
        };
        trace!("{:?} returned code={} message={}", op, m.code, m.message);
        match (op, m.code.as_str()) {
            (_, CODE_OK) => Ok(self.response),
            (Operation::Find, CODE_NO_RECORDS_MATCH) => Ok(ResponseBody::default()),
            (Operation::GetRecord, CODE_RECORD_MISSING) => {
                Err(FMError::not_found(&m.code, &m.message))
            }
            _ => Err(FMError::host(&m.code, &m.message)),
        }
    }
}
