//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use serde::ser::{SerializeMap, Serializer};
use serde_derive::Serialize;
use std::result::Result;
use tracing::debug;

use crate::envelope::{DataInfo, Operation};
use crate::error::{ia_err, FMError};
use crate::record::Record;
use crate::session::Session;
use crate::types::{FieldData, FieldValue, ToFieldValue};
use reqwest::Method;

/// A single find request: a set of field criteria that a record must all match.
///
/// Criteria values use the usual FileMaker find syntax (`"==Smith"`, `">100"`,
/// `"1/1/2024...12/31/2024"`). A request marked with [`with_omit()`](FindRequest::with_omit())
/// removes its matches from the found set instead of adding them.
///
/// All builder methods consume `self` and return the modified request.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct FindRequest {
    pub(crate) criteria: FieldData,
    pub(crate) omit: bool,
}

impl FindRequest {
    pub fn new() -> FindRequest {
        FindRequest {
            ..Default::default()
        }
    }

    /// Add a single field criterion.
    pub fn criterion(mut self, field: &str, value: impl ToFieldValue) -> FindRequest {
        self.criteria
            .insert(field.to_string(), value.to_field_value());
        self
    }

    /// Add all criteria from an iterator of `(field, value)` pairs.
    pub fn with<I, K, V>(mut self, criteria: I) -> FindRequest
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToFieldValue,
    {
        for (k, v) in criteria {
            self.criteria.insert(k.into(), v.to_field_value());
        }
        self
    }

    /// Mark this request as an omit request.
    pub fn with_omit(mut self, omit: bool) -> FindRequest {
        self.omit = omit;
        self
    }

    pub fn criteria(&self) -> &FieldData {
        &self.criteria
    }

    pub fn is_omit(&self) -> bool {
        self.omit
    }
}

impl serde::Serialize for FindRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = if self.omit { 1 } else { 0 };
        let mut m = serializer.serialize_map(Some(self.criteria.len() + extra))?;
        for (k, v) in &self.criteria {
            m.serialize_entry(k, v)?;
        }
        // the host expects the string "true" here
        if self.omit {
            m.serialize_entry("omit", "true")?;
        }
        m.end()
    }
}

/// A find command: one or more [`FindRequest`]s, with an optional limit and offset.
///
/// Requests are processed by the host in order: regular requests add matching
/// records to the found set, omit requests remove them.
///
/// Example:
///```no_run
/// # use filemaker_rust_sdk::{FindCommand, FindRequest, Session};
/// # async fn run(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
/// let result = FindCommand::new()
///     .request(FindRequest::new().criterion("City", "Boston"))
///     .request(FindRequest::new().criterion("Status", "Inactive").with_omit(true))
///     .with_limit(50)
///     .execute(session, "Contacts")
///     .await?;
/// for rec in result.records() {
///     println!("{}: {}", rec.id(), rec.string("Name")?);
/// }
/// # Ok(())
/// # }
///```
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct FindCommand {
    #[serde(rename = "query")]
    pub(crate) requests: Vec<FindRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) offset: Option<u32>,
}

impl FindCommand {
    pub fn new() -> FindCommand {
        FindCommand {
            ..Default::default()
        }
    }

    /// Append all given requests, in order.
    pub fn with_requests<I: IntoIterator<Item = FindRequest>>(mut self, requests: I) -> FindCommand {
        self.requests.extend(requests);
        self
    }

    /// Append a single request.
    pub fn request(mut self, request: FindRequest) -> FindCommand {
        self.requests.push(request);
        self
    }

    /// Return at most `limit` records.
    pub fn with_limit(mut self, limit: u32) -> FindCommand {
        self.limit = Some(limit);
        self
    }

    /// Skip to the record at this 1-based position of the found set.
    pub fn with_offset(mut self, offset: u32) -> FindCommand {
        self.offset = Some(offset);
        self
    }

    pub fn requests(&self) -> &[FindRequest] {
        &self.requests
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// Execute the find on `layout` using `session`.
    ///
    /// A find that matches no records returns an empty [`FindResult`]; any other
    /// host error is returned as [`Host`](crate::FMErrorCode::Host).
    pub async fn execute(&self, session: &Session, layout: &str) -> Result<FindResult, FMError> {
        if layout.is_empty() {
            return ia_err!("no layout specified");
        }
        if self.requests.is_empty() {
            return ia_err!("find command has no find requests");
        }
        let url = session.url(&["layouts", layout, "_find"])?;
        let rb = session.request(Method::POST, url)?.json(self);
        let resp = session.send(rb, Operation::Find).await?;
        debug!("find on {} returned {} records", layout, resp.data.len());
        let records = resp
            .data
            .into_iter()
            .map(|d| Record::from_data(session, layout, d))
            .collect();
        Ok(FindResult {
            records,
            data_info: resp.data_info,
        })
    }
}

/// Struct representing the result of a [`FindCommand::execute()`] operation.
#[derive(Default, Debug)]
pub struct FindResult {
    pub(crate) records: Vec<Record>,
    pub(crate) data_info: Option<DataInfo>,
}

impl FindResult {
    /// The records returned, in the order the host sent them.
    pub fn records(&self) -> &Vec<Record> {
        &self.records
    }
    /// Take ownership of the returned records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
    /// Found set information, if the host sent it. Absent when no records matched.
    pub fn data_info(&self) -> Option<&DataInfo> {
        self.data_info.as_ref()
    }
}

impl FromIterator<(String, FieldValue)> for FindRequest {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        FindRequest::new().with(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builders_do_not_modify_the_original() {
        let base = FindRequest::new().criterion("Name", "Ann");
        let omitted = base.clone().with_omit(true);
        assert!(!base.is_omit());
        assert!(omitted.is_omit());
        assert_eq!(base.criteria().len(), 1);
    }

    #[test]
    fn serializes_query_only_when_no_limit_or_offset() {
        let cmd = FindCommand::new().request(FindRequest::new().criterion("Name", "==Ann"));
        let v = serde_json::to_value(&cmd).unwrap();
        assert_eq!(v, json!({"query": [{"Name": "==Ann"}]}));
    }

    #[test]
    fn serializes_omit_limit_offset() {
        let cmd = FindCommand::new()
            .with_requests([
                FindRequest::new().criterion("City", "Boston").criterion("Age", 30),
                FindRequest::new().criterion("Status", "Inactive").with_omit(true),
            ])
            .with_limit(10)
            .with_offset(5);
        let v = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            v,
            json!({
                "query": [
                    {"Age": 30, "City": "Boston"},
                    {"Status": "Inactive", "omit": "true"}
                ],
                "limit": 10,
                "offset": 5
            })
        );
        assert!(v["query"][0].get("omit").is_none());
    }

    #[test]
    fn with_merges_criteria() {
        let r = FindRequest::new()
            .criterion("A", "1")
            .with([("B", "2"), ("A", "3")]);
        assert_eq!(r.criteria().get("A"), Some(&FieldValue::Text("3".to_string())));
        assert_eq!(r.criteria().len(), 2);

        let r: FindRequest = vec![("Name".to_string(), FieldValue::Text("x".to_string()))]
            .into_iter()
            .collect();
        assert_eq!(r.criteria().len(), 1);
    }
}
