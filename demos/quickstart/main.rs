//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//

// This is an example program showing the basic life cycle of a FileMaker Data API
// session: log in, find records, map them into structs, create, update, and delete
// a record, upload a container file, and log out.
//
// It expects a hosted database with a layout named "Contacts" holding the fields
// "Name", "City", "Age", "VIP", "Created" and a container field "Photo".
//
// To run this example:
//    FILEMAKER_HOST=https://fms.example.com FILEMAKER_DATABASE=Contacts \
//    FILEMAKER_USERNAME=admin FILEMAKER_PASSWORD=secret \
//        cargo run --example quickstart
//
// for extra output:
//    RUST_LOG=debug cargo run --example quickstart
//
// or, to see the message code of every response:
//    RUST_LOG=trace cargo run --example quickstart

use chrono::{DateTime, FixedOffset};
use filemaker_rust_sdk::{FMError, FMRecord, FindCommand, FindRequest, Session};
use std::error::Error;
use std::time::Duration;
use tracing::info;

const LAYOUT: &str = "Contacts";

#[derive(Default, Debug, FMRecord)]
struct Contact {
    #[fm(field = "Name")]
    name: String,
    #[fm(field = "City")]
    city: Option<String>,
    #[fm(field = "Age")]
    age: Option<i32>,
    #[fm(field = "VIP")]
    vip: bool,
    #[fm(field = "Created")]
    created: Option<DateTime<FixedOffset>>,
}

// This method shows various ways to configure a Session.
async fn get_session() -> Result<Session, FMError> {
    // Note: later methods called on this builder will override earlier methods.
    Session::builder()
        // Host and database given directly:
        // .host("https://fms.example.com")?
        // .database("Contacts")?
        //
        // Credentials given directly, or from a username=/password= file:
        // .credentials("admin", "secret")?
        // .credentials_from_file("/path/to/credentials")?
        //
        // For hosts with self-signed certificates (testing only):
        // .danger_accept_invalid_certs(true)?
        //
        // To read all of the above from environment variables:
        .from_environment()?
        //
        // Optional: set a different request timeout (default is 30 seconds)
        .timeout(Duration::from_secs(15))?
        //
        // Log in
        .build()
        .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Set up a tracing subscriber to see output based on RUST_LOG environment setting
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_ansi(false)
        .compact()
        .init();

    info!("Logging in...");
    let session = get_session().await?;

    // Everyone in Boston, except the inactive contacts
    let result = FindCommand::new()
        .request(FindRequest::new().criterion("City", "==Boston"))
        .request(
            FindRequest::new()
                .criterion("Status", "Inactive")
                .with_omit(true),
        )
        .with_limit(10)
        .execute(&session, LAYOUT)
        .await?;
    println!("DataInfo={:?}", result.data_info());

    let tz = FixedOffset::east_opt(0).ok_or("invalid offset")?;
    for rec in result.records() {
        let mut c = Contact::default();
        rec.map_to(&mut c, &tz)?;
        println!("record {}: {:?}", rec.id(), c);
    }

    // Create a new record; auto-entered values are read back after the insert
    let mut rec = session.new_record(LAYOUT);
    rec.set("Name", "Jane Doe");
    rec.set("City", "Boston");
    rec.set("Age", 41);
    rec.set("VIP", true);
    rec.commit().await?;
    println!("created record {} fields={:?}", rec.id(), rec.field_data());

    // Update it
    rec.set("Age", 42);
    rec.commit().await?;
    println!("updated record {} modId={:?}", rec.id(), rec.mod_id());

    // Upload a small file into its container field
    rec.commit_to_container("Photo", "hello.txt", b"hello from rust".to_vec())
        .await?;

    // Remove it again
    rec.delete().await?;

    session.close().await?;
    Ok(())
}
