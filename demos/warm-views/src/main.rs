//! Warm every view index of a CouchDB database.
//!
//! ```text
//! warm-views-demo http://localhost:5984/orders [--all-views] [--strict] [--max-connections N]
//! ```
//!
//! `COUCH_USER` and `COUCH_PASSWORD` are used as credentials when both are set.

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::env;

use couchwarm::{
    AuthCredential, Database, FailurePolicy, HyperClient, Warmup, WarmupReport, WarmupScope,
};

/// Command line options.
#[derive(Debug, Default, PartialEq)]
struct Options {
    url: String,
    scope: WarmupScope,
    policy: FailurePolicy,
    max_connections: Option<usize>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--all-views" => options.scope = WarmupScope::AllViews,
            "--strict" => options.policy = FailurePolicy::Fail,
            "--max-connections" => {
                let value = args.next().ok_or("--max-connections needs a value")?;
                let count = value
                    .parse()
                    .map_err(|_| format!("not a connection count: {value}"))?;
                options.max_connections = Some(count);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option: {flag}")),
            url => options.url = url.to_string(),
        }
    }

    if options.url.is_empty() {
        options.url = env::var("COUCH_URL").map_err(|_| "missing database URL".to_string())?;
    }
    Ok(options)
}

fn database(options: &Options) -> couchwarm::Result<Database> {
    let mut builder = HyperClient::builder().with_logging();
    if let Some(count) = options.max_connections {
        builder = builder.max_connections(count);
    }

    let username = env::var("COUCH_USER").ok();
    let password = env::var("COUCH_PASSWORD").ok();
    let auth = AuthCredential::from_user_pass(username.as_deref(), password.as_deref());

    Database::new(&options.url, builder.build(), auth)
}

fn print_report(db: &Database, report: &WarmupReport) {
    println!(
        "{}: {} of {} views warmed",
        db.database_name(),
        report.succeeded(),
        report.dispatched()
    );
    for task in report.skipped() {
        println!("  skipped {task}");
    }
    for (task, error) in report.failures() {
        println!("  failed  {task}: {error}");
    }
}

#[tokio::main]
async fn main() -> couchwarm::Result<()> {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            eprintln!(
                "usage: warm-views-demo <database-url> [--all-views] [--strict] [--max-connections N]"
            );
            std::process::exit(2);
        }
    };

    let db = database(&options)?;
    let report = Warmup::new(db.clone())
        .scope(options.scope)
        .failure_policy(options.policy)
        .run()
        .await?;

    print_report(&db, &report);
    Ok(())
}

// ============================================================================
// Tests using wiremock
// ============================================================================
