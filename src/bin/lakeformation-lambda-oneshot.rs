//! "Oneshot" version of the Lambda implementations.
//!
//! This executable runs one function, based on arguments given on the command
//! line. The first argument is a function ARN or name (`hello`,
//! `lakeformation`); the optional second one is the JSON payload text.

use lambda_runtime::Error;
use serde_json::Value;
use std::env;

use lakeformation_lambda::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let mut args = env::args();
    args.next(); // skip argv[0]

    let arn = args.next().ok_or_else(|| -> Error {
        "first argument should be the function ARN or name to use (hello, lakeformation)".into()
    })?;

    let payload: Value = match args.next() {
        Some(json_text) => serde_json::from_str(&json_text)?,
        None => Value::Object(Default::default()),
    };

    let svcs = Services::init().await?;
    let result = svcs.dispatch(arn, Some(payload)).await?;

    serde_json::to_writer(std::io::stdout().lock(), &result)?;
    println!();
    Ok(())
}
