//! "Bare" version of the Lambda implementations.
//!
//! This is a plain JSON-in, JSON-out function. The API Gateway Lambda-proxy
//! integration understands the `{statusCode, headers, body}` object that we
//! return, so this is also what gets deployed behind the REST API. It's the
//! easiest one to poke at locally, too.

use lambda_runtime::{run, service_fn, tracing, Error, LambdaEvent};
use serde_json::Value;

use lakeformation_lambda::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|event: LambdaEvent<Value>| async move {
        let (payload, context) = event.into_parts();
        tracing::info!(
            function = %context.env_config.function_name,
            version = %context.env_config.version,
            request_id = %context.request_id,
            "invoked"
        );
        ref_svcs
            .dispatch(context.invoked_function_arn, Some(payload))
            .await
    }))
    .await?;
    Ok(())
}
