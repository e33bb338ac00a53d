//! "Proxy event" version of the Lambda implementations.
//!
//! This executable defines a server that expects to be interacted with
//! according to AWS API Gateway's "proxy event" protocol, and answers with a
//! real HTTP response instead of a response-shaped JSON object.

use lambda_http::{run, service_fn, tracing, Error, Request, RequestExt, RequestPayloadExt};
use serde_json::Value;

use lakeformation_lambda::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|req: Request| async move {
        let context = req.lambda_context();
        tracing::info!(
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %context.request_id,
            "invoked"
        );

        // Neither function reads the request, so a body we can't parse is
        // not worth failing over.
        let payload: Option<Value> = match req.payload() {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("ignoring unparseable request body: {e}");
                None
            }
        };

        ref_svcs
            .dispatch(context.invoked_function_arn, payload)
            .await?
            .into_http()
    }))
    .await?;
    Ok(())
}
