//! Lambda functions behind the Lake Formation demo API.
//!
//! This library crate implements the two functions that sit behind the REST
//! API: `hello`, a static greeting, and `lakeformation`, which runs an Athena
//! query using the permissions of a delegated IAM role. The common codebase is
//! compiled into three executables: `lakeformation-lambda-bare` and
//! `lakeformation-lambda-proxyevent` for deployment, and
//! `lakeformation-lambda-oneshot` for running a single invocation from the
//! command line.
//!
//! Every route of the REST API (`/items`, `/items/{proxy+}`,
//! `/cognito-auth-path`) is wired to the same function, so method and path are
//! never looked at.

use aws_config::SdkConfig;
use lambda_runtime::{tracing, Error};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod delegation;
pub mod hello;
pub mod lakeformation;
pub mod response;

pub use config::QueryConfig;
pub use response::ProxyResponse;

/// The functions that this executable knows how to be.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Function {
    Hello,
    LakeFormation,
}

impl Function {
    /// Figure out which function is being invoked from its ARN.
    ///
    /// Amplify-generated function names carry random prefixes and suffixes
    /// (e.g. `amplify-...-lakeformation511FAEAF-oQWbwFEPYJf9`), so we look for
    /// a `-`/`_`-separated segment of the name that starts with the function
    /// keyword. A bare function name is accepted too, which is handy for the
    /// oneshot tool.
    pub fn from_arn(arn: &str) -> Option<Self> {
        let name = match arn.split_once(":function:") {
            Some((_, rest)) => rest.split(':').next().unwrap_or(rest),
            None => arn,
        };
        let name = name.to_ascii_lowercase();
        let has_segment = |keyword: &str| {
            name.split(|c: char| c == '-' || c == '_')
                .any(|segment| segment.starts_with(keyword))
        };

        if has_segment("lakeformation") {
            Some(Function::LakeFormation)
        } else if has_segment("hello") {
            Some(Function::Hello)
        } else {
            None
        }
    }
}

pub struct Services {
    sts: aws_sdk_sts::Client,
    athena: delegation::ScopedAthena,
    query: QueryConfig,
}

impl Services {
    /// Create a state object for the Lambda services.
    pub async fn init() -> Result<Self, Error> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false) // don't print the module name
            .without_time() // don't print time (CloudWatch has it)
            .init();

        let config = aws_config::load_from_env().await;
        let query = QueryConfig::from_env()?;

        tracing::info!(
            role_arn = %query.role_arn,
            database = %query.database,
            output_location = %query.output_location,
            "configured"
        );

        Ok(Self::with_parts(&config, query))
    }

    /// Assemble the services from an already-loaded SDK config. The STS
    /// client runs with the ambient credentials; the Athena clients never do.
    pub fn with_parts(config: &SdkConfig, query: QueryConfig) -> Self {
        Services {
            sts: aws_sdk_sts::Client::new(config),
            athena: delegation::ScopedAthena::new(config.clone()),
            query,
        }
    }

    /// Handle an invocation of one of the functions.
    ///
    /// As with the deployment packaging, both functions are bundled into one
    /// executable and we "know" which one is being invoked by looking at the
    /// function ARN.
    pub async fn dispatch(
        &self,
        mut arn: String,
        payload: Option<Value>,
    ) -> Result<ProxyResponse, Error> {
        // Local testing environment?
        if arn.ends_with(":test_function") {
            arn = std::env::var("LAKEFORMATION_LOCALTEST_ARN").map_err(|_| -> Error {
                "local test invocation, but LAKEFORMATION_LOCALTEST_ARN is not set".into()
            })?;
        }

        tracing::info!(event = ?payload, "received event");

        match Function::from_arn(&arn) {
            Some(Function::Hello) => Ok(hello::handle_hello(payload)),
            Some(Function::LakeFormation) => {
                lakeformation::handle_query(payload, &self.query, &self.sts, &self.athena).await
            }
            None => Err(format!("unhandled function: {}", arn).into()),
        }
    }
}
