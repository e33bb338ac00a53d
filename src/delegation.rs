//! Credential delegation: assume a role, then talk to Athena as that role.
//!
//! The Lambda's own execution role is only allowed to call `sts:AssumeRole`.
//! All data access goes through a client that is built from the temporary
//! credentials of the assumed role and nothing else, so the effective
//! permissions of a query are exactly those of the target role.
//!
//! The traits here are the seams between the handler and AWS. The real
//! implementations are on the SDK clients themselves; tests supply their own.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_athena::{
    config::IdentityCache,
    types::{QueryExecutionContext, ResultConfiguration},
};
use lambda_runtime::{tracing, Error};
use std::{fmt, time::SystemTime};

/// Provider name attached to the credentials we hand to the Athena client.
const PROVIDER_NAME: &str = "AssumedRole";

/// The short-lived credentials returned by STS for one invocation.
///
/// These are deliberately not `Clone`: they get moved into the scoped client
/// and are dropped along with it.
#[derive(Eq, PartialEq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<SystemTime>,
}

impl TemporaryCredentials {
    pub fn into_provider(self) -> aws_credential_types::Credentials {
        aws_credential_types::Credentials::new(
            self.access_key_id,
            self.secret_access_key,
            Some(self.session_token),
            self.expiration,
            PROVIDER_NAME,
        )
    }
}

impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[async_trait]
pub trait RoleAssumer {
    async fn assume(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, Error>;
}

#[async_trait]
pub trait QuerySubmitter {
    /// Start a query and return its execution ID, if the service gave us one.
    /// This does not wait for the query to run.
    async fn start_query(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<Option<String>, Error>;
}

/// Builds a query client that authenticates only with the given credentials.
pub trait ScopedClientFactory {
    type Client: QuerySubmitter + Send + Sync;

    fn scoped(&self, credentials: TemporaryCredentials) -> Self::Client;
}

#[async_trait]
impl RoleAssumer for aws_sdk_sts::Client {
    async fn assume(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, Error> {
        let output = self
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .send()
            .await?;

        let creds = output.credentials().ok_or_else(|| -> Error {
            format!("AssumeRole on `{role_arn}` returned no credentials").into()
        })?;

        Ok(TemporaryCredentials {
            access_key_id: creds.access_key_id().to_owned(),
            secret_access_key: creds.secret_access_key().to_owned(),
            session_token: creds.session_token().to_owned(),
            expiration: SystemTime::try_from(*creds.expiration()).ok(),
        })
    }
}

#[async_trait]
impl QuerySubmitter for aws_sdk_athena::Client {
    async fn start_query(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<Option<String>, Error> {
        let output = self
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(QueryExecutionContext::builder().database(database).build())
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(output_location)
                    .build(),
            )
            .send()
            .await?;

        Ok(output.query_execution_id().map(str::to_owned))
    }
}

/// Creates Athena clients that share the ambient region, retry, and timeout
/// settings, but never the ambient credentials.
#[derive(Clone, Debug)]
pub struct ScopedAthena {
    base: SdkConfig,
}

impl ScopedAthena {
    pub fn new(base: SdkConfig) -> Self {
        ScopedAthena { base }
    }
}

impl ScopedClientFactory for ScopedAthena {
    type Client = aws_sdk_athena::Client;

    fn scoped(&self, credentials: TemporaryCredentials) -> aws_sdk_athena::Client {
        tracing::debug!(
            access_key_id = %credentials.access_key_id,
            "building Athena client from assumed-role credentials"
        );

        // The ambient identity cache lives as long as the process; the assumed
        // role's credentials must not end up in it.
        let conf = aws_sdk_athena::config::Builder::from(&self.base)
            .credentials_provider(credentials.into_provider())
            .identity_cache(IdentityCache::no_cache())
            .build();

        aws_sdk_athena::Client::from_conf(conf)
    }
}
