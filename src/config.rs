//! Startup configuration for the delegated query.
//!
//! The deployed function was originally built around a handful of literal
//! constants. They're collected here so that a deployment (or a test) can
//! substitute its own values; the defaults reproduce the original literals.

use anyhow::{bail, Result};

pub const DEFAULT_ROLE_ARN: &str =
    "arn:aws:iam::994763746457:role/amplify-amplifyvitereactt-amplifyAuthtest1GroupRole-zNcgO3CzoluM";
pub const DEFAULT_ROLE_SESSION_NAME: &str = "AssumedRoleSession";
pub const DEFAULT_QUERY: &str = "SELECT * FROM sales_csv";
pub const DEFAULT_DATABASE: &str = "kawarui_test6";
pub const DEFAULT_OUTPUT_LOCATION: &str = "s3://dip2025/dbt/athena_query_result/";

/// Everything the delegated-query handler needs to know about where it runs
/// its query, and as whom.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryConfig {
    /// The role whose permissions the Athena client is restricted to.
    pub role_arn: String,
    pub role_session_name: String,
    pub query_string: String,
    pub database: String,
    /// S3 prefix where Athena writes its result files.
    pub output_location: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            role_arn: DEFAULT_ROLE_ARN.to_owned(),
            role_session_name: DEFAULT_ROLE_SESSION_NAME.to_owned(),
            query_string: DEFAULT_QUERY.to_owned(),
            database: DEFAULT_DATABASE.to_owned(),
            output_location: DEFAULT_OUTPUT_LOCATION.to_owned(),
        }
    }
}

impl QueryConfig {
    /// Load the configuration from `LAKEFORMATION_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], but with a caller-provided variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = QueryConfig::default();

        let fields: [(&str, &mut String); 5] = [
            ("LAKEFORMATION_ROLE_ARN", &mut cfg.role_arn),
            ("LAKEFORMATION_ROLE_SESSION_NAME", &mut cfg.role_session_name),
            ("LAKEFORMATION_QUERY", &mut cfg.query_string),
            ("LAKEFORMATION_DATABASE", &mut cfg.database),
            ("LAKEFORMATION_OUTPUT_LOCATION", &mut cfg.output_location),
        ];

        for (key, slot) in fields {
            if let Some(value) = lookup(key) {
                let value = value.trim();

                if value.is_empty() {
                    bail!("environment variable `{key}` is set but empty");
                }

                *slot = value.to_owned();
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.role_arn.trim().is_empty() {
            bail!("role ARN must not be empty");
        }

        if self.role_session_name.trim().is_empty() {
            bail!("role session name must not be empty");
        }

        if self.query_string.trim().is_empty() {
            bail!("query string must not be empty");
        }

        if self.database.trim().is_empty() {
            bail!("database name must not be empty");
        }

        if !self.output_location.starts_with("s3://") {
            bail!(
                "output location `{}` is not an s3:// URI",
                self.output_location
            );
        }

        Ok(())
    }
}
