//! Runtime environment classification.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Deployment environment the process runs in.
///
/// Drives secret requirements at startup and whether error responses
/// carry debug detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Test,
    Production,
}

impl AppEnv {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Test => "test",
            AppEnv::Production => "production",
        }
    }

    #[inline]
    pub const fn is_production(&self) -> bool {
        matches!(self, AppEnv::Production)
    }

    #[inline]
    pub const fn is_development(&self) -> bool {
        matches!(self, AppEnv::Development)
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment `{0}` (expected development, test or production)")]
pub struct ParseAppEnvError(pub String);

impl FromStr for AppEnv {
    type Err = ParseAppEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "test" => Ok(AppEnv::Test),
            "production" | "prod" => Ok(AppEnv::Production),
            other => Err(ParseAppEnvError(other.to_string())),
        }
    }
}
