//! Static per-environment settings tables
//!
//! These are the two read-only lookup tables the assembler consumes:
//! where a deployment lands (region/account) and what the database is
//! called. Kept in code rather than in a config file so they version
//! with the topology they describe.

use crate::environment::EnvironmentType;
use serde::Serialize;

/// Deployment target for one environment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSettings {
    pub region: &'static str,
    pub account: &'static str,
}

/// Database identity for one environment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbSettings {
    pub db_name: &'static str,
    pub db_user_name: &'static str,
    pub db_password: &'static str,
}

pub fn target_settings(environment_type: EnvironmentType) -> TargetSettings {
    match environment_type {
        EnvironmentType::Dev => TargetSettings {
            region: "eu-west-1",
            account: "123456789012",
        },
    }
}

pub fn db_settings(environment_type: EnvironmentType) -> DbSettings {
    match environment_type {
        // plaintext credentials, development environment only
        EnvironmentType::Dev => DbSettings {
            db_name: "notejam",
            db_user_name: "notejam",
            db_password: "notejam-dev-only",
        },
    }
}
