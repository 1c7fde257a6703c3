use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "environment-type is required but was not provided\n\nHint:\n  • pass --environment-type or set NOTEJAM_ENVIRONMENT_TYPE"
    )]
    MissingEnvironmentType,

    #[error("unknown environment type: '{0}'")]
    UnknownEnvironmentType(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
