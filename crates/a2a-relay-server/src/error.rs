use thiserror::Error;

pub const ENV_PREFIX: &str = "RELAY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// The environment variable that sets a dotted configuration key
pub fn to_env_var(field_path: &str) -> String {
    format!(
        "{}_{}",
        ENV_PREFIX,
        field_path.to_uppercase().replace('.', "__")
    )
}
