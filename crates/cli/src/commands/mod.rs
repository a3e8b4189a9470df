pub mod admin;
pub mod dashboard;
pub mod migrate;

/// Database URL from `primary`, falling back to `DATABASE_URL`.
pub(crate) fn database_url(primary: &'static str) -> Result<String, MissingEnvVar> {
    dotenvy::dotenv().ok();
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MissingEnvVar(primary))
}

#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0} (or DATABASE_URL)")]
pub struct MissingEnvVar(pub &'static str);
