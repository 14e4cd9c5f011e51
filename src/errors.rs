use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ShowbillError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(showbill::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(showbill::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(showbill::serde))]
    Serde(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    #[diagnostic(code(showbill::db))]
    Db(#[from] sea_orm::DbErr),

    #[error("Invalid input: {0}")]
    #[diagnostic(code(showbill::validation))]
    Validation(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(showbill::not_found))]
    NotFound(String),
}
