use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl Error {
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::catalog("unknown command: tests");
        assert!(err.to_string().contains("unknown command"));
    }
}
