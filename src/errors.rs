use std::{io, num::{ParseFloatError, ParseIntError}, str::Utf8Error};
use quick_xml::events::attributes::AttrError;

/// Failure of the file-driven runner. The pipeline itself never fails on
/// structurally valid input.
#[derive(Debug)]
pub struct Error {
    pub message: String,
}

impl Error {
    fn with_context(context: &str, value: impl std::fmt::Display) -> Self {
        Error {
            message: format!("{}: {}", context, value)
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error {
            message: value.to_string()
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::with_context("malformed provider data", value)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::with_context("malformed OSM XML", value)
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::with_context("malformed OSM XML attribute", value)
    }
}

impl From<ParseFloatError> for Error {
    fn from(value: ParseFloatError) -> Self {
        Error::with_context("invalid coordinate", value)
    }
}

impl From<ParseIntError> for Error {
    fn from(value: ParseIntError) -> Self {
        Error::with_context("invalid element id", value)
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Error::with_context("invalid UTF-8 in OSM XML", value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error {
            message: value.to_string()
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            message: value
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_keep_context() {
        let err: Error = "-x".parse::<i64>().unwrap_err().into();
        assert!(err.message.starts_with("invalid element id: "));

        let err: Error = serde_json::from_str::<u8>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("malformed provider data: "));
    }
}
