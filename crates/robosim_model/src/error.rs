//! Error types for model loading

use thiserror::Error;

/// Errors produced while loading or validating a model file.
///
/// The `Display` text is the diagnostic shown to the user when loading fails,
/// so every variant carries enough context to locate the problem.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model file (or an included file) could not be read.
    #[error("could not read model file '{path}': {source}")]
    Io {
        /// Path as given or resolved
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not well-formed XML.
    #[error("XML error in '{path}': {message}")]
    Xml {
        /// Path of the offending file (or `<string>`)
        path: String,
        /// Parser message
        message: String,
    },

    /// The document root is not `<mujoco>`.
    #[error("unexpected root element <{0}>, expected <mujoco>")]
    UnexpectedRoot(String),

    /// An attribute value could not be interpreted.
    #[error("invalid value '{value}' for attribute '{attribute}' of <{element}>: {reason}")]
    InvalidAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: String,
        /// Raw attribute value
        value: String,
        /// What was wrong with it
        reason: String,
    },

    /// A required attribute is absent.
    #[error("<{element}> requires attribute '{attribute}'")]
    MissingAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: String,
    },

    /// A geom or joint `type` is not recognized.
    #[error("unknown {kind} type '{name}'")]
    UnknownType {
        /// "geom" or "joint"
        kind: &'static str,
        /// The type string found in the file
        name: String,
    },

    /// A file includes itself, directly or indirectly.
    #[error("include cycle detected at '{0}'")]
    IncludeCycle(String),

    /// The model parsed but violates a structural rule.
    #[error("invalid model: {0}")]
    Invalid(String),
}

impl ModelError {
    pub(crate) fn invalid_attribute(
        element: &str,
        attribute: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> Self {
        ModelError::InvalidAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        ModelError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_display() {
        let err = ModelError::Io {
            path: "robots/missing.xml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "file missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("robots/missing.xml"));
        assert!(msg.contains("file missing"));
    }

    #[test]
    fn test_invalid_attribute_display() {
        let err = ModelError::invalid_attribute("geom", "size", "abc", "expected a number");
        let msg = err.to_string();
        assert!(msg.contains("<geom>"));
        assert!(msg.contains("'size'"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;

        let err = ModelError::Io {
            path: "x.xml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(ModelError::Invalid("bad".to_string()).source().is_none());
    }
}
