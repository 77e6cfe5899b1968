//! Structural and configuration errors for template trees

use std::path::PathBuf;

use thiserror::Error;

use super::tree::NodeId;

/// Errors propagated to the caller by construction and composition operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    /// No base directory contains the template file
    #[error("template \"{file}\" not found")]
    FileNotFound { file: String },

    /// Parent has no child with this name
    #[error("child template \"{name}\" not found in \"{parent}\"")]
    ChildNotFound { parent: String, name: String },

    /// Node id is stale (removed) or belongs to another tree
    #[error("template node {0} not found")]
    NodeNotFound(NodeId),

    /// Parent already has a child with this name
    #[error("child template \"{name}\" already exists in \"{parent}\"")]
    DuplicateName { parent: String, name: String },

    /// Configured base directory does not exist or is not a directory
    #[error("templates base directory \"{}\" not found", path.display())]
    InvalidConfiguration { path: PathBuf },
}

impl TemplateError {
    pub fn file_not_found(file: impl Into<String>) -> Self {
        Self::FileNotFound { file: file.into() }
    }

    pub fn child_not_found(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ChildNotFound {
            parent: parent.into(),
            name: name.into(),
        }
    }

    pub fn duplicate(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            parent: parent.into(),
            name: name.into(),
        }
    }

    /// True for every "does not exist" condition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::ChildNotFound { .. } | Self::NodeNotFound(_)
        )
    }

    /// Short machine-readable code used in diagnostic markup
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } | Self::ChildNotFound { .. } | Self::NodeNotFound(_) => {
                "not-found"
            }
            Self::DuplicateName { .. } => "duplicate-name",
            Self::InvalidConfiguration { .. } => "invalid-configuration",
        }
    }
}
