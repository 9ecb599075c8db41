//! Workflow configuration.

use crate::task::domain::TransitionPolicy;
use thiserror::Error;

/// Bytes in one mebibyte.
const MIB: u64 = 1024 * 1024;

/// Who may delete uploaded documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeletionPolicy {
    /// Only the professional assigned to the document's task.
    #[default]
    AssignedProfessional,
    /// Any role, restricted to documents it uploaded itself.
    OwnUploads,
}

/// Limits applied to every upload request before any blob is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Maximum number of files per request.
    pub max_files: usize,
    /// Maximum size of a single file in bytes.
    pub max_file_bytes: u64,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_bytes: 10 * MIB,
            allowed_mime_types: [
                "image/jpeg",
                "image/png",
                "image/webp",
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "text/plain",
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

impl UploadPolicy {
    /// Returns whether `mime_type` is accepted. Parameters such as
    /// `; charset=utf-8` are ignored.
    #[must_use]
    pub fn accepts_mime_type(&self, mime_type: &str) -> bool {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&essence))
    }
}

/// Configuration for task lifecycle services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Validation applied to requested status changes.
    pub transition_policy: TransitionPolicy,
    /// Who may delete documents.
    pub deletion_policy: DeletionPolicy,
    /// Upload limits.
    pub upload_policy: UploadPolicy,
    /// How many times a commit is attempted when the task changes
    /// concurrently.
    pub max_commit_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            transition_policy: TransitionPolicy::Strict,
            deletion_policy: DeletionPolicy::AssignedProfessional,
            upload_policy: UploadPolicy::default(),
            max_commit_attempts: 3,
        }
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value that cannot be used.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },
}

impl WorkflowConfig {
    /// Creates a configuration that accepts any status change by an owner.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            transition_policy: TransitionPolicy::Permissive,
            ..Self::default()
        }
    }

    /// Sets the transition policy.
    #[must_use]
    pub const fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transition_policy = policy;
        self
    }

    /// Sets the deletion policy.
    #[must_use]
    pub const fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = policy;
        self
    }

    /// Sets the upload policy.
    #[must_use]
    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }

    /// Builds the configuration from `SERVICEDESK_*` environment variables,
    /// falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to an
    /// unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set to an
    /// unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("SERVICEDESK_TRANSITION_POLICY") {
            config.transition_policy = match value.trim().to_ascii_lowercase().as_str() {
                "strict" => TransitionPolicy::Strict,
                "permissive" | "legacy" => TransitionPolicy::Permissive,
                _ => return Err(invalid("SERVICEDESK_TRANSITION_POLICY", value)),
            };
        }
        if let Some(value) = lookup("SERVICEDESK_DELETION_POLICY") {
            config.deletion_policy = match value.trim().to_ascii_lowercase().as_str() {
                "assigned_professional" => DeletionPolicy::AssignedProfessional,
                "own_uploads" => DeletionPolicy::OwnUploads,
                _ => return Err(invalid("SERVICEDESK_DELETION_POLICY", value)),
            };
        }
        if let Some(value) = lookup("SERVICEDESK_MAX_UPLOAD_BYTES") {
            config.upload_policy.max_file_bytes =
                parse_positive("SERVICEDESK_MAX_UPLOAD_BYTES", value)?;
        }
        if let Some(value) = lookup("SERVICEDESK_MAX_UPLOAD_FILES") {
            config.upload_policy.max_files = parse_positive("SERVICEDESK_MAX_UPLOAD_FILES", value)?;
        }
        if let Some(value) = lookup("SERVICEDESK_MAX_COMMIT_ATTEMPTS") {
            config.max_commit_attempts = parse_positive("SERVICEDESK_MAX_COMMIT_ATTEMPTS", value)?;
        }
        Ok(config)
    }
}

const fn invalid(key: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue { key, value }
}

fn parse_positive<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(invalid(key, value)),
    }
}
