//! Configuration and input validation
//!
//! Everything here runs before any network call. Rejections are reported as
//! [`ValidationError`] so forms can show the message verbatim.

use config::ConfigError;

/// Minimum password length accepted at sign-up
pub const SIGN_UP_PASSWORD_MIN: usize = 6;
/// Minimum length for a changed password
pub const NEW_PASSWORD_MIN: usize = 8;
/// Minimum display name length when one is given
pub const DISPLAY_NAME_MIN: usize = 2;
/// Largest spreadsheet accepted for upload
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// Spreadsheet extensions accepted for upload
pub const ALLOWED_UPLOAD_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Trait for validating configuration values
pub trait ValidateConfig {
    /// Validate the configuration
    ///
    /// Returns Ok(()) if valid, or an error describing what's wrong
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Client-side input rejection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password is required")]
    MissingPassword,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Name must be at least {min} characters")]
    DisplayNameTooShort { min: usize },

    #[error("Only Excel files (.xlsx, .xls) can be uploaded")]
    UnsupportedFileType,

    #[error("File exceeds {max_mb}MB (current: {actual_mb:.2}MB)")]
    FileTooLarge { max_mb: u64, actual_mb: f64 },
}

/// Validate an email address (`local@domain.tld`, no whitespace)
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail),
    }
}

/// Validate sign-in credentials
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    Ok(())
}

/// Validate sign-up input
pub fn validate_sign_up(
    email: &str,
    password: &str,
    display_name: Option<&str>,
) -> Result<(), ValidationError> {
    validate_email(email)?;
    if password.chars().count() < SIGN_UP_PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort {
            min: SIGN_UP_PASSWORD_MIN,
        });
    }
    if display_name.is_some_and(|name| name.trim().chars().count() < DISPLAY_NAME_MIN) {
        return Err(ValidationError::DisplayNameTooShort {
            min: DISPLAY_NAME_MIN,
        });
    }
    Ok(())
}

/// Validate a replacement password
pub fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < NEW_PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort {
            min: NEW_PASSWORD_MIN,
        });
    }
    Ok(())
}

/// Validate a replacement password against its confirmation
pub fn validate_password_change(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    validate_new_password(password)?;
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Validate a spreadsheet's name and size before upload
pub fn validate_upload_file(file_name: &str, size_bytes: u64) -> Result<(), ValidationError> {
    let extension = file_name
        .rfind('.')
        .map(|idx| file_name[idx..].to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedFileType);
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        #[allow(clippy::cast_precision_loss)]
        let actual_mb = size_bytes as f64 / (1024.0 * 1024.0);
        return Err(ValidationError::FileTooLarge {
            max_mb: MAX_UPLOAD_BYTES / (1024 * 1024),
            actual_mb,
        });
    }
    Ok(())
}

/// Common validation helpers
pub mod validators {
    use config::ConfigError;

    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::Message(format!("{field}: cannot be empty")));
        }
        Ok(())
    }

    /// Validate URL format, requiring an http(s) scheme
    pub fn validate_url(url: &str, field: &str) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| ConfigError::Message(format!("{field}: invalid URL - {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "{field}: URL scheme must be http or https"
            )));
        }
        Ok(())
    }

    /// Validate that a value is within range
    pub fn validate_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<(), ConfigError> {
        if value < min || value > max {
            return Err(ConfigError::Message(format!(
                "{field}: must be between {min} and {max}"
            )));
        }
        Ok(())
    }
}
