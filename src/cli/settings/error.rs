use std::fmt;

/// Why a `set`/`unset` invocation was rejected.
#[derive(Debug)]
pub enum SettingError {
    UnknownKey(String),
    UnknownTheme(String),
    /// A numeric value that did not parse or fell outside `min..=max`.
    OutOfRange {
        key: &'static str,
        input: String,
        min: u64,
        max: u64,
    },
    MissingValue {
        key: &'static str,
        example: &'static str,
    },
    /// The updated config could not be written.
    Save(String),
}

impl SettingError {
    /// Follow-up advice printed under the error line, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            SettingError::UnknownKey(_) => Some("Run 'relicard set' to list the available keys.".into()),
            SettingError::UnknownTheme(_) => Some("Run 'relicard themes' to list available themes.".into()),
            SettingError::MissingValue { example, .. } => Some(format!("Example: {example}")),
            SettingError::OutOfRange { .. } | SettingError::Save(_) => None,
        }
    }

    pub fn print(&self) {
        eprintln!("❌ {self}");
        if let Some(hint) = self.hint() {
            eprintln!("   {hint}");
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::UnknownTheme(id) => write!(f, "Unknown theme: {id}"),
            SettingError::OutOfRange {
                key,
                input,
                min,
                max,
            } => write!(f, "Invalid value for {key}: {input} (expected {min}-{max})"),
            SettingError::MissingValue { key, .. } => write!(f, "No value given for {key}"),
            SettingError::Save(msg) => write!(f, "Failed to save configuration: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}
