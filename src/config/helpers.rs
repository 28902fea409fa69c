use crate::error::ConfigError;

/// Read an env-style variable through `lookup`, treating empty values as unset.
pub(crate) fn optional_env<F>(lookup: &F, key: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

pub(crate) fn required_env<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional_env(lookup, key)?.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

pub(crate) fn parse_bool_env<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional_env(lookup, key)? {
        None => Ok(default),
        Some(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got '{}'", v),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(key: &str) -> Option<String> {
        match key {
            "SET" => Some("value".to_string()),
            "BLANK" => Some("   ".to_string()),
            "YES" => Some("Yes".to_string()),
            "BAD" => Some("maybe".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_optional_env_blank_is_unset() {
        assert_eq!(optional_env(&lookup, "BLANK").unwrap(), None);
        assert_eq!(optional_env(&lookup, "SET").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_required_env_missing() {
        let err = required_env(&lookup, "NOPE").unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("NOPE".to_string()));
    }

    #[test]
    fn test_parse_bool_env() {
        assert!(parse_bool_env(&lookup, "YES", false).unwrap());
        assert!(!parse_bool_env(&lookup, "NOPE", false).unwrap());
        assert!(parse_bool_env(&lookup, "BAD", false).is_err());
    }
}
