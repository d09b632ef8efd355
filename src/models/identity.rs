use serde::{Deserialize, Serialize};

/// Caller identity normalized from validated token claims.
///
/// Lives in the request extensions for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub scope: String,
}

impl Identity {
    /// Name shown by the info endpoint
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "authenticated user",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let mut identity = Identity {
            id: "oid-1".to_string(),
            name: Some("Ada".to_string()),
            roles: vec![],
            scope: String::new(),
        };
        assert_eq!(identity.display_name(), "Ada");

        identity.name = None;
        assert_eq!(identity.display_name(), "authenticated user");

        identity.name = Some("  ".to_string());
        assert_eq!(identity.display_name(), "authenticated user");
    }
}
