use std::fmt;

/// Jenkins API token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(****)")
    }
}

/// Everything needed to talk to a live Jenkins instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub token: Token,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_token() {
        let credentials = Credentials {
            base_url: "https://ci.example.com".to_string(),
            username: "deploy".to_string(),
            token: Token::from("s3cr3t"),
        };

        let printed = format!("{credentials:?}");
        assert!(printed.contains("deploy"));
        assert!(!printed.contains("s3cr3t"));
    }
}
