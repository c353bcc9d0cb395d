/// CircleCI API token. Never printed in debug output.
#[derive(Clone)]
pub struct Token(String);

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
