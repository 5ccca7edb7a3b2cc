/// A story prompt the user actually typed something into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Rejects empty and whitespace-only input. The accepted text is kept
    /// exactly as typed.
    pub fn parse(input: &str) -> Option<Self> {
        if input.trim().is_empty() {
            None
        } else {
            Some(Self(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
