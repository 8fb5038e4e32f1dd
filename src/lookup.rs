use crate::error::WatchResult;

/// What the outside world currently knows about a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    /// The character's name today, which differs from the queried name after a rename.
    pub name: String,
}

impl CanonicalRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Resolves whether a name still denotes a live character.
///
/// `Ok(None)` means the character is confirmed gone. Transient failures
/// must come back as `Err`, never as `Ok(None)`.
pub trait IdentityLookup {
    fn lookup(&self, name: &str) -> WatchResult<Option<CanonicalRecord>>;
}

impl<F> IdentityLookup for F
where
    F: Fn(&str) -> WatchResult<Option<CanonicalRecord>>,
{
    fn lookup(&self, name: &str) -> WatchResult<Option<CanonicalRecord>> {
        self(name)
    }
}
