//! Conflict resolution boundary.
//!
//! When local and remote saves diverge, the engine hands a formatted
//! comparison summary to a [`ConflictResolver`] and blocks until one of
//! exactly four decisions comes back. The resolver is the seam where a GUI
//! dialog, a terminal prompt, or a scripted test answer plugs in.

/// A decision for one divergence, consumed exactly once and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Push this machine's save over the cloud copy.
    KeepLocal,
    /// Pull the cloud save over the local copy.
    UseCloud,
    /// Keep a machine-tagged copy of the local save alongside whatever the
    /// reconciliation pass decides for the canonical name.
    KeepBoth,
    /// Stop without mutating anything further.
    Cancel,
}

impl Resolution {
    /// Parses the wire token form (`keep-local`, `use-cloud`, `keep-both`,
    /// `cancel`).
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "keep-local" => Some(Self::KeepLocal),
            "use-cloud" => Some(Self::UseCloud),
            "keep-both" => Some(Self::KeepBoth),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }

    /// The token form of this decision.
    pub fn token(&self) -> &'static str {
        match self {
            Self::KeepLocal => "keep-local",
            Self::UseCloud => "use-cloud",
            Self::KeepBoth => "keep-both",
            Self::Cancel => "cancel",
        }
    }
}

/// Resolves a divergence from a human-readable comparison summary.
///
/// May run synchronously and block for human input; the engine suspends the
/// sync run until a decision returns.
pub trait ConflictResolver: Send + Sync {
    /// Returns the decision for the given comparison summary.
    fn resolve(&self, preview: &str) -> Resolution;
}

impl<F> ConflictResolver for F
where
    F: Fn(&str) -> Resolution + Send + Sync,
{
    fn resolve(&self, preview: &str) -> Resolution {
        self(preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_roundtrip() {
        for res in [
            Resolution::KeepLocal,
            Resolution::UseCloud,
            Resolution::KeepBoth,
            Resolution::Cancel,
        ] {
            assert_eq!(Resolution::parse(res.token()), Some(res));
        }
    }

    #[test]
    fn unknown_token_rejected() {
        assert_eq!(Resolution::parse("merge"), None);
        assert_eq!(Resolution::parse(""), None);
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |_: &str| Resolution::UseCloud;
        assert_eq!(resolver.resolve("Save preview:"), Resolution::UseCloud);
    }
}
