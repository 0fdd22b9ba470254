use crate::util::IndexSet;

/// Options controlling proof production and closure checking.
#[derive(Debug, Clone)]
pub struct ProofOptions {
    /// Global switch for proof production. With proofs disabled every
    /// closure check is a no-op.
    pub proofs_enabled: bool,
    /// Check closure at every guard, not only at guards whose diagnostic tag
    /// is traced.
    pub eager_checking: bool,
    /// Diagnostic tags whose closure checks run even without eager checking.
    pub traced_tags: IndexSet<String>,
}

impl Default for ProofOptions {
    fn default() -> Self {
        Self {
            proofs_enabled: true,
            eager_checking: false,
            traced_tags: IndexSet::default(),
        }
    }
}

impl ProofOptions {
    pub fn with_proofs_enabled(mut self, enabled: bool) -> Self {
        self.proofs_enabled = enabled;
        self
    }

    pub fn with_eager_checking(mut self, eager: bool) -> Self {
        self.eager_checking = eager;
        self
    }

    pub fn with_traced_tag(mut self, tag: impl Into<String>) -> Self {
        self.traced_tags.insert(tag.into());
        self
    }

    /// A tag is traced if it was registered with
    /// [`ProofOptions::with_traced_tag`] or if the installed logger accepts
    /// trace records with the tag as target.
    pub fn is_traced(&self, tag: &str) -> bool {
        self.traced_tags.contains(tag) || log::log_enabled!(target: tag, log::Level::Trace)
    }

    /// Whether a closure check labelled `tag` should run.
    pub fn should_check(&self, tag: &str) -> bool {
        self.proofs_enabled && (self.eager_checking || self.is_traced(tag))
    }
}
