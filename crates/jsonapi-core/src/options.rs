//! Marshal configuration.

/// Options that change how records are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarshalOptions {
    /// Leave out empty to-one relationships instead of writing `"data": null`.
    pub omit_null_relations: bool,
    /// Inline every related record, ignoring per-relation `embedded` flags.
    pub embed_all: bool,
}

impl MarshalOptions {
    /// Default options: null to-one relations are written, undeclared
    /// relations are sideloaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether empty to-one relationships are left out.
    pub fn omit_null_relations(mut self, value: bool) -> Self {
        self.omit_null_relations = value;
        self
    }

    /// Set whether every relation is embedded.
    pub fn embed_all(mut self, value: bool) -> Self {
        self.embed_all = value;
        self
    }

    /// True if a relation declared with `embedded` should be inlined.
    pub(crate) fn embeds(&self, declared: bool) -> bool {
        declared || self.embed_all
    }
}
