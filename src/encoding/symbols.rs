use crate::{
    kind::Kind,
    termdag::{SortId, TermDag, TermId},
    util::{HashSet, IndexMap},
    Symbol,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct SymbolKey {
    kind: Kind,
    sort: SortId,
    name: Symbol,
    discriminant: usize,
}

/// Mints the symbols of the target term algebra. Each key is minted once;
/// later requests return the same symbol.
///
/// Symbols are bound variables of the arena, so they never collide with
/// symbols of the input. The cache remembers them so that the encoder can
/// leave them alone.
#[derive(Debug, Default)]
pub(crate) struct SymbolCache {
    symbols: IndexMap<SymbolKey, TermId>,
    internal: HashSet<TermId>,
}

impl SymbolCache {
    pub(crate) fn get_or_mint(
        &mut self,
        dag: &mut TermDag,
        kind: Kind,
        sort: SortId,
        name: &str,
        discriminant: usize,
    ) -> TermId {
        let key = SymbolKey {
            kind,
            sort,
            name: name.into(),
            discriminant,
        };
        if let Some(sym) = self.symbols.get(&key) {
            return *sym;
        }
        let sym = dag.mk_bound_var(name, sort);
        log::trace!(
            target: "proofdag::encode",
            "minted {name} : {} for {kind}",
            dag.sort_to_string(sort)
        );
        self.symbols.insert(key, sym);
        self.internal.insert(sym);
        sym
    }

    pub(crate) fn is_internal(&self, t: TermId) -> bool {
        self.internal.contains(&t)
    }

    pub(crate) fn len(&self) -> usize {
        self.symbols.len()
    }
}
