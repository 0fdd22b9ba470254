use std::fmt;

use crate::{
    termdag::{SortId, TermDag, TermId},
    util::{HEntry, HashMap, IndexSet, SymbolGen},
    Error, Symbol,
};

/// Names a family of canonical bound variables. Two callers asking for a
/// variable for the same key term get the same variable only if they use the
/// same attribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BoundVarAttr(Symbol);

impl BoundVarAttr {
    pub fn new(name: &str) -> Self {
        BoundVarAttr(name.into())
    }
}

impl fmt::Display for BoundVarAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Constructs bound variables that are canonical for `(attribute, key)` pairs.
///
/// The cache is an explicit map owned by the manager. By default the caller
/// decides how long a key stays meaningful, and may drop stale entries with
/// [`BoundVarManager::purge_unretained`]. With
/// [`BoundVarManager::enable_keep_cache_values`] every key cached against is
/// retained, so its variable stays fixed for the lifetime of the manager.
#[derive(Debug)]
pub struct BoundVarManager {
    cache: HashMap<(BoundVarAttr, TermId), TermId>,
    keep_cache_values: bool,
    cache_values: IndexSet<TermId>,
    names: SymbolGen,
}

impl Default for BoundVarManager {
    fn default() -> Self {
        Self {
            cache: HashMap::default(),
            keep_cache_values: false,
            cache_values: IndexSet::default(),
            names: SymbolGen::default(),
        }
    }
}

impl BoundVarManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_keep_cache_values(&mut self, enabled: bool) {
        self.keep_cache_values = enabled;
    }

    /// Returns the bound variable of sort `sort` cached for `(attr, key)`,
    /// making and caching a fresh one if there is none.
    ///
    /// # Panics
    ///
    /// Panics if a variable is already cached for `(attr, key)` with a sort
    /// other than `sort`.
    pub fn mk_bound_var(
        &mut self,
        dag: &mut TermDag,
        attr: BoundVarAttr,
        key: TermId,
        sort: SortId,
    ) -> TermId {
        self.lookup_or_make(dag, attr, key, None, sort)
    }

    /// Same as [`BoundVarManager::mk_bound_var`], naming a freshly made
    /// variable `name`. A cached variable keeps the name it was made with.
    pub fn mk_bound_var_named(
        &mut self,
        dag: &mut TermDag,
        attr: BoundVarAttr,
        key: TermId,
        name: &str,
        sort: SortId,
    ) -> TermId {
        self.lookup_or_make(dag, attr, key, Some(name), sort)
    }

    fn lookup_or_make(
        &mut self,
        dag: &mut TermDag,
        attr: BoundVarAttr,
        key: TermId,
        name: Option<&str>,
        sort: SortId,
    ) -> TermId {
        match self.cache.entry((attr, key)) {
            HEntry::Occupied(entry) => {
                let var = *entry.get();
                let cached = dag.sort_of(var);
                if cached != sort {
                    panic!(
                        "{}",
                        Error::BoundVarSortMismatch {
                            attr,
                            key,
                            cached: dag.sort_to_string(cached),
                            requested: dag.sort_to_string(sort),
                        }
                    );
                }
                var
            }
            HEntry::Vacant(entry) => {
                let var = match name {
                    Some(name) => dag.mk_bound_var(name, sort),
                    None => {
                        let fresh = self.names.fresh("bv");
                        dag.mk_bound_var(&fresh, sort)
                    }
                };
                entry.insert(var);
                if self.keep_cache_values {
                    self.cache_values.insert(key);
                }
                log::trace!(target: "proofdag::bound_var", "cached {var} for ({attr}, {key})");
                var
            }
        }
    }

    /// The variable cached for `(attr, key)`, if any.
    pub fn get(&self, attr: BoundVarAttr, key: TermId) -> Option<TermId> {
        self.cache.get(&(attr, key)).copied()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn is_retained(&self, key: TermId) -> bool {
        self.cache_values.contains(&key)
    }

    /// Drops every cache entry whose key is neither retained nor reported
    /// live by `live`. Returns the number of dropped entries.
    pub fn purge_unretained(&mut self, live: impl Fn(TermId) -> bool) -> usize {
        let before = self.cache.len();
        let retained = &self.cache_values;
        self.cache
            .retain(|(_, key), _| retained.contains(key) || live(*key));
        before - self.cache.len()
    }

    /// A compound cache key for the ordered pair `(a, b)`.
    pub fn hash_pair(dag: &mut TermDag, a: TermId, b: TermId) -> TermId {
        dag.mk_sexpr([a, b])
    }

    /// A cache key for a small integer.
    pub fn hash_int(dag: &mut TermDag, i: u32) -> TermId {
        dag.mk_int(i64::from(i))
    }

    /// A compound cache key for the pair of `a` and a small integer.
    pub fn hash_with_int(dag: &mut TermDag, a: TermId, i: u32) -> TermId {
        let i = Self::hash_int(dag, i);
        Self::hash_pair(dag, a, i)
    }
}
