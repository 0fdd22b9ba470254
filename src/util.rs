use std::fmt::{self, Display};

pub const INTERNAL_SYMBOL_PREFIX: &str = "@";

pub(crate) type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasher>;
pub(crate) type HashSet<K> = hashbrown::HashSet<K, BuildHasher>;
pub(crate) type HEntry<'a, A, B> = hashbrown::hash_map::Entry<'a, A, B, BuildHasher>;
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type IndexSet<K> = indexmap::IndexSet<K, BuildHasher>;

/// Displays the items of a list separated by a separator.
pub struct ListDisplay<'a, TS>(pub TS, pub &'a str);

impl<TS> Display for ListDisplay<'_, TS>
where
    TS: Clone + IntoIterator,
    TS::Item: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut did_something = false;
        for item in self.0.clone().into_iter() {
            if did_something {
                f.write_str(self.1)?;
            }
            Display::fmt(&item, f)?;
            did_something = true;
        }
        Ok(())
    }
}

/// Generates fresh names for variables that were not given one.
/// These are guaranteed not to collide with user names because they use a
/// reserved prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolGen {
    count: usize,
    reserved_string: String,
}

impl SymbolGen {
    pub fn new(reserved_string: String) -> Self {
        Self {
            count: 0,
            reserved_string,
        }
    }

    pub fn fresh(&mut self, name_hint: &str) -> String {
        let s = format!("{}{}{}", self.reserved_string, name_hint, self.count);
        self.count += 1;
        s
    }
}

impl Default for SymbolGen {
    fn default() -> Self {
        Self::new(INTERNAL_SYMBOL_PREFIX.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_names_are_reserved_and_distinct() {
        let mut gen = SymbolGen::default();
        let a = gen.fresh("bv");
        let b = gen.fresh("bv");
        assert_ne!(a, b);
        assert!(a.starts_with(INTERNAL_SYMBOL_PREFIX));
    }

    #[test]
    fn list_display_separates() {
        assert_eq!(ListDisplay(vec![1, 2, 3], ", ").to_string(), "1, 2, 3");
        assert_eq!(ListDisplay(Vec::<u8>::new(), ", ").to_string(), "");
    }
}
