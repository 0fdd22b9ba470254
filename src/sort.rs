use lazy_static::lazy_static;

use crate::{termdag::SortId, Symbol};

lazy_static! {
    static ref BOOL_SORT_NAME: Symbol = "Bool".into();
    static ref INT_SORT_NAME: Symbol = "Int".into();
    static ref REAL_SORT_NAME: Symbol = "Real".into();
    static ref STRING_SORT_NAME: Symbol = "String".into();
    static ref REGLAN_SORT_NAME: Symbol = "RegLan".into();
    static ref SEXPR_SORT_NAME: Symbol = "SExpr".into();
}

/// A sort of the term language. Sorts are hash-consed in a
/// [`TermDag`](crate::TermDag) and referred to by [`SortId`].
///
/// Function sorts are curried: `Function { args: [A, B], range: C }` is the
/// sort of a function taking an `A` and a `B` to a `C`. Sorts built through
/// [`TermDag::function_sort`](crate::TermDag::function_sort) never have a
/// function range.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Sort {
    Bool,
    Int,
    Real,
    String,
    RegLan,
    /// The sort of s-expressions, used for pairings and variable lists.
    Sexpr,
    Uninterpreted(Symbol),
    Function { args: Vec<SortId>, range: SortId },
    /// An applied sort constructor such as `(arrow A B)`.
    Constructor { name: Symbol, args: Vec<SortId> },
}

impl Sort {
    /// The name of an atomic sort, or of the head of a constructed sort.
    pub fn name(&self) -> Option<Symbol> {
        match self {
            Sort::Bool => Some(*BOOL_SORT_NAME),
            Sort::Int => Some(*INT_SORT_NAME),
            Sort::Real => Some(*REAL_SORT_NAME),
            Sort::String => Some(*STRING_SORT_NAME),
            Sort::RegLan => Some(*REGLAN_SORT_NAME),
            Sort::Sexpr => Some(*SEXPR_SORT_NAME),
            Sort::Uninterpreted(name) => Some(*name),
            Sort::Constructor { name, .. } => Some(*name),
            Sort::Function { .. } => None,
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Sort::Int | Sort::Real)
    }
}
