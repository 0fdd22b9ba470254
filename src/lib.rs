//! # proofdag
//! proofdag translates derivations produced by a reasoning engine into the
//! vocabulary and term algebra of an external proof calculus, while checking
//! that the derivation stays closed along the way.
//!
//! A derivation is a DAG of [`ProofNode`]s over terms hash-consed in a
//! [`TermDag`]. The pieces are:
//! - [`ClosureGuard`]: the trust boundary a `(derivation, generator)` pair
//!   must pass before it is used.
//! - [`ProofRewriter`]: a bottom-up, memoized proof-DAG transformer driven by
//!   a [`RuleRegistry`] of per-rule handlers. [`clausal_registry`] maps the
//!   source rules onto a small clausal target vocabulary ([`TargetRule`]).
//! - [`TermEncoder`]: re-encodes terms into a binary, explicitly sorted term
//!   algebra (sorts as terms, canonical symbols, flattened n-ary operators,
//!   curried binders).
//! - [`BoundVarManager`]: canonical bound variables keyed by terms.
//! - [`Pipeline`]: runs all of the above end to end.
//!
//! Violations of the contracts between these pieces (an open derivation
//! handed across the trust boundary, a sort reflected before it was
//! encoded, ...) are bugs in the caller and abort with a panic carrying an
//! [`Error`]. Expected outcomes such as a generator without a proof are
//! returned to the caller.
mod bound_var;
pub mod encoding;
mod kind;
mod options;
mod pipeline;
pub mod proofs;
mod sort;
mod termdag;
pub mod util;


pub use symbol_table::GlobalSymbol as Symbol;
use thiserror::Error;

pub use bound_var::{BoundVarAttr, BoundVarManager};
pub use encoding::TermEncoder;
pub use kind::Kind;
pub use options::ProofOptions;
pub use pipeline::{PassReport, Pipeline, Translation};
pub use proofs::{
    accumulator::{Overwrite, ProofAccumulator},
    checker::{ClausalChecker, ProofChecker},
    closure::{CheckOutcome, ClosureGuard},
    generator::{EagerProofGenerator, ProofGenerator},
    proof::{PfRule, ProofNode},
    rewrite::{Decision, ProofRewriter, RewriteStats, RuleHandler, RuleRegistry},
    rule_mapper::{clausal_registry, TargetRule},
};
pub use sort::Sort;
pub use termdag::{Payload, SortId, Term, TermDag, TermId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("ill-sorted application of {op}: {reason}")]
    IllSorted { op: String, reason: String },
    #[error("bound variable for ({attr}, {key}) was cached with sort {cached}, requested with sort {requested}")]
    BoundVarSortMismatch {
        attr: BoundVarAttr,
        key: TermId,
        cached: String,
        requested: String,
    },
    #[error("missing sort reflection for {0}")]
    MissingSortReflection(String),
    #[error("cyclic derivation: the step concluding {0} depends on itself")]
    CyclicDerivation(String),
    #[error("no generator in context {context}, trace {tag} for details")]
    MissingGenerator { context: String, tag: String },
    #[error("null proof from {generator} in context {context}, trace {tag} for details")]
    NullProof {
        generator: String,
        context: String,
        tag: String,
    },
    #[error("proof from {generator} in context {context} concludes {actual}, expected {expected}")]
    WrongConclusion {
        generator: String,
        context: String,
        expected: String,
        actual: String,
    },
    #[error("open proof from {generator} in context {context}, free assumptions: {assumptions}, trace {tag} for details")]
    OpenProof {
        generator: String,
        context: String,
        assumptions: String,
        tag: String,
    },
    #[error("leaf {rule} concluding {conclusion} is not justified by the checker")]
    UncheckedStep { rule: PfRule, conclusion: String },
    #[error("failed to get proof from generator {generator} for fact {fact}")]
    NoProof { generator: String, fact: String },
    #[error("handler for {rule} reported success without justifying {conclusion}")]
    UnjustifiedRewrite { rule: PfRule, conclusion: String },
    #[error("{generator} has no derivation of {goal}")]
    IncompleteDerivation { generator: String, goal: String },
}
