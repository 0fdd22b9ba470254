//! Maps the Boolean and equality core rules onto a small clausal target
//! calculus.
//!
//! | source             | target                                         |
//! |--------------------|------------------------------------------------|
//! | `ASSUME`           | `assume`                                       |
//! | `SCOPE`            | `scope`                                        |
//! | `RESOLUTION`       | `R0` or `R1`, by the polarity argument         |
//! | `CHAIN_RESOLUTION` | one `R0`/`R1` step per resolved premise        |
//! | `REFL`             | `refl`                                         |
//! | `SYMM`             | `symm` or `neg_symm`, resolved with the premise |
//!
//! All other rules are kept.
use std::fmt;

use crate::{
    kind::Kind,
    proofs::{
        accumulator::{Overwrite, ProofAccumulator},
        checker::ClausalChecker,
        proof::PfRule,
        rewrite::{RuleHandler, RuleRegistry},
    },
    termdag::{TermDag, TermId},
};

/// Rules of the clausal target calculus.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TargetRule {
    Assume,
    Scope,
    /// Resolution with the pivot occurring negatively in the first clause.
    R0,
    /// Resolution with the pivot occurring positively in the first clause.
    R1,
    SmtRefl,
    /// `symm(; a, b)` concludes the clause `(not (= a b)), (= b a)`.
    SmtSymm,
    /// `neg_symm(; a, b)` concludes the clause `(= a b), (not (= b a))`.
    SmtSymmNeg,
}

impl fmt::Display for TargetRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetRule::Assume => "assume",
            TargetRule::Scope => "scope",
            TargetRule::R0 => "R0",
            TargetRule::R1 => "R1",
            TargetRule::SmtRefl => "refl",
            TargetRule::SmtSymm => "symm",
            TargetRule::SmtSymmNeg => "neg_symm",
        })
    }
}

fn resolution_rule(pol: bool) -> PfRule {
    PfRule::Target(if pol { TargetRule::R1 } else { TargetRule::R0 })
}

/// Renames a step, keeping premises and arguments.
struct Rename(TargetRule);

impl RuleHandler for Rename {
    fn rewrite(
        &mut self,
        _dag: &mut TermDag,
        conclusion: TermId,
        _rule: PfRule,
        premises: &[TermId],
        args: &[TermId],
        acc: &mut ProofAccumulator,
    ) -> bool {
        acc.add_step(
            conclusion,
            PfRule::Target(self.0),
            premises.to_vec(),
            args.to_vec(),
            Overwrite::Never,
        )
    }
}

/// `REFL(; t)` becomes `refl(; t)`.
struct Refl;

impl RuleHandler for Refl {
    fn rewrite(
        &mut self,
        _dag: &mut TermDag,
        conclusion: TermId,
        _rule: PfRule,
        _premises: &[TermId],
        args: &[TermId],
        acc: &mut ProofAccumulator,
    ) -> bool {
        if args.len() != 1 {
            return false;
        }
        acc.add_step(
            conclusion,
            PfRule::Target(TargetRule::SmtRefl),
            vec![],
            args.to_vec(),
            Overwrite::Never,
        )
    }
}

/// Binary and chain resolution become one binary step per resolved premise.
/// Intermediate resolvents are computed by [`ClausalChecker`].
struct Resolution;

impl RuleHandler for Resolution {
    fn rewrite(
        &mut self,
        dag: &mut TermDag,
        conclusion: TermId,
        _rule: PfRule,
        premises: &[TermId],
        args: &[TermId],
        acc: &mut ProofAccumulator,
    ) -> bool {
        let [first, rest @ ..] = premises else {
            return false;
        };
        if rest.is_empty() || args.len() != 2 * rest.len() {
            return false;
        }
        let mut steps = Vec::with_capacity(rest.len());
        let mut cur = *first;
        for (clause, pair) in rest.iter().zip(args.chunks(2)) {
            let Some(pol) = dag.get(pair[0]).as_bool() else {
                return false;
            };
            let Some(next) = ClausalChecker::resolve(dag, cur, *clause, pol, pair[1]) else {
                return false;
            };
            steps.push((next, resolution_rule(pol), vec![cur, *clause], pair[1]));
            cur = next;
        }
        if cur != conclusion {
            log::debug!(
                target: "proofdag::rewrite",
                "resolvent {} does not match {}",
                dag.to_string(cur),
                dag.to_string(conclusion)
            );
            return false;
        }
        // an intermediate resolvent that already has a step keeps it
        let mut added = false;
        for (fact, rule, clauses, pivot) in steps {
            added = acc.add_step(fact, rule, clauses, vec![pivot], Overwrite::Never);
        }
        added
    }
}

/// `SYMM` over `a = b` becomes the symmetry clause
/// `(not (= a b)), (= b a)` resolved against the premise; the disequality
/// case uses the negated symmetry clause.
struct Symm;

impl RuleHandler for Symm {
    fn rewrite(
        &mut self,
        dag: &mut TermDag,
        conclusion: TermId,
        _rule: PfRule,
        premises: &[TermId],
        _args: &[TermId],
        acc: &mut ProofAccumulator,
    ) -> bool {
        let [premise] = premises else {
            return false;
        };
        let (eq, positive) = match dag.kind(*premise) {
            Kind::Equal => (*premise, true),
            Kind::Not if dag.kind(dag.get(*premise).child(0)) == Kind::Equal => {
                (dag.get(*premise).child(0), false)
            }
            _ => return false,
        };
        let (a, b) = (dag.get(eq).child(0), dag.get(eq).child(1));
        let flipped = dag.mk_eq(b, a);
        let expected = if positive { flipped } else { dag.mk_not(flipped) };
        if conclusion != expected {
            return false;
        }
        if a == b {
            // the conclusion is the premise itself
            return true;
        }
        let (rule, pairing) = if positive {
            let neg = dag.mk_not(eq);
            (TargetRule::SmtSymm, dag.mk_sexpr([neg, flipped]))
        } else {
            let neg = dag.mk_not(flipped);
            (TargetRule::SmtSymmNeg, dag.mk_sexpr([eq, neg]))
        };
        acc.add_step(
            pairing,
            PfRule::Target(rule),
            vec![],
            vec![a, b],
            Overwrite::Never,
        );
        acc.add_step(
            conclusion,
            resolution_rule(!positive),
            vec![pairing, *premise],
            vec![eq],
            Overwrite::Never,
        )
    }
}

/// The registry mapping source rules onto [`TargetRule`]s. `TRUST`, `TRANS`,
/// `CONG` and the target rules themselves have no handler and are kept as
/// they are.
pub fn clausal_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.register(PfRule::Assume, Rename(TargetRule::Assume));
    registry.register(PfRule::Scope, Rename(TargetRule::Scope));
    registry.register(PfRule::Resolution, Resolution);
    registry.register(PfRule::ChainResolution, Resolution);
    registry.register(PfRule::Refl, Refl);
    registry.register(PfRule::Symm, Symm);
    registry
}
