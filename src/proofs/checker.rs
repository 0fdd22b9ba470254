use crate::{
    kind::Kind,
    proofs::{proof::PfRule, rule_mapper::TargetRule},
    termdag::{TermDag, TermId},
};

/// Computes the conclusion of a single inference step.
pub trait ProofChecker {
    /// The conclusion of `rule` applied to premises concluding `premises`
    /// with arguments `args`, or `None` if the step is not valid or the rule
    /// is not checked here.
    fn check(
        &self,
        dag: &mut TermDag,
        rule: PfRule,
        premises: &[TermId],
        args: &[TermId],
    ) -> Option<TermId>;
}

/// Checks the Boolean and equality core rules, and the clausal rules they
/// are mapped to. `TRUST` and `CONG` are never accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClausalChecker;

impl ClausalChecker {
    /// The literals of `clause`, reading `false` as the empty clause and an
    /// s-expression as a clause over its children. A clause equal to the
    /// resolved literal is a unit clause even if it is a disjunction.
    fn literals(dag: &TermDag, clause: TermId, lit: TermId) -> Vec<TermId> {
        let term = dag.get(clause);
        if clause == lit {
            return vec![clause];
        }
        match term.kind() {
            Kind::Or | Kind::Sexpr => term.children().to_vec(),
            Kind::ConstBool if term.as_bool() == Some(false) => vec![],
            _ => vec![clause],
        }
    }

    fn mk_clause(dag: &mut TermDag, lits: Vec<TermId>) -> TermId {
        match lits.len() {
            0 => dag.mk_bool(false),
            1 => lits[0],
            _ => dag.mk_node(Kind::Or, lits),
        }
    }

    /// Resolves `c1` and `c2` on `pivot`. With `pol` the pivot occurs
    /// positively in `c1` and negatively in `c2`; otherwise the other way
    /// round. Only the first occurrence of each literal is removed.
    pub fn resolve(
        dag: &mut TermDag,
        c1: TermId,
        c2: TermId,
        pol: bool,
        pivot: TermId,
    ) -> Option<TermId> {
        let bool_sort = dag.bool_sort();
        if dag.sort_of(pivot) != bool_sort {
            return None;
        }
        let neg = dag.mk_not(pivot);
        let (l1, l2) = if pol { (pivot, neg) } else { (neg, pivot) };
        let mut lits = Self::literals(dag, c1, l1);
        let i = lits.iter().position(|l| *l == l1)?;
        lits.remove(i);
        let mut rest = Self::literals(dag, c2, l2);
        let j = rest.iter().position(|l| *l == l2)?;
        rest.remove(j);
        lits.extend(rest);
        Some(Self::mk_clause(dag, lits))
    }

    fn polarity(dag: &TermDag, arg: TermId) -> Option<bool> {
        dag.get(arg).as_bool()
    }

    fn eq_sides(dag: &TermDag, t: TermId) -> Option<(TermId, TermId)> {
        let term = dag.get(t);
        (term.kind() == Kind::Equal).then(|| (term.child(0), term.child(1)))
    }

    fn scope(dag: &mut TermDag, body: TermId, assumptions: &[TermId]) -> TermId {
        if assumptions.is_empty() {
            return body;
        }
        let antecedent = if assumptions.len() == 1 {
            assumptions[0]
        } else {
            dag.mk_node(Kind::And, assumptions.iter().copied())
        };
        if dag.get(body).as_bool() == Some(false) {
            dag.mk_not(antecedent)
        } else {
            dag.mk_node(Kind::Implies, [antecedent, body])
        }
    }
}

impl ProofChecker for ClausalChecker {
    fn check(
        &self,
        dag: &mut TermDag,
        rule: PfRule,
        premises: &[TermId],
        args: &[TermId],
    ) -> Option<TermId> {
        match (rule, premises, args) {
            (PfRule::Assume | PfRule::Target(TargetRule::Assume), [], [fact]) => Some(*fact),
            (PfRule::Scope | PfRule::Target(TargetRule::Scope), [body], assumptions) => {
                Some(Self::scope(dag, *body, assumptions))
            }
            (PfRule::Refl | PfRule::Target(TargetRule::SmtRefl), [], [t]) => {
                Some(dag.mk_eq(*t, *t))
            }
            (PfRule::Symm, [premise], []) => {
                if let Some((a, b)) = Self::eq_sides(dag, *premise) {
                    return Some(dag.mk_eq(b, a));
                }
                let term = dag.get(*premise);
                if term.kind() != Kind::Not {
                    return None;
                }
                let (a, b) = Self::eq_sides(dag, term.child(0))?;
                let eq = dag.mk_eq(b, a);
                Some(dag.mk_not(eq))
            }
            (PfRule::Trans, [first, rest @ ..], []) => {
                let (lhs, mut rhs) = Self::eq_sides(dag, *first)?;
                for premise in rest {
                    let (l, r) = Self::eq_sides(dag, *premise)?;
                    if l != rhs {
                        return None;
                    }
                    rhs = r;
                }
                Some(dag.mk_eq(lhs, rhs))
            }
            (PfRule::Resolution, [c1, c2], [pol, pivot]) => {
                let pol = Self::polarity(dag, *pol)?;
                Self::resolve(dag, *c1, *c2, pol, *pivot)
            }
            (PfRule::ChainResolution, [first, rest @ ..], args)
                if !rest.is_empty() && args.len() == 2 * rest.len() =>
            {
                let mut cur = *first;
                for (clause, pair) in rest.iter().zip(args.chunks(2)) {
                    let pol = Self::polarity(dag, pair[0])?;
                    cur = Self::resolve(dag, cur, *clause, pol, pair[1])?;
                }
                Some(cur)
            }
            (PfRule::Target(rule @ (TargetRule::R0 | TargetRule::R1)), [c1, c2], [pivot]) => {
                Self::resolve(dag, *c1, *c2, rule == TargetRule::R1, *pivot)
            }
            (PfRule::Target(TargetRule::SmtSymm), [], [a, b]) => {
                let eq = dag.mk_eq(*a, *b);
                let neg = dag.mk_not(eq);
                let flipped = dag.mk_eq(*b, *a);
                Some(dag.mk_sexpr([neg, flipped]))
            }
            (PfRule::Target(TargetRule::SmtSymmNeg), [], [a, b]) => {
                let eq = dag.mk_eq(*a, *b);
                let flipped = dag.mk_eq(*b, *a);
                let neg = dag.mk_not(flipped);
                Some(dag.mk_sexpr([eq, neg]))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(td: &mut TermDag, n: usize) -> Vec<TermId> {
        let bool_ = td.bool_sort();
        (0..n).map(|i| td.mk_var(&format!("l{i}"), bool_)).collect()
    }

    #[test]
    fn chain_resolution_removes_one_occurrence() {
        let mut td = TermDag::default();
        let l = lits(&mut td, 3);
        let c1 = td.mk_node(Kind::Or, [l[0], l[0], l[0], l[1], l[2]]);
        let c2 = td.mk_not(l[0]);
        let c3 = td.mk_not(l[1]);
        let t = td.mk_bool(true);
        let res = ClausalChecker.check(
            &mut td,
            PfRule::ChainResolution,
            &[c1, c2, c3],
            &[t, l[0], t, l[1]],
        );
        let expected = td.mk_node(Kind::Or, [l[0], l[0], l[2]]);
        assert_eq!(res, Some(expected));
    }

    #[test]
    fn resolution_to_the_empty_clause() {
        let mut td = TermDag::default();
        let l = lits(&mut td, 1);
        let neg = td.mk_not(l[0]);
        let f = td.mk_bool(false);
        let res = ClausalChecker.check(
            &mut td,
            PfRule::Target(TargetRule::R0),
            &[neg, l[0]],
            &[l[0]],
        );
        assert_eq!(res, Some(f));
    }

    #[test]
    fn missing_pivot_is_rejected() {
        let mut td = TermDag::default();
        let l = lits(&mut td, 2);
        let t = td.mk_bool(true);
        let res = ClausalChecker.check(&mut td, PfRule::Resolution, &[l[0], l[1]], &[t, l[0]]);
        assert_eq!(res, None);
    }

    #[test]
    fn symmetry_and_transitivity() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let a = td.mk_var("a", int);
        let b = td.mk_var("b", int);
        let c = td.mk_var("c", int);
        let ab = td.mk_eq(a, b);
        let bc = td.mk_eq(b, c);
        let ba = td.mk_eq(b, a);
        let ac = td.mk_eq(a, c);
        assert_eq!(ClausalChecker.check(&mut td, PfRule::Symm, &[ab], &[]), Some(ba));
        assert_eq!(
            ClausalChecker.check(&mut td, PfRule::Trans, &[ab, bc], &[]),
            Some(ac)
        );
        assert_eq!(ClausalChecker.check(&mut td, PfRule::Trans, &[bc, ab], &[]), None);
        assert_eq!(ClausalChecker.check(&mut td, PfRule::Trust, &[], &[ab]), None);
    }

    #[test]
    fn scope_concludes_an_implication() {
        let mut td = TermDag::default();
        let l = lits(&mut td, 2);
        let implies = td.mk_node(Kind::Implies, [l[0], l[1]]);
        assert_eq!(
            ClausalChecker.check(&mut td, PfRule::Scope, &[l[1]], &[l[0]]),
            Some(implies)
        );
        let f = td.mk_bool(false);
        let both = td.mk_node(Kind::And, [l[0], l[1]]);
        let refuted = td.mk_not(both);
        assert_eq!(
            ClausalChecker.check(&mut td, PfRule::Scope, &[f], &[l[0], l[1]]),
            Some(refuted)
        );
    }
}
