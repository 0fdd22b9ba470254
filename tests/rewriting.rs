use std::rc::Rc;

use proofdag::*;

fn ints(td: &mut TermDag, names: &[&str]) -> Vec<TermId> {
    let int = td.int_sort();
    names.iter().map(|n| td.mk_var(n, int)).collect()
}

fn count_rule(root: &Rc<ProofNode>, rule: PfRule) -> usize {
    ProofNode::post_order(root)
        .iter()
        .filter(|n| n.rule() == rule)
        .count()
}

#[test]
fn shared_steps_are_rewritten_once() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a", "b"]);
    let ab = td.mk_eq(v[0], v[1]);
    let ba = td.mk_eq(v[1], v[0]);
    let bb = td.mk_eq(v[1], v[1]);
    let p = ProofNode::assume(ab);
    let symm = ProofNode::new(PfRule::Symm, vec![p.clone()], vec![], ba);
    let root = ProofNode::new(PfRule::Trans, vec![symm, p], vec![], bb);

    let mut rewriter = ProofRewriter::new(clausal_registry());
    let out = rewriter.process(&mut td, &root);
    assert_eq!(out.conclusion(), bb);
    assert_eq!(out.rule(), PfRule::Trans);
    assert_eq!(count_rule(&out, PfRule::Target(TargetRule::Assume)), 1);
    assert_eq!(count_rule(&out, PfRule::Assume), 0);
    let stats = rewriter.stats();
    assert_eq!(stats.visited, 3);
    assert_eq!(stats.rewritten, 2);
    assert_eq!(stats.rebuilt, 1);
}

#[test]
fn unhandled_rules_pass_through_unchanged() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a", "b", "c"]);
    let ab = td.mk_eq(v[0], v[1]);
    let bc = td.mk_eq(v[1], v[2]);
    let ac = td.mk_eq(v[0], v[2]);
    let trust_ab = ProofNode::new(PfRule::Trust, vec![], vec![ab], ab);
    let trust_bc = ProofNode::new(PfRule::Trust, vec![], vec![bc], bc);
    let root = ProofNode::new(PfRule::Trans, vec![trust_ab, trust_bc], vec![], ac);

    let mut rewriter = ProofRewriter::new(clausal_registry());
    let out = rewriter.process(&mut td, &root);
    assert!(Rc::ptr_eq(&out, &root));
    assert_eq!(rewriter.stats().rewritten, 0);

    let mut empty = ProofRewriter::new(RuleRegistry::new());
    let p = ProofNode::assume(ab);
    assert!(Rc::ptr_eq(&empty.process(&mut td, &p), &p));
}

#[test]
fn symmetry_becomes_pairing_and_resolution() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a", "b"]);
    let (a, b) = (v[0], v[1]);
    let ab = td.mk_eq(a, b);
    let ba = td.mk_eq(b, a);
    let root = ProofNode::new(PfRule::Symm, vec![ProofNode::assume(ab)], vec![], ba);

    let mut rewriter = ProofRewriter::new(clausal_registry());
    let out = rewriter.process(&mut td, &root);
    assert_eq!(out.conclusion(), ba);
    assert_eq!(out.rule(), PfRule::Target(TargetRule::R0));
    assert_eq!(out.args(), &[ab]);
    let pairing = &out.children()[0];
    assert_eq!(pairing.rule(), PfRule::Target(TargetRule::SmtSymm));
    assert_eq!(pairing.args(), &[a, b]);
    assert_eq!(out.children()[1].conclusion(), ab);

    let checked = ClausalChecker.check(&mut td, pairing.rule(), &[], pairing.args());
    assert_eq!(checked, Some(pairing.conclusion()));
    let checked = ClausalChecker.check(
        &mut td,
        out.rule(),
        &[pairing.conclusion(), ab],
        out.args(),
    );
    assert_eq!(checked, Some(ba));
}

#[test]
fn negated_symmetry_uses_the_negated_pairing() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a", "b"]);
    let (a, b) = (v[0], v[1]);
    let ab = td.mk_eq(a, b);
    let ba = td.mk_eq(b, a);
    let not_ab = td.mk_not(ab);
    let not_ba = td.mk_not(ba);
    let root = ProofNode::new(PfRule::Symm, vec![ProofNode::assume(not_ab)], vec![], not_ba);

    let mut rewriter = ProofRewriter::new(clausal_registry());
    let out = rewriter.process(&mut td, &root);
    assert_eq!(out.rule(), PfRule::Target(TargetRule::R1));
    assert_eq!(
        out.children()[0].rule(),
        PfRule::Target(TargetRule::SmtSymmNeg)
    );
    let checked = ClausalChecker.check(
        &mut td,
        out.rule(),
        &[out.children()[0].conclusion(), not_ab],
        out.args(),
    );
    assert_eq!(checked, Some(not_ba));
}

#[test]
fn chain_resolution_becomes_binary_steps() {
    let mut td = TermDag::default();
    let bool_ = td.bool_sort();
    let [a, b, c] = ["A", "B", "C"].map(|n| td.mk_var(n, bool_));
    let c1 = td.mk_node(Kind::Or, [a, b]);
    let not_a = td.mk_not(a);
    let c2 = td.mk_node(Kind::Or, [not_a, c]);
    let c3 = td.mk_not(b);
    let t = td.mk_bool(true);
    let f = td.mk_bool(false);
    let root = ProofNode::new(
        PfRule::ChainResolution,
        vec![
            ProofNode::assume(c1),
            ProofNode::assume(c2),
            ProofNode::assume(c3),
        ],
        vec![t, a, t, b],
        c,
    );

    let mut rewriter = ProofRewriter::new(clausal_registry());
    let out = rewriter.process(&mut td, &root);
    assert_eq!(out.conclusion(), c);
    assert_eq!(out.rule(), PfRule::Target(TargetRule::R1));
    assert_eq!(out.args(), &[b]);
    let first = &out.children()[0];
    assert_eq!(first.rule(), PfRule::Target(TargetRule::R1));
    assert_eq!(first.args(), &[a]);
    let b_or_c = td.mk_node(Kind::Or, [b, c]);
    assert_eq!(first.conclusion(), b_or_c);
    assert_eq!(out.children()[1].conclusion(), c3);

    // a chain whose resolvent does not match is kept
    let wrong = ProofNode::new(
        PfRule::ChainResolution,
        vec![
            ProofNode::assume(c1),
            ProofNode::assume(c2),
            ProofNode::assume(c3),
        ],
        vec![t, a, t, b],
        f,
    );
    let out = rewriter.process(&mut td, &wrong);
    assert_eq!(out.rule(), PfRule::ChainResolution);
    assert_eq!(rewriter.stats().declined, 1);
}

struct Liar;

impl RuleHandler for Liar {
    fn rewrite(
        &mut self,
        _dag: &mut TermDag,
        _conclusion: TermId,
        _rule: PfRule,
        _premises: &[TermId],
        _args: &[TermId],
        _acc: &mut ProofAccumulator,
    ) -> bool {
        true
    }
}

#[test]
#[should_panic(expected = "handler for TRUST reported success without justifying")]
fn handlers_must_justify_the_conclusion() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a"]);
    let aa = td.mk_eq(v[0], v[0]);
    let mut registry = RuleRegistry::new();
    registry.register(PfRule::Trust, Liar);
    let mut rewriter = ProofRewriter::new(registry);
    rewriter.process(&mut td, &ProofNode::new(PfRule::Trust, vec![], vec![], aa));
}

struct KeepLeaves;

impl RuleHandler for KeepLeaves {
    fn decide(&self, node: &ProofNode) -> Decision {
        if node.is_leaf() {
            Decision::KEEP
        } else {
            Decision::REWRITE
        }
    }

    fn rewrite(
        &mut self,
        _dag: &mut TermDag,
        conclusion: TermId,
        _rule: PfRule,
        premises: &[TermId],
        _args: &[TermId],
        acc: &mut ProofAccumulator,
    ) -> bool {
        acc.add_step(
            conclusion,
            PfRule::Trust,
            premises.to_vec(),
            vec![],
            Overwrite::Never,
        )
    }
}

#[test]
fn handlers_decide_per_step() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a", "b"]);
    let ab = td.mk_eq(v[0], v[1]);
    let ba = td.mk_eq(v[1], v[0]);
    let leaf = ProofNode::new(PfRule::Trust, vec![], vec![ab], ab);
    let root = ProofNode::new(PfRule::Trust, vec![leaf.clone()], vec![ba], ba);
    let mut registry = RuleRegistry::new();
    registry.register(PfRule::Trust, KeepLeaves);
    assert!(registry.handles(PfRule::Trust));
    let mut rewriter = ProofRewriter::new(registry);
    let out = rewriter.process(&mut td, &root);
    assert!(!Rc::ptr_eq(&out, &root));
    assert!(out.args().is_empty());
    assert!(Rc::ptr_eq(&out.children()[0], &leaf));
}

struct Opaque;

impl RuleHandler for Opaque {
    fn decide(&self, _node: &ProofNode) -> Decision {
        Decision {
            rewrite: true,
            descend: false,
        }
    }

    fn rewrite(
        &mut self,
        _dag: &mut TermDag,
        conclusion: TermId,
        _rule: PfRule,
        premises: &[TermId],
        _args: &[TermId],
        acc: &mut ProofAccumulator,
    ) -> bool {
        acc.add_step(
            conclusion,
            PfRule::Trust,
            premises.to_vec(),
            vec![],
            Overwrite::Never,
        )
    }
}

#[test]
fn handlers_can_skip_the_premises() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a", "b"]);
    let ab = td.mk_eq(v[0], v[1]);
    let ba = td.mk_eq(v[1], v[0]);
    let symm = ProofNode::new(PfRule::Symm, vec![ProofNode::assume(ab)], vec![], ba);
    let root = ProofNode::new(PfRule::Cong, vec![symm.clone()], vec![], ba);

    // SYMM has a handler, but it is never reached below CONG
    let mut registry = clausal_registry();
    registry.register(PfRule::Cong, Opaque);
    let mut rewriter = ProofRewriter::new(registry);
    let out = rewriter.process(&mut td, &root);
    assert_eq!(out.rule(), PfRule::Trust);
    assert_eq!(out.conclusion(), ba);
    assert!(Rc::ptr_eq(&out.children()[0], &symm));
    assert_eq!(count_rule(&out, PfRule::Symm), 1);
    assert_eq!(count_rule(&out, PfRule::Target(TargetRule::R0)), 0);
    let stats = rewriter.stats();
    assert_eq!(stats.visited, 1);
    assert_eq!(stats.rewritten, 1);
}

#[test]
fn malformed_symmetry_is_declined() {
    let mut td = TermDag::default();
    let v = ints(&mut td, &["a", "b", "c"]);
    let ab = td.mk_eq(v[0], v[1]);
    let ca = td.mk_eq(v[2], v[0]);
    let root = ProofNode::new(PfRule::Symm, vec![ProofNode::assume(ab)], vec![], ca);

    let mut rewriter = ProofRewriter::new(clausal_registry());
    let out = rewriter.process(&mut td, &root);
    assert_eq!(out.rule(), PfRule::Symm);
    assert_eq!(out.conclusion(), ca);
    assert_eq!(count_rule(&out, PfRule::Target(TargetRule::SmtSymm)), 0);
    assert_eq!(rewriter.stats().declined, 1);
}
