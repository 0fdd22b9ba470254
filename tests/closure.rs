use std::rc::Rc;

use proofdag::*;

struct Setup {
    td: TermDag,
    a: TermId,
    b: TermId,
    a_to_b: TermId,
}

fn setup() -> Setup {
    let mut td = TermDag::default();
    let bool_ = td.bool_sort();
    let a = td.mk_var("a", bool_);
    let b = td.mk_var("b", bool_);
    let a_to_b = td.mk_node(Kind::Implies, [a, b]);
    Setup { td, a, b, a_to_b }
}

/// `SCOPE(TRUST(ASSUME(; a); b); a)`, concluding `a => b`.
fn scoped(s: &Setup) -> Rc<ProofNode> {
    let trust = ProofNode::new(PfRule::Trust, vec![ProofNode::assume(s.a)], vec![s.b], s.b);
    ProofNode::new(PfRule::Scope, vec![trust], vec![s.a], s.a_to_b)
}

fn eager() -> ProofOptions {
    ProofOptions::default().with_eager_checking(true)
}

#[test]
fn closed_proofs_pass_repeatedly() {
    let mut s = setup();
    let goal = s.a_to_b;
    let mut generator = EagerProofGenerator::new("scoped");
    generator.set_proof_for(goal, scoped(&s));
    let options = eager();
    let guard = ClosureGuard::new(&options);
    let first = guard.check_closed(&mut s.td, goal, Some(&mut generator), "closed", "test", true);
    let second = guard.check_closed(&mut s.td, goal, Some(&mut generator), "closed", "test", true);
    match (first, second) {
        (Ok(CheckOutcome::Closed(p1)), Ok(CheckOutcome::Closed(p2))) => {
            assert!(Rc::ptr_eq(&p1, &p2))
        }
        res => panic!("expected two closed outcomes, got {res:?}"),
    }
    guard.ensure_closed(&mut s.td, goal, Some(&mut generator), "closed", "test", true);
}

#[test]
fn checks_only_run_when_enabled() {
    let mut s = setup();
    let mut generator = EagerProofGenerator::new("empty");
    let options = ProofOptions::default();
    let guard = ClosureGuard::new(&options);
    let res = guard.check_closed(&mut s.td, s.a, Some(&mut generator), "quiet", "test", true);
    assert!(matches!(res, Ok(CheckOutcome::Skipped)));

    let options = eager().with_proofs_enabled(false);
    let guard = ClosureGuard::new(&options);
    guard.ensure_closed(&mut s.td, s.a, Some(&mut generator), "quiet", "test", true);

    let options = ProofOptions::default().with_traced_tag("loud");
    let guard = ClosureGuard::new(&options);
    let res = guard.check_closed(&mut s.td, s.a, Some(&mut generator), "loud", "test", true);
    assert!(matches!(res, Err(Error::NullProof { .. })));
}

#[test]
fn missing_optional_generator_is_noted() {
    let mut s = setup();
    let options = eager();
    let guard = ClosureGuard::new(&options);
    let res = guard.check_closed(&mut s.td, s.a, None, "closed", "test", false);
    assert!(matches!(res, Ok(CheckOutcome::NoGenerator)));
}

#[test]
#[should_panic(expected = "no generator in context lemma, trace closed for details")]
fn missing_required_generator_is_fatal() {
    let mut s = setup();
    let options = eager();
    ClosureGuard::new(&options).ensure_closed(&mut s.td, s.a, None, "closed", "lemma", true);
}

#[test]
#[should_panic(expected = "null proof from empty in context lemma")]
fn null_proofs_are_fatal() {
    let mut s = setup();
    let mut generator = EagerProofGenerator::new("empty");
    let options = eager();
    ClosureGuard::new(&options).ensure_closed(
        &mut s.td,
        s.a,
        Some(&mut generator),
        "closed",
        "lemma",
        false,
    );
}

#[test]
#[should_panic(expected = "open proof from open in context lemma, free assumptions: a")]
fn open_proofs_are_fatal() {
    let mut s = setup();
    let mut generator = EagerProofGenerator::new("open");
    let trust = ProofNode::new(PfRule::Trust, vec![ProofNode::assume(s.a)], vec![s.b], s.b);
    generator.set_proof_for(s.b, trust);
    let options = eager();
    ClosureGuard::new(&options).ensure_closed(
        &mut s.td,
        s.b,
        Some(&mut generator),
        "closed",
        "lemma",
        true,
    );
}

#[test]
fn declared_assumptions_may_stay_open() {
    let mut s = setup();
    let mut generator = EagerProofGenerator::new("open");
    let trust = ProofNode::new(PfRule::Trust, vec![ProofNode::assume(s.a)], vec![s.b], s.b);
    generator.set_proof_for(s.b, trust);
    let options = eager();
    let guard = ClosureGuard::new(&options);
    guard.ensure_closed_wrt(&mut s.td, s.b, Some(&mut generator), &[s.a], "closed", "lemma", true);
    let res = guard.check_closed_wrt(&mut s.td, s.b, Some(&mut generator), &[], "closed", "lemma", true);
    assert!(matches!(res, Err(Error::OpenProof { .. })));
}

#[test]
fn the_checker_validates_leaves() {
    let mut s = setup();
    let mut generator = EagerProofGenerator::new("scoped");
    generator.set_proof_for(s.a_to_b, scoped(&s));
    let options = eager();
    let guard = ClosureGuard::new(&options).with_checker(&ClausalChecker);
    let res = guard.check_closed(&mut s.td, s.a_to_b, Some(&mut generator), "closed", "lemma", true);
    assert!(matches!(res, Ok(CheckOutcome::Closed(_))));

    // a trusted leaf is not accepted by the checker
    let mut trusted = EagerProofGenerator::new("trusted");
    trusted.set_proof_for(s.b, ProofNode::new(PfRule::Trust, vec![], vec![s.b], s.b));
    let res = guard.check_closed(&mut s.td, s.b, Some(&mut trusted), "closed", "lemma", true);
    assert!(matches!(res, Err(Error::UncheckedStep { rule: PfRule::Trust, .. })));
}

#[test]
fn accumulators_answer_with_assumptions() {
    let mut s = setup();
    let mut acc = ProofAccumulator::new("acc");
    acc.add_step(s.b, PfRule::Trust, vec![], vec![], Overwrite::Never);
    let options = eager();
    let guard = ClosureGuard::new(&options);
    let res = guard.check_closed(&mut s.td, s.a, Some(&mut acc), "closed", "lemma", true);
    assert!(matches!(res, Err(Error::OpenProof { .. })));
    let res = guard.check_closed(&mut s.td, s.b, Some(&mut acc), "closed", "lemma", true);
    assert!(matches!(res, Ok(CheckOutcome::Closed(_))));
}

/// Answers every request with the same proof.
struct Stubborn(Rc<ProofNode>);

impl ProofGenerator for Stubborn {
    fn get_proof_for(&mut self, _fact: TermId) -> Option<Rc<ProofNode>> {
        Some(self.0.clone())
    }

    fn identify(&self) -> String {
        "stubborn".to_string()
    }
}

#[test]
fn wrong_conclusions_are_reported() {
    let mut s = setup();
    let mut generator = Stubborn(scoped(&s));
    let options = eager();
    let guard = ClosureGuard::new(&options);
    let res = guard.check_closed(&mut s.td, s.a, Some(&mut generator), "closed", "lemma", true);
    match res {
        Err(Error::WrongConclusion {
            expected, actual, ..
        }) => {
            assert_eq!(expected, "a");
            assert_eq!(actual, "(=> a b)");
        }
        res => panic!("expected a wrong conclusion, got {res:?}"),
    }
}

#[test]
fn overwrite_policies() {
    let s = setup();
    let assumed = ProofNode::assume(s.b);
    let trusted = ProofNode::new(PfRule::Trust, vec![], vec![s.b], s.b);
    let other = ProofNode::new(PfRule::Trust, vec![], vec![s.a, s.b], s.b);

    let mut generator = EagerProofGenerator::new("trusted");
    generator.set_proof_for(s.b, trusted.clone());

    // Never keeps whatever is there
    let mut acc = ProofAccumulator::new("never");
    acc.add_proof(assumed.clone(), Overwrite::Never);
    assert!(!generator.add_proof_to(s.b, &mut acc, Overwrite::Never));
    assert!(acc.is_assumption(s.b));

    // AssumeOnly replaces assumptions but not steps
    let mut acc = ProofAccumulator::new("assume-only");
    acc.add_proof(assumed.clone(), Overwrite::Never);
    assert!(generator.add_proof_to(s.b, &mut acc, Overwrite::AssumeOnly));
    assert!(Rc::ptr_eq(&acc.proof_for(s.b), &trusted));
    acc.add_proof(other.clone(), Overwrite::AssumeOnly);
    assert!(Rc::ptr_eq(&acc.proof_for(s.b), &trusted));

    // Always replaces steps
    assert!(acc.add_proof(other.clone(), Overwrite::Always));
    assert!(Rc::ptr_eq(&acc.proof_for(s.b), &other));

    // adding the same step again is a success under any policy
    assert!(acc.add_proof(other, Overwrite::Never));
}

#[test]
#[should_panic(expected = "failed to get proof from generator empty")]
fn adding_a_missing_proof_is_fatal() {
    let s = setup();
    let mut generator = EagerProofGenerator::new("empty");
    let mut acc = ProofAccumulator::new("acc");
    generator.add_proof_to(s.a, &mut acc, Overwrite::Never);
}
