use std::{fmt, rc::Rc};

use crate::{
    proofs::{
        generator::ProofGenerator,
        proof::{PfRule, ProofNode},
    },
    termdag::TermId,
    util::{HashMap, HashSet, IndexMap},
    Error,
};

/// Policy for adding a step for a fact that already has one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Overwrite {
    /// Always replace the existing step.
    Always,
    /// Replace the existing step only if it is an assumption.
    AssumeOnly,
    /// Never replace the existing step.
    Never,
}

impl fmt::Display for Overwrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overwrite::Always => f.write_str("ALWAYS"),
            Overwrite::AssumeOnly => f.write_str("ASSUME_ONLY"),
            Overwrite::Never => f.write_str("NEVER"),
        }
    }
}

fn premise_facts(node: &ProofNode) -> Vec<TermId> {
    node.children().iter().map(|c| c.conclusion()).collect()
}

#[derive(Clone)]
enum Entry {
    /// A step whose premises are referred to by their conclusions and are
    /// resolved when a proof is requested.
    Step {
        rule: PfRule,
        premises: Vec<TermId>,
        args: Vec<TermId>,
    },
    /// A finished proof.
    Node(Rc<ProofNode>),
}

impl Entry {
    fn rule(&self) -> PfRule {
        match self {
            Entry::Step { rule, .. } => *rule,
            Entry::Node(node) => node.rule(),
        }
    }

    fn same_step(&self, rule: PfRule, premises: &[TermId], args: &[TermId]) -> bool {
        match self {
            Entry::Step {
                rule: r,
                premises: p,
                args: a,
            } => *r == rule && p == premises && a == args,
            Entry::Node(node) => {
                node.rule() == rule && node.args() == args && premise_facts(node) == premises
            }
        }
    }
}

/// An open, mutable derivation: a map from facts to the step justifying
/// each of them.
///
/// Premises are linked by conclusion, so steps can be added in any order.
/// A fact without a step is an assumption: [`ProofAccumulator::proof_for`]
/// justifies it with an `ASSUME` leaf.
#[derive(Clone, Default)]
pub struct ProofAccumulator {
    steps: IndexMap<TermId, Entry>,
    name: String,
}

impl ProofAccumulator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            steps: IndexMap::default(),
            name: name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn should_overwrite(existing: &Entry, rule: PfRule, policy: Overwrite) -> bool {
        match policy {
            Overwrite::Always => true,
            Overwrite::AssumeOnly => existing.rule().is_assumption() && !rule.is_assumption(),
            Overwrite::Never => false,
        }
    }

    fn insert(&mut self, fact: TermId, entry: Entry, policy: Overwrite) -> bool {
        let rule = entry.rule();
        if let Some(existing) = self.steps.get(&fact) {
            if !Self::should_overwrite(existing, rule, policy) {
                // an assumption adds nothing to an existing justification
                if rule.is_assumption() {
                    return true;
                }
                let same = match &entry {
                    Entry::Node(node) => {
                        matches!(existing, Entry::Node(old) if Rc::ptr_eq(old, node))
                            || existing.same_step(rule, &premise_facts(node), node.args())
                    }
                    Entry::Step {
                        rule,
                        premises,
                        args,
                    } => existing.same_step(*rule, premises, args),
                };
                log::trace!(
                    "{}: kept existing step for t{fact} under policy {policy}",
                    self.name
                );
                return same;
            }
        }
        self.steps.insert(fact, entry);
        true
    }

    /// Records that `fact` follows by `rule` from the facts `premises`.
    /// Returns whether the accumulator now holds this step.
    pub fn add_step(
        &mut self,
        fact: TermId,
        rule: PfRule,
        premises: Vec<TermId>,
        args: Vec<TermId>,
        policy: Overwrite,
    ) -> bool {
        self.insert(
            fact,
            Entry::Step {
                rule,
                premises,
                args,
            },
            policy,
        )
    }

    /// Records `proof` as the justification of its conclusion. The proof is
    /// stored as is, not copied. Returns whether the accumulator now holds it.
    pub fn add_proof(&mut self, proof: Rc<ProofNode>, policy: Overwrite) -> bool {
        let fact = proof.conclusion();
        self.insert(fact, Entry::Node(proof), policy)
    }

    pub fn has_step(&self, fact: TermId) -> bool {
        self.steps.contains_key(&fact)
    }

    /// Whether `fact` is only assumed: it has no step, or its step is an
    /// assumption.
    pub fn is_assumption(&self, fact: TermId) -> bool {
        self.steps
            .get(&fact)
            .map_or(true, |entry| entry.rule().is_assumption())
    }

    /// Builds the proof of `fact`. Facts without a step are justified by
    /// `ASSUME` leaves, one shared leaf per fact.
    ///
    /// # Panics
    ///
    /// Panics if a step depends on its own conclusion.
    pub fn proof_for(&self, fact: TermId) -> Rc<ProofNode> {
        let mut built: HashMap<TermId, Rc<ProofNode>> = HashMap::default();
        let mut in_progress: HashSet<TermId> = HashSet::default();
        let mut stack = vec![(fact, false)];
        while let Some((cur, expanded)) = stack.pop() {
            if built.contains_key(&cur) {
                continue;
            }
            let node = match self.steps.get(&cur) {
                None => ProofNode::assume(cur),
                Some(Entry::Node(node)) => node.clone(),
                Some(Entry::Step {
                    rule,
                    premises,
                    args,
                }) => {
                    if !expanded {
                        if !in_progress.insert(cur) {
                            panic!("{}", Error::CyclicDerivation(format!("t{cur}")));
                        }
                        stack.push((cur, true));
                        for p in premises.iter().rev() {
                            if in_progress.contains(p) {
                                panic!("{}", Error::CyclicDerivation(format!("t{p}")));
                            }
                            if !built.contains_key(p) {
                                stack.push((*p, false));
                            }
                        }
                        continue;
                    }
                    in_progress.remove(&cur);
                    let children = premises.iter().map(|p| built[p].clone()).collect();
                    ProofNode::new(*rule, children, args.clone(), cur)
                }
            };
            built.insert(cur, node);
        }
        built.remove(&fact).unwrap_or_else(|| ProofNode::assume(fact))
    }
}

impl ProofGenerator for ProofAccumulator {
    fn get_proof_for(&mut self, fact: TermId) -> Option<Rc<ProofNode>> {
        Some(self.proof_for(fact))
    }

    fn identify(&self) -> String {
        self.name.clone()
    }
}
