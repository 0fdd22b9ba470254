//! A bottom-up, memoized transformer for proof DAGs.
//!
//! [`ProofRewriter::process`] visits every distinct step of a DAG once,
//! premises first, and asks the [`RuleHandler`] registered for the step's
//! rule to replace it. Handlers write their replacement into a
//! [`ProofAccumulator`] that already holds the (rewritten) premises, so a
//! replacement may introduce any number of intermediate steps.
use std::rc::Rc;

use crate::{
    proofs::{
        accumulator::{Overwrite, ProofAccumulator},
        proof::{ByPtr, PfRule, ProofNode},
    },
    termdag::{TermDag, TermId},
    util::HashMap,
    Error,
};

/// What to do with a step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Decision {
    /// Ask the handler to replace the step.
    pub rewrite: bool,
    /// Process the premises of the step before the step itself. Otherwise
    /// the premises are used as they are.
    pub descend: bool,
}

impl Decision {
    pub const KEEP: Decision = Decision {
        rewrite: false,
        descend: true,
    };
    pub const REWRITE: Decision = Decision {
        rewrite: true,
        descend: true,
    };
}

pub trait RuleHandler {
    fn decide(&self, _node: &ProofNode) -> Decision {
        Decision::REWRITE
    }

    /// Justifies `conclusion` in `acc` by steps of the target vocabulary.
    ///
    /// `premises` are the conclusions of the step's premises, each of which
    /// already has a proof in `acc`. Returns `false` to decline, in which
    /// case the step is kept. A handler returning `true` must leave a step
    /// for `conclusion` in `acc`.
    fn rewrite(
        &mut self,
        dag: &mut TermDag,
        conclusion: TermId,
        rule: PfRule,
        premises: &[TermId],
        args: &[TermId],
        acc: &mut ProofAccumulator,
    ) -> bool;
}

/// Handlers by rule. Steps whose rule has no handler are kept.
#[derive(Default)]
pub struct RuleRegistry {
    handlers: HashMap<PfRule, Box<dyn RuleHandler>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `rule`, replacing any earlier handler.
    pub fn register(&mut self, rule: PfRule, handler: impl RuleHandler + 'static) {
        self.handlers.insert(rule, Box::new(handler));
    }

    pub fn handles(&self, rule: PfRule) -> bool {
        self.handlers.contains_key(&rule)
    }

    pub fn decide(&self, node: &ProofNode) -> Decision {
        match self.handlers.get(&node.rule()) {
            Some(handler) => handler.decide(node),
            None => Decision::KEEP,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Distinct steps visited.
    pub visited: usize,
    /// Steps replaced by a handler.
    pub rewritten: usize,
    /// Kept steps that were rebuilt over rewritten premises.
    pub rebuilt: usize,
    /// Steps a handler declined.
    pub declined: usize,
}

pub struct ProofRewriter {
    registry: RuleRegistry,
    stats: RewriteStats,
}

impl ProofRewriter {
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            stats: RewriteStats::default(),
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Statistics of the last call to [`ProofRewriter::process`].
    pub fn stats(&self) -> RewriteStats {
        self.stats
    }

    /// Rewrites the DAG rooted at `root`. The result concludes the same fact.
    ///
    /// Every distinct step is processed once, so a step shared by several
    /// consumers has a single replacement. A kept step is returned as is
    /// when none of its premises changed.
    ///
    /// # Panics
    ///
    /// Panics if a handler reports success without justifying the step's
    /// conclusion.
    pub fn process(&mut self, dag: &mut TermDag, root: &Rc<ProofNode>) -> Rc<ProofNode> {
        self.stats = RewriteStats::default();
        let mut memo: HashMap<ByPtr, Rc<ProofNode>> = HashMap::default();
        let mut stack = vec![(root.clone(), false)];
        while let Some((node, expanded)) = stack.pop() {
            let key = ByPtr(node);
            if memo.contains_key(&key) {
                continue;
            }
            let node = key.0.clone();
            let decision = self.registry.decide(&node);
            if !expanded && decision.descend && !node.is_leaf() {
                stack.push((node.clone(), true));
                for child in node.children().iter().rev() {
                    if !memo.contains_key(&ByPtr(child.clone())) {
                        stack.push((child.clone(), false));
                    }
                }
                continue;
            }
            let premises: Vec<Rc<ProofNode>> = if decision.descend {
                node.children()
                    .iter()
                    .map(|c| memo[&ByPtr(c.clone())].clone())
                    .collect()
            } else {
                node.children().to_vec()
            };
            self.stats.visited += 1;
            let replaced = if decision.rewrite {
                self.apply_handler(dag, &node, &premises)
            } else {
                None
            };
            let result = match replaced {
                Some(result) => result,
                None => {
                    let unchanged = premises
                        .iter()
                        .zip(node.children())
                        .all(|(p, c)| Rc::ptr_eq(p, c));
                    if unchanged {
                        node.clone()
                    } else {
                        self.stats.rebuilt += 1;
                        ProofNode::new(node.rule(), premises, node.args().to_vec(), node.conclusion())
                    }
                }
            };
            memo.insert(key, result);
        }
        log::debug!(target: "proofdag::rewrite", "{:?}", self.stats);
        memo.remove(&ByPtr(root.clone()))
            .unwrap_or_else(|| root.clone())
    }

    fn apply_handler(
        &mut self,
        dag: &mut TermDag,
        node: &Rc<ProofNode>,
        premises: &[Rc<ProofNode>],
    ) -> Option<Rc<ProofNode>> {
        let handler = self.registry.handlers.get_mut(&node.rule())?;
        let mut acc = ProofAccumulator::new(format!("rewrite {}", node.rule()));
        for p in premises {
            acc.add_proof(p.clone(), Overwrite::Never);
        }
        let facts: Vec<TermId> = premises.iter().map(|p| p.conclusion()).collect();
        let conclusion = node.conclusion();
        if !handler.rewrite(dag, conclusion, node.rule(), &facts, node.args(), &mut acc) {
            log::trace!(target: "proofdag::rewrite", "declined {}", node.rule());
            self.stats.declined += 1;
            return None;
        }
        if !acc.has_step(conclusion) {
            panic!(
                "{}",
                Error::UnjustifiedRewrite {
                    rule: node.rule(),
                    conclusion: dag.to_string(conclusion),
                }
            );
        }
        self.stats.rewritten += 1;
        Some(acc.proof_for(conclusion))
    }
}
