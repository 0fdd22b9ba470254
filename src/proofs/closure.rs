use std::rc::Rc;

use crate::{
    options::ProofOptions,
    proofs::{
        checker::ProofChecker,
        generator::ProofGenerator,
        proof::{free_assumptions, ProofNode},
    },
    termdag::{TermDag, TermId},
    util::ListDisplay,
    Error,
};

/// The result of a closure check that did not fail.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Checking is disabled for this tag.
    Skipped,
    /// No generator was given and none was required.
    NoGenerator,
    /// The generator's proof is closed.
    Closed(Rc<ProofNode>),
}

/// The trust boundary for `(fact, generator)` pairs.
///
/// Whether a check runs is decided by [`ProofOptions::should_check`] for the
/// check's diagnostic tag. A running check asks the generator for its proof
/// and fails if there is none, if it concludes something else, or if it is
/// open: it has a free assumption that was not declared, or, when a checker
/// is configured, a leaf step that the checker does not validate.
pub struct ClosureGuard<'a> {
    options: &'a ProofOptions,
    checker: Option<&'a dyn ProofChecker>,
}

impl<'a> ClosureGuard<'a> {
    pub fn new(options: &'a ProofOptions) -> Self {
        Self {
            options,
            checker: None,
        }
    }

    /// Validates the leaves of checked proofs with `checker`.
    pub fn with_checker(mut self, checker: &'a dyn ProofChecker) -> Self {
        self.checker = Some(checker);
        self
    }

    pub fn check_closed(
        &self,
        dag: &mut TermDag,
        proven: TermId,
        generator: Option<&mut dyn ProofGenerator>,
        tag: &str,
        context: &str,
        require_generator: bool,
    ) -> Result<CheckOutcome, Error> {
        self.check_closed_wrt(dag, proven, generator, &[], tag, context, require_generator)
    }

    /// Like [`ClosureGuard::check_closed`], but the free assumptions in
    /// `assumptions` are allowed.
    #[allow(clippy::too_many_arguments)]
    pub fn check_closed_wrt(
        &self,
        dag: &mut TermDag,
        proven: TermId,
        generator: Option<&mut dyn ProofGenerator>,
        assumptions: &[TermId],
        tag: &str,
        context: &str,
        require_generator: bool,
    ) -> Result<CheckOutcome, Error> {
        if !self.options.should_check(tag) {
            return Ok(CheckOutcome::Skipped);
        }
        let Some(generator) = generator else {
            log::trace!(target: tag, "=== check closed: no generator in context {context}");
            if require_generator {
                return Err(Error::MissingGenerator {
                    context: context.to_string(),
                    tag: tag.to_string(),
                });
            }
            return Ok(CheckOutcome::NoGenerator);
        };
        let name = generator.identify();
        log::trace!(target: tag, "=== check closed: {name} in context {context}");
        log::trace!(target: tag, "check proof of {}", dag.to_string(proven));
        let Some(proof) = generator.get_proof_for(proven) else {
            return Err(Error::NullProof {
                generator: name,
                context: context.to_string(),
                tag: tag.to_string(),
            });
        };
        if log::log_enabled!(target: tag, log::Level::Trace) {
            let mut out = vec![];
            if ProofNode::dump(&proof, dag, &mut out).is_ok() {
                log::trace!(target: tag, "{}", String::from_utf8_lossy(&out));
            }
        }
        if proof.conclusion() != proven {
            return Err(Error::WrongConclusion {
                generator: name,
                context: context.to_string(),
                expected: dag.to_string(proven),
                actual: dag.to_string(proof.conclusion()),
            });
        }
        let open: Vec<TermId> = free_assumptions(&proof)
            .into_iter()
            .filter(|a| !assumptions.contains(a))
            .collect();
        if !open.is_empty() {
            return Err(Error::OpenProof {
                generator: name,
                context: context.to_string(),
                assumptions: ListDisplay(open.iter().map(|a| dag.to_string(*a)), ", ")
                    .to_string(),
                tag: tag.to_string(),
            });
        }
        if let Some(checker) = self.checker {
            for node in ProofNode::post_order(&proof) {
                if !node.is_leaf() || node.rule().is_assumption() {
                    continue;
                }
                if checker.check(dag, node.rule(), &[], node.args()) != Some(node.conclusion()) {
                    return Err(Error::UncheckedStep {
                        rule: node.rule(),
                        conclusion: dag.to_string(node.conclusion()),
                    });
                }
            }
        }
        log::trace!(target: tag, "====");
        Ok(CheckOutcome::Closed(proof))
    }

    /// Checks that `generator` has a closed proof of `proven`, if checking is
    /// enabled for `tag`.
    ///
    /// # Panics
    ///
    /// Panics if the check fails.
    pub fn ensure_closed(
        &self,
        dag: &mut TermDag,
        proven: TermId,
        generator: Option<&mut dyn ProofGenerator>,
        tag: &str,
        context: &str,
        require_generator: bool,
    ) {
        self.ensure_closed_wrt(dag, proven, generator, &[], tag, context, require_generator)
    }

    /// Like [`ClosureGuard::ensure_closed`], allowing the free assumptions in
    /// `assumptions`.
    ///
    /// # Panics
    ///
    /// Panics if the check fails.
    #[allow(clippy::too_many_arguments)]
    pub fn ensure_closed_wrt(
        &self,
        dag: &mut TermDag,
        proven: TermId,
        generator: Option<&mut dyn ProofGenerator>,
        assumptions: &[TermId],
        tag: &str,
        context: &str,
        require_generator: bool,
    ) {
        if let Err(err) = self.check_closed_wrt(
            dag,
            proven,
            generator,
            assumptions,
            tag,
            context,
            require_generator,
        ) {
            panic!("{err}");
        }
    }
}
