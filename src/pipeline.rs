use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

use instant::{Duration, Instant};

use crate::{
    encoding::TermEncoder,
    options::ProofOptions,
    proofs::{
        checker::ProofChecker,
        closure::{CheckOutcome, ClosureGuard},
        generator::{EagerProofGenerator, ProofGenerator},
        proof::{free_assumptions, ProofNode},
        rewrite::{ProofRewriter, RewriteStats, RuleRegistry},
        rule_mapper::clausal_registry,
    },
    termdag::{TermDag, TermId},
    util::IndexMap,
    Error,
};

/// Timing and size information of one [`Pipeline::run`].
#[derive(Clone, Debug, Default)]
pub struct PassReport {
    pub check_time: Duration,
    pub rewrite_time: Duration,
    pub encode_time: Duration,
    /// Distinct steps of the input derivation.
    pub steps_in: usize,
    /// Distinct steps of the rewritten derivation.
    pub steps_out: usize,
    pub rewrite: RewriteStats,
    /// Symbols minted by the encoder.
    pub symbols: usize,
}

impl Display for PassReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "check {:.3}s, rewrite {:.3}s, encode {:.3}s",
            self.check_time.as_secs_f64(),
            self.rewrite_time.as_secs_f64(),
            self.encode_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "steps {} -> {}, rewritten {}, rebuilt {}, declined {}",
            self.steps_in,
            self.steps_out,
            self.rewrite.rewritten,
            self.rewrite.rebuilt,
            self.rewrite.declined
        )?;
        write!(f, "symbols {}", self.symbols)
    }
}

/// The result of translating a derivation.
pub struct Translation {
    /// The rewritten derivation.
    pub proof: Rc<ProofNode>,
    /// The encoding of each step conclusion of `proof`, in post-order.
    pub conclusions: IndexMap<TermId, TermId>,
    pub report: PassReport,
}

/// Closure check, rule rewriting and term encoding of a derivation.
pub struct Pipeline {
    options: ProofOptions,
    rewriter: ProofRewriter,
    checker: Option<Box<dyn ProofChecker>>,
    tag: String,
}

impl Pipeline {
    /// A pipeline translating to the clausal target rules of
    /// [`clausal_registry`].
    pub fn new(options: ProofOptions) -> Self {
        Self::with_registry(options, clausal_registry())
    }

    pub fn with_registry(options: ProofOptions, registry: RuleRegistry) -> Self {
        Self {
            options,
            rewriter: ProofRewriter::new(registry),
            checker: None,
            tag: "pipeline".to_string(),
        }
    }

    /// Validates leaf steps with `checker` during closure checks.
    pub fn with_checker(mut self, checker: impl ProofChecker + 'static) -> Self {
        self.checker = Some(Box::new(checker));
        self
    }

    /// The diagnostic tag of the pipeline's closure checks.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn options(&self) -> &ProofOptions {
        &self.options
    }

    fn guard(&self) -> ClosureGuard<'_> {
        let guard = ClosureGuard::new(&self.options);
        match &self.checker {
            Some(checker) => guard.with_checker(checker.as_ref()),
            None => guard,
        }
    }

    /// Translates the derivation of `goal` held by `generator`.
    ///
    /// When checking is enabled for the pipeline's tag, the input derivation
    /// must be closed and the rewritten one must be closed with respect to
    /// the free assumptions of the input.
    ///
    /// # Panics
    ///
    /// Panics if an enabled closure check fails.
    pub fn run(
        &mut self,
        dag: &mut TermDag,
        goal: TermId,
        generator: &mut dyn ProofGenerator,
    ) -> Result<Translation, Error> {
        let mut report = PassReport::default();
        let tag = self.tag.clone();

        let start = Instant::now();
        let outcome = self.guard().check_closed(
            dag,
            goal,
            Some(&mut *generator),
            &tag,
            "input derivation",
            true,
        );
        let checked = match outcome {
            Ok(CheckOutcome::Closed(proof)) => Some(proof),
            Ok(_) => None,
            Err(err) => panic!("{err}"),
        };
        report.check_time += start.elapsed();
        let input = match checked.or_else(|| generator.get_proof_for(goal)) {
            Some(proof) => proof,
            None => {
                return Err(Error::IncompleteDerivation {
                    generator: generator.identify(),
                    goal: dag.to_string(goal),
                })
            }
        };
        report.steps_in = ProofNode::post_order(&input).len();

        let start = Instant::now();
        let proof = self.rewriter.process(dag, &input);
        report.rewrite_time = start.elapsed();
        report.rewrite = self.rewriter.stats();
        let steps = ProofNode::post_order(&proof);
        report.steps_out = steps.len();

        let start = Instant::now();
        let allowed = free_assumptions(&input);
        let mut rewritten = EagerProofGenerator::new("rewritten derivation");
        rewritten.set_proof_for(goal, proof.clone());
        self.guard().ensure_closed_wrt(
            dag,
            goal,
            Some(&mut rewritten),
            &allowed,
            &tag,
            "rewritten derivation",
            true,
        );
        report.check_time += start.elapsed();

        let start = Instant::now();
        let mut encoder = TermEncoder::new(dag);
        let mut conclusions = IndexMap::default();
        for step in &steps {
            let fact = step.conclusion();
            if !conclusions.contains_key(&fact) {
                let encoded = encoder.encode(fact);
                conclusions.insert(fact, encoded);
            }
        }
        report.symbols = encoder.num_symbols();
        report.encode_time = start.elapsed();

        log::debug!(target: "proofdag::pipeline", "{report}");
        Ok(Translation {
            proof,
            conclusions,
            report,
        })
    }
}
