use std::rc::Rc;

use crate::{
    proofs::{
        accumulator::{Overwrite, ProofAccumulator},
        proof::ProofNode,
    },
    termdag::TermId,
    util::HashMap,
    Error,
};

/// Something that can justify facts on request.
///
/// Generators are handed across the closure guard
/// ([`ClosureGuard`](crate::ClosureGuard)) together with the facts they
/// claim to justify.
pub trait ProofGenerator {
    /// A proof concluding `fact`, or `None` if this generator has none.
    ///
    /// The default implementation is for generators that must never be
    /// asked and fails unconditionally.
    fn get_proof_for(&mut self, fact: TermId) -> Option<Rc<ProofNode>> {
        unimplemented!(
            "{} has no implementation of get_proof_for (asked for t{fact})",
            self.identify()
        )
    }

    /// Adds the proof of `fact` to `acc` under `policy`. Returns whether the
    /// accumulator now holds the proof.
    ///
    /// # Panics
    ///
    /// Panics if this generator has no proof of `fact`.
    fn add_proof_to(&mut self, fact: TermId, acc: &mut ProofAccumulator, policy: Overwrite) -> bool {
        log::trace!(target: "pfgen", "{}: add_proof_to t{fact}", self.identify());
        let Some(proof) = self.get_proof_for(fact) else {
            log::trace!(target: "pfgen", "...failed, no proof");
            panic!(
                "{}",
                Error::NoProof {
                    generator: self.identify(),
                    fact: format!("t{fact}"),
                }
            );
        };
        log::trace!(target: "pfgen", "...got proof {proof:?}");
        if acc.add_proof(proof, policy) {
            log::trace!(target: "pfgen", "...success!");
            true
        } else {
            log::trace!(target: "pfgen", "...failed to add proof");
            false
        }
    }

    /// A name for diagnostics.
    fn identify(&self) -> String;
}

/// A generator over proofs prepared ahead of time.
#[derive(Default)]
pub struct EagerProofGenerator {
    proofs: HashMap<TermId, Rc<ProofNode>>,
    name: String,
}

impl EagerProofGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            proofs: HashMap::default(),
            name: name.into(),
        }
    }

    /// Registers `proof` as the proof of `fact`, replacing any earlier one.
    pub fn set_proof_for(&mut self, fact: TermId, proof: Rc<ProofNode>) {
        debug_assert_eq!(proof.conclusion(), fact);
        self.proofs.insert(fact, proof);
    }

    pub fn has_proof_for(&self, fact: TermId) -> bool {
        self.proofs.contains_key(&fact)
    }
}

impl ProofGenerator for EagerProofGenerator {
    fn get_proof_for(&mut self, fact: TermId) -> Option<Rc<ProofNode>> {
        self.proofs.get(&fact).cloned()
    }

    fn identify(&self) -> String {
        self.name.clone()
    }
}
