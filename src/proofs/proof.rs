use std::{
    fmt,
    io::{self, Write},
    rc::Rc,
};

use crate::{
    proofs::rule_mapper::TargetRule,
    termdag::{TermDag, TermId},
    util::{HEntry, HashMap, HashSet, IndexMap, IndexSet, ListDisplay},
};

/// Inference rules of the source derivations, plus the rules of the target
/// calculus produced by the clausal mapper.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PfRule {
    /// `ASSUME(; F)` concludes `F`. An assumption is free unless an
    /// enclosing `SCOPE` discharges it.
    Assume,
    /// `SCOPE(P; A1 ... An)` discharges the assumptions `A1 ... An` of `P`.
    Scope,
    /// A step taken on faith. Never validated by a checker.
    Trust,
    Refl,
    Symm,
    Trans,
    Cong,
    /// `RESOLUTION(C1, C2; pol, pivot)`.
    Resolution,
    /// `CHAIN_RESOLUTION(C1 ... Cn; pol1, pivot1 ... pol(n-1), pivot(n-1))`.
    ChainResolution,
    Target(TargetRule),
}

impl PfRule {
    pub fn is_assumption(self) -> bool {
        matches!(self, PfRule::Assume | PfRule::Target(TargetRule::Assume))
    }

    /// Rules whose arguments are assumptions discharged in their premises.
    pub fn is_scope(self) -> bool {
        matches!(self, PfRule::Scope | PfRule::Target(TargetRule::Scope))
    }
}

impl fmt::Display for PfRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PfRule::Assume => f.write_str("ASSUME"),
            PfRule::Scope => f.write_str("SCOPE"),
            PfRule::Trust => f.write_str("TRUST"),
            PfRule::Refl => f.write_str("REFL"),
            PfRule::Symm => f.write_str("SYMM"),
            PfRule::Trans => f.write_str("TRANS"),
            PfRule::Cong => f.write_str("CONG"),
            PfRule::Resolution => f.write_str("RESOLUTION"),
            PfRule::ChainResolution => f.write_str("CHAIN_RESOLUTION"),
            PfRule::Target(rule) => write!(f, "{rule}"),
        }
    }
}

/// A step of a derivation: a conclusion justified by a rule applied to
/// premise steps and extra argument terms.
///
/// Steps are immutable and shared through [`Rc`]; the identity of a step is
/// the identity of its allocation. Since a step can only point at steps that
/// existed before it, a graph of `Rc<ProofNode>`s is always acyclic.
pub struct ProofNode {
    rule: PfRule,
    children: Vec<Rc<ProofNode>>,
    args: Vec<TermId>,
    conclusion: TermId,
}

impl ProofNode {
    pub fn new(
        rule: PfRule,
        children: Vec<Rc<ProofNode>>,
        args: Vec<TermId>,
        conclusion: TermId,
    ) -> Rc<Self> {
        Rc::new(Self {
            rule,
            children,
            args,
            conclusion,
        })
    }

    /// The proof `ASSUME(; fact)`.
    pub fn assume(fact: TermId) -> Rc<Self> {
        Self::new(PfRule::Assume, vec![], vec![fact], fact)
    }

    pub fn rule(&self) -> PfRule {
        self.rule
    }

    pub fn children(&self) -> &[Rc<ProofNode>] {
        &self.children
    }

    pub fn args(&self) -> &[TermId] {
        &self.args
    }

    pub fn conclusion(&self) -> TermId {
        self.conclusion
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The distinct steps of the DAG rooted at `root`, premises before the
    /// steps that use them. `root` comes last.
    pub fn post_order(root: &Rc<ProofNode>) -> Vec<Rc<ProofNode>> {
        let mut res = vec![];
        let mut seen = HashSet::<*const ProofNode>::default();
        let mut stack = vec![(root, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                res.push(node.clone());
                continue;
            }
            if !seen.insert(Rc::as_ptr(node)) {
                continue;
            }
            stack.push((node, true));
            for child in node.children.iter().rev() {
                if !seen.contains(&Rc::as_ptr(child)) {
                    stack.push((child, false));
                }
            }
        }
        res
    }

    /// Writes the DAG rooted at `root` with one line per distinct step.
    /// Shared steps are printed once and referred to by id afterwards.
    pub fn dump(root: &Rc<ProofNode>, dag: &TermDag, writer: &mut impl Write) -> io::Result<()> {
        let mut printer = Printer::default();
        for node in Self::post_order(root) {
            printer.print_step(&node, dag, writer)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ProofNode {
    /// Printing the whole tree of a DAG with lots of sharing blows up
    /// exponentially, so only the top step is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({} ... [{}] => t{})",
            self.rule,
            ListDisplay(self.args.iter(), " "),
            self.conclusion
        )
    }
}

impl Drop for ProofNode {
    fn drop(&mut self) {
        // Unlink uniquely owned premises iteratively so that dropping a deep
        // derivation does not overflow the stack.
        let mut stack = std::mem::take(&mut self.children);
        while let Some(child) = stack.pop() {
            if let Ok(mut node) = Rc::try_unwrap(child) {
                stack.append(&mut node.children);
            }
        }
    }
}

/// Hashes and compares a step by identity.
#[derive(Clone)]
pub(crate) struct ByPtr(pub(crate) Rc<ProofNode>);

impl PartialEq for ByPtr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ByPtr {}

impl std::hash::Hash for ByPtr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state)
    }
}

#[derive(Default)]
struct Printer {
    ids: HashMap<*const ProofNode, usize>,
}

impl Printer {
    fn get_id(&mut self, node: &Rc<ProofNode>) -> usize {
        let len = self.ids.len();
        match self.ids.entry(Rc::as_ptr(node)) {
            HEntry::Occupied(o) => *o.get(),
            HEntry::Vacant(v) => *v.insert(len),
        }
    }

    fn print_step(
        &mut self,
        node: &Rc<ProofNode>,
        dag: &TermDag,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        let premises: Vec<String> = node
            .children
            .iter()
            .map(|c| format!("p{}", self.get_id(c)))
            .collect();
        let args: Vec<String> = node.args.iter().map(|a| dag.to_string(*a)).collect();
        let id = self.get_id(node);
        writeln!(
            writer,
            "let p{id} = {}({}; {}) : {}",
            node.rule,
            ListDisplay(&premises, ", "),
            ListDisplay(&args, ", "),
            dag.to_string(node.conclusion)
        )
    }
}

/// Maps every free assumption of the DAG rooted at `root` to the `ASSUME`
/// steps that introduce it.
///
/// An assumption is free when it is introduced by an `ASSUME` step that is
/// not beneath a `SCOPE` step listing it among its arguments. A step shared
/// between a scoped and an unscoped position is examined in both.
pub fn free_assumptions_map(root: &Rc<ProofNode>) -> IndexMap<TermId, Vec<Rc<ProofNode>>> {
    let mut amap: IndexMap<TermId, Vec<Rc<ProofNode>>> = IndexMap::default();
    // A context is the path of enclosing scope steps, together with the
    // assumptions they discharge.
    let mut contexts: IndexSet<Vec<*const ProofNode>> = IndexSet::default();
    let mut discharged: Vec<HashSet<TermId>> = vec![];
    contexts.insert(vec![]);
    discharged.push(HashSet::default());

    let mut visited = HashSet::<(*const ProofNode, usize)>::default();
    let mut stack = vec![(root, 0usize)];
    while let Some((node, ctx)) = stack.pop() {
        if !visited.insert((Rc::as_ptr(node), ctx)) {
            continue;
        }
        if node.rule.is_assumption() {
            if !discharged[ctx].contains(&node.conclusion) {
                let entry = amap.entry(node.conclusion).or_default();
                if !entry.iter().any(|a| Rc::ptr_eq(a, node)) {
                    entry.push(node.clone());
                }
            }
            continue;
        }
        let child_ctx = if node.rule.is_scope() && !node.args.is_empty() {
            let mut path = contexts[ctx].clone();
            path.push(Rc::as_ptr(node));
            let (id, is_new) = contexts.insert_full(path);
            if is_new {
                let mut inner = discharged[ctx].clone();
                inner.extend(node.args.iter().copied());
                discharged.push(inner);
            }
            id
        } else {
            ctx
        };
        for child in node.children.iter().rev() {
            stack.push((child, child_ctx));
        }
    }
    amap
}

/// The free assumptions of the DAG rooted at `root`, in the order they are
/// first found.
pub fn free_assumptions(root: &Rc<ProofNode>) -> Vec<TermId> {
    free_assumptions_map(root).into_keys().collect()
}

/// A derivation is closed when it has no free assumptions.
pub fn is_closed(root: &Rc<ProofNode>) -> bool {
    free_assumptions_map(root).is_empty()
}
