//! Binary encodings of variadic operators.
//!
//! An application `(op t1 ... tn)` with `n >= 2` becomes a right-nested
//! chain of binary applications. Operators with a neutral element end the
//! chain with it, so `(or A B (or C D))` encodes as
//! `(or A (or B (or (or C (or D false)) false)))` and stays distinguishable
//! from `(or A B C D)`. Operators without one fold from their last two
//! operands. `distinct` expands into a conjunction of pairwise `distinct`s.
use crate::{
    encoding::TermEncoder,
    kind::Kind,
    termdag::{SortId, TermId},
};

fn int_link_name(kind: Kind) -> Option<&'static str> {
    match kind {
        Kind::Plus => Some("int.+"),
        Kind::Mult => Some("int.*"),
        _ => None,
    }
}

impl TermEncoder<'_> {
    /// The neutral element closing chains of `kind`, as a source term.
    pub fn null_terminator(&mut self, kind: Kind) -> Option<TermId> {
        let dag = self.dag_mut();
        match kind {
            Kind::Or => Some(dag.mk_bool(false)),
            Kind::And => Some(dag.mk_bool(true)),
            Kind::Plus => Some(dag.mk_int(0)),
            Kind::Mult => Some(dag.mk_int(1)),
            Kind::StringConcat => Some(dag.mk_string("")),
            Kind::RegexpConcat => {
                let empty = dag.mk_string("");
                Some(dag.mk_node(Kind::StringToRegexp, [empty]))
            }
            _ => None,
        }
    }

    /// Encodes `(kind c1 ... cn)` over already encoded operands.
    pub(super) fn flatten(&mut self, kind: Kind, sort: SortId, mut children: Vec<TermId>) -> TermId {
        debug_assert!(children.len() >= 2);
        children.reverse();
        if kind == Kind::Distinct {
            let dag = self.dag_mut();
            let mut ret = dag.mk_node(kind, [children[0], children[1]]);
            for i in 0..children.len() {
                for j in i + 1..children.len() {
                    if (i, j) != (0, 1) {
                        let pair = dag.mk_node(kind, [children[i], children[j]]);
                        ret = dag.mk_node(Kind::And, [ret, pair]);
                    }
                }
            }
            return ret;
        }
        let (mut ret, rest) = match self.null_terminator(kind) {
            Some(null) => (self.encode(null), &children[..]),
            None => (children[0], &children[1..]),
        };
        let link = match int_link_name(kind) {
            Some(name) => {
                let link_sort = self.dag_mut().function_sort(vec![sort, sort], sort);
                Some(self.symbol(kind, link_sort, name))
            }
            None => None,
        };
        let dag = self.dag_mut();
        for c in rest {
            ret = match link {
                Some(op) => dag.mk_app(op, [*c, ret]),
                None => dag.mk_node(kind, [*c, ret]),
            };
        }
        ret
    }

    /// The curried operator of `t` as a standalone symbol named `f_<op>`,
    /// binary for variadic kinds. For an uninterpreted application this is
    /// the applied function. Leaves and binders have no operator.
    pub fn operator_of(&mut self, t: TermId) -> Option<TermId> {
        let term = self.dag().get(t).clone();
        let kind = term.kind();
        if kind.is_leaf() || kind.is_closure() || kind == Kind::BoundVarList {
            return None;
        }
        if kind == Kind::ApplyUf {
            return Some(term.child(0));
        }
        let mut args: Vec<SortId> = term
            .children()
            .iter()
            .map(|c| self.dag().sort_of(*c))
            .collect();
        if kind.is_nary() {
            args.truncate(2);
        }
        let ftype = self.dag_mut().function_sort(args, term.sort());
        let prefix = if kind.is_arithmetic() { "int." } else { "" };
        let name = format!("f_{prefix}{}", kind.smt_name());
        Some(self.symbol_with(kind, ftype, &name, 1))
    }

    /// Recovers the operands of an encoded null-terminated chain of `kind`.
    ///
    /// Returns `None` if `kind` has no neutral element or `encoded` is not
    /// such a chain. A nested chain in operand position is returned as one
    /// operand.
    pub fn decode_chain(&mut self, encoded: TermId, kind: Kind) -> Option<Vec<TermId>> {
        let null = self.null_terminator(kind)?;
        let end = self.encode(null);
        let link = int_link_name(kind);
        let mut operands = vec![];
        let mut cur = encoded;
        while cur != end {
            let term = self.dag().get(cur);
            let (operand, next) = match link {
                Some(name) => {
                    if term.kind() != Kind::ApplyUf || term.num_children() != 3 {
                        return None;
                    }
                    let op = term.child(0);
                    let is_link = self.is_internal(op)
                        && self.dag().get(op).name().is_some_and(|n| n.as_str() == name);
                    if !is_link {
                        return None;
                    }
                    (term.child(1), term.child(2))
                }
                None => {
                    if term.kind() != kind || term.num_children() != 2 {
                        return None;
                    }
                    (term.child(0), term.child(1))
                }
            };
            operands.push(operand);
            cur = next;
        }
        Some(operands)
    }
}
