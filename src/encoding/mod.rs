//! Encoding of terms into a binary, explicitly sorted target term algebra.
//!
//! The target algebra has no sort annotations on binders, no variadic
//! operators and no opaque skolems. [`TermEncoder`] rewrites terms of a
//! [`TermDag`] into it, in place:
//!
//! - sorts are reflected as terms of the uninterpreted sort `sortType`, and
//!   function sorts become nested `arrow` sorts
//! - a bound variable becomes `(bvar i T)`, where `i` is the position in
//!   which the encoder first saw it and `T` reflects its sort
//! - a skolem becomes `(skolem W)` where `W` encodes its witness form
//! - applications are curried through `apply`
//! - variadic operators become right-nested binary chains (see [`nary`])
//! - a binder over `x1 ... xk` becomes `k` nested single-variable binders,
//!   `xk` innermost
//! - `""` is `emptystr`, `"a"` is `(char 97)` and longer strings chain
//!   `str.++` over their characters
//!
//! Every operator the target algebra needs is minted once per
//! `(kind, sort, name)` and reused, so equal operators encode congruently.
pub mod nary;
mod sorts;
mod symbols;

use crate::{
    kind::Kind,
    termdag::{Payload, SortId, TermDag, TermId},
    util::{HashMap, IndexMap},
    Error,
};

use symbols::SymbolCache;

pub struct TermEncoder<'a> {
    dag: &'a mut TermDag,
    symbols: SymbolCache,
    /// The sort of sort reflections.
    sort_type: SortId,
    /// The term-level `arrow` constructor.
    arrow: TermId,
    converted_sorts: HashMap<SortId, SortId>,
    sort_as_term: HashMap<SortId, TermId>,
    term_as_sort: HashMap<TermId, SortId>,
    var_index: IndexMap<TermId, usize>,
    cache: HashMap<TermId, TermId>,
}

impl<'a> TermEncoder<'a> {
    pub fn new(dag: &'a mut TermDag) -> Self {
        let mut symbols = SymbolCache::default();
        let sort_type = dag.uninterpreted_sort("sortType");
        let arrow_sort = dag.function_sort(vec![sort_type, sort_type], sort_type);
        let arrow = symbols.get_or_mint(dag, Kind::SortConstructor, arrow_sort, "arrow", 0);
        Self {
            dag,
            symbols,
            sort_type,
            arrow,
            converted_sorts: HashMap::default(),
            sort_as_term: HashMap::default(),
            term_as_sort: HashMap::default(),
            var_index: IndexMap::default(),
            cache: HashMap::default(),
        }
    }

    pub fn dag(&self) -> &TermDag {
        self.dag
    }

    pub fn dag_mut(&mut self) -> &mut TermDag {
        self.dag
    }

    pub fn sort_type(&self) -> SortId {
        self.sort_type
    }

    /// The canonical target symbol for `(kind, sort, name)`.
    pub fn symbol(&mut self, kind: Kind, sort: SortId, name: &str) -> TermId {
        self.symbol_with(kind, sort, name, 0)
    }

    /// Like [`TermEncoder::symbol`], with a discriminant telling apart
    /// symbols that would otherwise share a key.
    pub fn symbol_with(
        &mut self,
        kind: Kind,
        sort: SortId,
        name: &str,
        discriminant: usize,
    ) -> TermId {
        self.symbols
            .get_or_mint(self.dag, kind, sort, name, discriminant)
    }

    /// Whether `t` was minted by this encoder.
    pub fn is_internal(&self, t: TermId) -> bool {
        self.symbols.is_internal(t)
    }

    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// The index assigned to the variable `v`, if the encoder has seen it.
    pub fn var_index(&self, v: TermId) -> Option<usize> {
        self.var_index.get(&v).copied()
    }

    fn index_of(&mut self, v: TermId) -> usize {
        let next = self.var_index.len();
        *self.var_index.entry(v).or_insert(next)
    }

    /// Encodes `root`. Shared subterms are encoded once per encoder.
    pub fn encode(&mut self, root: TermId) -> TermId {
        let mut stack = vec![(root, false)];
        while let Some((t, expanded)) = stack.pop() {
            if self.cache.contains_key(&t) {
                continue;
            }
            if !expanded {
                stack.push((t, true));
                for dep in self.dependencies(t).into_iter().rev() {
                    if !self.cache.contains_key(&dep) {
                        stack.push((dep, false));
                    }
                }
                continue;
            }
            let encoded = self.run_convert(t);
            if encoded != t {
                log::trace!(
                    target: "proofdag::encode",
                    "{} ~> {}",
                    self.dag.to_string(t),
                    self.dag.to_string(encoded)
                );
            }
            self.cache.insert(t, encoded);
        }
        self.cache[&root]
    }

    /// The terms that must be encoded before `t`.
    fn dependencies(&mut self, t: TermId) -> Vec<TermId> {
        if self.symbols.is_internal(t) {
            return vec![];
        }
        let term = self.dag.get(t);
        let kind = term.kind();
        match kind {
            Kind::BoundVarList => vec![],
            Kind::Skolem => self.dag.witness_form(t).into_iter().collect(),
            _ => {
                let mut deps = term.children().to_vec();
                if kind.is_nary() && deps.len() >= 2 {
                    deps.extend(self.null_terminator(kind));
                }
                deps
            }
        }
    }

    /// `f` applied to `arg` through the curried `apply` symbol.
    fn ho_link(&mut self, f: TermId, arg: TermId) -> TermId {
        let fsort = self.dag.sort_of(f);
        let asort = self.dag.sort_of(arg);
        let Some(range) = self.dag.apply_sort(fsort, &[asort]) else {
            panic!(
                "{}",
                Error::IllSorted {
                    op: Kind::HoApply.to_string(),
                    reason: format!(
                        "cannot apply {} to {}",
                        self.dag.sort_to_string(fsort),
                        self.dag.sort_to_string(asort)
                    ),
                }
            );
        };
        let link_sort = self.dag.function_sort(vec![fsort, asort], range);
        let apply = self.symbol(Kind::HoApply, link_sort, "apply");
        self.dag.mk_app(apply, [f, arg])
    }

    fn encode_char(&mut self, code_point: u32) -> TermId {
        let int = self.dag.int_sort();
        let string = self.dag.string_sort();
        let char_sort = self.dag.function_sort(vec![int], string);
        let op = self.symbol(Kind::ConstString, char_sort, "char");
        let c = self.dag.mk_int(i64::from(code_point));
        self.dag.mk_app(op, [c])
    }

    fn encode_string(&mut self, sort: SortId, code_points: &[u32]) -> TermId {
        match code_points {
            [] => self.symbol(Kind::ConstString, sort, "emptystr"),
            [c] => self.encode_char(*c),
            [init @ .., last] => {
                let mut ret = self.encode_char(*last);
                for c in init.iter().rev() {
                    let c = self.encode_char(*c);
                    ret = self.dag.mk_node(Kind::StringConcat, [c, ret]);
                }
                ret
            }
        }
    }

    fn encode_closure(&mut self, t: TermId, kind: Kind, body: TermId) -> TermId {
        let vars = self.dag.closure_vars(t).to_vec();
        let int = self.dag.int_sort();
        let bool_sort = self.dag.bool_sort();
        let name = kind.smt_name();
        let mut ret = body;
        for v in vars.iter().rev() {
            let vsort = self.dag.sort_of(*v);
            let ret_sort = self.dag.sort_of(ret);
            let link_sort = match kind {
                Kind::Forall | Kind::Exists => bool_sort,
                Kind::Witness => vsort,
                _ => self.dag.function_sort(vec![vsort], ret_sort),
            };
            let body_sort = self.dag.function_sort(vec![ret_sort], link_sort);
            let op_sort = self
                .dag
                .function_sort(vec![int, self.sort_type], body_sort);
            let op = self.symbol(kind, op_sort, name);
            let index = self.index_of(*v);
            let x = self.dag.mk_int(index as i64);
            let tc = self.reflect(vsort);
            let binder = self.dag.mk_app(op, [x, tc]);
            ret = self.dag.mk_app(binder, [ret]);
        }
        ret
    }

    /// Encodes `t`, whose dependencies are already encoded.
    fn run_convert(&mut self, t: TermId) -> TermId {
        if self.symbols.is_internal(t) {
            return t;
        }
        let term = self.dag.get(t).clone();
        let kind = term.kind();
        let sort = term.sort();
        if kind == Kind::BoundVarList {
            return t;
        }
        let children: Vec<TermId> = term.children().iter().map(|c| self.cache[c]).collect();
        match kind {
            Kind::BoundVariable => {
                let index = self.index_of(t);
                let x = self.dag.mk_int(index as i64);
                let tc = self.reflect(sort);
                let int = self.dag.int_sort();
                let op_sort = self.dag.function_sort(vec![int, self.sort_type], sort);
                let op = self.symbol(kind, op_sort, "bvar");
                self.dag.mk_app(op, [x, tc])
            }
            Kind::Skolem => {
                let Payload::Skolem { witness, .. } = term.payload() else {
                    return t;
                };
                let witness = self.cache[witness];
                let op_sort = self.dag.function_sort(vec![sort], sort);
                let op = self.symbol(kind, op_sort, "skolem");
                self.dag.mk_app(op, [witness])
            }
            Kind::ApplyUf => {
                let mut ret = children[0];
                for arg in &children[1..] {
                    ret = self.ho_link(ret, *arg);
                }
                ret
            }
            Kind::HoApply => self.ho_link(children[0], children[1]),
            Kind::ConstRational => {
                let int = self.dag.int_sort();
                let name = if sort == int { "int" } else { "real" };
                let op_sort = self.dag.function_sort(vec![sort], sort);
                let op = self.symbol(kind, op_sort, name);
                self.dag.mk_app(op, [t])
            }
            Kind::ConstString => match term.as_code_points() {
                Some(code_points) => self.encode_string(sort, code_points),
                None => t,
            },
            Kind::Ite => {
                let tc = self.reflect(sort);
                let bool_sort = self.dag.bool_sort();
                let branches = self.dag.function_sort(vec![bool_sort, sort, sort], sort);
                let op_sort = self.dag.function_sort(vec![self.sort_type], branches);
                let op = self.symbol(kind, op_sort, "ite");
                let ite = self.dag.mk_app(op, [tc]);
                self.dag.mk_app(ite, children)
            }
            Kind::Minus => {
                let op_sort = self.dag.function_sort(vec![sort, sort], sort);
                let op = self.symbol(kind, op_sort, "int.-");
                self.dag.mk_app(op, children)
            }
            k if k.is_closure() => self.encode_closure(t, kind, children[1]),
            k if k.is_nary() && children.len() >= 2 => self.flatten(kind, sort, children),
            k if k.is_leaf() => t,
            _ => {
                if children.as_slice() == term.children() {
                    t
                } else {
                    self.dag.mk_node(kind, children)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_variables_carry_index_and_sort() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let x = td.mk_bound_var("x", int);
        let y = td.mk_bound_var("y", int);
        let eq = td.mk_eq(x, y);
        let mut enc = TermEncoder::new(&mut td);
        let e = enc.encode(eq);
        assert_eq!(enc.dag().to_string(e), "(= (bvar 0 Int) (bvar 1 Int))");
        assert_eq!(enc.var_index(y), Some(1));
    }

    #[test]
    fn free_variables_and_booleans_pass_through() {
        let mut td = TermDag::default();
        let bool_ = td.bool_sort();
        let p = td.mk_var("p", bool_);
        let t = td.mk_bool(true);
        let eq = td.mk_eq(p, t);
        let mut enc = TermEncoder::new(&mut td);
        assert_eq!(enc.encode(eq), eq);
    }

    #[test]
    fn applications_are_curried() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let fsort = td.function_sort(vec![int, int], int);
        let f = td.mk_var("f", fsort);
        let a = td.mk_var("a", int);
        let b = td.mk_var("b", int);
        let app = td.mk_app(f, [a, b]);
        let mut enc = TermEncoder::new(&mut td);
        let e = enc.encode(app);
        assert_eq!(enc.dag().to_string(e), "(apply (apply f a) b)");
        assert_eq!(enc.dag().sort_of(e), int);
    }

    #[test]
    fn literals() {
        let mut td = TermDag::default();
        let empty = td.mk_string("");
        let abc = td.mk_string("ABC");
        let two = td.mk_int(2);
        let mut enc = TermEncoder::new(&mut td);
        let e = enc.encode(empty);
        assert_eq!(enc.dag().to_string(e), "emptystr");
        let e = enc.encode(abc);
        assert_eq!(
            enc.dag().to_string(e),
            "(str.++ (char 65) (str.++ (char 66) (char 67)))"
        );
        let e = enc.encode(two);
        assert_eq!(enc.dag().to_string(e), "(int 2)");
    }

    #[test]
    fn ite_carries_its_sort() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let bool_ = td.bool_sort();
        let c = td.mk_var("c", bool_);
        let a = td.mk_var("a", int);
        let b = td.mk_var("b", int);
        let ite = td.mk_node(Kind::Ite, [c, a, b]);
        let mut enc = TermEncoder::new(&mut td);
        let e = enc.encode(ite);
        assert_eq!(enc.dag().to_string(e), "((ite Int) c a b)");
    }

    #[test]
    fn binders_are_curried_last_variable_innermost() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let x = td.mk_bound_var("x", int);
        let y = td.mk_bound_var("y", int);
        let zero = td.mk_int(0);
        let body = td.mk_eq(x, zero);
        let q = td.mk_closure(Kind::Forall, &[x, y], body);
        let mut enc = TermEncoder::new(&mut td);
        let e = enc.encode(q);
        assert_eq!(
            enc.dag().to_string(e),
            "((forall 0 Int) ((forall 1 Int) (= (bvar 0 Int) (int 0))))"
        );
    }

    #[test]
    fn lambdas_keep_their_sort() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let x = td.mk_bound_var("x", int);
        let y = td.mk_bound_var("y", int);
        let body = td.mk_node(Kind::Minus, [x, y]);
        let lam = td.mk_closure(Kind::Lambda, &[x, y], body);
        let lam_sort = td.sort_of(lam);
        let mut enc = TermEncoder::new(&mut td);
        let e = enc.encode(lam);
        assert_eq!(enc.dag().sort_of(e), lam_sort);
    }

    #[test]
    fn skolems_encode_their_witness() {
        let mut td = TermDag::default();
        let int = td.int_sort();
        let x = td.mk_bound_var("x", int);
        let zero = td.mk_int(0);
        let body = td.mk_eq(x, zero);
        let w = td.mk_closure(Kind::Witness, &[x], body);
        let k = td.mk_skolem("k", w);
        let mut enc = TermEncoder::new(&mut td);
        let e = enc.encode(k);
        assert_eq!(
            enc.dag().to_string(e),
            "(skolem ((witness 0 Int) (= (bvar 0 Int) (int 0))))"
        );
        assert_eq!(enc.dag().sort_of(e), int);
    }
}
