use std::fmt::{self, Write};

use num::{BigInt, BigRational, Signed};
use smallvec::SmallVec;

use crate::{
    kind::Kind,
    sort::Sort,
    util::{HashMap, IndexSet, ListDisplay},
    Error, Symbol,
};

/// An opaque handle to a [`Term`] stored in a [`TermDag`].
///
/// Terms are hash-consed, so two ids are equal exactly when the terms they
/// denote are structurally equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TermId(usize);

impl TermId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque handle to a [`Sort`] stored in a [`TermDag`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SortId(usize);

impl SortId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Data attached to leaf terms.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Payload {
    None,
    Bool(bool),
    Rational(BigRational),
    /// A string literal as a sequence of code points.
    String(Vec<u32>),
    /// A variable. Variables with the same name are still distinct values,
    /// told apart by `id`.
    Var { name: Symbol, id: usize },
    /// A skolem together with its witness form `(witness ((x T)) P)`.
    Skolem { name: Symbol, witness: TermId },
}

/// A node of the term language: an operator, its children and its sort.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Term {
    kind: Kind,
    payload: Payload,
    children: SmallVec<[TermId; 3]>,
    sort: SortId,
}

impl Term {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn children(&self) -> &[TermId] {
        &self.children
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, i: usize) -> TermId {
        self.children[i]
    }

    pub fn sort(&self) -> SortId {
        self.sort
    }

    /// The name of a variable or skolem.
    pub fn name(&self) -> Option<Symbol> {
        match &self.payload {
            Payload::Var { name, .. } | Payload::Skolem { name, .. } => Some(*name),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.payload {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_code_points(&self) -> Option<&[u32]> {
        match &self.payload {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A hashconsing arena for [`Term`]s and [`Sort`]s.
///
/// Terms refer to their children and sorts indirectly via [`TermId`]s and
/// [`SortId`]s that map into this arena. Nothing is ever removed, so an id
/// stays valid for the lifetime of the dag.
#[derive(Clone, Debug, Default)]
pub struct TermDag {
    /// A bidirectional map between deduplicated terms and indices.
    nodes: IndexSet<Term>,
    sorts: IndexSet<Sort>,
    fresh_vars: usize,
}

impl TermDag {
    /// Returns the number of terms in this dag.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Convert the given id to the corresponding term.
    ///
    /// Panics if the id does not belong to this dag.
    pub fn get(&self, id: TermId) -> &Term {
        match self.nodes.get_index(id.0) {
            Some(term) => term,
            None => panic!("term id {id} is not part of this dag"),
        }
    }

    /// Convert the given id to the corresponding sort.
    ///
    /// Panics if the id does not belong to this dag.
    pub fn get_sort(&self, id: SortId) -> &Sort {
        match self.sorts.get_index(id.0) {
            Some(sort) => sort,
            None => panic!("sort id {} is not part of this dag", id.0),
        }
    }

    pub fn kind(&self, id: TermId) -> Kind {
        self.get(id).kind
    }

    pub fn sort_of(&self, id: TermId) -> SortId {
        self.get(id).sort
    }

    fn add(&mut self, term: Term) -> TermId {
        TermId(self.nodes.insert_full(term).0)
    }

    // ---------------------------------------------------------------- sorts

    pub fn add_sort(&mut self, sort: Sort) -> SortId {
        SortId(self.sorts.insert_full(sort).0)
    }

    pub fn bool_sort(&mut self) -> SortId {
        self.add_sort(Sort::Bool)
    }

    pub fn int_sort(&mut self) -> SortId {
        self.add_sort(Sort::Int)
    }

    pub fn real_sort(&mut self) -> SortId {
        self.add_sort(Sort::Real)
    }

    pub fn string_sort(&mut self) -> SortId {
        self.add_sort(Sort::String)
    }

    pub fn reglan_sort(&mut self) -> SortId {
        self.add_sort(Sort::RegLan)
    }

    pub fn sexpr_sort(&mut self) -> SortId {
        self.add_sort(Sort::Sexpr)
    }

    pub fn uninterpreted_sort(&mut self, name: &str) -> SortId {
        self.add_sort(Sort::Uninterpreted(name.into()))
    }

    /// The curried function sort `args -> range`. With no arguments this is
    /// just `range`.
    ///
    /// Function sorts are kept flat: a function range is merged into the
    /// argument list, so `A -> (B -> C)` and `(A, B) -> C` are the same sort.
    pub fn function_sort(&mut self, mut args: Vec<SortId>, range: SortId) -> SortId {
        if args.is_empty() {
            return range;
        }
        let range = match self.get_sort(range) {
            Sort::Function {
                args: inner,
                range: inner_range,
            } => {
                args.extend_from_slice(inner);
                *inner_range
            }
            _ => range,
        };
        self.add_sort(Sort::Function { args, range })
    }

    pub fn constructor_sort(&mut self, name: &str, args: Vec<SortId>) -> SortId {
        self.add_sort(Sort::Constructor {
            name: name.into(),
            args,
        })
    }

    /// Whether a parameter of sort `param` accepts an argument of sort `arg`.
    /// Integers are accepted where reals are expected.
    pub fn sort_accepts(&self, param: SortId, arg: SortId) -> bool {
        param == arg
            || (matches!(self.get_sort(param), Sort::Real)
                && matches!(self.get_sort(arg), Sort::Int))
    }

    /// The sort obtained by applying a function of sort `fsort` to arguments
    /// of sorts `args`, looking through curried ranges. Returns `None` if the
    /// application is ill-sorted.
    pub fn apply_sort(&mut self, fsort: SortId, args: &[SortId]) -> Option<SortId> {
        let mut current = fsort;
        let mut remaining = args;
        while !remaining.is_empty() {
            let Sort::Function { args: params, range } = self.get_sort(current).clone() else {
                return None;
            };
            let n = params.len().min(remaining.len());
            for (p, a) in params.iter().zip(remaining.iter()) {
                if !self.sort_accepts(*p, *a) {
                    return None;
                }
            }
            remaining = &remaining[n..];
            current = if n < params.len() {
                self.function_sort(params[n..].to_vec(), range)
            } else {
                range
            };
        }
        Some(current)
    }

    /// Renders a sort in SMT-LIB style.
    pub fn sort_to_string(&self, id: SortId) -> String {
        match self.get_sort(id) {
            Sort::Function { args, range } => format!(
                "(-> {} {})",
                ListDisplay(args.iter().map(|a| self.sort_to_string(*a)), " "),
                self.sort_to_string(*range)
            ),
            Sort::Constructor { name, args } if !args.is_empty() => format!(
                "({} {})",
                name,
                ListDisplay(args.iter().map(|a| self.sort_to_string(*a)), " ")
            ),
            sort => sort.name().map(|n| n.to_string()).unwrap_or_default(),
        }
    }

    // ---------------------------------------------------------------- leaves

    pub fn mk_bool(&mut self, value: bool) -> TermId {
        let sort = self.bool_sort();
        self.add(Term {
            kind: Kind::ConstBool,
            payload: Payload::Bool(value),
            children: SmallVec::new(),
            sort,
        })
    }

    /// An integer constant of sort `Int`.
    pub fn mk_int(&mut self, value: i64) -> TermId {
        let sort = self.int_sort();
        self.add(Term {
            kind: Kind::ConstRational,
            payload: Payload::Rational(BigRational::from_integer(BigInt::from(value))),
            children: SmallVec::new(),
            sort,
        })
    }

    /// A rational constant of sort `Real`.
    pub fn mk_real(&mut self, value: BigRational) -> TermId {
        let sort = self.real_sort();
        self.add(Term {
            kind: Kind::ConstRational,
            payload: Payload::Rational(value),
            children: SmallVec::new(),
            sort,
        })
    }

    pub fn mk_string(&mut self, value: &str) -> TermId {
        self.mk_string_from_code_points(value.chars().map(u32::from).collect())
    }

    pub fn mk_string_from_code_points(&mut self, value: Vec<u32>) -> TermId {
        let sort = self.string_sort();
        self.add(Term {
            kind: Kind::ConstString,
            payload: Payload::String(value),
            children: SmallVec::new(),
            sort,
        })
    }

    fn mk_fresh_var(&mut self, kind: Kind, name: &str, sort: SortId) -> TermId {
        let id = self.fresh_vars;
        self.fresh_vars += 1;
        self.add(Term {
            kind,
            payload: Payload::Var {
                name: name.into(),
                id,
            },
            children: SmallVec::new(),
            sort,
        })
    }

    /// Make a fresh free variable. Every call yields a new variable, even for
    /// a name that was used before.
    pub fn mk_var(&mut self, name: &str, sort: SortId) -> TermId {
        self.mk_fresh_var(Kind::Variable, name, sort)
    }

    /// Make a fresh bound variable.
    pub fn mk_bound_var(&mut self, name: &str, sort: SortId) -> TermId {
        self.mk_fresh_var(Kind::BoundVariable, name, sort)
    }

    /// Make the skolem whose value is the witness of `witness`, which must be
    /// a `witness` closure. Skolems with the same name and witness form are
    /// the same term.
    pub fn mk_skolem(&mut self, name: &str, witness: TermId) -> TermId {
        let w = self.get(witness);
        if w.kind != Kind::Witness {
            panic!(
                "{}",
                Error::IllSorted {
                    op: Kind::Skolem.to_string(),
                    reason: format!("witness form has kind {}", w.kind),
                }
            );
        }
        let sort = w.sort;
        self.add(Term {
            kind: Kind::Skolem,
            payload: Payload::Skolem {
                name: name.into(),
                witness,
            },
            children: SmallVec::new(),
            sort,
        })
    }

    /// The witness form of a skolem.
    pub fn witness_form(&self, skolem: TermId) -> Option<TermId> {
        match self.get(skolem).payload {
            Payload::Skolem { witness, .. } => Some(witness),
            _ => None,
        }
    }

    // ---------------------------------------------------------------- operators

    fn ill_sorted(&self, kind: Kind, reason: impl Into<String>) -> ! {
        panic!(
            "{}",
            Error::IllSorted {
                op: kind.to_string(),
                reason: reason.into(),
            }
        )
    }

    fn arith_sort(&mut self, kind: Kind, children: &[TermId]) -> SortId {
        let mut real = false;
        for c in children {
            match self.get_sort(self.sort_of(*c)) {
                Sort::Int => {}
                Sort::Real => real = true,
                _ => self.ill_sorted(kind, "operand is not arithmetic"),
            }
        }
        if real {
            self.real_sort()
        } else {
            self.int_sort()
        }
    }

    fn expect_sort(&mut self, kind: Kind, children: &[TermId], sort: Sort) {
        let expected = self.add_sort(sort);
        for c in children {
            if self.sort_of(*c) != expected {
                let found = self.sort_to_string(self.sort_of(*c));
                self.ill_sorted(
                    kind,
                    format!(
                        "expected operand of sort {}, found {found}",
                        self.sort_to_string(expected)
                    ),
                );
            }
        }
    }

    fn expect_arity(&self, kind: Kind, children: &[TermId], ok: bool) {
        if !ok {
            self.ill_sorted(kind, format!("{} operands", children.len()));
        }
    }

    fn compatible(&self, a: SortId, b: SortId) -> bool {
        a == b || (self.get_sort(a).is_arithmetic() && self.get_sort(b).is_arithmetic())
    }

    /// Make the application of a built-in operator to `children`, inferring
    /// its sort.
    ///
    /// Panics if `kind` is a leaf kind, a closure, or if the application is
    /// ill-sorted: building ill-sorted terms is a programming error.
    pub fn mk_node(&mut self, kind: Kind, children: impl IntoIterator<Item = TermId>) -> TermId {
        let children: SmallVec<[TermId; 3]> = children.into_iter().collect();
        let n = children.len();
        let sort = match kind {
            Kind::Equal => {
                self.expect_arity(kind, &children, n == 2);
                if !self.compatible(self.sort_of(children[0]), self.sort_of(children[1])) {
                    self.ill_sorted(kind, "operands of different sorts");
                }
                self.bool_sort()
            }
            Kind::Distinct => {
                self.expect_arity(kind, &children, n >= 2);
                let first = self.sort_of(children[0]);
                if children.iter().any(|c| !self.compatible(first, self.sort_of(*c))) {
                    self.ill_sorted(kind, "operands of different sorts");
                }
                self.bool_sort()
            }
            Kind::Not => {
                self.expect_arity(kind, &children, n == 1);
                self.expect_sort(kind, &children, Sort::Bool);
                self.bool_sort()
            }
            Kind::And | Kind::Or | Kind::Xor => {
                self.expect_arity(kind, &children, n >= 2);
                self.expect_sort(kind, &children, Sort::Bool);
                self.bool_sort()
            }
            Kind::Implies => {
                self.expect_arity(kind, &children, n == 2);
                self.expect_sort(kind, &children, Sort::Bool);
                self.bool_sort()
            }
            Kind::Ite => {
                self.expect_arity(kind, &children, n == 3);
                self.expect_sort(kind, &children[..1], Sort::Bool);
                let (a, b) = (self.sort_of(children[1]), self.sort_of(children[2]));
                if a != b {
                    self.ill_sorted(kind, "branches of different sorts");
                }
                a
            }
            Kind::Plus | Kind::Mult => {
                self.expect_arity(kind, &children, n >= 2);
                self.arith_sort(kind, &children)
            }
            Kind::Minus => {
                self.expect_arity(kind, &children, n == 2);
                self.arith_sort(kind, &children)
            }
            Kind::StringConcat => {
                self.expect_arity(kind, &children, n >= 2);
                self.expect_sort(kind, &children, Sort::String);
                self.string_sort()
            }
            Kind::StringToRegexp => {
                self.expect_arity(kind, &children, n == 1);
                self.expect_sort(kind, &children, Sort::String);
                self.reglan_sort()
            }
            Kind::RegexpConcat | Kind::RegexpUnion | Kind::RegexpInter => {
                self.expect_arity(kind, &children, n >= 2);
                self.expect_sort(kind, &children, Sort::RegLan);
                self.reglan_sort()
            }
            Kind::HoApply => {
                self.expect_arity(kind, &children, n == 2);
                let (f, a) = (self.sort_of(children[0]), self.sort_of(children[1]));
                match self.apply_sort(f, &[a]) {
                    Some(sort) => sort,
                    None => self.ill_sorted(kind, "argument does not match function sort"),
                }
            }
            Kind::ApplyUf => {
                self.expect_arity(kind, &children, n >= 2);
                let f = self.sort_of(children[0]);
                let args: Vec<SortId> = children[1..].iter().map(|c| self.sort_of(*c)).collect();
                match self.apply_sort(f, &args) {
                    Some(sort) => sort,
                    None => {
                        let fs = self.sort_to_string(f);
                        self.ill_sorted(kind, format!("arguments do not match function sort {fs}"))
                    }
                }
            }
            Kind::BoundVarList => {
                if children.iter().any(|c| self.kind(*c) != Kind::BoundVariable) {
                    self.ill_sorted(kind, "non-variable in variable list");
                }
                self.sexpr_sort()
            }
            Kind::Sexpr => self.sexpr_sort(),
            _ => self.ill_sorted(kind, "not an operator; use the dedicated builder"),
        };
        self.add(Term {
            kind,
            payload: Payload::None,
            children,
            sort,
        })
    }

    /// `(op a1 ... an)` where `op` is a function-sorted term.
    pub fn mk_app(&mut self, op: TermId, args: impl IntoIterator<Item = TermId>) -> TermId {
        self.mk_node(Kind::ApplyUf, std::iter::once(op).chain(args))
    }

    pub fn mk_ho_apply(&mut self, f: TermId, arg: TermId) -> TermId {
        self.mk_node(Kind::HoApply, [f, arg])
    }

    pub fn mk_not(&mut self, t: TermId) -> TermId {
        self.mk_node(Kind::Not, [t])
    }

    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_node(Kind::Equal, [a, b])
    }

    pub fn mk_sexpr(&mut self, children: impl IntoIterator<Item = TermId>) -> TermId {
        self.mk_node(Kind::Sexpr, children)
    }

    /// Make the closure `(kind ((x1 T1) ... (xn Tn)) body)`.
    ///
    /// Quantifiers need a Boolean body; a witness binds exactly one variable
    /// and has that variable's sort; a lambda has the curried function sort of
    /// its variables and body.
    pub fn mk_closure(&mut self, kind: Kind, vars: &[TermId], body: TermId) -> TermId {
        if !kind.is_closure() {
            self.ill_sorted(kind, "not a binder");
        }
        if vars.is_empty() {
            self.ill_sorted(kind, "binds no variables");
        }
        let list = self.mk_node(Kind::BoundVarList, vars.iter().copied());
        let body_sort = self.sort_of(body);
        let bool_sort = self.bool_sort();
        let sort = match kind {
            Kind::Forall | Kind::Exists => {
                if body_sort != bool_sort {
                    self.ill_sorted(kind, "body is not Boolean");
                }
                bool_sort
            }
            Kind::Witness => {
                if vars.len() != 1 || body_sort != bool_sort {
                    self.ill_sorted(kind, "expects one variable and a Boolean body");
                }
                self.sort_of(vars[0])
            }
            _ => {
                let args = vars.iter().map(|v| self.sort_of(*v)).collect();
                self.function_sort(args, body_sort)
            }
        };
        self.add(Term {
            kind,
            payload: Payload::None,
            children: smallvec::smallvec![list, body],
            sort,
        })
    }

    /// The variables bound by a closure.
    pub fn closure_vars(&self, closure: TermId) -> &[TermId] {
        let term = self.get(closure);
        debug_assert!(term.kind.is_closure());
        self.get(term.children[0]).children()
    }

    // ---------------------------------------------------------------- printing

    fn leaf_to_string(&self, term: &Term) -> String {
        match &term.payload {
            Payload::Bool(b) => b.to_string(),
            Payload::Rational(r) if r.is_negative() => format!("(- {})", r.abs()),
            Payload::Rational(r) => r.to_string(),
            Payload::String(s) => {
                let mut out = String::from("\"");
                for c in s {
                    match char::from_u32(*c) {
                        Some('"') => out.push_str("\"\""),
                        Some(ch) if (' '..='~').contains(&ch) => out.push(ch),
                        _ => write!(&mut out, "\\u{{{c:x}}}").unwrap_or(()),
                    }
                }
                out.push('"');
                out
            }
            Payload::Var { name, .. } | Payload::Skolem { name, .. } => name.to_string(),
            Payload::None => String::new(),
        }
    }

    /// Converts the given term to a string.
    pub fn to_string(&self, id: TermId) -> String {
        let mut stored = HashMap::<TermId, String>::default();
        // use a stack to avoid stack overflow on deep terms
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if stored.contains_key(&next) {
                continue;
            }
            let term = self.get(next);
            if term.kind != Kind::BoundVarList {
                let pending: Vec<TermId> = term
                    .children
                    .iter()
                    .copied()
                    .filter(|c| !stored.contains_key(c))
                    .collect();
                if !pending.is_empty() {
                    stack.push(next);
                    stack.extend(pending.into_iter().rev());
                    continue;
                }
            }
            let str = match term.kind {
                k if k.is_leaf() => self.leaf_to_string(term),
                Kind::BoundVarList => format!(
                    "({})",
                    ListDisplay(
                        term.children.iter().map(|v| format!(
                            "({} {})",
                            self.leaf_to_string(self.get(*v)),
                            self.sort_to_string(self.sort_of(*v))
                        )),
                        " "
                    )
                ),
                Kind::ApplyUf => format!(
                    "({})",
                    ListDisplay(term.children.iter().map(|c| &stored[c]), " ")
                ),
                k => format!(
                    "({} {})",
                    k,
                    ListDisplay(term.children.iter().map(|c| &stored[c]), " ")
                ),
            };
            stored.insert(next, str);
        }
        stored.remove(&id).unwrap_or_default()
    }
}

impl std::ops::Index<TermId> for TermDag {
    type Output = Term;

    fn index(&self, id: TermId) -> &Term {
        self.get(id)
    }
}
