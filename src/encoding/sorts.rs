use crate::{
    encoding::TermEncoder,
    kind::Kind,
    sort::Sort,
    termdag::{SortId, TermId},
    Error,
};

impl TermEncoder<'_> {
    /// Converts `sort` to its encoded form and records the term-level
    /// reflection of the result.
    ///
    /// A function sort `(-> T1 ... Tn T)` becomes
    /// `(arrow T1 (arrow ... (arrow Tn T)))`, reflected as nested
    /// applications of the `arrow` symbol. Other sorts are kept; atomic sorts
    /// are reflected by a symbol of sort `sortType` named after the sort.
    pub fn convert_sort(&mut self, sort: SortId) -> SortId {
        if let Some(converted) = self.converted_sorts.get(&sort) {
            return *converted;
        }
        let (converted, reflection) = match self.dag.get_sort(sort).clone() {
            Sort::Function { args, range } => {
                let mut cur = self.convert_sort(range);
                let mut reflection = self.sort_as_term(cur);
                for arg in args.iter().rev() {
                    let arg = self.convert_sort(*arg);
                    let arg_reflection = self.sort_as_term(arg);
                    cur = self.dag.constructor_sort("arrow", vec![arg, cur]);
                    reflection = self.dag.mk_app(self.arrow, [arg_reflection, reflection]);
                }
                (cur, reflection)
            }
            Sort::Constructor { name, args } if !args.is_empty() => {
                let args: Vec<SortId> = args.iter().map(|a| self.convert_sort(*a)).collect();
                let reflections: Vec<TermId> =
                    args.iter().map(|a| self.sort_as_term(*a)).collect();
                let ctor_sort = self
                    .dag
                    .function_sort(vec![self.sort_type; args.len()], self.sort_type);
                let ctor = self.symbol(Kind::SortConstructor, ctor_sort, name.as_str());
                let converted = self.dag.constructor_sort(name.as_str(), args);
                (converted, self.dag.mk_app(ctor, reflections))
            }
            _ => {
                let name = self.dag.sort_to_string(sort);
                (sort, self.symbol(Kind::SortSymbol, self.sort_type, &name))
            }
        };
        self.converted_sorts.insert(sort, converted);
        self.converted_sorts.insert(converted, converted);
        self.sort_as_term.entry(converted).or_insert(reflection);
        self.term_as_sort.entry(reflection).or_insert(converted);
        converted
    }

    /// The term-level reflection of an encoded sort.
    ///
    /// # Panics
    ///
    /// Panics if `sort` was not produced by [`TermEncoder::convert_sort`].
    pub fn sort_as_term(&self, sort: SortId) -> TermId {
        match self.sort_as_term.get(&sort) {
            Some(t) => *t,
            None => panic!(
                "{}",
                Error::MissingSortReflection(self.dag.sort_to_string(sort))
            ),
        }
    }

    /// The encoded sort reflected by `t`, if `t` is a sort reflection.
    pub fn term_as_sort(&self, t: TermId) -> Option<SortId> {
        self.term_as_sort.get(&t).copied()
    }

    /// Converts `sort` and returns the reflection of the result.
    pub(crate) fn reflect(&mut self, sort: SortId) -> TermId {
        let converted = self.convert_sort(sort);
        self.sort_as_term(converted)
    }
}
