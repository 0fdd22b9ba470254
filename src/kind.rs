use std::fmt;

/// Operator tags of the term language.
///
/// Leaf kinds (variables, skolems and constants) carry their data in the
/// term's payload; every other kind is an operator applied to the term's
/// children.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Kind {
    /// A free constant or variable of the input problem.
    Variable,
    /// A variable that may be bound by a closure.
    BoundVariable,
    /// A value defined as the witness of some property.
    Skolem,
    ConstBool,
    ConstRational,
    ConstString,
    Equal,
    Not,
    And,
    Or,
    Xor,
    Implies,
    Ite,
    Distinct,
    Plus,
    Mult,
    Minus,
    StringConcat,
    StringToRegexp,
    RegexpConcat,
    RegexpUnion,
    RegexpInter,
    /// `(f t1 ... tn)`: the first child is the applied function.
    ApplyUf,
    /// Binary higher-order application `(@ f t)`.
    HoApply,
    Forall,
    Exists,
    Lambda,
    Witness,
    /// The variable list of a closure.
    BoundVarList,
    Sexpr,
    /// Keys the symbol cache for the term-level reflection of an atomic sort.
    SortSymbol,
    /// Keys the symbol cache for the term-level reflection of a sort constructor.
    SortConstructor,
}

impl Kind {
    /// Operators that accept any number (at least two) of operands.
    pub fn is_nary(self) -> bool {
        matches!(
            self,
            Kind::And
                | Kind::Or
                | Kind::Xor
                | Kind::Plus
                | Kind::Mult
                | Kind::StringConcat
                | Kind::RegexpConcat
                | Kind::RegexpUnion
                | Kind::RegexpInter
                | Kind::Distinct
        )
    }

    pub fn is_closure(self) -> bool {
        matches!(
            self,
            Kind::Forall | Kind::Exists | Kind::Lambda | Kind::Witness
        )
    }

    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Kind::Variable
                | Kind::BoundVariable
                | Kind::Skolem
                | Kind::ConstBool
                | Kind::ConstRational
                | Kind::ConstString
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, Kind::Plus | Kind::Mult | Kind::Minus)
    }

    /// The SMT-LIB name of the operator.
    pub fn smt_name(self) -> &'static str {
        match self {
            Kind::Variable => "var",
            Kind::BoundVariable => "bvar",
            Kind::Skolem => "skolem",
            Kind::ConstBool => "bool",
            Kind::ConstRational => "rational",
            Kind::ConstString => "string",
            Kind::Equal => "=",
            Kind::Not => "not",
            Kind::And => "and",
            Kind::Or => "or",
            Kind::Xor => "xor",
            Kind::Implies => "=>",
            Kind::Ite => "ite",
            Kind::Distinct => "distinct",
            Kind::Plus => "+",
            Kind::Mult => "*",
            Kind::Minus => "-",
            Kind::StringConcat => "str.++",
            Kind::StringToRegexp => "str.to_re",
            Kind::RegexpConcat => "re.++",
            Kind::RegexpUnion => "re.union",
            Kind::RegexpInter => "re.inter",
            Kind::ApplyUf => "apply",
            Kind::HoApply => "@",
            Kind::Forall => "forall",
            Kind::Exists => "exists",
            Kind::Lambda => "lambda",
            Kind::Witness => "witness",
            Kind::BoundVarList => "bvar_list",
            Kind::Sexpr => "sexpr",
            Kind::SortSymbol => "sort",
            Kind::SortConstructor => "sort_constructor",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.smt_name())
    }
}
