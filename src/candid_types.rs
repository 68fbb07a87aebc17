use std::fmt;

/// Every primitive spelled out by the Candid grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Nat,
    Nat8,
    Nat16,
    Nat32,
    Nat64,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Text,
    Null,
    Reserved,
    Empty,
    Principal,
}

impl Primitive {
    pub const ALL: [Primitive; 18] = [
        Primitive::Nat,
        Primitive::Nat8,
        Primitive::Nat16,
        Primitive::Nat32,
        Primitive::Nat64,
        Primitive::Int,
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Bool,
        Primitive::Text,
        Primitive::Null,
        Primitive::Reserved,
        Primitive::Empty,
        Primitive::Principal,
    ];

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.keyword() == word)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Nat => "nat",
            Primitive::Nat8 => "nat8",
            Primitive::Nat16 => "nat16",
            Primitive::Nat32 => "nat32",
            Primitive::Nat64 => "nat64",
            Primitive::Int => "int",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Bool => "bool",
            Primitive::Text => "text",
            Primitive::Null => "null",
            Primitive::Reserved => "reserved",
            Primitive::Empty => "empty",
            Primitive::Principal => "principal",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Primitive::Float32 | Primitive::Float64)
    }

    pub fn is_integer(self) -> bool {
        self.is_unsigned()
            || matches!(
                self,
                Primitive::Int | Primitive::Int8 | Primitive::Int16 | Primitive::Int32 | Primitive::Int64
            )
    }

    pub fn is_number(self) -> bool {
        self.is_float() || self.is_integer()
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Primitive::Nat | Primitive::Nat8 | Primitive::Nat16 | Primitive::Nat32 | Primitive::Nat64
        )
    }

    /// Inclusive range of the fixed-width integer types. `nat` and `int` are unbounded.
    pub fn bounds(self) -> Option<(i128, i128)> {
        match self {
            Primitive::Nat8 => Some((0, u8::MAX.into())),
            Primitive::Nat16 => Some((0, u16::MAX.into())),
            Primitive::Nat32 => Some((0, u32::MAX.into())),
            Primitive::Nat64 => Some((0, u64::MAX.into())),
            Primitive::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            Primitive::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            Primitive::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            Primitive::Int64 => Some((i64::MIN.into(), i64::MAX.into())),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Label of a record field or variant tag.
///
/// `Unnamed` marks a positional record field (`record { nat; text }`); the
/// index is assigned by the parser and is not written back when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldLabel {
    Named(String),
    Id(u32),
    Unnamed(u32),
}

impl FieldLabel {
    /// Key used for this label in a JSON object.
    pub fn key(&self) -> String {
        match self {
            FieldLabel::Named(name) => name.clone(),
            FieldLabel::Id(id) | FieldLabel::Unnamed(id) => id.to_string(),
        }
    }

    pub fn index(&self) -> Option<u32> {
        match self {
            FieldLabel::Named(_) => None,
            FieldLabel::Id(id) | FieldLabel::Unnamed(id) => Some(*id),
        }
    }
}

impl fmt::Display for FieldLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLabel::Named(name) => write_name(f, name),
            FieldLabel::Id(id) | FieldLabel::Unnamed(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: FieldLabel,
    pub ty: CandidType,
}

impl Field {
    pub fn new(label: FieldLabel, ty: CandidType) -> Self {
        Self { label, ty }
    }

    pub fn named(name: &str, ty: CandidType) -> Self {
        Self::new(FieldLabel::Named(name.to_string()), ty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncMode {
    Query,
    CompositeQuery,
    Oneway,
}

impl FuncMode {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "query" => Some(FuncMode::Query),
            "composite_query" => Some(FuncMode::CompositeQuery),
            "oneway" => Some(FuncMode::Oneway),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            FuncMode::Query => "query",
            FuncMode::CompositeQuery => "composite_query",
            FuncMode::Oneway => "oneway",
        }
    }
}

/// A function argument or result. Candid allows an optional name in front of the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncArg {
    pub name: Option<String>,
    pub ty: CandidType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncType {
    pub args: Vec<FuncArg>,
    pub results: Vec<FuncArg>,
    pub modes: Vec<FuncMode>,
}

/// Renders the signature only, `(args) -> (results) modes`, as used inside a service block.
impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_arg_list(f, &self.args)?;
        f.write_str(" -> ")?;
        write_arg_list(f, &self.results)?;
        for mode in &self.modes {
            write!(f, " {}", mode.keyword())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    /// Either `CandidType::Func` or a reference to a func alias.
    pub ty: CandidType,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(f, &self.name)?;
        match &self.ty {
            CandidType::Func(func) => write!(f, " : {}", func),
            other => write!(f, " : {}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidType {
    Primitive(Primitive),
    Opt(Box<CandidType>),
    Vec(Box<CandidType>),
    Blob,
    Record(Vec<Field>),
    Variant(Vec<Field>),
    Func(FuncType),
    Service(Vec<Method>),
    /// Reference to a type alias, left in place when it is unknown or part of a cycle.
    Named(String),
    /// A descriptor that could not be parsed at all.
    Unknown(String),
}

impl CandidType {
    pub fn opt(inner: CandidType) -> Self {
        CandidType::Opt(Box::new(inner))
    }

    pub fn vec(inner: CandidType) -> Self {
        CandidType::Vec(Box::new(inner))
    }

    /// Types a record field may omit: decoding fills them with `null`.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            CandidType::Opt(_) | CandidType::Primitive(Primitive::Null | Primitive::Reserved)
        )
    }

    /// Payload of a unit variant tag.
    pub fn is_unit(&self) -> bool {
        matches!(self, CandidType::Primitive(Primitive::Null))
    }

    /// True when any alias reference is left anywhere in this type.
    pub fn has_references(&self) -> bool {
        match self {
            CandidType::Named(_) => true,
            CandidType::Opt(inner) | CandidType::Vec(inner) => inner.has_references(),
            CandidType::Record(fields) | CandidType::Variant(fields) => {
                fields.iter().any(|f| f.ty.has_references())
            }
            _ => false,
        }
    }
}

/// A record whose labels are exactly `0..n` in order, which JSON may spell as an array.
pub fn is_tuple_record(fields: &[Field]) -> bool {
    fields
        .iter()
        .enumerate()
        .all(|(i, f)| f.label.index() == Some(i as u32))
}

impl fmt::Display for CandidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidType::Primitive(p) => write!(f, "{}", p),
            CandidType::Opt(inner) => write!(f, "opt {}", inner),
            CandidType::Vec(inner) => write!(f, "vec {}", inner),
            CandidType::Blob => f.write_str("blob"),
            CandidType::Record(fields) => {
                write_block(f, "record", fields.iter().map(RenderField::Record))
            }
            CandidType::Variant(fields) => {
                write_block(f, "variant", fields.iter().map(RenderField::Variant))
            }
            CandidType::Func(func) => write!(f, "func {}", func),
            CandidType::Service(methods) => write_block(f, "service", methods.iter()),
            CandidType::Named(name) | CandidType::Unknown(name) => f.write_str(name),
        }
    }
}

enum RenderField<'a> {
    Record(&'a Field),
    Variant(&'a Field),
}

impl fmt::Display for RenderField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderField::Record(Field {
                label: FieldLabel::Unnamed(_),
                ty,
            }) => write!(f, "{}", ty),
            RenderField::Variant(field) if field.ty.is_unit() => write!(f, "{}", field.label),
            RenderField::Record(field) | RenderField::Variant(field) => {
                write!(f, "{} : {}", field.label, field.ty)
            }
        }
    }
}

fn write_block<I, T>(f: &mut fmt::Formatter<'_>, keyword: &str, items: I) -> fmt::Result
where
    I: Iterator<Item = T>,
    T: fmt::Display,
{
    let items: Vec<String> = items.map(|item| item.to_string()).collect();
    if items.is_empty() {
        write!(f, "{} {{}}", keyword)
    } else {
        write!(f, "{} {{ {} }}", keyword, items.join("; "))
    }
}

fn write_arg_list(f: &mut fmt::Formatter<'_>, args: &[FuncArg]) -> fmt::Result {
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if let Some(name) = &arg.name {
            write_name(f, name)?;
            f.write_str(" : ")?;
        }
        write!(f, "{}", arg.ty)?;
    }
    f.write_str(")")
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_identifier(name) {
        f.write_str(name)
    } else {
        write!(f, "\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }
}
