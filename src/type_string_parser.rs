use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_opt, map_res, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use nom_supreme::final_parser::{Location, RecreateContext};

use crate::candid_types::{
    CandidType, Field, FieldLabel, FuncArg, FuncMode, FuncType, Method, Primitive,
};

#[derive(Debug, Clone)]
pub struct TypeStringError {
    pub input: String,
    pub location: Location,
}

impl fmt::Display for TypeStringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot parse Candid type '{}' (line {}, column {})",
            self.input, self.location.line, self.location.column
        )
    }
}

impl std::error::Error for TypeStringError {}

/// Parse a type descriptor like `vec record { owner : principal; amount : nat }`.
pub fn parse_type_string(type_str: &str) -> Result<CandidType, TypeStringError> {
    match all_consuming(terminated(data_type, multispace0))(type_str) {
        Ok((_, ty)) => Ok(ty),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(TypeStringError {
            input: type_str.to_string(),
            location: Location::recreate_context(type_str, e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(TypeStringError {
            input: type_str.to_string(),
            location: Location::recreate_context(type_str, &type_str[type_str.len()..]),
        }),
    }
}

pub(crate) fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

pub(crate) fn text_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((
                    value("\\", tag("\\")),
                    value("\"", tag("\"")),
                    value("\n", tag("n")),
                    value("\t", tag("t")),
                    value("\r", tag("r")),
                )),
            )),
            char('"'),
        ),
        Option::unwrap_or_default,
    )(input)
}

/// Identifier or quoted name, as used for aliases, methods and argument names.
pub(crate) fn name(input: &str) -> IResult<&str, String> {
    alt((text_literal, map(identifier, str::to_string)))(input)
}

fn label(input: &str) -> IResult<&str, FieldLabel> {
    alt((
        map_res(digit1, |digits: &str| digits.parse::<u32>().map(FieldLabel::Id)),
        map(name, FieldLabel::Named),
    ))(input)
}

/// Deepest constructor nesting a type descriptor may have.
pub(crate) const MAX_TYPE_DEPTH: usize = 100;

pub(crate) fn data_type(input: &str) -> IResult<&str, CandidType> {
    type_at(input, 0)
}

/// Parser for a type one level below `depth`.
fn nested(depth: usize) -> impl FnMut(&str) -> IResult<&str, CandidType> {
    move |input| type_at(input, depth + 1)
}

fn type_at(input: &str, depth: usize) -> IResult<&str, CandidType> {
    if depth > MAX_TYPE_DEPTH {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    let (rest, word) = preceded(ws, identifier)(input)?;
    match word {
        "opt" => map(nested(depth), CandidType::opt)(rest),
        "vec" => map(nested(depth), CandidType::vec)(rest),
        "blob" => Ok((rest, CandidType::Blob)),
        "record" => {
            let (rest, fields) = record_fields(rest, depth)?;
            Ok((rest, CandidType::Record(fields)))
        }
        "variant" => {
            let (rest, fields) = variant_fields(rest, depth)?;
            Ok((rest, CandidType::Variant(fields)))
        }
        "func" => func_type(depth)(rest),
        "service" => {
            let (rest, methods) = methods_at(rest, depth)?;
            Ok((rest, CandidType::Service(methods)))
        }
        other => {
            let ty = Primitive::from_keyword(other)
                .map_or_else(|| CandidType::Named(other.to_string()), CandidType::Primitive);
            Ok((rest, ty))
        }
    }
}

fn labeled_field(
    depth: usize,
) -> impl FnMut(&str) -> IResult<&str, (Option<FieldLabel>, CandidType)> {
    move |input| {
        map(
            tuple((preceded(ws, label), preceded(ws, char(':')), nested(depth))),
            |(label, _, ty)| (Some(label), ty),
        )(input)
    }
}

fn field_block<'a, F>(field: F) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<Field>>
where
    F: FnMut(&'a str) -> IResult<&'a str, (Option<FieldLabel>, CandidType)>,
{
    map(
        delimited(
            pair(ws, char('{')),
            many0(terminated(field, pair(ws, opt(char(';'))))),
            pair(ws, char('}')),
        ),
        number_fields,
    )
}

/// Unlabeled record fields take the index after the previous numeric label.
fn number_fields(raw: Vec<(Option<FieldLabel>, CandidType)>) -> Vec<Field> {
    let mut next = 0u32;
    raw.into_iter()
        .map(|(label, ty)| {
            let label = match label {
                Some(FieldLabel::Id(id)) => {
                    next = id.saturating_add(1);
                    FieldLabel::Id(id)
                }
                Some(other) => other,
                None => {
                    let id = next;
                    next = next.saturating_add(1);
                    FieldLabel::Unnamed(id)
                }
            };
            Field::new(label, ty)
        })
        .collect()
}

fn record_fields(input: &str, depth: usize) -> IResult<&str, Vec<Field>> {
    field_block(alt((
        labeled_field(depth),
        map(nested(depth), |ty| (None::<FieldLabel>, ty)),
    )))(input)
}

fn variant_fields(input: &str, depth: usize) -> IResult<&str, Vec<Field>> {
    field_block(alt((
        labeled_field(depth),
        map(preceded(ws, label), |label| {
            (Some(label), CandidType::Primitive(Primitive::Null))
        }),
    )))(input)
}

fn func_arg(depth: usize) -> impl FnMut(&str) -> IResult<&str, FuncArg> {
    move |input| {
        alt((
            map(
                tuple((preceded(ws, name), preceded(ws, char(':')), nested(depth))),
                |(name, _, ty)| FuncArg {
                    name: Some(name),
                    ty,
                },
            ),
            map(nested(depth), |ty| FuncArg { name: None, ty }),
        ))(input)
    }
}

fn args_at(input: &str, depth: usize) -> IResult<&str, Vec<FuncArg>> {
    delimited(
        pair(ws, char('(')),
        separated_list0(pair(ws, char(',')), func_arg(depth)),
        tuple((opt(pair(ws, char(','))), ws, char(')'))),
    )(input)
}

pub(crate) fn arg_list(input: &str) -> IResult<&str, Vec<FuncArg>> {
    args_at(input, 0)
}

fn func_mode(input: &str) -> IResult<&str, FuncMode> {
    map_opt(preceded(ws, identifier), FuncMode::from_keyword)(input)
}

fn signature_at(input: &str, depth: usize) -> IResult<&str, FuncType> {
    let (rest, args) = args_at(input, depth)?;
    let (rest, _) = preceded(ws, tag("->"))(rest)?;
    let (rest, results) = args_at(rest, depth)?;
    let (rest, modes) = many0(func_mode)(rest)?;
    Ok((
        rest,
        FuncType {
            args,
            results,
            modes,
        },
    ))
}

fn func_type(depth: usize) -> impl FnMut(&str) -> IResult<&str, CandidType> {
    move |input| {
        let (rest, func) = signature_at(input, depth)?;
        Ok((rest, CandidType::Func(func)))
    }
}

fn method(depth: usize) -> impl FnMut(&str) -> IResult<&str, Method> {
    move |input| {
        map(
            tuple((
                preceded(ws, name),
                preceded(ws, char(':')),
                alt((func_type(depth), nested(depth))),
            )),
            |(name, _, ty)| Method { name, ty },
        )(input)
    }
}

fn methods_at(input: &str, depth: usize) -> IResult<&str, Vec<Method>> {
    delimited(
        pair(ws, char('{')),
        many0(terminated(method(depth), pair(ws, opt(char(';'))))),
        pair(ws, char('}')),
    )(input)
}

pub(crate) fn method_block(input: &str) -> IResult<&str, Vec<Method>> {
    methods_at(input, 0)
}
