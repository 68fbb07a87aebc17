use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use log::{debug, warn};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, map, opt},
    sequence::{preceded, terminated, tuple},
    IResult,
};
use nom_supreme::final_parser::{Location, RecreateContext};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::candid_types::{CandidType, FuncArg, Method};
use crate::type_string_parser::{arg_list, data_type, identifier, method_block, name, text_literal, ws};

/// Comments, plus string literals so that comment markers inside quotes are left alone.
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)"(?:[^"\\]|\\.)*"|//[^\n]*|/\*.*?\*/"#).expect("comment pattern compiles")
});

#[derive(Debug, Clone)]
pub enum CandidParseError {
    MalformedDeclaration { snippet: String, location: Location },
    DuplicateService { location: Location },
    Io { path: String, error: String },
}

impl fmt::Display for CandidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidParseError::MalformedDeclaration { snippet, location } => write!(
                f,
                "malformed declaration '{}' at line {}, column {}",
                snippet, location.line, location.column
            ),
            CandidParseError::DuplicateService { location } => write!(
                f,
                "second service declaration at line {}, column {}",
                location.line, location.column
            ),
            CandidParseError::Io { path, error } => write!(f, "cannot read {}: {}", path, error),
        }
    }
}

impl std::error::Error for CandidParseError {}

/// The `service` declaration of a Candid file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDecl {
    pub name: Option<String>,
    /// Arguments of a service class (`service : (init) -> { ... }`).
    pub init_args: Vec<FuncArg>,
    /// `CandidType::Service` for an inline method list, `CandidType::Named` for a service alias.
    pub ty: CandidType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Declaration {
    Alias(String, CandidType),
    Service(ServiceDecl),
    Import(String),
}

/// Type aliases and the service of one Candid source text.
#[derive(Debug, Clone, Default)]
pub struct CandidInterface {
    aliases: Vec<(String, CandidType)>,
    service: Option<ServiceDecl>,
}

impl CandidInterface {
    /// Parse a Candid source text, failing on the first malformed declaration.
    pub fn parse(source: &str) -> Result<Self, CandidParseError> {
        let (interface, mut errors) = Self::parse_lenient(source);
        if errors.is_empty() {
            Ok(interface)
        } else {
            Err(errors.remove(0))
        }
    }

    /// Parse what can be parsed. Declarations that fail are skipped and reported.
    pub fn parse_lenient(source: &str) -> (Self, Vec<CandidParseError>) {
        let stripped = blank_comments(source);
        let mut interface = CandidInterface::default();
        let mut errors = Vec::new();

        for chunk in split_declarations(&stripped) {
            match all_consuming(terminated(declaration, ws))(chunk) {
                Ok((_, Declaration::Alias(name, ty))) => {
                    if interface.aliases.iter().any(|(existing, _)| *existing == name) {
                        warn!("type '{}' declared more than once; keeping the last one", name);
                        interface.aliases.retain(|(existing, _)| *existing != name);
                    }
                    interface.aliases.push((name, ty));
                }
                Ok((_, Declaration::Service(service))) => {
                    if interface.service.is_some() {
                        errors.push(CandidParseError::DuplicateService {
                            location: Location::recreate_context(stripped.as_str(), chunk.trim_start()),
                        });
                        continue;
                    }
                    interface.service = Some(service);
                }
                Ok((_, Declaration::Import(path))) => {
                    debug!("skipping import of {}", path);
                }
                Err(e) => {
                    let tail = match e {
                        nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
                        nom::Err::Incomplete(_) => chunk,
                    };
                    let error = CandidParseError::MalformedDeclaration {
                        snippet: snippet(chunk),
                        location: Location::recreate_context(stripped.as_str(), tail),
                    };
                    warn!("{}", error);
                    errors.push(error);
                }
            }
        }

        (interface, errors)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CandidParseError> {
        Self::parse(&read_source(path.as_ref())?)
    }

    /// Alias declarations in source order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &CandidType)> {
        self.aliases.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn alias(&self, name: &str) -> Option<&CandidType> {
        self.aliases
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, ty)| ty)
    }

    pub fn alias_table(&self) -> HashMap<String, CandidType> {
        self.aliases.iter().cloned().collect()
    }

    pub fn service(&self) -> Option<&ServiceDecl> {
        self.service.as_ref()
    }

    /// Methods of an inline service block. A service given by alias needs a resolver.
    pub fn methods(&self) -> &[Method] {
        match self.service.as_ref().map(|s| &s.ty) {
            Some(CandidType::Service(methods)) => methods.as_slice(),
            _ => &[],
        }
    }
}

pub(crate) fn read_source(path: &Path) -> Result<String, CandidParseError> {
    std::fs::read_to_string(path).map_err(|e| CandidParseError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    })
}

/// Replace comments with spaces so byte offsets (and line numbers) stay put.
fn blank_comments(source: &str) -> String {
    COMMENT_RE
        .replace_all(source, |caps: &regex::Captures| {
            let matched = &caps[0];
            if matched.starts_with('"') {
                return matched.to_string();
            }
            matched
                .chars()
                .map(|c| {
                    if c == '\n' {
                        "\n".to_string()
                    } else {
                        " ".repeat(c.len_utf8())
                    }
                })
                .collect::<String>()
        })
        .into_owned()
}

/// Split on `;` that sit outside braces, parentheses and quotes.
fn split_declarations(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut depth = 0i32;
    let mut in_quotes = false;
    let mut escape_next = false;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escape_next = true,
            '"' => in_quotes = !in_quotes,
            '{' | '(' if !in_quotes => depth += 1,
            '}' | ')' if !in_quotes => depth -= 1,
            ';' if depth <= 0 && !in_quotes => {
                chunks.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    chunks.push(&text[start..]);

    chunks
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}

fn snippet(chunk: &str) -> String {
    let flat = chunk.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 48 {
        format!("{}...", flat.chars().take(48).collect::<String>())
    } else {
        flat
    }
}

fn declaration(input: &str) -> IResult<&str, Declaration> {
    let (rest, keyword) = preceded(ws, identifier)(input)?;
    match keyword {
        "type" => alias_declaration(rest),
        "service" => map(service_declaration, Declaration::Service)(rest),
        "import" => map(preceded(ws, text_literal), Declaration::Import)(rest),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input.trim_start(),
            nom::error::ErrorKind::Tag,
        ))),
    }
}

fn alias_declaration(input: &str) -> IResult<&str, Declaration> {
    map(
        tuple((preceded(ws, name), preceded(ws, char('=')), data_type)),
        |(name, _, ty)| Declaration::Alias(name, ty),
    )(input)
}

fn service_declaration(input: &str) -> IResult<&str, ServiceDecl> {
    map(
        tuple((
            opt(preceded(ws, name)),
            preceded(ws, char(':')),
            opt(terminated(arg_list, preceded(ws, tag("->")))),
            alt((
                map(method_block, CandidType::Service),
                map(preceded(ws, identifier), |alias| {
                    CandidType::Named(alias.to_string())
                }),
            )),
        )),
        |(name, _, init_args, ty)| ServiceDecl {
            name,
            init_args: init_args.unwrap_or_default(),
            ty,
        },
    )(input)
}
