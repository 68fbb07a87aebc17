use std::collections::HashMap;
use std::path::Path;

use log::{debug, warn};

use crate::candid_types::{CandidType, Field, FuncArg, FuncMode, FuncType, Method};
use crate::did_parser::{read_source, CandidInterface, CandidParseError, ServiceDecl};
use crate::type_string_parser::parse_type_string;

/// Bounds on alias expansion for inputs that are acyclic but very deep or wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverLimits {
    /// Maximum nesting depth of the expanded type.
    pub max_depth: usize,
    /// Maximum number of type nodes visited per resolved type.
    pub max_nodes: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_nodes: 10_000,
        }
    }
}

/// An argument or result of a resolved method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArg {
    pub name: Option<String>,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub args: Vec<ResolvedArg>,
    pub results: Vec<ResolvedArg>,
    pub modes: Vec<FuncMode>,
}

impl MethodSignature {
    pub fn arg_types(&self) -> Vec<String> {
        self.args.iter().map(|arg| arg.ty.clone()).collect()
    }

    pub fn result_types(&self) -> Vec<String> {
        self.results.iter().map(|arg| arg.ty.clone()).collect()
    }

    pub fn is_query(&self) -> bool {
        self.modes
            .iter()
            .any(|mode| matches!(mode, FuncMode::Query | FuncMode::CompositeQuery))
    }
}

/// Expands alias references using the `type` declarations of one Candid source.
#[derive(Debug, Clone, Default)]
pub struct CandidTypeResolver {
    aliases: HashMap<String, CandidType>,
    service: Option<ServiceDecl>,
    limits: ResolverLimits,
}

impl CandidTypeResolver {
    /// Build the alias table from raw Candid source. Malformed declarations are skipped.
    pub fn new(source: &str) -> Self {
        Self::with_limits(source, ResolverLimits::default())
    }

    pub fn with_limits(source: &str, limits: ResolverLimits) -> Self {
        let (interface, errors) = CandidInterface::parse_lenient(source);
        if !errors.is_empty() {
            warn!(
                "ignored {} malformed declaration(s) while building the alias table",
                errors.len()
            );
        }
        let mut resolver = Self::from_interface(&interface);
        resolver.limits = limits;
        resolver
    }

    pub fn from_interface(interface: &CandidInterface) -> Self {
        Self {
            aliases: interface.alias_table(),
            service: interface.service().cloned(),
            limits: ResolverLimits::default(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CandidParseError> {
        Ok(Self::new(&read_source(path.as_ref())?))
    }

    pub fn limits(&self) -> ResolverLimits {
        self.limits
    }

    pub fn alias(&self, name: &str) -> Option<&CandidType> {
        self.aliases.get(name)
    }

    /// Expand every argument type string, keeping positions.
    ///
    /// Strings that need no expansion, or that do not parse, come back unchanged.
    pub fn resolve_arg_types<S: AsRef<str>>(&self, raw_types: &[S]) -> Vec<String> {
        raw_types
            .iter()
            .map(|raw| self.resolve_type_string(raw.as_ref()))
            .collect()
    }

    pub fn resolve_type_string(&self, raw: &str) -> String {
        match parse_type_string(raw) {
            Ok(ty) => {
                let resolved = self.resolve(&ty);
                if resolved == ty {
                    raw.to_string()
                } else {
                    resolved.to_string()
                }
            }
            Err(e) => {
                debug!("{}; passing it through", e);
                raw.to_string()
            }
        }
    }

    pub fn resolve(&self, ty: &CandidType) -> CandidType {
        Expansion::new(self).expand(ty, 0)
    }

    /// Names of the service methods, following a service alias if needed.
    pub fn method_names(&self) -> Vec<String> {
        self.service_methods()
            .into_iter()
            .map(|method| method.name)
            .collect()
    }

    pub fn resolve_method(&self, name: &str) -> Option<MethodSignature> {
        let method = self
            .service_methods()
            .into_iter()
            .find(|method| method.name == name)?;
        let Some(func) = self.func_of(&method.ty) else {
            debug!("method '{}' does not have a func type: {}", name, method.ty);
            return None;
        };

        Some(MethodSignature {
            name: method.name,
            args: self.resolve_args(&func.args),
            results: self.resolve_args(&func.results),
            modes: func.modes,
        })
    }

    /// Resolved init arguments of a service class, empty for a plain service.
    pub fn init_arg_types(&self) -> Vec<String> {
        self.service
            .as_ref()
            .map(|service| self.resolve_args(&service.init_args))
            .unwrap_or_default()
            .into_iter()
            .map(|arg| arg.ty)
            .collect()
    }

    fn resolve_args(&self, args: &[FuncArg]) -> Vec<ResolvedArg> {
        args.iter()
            .map(|arg| ResolvedArg {
                name: arg.name.clone(),
                ty: self.resolve(&arg.ty).to_string(),
            })
            .collect()
    }

    fn service_methods(&self) -> Vec<Method> {
        let Some(service) = &self.service else {
            return Vec::new();
        };
        match self.follow_alias(&service.ty) {
            CandidType::Service(methods) => methods,
            other => {
                debug!("service type {} does not name a method list", other);
                Vec::new()
            }
        }
    }

    fn func_of(&self, ty: &CandidType) -> Option<FuncType> {
        match self.follow_alias(ty) {
            CandidType::Func(func) => Some(func),
            _ => None,
        }
    }

    /// Follow top-level alias references only, stopping on cycles.
    fn follow_alias(&self, ty: &CandidType) -> CandidType {
        let mut current = ty.clone();
        let mut seen: Vec<String> = Vec::new();
        while let CandidType::Named(name) = &current {
            if seen.contains(name) || seen.len() >= self.limits.max_depth {
                break;
            }
            let Some(next) = self.aliases.get(name) else {
                break;
            };
            seen.push(name.clone());
            current = next.clone();
        }
        current
    }
}

/// State of one `resolve` call.
struct Expansion<'r> {
    resolver: &'r CandidTypeResolver,
    active: Vec<String>,
    nodes: usize,
}

impl<'r> Expansion<'r> {
    fn new(resolver: &'r CandidTypeResolver) -> Self {
        Self {
            resolver,
            active: Vec::new(),
            nodes: 0,
        }
    }

    fn expand(&mut self, ty: &CandidType, depth: usize) -> CandidType {
        self.nodes += 1;
        match ty {
            CandidType::Named(name) => self.expand_alias(name, depth),
            CandidType::Opt(inner) => CandidType::opt(self.expand(inner, depth + 1)),
            CandidType::Vec(inner) => CandidType::vec(self.expand(inner, depth + 1)),
            CandidType::Record(fields) => CandidType::Record(self.expand_fields(fields, depth)),
            CandidType::Variant(fields) => CandidType::Variant(self.expand_fields(fields, depth)),
            // func and service values are references; their signatures stay as written
            other => other.clone(),
        }
    }

    fn expand_fields(&mut self, fields: &[Field], depth: usize) -> Vec<Field> {
        fields
            .iter()
            .map(|field| Field::new(field.label.clone(), self.expand(&field.ty, depth + 1)))
            .collect()
    }

    fn expand_alias(&mut self, name: &str, depth: usize) -> CandidType {
        let marker = || CandidType::Named(name.to_string());

        if self.active.iter().any(|active| active == name) {
            debug!("'{}' refers back to itself; leaving the reference", name);
            return marker();
        }
        let limits = self.resolver.limits;
        if depth >= limits.max_depth || self.nodes >= limits.max_nodes {
            debug!("expansion limit reached at '{}'", name);
            return marker();
        }
        let Some(definition) = self.resolver.aliases.get(name) else {
            debug!("no alias named '{}'", name);
            return marker();
        };

        self.active.push(name.to_string());
        let expanded = self.expand(definition, depth + 1);
        self.active.pop();
        expanded
    }
}
