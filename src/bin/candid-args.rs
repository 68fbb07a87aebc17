use std::path::{Path, PathBuf};
use std::process::ExitCode;

use candid_args::{
    build_example, CandidJsonValidator, CandidTypeResolver, MethodSignature, ResolvedArg,
};
use clap::{Parser, Subcommand};
use eyre::{eyre, WrapErr};
use log::debug;

/// Resolve Candid method arguments and check JSON argument texts against them.
#[derive(Debug, Parser)]
#[command(name = "candid-args", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the service methods with their resolved signatures.
    Methods { did: PathBuf },
    /// Print the resolved argument types of a method, one per line.
    Resolve { did: PathBuf, method: String },
    /// Print an example JSON argument text for a method.
    Example { did: PathBuf, method: String },
    /// Check a JSON argument text, or `@path` to read it from a file.
    Validate {
        did: PathBuf,
        method: String,
        json: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(report) => {
            eprintln!("error: {:?}", report);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> eyre::Result<ExitCode> {
    match command {
        Command::Methods { did } => {
            let resolver = load(&did)?;
            for name in resolver.method_names() {
                match resolver.resolve_method(&name) {
                    Some(signature) => println!("{}", describe(&signature)),
                    None => println!("{} : <unresolved>", name),
                }
            }
        }
        Command::Resolve { did, method } => {
            let signature = lookup(&load(&did)?, &method)?;
            for arg in &signature.args {
                match &arg.name {
                    Some(name) => println!("{} : {}", name, arg.ty),
                    None => println!("{}", arg.ty),
                }
            }
        }
        Command::Example { did, method } => {
            let signature = lookup(&load(&did)?, &method)?;
            println!("{}", build_example(&signature.arg_types()));
        }
        Command::Validate { did, method, json } => {
            let signature = lookup(&load(&did)?, &method)?;
            let json = read_json(&json)?;
            let result = CandidJsonValidator::from_type_strings(&signature.arg_types()).validate(&json);
            println!("{}", result);
            if !result.is_ok() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn load(did: &Path) -> eyre::Result<CandidTypeResolver> {
    debug!("loading {}", did.display());
    CandidTypeResolver::from_file(did).wrap_err_with(|| format!("failed to load {}", did.display()))
}

fn lookup(resolver: &CandidTypeResolver, method: &str) -> eyre::Result<MethodSignature> {
    resolver.resolve_method(method).ok_or_else(|| {
        eyre!(
            "no method '{}' (available: {})",
            method,
            resolver.method_names().join(", ")
        )
    })
}

fn read_json(arg: &str) -> eyre::Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).wrap_err_with(|| format!("cannot read {}", path))
        }
        None => Ok(arg.to_string()),
    }
}

fn describe(signature: &MethodSignature) -> String {
    let list = |args: &[ResolvedArg]| {
        args.iter()
            .map(|arg| match &arg.name {
                Some(name) => format!("{} : {}", name, arg.ty),
                None => arg.ty.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut line = format!(
        "{} : ({}) -> ({})",
        signature.name,
        list(&signature.args),
        list(&signature.results)
    );
    for mode in &signature.modes {
        line.push(' ');
        line.push_str(mode.keyword());
    }
    line
}
