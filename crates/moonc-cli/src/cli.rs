//! Phase dispatch: the one place that wires the scanner, parser, semantic
//! analyzer, and code generator together, gates each stage on the previous
//! one's diagnostics (§5's forward-only resource ordering), and writes the
//! `.outXXX` file artifacts (§6) a successful stage produces.
//!
//! `main.rs` stays a thin wrapper over [`Args::parse`] and [`run`]; this
//! module owns everything fallible, returning a single [`CliError`] so the
//! binary has one place to map to a process exit code.

use std::path::{Path, PathBuf};
use std::process::Command;

use clap::{Parser, ValueEnum};

use moonc_compiler::{artifacts, codegen, parser, scanner::Scanner, semantic};
use moonc_core::CompilationContext;

/// `moonc <phase> <source>`: compiles `source` up to and including `phase`,
/// writing every `.outXXX` artifact the stages it actually ran produce.
#[derive(Debug, Parser)]
#[command(name = "moonc", about = "Compiler driver for the moonc source language")]
pub struct Args {
    /// Which phase to run: earlier phases always run first as prerequisites.
    pub phase: Phase,

    /// Path to the `.src` source file to compile.
    pub source: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Phase {
    /// Scan only: `.outlextokens` / `.outlexerrors`.
    Lex,
    /// Scan then parse: adds `.outderivation`, `.outast`, `.outsyntaxerrors`.
    Syn,
    /// Scan, parse, then analyze: adds `.outsymboltables`, `.outsemanticerrors`.
    Sem,
    /// Full pipeline through code generation: adds `.moon`.
    Gen,
    /// Full pipeline, then hands the `.moon` file to the target simulator.
    Exe,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read source file {path}")]
    ReadSource { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to write artifact {path}")]
    WriteArtifact { path: PathBuf, #[source] source: std::io::Error },

    #[error("source path has no file stem: {0}")]
    BadSourcePath(PathBuf),

    #[error("code generation failed: {0}")]
    Codegen(#[from] codegen::CodegenError),

    #[error("failed to launch target simulator '{moon}'")]
    SimulatorLaunch { moon: String, #[source] source: std::io::Error },
}

/// Whether the requested phase's own check passed — distinct from
/// [`CliError`], which is reserved for I/O/launch failures that are not
/// properties of the source program (§7).
pub struct Outcome {
    pub success: bool,
}

/// Runs `phase` over `source`, writing every artifact its prerequisite
/// stages produced, and reports whether the requested phase itself
/// succeeded. Returns `Err` only for ambient I/O failures.
pub fn run(args: &Args) -> Result<Outcome, CliError> {
    let text = std::fs::read_to_string(&args.source).map_err(|source| CliError::ReadSource {
        path: args.source.clone(),
        source,
    })?;
    let stem = artifact_stem(&args.source)?;

    let tokens = Scanner::tokenize(&text);
    let lex_ok = !tokens.iter().any(|t| t.kind.is_error());
    write_artifact(&stem, "outlextokens", &artifacts::format_tokens(&tokens))?;
    write_artifact(&stem, "outlexerrors", &artifacts::format_lex_errors(&tokens))?;
    if args.phase == Phase::Lex {
        return Ok(Outcome { success: lex_ok });
    }

    let parsed = parser::parse(&tokens);
    write_artifact(&stem, "outderivation", &artifacts::format_derivation(&parsed.derivation))?;
    write_artifact(&stem, "outast", &artifacts::format_ast(&parsed.ast))?;
    write_artifact(&stem, "outsyntaxerrors", &artifacts::format_diagnostics(&parsed.diagnostics))?;
    let syn_ok = lex_ok && parsed.succeeded;
    if parsed.succeeded {
        write_artifact(&stem, "outderivation.var", &artifacts::format_derivation_var(&parsed.derivation))?;
    }
    if args.phase == Phase::Syn {
        return Ok(Outcome { success: syn_ok });
    }

    if !syn_ok {
        // §5: a parse failure gates semantic analysis and code generation.
        return Ok(Outcome { success: false });
    }
    let prog = parsed.ast.root.expect("a succeeded parse always produces a root");
    let mut ast = parsed.ast;
    let mut ctx = CompilationContext::new();
    let semantic_diagnostics = semantic::analyze(&mut ctx, &mut ast, prog);
    write_artifact(&stem, "outsymboltables", &artifacts::format_symbol_tables(&ctx))?;
    write_artifact(&stem, "outsemanticerrors", &artifacts::format_diagnostics(&semantic_diagnostics))?;
    let sem_ok = !semantic_diagnostics.has_errors();
    if args.phase == Phase::Sem {
        return Ok(Outcome { success: sem_ok });
    }

    if !sem_ok {
        // §5: a failed semantic pass gates code generation.
        return Ok(Outcome { success: false });
    }
    let program = codegen::generate(&ctx, &mut ast, prog)?;
    let moon_path = artifact_path(&stem, "moon");
    std::fs::write(&moon_path, program.format()).map_err(|source| CliError::WriteArtifact {
        path: moon_path.clone(),
        source,
    })?;
    if args.phase == Phase::Gen {
        return Ok(Outcome { success: true });
    }

    let moon_runtime = std::env::var("MOON").unwrap_or_else(|_| "./moon".to_string());
    let status = Command::new(&moon_runtime)
        .arg(&moon_path)
        .status()
        .map_err(|source| CliError::SimulatorLaunch { moon: moon_runtime, source })?;
    Ok(Outcome { success: status.success() })
}

fn artifact_stem(source: &Path) -> Result<PathBuf, CliError> {
    if source.file_stem().is_none() {
        return Err(CliError::BadSourcePath(source.to_path_buf()));
    }
    Ok(source.with_extension(""))
}

fn artifact_path(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn write_artifact(stem: &Path, suffix: &str, contents: &str) -> Result<(), CliError> {
    let path = artifact_path(stem, suffix);
    std::fs::write(&path, contents).map_err(|source| CliError::WriteArtifact { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn lex_phase_writes_token_and_error_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_fixture(&dir, "prog.src", "main do end");
        let args = Args { phase: Phase::Lex, source: source.clone() };
        let outcome = run(&args).unwrap();
        assert!(outcome.success);
        assert!(source.with_extension("outlextokens").exists());
        assert!(source.with_extension("outlexerrors").exists());
        assert!(!source.with_extension("outast").exists());
    }

    #[test]
    fn lex_phase_fails_on_invalid_token() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_fixture(&dir, "bad.src", "1abc");
        let args = Args { phase: Phase::Lex, source };
        let outcome = run(&args).unwrap();
        assert!(!outcome.success);
    }

    #[test]
    fn syn_phase_writes_derivation_and_ast() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_fixture(&dir, "prog.src", "main do end");
        let args = Args { phase: Phase::Syn, source: source.clone() };
        let outcome = run(&args).unwrap();
        assert!(outcome.success);
        assert!(source.with_extension("outderivation").exists());
        assert!(source.with_extension("outast").exists());
        assert!(source.with_extension("outderivation.var").exists());
    }

    #[test]
    fn gen_phase_writes_moon_file_for_valid_program() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_fixture(
            &dir,
            "prog.src",
            "main\ndo\ninteger a;\ninteger b;\na := 2;\nb := a + 3;\nwrite(b);\nend",
        );
        let args = Args { phase: Phase::Gen, source: source.clone() };
        let outcome = run(&args).unwrap();
        assert!(outcome.success);
        let moon = std::fs::read_to_string(source.with_extension("moon")).unwrap();
        assert!(moon.contains("entry") || moon.contains("main"));
    }

    #[test]
    fn sem_phase_fails_on_undeclared_class() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_fixture(&dir, "prog.src", "main\ndo\nFoo a;\nend");
        let args = Args { phase: Phase::Sem, source: source.clone() };
        let outcome = run(&args).unwrap();
        assert!(!outcome.success);
        let errors = std::fs::read_to_string(source.with_extension("outsemanticerrors")).unwrap();
        assert!(errors.contains("undeclared class"));
    }
}
