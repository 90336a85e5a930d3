//! Crate root: wires together the back-end pipeline.
//!
//! The stages are small and composable:
//! - `ast` is the tree handed over by the (external) parser.
//! - `env` owns the per-compilation type environment and name generator.
//! - `codegen` lowers the tree into quad-code fragments with symbolic labels.
//! - `finalize` resolves labels into absolute instruction indices.
//! - `error` holds the error kinds shared by the other modules.

pub mod ast;
pub mod env;
pub mod error;
pub mod finalize;
pub mod quad;
pub mod ty;

mod codegen;

pub use ast::Program;
pub use env::Context;
pub use error::{CompileError, CompileResult};
pub use finalize::QuadProgram;
pub use quad::Fragment;
pub use ty::Type;

/// Knobs of one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
  /// Written into the trailing comment line of the output.
  pub signature: String,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      signature: format!("cpq {}", env!("CARGO_PKG_VERSION")),
    }
  }
}

/// Translate `program` into a fragment whose jumps are still symbolic.
pub fn translate(program: &Program) -> CompileResult<Fragment> {
  let mut ctx = Context::new();
  codegen::generate(program, &mut ctx)
}

/// Translate and resolve `program` into an executable instruction list.
pub fn compile_program(program: &Program, options: &Options) -> CompileResult<QuadProgram> {
  let fragment = translate(program)?;
  finalize::finalize(fragment, &options.signature)
}

/// Compile `program` into quad-code text with the default options.
pub fn compile(program: &Program) -> CompileResult<String> {
  compile_with(program, &Options::default())
}

/// Compile `program` into quad-code text, signed with `options.signature`.
pub fn compile_with(program: &Program, options: &Options) -> CompileResult<String> {
  Ok(compile_program(program, options)?.to_string())
}
