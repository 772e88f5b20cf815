//! Errors the code generator can raise. Distinct from [`crate::diagnostics`]:
//! these are internal fallibility (the ambient stack's `Result` boundary),
//! never properties of the source program collected and sorted for an
//! error file (§7 "Error Handling Design").

use moonc_core::Location;

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// Float literals are 8 bytes wide but no instruction sequence in this
    /// generator performs float arithmetic; see DESIGN.md for the decided
    /// open question. Raised instead of silently emitting integer code.
    #[error("unsupported float arithmetic at {0}")]
    UnsupportedFloatArith(Location),

    /// A single expression nested more than twelve live temporaries deep.
    #[error("register pool exhausted: expression nesting too deep")]
    RegisterPoolExhausted,

    /// The AST shape doesn't match what semantic analysis should have
    /// guaranteed (a record or table link missing post-analysis). Always a
    /// bug in an earlier phase, not a property of the source program.
    #[error("internal code generator error: {0}")]
    Internal(String),
}
