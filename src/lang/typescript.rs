//! TypeScript and JavaScript language support.

use super::Language;
use tree_sitter::Language as TsLanguage;

/// TypeScript without JSX (`.ts`, `.mts`, `.cts`).
///
/// Kept separate from [`Tsx`] because the two grammars disagree on
/// `<T>expr` type assertions.
pub struct TypeScript;

impl Language for TypeScript {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &[&'static str] {
        &["ts", "mts", "cts"]
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }
}

/// TSX, also used for plain JavaScript so that JSX in `.js` files parses.
pub struct Tsx;

impl Language for Tsx {
    fn name(&self) -> &'static str {
        "tsx"
    }

    fn extensions(&self) -> &[&'static str] {
        &["tsx", "js", "jsx", "mjs", "cjs"]
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }
}
