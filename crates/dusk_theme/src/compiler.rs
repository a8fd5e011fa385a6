//! Injected style compilation
//!
//! The engine never builds a native style object itself. The windowing layer
//! hands it a [`StyleCompiler`] that turns resolved stylesheet text into
//! whatever handle it applies to its widgets.

use std::sync::Arc;

use crate::error::CompileError;

/// Turns a component's resolved stylesheet into an opaque handle
pub trait StyleCompiler: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;

    fn compile(&self, component: &str, css: &str) -> Result<Self::Handle, CompileError>;
}

impl<F, H> StyleCompiler for F
where
    F: Fn(&str, &str) -> Result<H, CompileError> + Send + Sync + 'static,
    H: Send + Sync + 'static,
{
    type Handle = H;

    fn compile(&self, component: &str, css: &str) -> Result<H, CompileError> {
        self(component, css)
    }
}

/// Compiler whose handle is the resolved text itself
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainCompiler;

impl StyleCompiler for PlainCompiler {
    type Handle = Arc<str>;

    fn compile(&self, _component: &str, css: &str) -> Result<Arc<str>, CompileError> {
        Ok(Arc::from(css))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_compilers() {
        let compiler = |component: &str, css: &str| -> Result<usize, CompileError> {
            if css.contains("inherit") {
                Err(CompileError::new(format!("{component}: unresolved value")))
            } else {
                Ok(css.len())
            }
        };

        assert_eq!(compiler.compile("panel", "color: red;"), Ok(11));
        assert_eq!(
            compiler.compile("panel", "color: inherit;"),
            Err(CompileError::new("panel: unresolved value"))
        );
    }

    #[test]
    fn plain_compiler_keeps_text() {
        let handle = PlainCompiler.compile("panel", "color: red;").unwrap();
        assert_eq!(&*handle, "color: red;");
    }
}
