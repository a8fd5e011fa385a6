//! Dusk stylesheet variables
//!
//! Expands `var(--name)` references inside component stylesheets against a
//! table of named values.
//!
//! # Overview
//!
//! - **Single pass**: substituted values are never scanned again, so a value
//!   that itself looks like `var(--other)` ends up in the output verbatim
//! - **Graceful degradation**: a reference to an unknown name becomes
//!   [`FALLBACK_VALUE`] (`inherit`) instead of failing
//! - **No escaping**: anything of the form `var(--name)` is a reference
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! let mut vars = HashMap::new();
//! vars.insert("primary".to_string(), "#1e1e1e".to_string());
//!
//! let css = dusk_css::resolve("background: var(--primary); color: var(--text);", &vars);
//! assert_eq!(css, "background: #1e1e1e; color: inherit;");
//! ```

mod lookup;
mod resolver;

pub use lookup::VariableLookup;
pub use resolver::{references, resolve, unresolved, VarRef, FALLBACK_VALUE};
