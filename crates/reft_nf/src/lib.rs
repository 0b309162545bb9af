//! Nextflow domain model built from the syntax tree.
//!
//! ```text
//! Source (.nf) → Lexer → Parser → AST → visitors → Module
//! Source (.config) → Lexer → Parser → AST → ConfigFile
//! ```
//!
//! The visitors raise bare method calls into processes with typed
//! directives and channels, workflows with their sections, include
//! statements and `params.*` references.
//!
//! # Example
//!
//! ```ignore
//! use reft_nf::ModuleBuilder;
//!
//! let module = ModuleBuilder::new("main.nf").build_source(source)?;
//! for process in &module.processes {
//!     println!("{} has {} directives", process.name, process.directives.len());
//! }
//! ```

mod args;
pub mod config;
pub mod directives;
mod error;
mod include;
pub mod inputs;
mod module;
pub mod outputs;
mod params;
mod process;
mod workflow;

pub use config::{ConfigDirective, ConfigFile, DirectiveValue, NamedScope, ProcessScope};
pub use directives::{Container, Directive, DirectiveError, DirectiveKind, Memory, MemoryUnit};
pub use error::*;
pub use include::{IncludeItem, IncludeStatement, IncludeVisitor};
pub use inputs::{Input, InputKind};
pub use module::{Anomaly, Module, ModuleBuilder};
pub use outputs::{Output, OutputKind};
pub use params::{ParamInfo, ParamVisitor};
pub use process::{Process, ProcessVisitor, ScriptKind};
pub use workflow::{Workflow, WorkflowVisitor};
