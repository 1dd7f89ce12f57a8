//! devdispatch: retargets calls to device-dispatching wrapper functions.
//!
//! ```text
//! IrModule → PassManager["wrapper"] → IrModule (+ changed flag)
//! ```
//!
//! For every function `foo_wrapper` whose signature mentions the tensor
//! struct, each `call @foo(args...)` becomes
//! `call @foo_wrapper(sret..., get_device(), rest...)`. The entry function
//! additionally calls `set_device(strcmp(argv[1], "-cpu"))` before anything
//! else. `get_device`, `set_device` and `strcmp` are only declared; a runtime
//! supplies them at link time.

pub mod codegen;
pub mod error;
pub mod ir;
pub mod pass;

pub use error::Error;
pub use pass::{WrapperConfig, WrapperPass, WrapperReport};

use crate::ir::module::IrModule;
use crate::pass::PassManager;

/// Runs the named passes in order over `module`.
///
/// Returns whether any pass modified the module. The pipeline aborts at the
/// first unknown name or failing pass.
pub fn run_passes(module: &mut IrModule, names: &[&str]) -> Result<bool, Error> {
    let mut pm = PassManager::new();
    for name in names {
        pm.add_pass_by_name(name)?;
    }
    pm.run(module).map_err(|(_, e)| Error::Pass(e))
}
