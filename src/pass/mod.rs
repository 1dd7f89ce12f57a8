pub mod call_rewrite;
pub mod entry_patch;
pub mod registry;
pub mod validate;
pub mod wrapper;
pub mod wrapper_index;

pub use call_rewrite::CallSiteRewriter;
pub use entry_patch::EntryPointPatcher;
pub use registry::{create_pass, registered_passes};
pub use validate::ValidatePass;
pub use wrapper::{DiagnosticKind, WrapperConfig, WrapperDiagnostic, WrapperPass, WrapperReport};
pub use wrapper_index::{WrapperIndex, WrapperIndexBuilder};

use crate::error::PassError;
use crate::ir::module::IrModule;

/// A compiler pass that operates on an `IrModule` in place.
///
/// Passes must be deterministic: given the same `IrModule`, the transformed
/// output must be identical across runs (no global mutable state, no randomness).
pub trait Pass {
    /// Registered name, used by the registry and in error messages.
    fn name(&self) -> &'static str;

    /// Run the pass on the module.
    ///
    /// Returns `Ok(true)` if the module was modified. On error, the module
    /// state is unspecified and the pipeline aborts.
    fn run(&mut self, module: &mut IrModule) -> Result<bool, PassError>;
}

/// Manages and executes an ordered sequence of compiler passes.
///
/// Passes run in the order they were registered. The pipeline aborts at the
/// first error.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    /// If set, dumps IR text to stderr after the pass with this name completes.
    dump_after: Option<String>,
}

impl PassManager {
    pub fn new() -> Self {
        Self { passes: Vec::new(), dump_after: None }
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Appends the pass registered under `name`.
    pub fn add_pass_by_name(&mut self, name: &str) -> Result<(), PassError> {
        let pass = create_pass(name).ok_or_else(|| PassError::UnknownPass {
            name: name.to_owned(),
        })?;
        self.passes.push(pass);
        Ok(())
    }

    /// Configures the manager to dump IR to stderr after the named pass completes.
    pub fn set_dump_after(&mut self, pass_name: impl Into<String>) {
        self.dump_after = Some(pass_name.into());
    }

    /// Runs all passes in registration order on `module`.
    ///
    /// Returns whether any pass modified the module, or
    /// `Err((pass_name, error))` at the first failure.
    pub fn run(&mut self, module: &mut IrModule) -> Result<bool, (String, PassError)> {
        let mut changed = false;
        for pass in &mut self.passes {
            changed |= pass.run(module).map_err(|e| (pass.name().to_owned(), e))?;
            if let Some(ref target) = self.dump_after {
                if pass.name() == target.as_str() {
                    use crate::codegen::printer::emit_ir_text;
                    if let Ok(text) = emit_ir_text(module) {
                        eprintln!("--- IR after {} ---\n{}", pass.name(), text);
                    }
                }
            }
        }
        Ok(changed)
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
