//! The wrapper pass: redirects calls to device-dispatching `*_wrapper`
//! functions and makes the entry function select the device from its
//! command line.
//!
//! One invocation runs three phases in order:
//! 1. index: `WrapperIndexBuilder` collects the eligible wrappers,
//! 2. rewrite: `CallSiteRewriter` visits every function,
//! 3. patch: `EntryPointPatcher` runs when the visit reaches the entry
//!    function, before that function's calls are rewritten.
//!
//! Per-site faults never abort the pass. They are logged with
//! `tracing::warn!` and collected into the returned `WrapperReport`.

use thiserror::Error;
use tracing::{info, warn};

use crate::error::PassError;
use crate::ir::function::FunctionId;
use crate::ir::module::IrModule;
use crate::pass::call_rewrite::CallSiteRewriter;
use crate::pass::entry_patch::EntryPointPatcher;
use crate::pass::wrapper_index::WrapperIndexBuilder;
use crate::pass::Pass;

/// Names and literals the pass matches against or emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperConfig {
    /// Suffix that marks a wrapper: `foo` dispatches through `foo_wrapper`.
    pub wrapper_suffix: String,
    /// Struct name of the tensor type a wrapper signature must mention.
    pub tensor_type: String,
    /// Function patched with device selection.
    pub entry_function: String,
    /// `() -> i32` hook returning the current device id.
    pub device_query: String,
    /// `(i32) -> void` hook selecting the device.
    pub device_config: String,
    /// `(ptr<i8>, ptr<i8>) -> i32` string comparison, zero on equality.
    pub string_compare: String,
    /// Command-line flag compared against.
    pub cpu_flag: String,
    /// Position of the flag in the argument vector.
    pub flag_index: u32,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            wrapper_suffix: "_wrapper".into(),
            tensor_type: "struct.Tensor".into(),
            entry_function: "main".into(),
            device_query: "get_device".into(),
            device_config: "set_device".into(),
            string_compare: "strcmp".into(),
            cpu_flag: "-cpu".into(),
            flag_index: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// An indexed wrapper could not be resolved when its call site was rewritten.
    #[error("wrapper lookup failure")]
    LookupFailure,
    /// The entry function has no argument vector to read the flag from.
    #[error("argument vector out of bounds")]
    ArgumentBoundsError,
}

/// A recoverable fault. The affected call site or entry patch was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in function '{function}': {detail}")]
pub struct WrapperDiagnostic {
    pub kind: DiagnosticKind,
    pub function: String,
    pub detail: String,
}

impl WrapperDiagnostic {
    pub fn new(kind: DiagnosticKind, function: &str, detail: String) -> Self {
        Self {
            kind,
            function: function.to_owned(),
            detail,
        }
    }
}

/// What one invocation did to a module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperReport {
    /// Number of wrappers that qualified for dispatch.
    pub indexed: usize,
    /// Number of call sites redirected to a wrapper.
    pub rewritten_calls: usize,
    pub entry_patched: bool,
    pub diagnostics: Vec<WrapperDiagnostic>,
}

impl WrapperReport {
    /// `true` if the module was modified.
    pub fn changed(&self) -> bool {
        self.rewritten_calls > 0 || self.entry_patched
    }

    fn record(&mut self, diagnostic: WrapperDiagnostic) {
        warn!(
            kind = ?diagnostic.kind,
            function = %diagnostic.function,
            "{}",
            diagnostic.detail
        );
        self.diagnostics.push(diagnostic);
    }
}

/// Registered as `"wrapper"`. Holds configuration only; every invocation
/// builds its own wrapper index and drops it on return.
#[derive(Debug, Clone, Default)]
pub struct WrapperPass {
    pub config: WrapperConfig,
}

impl WrapperPass {
    pub fn new(config: WrapperConfig) -> Self {
        Self { config }
    }

    /// Runs index, rewrite and patch over `module`.
    pub fn run_on_module(&self, module: &mut IrModule) -> WrapperReport {
        let index = WrapperIndexBuilder::new(&self.config).build(module);
        let rewriter = CallSiteRewriter::new(&self.config, &index);
        let patcher = EntryPointPatcher::new(&self.config);

        let mut report = WrapperReport {
            indexed: index.len(),
            ..WrapperReport::default()
        };

        // Functions declared while rewriting have no body; the range is fixed here.
        for idx in 0..module.functions().len() {
            let id = FunctionId(idx as u32);
            if module.functions()[idx].name == self.config.entry_function {
                match patcher.patch(module, id) {
                    Ok(patched) => report.entry_patched |= patched,
                    Err(diagnostic) => report.record(diagnostic),
                }
            }

            let outcome = rewriter.rewrite_function(module, id);
            report.rewritten_calls += outcome.rewritten;
            for diagnostic in outcome.diagnostics {
                report.record(diagnostic);
            }
        }

        info!(
            module = %module.name,
            indexed = report.indexed,
            rewritten = report.rewritten_calls,
            entry_patched = report.entry_patched,
            diagnostics = report.diagnostics.len(),
            "wrapper pass finished"
        );
        report
    }
}

impl Pass for WrapperPass {
    fn name(&self) -> &'static str {
        "wrapper"
    }

    fn run(&mut self, module: &mut IrModule) -> Result<bool, PassError> {
        Ok(self.run_on_module(module).changed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_runtime_names() {
        let config = WrapperConfig::default();
        assert_eq!(config.wrapper_suffix, "_wrapper");
        assert_eq!(config.device_query, "get_device");
        assert_eq!(config.device_config, "set_device");
        assert_eq!(config.cpu_flag, "-cpu");
        assert_eq!(config.flag_index, 1);
    }

    #[test]
    fn diagnostic_display_names_function() {
        let d = WrapperDiagnostic::new(
            DiagnosticKind::LookupFailure,
            "compute",
            "wrapper 'foo_wrapper' is gone".into(),
        );
        assert_eq!(
            d.to_string(),
            "wrapper lookup failure in function 'compute': wrapper 'foo_wrapper' is gone"
        );
    }

    #[test]
    fn empty_module_is_unchanged() {
        let mut module = IrModule::new("empty");
        let report = WrapperPass::default().run_on_module(&mut module);
        assert!(!report.changed());
        assert_eq!(report, WrapperReport::default());
    }
}
