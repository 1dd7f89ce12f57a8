//! Discovery of wrapper functions eligible for device dispatch.

use std::collections::HashSet;

use tracing::debug;

use crate::ir::function::IrFunction;
use crate::ir::module::IrModule;
use crate::ir::types::IrType;
use crate::pass::wrapper::WrapperConfig;

/// Names of the functions a call may be redirected to.
///
/// Built once per pass invocation and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperIndex {
    names: HashSet<String>,
}

impl WrapperIndex {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Indexed names in sorted order.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for WrapperIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Scans a module and decides which `*_wrapper` functions are dispatchable.
///
/// A function is indexed iff
/// - its name ends with the wrapper suffix,
/// - it has at least two parameters, and
/// - parameter 0 is a pointer to the tensor struct, or parameter 1 is the
///   tensor struct (directly or behind one pointer).
///
/// The tensor check compares struct names only.
pub struct WrapperIndexBuilder<'a> {
    config: &'a WrapperConfig,
}

impl<'a> WrapperIndexBuilder<'a> {
    pub fn new(config: &'a WrapperConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, module: &IrModule) -> WrapperIndex {
        let index: WrapperIndex = module
            .functions()
            .iter()
            .filter(|f| self.is_eligible(f))
            .map(|f| f.name.clone())
            .collect();
        debug!(
            module = %module.name,
            indexed = index.len(),
            "built wrapper index"
        );
        index
    }

    pub fn is_eligible(&self, func: &IrFunction) -> bool {
        if !func.name.ends_with(&self.config.wrapper_suffix) {
            return false;
        }
        if func.params.len() < 2 {
            debug!(function = %func.name, "wrapper has fewer than two parameters, not indexed");
            return false;
        }

        let first = &func.params[0].ty;
        if first.pointee().is_some_and(|t| self.is_tensor(t)) {
            return true;
        }

        let second = &func.params[1].ty;
        let second = second.pointee().unwrap_or(second);
        if self.is_tensor(second) {
            return true;
        }

        debug!(function = %func.name, "wrapper signature has no tensor parameter, not indexed");
        false
    }

    fn is_tensor(&self, ty: &IrType) -> bool {
        ty.struct_name() == Some(self.config.tensor_type.as_str())
    }
}
