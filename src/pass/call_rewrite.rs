//! Redirection of call sites to their device-dispatching wrappers.
//!
//! Rewriting happens in two phases per function: a read-only scan collects
//! the call sites to rewrite, then each affected block's instruction list is
//! rebuilt with the replacements spliced in. Nothing is erased from a list
//! that is being iterated.

use std::collections::HashMap;

use tracing::debug;

use crate::ir::function::{FunctionId, IrFunction, ParamAttr};
use crate::ir::instr::IrInstr;
use crate::ir::module::IrModule;
use crate::ir::types::IrType;
use crate::ir::value::ValueId;
use crate::pass::wrapper::{DiagnosticKind, WrapperConfig, WrapperDiagnostic};
use crate::pass::wrapper_index::WrapperIndex;

/// A call site scheduled for rewriting.
#[derive(Debug)]
struct RewriteSite {
    block: usize,
    instr: usize,
    wrapper: String,
    /// Leading arguments that stay in front of the device id.
    sret_count: usize,
}

/// Result of rewriting one function or a whole module.
#[derive(Debug, Default)]
pub struct RewriteOutcome {
    pub rewritten: usize,
    pub diagnostics: Vec<WrapperDiagnostic>,
}

impl RewriteOutcome {
    fn merge(&mut self, other: RewriteOutcome) {
        self.rewritten += other.rewritten;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Rewrites `call @base(args...)` into
/// `call @base_wrapper(sret args..., get_device(), rest...)` for every
/// `base_wrapper` present in the index.
pub struct CallSiteRewriter<'a> {
    config: &'a WrapperConfig,
    index: &'a WrapperIndex,
}

impl<'a> CallSiteRewriter<'a> {
    pub fn new(config: &'a WrapperConfig, index: &'a WrapperIndex) -> Self {
        Self { config, index }
    }

    /// Rewrites every function in the module.
    pub fn rewrite_module(&self, module: &mut IrModule) -> RewriteOutcome {
        let mut outcome = RewriteOutcome::default();
        for idx in 0..module.functions().len() {
            outcome.merge(self.rewrite_function(module, FunctionId(idx as u32)));
        }
        outcome
    }

    /// Rewrites the call sites of a single function.
    pub fn rewrite_function(&self, module: &mut IrModule, id: FunctionId) -> RewriteOutcome {
        let (sites, diagnostics) = self.collect_sites(module, id);
        if sites.is_empty() {
            return RewriteOutcome {
                rewritten: 0,
                diagnostics,
            };
        }

        module.get_or_insert_function(&self.config.device_query, vec![], IrType::i32());
        let func = &mut module.functions[id.0 as usize];
        let rewritten = apply_sites(func, sites, &self.config.device_query);
        RewriteOutcome {
            rewritten,
            diagnostics,
        }
    }

    fn collect_sites(
        &self,
        module: &IrModule,
        id: FunctionId,
    ) -> (Vec<RewriteSite>, Vec<WrapperDiagnostic>) {
        let mut sites = Vec::new();
        let mut diagnostics = Vec::new();
        let Some(func) = module.function(id) else {
            return (sites, diagnostics);
        };

        for (b, block) in func.blocks().iter().enumerate() {
            for (i, instr) in block.instrs.iter().enumerate() {
                let IrInstr::Call { callee, args, .. } = instr else {
                    continue;
                };
                let candidate = format!("{}{}", callee, self.config.wrapper_suffix);
                if !self.index.contains(&candidate) {
                    continue;
                }
                let Some(wrapper) = module.function_by_name(&candidate) else {
                    diagnostics.push(WrapperDiagnostic::new(
                        DiagnosticKind::LookupFailure,
                        &func.name,
                        format!(
                            "indexed wrapper '{}' for call to '{}' in block '{}' is not in the module",
                            candidate,
                            callee,
                            block.label()
                        ),
                    ));
                    continue;
                };
                let sret_count = wrapper
                    .leading_params_with(ParamAttr::StructRet)
                    .min(args.len());
                sites.push(RewriteSite {
                    block: b,
                    instr: i,
                    wrapper: candidate,
                    sret_count,
                });
            }
        }
        (sites, diagnostics)
    }
}

/// Splices the rewritten calls into `func`. `sites` are in program order.
fn apply_sites(func: &mut IrFunction, sites: Vec<RewriteSite>, device_query: &str) -> usize {
    let mut replacements: HashMap<ValueId, ValueId> = HashMap::new();
    let mut rewritten = 0;
    let mut sites = sites.into_iter().peekable();

    for b in 0..func.blocks.len() {
        if sites.peek().map_or(true, |s| s.block != b) {
            continue;
        }
        let old = std::mem::take(&mut func.blocks[b].instrs);
        let mut new_instrs = Vec::with_capacity(old.len() + 1);

        for (i, instr) in old.into_iter().enumerate() {
            let site = match sites.peek() {
                Some(s) if s.block == b && s.instr == i => sites.next(),
                _ => None,
            };
            let Some(site) = site else {
                new_instrs.push(instr);
                continue;
            };
            let (result, callee, args, result_ty) = match instr {
                IrInstr::Call {
                    result,
                    callee,
                    args,
                    result_ty,
                } => (result, callee, args, result_ty),
                other => {
                    new_instrs.push(other);
                    continue;
                }
            };

            let device = func.fresh_value();
            func.value_types.insert(device, IrType::i32());
            new_instrs.push(IrInstr::Call {
                result: Some(device),
                callee: device_query.to_owned(),
                args: vec![],
                result_ty: Some(IrType::i32()),
            });

            let k = site.sret_count;
            let mut new_args = Vec::with_capacity(args.len() + 1);
            new_args.extend_from_slice(&args[..k]);
            new_args.push(device);
            new_args.extend_from_slice(&args[k..]);

            let new_result = result.map(|old_result| {
                let v = func.fresh_value();
                if let Some(ty) = &result_ty {
                    func.value_types.insert(v, ty.clone());
                }
                replacements.insert(old_result, v);
                v
            });

            debug!(
                function = %func.name,
                from = %callee,
                to = %site.wrapper,
                sret = k,
                "rewrote call site"
            );
            new_instrs.push(IrInstr::Call {
                result: new_result,
                callee: site.wrapper,
                args: new_args,
                result_ty,
            });
            rewritten += 1;
        }
        func.blocks[b].instrs = new_instrs;
    }

    func.replace_uses(&replacements);
    func.rebuild_value_defs();
    rewritten
}
