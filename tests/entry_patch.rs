//! Device selection injected into the entry function.

use devdispatch::codegen::emit_ir_text;
use devdispatch::ir::function::{IrFunction, Param, ParamAttr};
use devdispatch::ir::instr::{IrInstr, MISSING_ARG};
use devdispatch::ir::module::{GlobalInit, IrFunctionBuilder, IrModule, Linkage};
use devdispatch::ir::types::{DType, IrType};
use devdispatch::pass::validate::validate_module;
use devdispatch::pass::{DiagnosticKind, WrapperConfig, WrapperPass};

fn argv_ty() -> IrType {
    IrType::ptr(IrType::c_str())
}

fn main_params() -> Vec<Param> {
    vec![Param::new("argc", IrType::i32()), Param::new("argv", argv_ty())]
}

fn declare(module: &mut IrModule, name: &str, params: Vec<Param>, ret: IrType) {
    module
        .add_function(IrFunctionBuilder::declaration(name, params, ret))
        .unwrap();
}

fn main_fn(module: &IrModule) -> &IrFunction {
    module.function_by_name("main").unwrap()
}

fn callee_names(instrs: &[IrInstr]) -> Vec<&str> {
    instrs.iter().filter_map(|i| i.callee()).collect()
}

/// `main(argc, argv) { %2 = const 0; call @init(); return %2 }`
fn build_main_with_call() -> IrModule {
    let mut module = IrModule::new("prog");
    declare(&mut module, "init", vec![], IrType::Void);
    let mut b = IrFunctionBuilder::new("main", main_params(), IrType::i32());
    b.create_entry_block();
    let zero = b.emit_const_int(0, IrType::i32());
    b.emit_call("init", vec![], IrType::Void);
    b.emit_return(vec![zero]);
    module.add_function(b.build()).unwrap();
    module
}

#[test]
fn patch_goes_before_the_first_existing_call() {
    let mut module = build_main_with_call();
    let report = WrapperPass::default().run_on_module(&mut module);

    assert!(report.entry_patched);
    assert!(report.changed());
    assert_eq!(report.rewritten_calls, 0);
    assert!(report.diagnostics.is_empty());

    let main = main_fn(&module);
    let argc = main.param_value(0).unwrap();
    let argv = main.param_value(1).unwrap();
    let instrs = &main.entry_block().unwrap().instrs;
    assert_eq!(instrs.len(), 7);
    assert!(matches!(instrs[0], IrInstr::ConstInt { value: 0, .. }));

    let arg = match &instrs[1] {
        IrInstr::ArgLoad {
            result,
            argc: c,
            argv: v,
            index,
        } => {
            assert_eq!((*c, *v, *index), (argc, argv, 1));
            *result
        }
        other => panic!("expected argload, found {:?}", other),
    };
    let flag = match &instrs[2] {
        IrInstr::GlobalAddr { result, global, result_ty } => {
            assert_eq!(global, ".str");
            assert_eq!(result_ty, &IrType::c_str());
            *result
        }
        other => panic!("expected global address, found {:?}", other),
    };
    let cmp = match &instrs[3] {
        IrInstr::Call {
            result: Some(r),
            callee,
            args,
            ..
        } if callee == "strcmp" => {
            assert_eq!(args, &vec![arg, flag]);
            *r
        }
        other => panic!("expected strcmp call, found {:?}", other),
    };
    match &instrs[4] {
        IrInstr::Call {
            result: None,
            callee,
            args,
            ..
        } => {
            assert_eq!(callee, "set_device");
            assert_eq!(args, &vec![cmp]);
        }
        other => panic!("expected set_device call, found {:?}", other),
    }
    assert_eq!(instrs[5].callee(), Some("init"));
    assert!(instrs[6].is_terminator());

    validate_module(&module).unwrap();
}

#[test]
fn patch_adds_one_private_flag_string_and_runtime_declarations() {
    let mut module = build_main_with_call();
    WrapperPass::default().run_on_module(&mut module);

    assert_eq!(module.globals().len(), 1);
    let g = &module.globals()[0];
    assert_eq!(g.name, ".str");
    assert_eq!(g.init, GlobalInit::Str("-cpu".into()));
    assert!(g.constant);
    assert_eq!(g.linkage, Linkage::Private);

    let strcmp = module.function_by_name("strcmp").unwrap();
    assert!(strcmp.is_declaration());
    assert_eq!(strcmp.param_types(), vec![IrType::c_str(), IrType::c_str()]);
    assert_eq!(strcmp.return_ty, IrType::i32());

    let set_device = module.function_by_name("set_device").unwrap();
    assert_eq!(set_device.param_types(), vec![IrType::i32()]);
    assert_eq!(set_device.return_ty, IrType::Void);

    let main = main_fn(&module);
    let calls = callee_names(&main.entry_block().unwrap().instrs);
    assert_eq!(calls.iter().filter(|c| **c == "strcmp").count(), 1);
    assert_eq!(calls.iter().filter(|c| **c == "set_device").count(), 1);
    assert_eq!(main.value_type(main.entry_block().unwrap().instrs[1].result().unwrap()), Some(&IrType::c_str()));
}

#[test]
fn patch_goes_before_terminator_when_entry_block_has_no_call() {
    let mut module = IrModule::new("prog");
    let mut b = IrFunctionBuilder::new("main", main_params(), IrType::i32());
    b.create_entry_block();
    let zero = b.emit_const_int(0, IrType::i32());
    b.emit_return(vec![zero]);
    module.add_function(b.build()).unwrap();

    WrapperPass::default().run_on_module(&mut module);

    let instrs = &main_fn(&module).entry_block().unwrap().instrs;
    assert_eq!(instrs.len(), 6);
    assert_eq!(callee_names(instrs), vec!["strcmp", "set_device"]);
    assert!(matches!(instrs[5], IrInstr::Return { .. }));
    validate_module(&module).unwrap();
}

#[test]
fn calls_in_later_blocks_do_not_move_the_insertion_point() {
    let mut module = IrModule::new("prog");
    declare(&mut module, "init", vec![], IrType::Void);
    let mut b = IrFunctionBuilder::new("main", main_params(), IrType::Void);
    b.create_entry_block();
    let body = b.create_block(Some("body"));
    b.push_instr(IrInstr::Br { target: body, args: vec![] }, None);
    b.set_current_block(body);
    b.emit_call("init", vec![], IrType::Void);
    b.emit_return(vec![]);
    module.add_function(b.build()).unwrap();

    WrapperPass::default().run_on_module(&mut module);

    let main = main_fn(&module);
    let entry = &main.blocks()[0].instrs;
    assert_eq!(entry.len(), 5);
    assert_eq!(callee_names(entry), vec!["strcmp", "set_device"]);
    assert!(matches!(entry[4], IrInstr::Br { .. }));
    assert_eq!(callee_names(&main.blocks()[1].instrs), vec!["init"]);
}

#[test]
fn entry_calls_are_rewritten_after_the_patch() {
    let mut module = IrModule::new("prog");
    let tensor_ptr = IrType::ptr(IrType::named_struct("struct.Tensor"));
    declare(&mut module, "alloc", vec![Param::new("out", tensor_ptr.clone())], IrType::Void);
    declare(
        &mut module,
        "alloc_wrapper",
        vec![
            Param::new("out", tensor_ptr.clone()).with_attr(ParamAttr::StructRet),
            Param::new("device", IrType::i32()),
        ],
        IrType::Void,
    );
    let mut b = IrFunctionBuilder::new("main", main_params(), IrType::i32());
    b.create_entry_block();
    let slot = b.emit_alloca(IrType::named_struct("struct.Tensor"));
    b.emit_call("alloc", vec![slot], IrType::Void);
    let zero = b.emit_const_int(0, IrType::i32());
    b.emit_return(vec![zero]);
    module.add_function(b.build()).unwrap();

    let report = WrapperPass::default().run_on_module(&mut module);
    assert!(report.entry_patched);
    assert_eq!(report.rewritten_calls, 1);

    let instrs = &main_fn(&module).entry_block().unwrap().instrs;
    assert_eq!(
        callee_names(instrs),
        vec!["strcmp", "set_device", "get_device", "alloc_wrapper"]
    );
    validate_module(&module).unwrap();
}

#[test]
fn missing_argument_vector_is_reported_and_skipped() {
    let mut module = IrModule::new("prog");
    let mut b = IrFunctionBuilder::new("main", vec![Param::new("argc", IrType::i32())], IrType::i32());
    let params = b.create_entry_block();
    b.emit_return(vec![params[0]]);
    module.add_function(b.build()).unwrap();

    let before = emit_ir_text(&module).unwrap();
    let report = WrapperPass::default().run_on_module(&mut module);

    assert!(!report.entry_patched);
    assert!(!report.changed());
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::ArgumentBoundsError);
    assert_eq!(report.diagnostics[0].function, "main");
    assert_eq!(emit_ir_text(&module).unwrap(), before);
}

#[test]
fn non_pointer_second_parameter_is_not_an_argument_vector() {
    let mut module = IrModule::new("prog");
    let params = vec![Param::new("a", IrType::i32()), Param::new("b", IrType::Scalar(DType::I64))];
    let mut b = IrFunctionBuilder::new("main", params, IrType::Void);
    b.create_entry_block();
    b.emit_return(vec![]);
    module.add_function(b.build()).unwrap();

    let report = WrapperPass::default().run_on_module(&mut module);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::ArgumentBoundsError);
}

#[test]
fn declared_entry_function_is_left_alone() {
    let mut module = IrModule::new("lib");
    declare(&mut module, "main", main_params(), IrType::i32());

    let report = WrapperPass::default().run_on_module(&mut module);
    assert!(!report.changed());
    assert!(report.diagnostics.is_empty());
    assert!(module.globals().is_empty());
}

#[test]
fn existing_flag_global_name_is_not_reused() {
    let mut module = build_main_with_call();
    module.add_private_string(".str", "hello");

    WrapperPass::default().run_on_module(&mut module);

    let g = module.global_by_name(".str.1").unwrap();
    assert_eq!(g.init, GlobalInit::Str("-cpu".into()));
    assert_eq!(module.global_by_name(".str").unwrap().init, GlobalInit::Str("hello".into()));
}

#[test]
fn custom_entry_name_and_flag() {
    let mut module = IrModule::new("prog");
    let mut b = IrFunctionBuilder::new("start", main_params(), IrType::Void);
    b.create_entry_block();
    b.emit_return(vec![]);
    module.add_function(b.build()).unwrap();

    let config = WrapperConfig {
        entry_function: "start".into(),
        cpu_flag: "--host".into(),
        flag_index: 2,
        ..WrapperConfig::default()
    };
    let report = WrapperPass::new(config).run_on_module(&mut module);
    assert!(report.entry_patched);

    let instrs = &module.function_by_name("start").unwrap().entry_block().unwrap().instrs;
    assert!(matches!(instrs[0], IrInstr::ArgLoad { index: 2, .. }));
    assert_eq!(module.globals()[0].init, GlobalInit::Str("--host".into()));
}

#[test]
fn flag_read_falls_back_to_an_empty_string() {
    let mut module = build_main_with_call();
    WrapperPass::default().run_on_module(&mut module);

    // A program started without arguments compares "" against the flag, so
    // strcmp always sees two valid strings and the result is nonzero.
    assert_eq!(MISSING_ARG, "");
    assert_ne!(MISSING_ARG, WrapperConfig::default().cpu_flag);
    let text = emit_ir_text(&module).unwrap();
    assert!(text.contains("    %3 = argload %1[1] (argc %0) or c\"\"\n"), "{}", text);
    assert!(text.contains("    %5 = call @strcmp(%3, %4)\n"), "{}", text);
}
