//! Property-based tests for the preparation pipeline
//!
//! These tests use proptest to generate random well-formed modules and verify that:
//! 1. Running the pipeline is deterministic
//! 2. Callees resolve through any chain of pointer casts
//! 3. Allow-listed calls survive any number of runs
//! 4. Removed call results are replaced by zeros of the same type
//! 5. Erasing calls keeps every block and the order of what survives in it
//! 6. Every mutable global ends up initialized and the entry table is well shaped

use proptest::prelude::*;
use symprep::ir::{
    BasicBlock, CallInst, Constant, Function, GlobalVariable, Instruction, IrType, Linkage, Reg,
    Value,
};
use symprep::passes::resolve_callee;
use symprep::{DiagnosticKind, Module, PrepareConfig, Preparer, Stage};

const ALLOWED: &[&str] = &["__VERIFIER_nondet_int", "klee_int", "malloc"];
const USE_OPCODE: &str = "use";
const BRANCH_OPCODE: &str = "br";

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Types a call may return
fn return_type() -> impl Strategy<Value = IrType> {
    prop_oneof![
        Just(IrType::Void),
        Just(IrType::bool()),
        Just(IrType::i32()),
        Just(IrType::i64()),
        Just(IrType::Double),
        Just(IrType::generic_ptr()),
        Just(IrType::i64().ptr_to()),
        Just(IrType::Struct(vec![IrType::i32(), IrType::generic_ptr()])),
    ]
}

/// Pointer types used as cast targets
fn cast_type() -> impl Strategy<Value = IrType> {
    prop_oneof![
        Just(IrType::generic_ptr()),
        Just(IrType::i64().ptr_to()),
        Just(
            IrType::Function {
                ret: Box::new(IrType::i32()),
                params: vec![IrType::generic_ptr()],
                variadic: true,
            }
            .ptr_to()
        ),
    ]
}

/// Types of globals that need zero-initialization
fn global_type() -> impl Strategy<Value = IrType> {
    prop_oneof![
        Just(IrType::i8()),
        Just(IrType::i32()),
        Just(IrType::i64()),
        Just(IrType::Float),
        Just(IrType::generic_ptr()),
        Just(IrType::i32().array_of(4)),
        Just(IrType::Struct(vec![IrType::i64(), IrType::Double])),
    ]
}

#[derive(Debug, Clone)]
enum GlobalShape {
    Uninitialized(IrType),
    Initialized(i32),
    Constant(i32),
    ExternalConstant(IrType),
}

fn global_shape() -> impl Strategy<Value = GlobalShape> {
    prop_oneof![
        global_type().prop_map(GlobalShape::Uninitialized),
        any::<i32>().prop_map(GlobalShape::Initialized),
        any::<i32>().prop_map(GlobalShape::Constant),
        global_type().prop_map(GlobalShape::ExternalConstant),
    ]
}

/// One call site in `main`
#[derive(Debug, Clone)]
struct CallShape {
    pick: usize,
    casts: Vec<IrType>,
    /// Non-void result left unbound
    discard: bool,
    /// Close the current block after this call
    split: bool,
}

fn call_shape() -> impl Strategy<Value = CallShape> {
    (
        any::<usize>(),
        prop::collection::vec(cast_type(), 0..4),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.3),
    )
        .prop_map(|(pick, casts, discard, split)| CallShape {
            pick,
            casts,
            discard,
            split,
        })
}

#[derive(Debug, Clone)]
struct ProgramShape {
    externals: Vec<IrType>,
    calls: Vec<CallShape>,
    globals: Vec<GlobalShape>,
}

fn program_shape() -> impl Strategy<Value = ProgramShape> {
    (
        prop::collection::vec(return_type(), 1..6),
        prop::collection::vec(call_shape(), 0..24),
        prop::collection::vec(global_shape(), 0..8),
    )
        .prop_map(|(externals, calls, globals)| ProgramShape {
            externals,
            calls,
            globals,
        })
}

// =============================================================================
// MODULE BUILDER
// =============================================================================

/// Every callee in the generated module with its return type
fn callees(shape: &ProgramShape) -> Vec<(String, IrType)> {
    let mut all: Vec<(String, IrType)> = shape
        .externals
        .iter()
        .enumerate()
        .map(|(i, ty)| (format!("ext{}", i), ty.clone()))
        .collect();
    all.push((ALLOWED[0].to_string(), IrType::i32()));
    all.push((ALLOWED[1].to_string(), IrType::i32()));
    all.push((ALLOWED[2].to_string(), IrType::generic_ptr()));
    all.push(("helper".to_string(), IrType::i64()));
    all
}

/// Builds a verifiable module: each bound call result feeds one `use` op, and
/// `main` is cut into several blocks ending in `br`
fn build(shape: &ProgramShape) -> Module {
    let targets = callees(shape);
    let mut module = Module::new("generated");

    for (name, ret_ty) in &targets {
        let function = if name == "helper" {
            Function::define(
                name,
                ret_ty.clone(),
                vec![],
                vec![BasicBlock::new("entry").with(Instruction::Ret(Some(Value::Const(
                    Constant::int(64, 1),
                ))))],
            )
        } else {
            Function::declare(name, ret_ty.clone(), vec![])
        };
        module.add_function(function).unwrap();
    }

    let mut blocks = Vec::new();
    let mut current = BasicBlock::new("entry");
    let mut next = 0u32;
    for site in &shape.calls {
        let (name, ret_ty) = &targets[site.pick % targets.len()];
        let callee = site
            .casts
            .iter()
            .fold(Value::function(name.as_str()), |v, ty| v.cast_to(ty.clone()));
        let result = (!ret_ty.is_void() && !site.discard).then(|| {
            next += 1;
            Reg(next - 1)
        });
        current.instructions.push(Instruction::Call(CallInst {
            result,
            ret_ty: ret_ty.clone(),
            callee,
            args: vec![],
        }));
        if let Some(reg) = result {
            current.instructions.push(Instruction::Op {
                result: Some(Reg(next)),
                ty: ret_ty.clone(),
                opcode: USE_OPCODE.to_string(),
                operands: vec![Value::Reg(reg)],
            });
            next += 1;
        }
        if site.split {
            current.instructions.push(Instruction::Op {
                result: None,
                ty: IrType::Void,
                opcode: BRANCH_OPCODE.to_string(),
                operands: vec![],
            });
            let label = format!("bb{}", blocks.len() + 1);
            blocks.push(std::mem::replace(&mut current, BasicBlock::new(&label)));
        }
    }
    current
        .instructions
        .push(Instruction::Ret(Some(Value::Const(Constant::int(32, 0)))));
    blocks.push(current);
    module
        .add_function(Function::define("main", IrType::i32(), vec![], blocks))
        .unwrap();

    for (i, global) in shape.globals.iter().enumerate() {
        let name = format!("g{}", i);
        let global = match global {
            GlobalShape::Uninitialized(ty) => GlobalVariable::external(&name, ty.clone()),
            GlobalShape::Initialized(v) => {
                GlobalVariable::with_initializer(&name, IrType::i32(), Constant::int(32, *v as i64))
            }
            GlobalShape::Constant(v) => {
                GlobalVariable::with_initializer(&name, IrType::i32(), Constant::int(32, *v as i64))
                    .constant()
            }
            GlobalShape::ExternalConstant(ty) => {
                GlobalVariable::external(&name, ty.clone()).constant()
            }
        };
        module.add_global(global).unwrap();
    }

    module
}

fn calls_to(module: &Module, callee: &str) -> usize {
    module
        .get_function("main")
        .map(|main| {
            main.instructions()
                .filter_map(Instruction::as_call)
                .filter(|call| resolve_callee(&call.callee) == Some(callee))
                .count()
        })
        .unwrap_or(0)
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Two runs on the same input produce identical modules and diagnostics
    #[test]
    fn pipeline_is_deterministic(shape in program_shape()) {
        let mut first = build(&shape);
        let mut second = first.clone();

        let a = Preparer::default().run(&mut first).unwrap();
        let b = Preparer::default().run(&mut second).unwrap();

        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        let lines = |r: &symprep::PrepareReport| {
            r.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>()
        };
        prop_assert_eq!(lines(&a), lines(&b));
    }

    /// Any finite cast chain over a function reference resolves to it
    #[test]
    fn casts_resolve_to_function(
        name in "[a-z_][a-z0-9_]{0,12}",
        casts in prop::collection::vec(cast_type(), 0..8),
    ) {
        let callee = casts
            .iter()
            .fold(Value::function(name.as_str()), |v, ty| v.cast_to(ty.clone()));
        prop_assert_eq!(resolve_callee(&callee), Some(name.as_str()));
    }

    /// Non-function values stay unresolved however they are cast
    #[test]
    fn non_functions_stay_unresolved(
        reg in 0u32..64,
        casts in prop::collection::vec(cast_type(), 0..8),
    ) {
        for base in [
            Value::Reg(Reg(reg)),
            Value::Global("table".into()),
            Value::Const(Constant::Null(IrType::generic_ptr())),
        ] {
            let callee = casts.iter().fold(base, |v, ty| v.cast_to(ty.clone()));
            prop_assert_eq!(resolve_callee(&callee), None);
        }
    }

    /// Allow-listed callees keep every call site across repeated runs
    #[test]
    fn allow_listed_calls_survive(shape in program_shape(), runs in 1usize..4) {
        let mut module = build(&shape);
        let before: Vec<usize> = ALLOWED.iter().map(|name| calls_to(&module, name)).collect();
        let helper = calls_to(&module, "helper");
        let config = PrepareConfig {
            stages: vec![Stage::CheckUnsupported, Stage::DeleteUndefined],
            ..PrepareConfig::default()
        };

        for _ in 0..runs {
            Preparer::new(config.clone()).run(&mut module).unwrap();
        }

        let after: Vec<usize> = ALLOWED.iter().map(|name| calls_to(&module, name)).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(calls_to(&module, "helper"), helper);
    }

    /// Uses of removed results see a zero of exactly the call's type
    #[test]
    fn removed_results_become_typed_zeros(shape in program_shape()) {
        let mut module = build(&shape);
        let report = Preparer::default().run(&mut module).unwrap();

        prop_assert!(module.verify().is_ok());
        for (i, _) in shape.externals.iter().enumerate() {
            prop_assert_eq!(calls_to(&module, &format!("ext{}", i)), 0);
        }

        let main = module.get_function("main").unwrap();
        for inst in main.instructions() {
            let Instruction::Op { ty, opcode, operands, .. } = inst else {
                continue;
            };
            if opcode != USE_OPCODE {
                continue;
            }
            match &operands[0] {
                Value::Reg(_) => {}
                Value::Const(zero) => {
                    prop_assert!(zero.is_null_value());
                    prop_assert_eq!(zero.ty(), Some(ty.clone()));
                }
                other => prop_assert!(false, "unexpected operand {}", other),
            }
        }

        let removed = report.of_kind(DiagnosticKind::RemovedCall).count();
        let external_calls = shape
            .calls
            .iter()
            .filter(|site| site.pick % callees(&shape).len() < shape.externals.len())
            .count();
        prop_assert_eq!(removed, external_calls);
    }

    /// Mutable globals end up initialized; the rest are untouched
    #[test]
    fn globals_are_zero_initialized(shape in program_shape()) {
        let original = build(&shape);
        let mut module = original.clone();
        Preparer::default().run(&mut module).unwrap();

        for (name, before) in &original.globals {
            let after = module.get_global(name).unwrap();
            match &before.initializer {
                _ if before.is_constant => prop_assert_eq!(after, before),
                Some(_) => prop_assert_eq!(after, before),
                None => {
                    let init = after.initializer.as_ref().unwrap();
                    prop_assert!(init.is_null_value());
                    prop_assert_eq!(Some(init.clone()), Constant::null_value(&before.ty));
                }
            }
        }
        prop_assert!(module
            .globals
            .values()
            .filter(|g| !g.is_constant)
            .all(|g| g.initializer.is_some()));
    }

    /// Erasure keeps every block, and within each block the surviving
    /// instructions in their original order
    #[test]
    fn erasure_keeps_block_layout(shape in program_shape()) {
        let original = build(&shape);
        let mut module = original.clone();
        let config = PrepareConfig {
            stages: vec![Stage::DeleteUndefined],
            ..PrepareConfig::default()
        };
        Preparer::new(config).run(&mut module).unwrap();

        let is_external = |inst: &Instruction| {
            inst.as_call()
                .and_then(|call| resolve_callee(&call.callee))
                .map_or(false, |name| name.starts_with("ext"))
        };
        let before = original.get_function("main").unwrap().blocks();
        let after = module.get_function("main").unwrap().blocks();
        prop_assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(after) {
            prop_assert_eq!(&old.label, &new.label);
            let kept: Vec<_> = old
                .instructions
                .iter()
                .filter(|inst| !is_external(inst))
                .map(|inst| (inst.result(), inst.as_call().map(|c| c.callee.clone())))
                .collect();
            let survived: Vec<_> = new
                .instructions
                .iter()
                .map(|inst| (inst.result(), inst.as_call().map(|c| c.callee.clone())))
                .collect();
            prop_assert_eq!(kept, survived);
        }
    }

    /// The entry table is a one-element internal constant array holding `main`
    #[test]
    fn entry_table_has_fixed_shape(shape in program_shape()) {
        let mut module = build(&shape);
        Preparer::default().run(&mut module).unwrap();

        let table = module.get_global("__ai_init_functions").unwrap();
        prop_assert!(table.is_constant);
        prop_assert_eq!(table.linkage, Linkage::Internal);
        prop_assert_eq!(&table.ty, &IrType::generic_ptr().array_of(1));
        let expected = Constant::Array {
            elem: IrType::generic_ptr(),
            elems: vec![Constant::Bitcast {
                value: Box::new(Constant::FunctionAddr("main".into())),
                to: IrType::generic_ptr(),
            }],
        };
        prop_assert_eq!(table.initializer.clone(), Some(expected));
    }
}
