// End-to-end backend tests: drive the compilation context the way a
// frontend's semantic actions would, finalize, and execute the emitted
// stream on the reference interpreter.

use std::fs;

use rm8_codegen::emit::JumpOp;
use rm8_codegen::symbols::ParamMode;
use rm8_codegen::test_utils::TestVm;
use rm8_codegen::{driver, CompilerError, Frontend, Reg, RegMachineCodeGen};

use test_log::test;

/// Emits a program shaped like `PROCEDURE p(x); BEGIN ... END` followed
/// by a main block that computes (21 * 2) div 4 in registers.
struct ArithmeticProgram;

impl Frontend for ArithmeticProgram {
    fn compile(
        &mut self,
        _source: &str,
        codegen: &mut RegMachineCodeGen,
    ) -> Result<(), CompilerError> {
        // Procedure part: declarations only, body left to the register
        // algorithms in the main block for the sake of the interpreter.
        let entry = codegen.new_label();
        codegen.declare_procedure("scale", entry)?;
        codegen.enter_scope();
        codegen.declare_parameter("x", ParamMode::Scalar)?;
        codegen.declare_parameter("factor", ParamMode::Constant)?;
        codegen.mark_initialized("x")?;
        codegen.leave_scope();

        // Main block starts here; the wrapper jump from construction
        // lands on it.
        let main = codegen.pop_label();
        codegen.define(main)?;
        codegen.enter_scope();
        codegen.declare_variable("result")?;
        codegen.validate_call("scale", &["result", "result"])?;

        codegen.load_constant(Reg::B, 21);
        codegen.load_constant(Reg::C, 2);
        codegen.multiply(Reg::B, Reg::B, Reg::C); // b = 42
        codegen.load_constant(Reg::C, 4);
        codegen.divide(Reg::B, Reg::C); // h = 10, b = 2
        codegen.mark_initialized("result")?;
        codegen.leave_scope();
        Ok(())
    }
}

#[test]
fn wrapper_jump_skips_the_procedure_part() {
    let mut codegen = RegMachineCodeGen::new();

    // A procedure body between construction and the main definition.
    let entry = codegen.new_label();
    codegen.define(entry).unwrap();
    codegen.load_constant(Reg::E, 99); // must be skipped at runtime

    let main = codegen.pop_label();
    codegen.define(main).unwrap();
    codegen.load_constant(Reg::F, 1);

    let lines = codegen.finalize().unwrap();
    let mut vm = TestVm::new();
    vm.run(&lines).unwrap();
    assert_eq!(vm.regs[4], 0, "procedure part must not run");
    assert_eq!(vm.regs[5], 1);
}

#[test]
fn emitted_program_computes_through_the_interpreter() {
    let mut frontend = ArithmeticProgram;
    let mut codegen = RegMachineCodeGen::new();
    frontend.compile("PROGRAM IS BEGIN END", &mut codegen).unwrap();
    let lines = codegen.finalize().unwrap();

    let mut vm = TestVm::new();
    vm.run(&lines).unwrap();
    assert_eq!(vm.regs[7], 10); // quotient
    assert_eq!(vm.regs[1], 2); // remainder
}

#[test]
fn nested_loop_codegen_resolves_every_label() {
    let mut codegen = RegMachineCodeGen::new();
    let main = codegen.pop_label();
    codegen.define(main).unwrap();
    codegen.enter_scope();

    // Two nested FOR loops, built the way loop semantic actions do it:
    // open, label the entry, emit the body, jump back, label the exit.
    for (name, descending) in [("i", false), ("j", true)] {
        let entry = codegen.new_label();
        let exit = codegen.new_label();
        let info = codegen.open_loop(name, descending).unwrap();
        info.entry_label = Some(entry);
        info.exit_label = Some(exit);
        codegen.define(entry).unwrap();
    }

    codegen.load_constant(Reg::B, 3);

    for _ in 0..2 {
        let info = codegen.current_loop().unwrap();
        let (entry, exit) = (info.entry_label.unwrap(), info.exit_label.unwrap());
        codegen.reference(entry, JumpOp::Jzero);
        codegen.define(exit).unwrap();
        codegen.close_loop();
    }

    codegen.leave_scope();
    assert!(codegen.finalize().is_ok());
}

#[test]
fn driver_round_trips_through_the_filesystem() {
    let input = std::env::temp_dir().join(format!("rm8-int-{}.imp", std::process::id()));
    let output = std::env::temp_dir().join(format!("rm8-int-{}.mr", std::process::id()));
    fs::write(&input, "PROGRAM IS BEGIN END").unwrap();

    let mut frontend = ArithmeticProgram;
    let code = driver::run(
        &mut frontend,
        &[
            "rm8c".to_string(),
            input.display().to_string(),
            output.display().to_string(),
        ],
    );
    assert_eq!(code, 0);

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<String> = written.lines().map(str::to_string).collect();
    let mut vm = TestVm::new();
    vm.run(&lines).unwrap();
    assert_eq!(vm.regs[7], 10);

    fs::remove_file(&input).ok();
    fs::remove_file(&output).ok();
}
