// Code Generation Context Tests

#[cfg(test)]
mod tests {
    use crate::codegen::RegMachineCodeGen;
    use crate::emit::{JumpOp, Reg};
    use crate::error::CompilerError;
    use crate::symbols::ParamMode;

    #[test]
    fn construction_emits_the_program_wrapper_jump() {
        let mut codegen = RegMachineCodeGen::new();
        assert_eq!(codegen.lines(), ["JUMP"]); // placeholder until main starts

        let main = codegen.pop_label();
        codegen.emit("HALT");
        codegen.define(main).unwrap();
        assert_eq!(codegen.lines()[0], "JUMP 2");

        let lines = codegen.finalize().unwrap();
        assert_eq!(lines, ["JUMP 2", "HALT"]);
    }

    #[test]
    fn finalize_rejects_an_undefined_wrapper_label() {
        let codegen = RegMachineCodeGen::new();
        match codegen.finalize() {
            Err(CompilerError::UnresolvedLabels(pending)) => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].0, 0); // the wrapper jump at position 0
            }
            other => panic!("expected unresolved labels, got {:?}", other),
        }
    }

    #[test]
    fn emission_surface_formats_lines() {
        let mut codegen = RegMachineCodeGen::new();
        codegen.emit("HALT");
        codegen.emit_with_arg("LOAD", 4);
        codegen.emit_with_comment("STORE", 9, "x := y");
        assert_eq!(codegen.lines()[1..], ["HALT", "LOAD 4", "STORE 9 #x := y"]);
        assert_eq!(codegen.position(), 4);
    }

    #[test]
    fn parameters_reach_the_procedure_registry() {
        let mut codegen = RegMachineCodeGen::new();

        let entry = codegen.new_label();
        codegen.declare_procedure("swap", entry).unwrap();
        codegen.enter_scope();
        codegen.declare_parameter("x", ParamMode::Scalar).unwrap();
        codegen.declare_parameter("y", ParamMode::Scalar).unwrap();
        codegen.leave_scope();

        assert_eq!(codegen.current_procedure(), None); // cleared with the scope
        let params = codegen.procedure_parameters("swap").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(codegen.procedure_entry("swap").unwrap(), entry);
    }

    #[test]
    fn marking_a_parameter_updates_the_persistent_map() {
        let mut codegen = RegMachineCodeGen::new();

        let entry = codegen.new_label();
        codegen.declare_procedure("init", entry).unwrap();
        codegen.enter_scope();
        codegen.declare_parameter("x", ParamMode::Output).unwrap();
        codegen.mark_initialized("x").unwrap();
        codegen.leave_scope();

        // Visible to a later caller from the main scope.
        codegen.enter_scope();
        codegen.declare_variable("a").unwrap();
        assert!(codegen.propagate_initialization("init", "x", "a").unwrap());
    }

    #[test]
    fn marking_an_array_is_a_quiet_no_op() {
        let mut codegen = RegMachineCodeGen::new();
        codegen.enter_scope();
        codegen.declare_array("t", 0, 3).unwrap();
        codegen.mark_initialized("t").unwrap();
        assert_eq!(
            codegen.mark_initialized("missing"),
            Err(CompilerError::UndeclaredName("missing".to_string()))
        );
    }

    #[test]
    fn propagation_requires_a_visible_argument() {
        let mut codegen = RegMachineCodeGen::new();
        let entry = codegen.new_label();
        codegen.declare_procedure("init", entry).unwrap();
        codegen.enter_scope();
        assert_eq!(
            codegen.propagate_initialization("init", "x", "gone"),
            Err(CompilerError::UndeclaredName("gone".to_string()))
        );
    }

    #[test]
    fn loop_contexts_round_trip_through_the_context() {
        let mut codegen = RegMachineCodeGen::new();
        codegen.enter_scope();

        let entry = codegen.new_label();
        let exit = codegen.new_label();
        {
            let info = codegen.open_loop("i", false).unwrap();
            info.entry_label = Some(entry);
            info.exit_label = Some(exit);
        }
        assert_eq!(codegen.current_loop().unwrap().exit_label, Some(exit));
        codegen.close_loop();
        assert!(codegen.current_loop().is_none());
        assert!(codegen.symbol("i").is_none());
    }

    #[test]
    fn generated_arithmetic_keeps_labels_resolvable() {
        let mut codegen = RegMachineCodeGen::new();
        let main = codegen.pop_label();
        codegen.define(main).unwrap();

        codegen.load_constant(Reg::B, 14);
        codegen.load_constant(Reg::C, 3);
        codegen.divide(Reg::B, Reg::C);
        codegen.compare_equal(Reg::B, Reg::C);

        assert!(codegen.finalize().is_ok());
    }

    #[test]
    fn frontends_can_mix_labels_and_raw_emission() {
        // The shape of an IF with an ELSE branch, the way a frontend
        // would drive it.
        let mut codegen = RegMachineCodeGen::new();
        let main = codegen.pop_label();
        codegen.define(main).unwrap();

        let else_branch = codegen.new_label();
        let end = codegen.new_label();
        codegen.reference(else_branch, JumpOp::Jzero);
        codegen.emit_with_arg("LOAD", 1);
        codegen.reference(end, JumpOp::Jump);
        codegen.define(else_branch).unwrap();
        codegen.emit_with_arg("LOAD", 2);
        codegen.define(end).unwrap();
        codegen.emit("HALT");

        let lines = codegen.finalize().unwrap();
        assert_eq!(lines[1], "JZERO 4");
        assert_eq!(lines[3], "JUMP 5");
    }
}
