// Test utilities: a reference interpreter for the emitted RM-8 stream.
//
// Executes the ten opcodes the generator produces so tests can assert on
// final register contents instead of on instruction text. Comments after
// `#` are ignored, matching the real machine.

/// Minimal RM-8 machine: eight registers, no memory.
pub struct TestVm {
    pub regs: [u64; 8],
    /// Step budget; exceeding it means the generated code does not
    /// terminate.
    pub fuel: u64,
}

impl Default for TestVm {
    fn default() -> Self {
        Self::new()
    }
}

impl TestVm {
    pub fn new() -> Self {
        TestVm {
            regs: [0; 8],
            fuel: 1_000_000,
        }
    }

    fn reg_index(name: &str) -> Result<usize, String> {
        match name {
            "a" => Ok(0),
            "b" => Ok(1),
            "c" => Ok(2),
            "d" => Ok(3),
            "e" => Ok(4),
            "f" => Ok(5),
            "g" => Ok(6),
            "h" => Ok(7),
            other => Err(format!("unknown register '{}'", other)),
        }
    }

    /// Run `lines` from instruction 0 until the program counter runs past
    /// the end of the stream.
    pub fn run(&mut self, lines: &[String]) -> Result<(), String> {
        let mut pc = 0usize;
        while pc < lines.len() {
            if self.fuel == 0 {
                return Err(format!("out of fuel at instruction {}", pc));
            }
            self.fuel -= 1;

            let line = lines[pc].split('#').next().unwrap_or("").trim();
            let mut parts = line.split_whitespace();
            let opcode = parts
                .next()
                .ok_or_else(|| format!("empty instruction at {}", pc))?;
            let operand = parts.next();

            let reg = |op: Option<&str>| -> Result<usize, String> {
                Self::reg_index(op.ok_or_else(|| format!("missing register at {}", pc))?)
            };
            let target = |op: Option<&str>| -> Result<usize, String> {
                op.ok_or_else(|| format!("unresolved jump at {}", pc))?
                    .parse::<usize>()
                    .map_err(|_| format!("bad jump target at {}", pc))
            };

            match opcode {
                "RST" => {
                    self.regs[reg(operand)?] = 0;
                    pc += 1;
                }
                "INC" => {
                    let r = reg(operand)?;
                    self.regs[r] += 1;
                    pc += 1;
                }
                "SHL" => {
                    let r = reg(operand)?;
                    self.regs[r] *= 2;
                    pc += 1;
                }
                "SHR" => {
                    let r = reg(operand)?;
                    self.regs[r] /= 2;
                    pc += 1;
                }
                "SWP" => {
                    let r = reg(operand)?;
                    self.regs.swap(0, r);
                    pc += 1;
                }
                "ADD" => {
                    let r = reg(operand)?;
                    self.regs[0] += self.regs[r];
                    pc += 1;
                }
                "SUB" => {
                    let r = reg(operand)?;
                    self.regs[0] = self.regs[0].saturating_sub(self.regs[r]);
                    pc += 1;
                }
                "JUMP" => pc = target(operand)?,
                "JZERO" => {
                    if self.regs[0] == 0 {
                        pc = target(operand)?;
                    } else {
                        pc += 1;
                    }
                }
                "JPOS" => {
                    if self.regs[0] > 0 {
                        pc = target(operand)?;
                    } else {
                        pc += 1;
                    }
                }
                other => return Err(format!("unknown opcode '{}' at {}", other, pc)),
            }
        }
        Ok(())
    }
}
