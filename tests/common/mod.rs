//! Minimal quad-code interpreter used to execute compiler output in tests.

use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
  Int(i64),
  Real(f64),
}

impl Num {
  fn int(self) -> i64 {
    match self {
      Num::Int(v) => v,
      Num::Real(v) => v as i64,
    }
  }

  fn real(self) -> f64 {
    match self {
      Num::Int(v) => v as f64,
      Num::Real(v) => v,
    }
  }
}

const STEP_LIMIT: usize = 100_000;

/// Execute finalized quad code, feeding `inputs` to `IINP`/`RINP` and
/// returning everything printed, one entry per print.
pub fn run(code: &str, inputs: &[&str]) -> Vec<String> {
  let lines: Vec<Vec<&str>> = code
    .lines()
    .take_while(|line| !line.starts_with(';'))
    .map(|line| line.split_whitespace().collect())
    .collect();
  let mut inputs: VecDeque<&str> = inputs.iter().copied().collect();
  let mut vars: HashMap<String, Num> = HashMap::new();
  let mut printed = Vec::new();
  let mut pc = 0usize;

  for _ in 0..STEP_LIMIT {
    let line = &lines[pc];
    let operand = |vars: &HashMap<String, Num>, text: &str| -> Num {
      if text.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        if text.contains('.') {
          Num::Real(text.parse().expect("float literal"))
        } else {
          Num::Int(text.parse().expect("int literal"))
        }
      } else {
        *vars
          .get(text)
          .unwrap_or_else(|| panic!("'{text}' read before it was assigned"))
      }
    };
    pc += 1;

    let op = line[0];
    match op {
      "HALT" => return printed,
      "JUMP" => pc = line[1].parse().expect("jump target"),
      "JMPZ" => {
        if operand(&vars, line[2]).int() == 0 {
          pc = line[1].parse().expect("jump target");
        }
      }
      "IASN" => {
        let v = operand(&vars, line[2]).int();
        vars.insert(line[1].to_string(), Num::Int(v));
      }
      "RASN" | "ITOR" => {
        let v = operand(&vars, line[2]).real();
        vars.insert(line[1].to_string(), Num::Real(v));
      }
      "RTOI" => {
        let v = operand(&vars, line[2]).int();
        vars.insert(line[1].to_string(), Num::Int(v));
      }
      "IINP" | "RINP" => {
        let text = inputs.pop_front().expect("input available");
        let v = if op == "IINP" {
          Num::Int(text.parse().expect("int input"))
        } else {
          Num::Real(text.parse().expect("float input"))
        };
        vars.insert(line[1].to_string(), v);
      }
      "IPRT" => printed.push(operand(&vars, line[1]).int().to_string()),
      "RPRT" => printed.push(operand(&vars, line[1]).real().to_string()),
      _ => {
        let a = operand(&vars, line[2]);
        let b = operand(&vars, line[3]);
        let result = if op.starts_with('I') {
          let (a, b) = (a.int(), b.int());
          match &op[1..] {
            "ADD" => Num::Int(a + b),
            "SUB" => Num::Int(a - b),
            "MLT" => Num::Int(a * b),
            "DIV" => Num::Int(a / b),
            "EQL" => Num::Int((a == b) as i64),
            "NQL" => Num::Int((a != b) as i64),
            "LSS" => Num::Int((a < b) as i64),
            "GRT" => Num::Int((a > b) as i64),
            other => panic!("unknown opcode I{other}"),
          }
        } else {
          let (a, b) = (a.real(), b.real());
          match &op[1..] {
            "ADD" => Num::Real(a + b),
            "SUB" => Num::Real(a - b),
            "MLT" => Num::Real(a * b),
            "DIV" => Num::Real(a / b),
            "EQL" => Num::Int((a == b) as i64),
            "NQL" => Num::Int((a != b) as i64),
            "LSS" => Num::Int((a < b) as i64),
            "GRT" => Num::Int((a > b) as i64),
            other => panic!("unknown opcode R{other}"),
          }
        };
        vars.insert(line[1].to_string(), result);
      }
    }
  }
  panic!("program did not halt within {STEP_LIMIT} steps");
}

/// Executable lines of the output (everything before the trailing comment).
pub fn instructions(code: &str) -> Vec<&str> {
  code
    .lines()
    .take_while(|line| !line.starts_with(';'))
    .collect()
}
