// Copyright 2025 The Anchored Regex Authors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Compilation of regex to VM.

use compact_str::CompactString;

use crate::analyze::Info;
use crate::vm::{Insn, Prog};
use crate::CompileError;
use crate::Error;
use crate::Expr;
use crate::LookAround;
use crate::RegexOptions;
use crate::Result;

pub(crate) const DEFAULT_CAPTURE_LIMIT: usize = 10;
pub(crate) const DEFAULT_SIZE_LIMIT: usize = 1_000_000;

struct VMBuilder {
    prog: Vec<Insn>,
    n_saves: usize,
}

impl VMBuilder {
    fn new() -> VMBuilder {
        VMBuilder {
            prog: Vec::new(),
            n_saves: 0,
        }
    }

    fn build(self, n_groups: usize) -> Prog {
        Prog::new(self.prog, self.n_saves, n_groups)
    }

    fn newsave(&mut self) -> usize {
        let result = self.n_saves;
        self.n_saves += 1;
        result
    }

    fn pc(&self) -> usize {
        self.prog.len()
    }

    fn add(&mut self, insn: Insn) {
        self.prog.push(insn);
    }

    fn set_jmp_target(&mut self, jmp_pc: usize, target: usize) {
        match self.prog[jmp_pc] {
            Insn::Jmp(ref mut next) => *next = target,
            _ => panic!("mutating instruction other than Jmp"),
        }
    }

    fn set_split_target(&mut self, split_pc: usize, target: usize, second: bool) {
        match self.prog[split_pc] {
            Insn::Split(_, ref mut y) if second => *y = target,
            Insn::Split(ref mut x, _) => *x = target,
            _ => panic!("mutating instruction other than Split"),
        }
    }

    fn set_repeat_target(&mut self, repeat_pc: usize, target: usize) {
        match self.prog[repeat_pc] {
            Insn::Repeat { ref mut next, .. } | Insn::RepeatEpsilon { ref mut next, .. } => {
                *next = target;
            }
            _ => panic!("mutating instruction other than Repeat"),
        }
    }
}

struct Compiler {
    b: VMBuilder,
    size_limit: usize,
}

impl Compiler {
    fn new(size_limit: usize) -> Compiler {
        Compiler {
            b: VMBuilder::new(),
            size_limit,
        }
    }

    fn visit(&mut self, info: &Info<'_>) -> Result<()> {
        if self.b.pc() > self.size_limit {
            return Err(Error::CompileError(CompileError::ProgramTooLarge));
        }
        match *info.expr {
            Expr::Empty => (),
            Expr::Any => self.b.add(Insn::Any),
            Expr::Assertion(assertion) => self.b.add(Insn::Assertion(assertion)),
            Expr::Literal { ref val } => self.b.add(Insn::Lit(CompactString::new(val))),
            Expr::Class(ref class) => self.b.add(Insn::Class(class.clone())),
            Expr::Concat(_) => {
                for child in &info.children {
                    self.visit(child)?;
                }
            }
            Expr::Alt(_) => self.compile_alt(info)?,
            Expr::Group(_) => self.compile_group(info)?,
            Expr::Repeat { lo, hi, greedy, .. } => self.compile_repeat(info, lo, hi, greedy)?,
            Expr::LookAround(_, la) => self.compile_lookaround(info, la)?,
            Expr::Backref(group) => self.b.add(Insn::Backref(group)),
            Expr::AtomicGroup(_) => {
                self.b.add(Insn::BeginAtomic);
                self.visit(&info.children[0])?;
                self.b.add(Insn::EndAtomic);
            }
        }
        Ok(())
    }

    fn compile_alt(&mut self, info: &Info<'_>) -> Result<()> {
        let count = info.children.len();
        let mut jmps = Vec::new();
        let mut last_pc = usize::MAX;
        for (i, child) in info.children.iter().enumerate() {
            let has_next = i != count - 1;
            let pc = self.b.pc();
            if has_next {
                self.b.add(Insn::Split(pc + 1, usize::MAX));
            }
            if last_pc != usize::MAX {
                self.b.set_split_target(last_pc, pc, true);
            }
            last_pc = pc;

            self.visit(child)?;

            if has_next {
                // All except the last branch need to jump over instructions of
                // other branches. The last branch can just continue to the next
                // instruction.
                let pc = self.b.pc();
                jmps.push(pc);
                self.b.add(Insn::Jmp(0));
            }
        }
        let next_pc = self.b.pc();
        for jmp_pc in jmps {
            self.b.set_jmp_target(jmp_pc, next_pc);
        }
        Ok(())
    }

    fn compile_group(&mut self, info: &Info<'_>) -> Result<()> {
        let start = self.b.newsave();
        self.b.add(Insn::Save(start));
        self.visit(&info.children[0])?;
        self.b.add(Insn::Capture {
            group: info.start_group,
            start,
        });
        Ok(())
    }

    fn compile_repeat(
        &mut self,
        info: &Info<'_>,
        lo: usize,
        hi: usize,
        greedy: bool,
    ) -> Result<()> {
        let child = &info.children[0];
        if lo == 0 && hi == 1 {
            // e?
            //   Split(L1, L2)
            // L1: <e>
            // L2:
            //
            // lazy swaps the targets so that skipping is tried first
            let pc = self.b.pc();
            self.b.add(Insn::Split(pc + 1, pc + 1));
            self.visit(child)?;
            let next_pc = self.b.pc();
            self.b.set_split_target(pc, next_pc, greedy);
            return Ok(());
        }
        if !greedy && lo > 0 {
            // e+? is e*? followed by one mandatory e, which is only tried once
            // the lazy loop gives up a match
            let hi = if hi == usize::MAX { hi } else { hi - 1 };
            self.compile_loop(child, lo - 1, hi, false)?;
            return self.visit(child);
        }
        self.compile_loop(child, lo, hi, greedy)
    }

    fn compile_loop(
        &mut self,
        child: &Info<'_>,
        lo: usize,
        hi: usize,
        greedy: bool,
    ) -> Result<()> {
        if hi == 0 {
            return Ok(());
        }
        // e{lo,hi}
        //   Save0(repeat)
        // L1: Repeat(lo, hi, L2, repeat)
        //   <e>
        //   Jmp L1
        // L2:
        let repeat = self.b.newsave();
        self.b.add(Insn::Save0(repeat));
        let pc = self.b.pc();
        if child.min_size == 0 && hi == usize::MAX {
            let check = self.b.newsave();
            self.b.add(Insn::RepeatEpsilon {
                lo,
                next: usize::MAX,
                repeat,
                check,
                greedy,
            });
        } else {
            self.b.add(Insn::Repeat {
                lo,
                hi,
                next: usize::MAX,
                repeat,
                greedy,
            });
        }
        self.visit(child)?;
        self.b.add(Insn::Jmp(pc));
        let next_pc = self.b.pc();
        self.b.set_repeat_target(pc, next_pc);
        Ok(())
    }

    fn compile_lookaround(&mut self, info: &Info<'_>, la: LookAround) -> Result<()> {
        let inner = &info.children[0];
        match la {
            LookAround::LookAhead => {
                // only the first match of the body counts, and the position
                // is put back afterwards
                let save = self.b.newsave();
                self.b.add(Insn::Save(save));
                self.b.add(Insn::BeginAtomic);
                self.visit(inner)?;
                self.b.add(Insn::EndAtomic);
                self.b.add(Insn::Restore(save));
            }
            LookAround::LookAheadNeg => {
                let pc = self.b.pc();
                self.b.add(Insn::Split(pc + 1, usize::MAX));
                self.visit(inner)?;
                self.b.add(Insn::FailNegativeLookAround);
                let next_pc = self.b.pc();
                self.b.set_split_target(pc, next_pc, true);
            }
        }
        Ok(())
    }
}

/// Compile the analyzed expressions into a program.
///
/// # Errors
///
/// Returns a [`CompileError`] if the pattern has too many capture groups or the program grows
/// past the size limit.
pub fn compile(info: &Info<'_>) -> Result<Prog> {
    compile_with_options(info, RegexOptions::default())
}

pub(crate) fn compile_with_options(info: &Info<'_>, options: RegexOptions) -> Result<Prog> {
    let n_groups = info.end_group;
    if n_groups > options.capture_limit {
        return Err(Error::CompileError(CompileError::CaptureOverflow {
            groups: n_groups,
            limit: options.capture_limit,
        }));
    }
    let mut c = Compiler::new(options.size_limit);
    c.visit(info)?;
    c.b.add(Insn::End);
    Ok(c.b.build(n_groups))
}
