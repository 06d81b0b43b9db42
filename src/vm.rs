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

//! Backtracking VM for running compiled patterns.
//!
//! A program is a flat list of [`Insn`]s. The matcher keeps a program counter and a byte offset
//! into the input, always starting at offset 0, and runs until it reaches `End` (a match ending at
//! the current offset) or runs out of branches to fall back to (no match).
//!
//! `Split(x, y)` continues at `x` and pushes a branch for `y`. When an instruction fails, the most
//! recent branch is popped and execution resumes from its program counter and offset. The program
//! for `ab|ac` is:
//!
//! ```text
//! 0: Split(1, 3)
//! 1: Lit("ab")
//! 2: Jmp(4)
//! 3: Lit("ac")
//! 4: End
//! ```
//!
//! Bookkeeping slots (repeat counters, saved offsets, the start of an open group) are restored
//! when a branch is popped. Every overwritten value goes on a trail, and a branch remembers the
//! length of the trail when it was pushed. Atomic groups record the number of branches when they
//! are entered and drop everything above that when they are left.
//!
//! The capture table is not part of that state. A capture written on a path that later failed
//! stays visible until the group captures again.

use bit_set::BitSet;
use compact_str::CompactString;
use std::fmt;
use std::sync::Arc;

use crate::error::RuntimeError;
use crate::utf8util::next_codepoint_ix;
use crate::Assertion;
use crate::CharClass;
use crate::Error;
use crate::RegexOptions;
use crate::Result;

pub(crate) const DEFAULT_MAX_STACK: usize = 1_000_000;
pub(crate) const DEFAULT_BACKTRACK_LIMIT: usize = 1_000_000;

/// Instruction of the VM.
#[derive(Debug)]
pub enum Insn {
    /// Successful end of program
    End,
    /// Match any character
    Any,
    /// Assertions
    Assertion(Assertion),
    /// Match the literal string at the current index
    Lit(CompactString),
    /// Match one character of a character class
    Class(CharClass),
    /// Continue at the first position, falling back to the second one on failure
    Split(usize, usize),
    /// Jump to instruction at position
    Jmp(usize),
    /// Save the current string index into the specified slot
    Save(usize),
    /// Save `0` into the specified slot
    Save0(usize),
    /// Set the string index to the value that was saved in the specified slot
    Restore(usize),
    /// Record the span from the index saved in `start` to the current index as the capture of
    /// `group`
    Capture {
        /// The capture group (0-based)
        group: usize,
        /// The slot holding the index where the group started
        start: usize,
    },
    /// Bounded or unbounded loop whose body can't match the empty string
    Repeat {
        /// Minimum number of matches
        lo: usize,
        /// Maximum number of matches
        hi: usize,
        /// The instruction after the loop
        next: usize,
        /// The slot counting iterations
        repeat: usize,
        /// Whether another iteration is tried before leaving the loop
        greedy: bool,
    },
    /// Unbounded loop that rejects iterations which match the empty string
    RepeatEpsilon {
        /// Minimum number of matches
        lo: usize,
        /// The instruction after the loop
        next: usize,
        /// The slot counting iterations
        repeat: usize,
        /// The slot holding the index where the current iteration started
        check: usize,
        /// Whether another iteration is tried before leaving the loop
        greedy: bool,
    },
    /// The body of a negative look-ahead matched
    FailNegativeLookAround,
    /// Match the text last captured by the group
    Backref(usize),
    /// Enter an atomic group
    BeginAtomic,
    /// Leave an atomic group, dropping the branches pushed inside it
    EndAtomic,
}

/// Sequence of instructions for the VM to execute.
#[derive(Debug)]
pub struct Prog {
    /// Instructions of the program
    pub body: Vec<Insn>,
    n_saves: usize,
    n_groups: usize,
}

impl Prog {
    pub(crate) fn new(body: Vec<Insn>, n_saves: usize, n_groups: usize) -> Prog {
        Prog {
            body,
            n_saves,
            n_groups,
        }
    }

    /// Number of capture groups, which is the size of the capture table.
    #[must_use]
    pub fn n_groups(&self) -> usize {
        self.n_groups
    }
}

#[derive(Debug, Copy, Clone)]
struct Branch {
    pc: usize,
    ix: usize,
    /// Length of the trail when the branch was pushed
    trail: usize,
    /// Number of open atomic groups when the branch was pushed
    atomic: usize,
}

/// Runs one program. Reused across runs, but only by one thread at a time.
#[derive(Debug)]
pub(crate) struct Matcher {
    prog: Arc<Prog>,
    max_stack: usize,
    backtrack_limit: usize,
    trace: bool,
    slots: Vec<usize>,
    /// Overwritten slot values, newest last
    trail: Vec<(usize, usize)>,
    /// Slots already on the trail since the newest branch was pushed
    trailed: BitSet,
    branches: Vec<Branch>,
    /// Branch counts at the start of each open atomic group
    atomic: Vec<usize>,
    captures: Vec<usize>,
}

impl Matcher {
    pub(crate) fn new(prog: Arc<Prog>, options: RegexOptions) -> Matcher {
        Matcher {
            slots: vec![usize::MAX; prog.n_saves],
            captures: vec![usize::MAX; prog.n_groups * 2],
            prog,
            max_stack: options.max_stack,
            backtrack_limit: options.backtrack_limit,
            trace: false,
            trail: Vec::new(),
            trailed: BitSet::new(),
            branches: Vec::new(),
            atomic: Vec::new(),
        }
    }

    /// The capture table of the last run, two entries per group and `usize::MAX` where a group
    /// never captured.
    pub(crate) fn captures(&self) -> &[usize] {
        &self.captures
    }

    fn reset(&mut self) {
        self.slots.fill(usize::MAX);
        self.captures.fill(usize::MAX);
        self.trail.clear();
        self.trailed.clear();
        self.branches.clear();
        self.atomic.clear();
    }

    fn push(&mut self, pc: usize, ix: usize) -> Result<()> {
        if self.branches.len() >= self.max_stack {
            return Err(Error::RuntimeError(RuntimeError::StackOverflow));
        }
        self.branches.push(Branch {
            pc,
            ix,
            trail: self.trail.len(),
            atomic: self.atomic.len(),
        });
        self.trailed.clear();
        Ok(())
    }

    /// Pop the newest branch and put the slots back the way they were when it was pushed.
    fn backtrack(&mut self) -> Option<(usize, usize)> {
        let branch = self.branches.pop()?;
        for (slot, value) in self.trail.drain(branch.trail..).rev() {
            self.slots[slot] = value;
        }
        self.atomic.truncate(branch.atomic);
        self.trailed.clear();
        Some((branch.pc, branch.ix))
    }

    fn save(&mut self, slot: usize, value: usize) {
        // the oldest value since the newest branch is the one to restore
        if self.trailed.insert(slot) {
            self.trail.push((slot, self.slots[slot]));
        }
        self.slots[slot] = value;
    }

    fn begin_atomic(&mut self) {
        self.atomic.push(self.branches.len());
    }

    fn end_atomic(&mut self) {
        if let Some(count) = self.atomic.pop() {
            // the trail stays, so popping an older branch still undoes what happened in here
            self.branches.truncate(count);
        }
    }

    fn log(&self, args: fmt::Arguments) {
        if cfg!(debug_assertions) && self.trace {
            eprintln!("{args}");
        }
    }

    /// Run the program anchored at the start of `s` and return the end offset of the match.
    ///
    /// The capture table is refilled on every call, see [`Matcher::captures`].
    #[allow(clippy::too_many_lines)]
    pub(crate) fn run(&mut self, s: &str) -> Result<Option<usize>> {
        self.reset();
        let sb = s.as_bytes();
        let mut backtracks = 0;
        let mut pc = 0;
        let mut ix = 0;
        loop {
            'fail: loop {
                self.log(format_args!("{ix}\t{pc} {:?}", self.prog.body[pc]));
                match self.prog.body[pc] {
                    Insn::End => return Ok(Some(ix)),
                    Insn::Any => {
                        if ix == sb.len() {
                            break 'fail;
                        }
                        ix = next_codepoint_ix(sb, ix);
                    }
                    Insn::Assertion(assertion) => {
                        let holds = match assertion {
                            Assertion::StartText => ix == 0,
                            Assertion::EndText => ix == sb.len(),
                        };
                        if !holds {
                            break 'fail;
                        }
                    }
                    Insn::Lit(ref val) => {
                        if !sb[ix..].starts_with(val.as_bytes()) {
                            break 'fail;
                        }
                        ix += val.len();
                    }
                    Insn::Class(ref class) => match s[ix..].chars().next() {
                        Some(c) if class.matches(c) => ix += c.len_utf8(),
                        _ => break 'fail,
                    },
                    Insn::Split(x, y) => {
                        self.push(y, ix)?;
                        pc = x;
                        continue;
                    }
                    Insn::Jmp(target) => {
                        pc = target;
                        continue;
                    }
                    Insn::Save(slot) => self.save(slot, ix),
                    Insn::Save0(slot) => self.save(slot, 0),
                    Insn::Restore(slot) => ix = self.slots[slot],
                    Insn::Capture { group, start } => {
                        self.captures[group * 2] = self.slots[start];
                        self.captures[group * 2 + 1] = ix;
                    }
                    Insn::Repeat {
                        lo,
                        hi,
                        next,
                        repeat,
                        greedy,
                    } => {
                        let count = self.slots[repeat];
                        if count == hi {
                            pc = next;
                            continue;
                        }
                        self.save(repeat, count + 1);
                        if count >= lo {
                            if greedy {
                                self.push(next, ix)?;
                            } else {
                                self.push(pc + 1, ix)?;
                                pc = next;
                                continue;
                            }
                        }
                    }
                    Insn::RepeatEpsilon {
                        lo,
                        next,
                        repeat,
                        check,
                        greedy,
                    } => {
                        let count = self.slots[repeat];
                        if count > lo && self.slots[check] == ix {
                            // an optional iteration that consumed nothing
                            break 'fail;
                        }
                        self.save(repeat, count + 1);
                        if count >= lo {
                            self.save(check, ix);
                            if greedy {
                                self.push(next, ix)?;
                            } else {
                                self.push(pc + 1, ix)?;
                                pc = next;
                                continue;
                            }
                        }
                    }
                    Insn::FailNegativeLookAround => {
                        // Drop what the body pushed, then the branch that skips the look-ahead.
                        // It resumes right after this instruction.
                        while let Some((popped, _)) = self.backtrack() {
                            if popped == pc + 1 {
                                break;
                            }
                        }
                        break 'fail;
                    }
                    Insn::Backref(group) => {
                        let (lo, hi) = (self.captures[group * 2], self.captures[group * 2 + 1]);
                        if lo == usize::MAX {
                            return Err(Error::RuntimeError(RuntimeError::UnresolvedBackref(
                                group,
                            )));
                        }
                        if !sb[ix..].starts_with(&sb[lo..hi]) {
                            break 'fail;
                        }
                        ix += hi - lo;
                    }
                    Insn::BeginAtomic => self.begin_atomic(),
                    Insn::EndAtomic => self.end_atomic(),
                }
                pc += 1;
            }
            self.log(format_args!("fail"));
            if self.branches.is_empty() {
                return Ok(None);
            }
            backtracks += 1;
            if backtracks > self.backtrack_limit {
                return Err(Error::RuntimeError(RuntimeError::BacktrackLimitExceeded));
            }
            if let Some((next_pc, next_ix)) = self.backtrack() {
                pc = next_pc;
                ix = next_ix;
            }
        }
    }
}

/// Run the program with default limits, printing every step to stderr in debug builds.
///
/// # Errors
///
/// Returns an [`Error::RuntimeError`] for any runtime error occurred.
#[doc(hidden)]
pub fn run_trace(prog: Arc<Prog>, s: &str) -> Result<Option<usize>> {
    let mut matcher = Matcher::new(prog, RegexOptions::default());
    matcher.trace = true;
    matcher.run(s)
}

/// Run the program with default limits.
///
/// # Errors
///
/// Returns an [`Error::RuntimeError`] for any runtime error occurred.
#[doc(hidden)]
pub fn run_default(prog: Arc<Prog>, s: &str) -> Result<Option<usize>> {
    Matcher::new(prog, RegexOptions::default()).run(s)
}
