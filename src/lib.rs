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

/*!
A backtracking regex engine with capture groups, backreferences, look-ahead, atomic groups and
greedy, lazy and possessive quantifiers.

Every match is anchored at the start of the input: a regex either matches a prefix of the text or
it doesn't match at all. There is no search for later start positions, and the result of a match is
the byte offset where the matched prefix ends.

Because the engine backtracks, some patterns can take exponential time on some inputs
("catastrophic backtracking"). Execution is bounded by a backtrack limit and a stack limit, which
turn such runs into errors instead of hangs, see [`RegexBuilder`].

# Usage

## Example: Matching a prefix

```rust
use anchored_regex::Regex;

let re = Regex::new(r"(a+)b\1").unwrap();
assert_eq!(re.run("aabaa!").unwrap(), Some(5));
assert_eq!(re.run("xaabaa").unwrap(), None);
```

## Example: Capturing groups

Groups are numbered from 0 in the order of their opening parenthesis. The whole match is available
separately through [`Captures::as_match`].

```rust
use anchored_regex::Regex;

let re = Regex::new(r"([0-9]+)-([a-z]+)").unwrap();
let captures = re.captures("2024-oct!").unwrap().expect("No match found");

assert_eq!(captures.as_match().as_str(), "2024-oct");
assert_eq!(&captures[0], "2024");
assert_eq!(captures.get(1).unwrap().range(), 5..8);
```

# Syntax

Characters:

`.`
: any character \
`[abc]`, `[a-z]`
: one character of the class \
`[^abc]`
: one character that is not in the class \
`^`, `$`
: start and end of the input

Escapes:

`\n`, `\r`, `\t`
: newline, carriage return, tab \
`\xHH`
: the character with the two-digit hex code point `HH` \
`\1` to `\9`
: backreference to group 0 to 8, i.e. the exact text the group captured \
`\c`
: any other escaped character stands for itself, so `\.` is a literal dot and `\d` is a `d`

Groups:

`(exp)`
: capturing group \
`(?:exp)`
: non-capturing group \
`(?=exp)`
: look-ahead, succeeds if *exp* matches at the current position without consuming it \
`(?!exp)`
: negative look-ahead, succeeds if *exp* doesn't match at the current position \
`(?>exp)`
: atomic group, once *exp* has matched it is never backtracked into

Repetitions:

`*`, `+`, `?`
: zero or more, one or more, zero or one (greedy) \
`*?`, `+?`, `??`
: the same, but lazy \
`*+`, `++`, `?+`
: the same, but possessive (an atomic group around the greedy form)

A possessive loop keeps everything it matched, so nothing is left for what follows:

```
# use anchored_regex::Regex;
assert_eq!(Regex::new("a+a").unwrap().run("aaa").unwrap(), Some(3));
assert_eq!(Regex::new("a++a").unwrap().run("aaa").unwrap(), None);
assert_eq!(Regex::new("(?>a+)b").unwrap().run("aab").unwrap(), Some(3));
```
*/

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::if_not_else)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_else)]
#![allow(clippy::similar_names)]
#![allow(clippy::wildcard_imports)]

use regex_automata::util::pool::Pool;
use std::ops::{Index, Range};
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::str::FromStr;
use std::sync::Arc;

mod analyze;
mod compile;
mod error;
mod parse;
mod utf8util;
mod vm;

use crate::analyze::analyze;
use crate::compile::{compile_with_options, DEFAULT_CAPTURE_LIMIT, DEFAULT_SIZE_LIMIT};
use crate::vm::{Matcher, Prog, DEFAULT_BACKTRACK_LIMIT, DEFAULT_MAX_STACK};
pub use crate::parse::{Assertion, CharClass, Expr, ExprTree, LookAround};

pub use crate::error::{CompileError, Error, ParseError, Result, RuntimeError};

const MAX_RECURSION: usize = 64;

type MatcherFn = Box<dyn Fn() -> Matcher + Send + Sync + UnwindSafe + RefUnwindSafe>;

// the public API

/// A compiled regular expression.
#[derive(Debug)]
pub struct Regex {
    pattern: Arc<String>,
    tree: Arc<ExprTree>,
    prog: Arc<Prog>,
    options: RegexOptions,
    matchers: Pool<Matcher, MatcherFn>,
}

impl Regex {
    /// Parse and compile a regex with default options, see [`RegexBuilder`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    #[inline]
    pub fn new(re: impl Into<String>) -> Result<Regex> {
        RegexBuilder::new().build(re)
    }

    fn new_with_options(pattern: String, options: RegexOptions) -> Result<Regex> {
        let tree = Expr::parse_tree(&pattern)?;
        let prog = Arc::new(compile_with_options(&analyze(&tree)?, options)?);
        Ok(Regex {
            pattern: Arc::new(pattern),
            tree: Arc::new(tree),
            matchers: matcher_pool(prog.clone(), options),
            prog,
            options,
        })
    }

    /// Returns the original pattern string used to create this regex.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns the expression tree of this regex.
    #[must_use]
    #[inline]
    pub fn as_expr_tree(&self) -> &ExprTree {
        &self.tree
    }

    /// Match the regex against the start of `text` and return the offset where the match ends,
    /// or `None` if it doesn't match.
    ///
    /// Offsets count bytes of the UTF-8 text, not characters, so `.` on `"é"` ends at 2.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use anchored_regex::Regex;
    /// let re = Regex::new(r"a*?b").unwrap();
    /// assert_eq!(re.run("aaab").unwrap(), Some(4));
    /// assert_eq!(re.run("baaa").unwrap(), Some(1));
    /// assert_eq!(re.run("caab").unwrap(), None);
    ///
    /// assert_eq!(Regex::new(".").unwrap().run("é").unwrap(), Some(2));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn run(&self, text: &str) -> Result<Option<usize>> {
        self.matchers.get().run(text)
    }

    /// Check if the regex matches at the start of the input text.
    ///
    /// # Example
    ///
    /// Test if some text starts with the same word twice:
    ///
    /// ```rust
    /// # use anchored_regex::Regex;
    /// let re = Regex::new(r"([a-z]+) \1").unwrap();
    /// assert!(re.is_match("mirror mirror on the wall").unwrap());
    /// assert!(!re.is_match("on the wall, mirror mirror").unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn is_match(&self, text: &str) -> Result<bool> {
        Ok(self.run(text)?.is_some())
    }

    /// Find the match at the start of the input text.
    ///
    /// If you have capturing groups in your regex that you want to extract, use the
    /// [`Regex::captures()`] method.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use anchored_regex::Regex;
    /// let re = Regex::new(r"[a-z]+(?=!)").unwrap();
    /// let m = re.find("hello! stuff").unwrap().unwrap();
    /// assert_eq!(m.range(), 0..5);
    /// assert_eq!(m.as_str(), "hello");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    #[inline]
    pub fn find<'t>(&self, text: &'t str) -> Result<Option<Match<'t>>> {
        Ok(self.run(text)?.map(|end| Match::new(text, 0, end)))
    }

    /// Returns the capture groups of the match at the start of `text`.
    ///
    /// If you only need the extent of the match, use [`Regex::find()`] or [`Regex::run()`], which
    /// are cheaper.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use anchored_regex::Regex;
    /// let re = Regex::new(r"(?:(a)x|(a)b)").unwrap();
    /// let captures = re.captures("ab").unwrap().unwrap();
    /// assert_eq!(captures.get(1).unwrap().as_str(), "a");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`Error::RuntimeError`] for any runtime error occurred.
    pub fn captures<'t>(&self, text: &'t str) -> Result<Option<Captures<'t>>> {
        let mut matcher = self.matchers.get();
        let end = matcher.run(text)?;
        Ok(end.map(|end| Captures::new(text, matcher.captures(), end)))
    }

    /// Returns the number of capture groups. The whole match is not counted.
    #[must_use]
    #[inline]
    pub fn captures_len(&self) -> usize {
        self.prog.n_groups()
    }
}

fn matcher_pool(prog: Arc<Prog>, options: RegexOptions) -> Pool<Matcher, MatcherFn> {
    Pool::new(Box::new(move || Matcher::new(prog.clone(), options)))
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        Regex {
            pattern: self.pattern.clone(),
            tree: self.tree.clone(),
            prog: self.prog.clone(),
            options: self.options,
            matchers: matcher_pool(self.prog.clone(), self.options),
        }
    }
}

impl FromStr for Regex {
    type Err = Error;

    /// Attempts to parse a string into a regular expression
    fn from_str(s: &str) -> Result<Regex> {
        Regex::new(s)
    }
}

#[derive(Copy, Clone, Debug)]
struct RegexOptions {
    max_stack: usize,
    backtrack_limit: usize,
    capture_limit: usize,
    size_limit: usize,
}

impl Default for RegexOptions {
    fn default() -> Self {
        RegexOptions {
            max_stack: DEFAULT_MAX_STACK,
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            capture_limit: DEFAULT_CAPTURE_LIMIT,
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

/// A builder for a `Regex` to allow configuring options.
#[derive(Debug, Copy, Clone, Default)]
pub struct RegexBuilder(RegexOptions);

impl RegexBuilder {
    /// Create a new regex builder with default options.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the [`Regex`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the pattern could not be parsed or compiled.
    #[inline]
    pub fn build(&self, pattern: impl Into<String>) -> Result<Regex> {
        Regex::new_with_options(pattern.into(), self.0)
    }

    /// Limit for how many times backtracking should be attempted. If this limit is exceeded,
    /// execution returns an [`Error::RuntimeError`] with
    /// [`RuntimeError::BacktrackLimitExceeded`]. This is for preventing a regex with catastrophic
    /// backtracking to run for too long.
    ///
    /// Default is `1_000_000` (1 million).
    #[inline]
    pub fn backtrack_limit(&mut self, limit: usize) -> &mut Self {
        self.0.backtrack_limit = limit;
        self
    }

    /// Limit the stack height of the virtual machine. If this limit is exceeded, execution
    /// returns an [`Error::RuntimeError`] with [`RuntimeError::StackOverflow`].
    /// This is for preventing a regex with catastrophic backtracking to consume too much memory.
    ///
    /// Default is `1_000_000` (1 million).
    #[inline]
    pub fn max_stack(&mut self, limit: usize) -> &mut Self {
        self.0.max_stack = limit;
        self
    }

    /// Limit the number of capture groups a pattern may have. Building a regex with more groups
    /// returns an [`Error::CompileError`] with [`CompileError::CaptureOverflow`]. Use
    /// `usize::MAX` for no limit.
    ///
    /// Default is `10`.
    #[inline]
    pub fn capture_limit(&mut self, limit: usize) -> &mut Self {
        self.0.capture_limit = limit;
        self
    }

    /// Limit the number of instructions in the compiled program. Lazy repetitions copy their
    /// operand, so nesting them can grow the program quickly. Building a regex past the limit
    /// returns an [`Error::CompileError`] with [`CompileError::ProgramTooLarge`].
    ///
    /// Default is `1_000_000` (1 million).
    #[inline]
    pub fn size_limit(&mut self, limit: usize) -> &mut Self {
        self.0.size_limit = limit;
        self
    }
}

/// The span of the whole match or of one capture group.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    fn new(text: &'t str, start: usize, end: usize) -> Match<'t> {
        Match { text, start, end }
    }

    /// Byte offset where the span starts.
    #[must_use]
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset where the span ends.
    #[must_use]
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The span as a byte range.
    #[must_use]
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The text of the span.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }
}

/// The capture groups of a match.
///
/// A group holds the span it was last assigned during the match, even if that assignment happened
/// on a path that was later abandoned by backtracking:
///
/// ```rust
/// # use anchored_regex::Regex;
/// let re = Regex::new(r"(?:(a)x|ab)").unwrap();
/// let captures = re.captures("ab").unwrap().unwrap();
/// assert_eq!(captures.as_match().as_str(), "ab");
/// assert_eq!(captures.get(0).unwrap().as_str(), "a");
/// ```
#[derive(Debug, Clone)]
pub struct Captures<'t> {
    text: &'t str,
    spans: Vec<Option<(usize, usize)>>,
    end: usize,
}

#[allow(clippy::len_without_is_empty)]
impl<'t> Captures<'t> {
    fn new(text: &'t str, table: &[usize], end: usize) -> Captures<'t> {
        let spans = table
            .chunks_exact(2)
            .map(|span| (span[0] != usize::MAX).then_some((span[0], span[1])))
            .collect();
        Captures { text, spans, end }
    }

    /// The span of group `i` (0-based), or `None` if there is no such group or it never captured.
    #[must_use]
    #[inline]
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let (start, end) = self.spans.get(i).copied().flatten()?;
        Some(Match::new(self.text, start, end))
    }

    /// The whole match, which always starts at 0.
    #[must_use]
    #[inline]
    pub fn as_match(&self) -> Match<'t> {
        Match::new(self.text, 0, self.end)
    }

    /// The groups in pattern order, `None` for groups that never captured.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = Option<Match<'t>>> + '_ {
        (0..self.spans.len()).map(|i| self.get(i))
    }

    /// The number of capture groups in the regex.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }
}

/// The text captured by group `i`.
///
/// # Panics
///
/// If there is no group at the given index, or the group didn't capture anything.
impl<'t> Index<usize> for Captures<'t> {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        self.get(i)
            .map_or_else(|| panic!("no group at index '{i}'"), |m| m.as_str())
    }
}

/// The internal module only exists so that the toy example can access internals for debugging and
/// experimenting.
#[doc(hidden)]
pub mod internal {
    pub use crate::analyze::analyze;
    pub use crate::compile::compile;
    pub use crate::vm::{run_default, run_trace, Insn, Prog};
}
