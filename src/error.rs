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

use std::fmt;

/// Result type for this crate with specific error enum.
pub type Result<T> = ::std::result::Result<T, Error>;

/// An error as the result of parsing, compiling or running a regex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An error as a result of parsing a regex pattern, with the position where the error occurred
    ParseError(usize, ParseError),
    /// An error as a result of compiling a regex
    CompileError(CompileError),
    /// An error as a result of running a regex
    RuntimeError(RuntimeError),
}

/// An error for the result of parsing a regex pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// Opening parenthesis without closing parenthesis, e.g. `(a|b`
    UnclosedOpenParen,
    /// Closing parenthesis without a group to close, e.g. `a)`
    UnmatchedCloseParen,
    /// Character class without closing bracket, e.g. `[ab`
    UnclosedClass,
    /// Backslash without following character
    TrailingBackslash,
    /// `\x` not followed by two hex digits
    InvalidHex,
    /// Quantifier on an expression that can't be repeated, e.g. `*a`
    TargetNotRepeatable,
    /// Groups are nested too deeply
    RecursionExceeded,
}

/// An error as the result of compiling a regex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileError {
    /// Backreference to a group that does not exist in the pattern (0-based group index)
    InvalidBackref(usize),
    /// The pattern has more capture groups than the configured limit
    CaptureOverflow {
        /// Number of capture groups in the pattern
        groups: usize,
        /// The configured limit
        limit: usize,
    },
    /// The compiled program exceeds the configured size limit
    ProgramTooLarge,
}

/// An error as the result of executing a regex.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuntimeError {
    /// Backreference to a group that has not captured anything yet (0-based group index)
    UnresolvedBackref(usize),
    /// The input text exceeded the backtracking limit, see
    /// [`RegexBuilder::backtrack_limit`](crate::RegexBuilder::backtrack_limit).
    BacktrackLimitExceeded,
    /// The backtracking stack grew beyond
    /// [`RegexBuilder::max_stack`](crate::RegexBuilder::max_stack).
    StackOverflow,
}

impl ::std::error::Error for Error {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnclosedOpenParen => {
                write!(f, "Opening parenthesis without closing parenthesis")
            }
            ParseError::UnmatchedCloseParen => {
                write!(f, "Closing parenthesis without opening parenthesis")
            }
            ParseError::UnclosedClass => write!(f, "Character class without closing bracket"),
            ParseError::TrailingBackslash => write!(f, "Backslash without following character"),
            ParseError::InvalidHex => write!(f, "Invalid hex escape, expected two hex digits"),
            ParseError::TargetNotRepeatable => write!(f, "Target of repeat operator is invalid"),
            ParseError::RecursionExceeded => write!(f, "Pattern too deeply nested"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidBackref(group) => {
                write!(f, "Backreference \\{} to nonexistent group", group + 1)
            }
            CompileError::CaptureOverflow { groups, limit } => write!(
                f,
                "Pattern has {groups} capture groups, more than the limit of {limit}"
            ),
            CompileError::ProgramTooLarge => write!(f, "Compiled program exceeds the size limit"),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnresolvedBackref(group) => write!(
                f,
                "Backreference \\{} to group which has not captured anything",
                group + 1
            ),
            RuntimeError::BacktrackLimitExceeded => {
                write!(f, "Max limit for backtracking count exceeded")
            }
            RuntimeError::StackOverflow => write!(f, "Max stack size exceeded for backtracking"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ParseError(position, parse_error) => {
                write!(f, "Parsing error at position {position}: {parse_error}")
            }
            Error::CompileError(compile_error) => {
                write!(f, "Error compiling regex: {compile_error}")
            }
            Error::RuntimeError(runtime_error) => {
                write!(f, "Error executing regex: {runtime_error}")
            }
        }
    }
}

impl From<CompileError> for Error {
    fn from(error: CompileError) -> Self {
        Error::CompileError(error)
    }
}

impl From<RuntimeError> for Error {
    fn from(error: RuntimeError) -> Self {
        Error::RuntimeError(error)
    }
}
