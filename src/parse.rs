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

//! A regex parser yielding an AST.

use bit_set::BitSet;

use crate::utf8util::codepoint_len;
use crate::Error;
use crate::ParseError;
use crate::Result;
use crate::MAX_RECURSION;

/// Regular expression AST. This is public for now but may change.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expr {
    /// An empty expression, e.g. the last branch in `(a|)`
    Empty,
    /// Any character, `.`
    Any,
    /// An assertion
    Assertion(Assertion),
    /// The string as a literal, e.g. `a`
    Literal {
        /// The string to match
        val: String,
    },
    /// A character class, e.g. `[a-z]` or `[^0-9]`
    Class(CharClass),
    /// Concatenation of multiple expressions, must match in order, e.g. `a.` is a concatenation of
    /// the literal `a` and `.` for any character
    Concat(Vec<Expr>),
    /// Alternative of multiple expressions, one of them must match, e.g. `a|b` is an alternative
    /// where either the literal `a` or `b` must match
    Alt(Vec<Expr>),
    /// Capturing group of expression, e.g. `(a.)` matches `a` and any character and "captures"
    /// (remembers) the match
    Group(Box<Expr>),
    /// Look-around (e.g. positive/negative look-ahead) with the specified kind
    LookAround(Box<Expr>, LookAround),
    /// Repeat of an expression, e.g. `a*` or `a+?`
    ///
    /// The parser only produces `lo` of 0 or 1 and `hi` of 1 or `usize::MAX`.
    Repeat {
        /// The expression that is being repeated
        child: Box<Expr>,
        /// The minimum number of repetitions
        lo: usize,
        /// The maximum number of repetitions (or `usize::MAX` for unbounded)
        hi: usize,
        /// Greedy means as much as possible is matched, e.g. `.*b` would match all of `abab`.
        /// Non-greedy means as little as possible, e.g. `.*?b` would match only `ab` in `abab`.
        greedy: bool,
    },
    /// Back reference to a capture group, e.g. `\1` in `(abc|def)\1` references the captured
    /// group. The index is 0-based, so `\1` is `Backref(0)`.
    Backref(usize),
    /// Atomic non-capturing group, e.g. `(?>ab|a)` in text that contains `ab` will match `ab` and
    /// never backtrack and try `a`, even if matching fails after the atomic group. Possessive
    /// quantifiers such as `a++` are parsed into an atomic group around a greedy repeat.
    AtomicGroup(Box<Expr>),
}

/// Type of look-around assertion as used for a look-around expression.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LookAround {
    /// Look-ahead, e.g. `(?=a)`
    LookAhead,
    /// Negative look-ahead, e.g. `(?!a)`
    LookAheadNeg,
}

/// Type of assertions
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Assertion {
    /// Start of input text, `^`
    StartText,
    /// End of input text, `$`
    EndText,
}

/// A set of characters, written `[...]` in a pattern.
///
/// Members are single characters or inclusive ranges. A negated class matches exactly one
/// character that is not a member.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct CharClass {
    /// Inclusive ranges, a single character `c` is stored as `(c, c)`
    pub ranges: Vec<(char, char)>,
    /// Whether the class was written as `[^...]`
    pub negated: bool,
}

impl CharClass {
    /// Whether `c` is a member of the class, ignoring negation.
    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
    }

    /// Whether the class matches the character `c`.
    #[must_use]
    pub fn matches(&self, c: char) -> bool {
        self.contains(c) != self.negated
    }
}

/// The parsed pattern together with the groups its backreferences point to.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExprTree {
    /// The root expression
    pub expr: Expr,
    /// Indices (0-based) of groups that are referenced by backrefs
    pub backrefs: BitSet,
}

impl Expr {
    /// Parse the regex and return an expression (AST) and a bit set with the indexes of groups
    /// that are referenced by backrefs.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::ParseError`] with the byte position where the pattern is malformed.
    pub fn parse_tree(re: &str) -> Result<ExprTree> {
        Parser::parse(re)
    }
}

struct Parser<'a> {
    re: &'a str,
    backrefs: BitSet,
}

impl<'a> Parser<'a> {
    fn parse(re: &str) -> Result<ExprTree> {
        let mut p = Parser {
            re,
            backrefs: BitSet::new(),
        };
        let (ix, expr) = p.parse_re(0, 0)?;
        if ix < re.len() {
            // the only thing that stops a top level alternation early is a `)`
            return Err(Error::ParseError(ix, ParseError::UnmatchedCloseParen));
        }
        Ok(ExprTree {
            expr,
            backrefs: p.backrefs,
        })
    }

    fn parse_re(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let (ix, child) = self.parse_branch(ix, depth)?;
        let mut ix = ix;
        if self.re[ix..].starts_with('|') {
            let mut children = vec![child];
            while self.re[ix..].starts_with('|') {
                let (next, child) = self.parse_branch(ix + 1, depth)?;
                children.push(child);
                ix = next;
            }
            return Ok((ix, Expr::Alt(children)));
        }
        Ok((ix, child))
    }

    fn parse_branch(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let mut children: Vec<Expr> = Vec::new();
        let mut ix = ix;
        while ix < self.re.len() {
            let (next, child) = self.parse_piece(ix, depth)?;
            if next == ix {
                break;
            }
            ix = next;
            if let Expr::Literal { val: ref more } = child {
                if let Some(Expr::Literal { val }) = children.last_mut() {
                    val.push_str(more);
                    continue;
                }
            }
            children.push(child);
        }
        match children.len() {
            0 => Ok((ix, Expr::Empty)),
            1 => Ok((ix, children.pop().unwrap_or(Expr::Empty))),
            _ => Ok((ix, Expr::Concat(children))),
        }
    }

    fn parse_piece(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let (ix, child) = self.parse_atom(ix, depth)?;
        let bytes = self.re.as_bytes();
        if ix >= bytes.len() {
            return Ok((ix, child));
        }
        let (lo, hi) = match bytes[ix] {
            b'?' => (0, 1),
            b'*' => (0, usize::MAX),
            b'+' => (1, usize::MAX),
            _ => return Ok((ix, child)),
        };
        if !is_repeatable(&child) {
            return Err(Error::ParseError(ix, ParseError::TargetNotRepeatable));
        }
        let mut ix = ix + 1;
        let mut greedy = true;
        let mut possessive = false;
        match bytes.get(ix) {
            Some(b'?') => {
                greedy = false;
                ix += 1;
            }
            Some(b'+') => {
                possessive = true;
                ix += 1;
            }
            _ => (),
        }
        let node = Expr::Repeat {
            child: Box::new(child),
            lo,
            hi,
            greedy,
        };
        if possessive {
            Ok((ix, Expr::AtomicGroup(Box::new(node))))
        } else {
            Ok((ix, node))
        }
    }

    fn parse_atom(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        if ix == self.re.len() {
            return Ok((ix, Expr::Empty));
        }
        match self.re.as_bytes()[ix] {
            b'.' => Ok((ix + 1, Expr::Any)),
            b'^' => Ok((ix + 1, Expr::Assertion(Assertion::StartText))),
            b'$' => Ok((ix + 1, Expr::Assertion(Assertion::EndText))),
            b'(' => self.parse_group(ix, depth),
            b'\\' => self.parse_escape(ix),
            b'[' => self.parse_class(ix),
            b'+' | b'*' | b'?' => Err(Error::ParseError(ix, ParseError::TargetNotRepeatable)),
            b'|' | b')' => Ok((ix, Expr::Empty)),
            b => {
                let next = ix + codepoint_len(b);
                Ok((
                    next,
                    Expr::Literal {
                        val: String::from(&self.re[ix..next]),
                    },
                ))
            }
        }
    }

    // ix points at the backslash
    fn parse_escape(&mut self, ix: usize) -> Result<(usize, Expr)> {
        if let Some(&b) = self.re.as_bytes().get(ix + 1) {
            if (b'1'..=b'9').contains(&b) {
                let group = usize::from(b - b'1');
                self.backrefs.insert(group);
                return Ok((ix + 2, Expr::Backref(group)));
            }
        }
        let (next, c) = self.parse_escaped_char(ix)?;
        Ok((
            next,
            Expr::Literal {
                val: c.to_string(),
            },
        ))
    }

    // ix points at the backslash; digits are plain characters here
    fn parse_escaped_char(&self, ix: usize) -> Result<(usize, char)> {
        let Some(c) = self.re[ix + 1..].chars().next() else {
            return Err(Error::ParseError(ix, ParseError::TrailingBackslash));
        };
        match c {
            'n' => Ok((ix + 2, '\n')),
            'r' => Ok((ix + 2, '\r')),
            't' => Ok((ix + 2, '\t')),
            'x' => {
                let digits = self.re.as_bytes().get(ix + 2..ix + 4);
                match digits {
                    Some(&[hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                        let value = (hex_value(hi) << 4) | hex_value(lo);
                        Ok((ix + 4, char::from(value)))
                    }
                    _ => Err(Error::ParseError(ix, ParseError::InvalidHex)),
                }
            }
            c => Ok((ix + 1 + c.len_utf8(), c)),
        }
    }

    fn parse_class(&mut self, ix: usize) -> Result<(usize, Expr)> {
        let start = ix;
        let mut ix = ix + 1;
        let mut class = CharClass::default();
        if self.re[ix..].starts_with('^') {
            class.negated = true;
            ix += 1;
        }
        loop {
            let Some(c) = self.re[ix..].chars().next() else {
                return Err(Error::ParseError(start, ParseError::UnclosedClass));
            };
            match c {
                ']' => return Ok((ix + 1, Expr::Class(class))),
                '\\' => {
                    let (next, c) = self.parse_escaped_char(ix)?;
                    class.ranges.push((c, c));
                    ix = next;
                }
                lo => {
                    let next = ix + lo.len_utf8();
                    let mut rest = self.re[next..].chars();
                    match (rest.next(), rest.next()) {
                        (Some('-'), Some(hi)) if hi != ']' => {
                            class.ranges.push((lo, hi));
                            ix = next + 1 + hi.len_utf8();
                        }
                        _ => {
                            class.ranges.push((lo, lo));
                            ix = next;
                        }
                    }
                }
            }
        }
    }

    fn parse_group(&mut self, ix: usize, depth: usize) -> Result<(usize, Expr)> {
        let depth = depth + 1;
        if depth >= MAX_RECURSION {
            return Err(Error::ParseError(ix, ParseError::RecursionExceeded));
        }
        let open = ix;
        let ix = ix + 1;
        let (la, atomic, capture, skip) = if self.re[ix..].starts_with("?=") {
            (Some(LookAround::LookAhead), false, false, 2)
        } else if self.re[ix..].starts_with("?!") {
            (Some(LookAround::LookAheadNeg), false, false, 2)
        } else if self.re[ix..].starts_with("?>") {
            (None, true, false, 2)
        } else if self.re[ix..].starts_with("?:") {
            (None, false, false, 2)
        } else {
            (None, false, true, 0)
        };
        let (ix, child) = self.parse_re(ix + skip, depth)?;
        if ix == self.re.len() {
            return Err(Error::ParseError(open, ParseError::UnclosedOpenParen));
        }
        // parse_re only stops early at a close paren
        let ix = ix + 1;
        let result = match (la, atomic, capture) {
            (Some(la), _, _) => Expr::LookAround(Box::new(child), la),
            (None, true, _) => Expr::AtomicGroup(Box::new(child)),
            (None, false, true) => Expr::Group(Box::new(child)),
            (None, false, false) => child,
        };
        Ok((ix, result))
    }
}

fn is_repeatable(child: &Expr) -> bool {
    !matches!(
        child,
        Expr::Empty | Expr::Assertion(_) | Expr::LookAround(_, _)
    )
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

// Helper function for tests
#[cfg(test)]
pub(crate) fn make_literal(s: &str) -> Expr {
    Expr::Literal {
        val: String::from(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    fn p(s: &str) -> Expr {
        Expr::parse_tree(s).unwrap().expr
    }

    #[cfg_attr(feature = "track_caller", track_caller)]
    fn fail(s: &str) -> ParseError {
        match Expr::parse_tree(s) {
            Err(Error::ParseError(_, kind)) => kind,
            other => panic!("expected parse error for {s:?}, got {other:?}"),
        }
    }

    fn class(ranges: &[(char, char)], negated: bool) -> Expr {
        Expr::Class(CharClass {
            ranges: ranges.to_vec(),
            negated,
        })
    }

    #[test]
    fn empty() {
        assert_eq!(p(""), Expr::Empty);
    }

    #[test]
    fn any() {
        assert_eq!(p("."), Expr::Any);
    }

    #[test]
    fn start_end_text() {
        assert_eq!(
            p("^a$"),
            Expr::Concat(vec![
                Expr::Assertion(Assertion::StartText),
                make_literal("a"),
                Expr::Assertion(Assertion::EndText),
            ])
        );
    }

    #[test]
    fn literal_merge() {
        assert_eq!(p("abc"), make_literal("abc"));
        assert_eq!(p("a(?:b)c"), make_literal("abc"));
    }

    #[test]
    fn literal_unicode() {
        assert_eq!(p("áé"), make_literal("áé"));
    }

    #[test]
    fn quantifier_binds_to_last_char() {
        assert_eq!(
            p("ab+"),
            Expr::Concat(vec![
                make_literal("a"),
                Expr::Repeat {
                    child: Box::new(make_literal("b")),
                    lo: 1,
                    hi: usize::MAX,
                    greedy: true,
                },
            ])
        );
    }

    #[test]
    fn repeat_kinds() {
        let rep = |lo, hi, greedy| Expr::Repeat {
            child: Box::new(make_literal("a")),
            lo,
            hi,
            greedy,
        };
        assert_eq!(p("a*"), rep(0, usize::MAX, true));
        assert_eq!(p("a*?"), rep(0, usize::MAX, false));
        assert_eq!(p("a+"), rep(1, usize::MAX, true));
        assert_eq!(p("a+?"), rep(1, usize::MAX, false));
        assert_eq!(p("a?"), rep(0, 1, true));
        assert_eq!(p("a??"), rep(0, 1, false));
    }

    #[test]
    fn possessive() {
        let atomic = |lo, hi| {
            Expr::AtomicGroup(Box::new(Expr::Repeat {
                child: Box::new(make_literal("a")),
                lo,
                hi,
                greedy: true,
            }))
        };
        assert_eq!(p("a++"), atomic(1, usize::MAX));
        assert_eq!(p("a*+"), atomic(0, usize::MAX));
        assert_eq!(p("a?+"), atomic(0, 1));
    }

    #[test]
    fn alternation() {
        assert_eq!(
            p("a|bc|"),
            Expr::Alt(vec![make_literal("a"), make_literal("bc"), Expr::Empty])
        );
    }

    #[test]
    fn groups() {
        assert_eq!(p("(a)"), Expr::Group(Box::new(make_literal("a"))));
        assert_eq!(p("()"), Expr::Group(Box::new(Expr::Empty)));
        assert_eq!(p("(?:a|b)"), Expr::Alt(vec![make_literal("a"), make_literal("b")]));
        assert_eq!(
            p("(?=a)"),
            Expr::LookAround(Box::new(make_literal("a")), LookAround::LookAhead)
        );
        assert_eq!(
            p("(?!a)"),
            Expr::LookAround(Box::new(make_literal("a")), LookAround::LookAheadNeg)
        );
        assert_eq!(p("(?>a)"), Expr::AtomicGroup(Box::new(make_literal("a"))));
    }

    #[test]
    fn escapes() {
        assert_eq!(p(r"\n\r\t"), make_literal("\n\r\t"));
        assert_eq!(p(r"\x41\x7a"), make_literal("Az"));
        assert_eq!(p(r"\xe9"), make_literal("é"));
        assert_eq!(p(r"\.\*\\"), make_literal(".*\\"));
        assert_eq!(p(r"\0"), make_literal("0"));
        assert_eq!(p(r"\q"), make_literal("q"));
    }

    #[test]
    fn backrefs() {
        let tree = Expr::parse_tree(r"(a)\1\9").unwrap();
        assert_eq!(
            tree.expr,
            Expr::Concat(vec![
                Expr::Group(Box::new(make_literal("a"))),
                Expr::Backref(0),
                Expr::Backref(8),
            ])
        );
        assert_eq!(tree.backrefs.iter().collect::<Vec<_>>(), vec![0, 8]);
    }

    #[test]
    fn backref_followed_by_digit() {
        assert_eq!(
            p(r"\12"),
            Expr::Concat(vec![Expr::Backref(0), make_literal("2")])
        );
    }

    #[test]
    fn char_classes() {
        assert_eq!(p("[abc]"), class(&[('a', 'a'), ('b', 'b'), ('c', 'c')], false));
        assert_eq!(p("[a-z0-9]"), class(&[('a', 'z'), ('0', '9')], false));
        assert_eq!(p("[^a-z]"), class(&[('a', 'z')], true));
        assert_eq!(p("[]"), class(&[], false));
        assert_eq!(p("[^]"), class(&[], true));
    }

    #[test]
    fn char_class_edge_members() {
        assert_eq!(p("[a-]"), class(&[('a', 'a'), ('-', '-')], false));
        assert_eq!(p("[-a]"), class(&[('-', '-'), ('a', 'a')], false));
        assert_eq!(p(r"[\]\\]"), class(&[(']', ']'), ('\\', '\\')], false));
        assert_eq!(p(r"[\1\x41]"), class(&[('1', '1'), ('A', 'A')], false));
        assert_eq!(p(r"[\n-z]"), class(&[('\n', '\n'), ('-', '-'), ('z', 'z')], false));
        assert_eq!(p("[z-a]"), class(&[('z', 'a')], false));
    }

    #[test]
    fn metachars_outside_class() {
        assert_eq!(p("]{}"), make_literal("]{}"));
    }

    #[test]
    fn class_contains() {
        let cls = CharClass {
            ranges: vec![('a', 'c'), ('x', 'x')],
            negated: true,
        };
        assert!(cls.contains('b'));
        assert!(!cls.matches('b'));
        assert!(cls.matches('d'));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(fail("(a"), ParseError::UnclosedOpenParen);
        assert_eq!(fail("(?:a|b"), ParseError::UnclosedOpenParen);
        assert_eq!(fail("a)"), ParseError::UnmatchedCloseParen);
        assert_eq!(fail("[ab"), ParseError::UnclosedClass);
        assert_eq!(fail("[^"), ParseError::UnclosedClass);
        assert_eq!(fail("a\\"), ParseError::TrailingBackslash);
        assert_eq!(fail("[a\\"), ParseError::TrailingBackslash);
        assert_eq!(fail(r"\x4"), ParseError::InvalidHex);
        assert_eq!(fail(r"\xg1"), ParseError::InvalidHex);
        assert_eq!(fail(r"\x"), ParseError::InvalidHex);
        assert_eq!(fail("*a"), ParseError::TargetNotRepeatable);
        assert_eq!(fail("a**"), ParseError::TargetNotRepeatable);
        assert_eq!(fail("a+++"), ParseError::TargetNotRepeatable);
        assert_eq!(fail("^*"), ParseError::TargetNotRepeatable);
        assert_eq!(fail("(?=a)+"), ParseError::TargetNotRepeatable);
        assert_eq!(fail("(?x)"), ParseError::TargetNotRepeatable);
    }

    #[test]
    fn parse_error_positions() {
        assert_matches!(
            Expr::parse_tree("ab(cd"),
            Err(Error::ParseError(2, ParseError::UnclosedOpenParen))
        );
        assert_matches!(
            Expr::parse_tree("ab)"),
            Err(Error::ParseError(2, ParseError::UnmatchedCloseParen))
        );
        assert_matches!(
            Expr::parse_tree("x[ab"),
            Err(Error::ParseError(1, ParseError::UnclosedClass))
        );
    }

    #[test]
    fn recursion_exceeded() {
        let deep = format!("{}a{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(fail(&deep), ParseError::RecursionExceeded);
        let shallow = format!("{}a{}", "(".repeat(10), ")".repeat(10));
        assert!(Expr::parse_tree(&shallow).is_ok());
    }
}
