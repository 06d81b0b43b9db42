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

//! Analysis of regex expressions.

use crate::parse::ExprTree;
use crate::CompileError;
use crate::Error;
use crate::Expr;
use crate::Result;

/// Facts about one node of the expression tree, with the same shape as the tree.
#[derive(Debug)]
pub struct Info<'a> {
    /// Index of the first capture group at or inside this expression
    pub(crate) start_group: usize,
    /// One past the index of the last capture group inside this expression
    pub(crate) end_group: usize,
    /// Minimum number of characters a match of this expression consumes
    pub(crate) min_size: usize,
    pub(crate) expr: &'a Expr,
    pub(crate) children: Vec<Info<'a>>,
}

struct Analyzer {
    group_ix: usize,
}

impl Analyzer {
    fn visit<'a>(&mut self, expr: &'a Expr) -> Info<'a> {
        let start_group = self.group_ix;
        if let Expr::Group(_) = expr {
            self.group_ix += 1;
        }
        let children: Vec<Info<'a>> = match *expr {
            Expr::Concat(ref v) | Expr::Alt(ref v) => v.iter().map(|e| self.visit(e)).collect(),
            Expr::Group(ref child)
            | Expr::LookAround(ref child, _)
            | Expr::AtomicGroup(ref child)
            | Expr::Repeat { ref child, .. } => vec![self.visit(child)],
            _ => Vec::new(),
        };
        let min_size = match *expr {
            Expr::Empty | Expr::Assertion(_) | Expr::Backref(_) | Expr::LookAround(..) => 0,
            Expr::Any | Expr::Class(_) => 1,
            Expr::Literal { ref val } => val.chars().count(),
            Expr::Concat(_) => children
                .iter()
                .fold(0usize, |n, c| n.saturating_add(c.min_size)),
            Expr::Alt(_) => children.iter().map(|c| c.min_size).min().unwrap_or(0),
            Expr::Group(_) | Expr::AtomicGroup(_) => children[0].min_size,
            Expr::Repeat { lo, .. } => children[0].min_size.saturating_mul(lo),
        };
        Info {
            start_group,
            end_group: self.group_ix,
            min_size,
            expr,
            children,
        }
    }
}

/// Analyze the parsed expression, numbering its capture groups and checking its backrefs.
///
/// # Errors
///
/// Returns [`CompileError::InvalidBackref`] if a backref points past the last capture group.
pub fn analyze(tree: &ExprTree) -> Result<Info<'_>> {
    let mut analyzer = Analyzer { group_ix: 0 };

    let info = analyzer.visit(&tree.expr);
    // backrefs may point forward, so this can only be checked once all groups are counted
    if let Some(group) = tree.backrefs.iter().find(|&group| group >= info.end_group) {
        return Err(Error::CompileError(CompileError::InvalidBackref(group)));
    }
    Ok(info)
}
