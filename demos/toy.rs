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

//! Small command line tool for looking at the internals of a pattern.
//!
//! ```text
//! cargo run --example toy -- parse '(a+)b\1'
//! cargo run --example toy -- compile '(a+)b\1'
//! cargo run --example toy -- trace '(a+)b\1' 'aabaa'
//! cargo run --example toy -- run '(a+)b\1' 'aabaa'
//! ```

use anchored_regex::internal::{analyze, compile, run_trace, Prog};
use anchored_regex::{Expr, Regex, Result};
use std::env;
use std::process;
use std::sync::Arc;

fn main() {
    let mut args = env::args().skip(1);
    let (Some(cmd), Some(re)) = (args.next(), args.next()) else {
        usage();
    };
    let text = args.next();
    let result = match (cmd.as_str(), text) {
        ("parse", None) => show_parse(&re),
        ("compile", None) => show_compile(&re),
        ("trace", Some(text)) => show_trace(&re, &text),
        ("run", Some(text)) => show_captures(&re, &text),
        _ => usage(),
    };
    if let Err(error) = result {
        eprintln!("error: {error}");
        process::exit(1);
    }
}

fn usage() -> ! {
    eprintln!("usage: toy parse <pattern>");
    eprintln!("       toy compile <pattern>");
    eprintln!("       toy trace <pattern> <text>");
    eprintln!("       toy run <pattern> <text>");
    process::exit(2);
}

fn prog(re: &str) -> Result<Prog> {
    let tree = Expr::parse_tree(re)?;
    let info = analyze(&tree)?;
    compile(&info)
}

fn show_parse(re: &str) -> Result<()> {
    let tree = Expr::parse_tree(re)?;
    println!("{:#?}", tree.expr);
    println!("backrefs: {:?}", tree.backrefs.iter().collect::<Vec<_>>());
    Ok(())
}

fn show_compile(re: &str) -> Result<()> {
    let prog = prog(re)?;
    for (i, insn) in prog.body.iter().enumerate() {
        println!("{i:3}: {insn:?}");
    }
    println!("groups: {}", prog.n_groups());
    Ok(())
}

fn show_trace(re: &str, text: &str) -> Result<()> {
    match run_trace(Arc::new(prog(re)?), text)? {
        Some(end) => println!("match: 0..{end} {:?}", &text[..end]),
        None => println!("no match"),
    }
    Ok(())
}

fn show_captures(re: &str, text: &str) -> Result<()> {
    let regex = Regex::new(re)?;
    let Some(captures) = regex.captures(text)? else {
        println!("no match");
        return Ok(());
    };
    println!("match: {:?}", captures.as_match().as_str());
    for (i, group) in captures.iter().enumerate() {
        match group {
            Some(m) => println!("  group {i}: {}..{} {:?}", m.start(), m.end(), m.as_str()),
            None => println!("  group {i}: unset"),
        }
    }
    Ok(())
}
