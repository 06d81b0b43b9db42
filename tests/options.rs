mod common;

use anchored_regex::{CompileError, Error, RegexBuilder, RuntimeError};
use common::build;
use matches::assert_matches;

#[test]
fn backtrack_limit() {
    let text = format!("{}!", "a".repeat(25));

    let re = build(RegexBuilder::new().backtrack_limit(100_000), "(a*)*b");
    assert_matches!(
        re.run(&text),
        Err(Error::RuntimeError(RuntimeError::BacktrackLimitExceeded))
    );

    // the same pattern is fine on inputs that don't need much backtracking
    assert_eq!(re.run("aaab").unwrap(), Some(4));
}

#[test]
fn default_backtrack_limit() {
    let re = common::regex("(a|a)*b");
    let text = format!("{}!", "a".repeat(40));
    assert_matches!(
        re.run(&text),
        Err(Error::RuntimeError(RuntimeError::BacktrackLimitExceeded))
    );
}

#[test]
fn backtrack_limit_without_final_literal() {
    // the `b` appears nowhere, but only the VM finds that out
    let re = build(RegexBuilder::new().backtrack_limit(1_000), "(a*)*b");
    assert_matches!(
        re.run(&"a".repeat(30)),
        Err(Error::RuntimeError(RuntimeError::BacktrackLimitExceeded))
    );
}

#[test]
fn max_stack() {
    let re = build(RegexBuilder::new().max_stack(10), "a*");
    assert_eq!(re.run("aaaa").unwrap(), Some(4));
    assert_matches!(
        re.run(&"a".repeat(20)),
        Err(Error::RuntimeError(RuntimeError::StackOverflow))
    );

    let re = build(RegexBuilder::new().max_stack(10), "a*+");
    assert_matches!(
        re.run(&"a".repeat(20)),
        Err(Error::RuntimeError(RuntimeError::StackOverflow))
    );
}

#[test]
fn capture_limit() {
    let re = build(RegexBuilder::new().capture_limit(12), &"(a)".repeat(12));
    assert_eq!(re.captures_len(), 12);
    let text = "a".repeat(12);
    let captures = re.captures(&text).unwrap().unwrap();
    assert_eq!(captures.get(11).unwrap().range(), 11..12);

    assert_matches!(
        RegexBuilder::new().capture_limit(0).build("a(b)"),
        Err(Error::CompileError(CompileError::CaptureOverflow {
            groups: 1,
            limit: 0
        }))
    );

    let re = build(RegexBuilder::new().capture_limit(usize::MAX), &"(a)".repeat(64));
    assert_eq!(re.captures_len(), 64);
}

#[test]
fn size_limit() {
    // every level of lazy `+?` doubles its operand
    let re = format!("{}a{}", "(?:".repeat(30), ")+?".repeat(30));
    assert_matches!(
        RegexBuilder::new().size_limit(10_000).build(re.as_str()),
        Err(Error::CompileError(CompileError::ProgramTooLarge))
    );

    let re = build(RegexBuilder::new().size_limit(100), "(?:(?:a)+?)+?");
    assert_eq!(re.run("aa").unwrap(), Some(1));

    assert_matches!(
        RegexBuilder::new().size_limit(5).build("abcdef|ghijkl|mnopqr"),
        Err(Error::CompileError(CompileError::ProgramTooLarge))
    );
}

#[test]
fn builder_is_reusable() {
    let mut builder = RegexBuilder::new();
    builder.capture_limit(1);
    let first = build(&builder, "(a)");
    let second = build(&builder, "(b)");
    assert_eq!(first.run("a").unwrap(), Some(1));
    assert_eq!(second.run("b").unwrap(), Some(1));
    assert!(builder.build("(a)(b)").is_err());
}
