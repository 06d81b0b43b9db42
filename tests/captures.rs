mod common;

use anchored_regex::{Captures, Error, RuntimeError};
use common::regex;
use matches::assert_matches;
use std::thread;

#[cfg_attr(feature = "track_caller", track_caller)]
fn captures<'a>(re: &str, text: &'a str) -> Captures<'a> {
    let regex = regex(re);
    let result = regex.captures(text);
    assert!(
        result.is_ok(),
        "Expected captures to succeed for '{re}' and '{text}', but got {:?}",
        result.err()
    );
    let captures = result.unwrap();
    assert!(
        captures.is_some(),
        "Expected captures for '{re}' and '{text}' but got None"
    );
    captures.unwrap()
}

#[cfg_attr(feature = "track_caller", track_caller)]
fn assert_group(captures: &Captures<'_>, i: usize, expected: Option<(usize, usize, &str)>) {
    let actual = captures.get(i).map(|m| (m.start(), m.end(), m.as_str()));
    assert_eq!(actual, expected, "group {i}");
}

#[test]
fn groups_are_numbered_by_opening_paren() {
    let c = captures("((a)(b))(c)", "abcd");
    assert_eq!(c.len(), 4);
    assert_eq!(c.as_match().as_str(), "abc");
    assert_group(&c, 0, Some((0, 2, "ab")));
    assert_group(&c, 1, Some((0, 1, "a")));
    assert_group(&c, 2, Some((1, 2, "b")));
    assert_group(&c, 3, Some((2, 3, "c")));
}

#[test]
fn non_capturing_groups_do_not_count() {
    let c = captures("(?:b)(?=b)(?!c)(?>b)(.)", "bbx");
    assert_eq!(c.len(), 1);
    assert_group(&c, 0, Some((2, 3, "x")));
}

#[test]
fn backref_capture() {
    let c = captures(r"(a+)\1", "aaaa");
    assert_eq!(c.as_match().end(), 4);
    assert_group(&c, 0, Some((0, 2, "aa")));
}

#[test]
fn unmatched_group_is_none() {
    let c = captures("(a)|(b)", "b");
    assert_group(&c, 0, None);
    assert_group(&c, 1, Some((0, 1, "b")));
}

#[test]
fn optional_group_is_none() {
    let c = captures("a(b)?c", "ac");
    assert_group(&c, 0, None);
}

#[test]
fn repeated_group_keeps_last_iteration() {
    let c = captures("(a|b)*", "abba");
    assert_group(&c, 0, Some((3, 4, "a")));

    let c = captures("(?:(a)|(b))+", "ab");
    assert_group(&c, 0, Some((0, 1, "a")));
    assert_group(&c, 1, Some((1, 2, "b")));
}

#[test]
fn stale_capture_after_backtracking() {
    // the first branch captures before it fails
    let c = captures("(?:(a)x|ab)", "ab");
    assert_eq!(c.as_match().as_str(), "ab");
    assert_group(&c, 0, Some((0, 1, "a")));
}

#[test]
fn capture_is_overwritten_while_backtracking() {
    // group 0 is written for "aaa" first, then once per shorter attempt
    let c = captures("(a*)ab", "aaab");
    assert_eq!(c.as_match().end(), 4);
    assert_group(&c, 0, Some((0, 2, "aa")));

    // the last write was on a path that failed
    let c = captures("(a+)b|a", "aac");
    assert_eq!(c.as_match().end(), 1);
    assert_group(&c, 0, Some((0, 1, "a")));
}

#[test]
fn capture_inside_negative_lookahead_stays() {
    let c = captures("(?!(a)b)a", "ac");
    assert_eq!(c.as_match().end(), 1);
    assert_group(&c, 0, Some((0, 1, "a")));
}

#[test]
fn capture_inside_lookahead() {
    let c = captures("(?=(ab))a", "abc");
    assert_eq!(c.as_match().end(), 1);
    assert_group(&c, 0, Some((0, 2, "ab")));
}

#[test]
fn index_by_group() {
    let c = captures("(x+)(y*)", "xxz");
    assert_eq!(&c[0], "xx");
    assert_eq!(&c[1], "");
    let all: Vec<_> = c.iter().flatten().map(|m| m.as_str()).collect();
    assert_eq!(all, vec!["xx", ""]);
}

#[test]
fn backref_to_unset_group() {
    let re = regex(r"(?:(a)|b)\1");
    let result = re.run("b");
    assert_matches!(
        result,
        Err(Error::RuntimeError(RuntimeError::UnresolvedBackref(0)))
    );
    assert_eq!(re.run("aa").unwrap(), Some(2));

    let re = regex(r"\1(a)");
    assert_matches!(
        re.run("aa"),
        Err(Error::RuntimeError(RuntimeError::UnresolvedBackref(0)))
    );
}

#[test]
fn no_mixing_between_calls() {
    let re = regex("(?:(a)|(b))c");
    for _ in 0..3 {
        let c = re.captures("ac").unwrap().unwrap();
        assert_group(&c, 0, Some((0, 1, "a")));
        assert_group(&c, 1, None);
        let c = re.captures("bc").unwrap().unwrap();
        assert_group(&c, 0, None);
        assert_group(&c, 1, Some((0, 1, "b")));
    }
}

#[test]
fn no_mixing_between_threads() {
    let re = regex(r"([a-z]+)-([0-9]+)");
    thread::scope(|s| {
        for i in 0..8 {
            let re = &re;
            s.spawn(move || {
                let word = "abcdefgh".split_at(i + 1).0;
                for n in 0..200 {
                    let text = format!("{word}-{n};");
                    let c = re.captures(&text).unwrap().unwrap();
                    assert_eq!(&c[0], word);
                    assert_eq!(c[1].parse::<usize>().unwrap(), n);
                    assert_eq!(c.as_match().end(), text.len() - 1);
                }
            });
        }
    });
}

#[test]
fn cloned_regex_across_threads() {
    let re = regex(r"(x)\1");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let re = re.clone();
            thread::spawn(move || re.run("xxx").unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(2));
    }
}
