#![allow(dead_code)]

use anchored_regex::{Error, Regex, RegexBuilder};

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn regex(re: &str) -> Regex {
    let parse_result = Regex::new(re);
    assert!(
        parse_result.is_ok(),
        "Expected regex '{}' to be compiled successfully, got {:?}",
        re,
        parse_result.err()
    );
    parse_result.unwrap()
}

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn build(builder: &RegexBuilder, re: &str) -> Regex {
    let parse_result = builder.build(re);
    assert!(
        parse_result.is_ok(),
        "Expected regex '{}' to be compiled successfully, got {:?}",
        re,
        parse_result.err()
    );
    parse_result.unwrap()
}

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn run(re: &str, text: &str) -> Option<usize> {
    let result = regex(re).run(text);
    assert!(
        result.is_ok(),
        "Expected running '{}' on '{}' to succeed, got {:?}",
        re,
        text,
        result.err()
    );
    result.unwrap()
}

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn assert_match(re: &str, text: &str, end: usize) {
    let result = run(re, text);
    assert_eq!(
        result,
        Some(end),
        "Expected '{re}' to match '{text}' up to {end}"
    );
}

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn assert_no_match(re: &str, text: &str) {
    let result = run(re, text);
    assert!(
        result.is_none(),
        "Expected '{re}' not to match '{text}', but it matched up to {result:?}"
    );
}

#[cfg_attr(feature = "track_caller", track_caller)]
pub fn compile_error(re: &str) -> Error {
    let result = Regex::new(re);
    assert!(
        result.is_err(),
        "Expected regex '{re}' to fail to compile, but it compiled"
    );
    result.err().unwrap()
}
