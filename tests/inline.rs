//! Integration tests for the legacy inline command dialect: bare tokens,
//! single/double quoting, and the escape grammar. Vectors are transcribed
//! from first principles against the whitespace/quote/escape rules, not
//! copied from any external suite.

use respiked::parser::Parser;

fn parse_one(input: &[u8]) -> Result<Vec<Vec<u8>>, String> {
    let mut p = Parser::new();
    p.parse(input);
    if let Some(e) = p.err() {
        return Err(e.to_string());
    }
    let cmd = p.take_cmd().expect("a command was recognized");
    Ok(cmd.argv().to_vec())
}

fn words(argv: &[Vec<u8>]) -> Vec<String> {
    argv.iter()
        .map(|a| String::from_utf8(a.clone()).unwrap())
        .collect()
}

#[test]
fn bare_words_split_on_whitespace() {
    let argv = parse_one(b"PING\r\n").unwrap();
    assert_eq!(words(&argv), vec!["PING"]);

    let argv = parse_one(b"set foo bar\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "foo", "bar"]);
}

#[test]
fn tabs_also_separate_tokens() {
    let argv = parse_one(b"set\tfoo\tbar\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "foo", "bar"]);
}

#[test]
fn double_quoted_token_with_embedded_space() {
    let argv = parse_one(b"set foo \"bar baz\"\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "foo", "bar baz"]);
}

#[test]
fn single_quoted_token_with_embedded_space() {
    let argv = parse_one(b"set foo 'bar baz'\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "foo", "bar baz"]);
}

#[test]
fn bare_prefix_before_a_quote_is_accepted_regardless_of_relative_length() {
    // Pins down a deliberate deviation (see DESIGN.md): a bare prefix
    // followed by a quoted region is accepted whether the bare run is
    // longer than the quoted run or shorter than it.
    let argv = parse_one(b"set fo'o' bar\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "foo", "bar"]);

    let argv = parse_one(b"set f'oo' bar\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "foo", "bar"]);
}

#[test]
fn double_quote_standard_escapes() {
    let argv = parse_one(b"set foo \"a\\nb\\tc\\rd\"\n").unwrap();
    assert_eq!(argv[1], b"a\nb\tc\rd");
}

#[test]
fn double_quote_hex_escape_decodes_byte() {
    let argv = parse_one(b"set \"f\\x6fo\"\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "foo"]);
}

#[test]
fn double_quote_hex_escape_requires_exactly_two_digits() {
    assert!(parse_one(b"set \"f\\x6\"\n").is_err());
    assert!(parse_one(b"set \"f\\x6g\"\n").is_err());
}

#[test]
fn double_quote_unrecognized_escape_keeps_literal_char() {
    let argv = parse_one(b"set \"f\\zo\"\n").unwrap();
    assert_eq!(words(&argv), vec!["set", "fzo"]);
}

#[test]
fn single_quote_only_escapes_itself() {
    let argv = parse_one(b"set 'a\\nb'\n").unwrap();
    assert_eq!(argv[1], b"a\\nb");
    let argv = parse_one(b"set 'it\\'s'\n").unwrap();
    assert_eq!(argv[1], b"it's");
}

#[test]
fn quote_must_be_followed_by_whitespace_or_end() {
    assert!(parse_one(b"set \"foo\"bar\n").is_err());
    assert!(parse_one(b"set 'foo'bar\n").is_err());
}

#[test]
fn unterminated_quote_errors() {
    assert!(parse_one(b"set \"unterminated\n").is_err());
    assert!(parse_one(b"set 'unterminated\n").is_err());
}

#[test]
fn unterminated_quote_error_string_is_stable() {
    let mut p = Parser::new();
    p.parse(b"set \"unterminated\n");
    assert_eq!(p.err(), Some("Protocol error: unbalanced quotes in request"));
}

#[test]
fn blank_line_yields_no_command_and_does_not_error() {
    let mut p = Parser::new();
    p.parse(b"   \r\n");
    assert!(p.err().is_none());
    assert!(p.take_cmd().is_none());
    // The parser should still be usable for the next line.
    p.parse(b"PING\r\n");
    let cmd = p.take_cmd().expect("command recognized after a blank line");
    assert_eq!(words(cmd.argv()), vec!["PING"]);
}

#[test]
fn oversized_inline_line_errors() {
    let mut line = vec![b'a'; respiked::parser::PROTO_INLINE_MAX_SIZE + 1];
    line.push(b'\n');
    let mut p = Parser::new();
    p.parse(&line);
    assert_eq!(p.err(), Some("Protocol error: unbalanced quotes in request"));
}

#[test]
fn inline_line_split_across_chunks() {
    let mut p = Parser::new();
    p.parse(b"set fo");
    assert!(p.take_cmd().is_none());
    p.parse(b"o \"bar");
    assert!(p.take_cmd().is_none());
    p.parse(b" baz\"\n");
    let cmd = p.take_cmd().expect("line completed after the terminator arrives");
    assert_eq!(words(cmd.argv()), vec!["set", "foo", "bar baz"]);
}
