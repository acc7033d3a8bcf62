//! Route patterns and the matchers compiled from them.
//!
//! A pattern is compiled once, when a route is registered, into a regular
//! expression. Leaf routes use [`Mode::Exact`] and must account for the whole
//! path; nested routers use [`Mode::Prefix`] and only need to consume a
//! leading run of segments, leaving the remainder to the router below them.
//!
//! ```ignore
//!  Syntax          Type
//!  /users          literal text
//!  :name           named parameter, a single segment
//!  :name?          optional parameter
//!  :name*          zero or more segments
//!  :name+          one or more segments
//!  :name(\d+)      named parameter with a custom pattern
//!  (\d+)           unnamed parameter, keyed by its position ("0", "1", ...)
//!  {/:name}?       group with surrounding text and a modifier
//!  *name           catch-all parameter, the rest of the path
//!  \:              escaped character
//! ```
use crate::error::PatternError;
use crate::params::Params;

use regex::Regex;

const DEFAULT_PATTERN: &str = "[^/#?]+?";
const DELIMITER: &str = "[/#?]";
const PREFIXES: &str = "./";

/// How much of a path a matcher has to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The pattern must match the entire path (leaf routes).
    Exact,
    /// The pattern must match a leading run of segments (nested routers).
    Prefix,
}

/// Options applied when compiling a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Match literal text case-sensitively.
    pub sensitive: bool,
    /// Reject a trailing delimiter that the pattern does not spell out.
    pub strict: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            sensitive: true,
            strict: false,
        }
    }
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'p> {
    /// The leading part of the path the pattern accounted for.
    pub consumed: &'p str,
    pub params: Params,
}

/// A compiled route pattern.
/// ```rust
/// use nestrouter::path::{Matcher, MatchOptions, Mode};
///
/// let matcher = Matcher::compile("/user/:id", Mode::Exact, MatchOptions::default()).unwrap();
/// let matched = matcher.matches("/user/42?tab=repos").unwrap();
///
/// assert_eq!(matched.consumed, "/user/42");
/// assert_eq!(matched.params.get("id"), Some("42"));
/// assert!(matcher.matches("/user/42/repos").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: String,
    mode: Mode,
    regex: Regex,
    keys: Vec<String>,
}

impl Matcher {
    /// Compiles `pattern` into a matcher.
    pub fn compile(pattern: &str, mode: Mode, options: MatchOptions) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(pattern.to_owned()));
        }

        let pieces = parse(&lex(pattern)?)?;
        let (source, keys) = to_regex(&pieces, mode, options);
        let regex = Regex::new(&source).map_err(|e| PatternError::Regex(e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_owned(),
            mode,
            regex,
            keys,
        })
    }

    /// The pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Matches a request path. Any query string is ignored and an empty path
    /// is treated as `/`.
    pub fn matches<'p>(&self, path: &'p str) -> Option<Match<'p>> {
        let path = match path.split('?').next() {
            Some(p) if !p.is_empty() => p,
            _ => "/",
        };

        let captures = self.regex.captures(path)?;

        let mut params = Params::default();
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(value) = captures.get(i + 1) {
                params.insert(key.as_str(), value.as_str());
            }
        }

        // the remainder group only exists in prefix mode
        let consumed = match captures.get(self.keys.len() + 1) {
            Some(rest) => &path[..rest.start()],
            None => path,
        };

        Some(Match { consumed, params })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Open,
    Close,
    Pattern(String),
    Name(String),
    Char(char),
    Escaped(char),
    Modifier(char),
    End,
}

impl Lexeme {
    fn kind(&self) -> &'static str {
        match self {
            Lexeme::Open => "'{'",
            Lexeme::Close => "'}'",
            Lexeme::Pattern(_) => "pattern",
            Lexeme::Name(_) => "name",
            Lexeme::Char(_) => "character",
            Lexeme::Escaped(_) => "escaped character",
            Lexeme::Modifier(_) => "modifier",
            Lexeme::End => "end of pattern",
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex(pattern: &str) -> Result<Vec<(usize, Lexeme)>, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            // `*name` at the start of a segment is a catch-all
            '*' if i > 0
                && chars[i - 1] == '/'
                && chars.get(i + 1).map_or(false, |&c| is_name_char(c)) =>
            {
                let start = i;
                i += 1;
                let mut name = String::new();
                while i < chars.len() && is_name_char(chars[i]) {
                    name.push(chars[i]);
                    i += 1;
                }
                tokens.push((start, Lexeme::Name(name)));
                tokens.push((start, Lexeme::Pattern(".*".to_owned())));
            }
            '*' | '+' | '?' => {
                tokens.push((i, Lexeme::Modifier(c)));
                i += 1;
            }
            '\\' => {
                let escaped = *chars.get(i + 1).ok_or(PatternError::DanglingEscape(i))?;
                tokens.push((i, Lexeme::Escaped(escaped)));
                i += 2;
            }
            '{' => {
                tokens.push((i, Lexeme::Open));
                i += 1;
            }
            '}' => {
                tokens.push((i, Lexeme::Close));
                i += 1;
            }
            ':' => {
                let start = i;
                i += 1;
                let mut name = String::new();
                while i < chars.len() && is_name_char(chars[i]) {
                    name.push(chars[i]);
                    i += 1;
                }
                if name.is_empty() {
                    return Err(PatternError::MissingName(start));
                }
                tokens.push((start, Lexeme::Name(name)));
            }
            '(' => {
                let start = i;
                let mut depth = 1;
                let mut inner = String::new();
                i += 1;

                if chars.get(i) == Some(&'?') {
                    return Err(PatternError::QuestionMarkPattern(i));
                }

                while i < chars.len() {
                    match chars[i] {
                        '\\' => {
                            inner.push('\\');
                            i += 1;
                            if let Some(&next) = chars.get(i) {
                                inner.push(next);
                            }
                            i += 1;
                            continue;
                        }
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                i += 1;
                                break;
                            }
                        }
                        '(' => {
                            depth += 1;
                            if chars.get(i + 1) != Some(&'?') {
                                return Err(PatternError::CapturingGroup(i));
                            }
                        }
                        _ => {}
                    }
                    inner.push(chars[i]);
                    i += 1;
                }

                if depth != 0 {
                    return Err(PatternError::UnbalancedPattern(start));
                }
                if inner.is_empty() {
                    return Err(PatternError::EmptyPattern(start));
                }
                tokens.push((start, Lexeme::Pattern(inner)));
            }
            _ => {
                tokens.push((i, Lexeme::Char(c)));
                i += 1;
            }
        }
    }

    tokens.push((chars.len(), Lexeme::End));
    Ok(tokens)
}

/// A parsed piece of a pattern.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text(String),
    Param(Capture),
}

#[derive(Debug, Clone, PartialEq)]
struct Capture {
    name: String,
    prefix: String,
    suffix: String,
    pattern: String,
    modifier: Option<char>,
}

struct Parser<'t> {
    tokens: &'t [(usize, Lexeme)],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> &'t (usize, Lexeme) {
        // the lexer always terminates the stream with `End`
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn char(&mut self) -> Option<char> {
        match self.peek().1 {
            Lexeme::Char(c) => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn escaped(&mut self) -> Option<char> {
        match self.peek().1 {
            Lexeme::Escaped(c) => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn name(&mut self) -> Option<String> {
        match &self.peek().1 {
            Lexeme::Name(name) => {
                self.pos += 1;
                Some(name.clone())
            }
            _ => None,
        }
    }

    fn pattern(&mut self) -> Option<String> {
        match &self.peek().1 {
            Lexeme::Pattern(pattern) => {
                self.pos += 1;
                Some(pattern.clone())
            }
            _ => None,
        }
    }

    fn modifier(&mut self) -> Option<char> {
        match self.peek().1 {
            Lexeme::Modifier(c) => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn expect(&mut self, want: Lexeme) -> Result<(), PatternError> {
        let (index, got) = self.peek();
        if *got == want {
            self.pos += 1;
            return Ok(());
        }
        Err(PatternError::Unexpected {
            kind: got.kind(),
            index: *index,
            expected: want.kind(),
        })
    }

    fn text(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.char().or_else(|| self.escaped()) {
            text.push(c);
        }
        text
    }
}

fn parse(tokens: &[(usize, Lexeme)]) -> Result<Vec<Piece>, PatternError> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut pieces = Vec::new();
    let mut path = String::new();
    let mut key = 0;

    let mut next_key = || {
        let name = key.to_string();
        key += 1;
        name
    };

    loop {
        let c = parser.char();
        let name = parser.name();
        let pattern = parser.pattern();

        if name.is_some() || pattern.is_some() {
            let mut prefix = c.map(String::from).unwrap_or_default();
            if !PREFIXES.contains(prefix.as_str()) {
                path.push_str(&prefix);
                prefix.clear();
            }

            if !path.is_empty() {
                pieces.push(Piece::Text(std::mem::take(&mut path)));
            }

            pieces.push(Piece::Param(Capture {
                name: name.unwrap_or_else(&mut next_key),
                prefix,
                suffix: String::new(),
                pattern: pattern.unwrap_or_else(|| DEFAULT_PATTERN.to_owned()),
                modifier: parser.modifier(),
            }));
            continue;
        }

        if let Some(c) = c.or_else(|| parser.escaped()) {
            path.push(c);
            continue;
        }

        if !path.is_empty() {
            pieces.push(Piece::Text(std::mem::take(&mut path)));
        }

        if parser.peek().1 == Lexeme::Open {
            parser.pos += 1;
            let prefix = parser.text();
            let name = parser.name();
            let pattern = parser.pattern();
            let suffix = parser.text();
            parser.expect(Lexeme::Close)?;

            let pattern = match (&name, pattern) {
                (_, Some(pattern)) => pattern,
                (Some(_), None) => DEFAULT_PATTERN.to_owned(),
                (None, None) => String::new(),
            };
            let name = match name {
                Some(name) => name,
                None if !pattern.is_empty() => next_key(),
                None => String::new(),
            };

            pieces.push(Piece::Param(Capture {
                name,
                prefix,
                suffix,
                pattern,
                modifier: parser.modifier(),
            }));
            continue;
        }

        parser.expect(Lexeme::End)?;
        return Ok(pieces);
    }
}

fn to_regex(pieces: &[Piece], mode: Mode, options: MatchOptions) -> (String, Vec<String>) {
    let mut keys = Vec::new();
    let mut route = String::new();

    if !options.sensitive {
        route.push_str("(?i)");
    }
    route.push('^');

    for piece in pieces {
        let capture = match piece {
            Piece::Text(text) => {
                route.push_str(&regex::escape(text));
                continue;
            }
            Piece::Param(capture) => capture,
        };

        let prefix = regex::escape(&capture.prefix);
        let suffix = regex::escape(&capture.suffix);
        let modifier = capture.modifier.map(String::from).unwrap_or_default();
        let repeated = matches!(capture.modifier, Some('*') | Some('+'));

        if capture.pattern.is_empty() {
            route.push_str(&format!("(?:{}{}){}", prefix, suffix, modifier));
            continue;
        }

        keys.push(capture.name.clone());
        let pattern = &capture.pattern;

        if !prefix.is_empty() || !suffix.is_empty() {
            if repeated {
                let optional = if capture.modifier == Some('*') { "?" } else { "" };
                route.push_str(&format!(
                    "(?:{p}((?:{pat})(?:{s}{p}(?:{pat}))*){s}){o}",
                    p = prefix,
                    s = suffix,
                    pat = pattern,
                    o = optional
                ));
            } else {
                route.push_str(&format!("(?:{}({}){}){}", prefix, pattern, suffix, modifier));
            }
        } else if repeated {
            route.push_str(&format!("((?:{}){})", pattern, modifier));
        } else {
            route.push_str(&format!("({}){}", pattern, modifier));
        }
    }

    match mode {
        Mode::Exact => {
            if !options.strict {
                route.push_str(DELIMITER);
                route.push('?');
            }
            route.push('$');
        }
        Mode::Prefix => {
            let end_delimited = match pieces.last() {
                None => true,
                Some(Piece::Text(text)) => text.ends_with(|c: char| matches!(c, '/' | '#' | '?')),
                Some(Piece::Param(_)) => false,
            };

            // the last group captures whatever is left for the nested router
            if end_delimited {
                if !options.strict {
                    route.push_str(&format!("(?:{}$)?", DELIMITER));
                }
                route.push_str("(.*)$");
            } else if options.strict {
                route.push_str(&format!("(?:$|({}.*)$)", DELIMITER));
            } else {
                route.push_str(&format!("(?:{d}?$|({d}.*)$)", d = DELIMITER));
            }
        }
    }

    (route, keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(pattern: &str) -> Matcher {
        Matcher::compile(pattern, Mode::Exact, MatchOptions::default()).unwrap()
    }

    fn prefix(pattern: &str) -> Matcher {
        Matcher::compile(pattern, Mode::Prefix, MatchOptions::default()).unwrap()
    }

    fn params(matched: &Match<'_>) -> Vec<(String, String)> {
        matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn exact_literals() {
        let m = exact("/multimiddleware");
        assert_eq!(m.matches("/multimiddleware").unwrap().consumed, "/multimiddleware");
        assert_eq!(m.matches("/multimiddleware/").unwrap().consumed, "/multimiddleware/");
        assert!(m.matches("/multimiddleware/x").is_none());
        assert!(m.matches("/multi").is_none());
        assert!(m.matches("/MultiMiddleware").is_none());
    }

    #[test]
    fn root() {
        let m = exact("/");
        assert!(m.matches("/").is_some());
        assert!(m.matches("").is_some());
        assert!(m.matches("?page=2").is_some());
        assert!(m.matches("/deep").is_none());
    }

    #[test]
    fn named_params() {
        let m = exact("/blog/:category/:post");
        let matched = m.matches("/blog/rust/request-routers").unwrap();
        assert_eq!(
            params(&matched),
            pairs(&[("category", "rust"), ("post", "request-routers")])
        );
        assert!(m.matches("/blog/rust/").is_none());
        assert!(m.matches("/blog/rust/request-routers/comments").is_none());
    }

    #[test]
    fn query_is_ignored() {
        let matched = exact("/user/:id").matches("/user/1?fields=name").unwrap();
        assert_eq!(matched.params.get("id"), Some("1"));
    }

    #[test]
    fn optional_param() {
        let m = exact("/books/:id?");
        assert!(m.matches("/books").unwrap().params.is_empty());
        assert_eq!(m.matches("/books/7").unwrap().params.get("id"), Some("7"));
        assert!(m.matches("/books/7/pages").is_none());
    }

    #[test]
    fn repeated_params() {
        let m = exact("/files/:path*");
        assert!(m.matches("/files").unwrap().params.is_empty());
        assert_eq!(
            m.matches("/files/a/b/c").unwrap().params.get("path"),
            Some("a/b/c")
        );

        let m = exact("/tags/:tag+");
        assert!(m.matches("/tags").is_none());
        assert_eq!(m.matches("/tags/x/y").unwrap().params.get("tag"), Some("x/y"));
    }

    #[test]
    fn custom_and_unnamed_patterns() {
        let m = exact("/user/:id(\\d+)");
        assert_eq!(m.matches("/user/42").unwrap().params.get("id"), Some("42"));
        assert!(m.matches("/user/abc").is_none());

        let m = exact("/archive/(\\d{4})/(\\d{2})");
        let matched = m.matches("/archive/2020/05").unwrap();
        assert_eq!(params(&matched), pairs(&[("0", "2020"), ("1", "05")]));
    }

    #[test]
    fn groups() {
        let m = exact("/books{/:id}?");
        assert!(m.matches("/books").is_some());
        assert_eq!(m.matches("/books/3").unwrap().params.get("id"), Some("3"));

        let m = exact("/photo{-:size}?.jpg");
        assert_eq!(
            m.matches("/photo-large.jpg").unwrap().params.get("size"),
            Some("large")
        );
        assert!(m.matches("/photo.jpg").unwrap().params.is_empty());
    }

    #[test]
    fn catch_all() {
        let m = exact("/src/*filepath");
        assert_eq!(
            m.matches("/src/subdir/somefile.rs").unwrap().params.get("filepath"),
            Some("subdir/somefile.rs")
        );
        assert_eq!(m.matches("/src/").unwrap().params.get("filepath"), Some(""));
    }

    #[test]
    fn escaped_characters() {
        let m = exact("/time\\:now");
        assert!(m.matches("/time:now").unwrap().params.is_empty());
    }

    #[test]
    fn prefix_consumes_leading_segments() {
        let m = prefix("/deep");
        assert_eq!(m.matches("/deep").unwrap().consumed, "/deep");
        assert_eq!(m.matches("/deep/").unwrap().consumed, "/deep/");
        assert_eq!(m.matches("/deep/deeper").unwrap().consumed, "/deep");
        assert!(m.matches("/deeper").is_none());
        assert!(m.matches("/").is_none());
    }

    #[test]
    fn prefix_with_params() {
        let m = prefix("/orgs/:org");
        let matched = m.matches("/orgs/rust-lang/repos/1").unwrap();
        assert_eq!(matched.consumed, "/orgs/rust-lang");
        assert_eq!(matched.params.get("org"), Some("rust-lang"));
    }

    #[test]
    fn prefix_root_consumes_only_the_slash() {
        let m = prefix("/");
        assert_eq!(m.matches("/").unwrap().consumed, "/");
        assert_eq!(m.matches("/deep/deeper").unwrap().consumed, "/");
    }

    #[test]
    fn options() {
        let insensitive = MatchOptions {
            sensitive: false,
            ..MatchOptions::default()
        };
        let m = Matcher::compile("/About", Mode::Exact, insensitive).unwrap();
        assert!(m.matches("/about").is_some());

        let strict = MatchOptions {
            strict: true,
            ..MatchOptions::default()
        };
        let m = Matcher::compile("/about", Mode::Exact, strict).unwrap();
        assert!(m.matches("/about").is_some());
        assert!(m.matches("/about/").is_none());

        let m = Matcher::compile("/deep", Mode::Prefix, strict).unwrap();
        assert_eq!(m.matches("/deep/x").unwrap().consumed, "/deep");
        assert!(m.matches("/deep/").is_some());
        assert_eq!(m.matches("/deep/").unwrap().consumed, "/deep");
    }

    #[test]
    fn invalid_patterns() {
        let compile = |p: &str| Matcher::compile(p, Mode::Exact, MatchOptions::default());

        assert_eq!(
            compile("users").unwrap_err(),
            PatternError::MissingLeadingSlash("users".into())
        );
        assert_eq!(compile("/user/:").unwrap_err(), PatternError::MissingName(6));
        assert_eq!(compile("/user/:id(\\d+").unwrap_err(), PatternError::UnbalancedPattern(9));
        assert_eq!(compile("/user/:id()").unwrap_err(), PatternError::EmptyPattern(9));
        assert_eq!(compile("/user/(\\d+(x))").unwrap_err(), PatternError::CapturingGroup(10));
        assert_eq!(compile("/user/(?:x)").unwrap_err(), PatternError::QuestionMarkPattern(7));
        assert_eq!(compile("/user\\").unwrap_err(), PatternError::DanglingEscape(5));
        assert!(matches!(
            compile("/books{/:id").unwrap_err(),
            PatternError::Unexpected { expected: "'}'", .. }
        ));
        assert!(matches!(
            compile("/books/?").unwrap_err(),
            PatternError::Unexpected { kind: "modifier", .. }
        ));
    }
}
