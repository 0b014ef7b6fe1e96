use std::iter::FusedIterator;
use std::ops::Range;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug)]
pub struct File {
    name: String,
    contents: String,
    lines: Vec<usize>,
}

impl File {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        let name = name.into();
        let contents = contents.into();
        let mut lines = vec![0];
        for (idx, ch) in contents.char_indices() {
            if ch == '\n' {
                lines.push(idx + ch.len_utf8());
            }
        }
        Self {
            name,
            contents,
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn line_column_at(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.contents.len());
        let line_index = match self.lines.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.lines[line_index];
        let column = self.contents[line_start..offset].chars().count() + 1;
        (line_index + 1, column)
    }

    pub fn line(&self, line: usize) -> &str {
        if line == 0 || line > self.lines.len() {
            return "";
        }
        let start = self.lines[line - 1];
        let end = match self.lines.get(line) {
            Some(&next_start) if next_start > start => next_start - 1,
            Some(&next_start) => next_start,
            None => self.contents.len(),
        };
        let text = &self.contents[start..end];
        text.strip_suffix('\r').unwrap_or(text)
    }
}

#[derive(Debug, Clone)]
pub struct SourceInfo {
    range: Range<usize>,
    file: Arc<File>,
}

impl SourceInfo {
    pub fn new(file: Arc<File>, range: Range<usize>) -> Self {
        Self { range, file }
    }

    pub fn eof(file: Arc<File>) -> Self {
        let len = file.len();
        Self::new(file, len..len)
    }

    pub fn as_str(&self) -> &str {
        self.file
            .contents()
            .get(self.range.clone())
            .expect("invalid token position")
    }

    pub fn line_column(&self) -> (usize, usize) {
        self.file.line_column_at(self.range.start)
    }
}

impl std::fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (line, column) = self.line_column();
        writeln!(f, "{}:{}:{}", self.file.name(), line, column)?;
        writeln!(f, "{}", self.file.line(line))?;
        write!(
            f,
            "{}{}",
            " ".repeat(column - 1),
            "^".repeat(std::cmp::max(1, self.as_str().chars().count()))
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Var,    // e.g. "X", "_y", "Xs'"
    Atom,   // e.g. "f", "nil", "λ"
    NumLit, // e.g. "0", "42"
    Symbol, // "(", ")", ",", ";", "="
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub source_info: SourceInfo,
}

impl Token {
    pub fn is_var(&self) -> bool {
        self.kind == TokenKind::Var
    }

    pub fn is_symbol(&self) -> bool {
        self.kind == TokenKind::Symbol
    }

    pub fn as_str(&self) -> &str {
        self.source_info.as_str()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?} {}\n{}", self.kind, self.as_str(), self.source_info)
    }
}

#[derive(Debug, Clone)]
pub struct Lex {
    file: Arc<File>,
    position: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LexState {
    position: usize,
}

#[derive(Debug, Clone, Error)]
#[error("unrecognizable character at {source_info}")]
pub struct LexError {
    source_info: SourceInfo,
}

impl From<Lex> for LexError {
    fn from(lex: Lex) -> Self {
        let start = std::cmp::min(lex.position, lex.file.len());
        let end = lex.file.contents()[start..]
            .chars()
            .next()
            .map(|c| start + c.len_utf8())
            .unwrap_or(start);
        Self {
            source_info: SourceInfo::new(lex.file, start..end),
        }
    }
}

impl Lex {
    pub fn new(file: Arc<File>) -> Self {
        Self { file, position: 0 }
    }

    pub fn input(&self) -> &Arc<File> {
        &self.file
    }

    pub fn save(&self) -> LexState {
        LexState {
            position: self.position,
        }
    }

    pub fn restore(&mut self, state: LexState) {
        self.position = state.position;
    }

    fn advance(&mut self, bytes: usize) -> SourceInfo {
        let source_info =
            SourceInfo::new(Arc::clone(&self.file), self.position..self.position + bytes);
        self.position += bytes;
        source_info
    }

    pub fn is_eof(&self) -> bool {
        self.clone().next().is_none()
    }
}

impl Iterator for Lex {
    type Item = std::result::Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        #[derive(PartialEq, Eq, Debug)]
        enum Kind {
            Space,
            Var,
            Atom,
            NumLit,
            Symbol,
        }

        static RE: Lazy<Regex> = Lazy::new(|| {
            let s = &[
                (Kind::Space, r"\s+|--.*"),
                (Kind::Var, r"[\p{Uppercase_Letter}_][\p{Alphabetic}\p{Number}_']*"),
                (Kind::Atom, r"\p{Alphabetic}[\p{Alphabetic}\p{Number}_']*"),
                (Kind::NumLit, r"[0-9]+"),
                (Kind::Symbol, r"[(),;=]"),
            ]
            .iter()
            .map(|(kind, re)| format!("(?P<{:?}>{})", kind, re))
            .collect::<Vec<_>>()
            .join("|");
            Regex::new(&format!("^(?:{})", s)).unwrap()
        });

        loop {
            if self.file.len() == self.position {
                return None;
            }
            let input = Arc::clone(&self.file);
            let cap = match RE.captures(&input.contents()[self.position..]) {
                None => return Some(Err(LexError::from(self.clone()))),
                Some(cap) => cap,
            };
            let len = cap.get(0).map(|m| m.len()).unwrap_or(0);

            // skip whitespaces and comments
            if cap.name(&format!("{:?}", Kind::Space)).is_some() {
                self.advance(len);
                continue;
            }

            let kind = if cap.name(&format!("{:?}", Kind::Var)).is_some() {
                TokenKind::Var
            } else if cap.name(&format!("{:?}", Kind::Atom)).is_some() {
                TokenKind::Atom
            } else if cap.name(&format!("{:?}", Kind::NumLit)).is_some() {
                TokenKind::NumLit
            } else {
                assert!(cap.name(&format!("{:?}", Kind::Symbol)).is_some());
                TokenKind::Symbol
            };
            let source_info = self.advance(len);
            return Some(Ok(Token { kind, source_info }));
        }
    }
}

impl FusedIterator for Lex {}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        let file = Arc::new(File::new("<test>", input.to_owned()));
        Lex::new(file)
            .map(|token| token.expect("lexing failed"))
            .collect()
    }

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input)
            .into_iter()
            .map(|t| (t.kind, t.as_str().to_owned()))
            .collect()
    }

    #[test]
    fn variables_start_uppercase_or_underscore() {
        use TokenKind::*;
        assert_eq!(
            kinds("X _y foo Xs'"),
            vec![
                (Var, "X".to_owned()),
                (Var, "_y".to_owned()),
                (Atom, "foo".to_owned()),
                (Var, "Xs'".to_owned()),
            ]
        );
    }

    #[test]
    fn equation_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("f(X, 0) = g;"),
            vec![
                (Atom, "f".to_owned()),
                (Symbol, "(".to_owned()),
                (Var, "X".to_owned()),
                (Symbol, ",".to_owned()),
                (NumLit, "0".to_owned()),
                (Symbol, ")".to_owned()),
                (Symbol, "=".to_owned()),
                (Atom, "g".to_owned()),
                (Symbol, ";".to_owned()),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = tokenize("-- a comment\nX -- trailing\n");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_var());
    }

    #[test]
    fn unknown_character_is_an_error() {
        let file = Arc::new(File::new("<test>", "X = #"));
        let mut lex = Lex::new(file);
        assert!(lex.next().unwrap().is_ok());
        assert!(lex.next().unwrap().is_ok());
        let err = lex.next().unwrap().unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r###"
        unrecognizable character at <test>:1:5
        X = #
            ^
        "###);
    }

    #[test]
    fn line_and_column_are_one_based() {
        let file = File::new("<test>", "a\nbc\n");
        assert_eq!(file.line_column_at(0), (1, 1));
        assert_eq!(file.line_column_at(3), (2, 2));
        assert_eq!(file.line(2), "bc");
    }

    #[test]
    fn crlf_line_endings_are_not_part_of_the_line() {
        let file = File::new("<test>", "a\r\nbc\r\n");
        assert_eq!(file.line(1), "a");
        assert_eq!(file.line(2), "bc");
    }
}
