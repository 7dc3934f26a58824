use std::fmt;

use crate::token::{lookup_ident, Token, TokenKind};

/// Lexical error with the position of the offending byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl LexError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.line, self.column)
    }
}

impl std::error::Error for LexError {}

/// Byte cursor over the source. `prev` carries the kind of the last token
/// handed out; `/` only reads as division when it can close an operand
/// (`)`, `]`, identifier, integer), otherwise it opens a regex literal.
pub struct Lexer {
    input: Vec<u8>,
    position: usize,
    read_position: usize,
    ch: u8,
    prev: TokenKind,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut lexer = Self {
            input: input.as_bytes().to_vec(),
            position: 0,
            read_position: 0,
            ch: 0,
            prev: TokenKind::Eof,
            line: 1,
            column: 0,
        };
        lexer.read_char();
        lexer
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let tok = self.scan_token()?;
        self.prev = tok.kind;
        Ok(tok)
    }

    fn scan_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let (line, column) = (self.line, self.column);
        let tok = match self.ch {
            b'=' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Eq, "==", line, column)
                } else if self.peek_char() == b'>' {
                    self.read_char();
                    Token::new(TokenKind::FatArrow, "=>", line, column)
                } else {
                    Token::new(TokenKind::Assign, "=", line, column)
                }
            }
            b'!' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::NotEq, "!=", line, column)
                } else {
                    Token::new(TokenKind::Bang, "!", line, column)
                }
            }
            b'-' => {
                if self.peek_char() == b'>' {
                    self.read_char();
                    Token::new(TokenKind::Arrow, "->", line, column)
                } else {
                    Token::new(TokenKind::Minus, "-", line, column)
                }
            }
            b'<' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Lte, "<=", line, column)
                } else {
                    Token::new(TokenKind::Lt, "<", line, column)
                }
            }
            b'>' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Gte, ">=", line, column)
                } else {
                    Token::new(TokenKind::Gt, ">", line, column)
                }
            }
            b'|' => match self.peek_char() {
                b'>' => {
                    self.read_char();
                    Token::new(TokenKind::Pipe, "|>", line, column)
                }
                b'|' => {
                    self.read_char();
                    Token::new(TokenKind::Or, "||", line, column)
                }
                _ => {
                    self.read_char();
                    return Err(LexError::new("unsupported infix operator '|'", line, column));
                }
            },
            b'&' => {
                if self.peek_char() != b'&' {
                    self.read_char();
                    return Err(LexError::new("unsupported infix operator '&'", line, column));
                }
                self.read_char();
                Token::new(TokenKind::And, "&&", line, column)
            }
            b'/' => {
                if matches!(
                    self.prev,
                    TokenKind::Rparen | TokenKind::Rbracket | TokenKind::Ident | TokenKind::Int
                ) {
                    Token::new(TokenKind::Slash, "/", line, column)
                } else {
                    let literal = self.read_regex(b'/')?;
                    return Ok(Token::new(TokenKind::Regex, literal, line, column));
                }
            }
            b'~' => {
                let literal = self.read_regex(b'~')?;
                return Ok(Token::new(TokenKind::Regex, literal, line, column));
            }
            b'"' => {
                let literal = self.read_string()?;
                return Ok(Token::new(TokenKind::String, literal, line, column));
            }
            b'+' => Token::new(TokenKind::Plus, "+", line, column),
            b'*' => Token::new(TokenKind::Asterisk, "*", line, column),
            b'%' => Token::new(TokenKind::Mod, "%", line, column),
            b'.' => Token::new(TokenKind::Dot, ".", line, column),
            b',' => Token::new(TokenKind::Comma, ",", line, column),
            b';' => Token::new(TokenKind::Semicolon, ";", line, column),
            b':' => Token::new(TokenKind::Colon, ":", line, column),
            b'(' => Token::new(TokenKind::Lparen, "(", line, column),
            b')' => Token::new(TokenKind::Rparen, ")", line, column),
            b'{' => Token::new(TokenKind::Lbrace, "{", line, column),
            b'}' => Token::new(TokenKind::Rbrace, "}", line, column),
            b'[' => Token::new(TokenKind::Lbracket, "[", line, column),
            b']' => Token::new(TokenKind::Rbracket, "]", line, column),
            b'_' => Token::new(TokenKind::Underscore, "_", line, column),
            0 => Token::eof(line, column),
            ch if is_letter(ch) => {
                let ident = self.read_identifier();
                return Ok(Token::new(lookup_ident(&ident), ident, line, column));
            }
            ch if is_digit(ch) => {
                let number = self.read_number();
                return Ok(Token::new(TokenKind::Int, number, line, column));
            }
            ch => {
                self.read_char();
                return Err(LexError::new(
                    format!("illegal character {:?}", ch as char),
                    line,
                    column,
                ));
            }
        };

        self.read_char();
        Ok(tok)
    }

    fn read_char(&mut self) {
        if self.ch == b'\n' {
            self.line += 1;
            self.column = 0;
        }
        self.ch = if self.read_position >= self.input.len() {
            0
        } else {
            self.input[self.read_position]
        };
        self.position = self.read_position;
        self.read_position += 1;
        self.column += 1;
    }

    fn peek_char(&self) -> u8 {
        if self.read_position >= self.input.len() {
            0
        } else {
            self.input[self.read_position]
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, b' ' | b'\t' | b'\n' | b'\r') {
            self.read_char();
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while is_letter(self.ch) {
            self.read_char();
        }
        String::from_utf8_lossy(&self.input[start..self.position]).into_owned()
    }

    fn read_number(&mut self) -> String {
        let start = self.position;
        while is_digit(self.ch) {
            self.read_char();
        }
        String::from_utf8_lossy(&self.input[start..self.position]).into_owned()
    }

    /// Reads a `"`-delimited string, processing the escape set
    /// `\a \b \f \r \n \t \v`; any other escaped byte is preserved
    /// together with its backslash.
    fn read_string(&mut self) -> Result<String, LexError> {
        let (line, column) = (self.line, self.column);
        let mut buf: Vec<u8> = Vec::new();
        loop {
            self.read_char();
            match self.ch {
                0 => return Err(LexError::new("unterminated string literal", line, column)),
                b'"' => break,
                b'\\' => {
                    self.read_char();
                    match self.ch {
                        0 => {
                            return Err(LexError::new("unterminated string literal", line, column));
                        }
                        b'a' => buf.push(0x07),
                        b'b' => buf.push(0x08),
                        b'f' => buf.push(0x0C),
                        b'r' => buf.push(b'\r'),
                        b'n' => buf.push(b'\n'),
                        b't' => buf.push(b'\t'),
                        b'v' => buf.push(0x0B),
                        other => {
                            buf.push(b'\\');
                            buf.push(other);
                        }
                    }
                }
                ch => buf.push(ch),
            }
        }
        self.read_char();
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Reads a regex literal up to the matching unescaped `delim`,
    /// keeping the inner source byte-for-byte.
    fn read_regex(&mut self, delim: u8) -> Result<String, LexError> {
        let (line, column) = (self.line, self.column);
        let start = self.position + 1;
        loop {
            self.read_char();
            match self.ch {
                0 => return Err(LexError::new("unterminated regex literal", line, column)),
                b'\\' => {
                    self.read_char();
                    if self.ch == 0 {
                        return Err(LexError::new("unterminated regex literal", line, column));
                    }
                }
                ch if ch == delim => break,
                _ => {}
            }
        }
        let literal = String::from_utf8_lossy(&self.input[start..self.position]).into_owned();
        self.read_char();
        Ok(literal)
    }
}

fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_digit(ch: u8) -> bool {
    ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lexer failed");
            if tok.kind == TokenKind::Eof {
                break;
            }
            tokens.push((tok.kind, tok.literal));
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn test_next_token() {
        let input = r#"var five = 5;
konst add = fn(x, y) {
  x + y;
};
var result = add(five, 10);
!-*5;
5 < 10 > 5;
5 <= 10 >= 5;
jika (5 < 10) {
    pilih benar;
} atau {
    pilih salah;
}
10 == 10;
10 != 9;
a |> b;
a || b && c;
a % b;
nihil;
x => x;
[1,2];
{"foo": "bar"}
tiap k,v di xs { lanjut usai }
_
"#;
        let expected: Vec<(TokenKind, &str)> = vec![
            (TokenKind::Var, "var"),
            (TokenKind::Ident, "five"),
            (TokenKind::Assign, "="),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Konst, "konst"),
            (TokenKind::Ident, "add"),
            (TokenKind::Assign, "="),
            (TokenKind::Function, "fn"),
            (TokenKind::Lparen, "("),
            (TokenKind::Ident, "x"),
            (TokenKind::Comma, ","),
            (TokenKind::Ident, "y"),
            (TokenKind::Rparen, ")"),
            (TokenKind::Lbrace, "{"),
            (TokenKind::Ident, "x"),
            (TokenKind::Plus, "+"),
            (TokenKind::Ident, "y"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Rbrace, "}"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Var, "var"),
            (TokenKind::Ident, "result"),
            (TokenKind::Assign, "="),
            (TokenKind::Ident, "add"),
            (TokenKind::Lparen, "("),
            (TokenKind::Ident, "five"),
            (TokenKind::Comma, ","),
            (TokenKind::Int, "10"),
            (TokenKind::Rparen, ")"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Bang, "!"),
            (TokenKind::Minus, "-"),
            (TokenKind::Asterisk, "*"),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "5"),
            (TokenKind::Lt, "<"),
            (TokenKind::Int, "10"),
            (TokenKind::Gt, ">"),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "5"),
            (TokenKind::Lte, "<="),
            (TokenKind::Int, "10"),
            (TokenKind::Gte, ">="),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Jika, "jika"),
            (TokenKind::Lparen, "("),
            (TokenKind::Int, "5"),
            (TokenKind::Lt, "<"),
            (TokenKind::Int, "10"),
            (TokenKind::Rparen, ")"),
            (TokenKind::Lbrace, "{"),
            (TokenKind::Pilih, "pilih"),
            (TokenKind::Benar, "benar"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Rbrace, "}"),
            (TokenKind::Atau, "atau"),
            (TokenKind::Lbrace, "{"),
            (TokenKind::Pilih, "pilih"),
            (TokenKind::Salah, "salah"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Rbrace, "}"),
            (TokenKind::Int, "10"),
            (TokenKind::Eq, "=="),
            (TokenKind::Int, "10"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Int, "10"),
            (TokenKind::NotEq, "!="),
            (TokenKind::Int, "9"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Ident, "a"),
            (TokenKind::Pipe, "|>"),
            (TokenKind::Ident, "b"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Ident, "a"),
            (TokenKind::Or, "||"),
            (TokenKind::Ident, "b"),
            (TokenKind::And, "&&"),
            (TokenKind::Ident, "c"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Ident, "a"),
            (TokenKind::Mod, "%"),
            (TokenKind::Ident, "b"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Nihil, "nihil"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Ident, "x"),
            (TokenKind::FatArrow, "=>"),
            (TokenKind::Ident, "x"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Lbracket, "["),
            (TokenKind::Int, "1"),
            (TokenKind::Comma, ","),
            (TokenKind::Int, "2"),
            (TokenKind::Rbracket, "]"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Lbrace, "{"),
            (TokenKind::String, "foo"),
            (TokenKind::Colon, ":"),
            (TokenKind::String, "bar"),
            (TokenKind::Rbrace, "}"),
            (TokenKind::Tiap, "tiap"),
            (TokenKind::Ident, "k"),
            (TokenKind::Comma, ","),
            (TokenKind::Ident, "v"),
            (TokenKind::Di, "di"),
            (TokenKind::Ident, "xs"),
            (TokenKind::Lbrace, "{"),
            (TokenKind::Lanjut, "lanjut"),
            (TokenKind::Usai, "usai"),
            (TokenKind::Rbrace, "}"),
            (TokenKind::Underscore, "_"),
        ];

        let got = lex(input);
        assert_eq!(got.len(), expected.len(), "token count mismatch: {:?}", got);
        for (i, ((kind, literal), (want_kind, want_literal))) in
            got.iter().zip(expected.iter()).enumerate()
        {
            assert_eq!(kind, want_kind, "token {} kind", i);
            assert_eq!(literal, want_literal, "token {} literal", i);
        }
    }

    #[test]
    fn test_slash_is_division_after_operand() {
        assert_eq!(
            kinds("(a+c) / b"),
            vec![
                TokenKind::Lparen,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Rparen,
                TokenKind::Slash,
                TokenKind::Ident,
            ]
        );
        assert_eq!(
            kinds("a[3] / 2"),
            vec![
                TokenKind::Ident,
                TokenKind::Lbracket,
                TokenKind::Int,
                TokenKind::Rbracket,
                TokenKind::Slash,
                TokenKind::Int,
            ]
        );
        assert_eq!(kinds("6 / 2"), vec![TokenKind::Int, TokenKind::Slash, TokenKind::Int]);
    }

    #[test]
    fn test_slash_opens_regex_elsewhere() {
        let tokens = lex("/[a-z]+/");
        assert_eq!(tokens, vec![(TokenKind::Regex, "[a-z]+".to_string())]);

        let tokens = lex("var re = /ab\\/cd/");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Var, "var".to_string()),
                (TokenKind::Ident, "re".to_string()),
                (TokenKind::Assign, "=".to_string()),
                (TokenKind::Regex, "ab\\/cd".to_string()),
            ]
        );
    }

    #[test]
    fn test_tilde_always_opens_regex() {
        let tokens = lex(r"a ~\d+(\w)+.*$~");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Ident, "a".to_string()),
                (TokenKind::Regex, r"\d+(\w)+.*$".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(lex(r#""a\nb""#), vec![(TokenKind::String, "a\nb".to_string())]);
        assert_eq!(lex(r#""a\tb""#), vec![(TokenKind::String, "a\tb".to_string())]);
        assert_eq!(
            lex(r#""bel\a vt\v ff\f""#),
            vec![(TokenKind::String, "bel\x07 vt\x0B ff\x0C".to_string())]
        );
        // Unknown escapes keep the backslash.
        assert_eq!(lex(r#""a\"b""#), vec![(TokenKind::String, "a\\\"b".to_string())]);
        assert_eq!(lex(r#""a\qb""#), vec![(TokenKind::String, "a\\qb".to_string())]);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("unterminated string"), "{}", err);
    }

    #[test]
    fn test_lone_ampersand_is_error() {
        let mut lexer = Lexer::new("a & b");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ident);
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("unsupported infix operator"), "{}", err);
    }

    #[test]
    fn test_illegal_character() {
        let mut lexer = Lexer::new("?");
        let err = lexer.next_token().unwrap_err();
        assert!(err.message.contains("illegal character"), "{}", err);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let mut lexer = Lexer::new("var x\n  = 5");
        let var = lexer.next_token().unwrap();
        assert_eq!((var.line, var.column), (1, 1));
        let x = lexer.next_token().unwrap();
        assert_eq!((x.line, x.column), (1, 5));
        let assign = lexer.next_token().unwrap();
        assert_eq!((assign.line, assign.column), (2, 3));
        let five = lexer.next_token().unwrap();
        assert_eq!((five.line, five.column), (2, 5));
    }

    #[test]
    fn test_underscore_is_wildcard() {
        assert_eq!(kinds("_"), vec![TokenKind::Underscore]);
        // A leading underscore does not start an identifier.
        assert_eq!(kinds("_x"), vec![TokenKind::Underscore, TokenKind::Ident]);
        // Interior underscores are identifier letters.
        assert_eq!(lex("a_b"), vec![(TokenKind::Ident, "a_b".to_string())]);
    }

    #[test]
    fn test_identifiers_have_no_digits() {
        assert_eq!(
            lex("abc123"),
            vec![
                (TokenKind::Ident, "abc".to_string()),
                (TokenKind::Int, "123".to_string()),
            ]
        );
    }
}
