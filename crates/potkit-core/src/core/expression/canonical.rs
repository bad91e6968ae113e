//! Structural normal form of an expression, used for equality.
//!
//! The text is parsed into a small operator tree in which sums and products
//! are flattened and their operands sorted, numeric operands are folded,
//! subtraction becomes addition of a negated term, and division becomes
//! multiplication by a reciprocal. Redundant parentheses and operand order
//! therefore do not affect the result; anything beyond that does.

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Symbol(String),
    Call(String, Vec<Node>),
    Sum(Vec<Node>),
    Product(Vec<Node>),
    Inv(Box<Node>),
    Pow(Box<Node>, Box<Node>),
}

#[derive(Debug, Clone, Copy)]
enum Assoc {
    Sum,
    Product,
}

/// Normal form of `text`, or `None` if it uses syntax outside plain
/// arithmetic, powers, and function calls.
///
/// `text` is expected to spell powers as `^`.
pub(super) fn canonical_form(text: &str) -> Option<String> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
    };
    let node = parser.expr()?;
    (parser.pos == parser.tokens.len()).then(|| render(&node))
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let token = match chars[i] {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(literal.parse().ok()?));
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                continue;
            }
            _ => return None,
        };
        tokens.push(token);
        i += 1;
    }

    Some(tokens)
}

// expr  := term (('+' | '-') term)*
// term  := unary (('*' | '/') unary)*
// unary := ('+' | '-') unary | power
// power := atom ('^' unary)?
// atom  := NUMBER | IDENT ('(' expr (',' expr)* ')')? | '(' expr ')'
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn eat(&mut self, token: &Token) -> bool {
        if self.tokens.get(self.pos) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Option<Node> {
        let mut terms = vec![self.term()?];
        loop {
            if self.eat(&Token::Plus) {
                terms.push(self.term()?);
            } else if self.eat(&Token::Minus) {
                terms.push(negate(self.term()?));
            } else {
                break;
            }
        }
        Some(associative(terms, Assoc::Sum))
    }

    fn term(&mut self) -> Option<Node> {
        let mut factors = vec![self.unary()?];
        loop {
            if self.eat(&Token::Star) {
                factors.push(self.unary()?);
            } else if self.eat(&Token::Slash) {
                factors.push(invert(self.unary()?));
            } else {
                break;
            }
        }
        Some(associative(factors, Assoc::Product))
    }

    fn unary(&mut self) -> Option<Node> {
        if self.eat(&Token::Minus) {
            return Some(negate(self.unary()?));
        }
        if self.eat(&Token::Plus) {
            return self.unary();
        }
        self.power()
    }

    fn power(&mut self) -> Option<Node> {
        let base = self.atom()?;
        if self.eat(&Token::Caret) {
            let exponent = self.unary()?;
            return Some(Node::Pow(Box::new(base), Box::new(exponent)));
        }
        Some(base)
    }

    fn atom(&mut self) -> Option<Node> {
        let token = self.tokens.get(self.pos)?.clone();
        self.pos += 1;
        match token {
            Token::Number(value) => Some(Node::Number(value)),
            Token::Ident(name) if self.eat(&Token::LParen) => {
                let mut args = vec![self.expr()?];
                while self.eat(&Token::Comma) {
                    args.push(self.expr()?);
                }
                self.eat(&Token::RParen).then_some(Node::Call(name, args))
            }
            Token::Ident(name) => Some(Node::Symbol(name)),
            Token::LParen => {
                let inner = self.expr()?;
                self.eat(&Token::RParen).then_some(inner)
            }
            _ => None,
        }
    }
}

fn negate(node: Node) -> Node {
    match node {
        Node::Number(value) => Node::Number(-value),
        other => associative(vec![Node::Number(-1.0), other], Assoc::Product),
    }
}

fn invert(node: Node) -> Node {
    match node {
        Node::Number(value) if value != 0.0 => Node::Number(1.0 / value),
        Node::Inv(inner) => *inner,
        Node::Product(factors) => {
            associative(factors.into_iter().map(invert).collect(), Assoc::Product)
        }
        other => Node::Inv(Box::new(other)),
    }
}

/// Flattens nested operands of the same operator and folds numeric operands
/// into one, dropping it when it is the identity.
fn associative(items: Vec<Node>, assoc: Assoc) -> Node {
    let mut numbers = Vec::new();
    let mut operands = Vec::new();

    for item in items {
        let nested = match (assoc, item) {
            (Assoc::Sum, Node::Sum(inner)) | (Assoc::Product, Node::Product(inner)) => inner,
            (_, other) => vec![other],
        };
        for node in nested {
            match node {
                Node::Number(value) => numbers.push(value),
                other => operands.push(other),
            }
        }
    }

    numbers.sort_by(f64::total_cmp);
    let (constant, identity) = match assoc {
        Assoc::Sum => (numbers.iter().sum::<f64>(), 0.0),
        Assoc::Product => (numbers.iter().product::<f64>(), 1.0),
    };
    if constant != identity || operands.is_empty() {
        operands.push(Node::Number(constant));
    }

    match (operands.len(), assoc) {
        (1, _) => operands.remove(0),
        (_, Assoc::Sum) => Node::Sum(operands),
        (_, Assoc::Product) => Node::Product(operands),
    }
}

fn render(node: &Node) -> String {
    match node {
        Node::Number(value) if *value == 0.0 => "0.0".to_string(),
        Node::Number(value) => format!("{:?}", value),
        Node::Symbol(name) => name.clone(),
        Node::Call(name, args) => {
            let args: Vec<String> = args.iter().map(render).collect();
            format!("{}({})", name, args.join(","))
        }
        Node::Sum(terms) => render_unordered("+", terms),
        Node::Product(factors) => render_unordered("*", factors),
        Node::Inv(inner) => format!("(inv {})", render(inner)),
        Node::Pow(base, exponent) => format!("(^ {} {})", render(base), render(exponent)),
    }
}

fn render_unordered(op: &str, operands: &[Node]) -> String {
    let mut parts: Vec<String> = operands.iter().map(render).collect();
    parts.sort();
    format!("({} {})", op, parts.join(" "))
}
