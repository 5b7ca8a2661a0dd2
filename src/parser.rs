/*!

Tokenization and NFA construction.

The tokenizer turns a pattern into a stream of value-type tokens with
implicit concatenation made explicit. The builder then evaluates the stream
with a shunting-yard pass: an operand stack of NFA fragments and an operator
stack of tokens, with each operator applied to fragments as it is popped.

The scanner tracks whether the previously emitted token closed an operand (a
literal run, a class, `)`, or a postfix operator); a concat token is inserted
before a literal, class, or `(` exactly when it did. A literal run followed
by a postfix operator is split so the operator binds only the run's final
character: `ab*` means `a·(b*)`, never `(ab)*`.

*/

use smallvec::SmallVec;

use crate::error::CompileError;
use crate::nfa::NondeterministicAutomaton;
use crate::Index32;


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Operator {
  Alternate, //< `|`
  Concat,    //< implicit, inserted by the tokenizer
  Plus,      //< `+`
  Optional,  //< `?`
  Star,      //< `*`
}


impl Operator {

  pub fn priority(&self) -> i8 {
    match self {
      Operator::Alternate => 0,
      Operator::Concat    => 1,

      | Operator::Plus
      | Operator::Optional
      | Operator::Star => 2,
    }
  }


  pub fn operand_count(&self) -> usize {
    match self {
      | Operator::Alternate
      | Operator::Concat => 2,

      | Operator::Plus
      | Operator::Optional
      | Operator::Star => 1,
    }
  }

}


#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TokenKind {
  Literal(String),    //< run of ordinary characters
  Selector(String),   //< raw class body, brackets stripped
  Operator(Operator),
  LeftParen,
  RightParen,
}


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Token {
  pub kind : TokenKind,
  pub idx  : Index32,   //< position of the token in the pattern
}


impl Token {

  fn new(kind: TokenKind, idx: usize) -> Token {
    Token { kind, idx: idx as Index32 }
  }


  /// Debug rendering used by the token-stream dump.
  pub fn serialize(&self) -> String {
    match &self.kind {
      TokenKind::Literal(s)  => format!("PLAIN_STRING\"{}\"", s),
      TokenKind::Selector(s) => format!("CHAR_SELECTOR\"{}\"", s),

      TokenKind::Operator(Operator::Concat)    => String::from("CONNECT"),
      TokenKind::Operator(Operator::Alternate) => String::from("OPERATOR'|'"),
      TokenKind::Operator(Operator::Plus)      => String::from("OPERATOR'+'"),
      TokenKind::Operator(Operator::Optional)  => String::from("OPERATOR'?'"),
      TokenKind::Operator(Operator::Star)      => String::from("OPERATOR'*'"),

      TokenKind::LeftParen  => String::from("LEFT_BRACKET"),
      TokenKind::RightParen => String::from("RIGHT_BRACKET"),
    }
  }

}


fn is_operator(c: u8) -> bool {
  matches!(c, b'(' | b')' | b'|' | b'*' | b'+' | b'?')
}


/// Precedence of an operator character in the source text. Parens are
/// sentinels below every real operator.
fn priority_of(c: u8) -> i8 {
  match c {
    b'(' | b')' => -1,
    b'|' => 0,
    _ => 2,
  }
}


fn operator_token(c: u8, idx: usize) -> Token {
  let kind = match c {
    b'(' => TokenKind::LeftParen,
    b')' => TokenKind::RightParen,
    b'+' => TokenKind::Operator(Operator::Plus),
    b'?' => TokenKind::Operator(Operator::Optional),
    b'*' => TokenKind::Operator(Operator::Star),
    _    => TokenKind::Operator(Operator::Alternate),
  };
  Token::new(kind, idx)
}


fn literal_token(sv: &[u8], from: usize, to: usize) -> Token {
  Token::new(
    TokenKind::Literal(String::from_utf8_lossy(&sv[from..to]).into_owned()),
    from,
  )
}


fn concat_token(idx: usize) -> Token {
  Token::new(TokenKind::Operator(Operator::Concat), idx)
}


/// Scans the pattern into tokens, inserting implicit concatenation.
pub fn tokenize(pattern: &str) -> Result<Vec<Token>, CompileError> {
  let sv = pattern.as_bytes();
  let mut tokens: Vec<Token> = Vec::new();

  // True while the scanner expects an operand to open, i.e. at the start of
  // the pattern and immediately after `(` or `|`.
  let mut reading_string = true;

  let mut from_index = 0;
  let mut to_index = 0;
  while to_index < sv.len() {
    let c = sv[to_index];

    if is_operator(c) {
      if from_index != to_index {
        tokens.push(literal_token(sv, from_index, to_index));
        if c == b'(' {
          tokens.push(concat_token(to_index));
        }
      } else if c == b'(' && !reading_string {
        tokens.push(concat_token(to_index));
      }
      tokens.push(operator_token(c, to_index));
      from_index = to_index + 1;
      reading_string = matches!(c, b'(' | b'|');
      to_index += 1;
      continue;
    }

    // A postfix operator binds only the final character of a pending run.
    if from_index < to_index
        && to_index + 1 < sv.len()
        && is_operator(sv[to_index + 1])
        && priority_of(sv[to_index + 1]) > Operator::Concat.priority()
    {
      tokens.push(literal_token(sv, from_index, to_index));
      tokens.push(concat_token(to_index));
      tokens.push(literal_token(sv, to_index, to_index + 1));
      from_index = to_index + 1;
      reading_string = true;
      to_index += 1;
      continue;
    }

    if !reading_string {
      tokens.push(concat_token(to_index));
    }
    reading_string = true;

    if c == b'[' {
      if from_index != to_index {
        tokens.push(literal_token(sv, from_index, to_index));
        tokens.push(concat_token(to_index));
      }

      // Find the balancing bracket, skipping `\x` pairs.
      let left = to_index;
      let mut right = to_index;
      while right < sv.len() && sv[right] != b']' {
        if sv[right] == b'\\' {
          right += 1;
        }
        right += 1;
      }
      if right >= sv.len() {
        return Err(CompileError::UnterminatedClass(left as Index32));
      }
      if right == left + 1 {
        return Err(CompileError::EmptyClass(left as Index32));
      }

      tokens.push(Token::new(
        TokenKind::Selector(String::from_utf8_lossy(&sv[left + 1..right]).into_owned()),
        left,
      ));
      from_index = right + 1;
      to_index = right + 1;
      reading_string = false;
      continue;
    }

    to_index += 1;
  }

  if from_index != to_index {
    tokens.push(literal_token(sv, from_index, to_index));
  }

  Ok(tokens)
}


/// Evaluates the token stream into a single NFA fragment whose accept set is
/// the final match condition. `end_idx` locates errors detected at the end
/// of the stream.
pub fn build_nfa(
  tokens: &[Token],
  end_idx: Index32,
) -> Result<NondeterministicAutomaton, CompileError> {
  let mut operands: Vec<NondeterministicAutomaton> = Vec::new();
  let mut opers: SmallVec<[&Token; 8]> = SmallVec::new();

  for token in tokens {
    match &token.kind {
      TokenKind::Literal(s) => {
        operands.push(NondeterministicAutomaton::string_automaton(s));
      }

      TokenKind::Selector(body) => {
        operands.push(NondeterministicAutomaton::selector_automaton(body));
      }

      TokenKind::Operator(op) => {
        loop {
          let apply_now = match opers.last() {
            Some(top) => match &top.kind {
              TokenKind::Operator(top_op) => top_op.priority() > op.priority(),
              _ => false,
            },
            None => false,
          };
          if !apply_now {
            break;
          }
          if let Some(top) = opers.pop() {
            if let TokenKind::Operator(top_op) = top.kind {
              apply_operator(top_op, top.idx, &mut operands)?;
            }
          }
        }
        opers.push(token);
      }

      TokenKind::LeftParen => {
        opers.push(token);
      }

      TokenKind::RightParen => {
        loop {
          let apply_now = match opers.last() {
            Some(top) => matches!(top.kind, TokenKind::Operator(_)),
            None => false,
          };
          if !apply_now {
            break;
          }
          if let Some(top) = opers.pop() {
            if let TokenKind::Operator(top_op) = top.kind {
              apply_operator(top_op, top.idx, &mut operands)?;
            }
          }
        }
        match opers.pop() {
          Some(top) if matches!(top.kind, TokenKind::LeftParen) => {}
          _ => return Err(CompileError::UnbalancedParens(token.idx)),
        }
      }
    }
  }

  while let Some(top) = opers.pop() {
    match top.kind {
      TokenKind::Operator(op) => apply_operator(op, top.idx, &mut operands)?,
      _ => return Err(CompileError::UnbalancedParens(top.idx)),
    }
  }

  // A structurally empty group such as `()` leaves the operand stack short.
  match operands.pop() {
    Some(automaton) if operands.is_empty() => Ok(automaton),
    _ => Err(CompileError::OperatorArity(end_idx)),
  }
}


/// Pop-and-apply: postfix operators rewrite the top fragment in place,
/// binary operators replace the top two with their combination.
fn apply_operator(
  op: Operator,
  idx: Index32,
  operands: &mut Vec<NondeterministicAutomaton>,
) -> Result<(), CompileError> {
  match op {
    Operator::Plus => {
      match operands.last_mut() {
        Some(operand) => operand.refactor_to_repetitive(),
        None => return Err(CompileError::OperatorArity(idx)),
      }
    }

    Operator::Optional => {
      match operands.last_mut() {
        Some(operand) => operand.refactor_to_skippable(),
        None => return Err(CompileError::OperatorArity(idx)),
      }
    }

    Operator::Star => {
      match operands.last_mut() {
        Some(operand) => {
          operand.refactor_to_repetitive();
          operand.refactor_to_skippable();
        }
        None => return Err(CompileError::OperatorArity(idx)),
      }
    }

    Operator::Concat => {
      let rhs = match operands.pop() {
        Some(rhs) => rhs,
        None => return Err(CompileError::OperatorArity(idx)),
      };
      match operands.last_mut() {
        Some(lhs) => lhs.connect(rhs),
        None => return Err(CompileError::OperatorArity(idx)),
      }
    }

    Operator::Alternate => {
      let rhs = match operands.pop() {
        Some(rhs) => rhs,
        None => return Err(CompileError::OperatorArity(idx)),
      };
      match operands.last_mut() {
        Some(lhs) => lhs.make_origin_branch(rhs),
        None => return Err(CompileError::OperatorArity(idx)),
      }
    }
  }

  Ok(())
}


#[cfg(test)]
mod test {
  use super::*;

  fn token_dump(pattern: &str) -> Vec<String> {
    tokenize(pattern)
        .expect("pattern should tokenize")
        .iter()
        .map(Token::serialize)
        .collect()
  }

  #[test]
  fn literal_run_stays_whole() {
    assert_eq!(token_dump("ab"), vec![r#"PLAIN_STRING"ab""#]);
  }

  #[test]
  fn postfix_splits_run() {
    assert_eq!(
      token_dump("ab*"),
      vec![r#"PLAIN_STRING"a""#, "CONNECT", r#"PLAIN_STRING"b""#, "OPERATOR'*'"]
    );
  }

  #[test]
  fn group_after_postfix_concats() {
    assert_eq!(
      token_dump("a*(b)"),
      vec![
        r#"PLAIN_STRING"a""#,
        "OPERATOR'*'",
        "CONNECT",
        "LEFT_BRACKET",
        r#"PLAIN_STRING"b""#,
        "RIGHT_BRACKET"
      ]
    );
  }

  #[test]
  fn group_between_literals_concats() {
    assert_eq!(
      token_dump("a(b)c"),
      vec![
        r#"PLAIN_STRING"a""#,
        "CONNECT",
        "LEFT_BRACKET",
        r#"PLAIN_STRING"b""#,
        "RIGHT_BRACKET",
        "CONNECT",
        r#"PLAIN_STRING"c""#
      ]
    );
  }

  #[test]
  fn class_adjacency_concats() {
    assert_eq!(
      token_dump("a[bc]d"),
      vec![
        r#"PLAIN_STRING"a""#,
        "CONNECT",
        r#"CHAR_SELECTOR"bc""#,
        "CONNECT",
        r#"PLAIN_STRING"d""#
      ]
    );
  }

  #[test]
  fn class_then_postfix_does_not_concat() {
    assert_eq!(token_dump("[ab]*"), vec![r#"CHAR_SELECTOR"ab""#, "OPERATOR'*'"]);
  }

  #[test]
  fn alternation_keeps_operands_apart() {
    assert_eq!(
      token_dump("a|b"),
      vec![r#"PLAIN_STRING"a""#, "OPERATOR'|'", r#"PLAIN_STRING"b""#]
    );
  }

  #[test]
  fn full_pipeline_token_stream() {
    assert_eq!(
      token_dump("a(b|c)*d"),
      vec![
        r#"PLAIN_STRING"a""#,
        "CONNECT",
        "LEFT_BRACKET",
        r#"PLAIN_STRING"b""#,
        "OPERATOR'|'",
        r#"PLAIN_STRING"c""#,
        "RIGHT_BRACKET",
        "OPERATOR'*'",
        "CONNECT",
        r#"PLAIN_STRING"d""#
      ]
    );
  }

  #[test]
  fn class_scan_skips_escaped_bracket() {
    assert_eq!(token_dump(r"[\]]"), vec![r#"CHAR_SELECTOR"\]""#]);
  }

  #[test]
  fn unterminated_class() {
    assert_eq!(tokenize("[ab"), Err(CompileError::UnterminatedClass(0)));
    assert_eq!(tokenize("a[b"), Err(CompileError::UnterminatedClass(1)));
  }

  #[test]
  fn empty_class() {
    assert_eq!(tokenize("[]"), Err(CompileError::EmptyClass(0)));
  }

  #[test]
  fn token_positions() {
    let tokens = tokenize("ab|c").expect("pattern should tokenize");
    assert_eq!(tokens[0].idx, 0);
    assert_eq!(tokens[1].idx, 2);
    assert_eq!(tokens[2].idx, 3);
  }

  #[test]
  fn surplus_right_paren() {
    let tokens = tokenize(")").expect("pattern should tokenize");
    assert_eq!(
      build_nfa(&tokens, 1),
      Err(CompileError::UnbalancedParens(0))
    );
  }

  #[test]
  fn leftover_left_paren() {
    let tokens = tokenize("(a").expect("pattern should tokenize");
    assert_eq!(
      build_nfa(&tokens, 2),
      Err(CompileError::UnbalancedParens(0))
    );
  }

  #[test]
  fn leading_postfix_has_no_operand() {
    let tokens = tokenize("*a").expect("pattern should tokenize");
    assert_eq!(build_nfa(&tokens, 2), Err(CompileError::OperatorArity(0)));
  }

  #[test]
  fn doubled_alternation_is_short_an_operand() {
    let tokens = tokenize("a||b").expect("pattern should tokenize");
    assert!(matches!(
      build_nfa(&tokens, 4),
      Err(CompileError::OperatorArity(_))
    ));
  }

  #[test]
  fn empty_group_fails() {
    let tokens = tokenize("()").expect("pattern should tokenize");
    assert!(matches!(
      build_nfa(&tokens, 2),
      Err(CompileError::OperatorArity(_))
    ));
  }
}
