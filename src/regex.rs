/*!

The compiled-pattern surface.

A [`Regex`] holds the token stream and the ε-NFA built from one pattern; the
minimized DFA is materialized on first use and cached behind a one-shot
initialization cell, after which the value is immutable and safe to share
across threads. A [`MultiRegex`] compiles several numbered patterns into one
automaton by branching each pattern's NFA off a common start state and
tagging its accept states with the pattern id; classification is then a
single DFA walk that reports the mark set of the final state.

*/

use std::time::Duration;

use once_cell::sync::OnceCell;
use quanta::Clock;

use crate::character::Char;
use crate::dfa::DeterministicAutomaton;
use crate::error::CompileError;
use crate::nfa::NondeterministicAutomaton;
use crate::parser::{build_nfa, tokenize, Token};
use crate::{Index32, MarkSet, PatternId32};


/// Compiles a single pattern. Equivalent to [`Regex::compile`].
pub fn compile(pattern: &str) -> Result<Regex, CompileError> {
  Regex::compile(pattern)
}


#[derive(Debug)]
pub struct Regex {
  tokens       : Vec<Token>,
  atm          : NondeterministicAutomaton,
  dfa          : OnceCell<DeterministicAutomaton>, //< minimized DFA, built on first use
  compile_time : Duration,                         //< tokenize + NFA construction
}


impl Regex {

  pub fn compile(pattern: &str) -> Result<Regex, CompileError> {
    let clock = Clock::new();
    let start_time = clock.start();

    let tokens = tokenize(pattern)?;
    if tokens.is_empty() {
      return Err(CompileError::EmptyPattern(0));
    }
    let atm = build_nfa(&tokens, pattern.len() as Index32)?;

    let compile_time = clock.delta(start_time, clock.end());

    Ok(Regex {
      tokens,
      atm,
      dfa: OnceCell::new(),
      compile_time,
    })
  }


  /// Whole-string acceptance. Θ(|input|): one table lookup per character,
  /// no backtracking.
  pub fn is_match(&self, input: &str) -> bool {
    let dfa = self.dfa();

    let mut s = dfa.start_state();
    for c in input.bytes() {
      s = dfa.next_state(s, Char(c));
    }

    dfa.is_stop_state(s)
  }


  /// Debug view of the token stream.
  pub fn tokens(&self) -> Vec<String> {
    self.tokens.iter().map(Token::serialize).collect()
  }


  pub fn nfa(&self) -> &NondeterministicAutomaton {
    &self.atm
  }


  /// The minimized DFA, built on first access.
  pub fn dfa(&self) -> &DeterministicAutomaton {
    self.dfa.get_or_init(|| {
      let mut dfa = DeterministicAutomaton::from_nondeterministic(&self.atm);
      dfa.simplify();
      dfa
    })
  }


  pub fn compile_time(&self) -> Duration {
    self.compile_time
  }

}


#[derive(Debug)]
pub struct MultiRegex {
  atm           : NondeterministicAutomaton,
  dfa           : OnceCell<DeterministicAutomaton>, //< minimized multi-DFA, built on first use
  pattern_count : usize,
}


impl MultiRegex {

  /// Compiles every `(id, pattern)` pair into one automaton. Duplicate ids
  /// are permitted; their mark sets union.
  pub fn compile(patterns: &[(PatternId32, &str)]) -> Result<MultiRegex, CompileError> {
    let mut atm = NondeterministicAutomaton::new();

    for &(id, pattern) in patterns {
      let tokens = tokenize(pattern)?;
      if tokens.is_empty() {
        return Err(CompileError::EmptyPattern(0));
      }
      let branch = build_nfa(&tokens, pattern.len() as Index32)?;

      let origin = atm.start_single_state();
      let stops = atm.add_automaton(origin, branch);
      for s in stops {
        atm.mark_stop_state(s, id);
      }
    }

    Ok(MultiRegex {
      atm,
      dfa: OnceCell::new(),
      pattern_count: patterns.len(),
    })
  }


  /// The ids of every pattern whose language contains `input`; empty when
  /// none matches.
  pub fn classify(&self, input: &str) -> MarkSet {
    let dfa = self.dfa();

    let mut s = dfa.start_state();
    for c in input.bytes() {
      s = dfa.next_state(s, Char(c));
    }

    match dfa.is_stop_state(s) {
      true  => dfa.marks_of(s),
      false => MarkSet::new(),
    }
  }


  pub fn nfa(&self) -> &NondeterministicAutomaton {
    &self.atm
  }


  pub fn dfa(&self) -> &DeterministicAutomaton {
    self.dfa.get_or_init(|| {
      let mut dfa = DeterministicAutomaton::from_nondeterministic(&self.atm);
      dfa.simplify();
      dfa
    })
  }


  pub fn pattern_count(&self) -> usize {
    self.pattern_count
  }

}


#[cfg(test)]
mod test {
  use super::*;

  fn marks(multi: &MultiRegex, input: &str) -> Vec<PatternId32> {
    multi.classify(input).iter().copied().collect()
  }

  #[test]
  fn grouped_alternation_under_star() {
    let regex = Regex::compile("a(b|c)*d").expect("pattern should compile");
    assert!(regex.is_match("ad"));
    assert!(regex.is_match("abd"));
    assert!(regex.is_match("acccbbd"));
    assert!(!regex.is_match("abc"));
    assert!(!regex.is_match(""));
    assert!(!regex.is_match("aabd"));
  }

  #[test]
  fn classes_with_counted_tail() {
    let regex = Regex::compile("[a-z]+[0-9]?").expect("pattern should compile");
    assert!(regex.is_match("hello"));
    assert!(regex.is_match("hi9"));
    assert!(!regex.is_match(""));
    assert!(!regex.is_match("9hi"));
    assert!(!regex.is_match("hello99"));
  }

  #[test]
  fn negated_class() {
    let regex = Regex::compile("[^abc]+").expect("pattern should compile");
    assert!(regex.is_match("xyz"));
    assert!(regex.is_match("d"));
    assert!(!regex.is_match(""));
    assert!(!regex.is_match("a"));
    assert!(!regex.is_match("abc"));
    assert!(!regex.is_match("xay"));
  }

  #[test]
  fn repeated_group() {
    let regex = Regex::compile("(ab)+").expect("pattern should compile");
    assert!(regex.is_match("ab"));
    assert!(regex.is_match("abab"));
    assert!(!regex.is_match("a"));
    assert!(!regex.is_match("aba"));
    assert!(!regex.is_match(""));
  }

  #[test]
  fn escaped_dash_in_class() {
    let regex = Regex::compile(r"[a\-b]").expect("pattern should compile");
    assert!(regex.is_match("a"));
    assert!(regex.is_match("-"));
    assert!(regex.is_match("b"));
    assert!(!regex.is_match("c"));
    assert!(!regex.is_match(""));
    assert!(!regex.is_match("ab"));
  }

  #[test]
  fn kleene_identities() {
    let star = Regex::compile("a*").expect("pattern should compile");
    assert!(star.is_match(""));
    assert!(star.is_match("aaa"));

    let plus = Regex::compile("a+").expect("pattern should compile");
    assert!(!plus.is_match(""));
    assert!(plus.is_match("a"));

    let optional = Regex::compile("a?").expect("pattern should compile");
    assert!(optional.is_match(""));
    assert!(optional.is_match("a"));
    assert!(!optional.is_match("aa"));
  }

  #[test]
  fn alternation_is_commutative() {
    let left = Regex::compile("(a|b)").expect("pattern should compile");
    let right = Regex::compile("(b|a)").expect("pattern should compile");
    for input in ["", "a", "b", "ab", "ba", "c"].iter() {
      assert_eq!(left.is_match(input), right.is_match(input), "input {:?}", input);
    }
  }

  #[test]
  fn classifier_reports_every_match() {
    let multi = MultiRegex::compile(&[(0, "if"), (1, "[a-z]+"), (2, "[a-z0-9]+")])
        .expect("patterns should compile");

    assert_eq!(marks(&multi, "if"), vec![0, 1, 2]);
    assert_eq!(marks(&multi, "foo"), vec![1, 2]);
    assert_eq!(marks(&multi, "x1"), vec![2]);
    assert_eq!(marks(&multi, "42"), vec![2]);
    assert_eq!(marks(&multi, "Zq"), Vec::<PatternId32>::new());
    assert_eq!(marks(&multi, ""), Vec::<PatternId32>::new());
  }

  #[test]
  fn classifier_with_identifier_patterns() {
    // A lexer-shaped pattern set: keywords, identifiers, identifiers with
    // trailing digits.
    let multi = MultiRegex::compile(&[(0, "if"), (1, "[a-z]+"), (2, "[a-z][a-z0-9]*")])
        .expect("patterns should compile");

    assert_eq!(marks(&multi, "if"), vec![0, 1, 2]);
    assert_eq!(marks(&multi, "foo"), vec![1, 2]);
    assert_eq!(marks(&multi, "x1"), vec![2]);
    assert_eq!(marks(&multi, "42"), Vec::<PatternId32>::new());
  }

  #[test]
  fn classifier_unions_duplicate_ids() {
    let multi = MultiRegex::compile(&[(7, "a"), (7, "b")]).expect("patterns should compile");
    assert_eq!(marks(&multi, "a"), vec![7]);
    assert_eq!(marks(&multi, "b"), vec![7]);
    assert_eq!(marks(&multi, "c"), Vec::<PatternId32>::new());
  }

  #[test]
  fn classify_agrees_with_single_compiles() {
    let patterns: [(PatternId32, &str); 3] = [(0, "a(b|c)*d"), (1, "[a-z]+"), (2, "(ab)+")];
    let multi = MultiRegex::compile(&patterns).expect("patterns should compile");

    for input in ["", "ad", "abd", "ab", "abab", "hello", "x1", "abc"].iter() {
      let classified = multi.classify(input);
      for &(id, pattern) in patterns.iter() {
        let single = Regex::compile(pattern).expect("pattern should compile");
        assert_eq!(
          single.is_match(input),
          classified.contains(&id),
          "pattern {:?} on input {:?}",
          pattern,
          input
        );
      }
    }
  }

  #[test]
  fn token_dump_vocabulary() {
    let regex = Regex::compile("a[bc]*").expect("pattern should compile");
    assert_eq!(
      regex.tokens(),
      vec![r#"PLAIN_STRING"a""#, "CONNECT", r#"CHAR_SELECTOR"bc""#, "OPERATOR'*'"]
    );
  }

  #[test]
  fn compile_errors() {
    assert_eq!(Regex::compile("").unwrap_err(), CompileError::EmptyPattern(0));
    assert_eq!(Regex::compile("[ab").unwrap_err(), CompileError::UnterminatedClass(0));
    assert_eq!(Regex::compile("[]").unwrap_err(), CompileError::EmptyClass(0));
    assert_eq!(Regex::compile("(a").unwrap_err(), CompileError::UnbalancedParens(0));
    assert_eq!(Regex::compile("*a").unwrap_err(), CompileError::OperatorArity(0));
  }

  #[test]
  fn dfa_is_memoized() {
    let regex = Regex::compile("a|b").expect("pattern should compile");
    let first = regex.dfa() as *const DeterministicAutomaton;
    assert!(regex.is_match("a"));
    let second = regex.dfa() as *const DeterministicAutomaton;
    assert_eq!(first, second);
  }

  #[test]
  fn matcher_ignores_unprintable_input() {
    let regex = Regex::compile("a*").expect("pattern should compile");
    assert!(!regex.is_match("a\u{1}a"));
  }
}
