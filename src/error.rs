/*!

Compile-time errors. Every error carries the index of the character at which
it was detected; matching itself is infallible.

*/

use std::error::Error;
use std::fmt::{Display, Formatter};

use codespan::{FileId, Span};
use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::Index32;


#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CompileError {
  UnterminatedClass(Index32), //< `[` with no balancing `]` before end of pattern
  UnbalancedParens(Index32),  //< surplus `(` or `)`
  OperatorArity(Index32),     //< operator applied with too few operands
  EmptyPattern(Index32),      //< zero tokens after tokenization
  EmptyClass(Index32),        //< class `[]` with nothing to select
}


impl CompileError {

  /// The character position at which the error was detected.
  pub fn idx(&self) -> Index32 {
    *match self {
      | CompileError::UnterminatedClass(loc)
      | CompileError::UnbalancedParens(loc)
      | CompileError::OperatorArity(loc)
      | CompileError::EmptyPattern(loc)
      | CompileError::EmptyClass(loc) => loc,
    }
  }


  fn name(&self) -> &'static str {
    match self {
      CompileError::UnterminatedClass(_) => "Unterminated Class",
      CompileError::UnbalancedParens(_)  => "Unbalanced Parens",
      CompileError::OperatorArity(_)     => "Operator Arity",
      CompileError::EmptyPattern(_)      => "Empty Pattern",
      CompileError::EmptyClass(_)        => "Empty Class",
    }
  }

}


impl Display for CompileError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} at character {}", self.name(), self.idx())
  }
}

impl Error for CompileError {}


/// Conversion into a rendered diagnostic against the pattern source.
pub trait ToDiagnostic {
  fn to_diagnostic(&self, file: FileId) -> Diagnostic<FileId>;
}

impl ToDiagnostic for CompileError {
  fn to_diagnostic(&self, file: FileId) -> Diagnostic<FileId> {
    let message = match self {
      CompileError::UnterminatedClass(_) => "class opened here is never closed",
      CompileError::UnbalancedParens(_)  => "no matching parenthesis",
      CompileError::OperatorArity(_)     => "operator is missing an operand",
      CompileError::EmptyPattern(_)      => "nothing to match",
      CompileError::EmptyClass(_)        => "class selects no characters",
    };
    let label = Label::primary(file, Span::new(self.idx(), self.idx())).with_message(message);

    Diagnostic::error().with_message(self.to_string()).with_labels(vec![label])
  }
}


#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn display_carries_position() {
    let error = CompileError::UnterminatedClass(5);
    assert_eq!(error.to_string(), "Unterminated Class at character 5");
    assert_eq!(error.idx(), 5);
  }

  #[test]
  fn diagnostic_points_at_offset() {
    let mut files: codespan::Files<String> = codespan::Files::new();
    let file = files.add("pattern", String::from("a[bc"));
    let diagnostic = CompileError::UnterminatedClass(1).to_diagnostic(file);
    assert_eq!(diagnostic.labels.len(), 1);
  }
}
