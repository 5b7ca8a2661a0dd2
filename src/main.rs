/*!

Interactive drivers for the regex engine: a single-pattern matcher, a
diagnostic mode that also dumps the token stream and both automata, and a
multi-pattern classifier.

*/

use std::io::{self, Write};
use std::process;

use codespan::Files;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use structopt::StructOpt;

use relex::debug::serialize_set;
use relex::error::{CompileError, ToDiagnostic};
use relex::{MultiRegex, PatternId32, Regex};


#[derive(Debug, StructOpt)]
#[structopt(
  name = "relex",
  about = "Compiles regular expressions into minimal DFAs and matches input lines against them."
)]
struct Options {
  /// Dump the token stream, NFA, and minimized DFA after compiling
  #[structopt(short, long)]
  dump: bool,

  /// Classify lines against several numbered patterns at once
  #[structopt(short, long)]
  multi: bool,
}


fn main() {
  let options = Options::from_args();

  let status = match options.multi {
    true  => run_classifier(&options),
    false => run_matcher(&options),
  };

  process::exit(status);
}


/// Prompts on stdout and reads one line. `None` on EOF.
fn read_prompted_line(prompt: &str) -> Option<String> {
  print!("{}", prompt);
  let _ = io::stdout().flush();

  let mut line = String::new();
  match io::stdin().read_line(&mut line) {
    Ok(0) | Err(_) => None,
    Ok(_) => Some(line.trim_end_matches(|c| c == '\r' || c == '\n').to_string()),
  }
}


fn report_error(pattern: &str, error: &CompileError, dump: bool) {
  eprintln!("error: {}", error);

  if dump {
    let mut files: Files<String> = Files::new();
    let file_id = files.add("pattern", pattern.to_string());
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let _ = term::emit(&mut writer.lock(), &config, &files, &error.to_diagnostic(file_id));
  }
}


fn run_matcher(options: &Options) -> i32 {
  let pattern = match read_prompted_line("Enter a regular expression: ") {
    Some(line) => line,
    None => return 0,
  };

  let regex = match Regex::compile(&pattern) {
    Ok(regex) => regex,
    Err(error) => {
      report_error(&pattern, &error, options.dump);
      return 1;
    }
  };

  if options.dump {
    println!("Tokens:");
    for token in regex.tokens() {
      println!("{}", token);
    }
    println!("\nAutomaton:\n{}", regex.nfa().serialize());
    println!("Deterministic automaton:\n{}", regex.dfa().serialize());
    println!("Compile time: {}us", regex.compile_time().as_micros());
  }

  loop {
    let input = match read_prompted_line("Enter a string (empty line quits): ") {
      Some(line) => line,
      None => return 0,
    };
    if input.is_empty() {
      return 0;
    }

    match regex.is_match(&input) {
      true  => println!("match"),
      false => println!("no match"),
    }
  }
}


fn run_classifier(options: &Options) -> i32 {
  let count_line = match read_prompted_line("Enter the number of patterns: ") {
    Some(line) => line,
    None => return 0,
  };
  let count: usize = match count_line.trim().parse() {
    Ok(count) => count,
    Err(_) => {
      eprintln!("error: expected a pattern count, got {:?}", count_line);
      return 1;
    }
  };

  let mut patterns: Vec<(PatternId32, String)> = Vec::with_capacity(count);
  for i in 0..count {
    let pattern = match read_prompted_line(&format!("Pattern {}: ", i)) {
      Some(line) => line,
      None => return 0,
    };
    patterns.push((i as PatternId32, pattern));
  }

  let borrowed: Vec<(PatternId32, &str)> =
      patterns.iter().map(|(id, pattern)| (*id, pattern.as_str())).collect();
  let multi = match MultiRegex::compile(&borrowed) {
    Ok(multi) => multi,
    Err(error) => {
      eprintln!("error: {}", error);
      return 1;
    }
  };

  if options.dump {
    println!("Automaton:\n{}", multi.nfa().serialize());
    println!("Deterministic automaton:\n{}", multi.dfa().serialize());
  }

  loop {
    let input = match read_prompted_line("Enter a string (empty line quits): ") {
      Some(line) => line,
      None => return 0,
    };
    if input.is_empty() {
      return 0;
    }

    println!("{}", serialize_set(multi.classify(&input).iter()));
  }
}
