/*!

Human-readable dump helpers shared by the automaton `serialize()` methods.
The formats exist for test inspection only and are not a stable contract.

*/

use std::fmt::Display;


/// Formats a collection the way the automaton dumps expect: `{}` when empty,
/// the bare element for a singleton, `{a,b,c}` otherwise.
pub fn serialize_set<T, I>(values: I) -> String
  where T: Display,
        I: IntoIterator<Item = T>
{
  let mut rendered: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();

  if rendered.is_empty() {
    return String::from("{}");
  }
  if rendered.len() == 1 {
    return rendered.remove(0);
  }

  format!("{{{}}}", rendered.join(","))
}


#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn set_shapes() {
    let empty: Vec<u32> = vec![];
    assert_eq!(serialize_set(empty.iter()), "{}");
    assert_eq!(serialize_set([7u32].iter()), "7");
    assert_eq!(serialize_set([1u32, 2, 3].iter()), "{1,2,3}");
  }
}
