/*!

The DFA: subset construction from an ε-NFA, partition-refinement
minimization, and the transition table the matcher walks.

Missing transitions are not materialized. Every character without an entry
leads to the implicit dead state [`REJECT`], which is absorbing, so the
transition function is total over the alphabet without a dead row in the
table.

*/

use std::collections::{BTreeMap, HashMap, VecDeque};

use defaultmap::DefaultHashMap;

use crate::character::Char;
use crate::nfa::NondeterministicAutomaton;
use crate::{MarkSet, StateId32, StateIdSet};


/// Sentinel id for the implicit dead state, absorbing under every input.
pub const REJECT: StateId32 = StateId32::MAX;

/// A state's transition targets translated into partition representatives.
type Signature = Vec<(Char, StateId32)>;


#[derive(Clone, Debug)]
pub struct DeterministicAutomaton {
  state_map   : Vec<BTreeMap<Char, StateId32>>, //< per-state transition tables
  start_state : StateId32,                      //< always 0 after construction
  stop_states : StateIdSet,                     //< accept states
  marks       : BTreeMap<StateId32, MarkSet>,   //< mark sets of accept states
}


impl DeterministicAutomaton {

  fn new() -> Self {
    DeterministicAutomaton {
      state_map   : vec![BTreeMap::new()],
      start_state : 0,
      stop_states : StateIdSet::new(),
      marks       : BTreeMap::new(),
    }
  }


  pub fn state_count(&self) -> usize {
    self.state_map.len()
  }


  fn add_state(&mut self) -> StateId32 {
    self.state_map.push(BTreeMap::new());
    (self.state_map.len() - 1) as StateId32
  }


  pub fn start_state(&self) -> StateId32 {
    self.start_state
  }


  fn set_jump(&mut self, from: StateId32, ch: Char, to: StateId32) {
    self.state_map[from as usize].insert(ch, to);
  }


  /// Total over the alphabet: a missing entry is `REJECT`, and `REJECT`
  /// stays `REJECT`.
  pub fn next_state(&self, from: StateId32, ch: Char) -> StateId32 {
    match self.state_map.get(from as usize) {
      Some(table) => table.get(&ch).copied().unwrap_or(REJECT),
      None => REJECT,
    }
  }


  fn set_stop_state(&mut self, s: StateId32) {
    self.stop_states.insert(s);
  }


  pub fn is_stop_state(&self, s: StateId32) -> bool {
    self.stop_states.contains(&s)
  }


  /// The mark set of an accept state; empty for every other state.
  pub fn marks_of(&self, s: StateId32) -> MarkSet {
    self.marks.get(&s).cloned().unwrap_or_default()
  }


  /// Subset construction. DFA states are ε-closures of NFA state sets,
  /// allocated in work-queue order; the closure sets are canonically
  /// ordered, so the result is deterministic in the NFA's numbering.
  pub fn from_nondeterministic(nfa: &NondeterministicAutomaton) -> Self {
    let mut atm = Self::new();

    let nfa_state = nfa.start_state();
    if nfa.contains_stop_state(&nfa_state) {
      atm.set_stop_state(atm.start_state);
      let tags = nfa.marks_of(&nfa_state);
      if !tags.is_empty() {
        atm.marks.insert(atm.start_state, tags);
      }
    }

    let mut state_translate: HashMap<StateIdSet, StateId32> = HashMap::new();
    state_translate.insert(nfa_state.clone(), atm.start_state);

    let mut state_queue: VecDeque<StateIdSet> = VecDeque::new();
    state_queue.push_back(nfa_state);

    while let Some(st) = state_queue.pop_front() {
      let fst = state_translate[&st];

      for ch in nfa.character_transitions(&st) {
        let next_st = nfa.next_state(&st, ch);
        let next_fst = match state_translate.get(&next_st) {
          Some(&known) => known,
          None => {
            let allocated = atm.add_state();
            state_translate.insert(next_st.clone(), allocated);
            if nfa.contains_stop_state(&next_st) {
              atm.set_stop_state(allocated);
              let tags = nfa.marks_of(&next_st);
              if !tags.is_empty() {
                atm.marks.insert(allocated, tags);
              }
            }
            state_queue.push_back(next_st);
            allocated
          }
        };
        atm.set_jump(fst, ch, next_fst);
      }
    }

    atm
  }


  /// Minimization by partition refinement over a disjoint-set structure.
  ///
  /// The initial partition puts every non-accept state in one block and
  /// groups accept states by mark set. Each pass compares the members of a
  /// block by transition signature (key set plus target representatives
  /// under the current partition) and splits disagreeing members apart,
  /// keeping states that agree with each other together. When a pass
  /// changes nothing, surviving representatives are renumbered densely and
  /// everything is remapped. Unreachable states are already absent because
  /// subset construction only allocates reachable states.
  pub fn simplify(&mut self) {
    let state_count = self.state_map.len() as StateId32;

    // The forest stays star-shaped: states are only ever unioned directly
    // onto a root, so `parent[s]` is always a representative.
    let mut parent: Vec<StateId32> = (0..state_count).collect();

    // Initial partition. The grouping key is the accept status plus the
    // mark set; the smallest member of each group becomes its root.
    let mut initial_groups: DefaultHashMap<(bool, MarkSet), Vec<StateId32>> =
        DefaultHashMap::new(Vec::new());
    for s in 0..state_count {
      initial_groups.get_mut((self.is_stop_state(s), self.marks_of(s))).push(s);
    }
    for (_key, group) in initial_groups.iter() {
      if let Some(&root) = group.first() {
        for &s in &group[1..] {
          parent[s as usize] = root;
        }
      }
    }

    // Refinement passes. Signatures are taken against the partition as it
    // stood at the top of the pass, so a pass is order-independent.
    loop {
      let mut changed = false;

      let mut members: DefaultHashMap<StateId32, Vec<StateId32>> =
          DefaultHashMap::new(Vec::new());
      for s in 0..state_count {
        members.get_mut(parent[s as usize]).push(s);
      }

      let old_parent = parent.clone();
      for (_root, group) in members.iter() {
        if group.len() == 1 {
          continue;
        }

        let mut split_groups: HashMap<Signature, Vec<StateId32>> = HashMap::new();
        for &s in group {
          let signature: Signature = self.state_map[s as usize]
              .iter()
              .map(|(&ch, &to)| (ch, old_parent[to as usize]))
              .collect();
          split_groups.entry(signature).or_default().push(s);
        }

        if split_groups.len() > 1 {
          changed = true;
          for (_signature, split) in split_groups {
            if let Some(&root) = split.first() {
              for &s in &split {
                parent[s as usize] = root;
              }
            }
          }
        }
      }

      if !changed {
        break;
      }
    }

    // Collapse: dense-renumber the representatives and remap everything.
    let mut new_ids: HashMap<StateId32, StateId32> = HashMap::new();
    for s in 0..state_count {
      if parent[s as usize] == s {
        let next_id = new_ids.len() as StateId32;
        new_ids.insert(s, next_id);
      }
    }

    let mut new_state_map: Vec<BTreeMap<Char, StateId32>> = vec![BTreeMap::new(); new_ids.len()];
    for s in 0..state_count {
      if parent[s as usize] != s {
        continue;
      }
      new_state_map[new_ids[&s] as usize] = self.state_map[s as usize]
          .iter()
          .map(|(&ch, &to)| (ch, new_ids[&parent[to as usize]]))
          .collect();
    }

    self.start_state = new_ids[&parent[self.start_state as usize]];
    self.stop_states = self.stop_states.iter().map(|&s| new_ids[&parent[s as usize]]).collect();

    let mut new_marks = BTreeMap::new();
    for (&s, tags) in &self.marks {
      new_marks.insert(new_ids[&parent[s as usize]], tags.clone());
    }
    self.marks = new_marks;
    self.state_map = new_state_map;
  }


  pub fn serialize(&self) -> String {
    let mut out = String::new();

    for (s, table) in self.state_map.iter().enumerate() {
      out.push_str(&format!("STATE{}: {{", s));
      let mut mark = false;
      for (ch, st) in table {
        if mark {
          out.push_str(", ");
        }
        out.push_str(&format!("{} -> {}", ch, st));
        mark = true;
      }
      out.push_str("}\n");
    }

    out.push_str("STOP_STATES =");
    for s in &self.stop_states {
      out.push_str(&format!(" {}", s));
    }
    out.push('\n');

    out
  }

}
