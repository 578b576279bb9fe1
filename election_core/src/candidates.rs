use std::collections::HashMap;

// The position of a candidate in its set. Only meaningful for the set that created it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub(crate) struct CandidateId(pub(crate) u32);

impl CandidateId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The candidates of an election.
///
/// Names are deduplicated on construction: only the first occurrence of a name is kept,
/// and the order in which names were given is the candidate order used for ties.
///
/// ```
/// use election_core::CandidateSet;
///
/// let cands = CandidateSet::new(["Alice", "Bob", "Alice"]);
/// assert_eq!(cands.len(), 2);
/// assert_eq!(cands.names(), &["Alice".to_string(), "Bob".to_string()]);
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CandidateSet {
    names: Vec<String>,
    ids: HashMap<String, CandidateId>,
}

impl CandidateSet {
    pub fn new<I, S>(names: I) -> CandidateSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut res = CandidateSet::default();
        for name in names {
            let name: String = name.into();
            if !res.ids.contains_key(&name) {
                res.ids
                    .insert(name.clone(), CandidateId(res.names.len() as u32));
                res.names.push(name);
            }
        }
        res
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub(crate) fn id_of(&self, name: &str) -> Option<CandidateId> {
        self.ids.get(name).copied()
    }

    pub(crate) fn name_of(&self, cid: CandidateId) -> &str {
        self.names[cid.index()].as_str()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = CandidateId> {
        (0..self.names.len() as u32).map(CandidateId)
    }
}

impl<S: Into<String>> FromIterator<S> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        CandidateSet::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_order() {
        let cands: CandidateSet = vec!["Sue", "Bob", "Sue", "Bill", "Bob"].into_iter().collect();
        assert_eq!(cands.iter().collect::<Vec<_>>(), vec!["Sue", "Bob", "Bill"]);
        assert_eq!(cands.id_of("Bill"), Some(CandidateId(2)));
        assert_eq!(cands.name_of(CandidateId(1)), "Bob");
    }

    #[test]
    fn empty_set() {
        let cands = CandidateSet::new(Vec::<String>::new());
        assert!(cands.is_empty());
        assert!(!cands.contains(""));
        assert_eq!(cands.ids().count(), 0);
    }
}
