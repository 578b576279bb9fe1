use std::collections::HashSet;

/// The choices of one voter, in order of preference.
///
/// A ballot never names the same candidate twice: repeated names are dropped and only
/// the first (most preferred) occurrence is kept. The names are not checked against any
/// candidate set here; that is the job of the election receiving the ballot.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Ballot {
    choices: Vec<String>,
}

impl Ballot {
    pub fn new<I, S>(choices: I) -> Ballot
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut res: Vec<String> = Vec::new();
        for c in choices {
            let c: String = c.into();
            if seen.insert(c.clone()) {
                res.push(c);
            }
        }
        Ballot { choices: res }
    }

    /// A ballot with a single choice, as used for first-past-the-post.
    pub fn single<S: Into<String>>(choice: S) -> Ballot {
        Ballot {
            choices: vec![choice.into()],
        }
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|s| s.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for Ballot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Ballot::new(iter)
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Ballot {
    fn from(choices: [S; N]) -> Self {
        Ballot::new(choices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_dropped() {
        let b = Ballot::from(["Bob", "Sue", "Bob", "Bill", "Sue"]);
        assert_eq!(b.iter().collect::<Vec<_>>(), vec!["Bob", "Sue", "Bill"]);
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn single_choice() {
        let b = Ballot::single("Alice");
        assert_eq!(b, Ballot::from(["Alice", "Alice"]));
        assert!(!b.is_empty());
        assert!(Ballot::default().is_empty());
    }
}
