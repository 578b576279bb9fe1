/*!

Tallying engine for single-winner elections.

Two voting methods are implemented:
- [`PluralityElection`]: first-past-the-post. Every ballot names one candidate and the
  candidates with the most ballots win.
- [`RankedElection`]: instant-runoff voting. Ballots rank the candidates and the
  candidate with the fewest ballots is eliminated round after round until someone
  holds a majority. Which ballots are accepted is controlled by a [`ValidityPolicy`].

Elections are immutable values. Casting a ballot never modifies an election: it returns
a new one sharing the ballots it already had, or the very same election if the ballot
was rejected. Rejected ballots are not errors. The only error is trying to set up an
election without any candidate.

```
use election_core::{Ballot, CandidateSet, PluralityElection, RankedElection, ValidityPolicy};

let cands = CandidateSet::new(["Alice", "Bob", "Carol"]);

let fptp = PluralityElection::new(cands.clone())?
    .cast(&Ballot::single("Carol"))
    .cast(&Ballot::single("Alice"))
    .cast(&Ballot::single("Carol"));
assert_eq!(fptp.winner(), vec!["Carol".to_string()]);

let irv = RankedElection::new(cands, ValidityPolicy::OPTIONAL)?
    .cast(&Ballot::from(["Carol"]))
    .cast(&Ballot::from(["Alice", "Bob"]))
    .cast(&Ballot::from(["Bob", "Alice"]))
    .cast(&Ballot::from(["Bob", "Carol"]));
// Alice is eliminated first and her ballot goes to Bob.
assert_eq!(irv.winner(), vec!["Bob".to_string()]);
# Ok::<(), election_core::ElectionError>(())
```
*/

mod ballot;
mod ballot_log;
mod candidates;
mod config;
mod plurality;
mod ranked;

pub use crate::ballot::Ballot;
pub use crate::candidates::CandidateSet;
pub use crate::config::*;
pub use crate::plurality::PluralityElection;
pub use crate::ranked::RankedElection;
