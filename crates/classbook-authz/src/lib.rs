//! # Classbook Authz
//!
//! Who may do what to which resource, and when.
//!
//! - [`identity`]: the acting user and their memberships
//! - [`relationship`]: entity chains and the relationship resolver
//! - [`policy`]: composable policies, the rule table and [`authorize`]
//! - [`workflow`]: assignment and solution transitions gated by the deadline
//! - [`membership`]: guards for class membership edits
//! - [`commit`]: plans that restate each gate as a commit-time precondition
//! - [`store`]: the persistence seam, with [`MemoryStore`] as one backend
//! - [`clock`]: the wall clock, read once per request and again by stores at commit
//!
//! # Example
//!
//! ```ignore
//! use classbook_authz::{Action, ResourceRef, authorize, workflow};
//!
//! let now = clock.now();
//! let chain = store.load(ResourceRef::Solution(id)).await?.ok_or(not_found)?;
//! authorize(&actor, &chain, Action::GradeSolution, now)?;
//! let grade = workflow::grade_solution(chain.assignment().unwrap(), dto, now)?;
//! ```

pub mod clock;
pub mod commit;
pub mod identity;
pub mod membership;
pub mod memory;
pub mod policy;
pub mod relationship;
pub mod store;
pub mod workflow;

#[cfg(test)]
mod fixtures;

pub use clock::{Clock, FixedClock, SystemClock};
pub use commit::{Committed, Fact, Mutation, Plan, Precondition};
pub use identity::{ActorContext, ClassMembership};
pub use memory::MemoryStore;
pub use policy::{
    Action, Decision, Denial, Policy, PolicyGroup, Rule, authorize, authorize_own, is_visible,
};
pub use relationship::{Chain, Relationship, RelationshipSet, ResourceKind, ResourceRef, resolve};
pub use store::{Scan, Store};
pub use workflow::{AssignmentState, DeadlineWindow, SolutionState};
