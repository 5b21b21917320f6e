//! The policy engine.
//!
//! A [`Policy`] is a pure predicate over the actor, its relationships to the
//! target, the action and the request time. Policies compose into
//! [`PolicyGroup`]s; every (resource kind, action) pair maps to one
//! [`Rule`] in [`rule_for`]. Evaluation short-circuits on the first failing
//! member of an all-of group and reports that member's reason.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use classbook_core::Rejection;
use classbook_models::Role;

use crate::identity::ActorContext;
use crate::relationship::{Chain, Relationship, RelationshipSet, ResourceKind, resolve};
use crate::workflow::DeadlineWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Update,
    Delete,
    CreateClass,
    CreateAssignment,
    CreateNews,
    AddStudent,
    RemoveStudent,
    AddLesson,
    ListStudents,
    ListTeachers,
    ListLessons,
    ListSolutions,
    AddAnswer,
    SubmitSolution,
    GradeSolution,
}

impl Action {
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Action::View
                | Action::ListStudents
                | Action::ListTeachers
                | Action::ListLessons
                | Action::ListSolutions
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::CreateClass => "create-class",
            Action::CreateAssignment => "create-assignment",
            Action::CreateNews => "create-news",
            Action::AddStudent => "add-student",
            Action::RemoveStudent => "remove-student",
            Action::AddLesson => "add-lesson",
            Action::ListStudents => "list-students",
            Action::ListTeachers => "list-teachers",
            Action::ListLessons => "list-lessons",
            Action::ListSolutions => "list-solutions",
            Action::AddAnswer => "add-answer",
            Action::SubmitSolution => "submit-solution",
            Action::GradeSolution => "grade-solution",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// The actor holds exactly this role.
    Role(Role),
    /// Mutating actions need the role; reads pass.
    WriteRequiresRole(Role),
    /// The actor stands in this relationship to the target.
    Has(Relationship),
    /// The request time falls in the window around the target's deadline.
    Deadline(DeadlineWindow),
    /// The actor's account is active.
    Active,
}

impl Policy {
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Decision {
        let allowed = match self {
            Policy::Role(role) => ctx.actor.role() == *role,
            Policy::WriteRequiresRole(role) => {
                !ctx.action.is_mutation() || ctx.actor.role() == *role
            }
            Policy::Has(relationship) => ctx.relationships.contains(*relationship),
            Policy::Deadline(window) => ctx
                .deadline
                .is_some_and(|deadline| window.admits(ctx.now, deadline)),
            Policy::Active => ctx.actor.is_active(),
        };

        if allowed {
            Decision::Allow
        } else {
            Decision::Deny(Denial {
                policy: Some(*self),
                reason: self.reason(),
            })
        }
    }

    pub fn reason(&self) -> String {
        match self {
            Policy::Role(role) => format!("Only a {} may perform this action.", role),
            Policy::WriteRequiresRole(role) => {
                format!("Only a {} may modify this resource.", role)
            }
            Policy::Has(Relationship::Creator) => {
                "You are not the creator of this resource.".to_string()
            }
            Policy::Has(Relationship::TeacherOf) => {
                "You are not the teacher of this class.".to_string()
            }
            Policy::Has(Relationship::StudentOf) => {
                "You are not a student of this class.".to_string()
            }
            Policy::Has(Relationship::ManagerOf) => {
                "You are not the manager of this school.".to_string()
            }
            Policy::Has(Relationship::MemberOfSchool) => {
                "You are not a member of this school.".to_string()
            }
            Policy::Deadline(window) => window.reason().to_string(),
            Policy::Active => "Your account is inactive.".to_string(),
        }
    }

    fn is_temporal(&self) -> bool {
        matches!(self, Policy::Deadline(_))
    }
}

/// Composition of policies. Groups nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyGroup {
    One(Policy),
    AllOf(Vec<PolicyGroup>),
    AnyOf(Vec<PolicyGroup>),
}

impl From<Policy> for PolicyGroup {
    fn from(policy: Policy) -> Self {
        PolicyGroup::One(policy)
    }
}

impl PolicyGroup {
    pub fn all_of<I, P>(members: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PolicyGroup>,
    {
        PolicyGroup::AllOf(members.into_iter().map(Into::into).collect())
    }

    pub fn any_of<I, P>(members: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PolicyGroup>,
    {
        PolicyGroup::AnyOf(members.into_iter().map(Into::into).collect())
    }

    /// All-of allows when every member allows and reports the first denial.
    /// Any-of allows when some member allows and otherwise reports the
    /// first member's denial.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Decision {
        match self {
            PolicyGroup::One(policy) => policy.evaluate(ctx),
            PolicyGroup::AllOf(members) => {
                for member in members {
                    if let denied @ Decision::Deny(_) = member.evaluate(ctx) {
                        return denied;
                    }
                }
                Decision::Allow
            }
            PolicyGroup::AnyOf(members) => {
                let mut first_denial = None;
                for member in members {
                    match member.evaluate(ctx) {
                        Decision::Allow => return Decision::Allow,
                        Decision::Deny(denial) => {
                            first_denial.get_or_insert(denial);
                        }
                    }
                }
                Decision::Deny(first_denial.unwrap_or_else(Denial::nothing_grants))
            }
        }
    }
}

/// Inputs to one evaluation. `now` is read once per request.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub actor: &'a ActorContext,
    pub relationships: &'a RelationshipSet,
    pub action: Action,
    pub deadline: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// The failing policy; `None` when no rule covers the action at all.
    pub policy: Option<Policy>,
    pub reason: String,
}

impl Denial {
    fn nothing_grants() -> Self {
        Self {
            policy: None,
            reason: "You do not have permission to perform this action.".to_string(),
        }
    }

    /// Deadline failures are workflow violations; everything else is a
    /// plain denial.
    pub fn into_rejection(self) -> Rejection {
        match self.policy {
            Some(policy) if policy.is_temporal() => Rejection::invalid_transition(self.reason),
            _ => Rejection::denied(self.reason),
        }
    }
}

/// What an action on a resource kind requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Who may know the target exists. Failing it reads as not found.
    pub visibility: Option<PolicyGroup>,
    pub gate: PolicyGroup,
}

impl Rule {
    fn new(visibility: Option<PolicyGroup>, gate: PolicyGroup) -> Self {
        Self { visibility, gate }
    }
}

fn role(role: Role) -> PolicyGroup {
    Policy::Role(role).into()
}

fn has(relationship: Relationship) -> PolicyGroup {
    Policy::Has(relationship).into()
}

fn window_gate(window: DeadlineWindow) -> PolicyGroup {
    Policy::Deadline(window).into()
}

fn open() -> PolicyGroup {
    PolicyGroup::AllOf(Vec::new())
}

/// The rule table. `None` means the action does not apply to the kind.
pub fn rule_for(kind: ResourceKind, action: Action) -> Option<Rule> {
    use Relationship::*;

    let class_members = || PolicyGroup::any_of([TeacherOf, StudentOf, ManagerOf].map(Policy::Has));
    let teacher_of_class = || PolicyGroup::all_of([role(Role::Teacher), has(TeacherOf)]);
    let manager_of_school = || PolicyGroup::all_of([role(Role::Manager), has(ManagerOf)]);
    let manages_class = || {
        PolicyGroup::all_of([
            PolicyGroup::from(Policy::WriteRequiresRole(Role::Manager)),
            has(ManagerOf),
        ])
    };

    let rule = match (kind, action) {
        (ResourceKind::School, Action::View) => Rule::new(Some(has(ManagerOf)), open()),
        (ResourceKind::School, Action::ListStudents | Action::ListTeachers | Action::ListLessons)
        | (ResourceKind::School, Action::CreateClass | Action::CreateNews) => Rule::new(
            Some(PolicyGroup::any_of([has(ManagerOf), has(MemberOfSchool)])),
            manager_of_school(),
        ),

        (ResourceKind::Class, Action::View) => Rule::new(Some(class_members()), open()),
        (ResourceKind::Class, Action::ListLessons) => {
            Rule::new(Some(class_members()), class_members())
        }
        (ResourceKind::Class, Action::Update | Action::Delete | Action::AddLesson) => {
            Rule::new(Some(class_members()), manages_class())
        }
        (
            ResourceKind::Class,
            Action::AddStudent
            | Action::RemoveStudent
            | Action::ListStudents
            | Action::CreateAssignment
            | Action::CreateNews,
        ) => Rule::new(Some(class_members()), teacher_of_class()),

        (ResourceKind::Assignment, Action::View) => Rule::new(
            Some(PolicyGroup::any_of([has(TeacherOf), has(StudentOf)])),
            open(),
        ),
        (ResourceKind::Assignment, Action::Update) => Rule::new(
            Some(PolicyGroup::any_of([has(TeacherOf), has(StudentOf)])),
            PolicyGroup::all_of([teacher_of_class(), window_gate(DeadlineWindow::Before)]),
        ),
        (ResourceKind::Assignment, Action::AddAnswer) => Rule::new(
            Some(PolicyGroup::any_of([has(TeacherOf), has(StudentOf)])),
            PolicyGroup::all_of([teacher_of_class(), window_gate(DeadlineWindow::AtOrAfter)]),
        ),
        (ResourceKind::Assignment, Action::ListSolutions) => Rule::new(
            Some(PolicyGroup::any_of([has(TeacherOf), has(StudentOf)])),
            teacher_of_class(),
        ),
        (ResourceKind::Assignment, Action::SubmitSolution) => Rule::new(
            Some(PolicyGroup::any_of([has(TeacherOf), has(StudentOf)])),
            PolicyGroup::all_of([
                role(Role::Student),
                has(StudentOf),
                window_gate(DeadlineWindow::Before),
            ]),
        ),

        (ResourceKind::Solution, Action::View) => Rule::new(
            Some(PolicyGroup::any_of([has(Creator), has(TeacherOf)])),
            open(),
        ),
        (ResourceKind::Solution, Action::Update) => Rule::new(
            Some(PolicyGroup::any_of([has(Creator), has(TeacherOf)])),
            PolicyGroup::all_of([
                role(Role::Student),
                has(Creator),
                window_gate(DeadlineWindow::Before),
            ]),
        ),
        (ResourceKind::Solution, Action::GradeSolution) => Rule::new(
            Some(PolicyGroup::any_of([has(Creator), has(TeacherOf)])),
            PolicyGroup::all_of([teacher_of_class(), window_gate(DeadlineWindow::After)]),
        ),

        (ResourceKind::News, Action::View) => Rule::new(
            Some(PolicyGroup::any_of(
                [Creator, TeacherOf, StudentOf, ManagerOf, MemberOfSchool].map(Policy::Has),
            )),
            open(),
        ),
        (ResourceKind::News, Action::Update | Action::Delete) => Rule::new(
            Some(PolicyGroup::any_of(
                [Creator, TeacherOf, StudentOf, ManagerOf, MemberOfSchool].map(Policy::Has),
            )),
            PolicyGroup::any_of([has(Creator), has(ManagerOf)]),
        ),

        _ => return None,
    };

    Some(rule)
}

/// Evaluates `action` on the resource at the end of `chain`.
///
/// Mutations additionally require an active actor with at least one
/// relationship to the target. Returns the resolved relationships so callers
/// need not walk the chain twice.
pub fn authorize(
    actor: &ActorContext,
    chain: &Chain,
    action: Action,
    now: DateTime<Utc>,
) -> Result<RelationshipSet, Rejection> {
    let kind = chain.kind();
    let relationships = resolve(actor, chain);
    let ctx = EvalContext {
        actor,
        relationships: &relationships,
        action,
        deadline: chain.deadline(),
        now,
    };

    let Some(rule) = rule_for(kind, action) else {
        warn!(actor = %actor.id(), %action, %kind, "Action not applicable to resource");
        return Err(Denial::nothing_grants().into_rejection());
    };

    if let Some(visibility) = &rule.visibility {
        if !visibility.evaluate(&ctx).is_allowed() {
            debug!(actor = %actor.id(), target = %chain.target(), "Target outside actor's scope");
            return Err(Rejection::not_found(format!("{} not found.", kind)));
        }
    }

    let decision = if action.is_mutation() {
        if relationships.is_unrelated() {
            Decision::Deny(Denial::nothing_grants())
        } else {
            PolicyGroup::all_of([PolicyGroup::One(Policy::Active), rule.gate]).evaluate(&ctx)
        }
    } else {
        rule.gate.evaluate(&ctx)
    };

    match decision {
        Decision::Allow => {
            debug!(actor = %actor.id(), %action, target = %chain.target(), %relationships, "Action allowed");
            Ok(relationships)
        }
        Decision::Deny(denial) => {
            warn!(
                actor = %actor.id(),
                %action,
                target = %chain.target(),
                %relationships,
                reason = %denial.reason,
                "Action denied"
            );
            Err(denial.into_rejection())
        }
    }
}

/// Whether `actor` may see the target at all. Used to filter listings.
pub fn is_visible(actor: &ActorContext, chain: &Chain, now: DateTime<Utc>) -> bool {
    authorize(actor, chain, Action::View, now).is_ok()
}

/// Gates for actions on the actor's own account. `None` means the action
/// does not apply.
pub fn own_account_rule(action: Action) -> Option<PolicyGroup> {
    match action {
        Action::ListLessons => Some(PolicyGroup::any_of([role(Role::Teacher), role(Role::Student)])),
        Action::Update => Some(open()),
        _ => None,
    }
}

/// Evaluates `action` on the actor's own account. The actor is the
/// account's creator; mutations still require it to be active.
pub fn authorize_own(
    actor: &ActorContext,
    action: Action,
    now: DateTime<Utc>,
) -> Result<(), Rejection> {
    let Some(gate) = own_account_rule(action) else {
        warn!(actor = %actor.id(), %action, "Action not applicable to own account");
        return Err(Denial::nothing_grants().into_rejection());
    };

    let relationships: RelationshipSet = [Relationship::Creator].into_iter().collect();
    let ctx = EvalContext {
        actor,
        relationships: &relationships,
        action,
        deadline: None,
        now,
    };
    let gate = if action.is_mutation() {
        PolicyGroup::all_of([PolicyGroup::One(Policy::Active), gate])
    } else {
        gate
    };

    match gate.evaluate(&ctx) {
        Decision::Allow => Ok(()),
        Decision::Deny(denial) => {
            warn!(actor = %actor.id(), %action, reason = %denial.reason, "Action on own account denied");
            Err(denial.into_rejection())
        }
    }
}
