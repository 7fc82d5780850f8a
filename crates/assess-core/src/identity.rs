//! Merge-chain resolution.
//!
//! A PEN may belong to a student record that was merged into another one,
//! which may itself have been merged. The resolver follows the forward
//! pointers with an explicit bounded loop and a visited set, so malformed
//! chains (cycles, runaway lengths) end in a resolution failure instead of
//! looping. Chains are walked in lock step: each hop issues one batched
//! registry lookup for every chain still walking.

use std::collections::{BTreeSet, HashMap, HashSet};

use assess_model::messages::{self, fill_template};
use assess_model::{
    FieldCode, IssueCode, Pen, StagedStatus, Student, StudentId, StudentStatus, ValidationIssue,
};

use crate::collaborators::StudentRegistry;
use crate::error::LookupError;

/// Why a PEN did not resolve to an active student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No student holds the PEN.
    NoRecord,
    /// The chain ends in a record that is neither active nor forwarded.
    Inactive(StudentStatus),
    /// A merge target is missing from the registry.
    DanglingLink(StudentId),
    /// The chain revisits a student.
    Cycle(StudentId),
    /// The chain is longer than the configured bound.
    HopLimitExceeded,
}

/// Outcome of resolving one PEN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { student: Student, hops: usize },
    NotFound(Unresolved),
    /// The registry failed or timed out; worth retrying later.
    Unavailable(LookupError),
}

impl Resolution {
    pub fn student(&self) -> Option<&Student> {
        match self {
            Self::Resolved { student, .. } => Some(student),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Staging status for a row resolved this way.
    pub fn staged_status(&self) -> Option<StagedStatus> {
        match self {
            Self::Resolved { hops: 0, .. } => Some(StagedStatus::Loaded),
            Self::Resolved { .. } => Some(StagedStatus::Transfer),
            _ => None,
        }
    }

    /// Row-level issue for a failed resolution of `pen`.
    pub fn issue(&self, pen: &Pen) -> Option<ValidationIssue> {
        let (code, template) = match self {
            Self::Resolved { .. } => return None,
            Self::NotFound(Unresolved::NoRecord) => {
                (IssueCode::StudentNotFound, messages::STUDENT_NOT_FOUND)
            }
            Self::NotFound(_) => (IssueCode::MergeChainUnresolved, messages::MERGE_CHAIN_UNRESOLVED),
            Self::Unavailable(_) => (IssueCode::LookupUnavailable, messages::LOOKUP_UNAVAILABLE),
        };
        Some(
            ValidationIssue::error(FieldCode::Pen, code, fill_template(template, &[pen]))
                .with_rejected_value(pen.as_str()),
        )
    }
}

struct Walk {
    current: Student,
    visited: HashSet<StudentId>,
    hops: usize,
}

impl Walk {
    fn start(student: Student) -> Self {
        let visited = HashSet::from([student.id.clone()]);
        Self {
            current: student,
            visited,
            hops: 0,
        }
    }

    fn hop(&mut self, next: Student) {
        self.visited.insert(next.id.clone());
        self.hops += 1;
        self.current = next;
    }
}

enum Step {
    Done(Resolution),
    Walking { walk: Walk, next: StudentId },
}

/// Resolves PENs to active students through the merge graph.
pub struct IdentityResolver<'a> {
    registry: &'a dyn StudentRegistry,
    max_hops: usize,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(registry: &'a dyn StudentRegistry, max_hops: usize) -> Self {
        Self { registry, max_hops }
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    pub fn resolve(&self, pen: &Pen) -> Resolution {
        self.resolve_many(std::slice::from_ref(pen))
            .pop()
            .unwrap_or(Resolution::NotFound(Unresolved::NoRecord))
    }

    /// Resolve several PENs; results are in input order.
    pub fn resolve_many(&self, pens: &[Pen]) -> Vec<Resolution> {
        let mut steps: Vec<Step> = pens
            .iter()
            .map(|pen| match self.registry.student_by_pen(pen) {
                Ok(Some(student)) => self.advance(Walk::start(student)),
                Ok(None) => Step::Done(Resolution::NotFound(Unresolved::NoRecord)),
                Err(e) => Step::Done(Resolution::Unavailable(e)),
            })
            .collect();

        let mut round = 0;
        loop {
            let wanted: BTreeSet<&StudentId> = steps
                .iter()
                .filter_map(|step| match step {
                    Step::Walking { next, .. } => Some(next),
                    Step::Done(_) => None,
                })
                .collect();
            if wanted.is_empty() {
                break;
            }
            round += 1;
            let wanted: Vec<StudentId> = wanted.into_iter().cloned().collect();
            tracing::debug!(round, ids = wanted.len(), "merge-chain batch lookup");

            let response = self.registry.students_by_ids(&wanted);
            let found: HashMap<StudentId, Student> = match &response {
                Ok(students) => students
                    .iter()
                    .map(|student| (student.id.clone(), student.clone()))
                    .collect(),
                Err(_) => HashMap::new(),
            };

            steps = steps
                .into_iter()
                .map(|step| match step {
                    done @ Step::Done(_) => done,
                    Step::Walking { mut walk, next } => match (&response, found.get(&next)) {
                        (Err(e), _) => Step::Done(Resolution::Unavailable(e.clone())),
                        (Ok(_), Some(student)) => {
                            walk.hop(student.clone());
                            self.advance(walk)
                        }
                        (Ok(_), None) => {
                            Step::Done(Resolution::NotFound(Unresolved::DanglingLink(next)))
                        }
                    },
                })
                .collect();
        }

        steps
            .into_iter()
            .map(|step| match step {
                Step::Done(resolution) => resolution,
                Step::Walking { .. } => Resolution::NotFound(Unresolved::HopLimitExceeded),
            })
            .collect()
    }

    fn advance(&self, walk: Walk) -> Step {
        if walk.current.is_active() {
            return Step::Done(Resolution::Resolved {
                hops: walk.hops,
                student: walk.current,
            });
        }
        let link = walk.current.merge_link();
        let Some(next) = link.next() else {
            return Step::Done(Resolution::NotFound(Unresolved::Inactive(link.status_code)));
        };
        if walk.visited.contains(next) {
            tracing::warn!(hops = walk.hops, "merge chain revisits a student");
            return Step::Done(Resolution::NotFound(Unresolved::Cycle(next.clone())));
        }
        if walk.hops >= self.max_hops {
            tracing::warn!(max_hops = self.max_hops, "merge chain exceeds hop limit");
            return Step::Done(Resolution::NotFound(Unresolved::HopLimitExceeded));
        }
        let next = next.clone();
        Step::Walking { walk, next }
    }
}
