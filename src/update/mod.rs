//! Update judgment logic for dependencies
//!
//! This module provides:
//! - Update filter configuration (exclude list, single-package selection)
//! - Resolved version info with PEP 440 comparison
//! - Update judgment engine that decides whether to update or skip

mod filter;
mod version_info;

pub use filter::UpdateFilter;
pub use version_info::{compare_versions, matches_version_pattern, ResolvedVersion};

use crate::domain::{Clause, Dependency, Operator, SkipReason, UpdateResult};
use std::cmp::Ordering;

/// Update judgment engine that decides whether to update a dependency
pub struct UpdateJudge {
    filter: UpdateFilter,
}

impl UpdateJudge {
    /// Create a new UpdateJudge with the given filter
    pub fn new(filter: UpdateFilter) -> Self {
        Self { filter }
    }

    /// Returns the filter in use
    pub fn filter(&self) -> &UpdateFilter {
        &self.filter
    }

    /// Check if a dependency should be processed at all
    /// Returns Some(SkipReason) if it should be skipped before any lookup
    pub fn should_skip(&self, dependency: &Dependency) -> Option<SkipReason> {
        if let Some(reason) = self.filter.check(&dependency.normalized) {
            return Some(reason);
        }

        if dependency.is_pinned() {
            return Some(SkipReason::Pinned);
        }

        if !dependency.requirement.has_minimum() {
            return Some(SkipReason::Unconstrained);
        }

        None
    }

    /// Judge whether to rewrite a dependency to the given latest version
    pub fn judge(&self, dependency: &Dependency, latest: &ResolvedVersion) -> UpdateResult {
        if let Some(reason) = self.should_skip(dependency) {
            return UpdateResult::skip(dependency.clone(), reason);
        }

        // Only move the floor upward
        let floor = dependency.current_version().unwrap_or("0");
        if compare_versions(floor, &latest.version) != Ordering::Less {
            return UpdateResult::skip(dependency.clone(), SkipReason::AlreadyLatest);
        }

        if let Some(bound) = dependency
            .requirement
            .upper_bounds()
            .find(|clause| !allows(clause, &latest.version))
        {
            return UpdateResult::skip(
                dependency.clone(),
                SkipReason::ExceedsUpperBound(bound.to_string()),
            );
        }

        UpdateResult::update(dependency.clone(), &latest.version)
    }
}

/// Returns true if `version` satisfies an upper-bound clause
fn allows(clause: &Clause, version: &str) -> bool {
    match clause.operator {
        Operator::Less => compare_versions(version, &clause.version) == Ordering::Less,
        Operator::LessOrEqual => compare_versions(version, &clause.version) != Ordering::Greater,
        Operator::NotEqual => !matches_version_pattern(version, &clause.version),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Requirement, SourceLocation};

    fn make_dependency(raw: &str) -> Dependency {
        Dependency::new(
            Requirement::parse(raw).unwrap(),
            "dependencies",
            SourceLocation::new("pyproject.toml", 1),
        )
    }

    fn latest(version: &str) -> ResolvedVersion {
        ResolvedVersion::new("pkg", version)
    }

    fn skip_reason(result: UpdateResult) -> SkipReason {
        match result {
            UpdateResult::Skip { reason, .. } => reason,
            other => panic!("expected skip, got {other}"),
        }
    }

    #[test]
    fn test_judge_simple_update() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("ruff>=0.9.0"), &latest("0.15.0"));

        match result {
            UpdateResult::Update {
                new_version, edit, ..
            } => {
                assert_eq!(new_version, "0.15.0");
                assert_eq!(edit.new, "ruff>=0.15.0");
            }
            other => panic!("expected update, got {other}"),
        }
    }

    #[test]
    fn test_judge_compatible_release_single_segment() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let dependency = make_dependency("pywin32~=305; sys_platform == 'win32'");

        let result = judge.judge(&dependency, &latest("306"));
        assert_eq!(
            result.edit().unwrap().new,
            "pywin32~=306.0; sys_platform == 'win32'"
        );

        let updated = make_dependency("pywin32~=306.0; sys_platform == 'win32'");
        assert!(matches!(
            judge.judge(&updated, &latest("306")),
            UpdateResult::Skip {
                reason: SkipReason::AlreadyLatest,
                ..
            }
        ));
    }

    #[test]
    fn test_judge_keeps_upper_bound() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("requests>=2.28,<3.0"), &latest("2.31.0"));
        assert_eq!(result.edit().unwrap().new, "requests>=2.31.0,<3.0");
    }

    #[test]
    fn test_judge_already_latest() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("ruff>=0.15.0"), &latest("0.15.0"));
        assert_eq!(skip_reason(result), SkipReason::AlreadyLatest);
    }

    #[test]
    fn test_judge_zero_padded_floor_is_latest() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("mkdocs~=1.6"), &latest("1.6.0"));
        assert_eq!(skip_reason(result), SkipReason::AlreadyLatest);
    }

    #[test]
    fn test_judge_never_downgrades() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("ruff>=1.0"), &latest("0.15.0"));
        assert_eq!(skip_reason(result), SkipReason::AlreadyLatest);
    }

    #[test]
    fn test_judge_skip_pinned() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("flask==2.0.1"), &latest("3.0.0"));
        assert_eq!(skip_reason(result), SkipReason::Pinned);
    }

    #[test]
    fn test_judge_skip_unconstrained() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        assert_eq!(
            skip_reason(judge.judge(&make_dependency("pytest"), &latest("9.0.0"))),
            SkipReason::Unconstrained
        );
        assert_eq!(
            skip_reason(judge.judge(&make_dependency("pytest>8"), &latest("9.0.0"))),
            SkipReason::Unconstrained
        );
    }

    #[test]
    fn test_judge_upper_bound_exceeded() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("requests>=2.28,<3.0"), &latest("3.1.0"));
        assert_eq!(
            skip_reason(result),
            SkipReason::ExceedsUpperBound("<3.0".to_string())
        );
    }

    #[test]
    fn test_judge_not_equal_bound() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let result = judge.judge(&make_dependency("numpy>=1.20,!=1.26.*"), &latest("1.26.4"));
        assert_eq!(
            skip_reason(result),
            SkipReason::ExceedsUpperBound("!=1.26.*".to_string())
        );
    }

    #[test]
    fn test_judge_less_or_equal_bound() {
        let judge = UpdateJudge::new(UpdateFilter::new());
        let dep = make_dependency("attrs>=21,<=23.2");
        assert!(judge.judge(&dep, &latest("23.2")).is_update());
        assert!(judge.judge(&dep, &latest("23.2.1")).is_skip());
    }

    #[test]
    fn test_judge_excluded_and_not_selected() {
        let judge = UpdateJudge::new(UpdateFilter::new().with_exclude(["ruff"]));
        assert_eq!(
            judge.should_skip(&make_dependency("ruff>=0.9")),
            Some(SkipReason::Excluded)
        );

        let judge = UpdateJudge::new(UpdateFilter::new().with_only("mypy"));
        assert_eq!(
            judge.should_skip(&make_dependency("ruff>=0.9")),
            Some(SkipReason::NotSelected)
        );
        assert_eq!(judge.should_skip(&make_dependency("mypy>=1.0")), None);
    }
}
