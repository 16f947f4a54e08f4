//! Test: Stage gating - stages are included or dropped by their own condition

use crate::helpers::*;
use stagegate::EventType;
use stagegate::ExecutionContext;

const GATED: &str = r#"
name: "Test: Stage Gating"
stages:
  - name: test
    jobs:
      - name: pytest
        script: ["pytest"]
  - name: publish
    if:
      all:
        - eq: { field: branch, value: master }
        - eq: { field: event_type, value: push }
    jobs:
      - name: upload
        script: ["twine upload dist/*"]
      - name: announce
        script: ["./announce.sh"]
"#;

/// A stage gated on `branch == master AND event_type == push`
#[test]
fn test_master_push_gate() {
    let plan = plan_yaml(GATED, &push("master"));
    assert_stage_order(&plan, &["test", "publish"]);
    assert_eq!(jobs_of(&plan, "upload").len(), 1);
    assert_eq!(jobs_of(&plan, "announce").len(), 1);

    let plan = plan_yaml(GATED, &pull_request("master"));
    assert_stage_order(&plan, &["test"]);
    assert_stage_absent(&plan, "publish");
    assert_eq!(plan.skipped_stages, vec!["publish"]);

    let plan = plan_yaml(GATED, &push("develop"));
    assert_stage_absent(&plan, "publish");
}

#[test]
fn test_false_stage_contributes_zero_jobs_in_any_context() {
    let spec = spec_from_yaml(GATED);
    let publish = spec.stage("publish").unwrap();

    for ctx in all_contexts() {
        let plan = stagegate::PlanningEngine::new(&spec).plan(&ctx).unwrap();
        let gate = publish.condition.as_ref().unwrap().evaluate(&ctx);
        let jobs = plan.jobs.iter().filter(|j| j.stage == "publish").count();

        if gate {
            assert_eq!(jobs, 2, "publish should run in {}", ctx);
        } else {
            assert_eq!(jobs, 0, "publish should be dropped in {}", ctx);
        }
    }
}

/// A later stage is kept even when an earlier one is skipped
#[test]
fn test_stages_are_gated_independently() {
    let yaml = r#"
name: "Independent"
stages:
  - name: lint
    if: { eq: { field: branch, value: master } }
    jobs:
      - name: flake8
  - name: package
    jobs:
      - name: wheel
"#;
    let plan = plan_yaml(yaml, &push("feature"));
    assert_stage_order(&plan, &["package"]);
    assert_eq!(plan.skipped_stages, vec!["lint"]);
    assert_eq!(plan.jobs[0].number, "1.1");
}

#[test]
fn test_positions_order_stages() {
    let yaml = r#"
name: "Positions"
stages:
  - name: deploy
    position: 30
    jobs: [{ name: ship }]
  - name: build
    position: 10
    jobs: [{ name: compile }]
  - name: test
    position: 20
    jobs: [{ name: check }]
"#;
    let plan = plan_yaml(yaml, &push("master"));
    assert_stage_order(&plan, &["build", "test", "deploy"]);

    let positions: Vec<u32> = plan.stages.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![10, 20, 30]);
    assert_eq!(job_names(&plan), vec!["compile", "check", "ship"]);
}

#[test]
fn test_job_condition_filters_within_stage() {
    let yaml = r#"
name: "Job gates"
stages:
  - name: test
    jobs:
      - name: unit
      - name: nightly
        if: { eq: { field: event_type, value: cron } }
"#;
    let plan = plan_yaml(yaml, &push("master"));
    assert_eq!(job_names(&plan), vec!["unit"]);

    let plan = plan_yaml(yaml, &ExecutionContext::new("master", EventType::Schedule));
    assert_eq!(job_names(&plan), vec!["unit", "nightly"]);
}

#[test]
fn test_stage_with_no_surviving_jobs_is_omitted() {
    let yaml = r#"
name: "Empty stage"
stages:
  - name: docs
    jobs:
      - name: sphinx
        if: pull_request
  - name: test
    jobs:
      - name: unit
"#;
    let plan = plan_yaml(yaml, &push("master"));
    assert_stage_order(&plan, &["test"]);
    assert!(plan.skipped_stages.is_empty());
    assert_eq!(plan.jobs[0].number, "1.1");
}
