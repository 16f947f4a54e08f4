//! Test: Deploy resolution - composition and gating of deploy clauses

use crate::helpers::*;
use stagegate::{CompositionError, PlanError, PlanningEngine};

const TAG_OVERRIDE: &str = r#"
name: "Test: Tag Override"
deploy_templates:
  github:
    provider: releases
    params:
      file: dist/*
    on:
      tags: false
      branch: master
stages:
  - name: publish
    jobs:
      - name: release
        deploy:
          - extends: github
            on: { tags: true }
"#;

/// Base clause says `tags: false`; the specific clause overrides it with
/// `tags: true`, so only tag builds deploy.
#[test]
fn test_tags_false_overridden_to_true() {
    let plan = plan_yaml(TAG_OVERRIDE, &push("master"));
    assert!(find_job(&plan, "release").deploy.is_empty());

    let plan = plan_yaml(TAG_OVERRIDE, &tag("v0.10.0"));
    let job = find_job(&plan, "release");
    assert_eq!(providers(job), vec!["releases"]);

    let action = deploy_by_template(job, "github").unwrap();
    assert_eq!(action.params.get("file").unwrap().as_plain(), Some("dist/*"));
}

#[test]
fn test_composition_is_idempotent() {
    let ctx = tag("v0.10.0");
    let first = plan_yaml(TAG_OVERRIDE, &ctx);
    let second = plan_yaml(TAG_OVERRIDE, &ctx);

    assert_eq!(first.jobs[0].deploy, second.jobs[0].deploy);
    assert_eq!(
        serde_json::to_string(&first.jobs[0].deploy).unwrap(),
        serde_json::to_string(&second.jobs[0].deploy).unwrap()
    );
}

#[test]
fn test_cycle_yields_no_plan() {
    let yaml = r#"
name: "Cycle"
deploy_templates:
  pypi:
    extends: testpypi
    provider: pypi
  testpypi:
    extends: pypi
stages:
  - name: test
    jobs: [{ name: unit }]
  - name: publish
    jobs:
      - name: upload
        deploy: [testpypi]
"#;
    let spec = spec_from_yaml(yaml);
    let err = PlanningEngine::new(&spec).plan(&push("master")).unwrap_err();

    match err {
        PlanError::Composition(CompositionError::Cycle { location, chain }) => {
            assert!(location.contains("job 'upload'"), "location: {}", location);
            assert_eq!(chain, vec!["testpypi", "pypi", "testpypi"]);
        }
        other => panic!("Expected composition cycle, got {:?}", other),
    }
}

#[test]
fn test_missing_provider_yields_no_plan() {
    let yaml = r#"
name: "No provider"
deploy_templates:
  base:
    on: { tags: true }
stages:
  - name: publish
    jobs:
      - name: upload
        deploy: [base]
"#;
    let spec = spec_from_yaml(yaml);
    let err = PlanningEngine::new(&spec).plan(&push("master")).unwrap_err();
    assert!(matches!(
        err,
        PlanError::Composition(CompositionError::MissingProvider { .. })
    ));
}

#[test]
fn test_broken_deploy_in_skipped_stage_is_not_reported() {
    let yaml = r#"
name: "Skipped"
deploy_templates:
  a: { extends: b, provider: x }
  b: { extends: a }
stages:
  - name: build
    jobs: [{ name: wheel }]
  - name: publish
    if: { eq: { field: tag_present, value: true } }
    jobs:
      - name: upload
        deploy: [a]
"#;
    let plan = plan_yaml(yaml, &push("master"));
    assert_stage_order(&plan, &["build"]);

    let spec = spec_from_yaml(yaml);
    assert!(PlanningEngine::new(&spec).plan(&tag("v1")).is_err());
}

#[test]
fn test_env_gate_selects_one_matrix_cell() {
    let yaml = r#"
name: "Per cell"
stages:
  - name: test
    jobs:
      - name: pytest
        matrix:
          runtime_version: ["3.6", "3.7", "3.8"]
        deploy:
          - provider: codecov
            on:
              env: { runtime_version: "3.7" }
"#;
    let plan = plan_yaml(yaml, &push("master"));
    let with_deploy: Vec<_> = plan
        .jobs
        .iter()
        .filter(|j| !j.deploy.is_empty())
        .map(|j| j.env_value("runtime_version").unwrap())
        .collect();
    assert_eq!(with_deploy, vec!["3.7"]);
}

#[test]
fn test_branch_list_and_all_branches() {
    let yaml = r#"
name: "Branches"
deploy_templates:
  docs:
    provider: pages
    on: { branch: [master, develop] }
stages:
  - name: publish
    jobs:
      - name: pages
        deploy:
          - docs
          - extends: docs
            provider: surge
            on: { all_branches: true }
"#;
    let plan = plan_yaml(yaml, &push("develop"));
    assert_eq!(providers(&plan.jobs[0]), vec!["pages", "surge"]);

    let plan = plan_yaml(yaml, &push("feature"));
    assert_eq!(providers(&plan.jobs[0]), vec!["surge"]);
}
