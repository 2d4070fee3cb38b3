// tests/workflow_tests.rs
mod common;

use common::*;
use florist::{ContextData, Pipeline, RunStatus, StepControl};
use serial_test::serial;

fn three_step_pipeline(optional_middle: bool) -> Pipeline<TestContext, TestError> {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(
    "test",
    &[("first", false), ("middle", optional_middle), ("last", false)],
  );
  pipeline.on("first", |ctx: ContextData<TestContext>| async move {
    Ok::<_, TestError>(record_step(&ctx, "first"))
  });
  pipeline.on("last", |ctx: ContextData<TestContext>| async move {
    Ok::<_, TestError>(record_step(&ctx, "last"))
  });
  pipeline
}

#[tokio::test]
#[serial]
async fn runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = three_step_pipeline(false);
  pipeline.on("middle", |ctx: ContextData<TestContext>| async move {
    Ok::<_, TestError>(record_step(&ctx, "middle"))
  });

  let ctx = ContextData::new(TestContext::default());
  let outcome = pipeline.run(ctx.clone()).await.expect("completes");

  assert_eq!(outcome.status, RunStatus::Completed);
  assert!(outcome.failed_optional_steps.is_empty());
  assert_eq!(ctx.read().steps_executed, vec!["first", "middle", "last"]);
}

#[tokio::test]
#[serial]
async fn stop_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = three_step_pipeline(false);
  pipeline.on("middle", |ctx: ContextData<TestContext>| async move {
    Ok::<_, TestError>(record_step(&ctx, "middle"))
  });

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("middle".to_string()),
    ..TestContext::default()
  });
  let outcome = pipeline.run(ctx.clone()).await.expect("stops cleanly");

  assert_eq!(outcome.status, RunStatus::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["first", "middle"]);
}

#[tokio::test]
#[serial]
async fn required_step_failure_aborts() {
  setup_tracing();
  let mut pipeline = three_step_pipeline(false);
  pipeline.on("middle", |_ctx: ContextData<TestContext>| async move {
    Err::<StepControl, _>(TestError::Handler("db down".to_string()))
  });

  let ctx = ContextData::new(TestContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("db down".to_string()));
  assert_eq!(ctx.read().steps_executed, vec!["first"]);
}

#[tokio::test]
#[serial]
async fn optional_step_failure_is_swallowed() {
  setup_tracing();
  let mut pipeline = three_step_pipeline(true);
  pipeline.on("middle", |_ctx: ContextData<TestContext>| async move {
    Err::<StepControl, _>(TestError::Handler("smtp timeout".to_string()))
  });

  let ctx = ContextData::new(TestContext::default());
  let outcome = pipeline.run(ctx.clone()).await.expect("optional failures do not fail the run");

  assert!(outcome.is_completed());
  assert!(outcome.optional_step_failed("middle"));
  assert_eq!(ctx.read().steps_executed, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn missing_handlers() {
  setup_tracing();
  let ctx = ContextData::new(TestContext::default());

  let optional_empty = three_step_pipeline(true);
  let outcome = optional_empty.run(ctx.clone()).await.expect("optional step without handlers is skipped");
  assert!(outcome.is_completed());

  let required_empty = three_step_pipeline(false);
  let err = required_empty.run(ContextData::new(TestContext::default())).await.unwrap_err();
  match err {
    TestError::Workflow(msg) => assert!(msg.contains("middle")),
    other => panic!("expected workflow error, got {other:?}"),
  }
}

#[tokio::test]
#[serial]
async fn skip_condition_is_evaluated_against_context() {
  setup_tracing();
  let mut pipeline = three_step_pipeline(false);
  pipeline.on("middle", |ctx: ContextData<TestContext>| async move {
    Ok::<_, TestError>(record_step(&ctx, "middle"))
  });
  pipeline.skip_if("middle", |data: &TestContext| data.counter > 0);

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.expect("completes");
  assert_eq!(ctx.read().steps_executed, vec!["first", "last"]);
}
