use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use florist::{
  calculate_automation_schedule, due_transitions, hash_code, sign_session, verify_session, ContextData, OrderStatus,
  OtpPurpose, Pipeline, ScheduleInput, SessionClaims, StepControl, WorkflowError,
};
use std::sync::Arc;
use tokio::runtime::Runtime;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("bench workflow error: {0}")]
struct BenchError(#[from] WorkflowError);

fn bench_automation_schedule(c: &mut Criterion) {
  let mut group = c.benchmark_group("AutomationSchedule");
  let base = Utc.with_ymd_and_hms(2025, 3, 13, 0, 0, 0).single().expect("valid timestamp");

  group.bench_function("calculate_and_due", |b| {
    let mut hour = 0i64;
    b.iter(|| {
      hour = (hour + 1) % 24;
      let created_at = base + Duration::hours(hour);
      let input = ScheduleInput {
        created_at: Some(created_at),
        delivery_date: Some("2025-03-14"),
        stored_group: None,
      };
      if let Some(schedule) = calculate_automation_schedule(black_box(&input)) {
        black_box(due_transitions(&schedule, OrderStatus::Confirmed, created_at + Duration::hours(30)));
      }
    })
  });
  group.finish();
}

fn bench_auth_tokens(c: &mut Criterion) {
  let mut group = c.benchmark_group("AuthTokens");
  let secret = b"bench-secret";
  let now = Utc::now();

  group.bench_function("otp_hash", |b| {
    b.iter(|| hash_code(secret, black_box("482913"), black_box("Ayse@Example.com"), OtpPurpose::Login))
  });

  let claims = SessionClaims::new(Uuid::new_v4(), "ayse@example.com", now, Duration::days(30));
  let token = sign_session(&claims, secret);
  group.bench_function("session_sign", |b| b.iter(|| sign_session(black_box(&claims), secret)));
  group.bench_function("session_verify", |b| {
    b.iter(|| verify_session(black_box(&token), secret, now).is_ok())
  });
  group.finish();
}

fn bench_workflow_run(c: &mut Criterion) {
  let mut group = c.benchmark_group("WorkflowRun");
  let rt = Runtime::new().expect("tokio runtime");

  for num_steps in [1usize, 5, 10] {
    let names: Vec<String> = (0..num_steps).map(|i| format!("step_{}", i)).collect();
    let defs: Vec<(&str, bool)> = names.iter().map(|n| (n.as_str(), false)).collect();
    let mut pipeline = Pipeline::<BenchContext, BenchError>::new("bench", &defs);
    for name in &names {
      pipeline.on(name, |ctx: ContextData<BenchContext>| async move {
        ctx.write().counter += 1;
        Ok::<_, BenchError>(StepControl::Continue)
      });
    }
    let pipeline = Arc::new(pipeline);

    group.throughput(Throughput::Elements(num_steps as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_steps), &num_steps, |b, _| {
      b.to_async(&rt).iter_batched(
        || ContextData::new(BenchContext::default()),
        |ctx| {
          let pipeline = pipeline.clone();
          async move { pipeline.run(ctx).await.is_ok() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

criterion_group!(benches, bench_automation_schedule, bench_auth_tokens, bench_workflow_run);
criterion_main!(benches);
