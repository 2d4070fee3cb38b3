// storefront/src/pipelines/register_pipeline.rs

use crate::db;
use crate::db::customers::NewCustomer;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::RegisterCtxData;
use crate::services::{auth_service, email};
use florist::{ContextData, Pipeline, StepControl};
use tracing::{event, info, instrument, warn, Level};

pub fn build_register_pipeline() -> Pipeline<RegisterCtxData, AppError> {
  let mut p = Pipeline::<RegisterCtxData, AppError>::new(
    "register_customer",
    &[
      ("check_email_available", false),
      ("create_customer", false),
      ("send_welcome_email", true),
    ],
  );
  p.on("check_email_available", check_email_available);
  p.on("create_customer", create_customer);
  p.on("send_welcome_email", send_welcome_email);
  p
}

#[instrument(name = "register::check_email_available", skip_all, err(Display))]
async fn check_email_available(ctx: ContextData<RegisterCtxData>) -> AppResult<StepControl> {
  let (email_val, name_val, pool) = {
    let guard = ctx.read();
    (guard.email.clone(), guard.name.clone(), guard.app_state.db_pool.clone())
  };

  if name_val.trim().is_empty() {
    return Err(AppError::Validation("Ad soyad zorunludur.".to_string()));
  }
  event!(Level::DEBUG, email = %email_val, "Checking if customer email already exists.");
  if db::customers::email_exists(&pool, &email_val).await? {
    warn!(email = %email_val, "Registration attempted with an existing email.");
    return Err(AppError::Conflict(
      "Bu e-posta adresiyle kayıtlı bir hesap zaten var.".to_string(),
    ));
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "register::create_customer", skip_all, err(Display))]
async fn create_customer(ctx: ContextData<RegisterCtxData>) -> AppResult<StepControl> {
  let (email_val, name_val, phone_val, password_val, now, pool) = {
    let guard = ctx.read();
    (
      guard.email.clone(),
      guard.name.clone(),
      guard.phone.clone(),
      guard.password.clone(),
      guard.now,
      guard.app_state.db_pool.clone(),
    )
  };

  let password_hash = match password_val.as_deref() {
    Some(password) => Some(auth_service::hash_password(password)?),
    None => None,
  };

  let mut conn = pool.acquire().await?;
  let customer = db::customers::insert_customer(
    &mut conn,
    NewCustomer {
      email: &email_val,
      name: &name_val,
      phone: phone_val.as_deref(),
      password_hash: password_hash.as_deref(),
      // Registration only runs after an emailed code was verified.
      email_verified: true,
    },
    now,
  )
  .await?;

  info!(customer_id = %customer.id, "Customer registered.");
  ctx.write().customer = Some(customer);
  Ok(StepControl::Continue)
}

#[instrument(name = "register::send_welcome_email", skip_all, err(Display))]
async fn send_welcome_email(ctx: ContextData<RegisterCtxData>) -> AppResult<StepControl> {
  let (app_state, customer) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.customer.clone())
  };
  let Some(customer) = customer else {
    return Ok(StepControl::Continue);
  };

  common_steps::send_email(&app_state, &email::welcome_email(&customer.email, &customer.name)).await?;
  ctx.write().welcome_email_sent = true;
  Ok(StepControl::Continue)
}
