// storefront/src/web/routes.rs

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::{
  auth_handlers, category_handlers, coupon_handlers, cron_handlers, customer_handlers, order_handlers,
  payment_handlers, product_handlers, report_handlers, review_handlers, sitemap_handlers,
};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Reports database reachability along with process liveness.
async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&app_state.db_pool).await {
    Ok(_) => HttpResponse::Ok().json(json!({ "success": true, "status": "ok", "database": "ok" })),
    Err(e) => {
      tracing::error!(error = %e, "Health check could not reach the database.");
      HttpResponse::ServiceUnavailable().json(json!({ "success": false, "status": "degraded", "database": "unreachable" }))
    }
  }
}

/// Body, path and query decoding errors answer with the usual 400 JSON body.
pub fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().limit(2 * 1024 * 1024).error_handler(|err, _req| {
      let message = format!("Geçersiz istek gövdesi: {}", err);
      AppError::Validation(message).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
      let message = format!("Geçersiz sorgu parametresi: {}", err);
      AppError::Validation(message).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
      let message = format!("Geçersiz adres parametresi: {}", err);
      AppError::Validation(message).into()
    }));
}

// Literal segments are registered before `{id}` routes that would otherwise capture them.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);

  cfg.route("/sitemap.xml", web::get().to(sitemap_handlers::sitemap_handler));

  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Products
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/slug/{slug}", web::get().to(product_handlers::get_product_by_slug_handler))
          .route("/bulk-import", web::post().to(product_handlers::bulk_import_products_handler))
          .route("/bulk-delete", web::post().to(product_handlers::bulk_delete_products_handler))
          .route("/{id}", web::get().to(product_handlers::get_product_handler))
          .route("/{id}", web::put().to(product_handlers::update_product_handler))
          .route("/{id}", web::delete().to(product_handlers::delete_product_handler)),
      )
      // Categories
      .service(
        web::scope("/categories")
          .route("", web::get().to(category_handlers::list_categories_handler))
          .route("", web::post().to(category_handlers::create_category_handler))
          .route("/{id}", web::put().to(category_handlers::update_category_handler))
          .route("/{id}", web::delete().to(category_handlers::delete_category_handler)),
      )
      // Coupons
      .service(
        web::scope("/coupons")
          .route("", web::get().to(coupon_handlers::list_coupons_handler))
          .route("", web::post().to(coupon_handlers::create_coupon_handler))
          .route("/validate", web::post().to(coupon_handlers::validate_coupon_handler))
          .route("/{id}", web::put().to(coupon_handlers::update_coupon_handler))
          .route("/{id}", web::delete().to(coupon_handlers::delete_coupon_handler)),
      )
      // Orders
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/deleted", web::get().to(order_handlers::list_deleted_orders_handler))
          .route(
            "/deleted/{id}/restore",
            web::post().to(order_handlers::restore_deleted_order_handler),
          )
          .route("/track/{number}", web::get().to(order_handlers::track_order_handler))
          .route("/{id}", web::get().to(order_handlers::get_order_handler))
          .route("/{id}/status", web::patch().to(order_handlers::update_order_status_handler))
          .route("/{id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{id}/refund", web::post().to(order_handlers::refund_order_handler)),
      )
      // Authentication
      .service(
        web::scope("/auth")
          .route("/otp/request", web::post().to(auth_handlers::request_otp_handler))
          .route("/otp/verify", web::post().to(auth_handlers::verify_otp_handler))
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route("/logout", web::post().to(auth_handlers::logout_handler))
          .route("/me", web::get().to(auth_handlers::me_handler)),
      )
      // Customers
      .service(
        web::scope("/customers")
          .route("", web::get().to(customer_handlers::list_customers_handler))
          .route("/me/orders", web::get().to(customer_handlers::my_orders_handler)),
      )
      // Reviews
      .service(
        web::scope("/reviews")
          .route("", web::get().to(review_handlers::list_reviews_handler))
          .route("", web::post().to(review_handlers::create_review_handler))
          .route("/{id}/helpful", web::post().to(review_handlers::mark_review_helpful_handler))
          .route("/{id}/approve", web::patch().to(review_handlers::approve_review_handler))
          .route("/{id}", web::delete().to(review_handlers::delete_review_handler)),
      )
      // Admin reports
      .route(
        "/admin/reports/sales",
        web::get().to(report_handlers::sales_report_handler),
      )
      // Cron triggers; external schedulers use either verb.
      .service(
        web::scope("/cron")
          .route("/order-automation", web::post().to(cron_handlers::order_automation_handler))
          .route("/order-automation", web::get().to(cron_handlers::order_automation_handler))
          .route("/verify-payments", web::post().to(cron_handlers::verify_payments_handler))
          .route("/verify-payments", web::get().to(cron_handlers::verify_payments_handler)),
      )
      // Payments
      .route("/payments/callback", web::post().to(payment_handlers::payment_callback_handler)),
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::auth_service::session_cookie;
  use crate::state::tests::test_state;
  use actix_web::http::{header, StatusCode};
  use actix_web::{test, App};
  use chrono::Utc;
  use florist::SESSION_COOKIE_NAME;
  use std::time::Instant;
  use uuid::Uuid;

  #[actix_web::test]
  async fn malformed_json_is_a_validation_error() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(test_state()))
        .configure(configure_app_routes),
    )
    .await;
    let req = test::TestRequest::post()
      .uri("/api/coupons/validate")
      .insert_header((header::CONTENT_TYPE, "application/json"))
      .set_payload("{\"code\": ")
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
  }

  #[actix_web::test]
  async fn admin_and_cron_routes_reject_missing_credentials() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(test_state()))
        .configure(configure_app_routes),
    )
    .await;
    for (method, path) in [
      ("GET", "/api/orders"),
      ("GET", "/api/orders/deleted"),
      ("GET", "/api/admin/reports/sales"),
      ("POST", "/api/products/bulk-delete"),
      ("POST", "/api/cron/order-automation"),
      ("GET", "/api/cron/verify-payments"),
    ] {
      let req = match method {
        "GET" => test::TestRequest::get(),
        _ => test::TestRequest::post().set_json(serde_json::json!({ "ids": [] })),
      }
      .uri(path)
      .to_request();
      let resp = test::call_service(&app, req).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{} {}", method, path);
    }
  }

  #[actix_web::test]
  async fn logout_clears_the_session_cookie() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(test_state()))
        .configure(configure_app_routes),
    )
    .await;
    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/auth/logout").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp
      .response()
      .cookies()
      .find(|c| c.name() == SESSION_COOKIE_NAME)
      .expect("session cookie is cleared");
    assert_eq!(cleared.value(), "");
  }

  #[actix_web::test]
  async fn repeated_helpful_vote_is_throttled() {
    let state = test_state();
    let customer_id = Uuid::new_v4();
    let review_id = Uuid::new_v4();
    let cookie = session_cookie(&state.config, customer_id, "ayse@example.com", Utc::now());
    // First vote already counted in this window.
    assert!(state
      .vote_throttle
      .try_register(review_id, &format!("customer:{}", customer_id), Instant::now()));

    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state))
        .configure(configure_app_routes),
    )
    .await;
    let req = test::TestRequest::post()
      .uri(&format!("/api/reviews/{}/helpful", review_id))
      .cookie(cookie)
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
  }
}
