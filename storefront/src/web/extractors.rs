// storefront/src/web/extractors.rs

//! Request guards: the customer session cookie and the admin / cron bearer secrets.

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use florist::{secrets_match, verify_session, SESSION_COOKIE_NAME};
use futures_util::future::{ready, Ready};
use tracing::{debug, warn};
use uuid::Uuid;

fn app_state(req: &HttpRequest) -> Result<&AppState, AppError> {
  req
    .app_data::<web::Data<AppState>>()
    .map(|data| data.get_ref())
    .ok_or_else(|| AppError::Internal("AppState is not registered on the app.".to_string()))
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
  let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  let token = token.trim();
  (!token.is_empty()).then_some(token)
}

/// A signed-in customer, read from the session cookie.
///
/// Use `Option<CustomerSession>` for routes that also serve guests.
#[derive(Debug, Clone)]
pub struct CustomerSession {
  pub customer_id: Uuid,
  pub email: String,
}

impl CustomerSession {
  fn from_request_sync(req: &HttpRequest) -> Result<Self, AppError> {
    let state = app_state(req)?;
    let cookie = req
      .cookie(SESSION_COOKIE_NAME)
      .ok_or_else(|| AppError::Auth("Oturum açmanız gerekiyor.".to_string()))?;
    let claims = verify_session(cookie.value(), state.config.session_secret.as_bytes(), Utc::now()).map_err(|e| {
      debug!(error = %e, "Session cookie rejected.");
      AppError::from(florist::FloristError::from(e))
    })?;
    Ok(Self {
      customer_id: claims.sub,
      email: claims.email,
    })
  }
}

impl FromRequest for CustomerSession {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Self::from_request_sync(req))
  }
}

fn check_bearer(req: &HttpRequest, expected: &str, guard: &'static str) -> Result<(), AppError> {
  match bearer_token(req) {
    Some(token) if secrets_match(token, expected) => Ok(()),
    Some(_) => {
      warn!(guard, path = %req.path(), "Rejected bearer secret.");
      Err(AppError::Auth("Yetkisiz erişim.".to_string()))
    }
    None => Err(AppError::Auth("Yetkilendirme başlığı eksik.".to_string())),
  }
}

/// Admin routes: `Authorization: Bearer <ADMIN_PASSWORD>`.
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard;

impl FromRequest for AdminGuard {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(app_state(req).and_then(|state| check_bearer(req, &state.config.admin_password, "admin").map(|_| AdminGuard)))
  }
}

/// Cron routes: `Authorization: Bearer <CRON_SECRET>`.
#[derive(Debug, Clone, Copy)]
pub struct CronGuard;

impl FromRequest for CronGuard {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(app_state(req).and_then(|state| check_bearer(req, &state.config.cron_secret, "cron").map(|_| CronGuard)))
  }
}

/// Either an admin bearer or a customer session; used where both may read.
#[derive(Debug, Clone)]
pub enum Viewer {
  Admin,
  Customer(CustomerSession),
}

impl FromRequest for Viewer {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = app_state(req).and_then(|state| {
      if bearer_token(req).is_some() {
        check_bearer(req, &state.config.admin_password, "admin").map(|_| Viewer::Admin)
      } else {
        CustomerSession::from_request_sync(req).map(Viewer::Customer)
      }
    });
    ready(result)
  }
}

/// Key identifying a voter for the helpful-vote throttle: the customer when
/// signed in, otherwise the socket peer address. Forwarding headers are ignored
/// since clients can set them freely; behind a proxy every anonymous voter
/// shares the proxy's key.
pub fn voter_key(req: &HttpRequest, session: Option<&CustomerSession>) -> String {
  match session {
    Some(session) => format!("customer:{}", session.customer_id),
    None => match req.peer_addr() {
      Some(addr) => format!("ip:{}", addr.ip()),
      None => "ip:unknown".to_string(),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::auth_service::session_cookie;
  use crate::state::tests::test_state;
  use actix_web::http::StatusCode;
  use actix_web::{test, App, HttpResponse};

  async fn admin_only(_admin: AdminGuard) -> HttpResponse {
    HttpResponse::Ok().finish()
  }

  async fn cron_only(_cron: CronGuard) -> HttpResponse {
    HttpResponse::Ok().finish()
  }

  async fn whoami(session: CustomerSession) -> HttpResponse {
    HttpResponse::Ok().body(session.customer_id.to_string())
  }

  #[actix_web::test]
  async fn bearer_guards_accept_only_their_own_secret() {
    let state = test_state();
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state))
        .route("/admin", web::get().to(admin_only))
        .route("/cron", web::get().to(cron_only)),
    )
    .await;

    let cases = [
      ("/admin", None, StatusCode::UNAUTHORIZED),
      ("/admin", Some("Bearer admin-secret"), StatusCode::OK),
      ("/admin", Some("bearer admin-secret"), StatusCode::OK),
      ("/admin", Some("Bearer cron-secret"), StatusCode::UNAUTHORIZED),
      ("/admin", Some("Basic admin-secret"), StatusCode::UNAUTHORIZED),
      ("/cron", Some("Bearer cron-secret"), StatusCode::OK),
      ("/cron", Some("Bearer admin-secret"), StatusCode::UNAUTHORIZED),
    ];
    for (path, header, expected) in cases {
      let mut req = test::TestRequest::get().uri(path);
      if let Some(value) = header {
        req = req.insert_header((AUTHORIZATION, value));
      }
      let resp = test::call_service(&app, req.to_request()).await;
      assert_eq!(resp.status(), expected, "{} with {:?}", path, header);
    }
  }

  #[actix_web::test]
  async fn session_cookie_identifies_the_customer() {
    let state = test_state();
    let customer_id = Uuid::new_v4();
    let cookie = session_cookie(&state.config, customer_id, "ayse@example.com", Utc::now());
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state))
        .route("/whoami", web::get().to(whoami)),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/whoami").cookie(cookie).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, customer_id.to_string());

    let resp = test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let forged = actix_web::cookie::Cookie::new(SESSION_COOKIE_NAME, "e30.c2lnbmF0dXJl");
    let resp = test::call_service(&app, test::TestRequest::get().uri("/whoami").cookie(forged).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[::core::prelude::v1::test]
  fn bearer_token_requires_scheme_and_value() {
    let req = test::TestRequest::default()
      .insert_header((AUTHORIZATION, "Bearer   abc  "))
      .to_http_request();
    assert_eq!(bearer_token(&req), Some("abc"));
    let req = test::TestRequest::default()
      .insert_header((AUTHORIZATION, "Bearer "))
      .to_http_request();
    assert_eq!(bearer_token(&req), None);
  }

  #[::core::prelude::v1::test]
  fn anonymous_voters_are_keyed_by_peer_not_forwarding_headers() {
    let peer: std::net::SocketAddr = "203.0.113.7:51234".parse().expect("socket address");
    let spoofed = |forwarded: &str| {
      test::TestRequest::default()
        .peer_addr(peer)
        .insert_header(("X-Forwarded-For", forwarded.to_string()))
        .to_http_request()
    };
    assert_eq!(voter_key(&spoofed("198.51.100.1"), None), "ip:203.0.113.7");
    assert_eq!(voter_key(&spoofed("198.51.100.2"), None), "ip:203.0.113.7");

    let session = CustomerSession {
      customer_id: Uuid::nil(),
      email: "ayse@example.com".to_string(),
    };
    assert_eq!(
      voter_key(&spoofed("198.51.100.1"), Some(&session)),
      format!("customer:{}", Uuid::nil())
    );
  }
}
