//! Minimal tsu-typed example: validated JSON endpoints.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl 'http://localhost:3000/users?page=2'
//!   curl 'http://localhost:3000/users?page=zero'           # 400, query
//!   curl http://localhost:3000/users/7
//!   curl http://localhost:3000/users/seven                 # 400, params
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"email":"alice@example.com"}'
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"email":"nope"}'                               # 400, body

use std::num::NonZeroU32;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tsu_typed::{
    Issue, Next, Request, Response, RouteSchemas, Server, Typed, TypedRouter, define_route,
    handler, middleware, typed_route,
};

#[derive(Deserialize, Serialize)]
struct ListUsers {
    #[serde(default = "first_page")]
    page: NonZeroU32,
}

fn first_page() -> NonZeroU32 { NonZeroU32::MIN }

#[derive(Deserialize, Serialize)]
struct UserId {
    id: u64,
}

#[derive(Deserialize, Serialize)]
struct NewUser {
    email: String,
}

#[derive(Deserialize, Serialize)]
struct User {
    id: u64,
    email: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let new_user = Typed::<NewUser>::new().refine(|u: &NewUser| {
        if u.email.contains('@') {
            Ok(())
        } else {
            Err(Issue::new("must be an email address").at("email"))
        }
    });

    let create = define_route(
        RouteSchemas::new()
            .body(new_user)
            .response(201, Typed::<User>::new()),
    );

    let app = TypedRouter::new()
        .middleware(middleware(log_request))
        .get("/users", typed_route().query(Typed::<ListUsers>::coerce()).handler(list_users))
        .get("/users/{id}", typed_route().params(Typed::<UserId>::coerce()).handler(get_user))
        .post("/users", (create, handler(create_user)));

    if let Err(e) = Server::bind("0.0.0.0:3000").serve(app).await {
        eprintln!("server error: {e}");
    }
}

async fn log_request(req: Request, next: Next) -> Response {
    tracing::info!(method = %req.method(), path = req.path(), "request");
    next.run(req).await
}

// GET /users?page=N
async fn list_users(req: Request) -> Response {
    match req.query_as::<ListUsers>() {
        Ok(q) => Response::json_value(&json!({ "page": q.page, "users": [] })),
        Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    match req.params_as::<UserId>() {
        Ok(UserId { id }) => Response::json_value(&User { id, email: "alice@example.com".into() }),
        Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// POST /users → 201
async fn create_user(req: Request) -> Response {
    match req.body_as::<NewUser>() {
        Ok(NewUser { email }) => {
            Response::builder()
                .status(StatusCode::CREATED)
                .header("location", "/users/99")
                .json_value(&User { id: 99, email })
        }
        Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
