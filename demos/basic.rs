//! Minimal sendero example: a nested route tree with a mounted sub-router.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d 'name=alice'
//!   curl 'http://localhost:3000/search?q=rust+lang'
//!   curl http://localhost:3000/reports/q1.csv
//!   curl http://localhost:3000/admin/stats -H 'x-role: admin'
//!   curl -i http://localhost:3000/old-users

use sendero::{Condition, Flow, Matcher, Route, Router, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let admin = Router::builder()
        .condition("role", |req, role| req.header("x-role") == Some(role))
        .build(|r| {
            r.get(("stats", Condition::named("role", "admin")), |_, _| "42 users")?;
            r.response().status(StatusCode::FORBIDDEN);
            r.halt()
        });

    let app = match Router::builder().symbol("id", r"\d+") {
        Ok(builder) => builder.build(move |r| tree(r, &admin)),
        Err(e) => {
            eprintln!("bad route config: {e}");
            return;
        }
    };

    if let Err(e) = Server::bind(([0, 0, 0, 0], 3000).into()).serve(app).await {
        eprintln!("server error: {e}");
    }
}

fn tree(r: &mut Route<'_>, admin: &Router) -> Flow {
    r.root(|_, _| "<h1>home</h1>")?;

    r.on("users", |r, _| {
        r.get((), |_, _| "all users")?;
        r.get(Matcher::placeholder("id"), |_, caps| {
            format!("user {}", &caps[0])
        })?;
        r.post((), |r, _| {
            r.response().header("location", "/users/99");
            StatusCode::CREATED
        })
    })?;

    r.get(("search", Condition::Param("q".into())), |_, caps| {
        format!("results for {}", &caps[0])
    })?;

    r.get(("reports", Condition::Extension("csv".into())), |r, caps| {
        r.response().header("content-type", "text/csv");
        format!("report,{}\n", &caps[0])
    })?;

    r.on("admin", |r, _| r.run(admin))?;

    r.is("old-users", |r, _| r.redirect("/users"))
}
