use nestrouter::{handler_fn, App, Router};

use hyper::header::CONTENT_TYPE;
use hyper::service::Service;
use hyper::{Body, Request, StatusCode};

fn app() -> App {
    let users = Router::default().get(
        "/:id",
        handler_fn(|req, res, next| {
            let id = req.params().get("id").unwrap_or_default().to_owned();
            let connection = req.connection().0;
            res.json(serde_json::json!({ "id": id, "connection": connection }));
            next.run(req, res)
        }),
    );

    App::new().with(Router::default().nest("/user", users.routes()).routes())
}

async fn body(res: hyper::Response<Body>) -> String {
    let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn serves_requests_per_connection() {
    let mut make = app().into_service();

    let mut first = make.call(()).await.unwrap();
    let mut second = make.call(()).await.unwrap();

    let res = first
        .call(Request::get("/user/42").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(body(res).await, r#"{"connection":1,"id":"42"}"#);

    let res = second
        .call(Request::get("/user/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body(res).await, r#"{"connection":2,"id":"7"}"#);
}

#[tokio::test]
async fn not_found_is_plain_text() {
    let mut make = app().into_service();
    let mut service = make.call(()).await.unwrap();

    let res = service
        .call(Request::get("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(body(res).await, "Not Found");
}

#[tokio::test]
async fn serves_over_hyper() {
    let addr = ([127, 0, 0, 1], 0).into();
    let server = hyper::Server::bind(&addr).serve(app().into_service());
    let addr = server.local_addr();
    tokio::spawn(server);

    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::handshake(stream).await.unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let res = sender
        .send_request(Request::get("/user/3").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(res).await, r#"{"connection":1,"id":"3"}"#);
}
