use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::StatusCode;
use serde_json::{Map, Value};

/// The body a handler has produced so far.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Text(String),
    Json(Value),
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

/// The response built up by the handlers of a request.
///
/// Every handler in a chain sees the same response, so middleware can add to
/// what earlier middleware produced:
/// ```rust
/// use nestrouter::Response;
///
/// let mut res = Response::default();
/// res.json_mut().insert("one".into(), 1.into());
/// res.json_mut().insert("two".into(), 2.into());
///
/// assert_eq!(res.body(), &nestrouter::Body::Json(serde_json::json!({ "one": 1, "two": 2 })));
/// ```
#[derive(Debug, Default)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Replaces the body with a JSON value.
    pub fn json(&mut self, value: Value) {
        self.body = Body::Json(value);
    }

    /// Replaces the body with plain text.
    pub fn text(&mut self, text: impl Into<String>) {
        self.body = Body::Text(text.into());
    }

    /// Returns the body as a JSON object, replacing any other body with an
    /// empty object first.
    pub fn json_mut(&mut self) -> &mut Map<String, Value> {
        if !matches!(self.body, Body::Json(Value::Object(_))) {
            self.body = Body::Json(Value::Object(Map::new()));
        }

        match &mut self.body {
            Body::Json(Value::Object(map)) => map,
            _ => unreachable!("body was just set to an object"),
        }
    }

    /// Converts into a `hyper` response, filling in the content type when the
    /// handlers did not set one.
    pub fn into_hyper(self) -> hyper::Response<hyper::Body> {
        let (content_type, body) = match self.body {
            Body::Empty => (None, hyper::Body::empty()),
            Body::Text(text) => (Some("text/plain; charset=utf-8"), hyper::Body::from(text)),
            Body::Json(value) => (Some("application/json"), hyper::Body::from(value.to_string())),
        };

        let mut res = hyper::Response::new(body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;

        if let Some(content_type) = content_type {
            res.headers_mut()
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(content_type));
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_mut_replaces_text() {
        let mut res = Response::default();
        res.text("Not Found");
        res.json_mut().insert("test".into(), "deep".into());
        assert_eq!(res.body(), &Body::Json(json!({ "test": "deep" })));
    }

    #[test]
    fn into_hyper_sets_content_type() {
        let mut res = Response::default();
        res.set_status(StatusCode::PAYMENT_REQUIRED);
        res.json(json!({ "message": "this is an error" }));

        let res = res.into_hyper();
        assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn explicit_content_type_wins() {
        let mut res = Response::default();
        res.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        res.text("<h1>hi</h1>");
        assert_eq!(res.into_hyper().headers()[header::CONTENT_TYPE], "text/html");
    }
}
