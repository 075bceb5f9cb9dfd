use crate::dispatcher::HandlerRequest;
use anyhow::Result;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A handler request with its validated inputs deserialized into one typed
/// value.
///
/// Path parameters, query parameters and body fields are merged into a
/// single object (body fields win on name collisions) and deserialized
/// into `T`, so handlers can declare a plain struct instead of poking at
/// JSON values.
#[derive(Debug, Clone)]
pub struct TypedRequest<T> {
    pub method: Method,
    pub path: String,
    pub route: String,
    pub data: T,
}

impl<T> TypedRequest<T>
where
    T: DeserializeOwned,
{
    /// Deserialize a validated request into `T`.
    ///
    /// The inputs have already passed the route's declared schemas, so a
    /// failure here means the declared shapes and the handler's type
    /// disagree: a programming error worth a clear message, not a silent
    /// fallback.
    pub fn from_request(req: &HandlerRequest) -> Result<Self> {
        let mut data_map = Map::new();

        for (k, v) in &req.params {
            data_map.insert(k.clone(), v.clone());
        }
        for (k, v) in &req.query {
            data_map.insert(k.clone(), v.clone());
        }
        match &req.body {
            Value::Object(map) => {
                for (k, v) in map {
                    data_map.insert(k.clone(), v.clone());
                }
            }
            Value::Null => {}
            other => {
                data_map.insert("body".to_string(), other.clone());
            }
        }

        let data: T = serde_json::from_value(Value::Object(data_map))?;

        Ok(TypedRequest {
            method: req.method.clone(),
            path: req.path.clone(),
            route: req.route.clone(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct GetUser {
        id: i64,
        verbose: Option<bool>,
    }

    fn request() -> HandlerRequest {
        let mut params = Map::new();
        params.insert("id".to_string(), json!(42));
        let mut query = Map::new();
        query.insert("verbose".to_string(), json!(true));
        HandlerRequest {
            id: RequestId::new(),
            method: Method::GET,
            path: "/users/42".to_string(),
            route: "get_user".to_string(),
            params,
            query,
            body: Value::Null,
        }
    }

    #[test]
    fn test_merges_params_and_query() {
        let typed = TypedRequest::<GetUser>::from_request(&request()).expect("typed");
        assert_eq!(typed.data.id, 42);
        assert_eq!(typed.data.verbose, Some(true));
    }

    #[test]
    fn test_body_fields_win_collisions() {
        #[derive(Debug, Deserialize)]
        struct Patch {
            name: String,
        }
        let mut req = request();
        req.body = json!({ "name": "from-body" });
        let typed = TypedRequest::<Patch>::from_request(&req).expect("typed");
        assert_eq!(typed.data.name, "from-body");
    }
}
