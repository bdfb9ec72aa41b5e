//! Demo endpoints over the in-memory [`WidgetStore`].
//!
//! | Method | Url | Access |
//! |--------|-----|--------|
//! | `GET` | `/widgets` | anyone |
//! | `GET` | `/widgets/{id}` | anyone |
//! | `POST` | `/widgets` | any known token |
//! | `DELETE` | `/widgets/{id}` | admin tokens |
//! | `GET` | `/me` | any known token |

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    handler_fn, Context, Endpoint, EndpointConfig, EndpointError, Handler, Json, Method, Output,
    Response, Route, RoutePath, Status, TokenResolver,
};
use schema::{Field, ObjectSchema};
use serde::Serialize;
use uuid::Uuid;

use crate::args::TokenGrant;
use crate::store::{NewWidget, WidgetStore};

/// Principal resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub name: String,
    pub admin: bool,
}

/// Static secret → caller table built from `--token` arguments.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    callers: Arc<HashMap<String, Caller>>,
}

impl TokenTable {
    pub fn new(grants: &[TokenGrant]) -> Self {
        let callers = grants
            .iter()
            .map(|grant| {
                (
                    grant.secret.clone(),
                    Caller {
                        name: grant.name.clone(),
                        admin: grant.admin,
                    },
                )
            })
            .collect();
        Self {
            callers: Arc::new(callers),
        }
    }

    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}

#[async_trait]
impl TokenResolver<Caller> for TokenTable {
    async fn retrieve_token(&self, credential: &str) -> Result<Option<Caller>, EndpointError> {
        Ok(self.callers.get(credential).cloned())
    }
}

fn url(path: &'static str) -> Result<RoutePath, anyhow::Error> {
    RoutePath::new(path).ok_or_else(|| anyhow::anyhow!("invalid route path '{path}'"))
}

fn widget_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field("name", Field::string().required().min_length(1).max_length(64))
        .field("quantity", Field::integer().min(0.0))
        .field("tags", Field::array(Field::string().max_length(32)).max_length(10))
}

fn widget_id(raw: Option<&str>) -> Result<Uuid, EndpointError> {
    raw.and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| EndpointError::domain("widget.id", "\"id\" must be a valid uuid"))
}

/// `GET /widgets/{id}`; answers a missing widget with `404`.
struct GetWidget {
    store: Arc<WidgetStore>,
}

#[async_trait]
impl Handler<()> for GetWidget {
    async fn call(
        &self,
        response: &mut Response,
        context: Context<()>,
    ) -> Result<Output, EndpointError> {
        let id = widget_id(context.param("id"))?;
        match self.store.get(id).await {
            Some(widget) => Ok(Output::json(widget)),
            None => {
                response.set_error_status(Status::NOT_FOUND);
                Err(EndpointError::domain("widget.id", "widget not found"))
            }
        }
    }
}

/// `DELETE /widgets/{id}`; deleting an unknown widget is also a `404`.
struct DeleteWidget {
    store: Arc<WidgetStore>,
}

#[async_trait]
impl Handler<Caller> for DeleteWidget {
    async fn call(
        &self,
        response: &mut Response,
        context: Context<Caller>,
    ) -> Result<Output, EndpointError> {
        let id = widget_id(context.param("id"))?;
        match self.store.remove(id).await {
            Some(widget) => {
                tracing::info!(%id, by = %context.token().name, "widget deleted");
                Ok(Output::json(widget))
            }
            None => {
                response.set_error_status(Status::NOT_FOUND);
                Err(EndpointError::domain("widget.id", "widget not found"))
            }
        }
    }
}

/// Builds the route table for the demo server.
pub fn routes(
    store: Arc<WidgetStore>,
    tokens: TokenTable,
) -> Result<Vec<Arc<dyn Route>>, anyhow::Error> {
    let list_store = Arc::clone(&store);
    let list = Endpoint::unauthenticated(
        Method::Get,
        url("/widgets")?,
        handler_fn(move |_ctx: Context<()>| {
            let store = Arc::clone(&list_store);
            async move { Ok(Output::sequence(store.list().await.into_iter().map(Json))) }
        }),
    );

    let get = Endpoint::unauthenticated(
        Method::Get,
        url("/widgets/{id}")?,
        GetWidget {
            store: Arc::clone(&store),
        },
    );

    let create_store = Arc::clone(&store);
    let create = Endpoint::new(
        EndpointConfig::new(
            Method::Post,
            url("/widgets")?,
            tokens.clone(),
            handler_fn(move |ctx: Context<Caller>| {
                let store = Arc::clone(&create_store);
                async move {
                    let new: NewWidget = ctx.body_as()?;
                    let widget = store.insert(new).await;
                    tracing::info!(id = %widget.id, by = %ctx.token().name, "widget created");
                    Ok::<_, EndpointError>(Output::json(widget))
                }
            }),
        )
        .schema(widget_schema()),
    );

    let delete = Endpoint::new(
        EndpointConfig::new(
            Method::Delete,
            url("/widgets/{id}")?,
            tokens.clone(),
            DeleteWidget { store },
        )
        .authorize(|caller: &Caller| caller.admin),
    );

    let me = Endpoint::new(EndpointConfig::new(
        Method::Get,
        url("/me")?,
        tokens,
        handler_fn(|ctx: Context<Caller>| async move {
            Ok(Output::json(ctx.token().clone()))
        }),
    ));

    Ok(vec![
        Arc::new(list),
        Arc::new(get),
        Arc::new(create),
        Arc::new(delete),
        Arc::new(me),
    ])
}
