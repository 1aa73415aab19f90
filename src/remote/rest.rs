//! PostgREST Store
//!
//! `RemoteStore` over the hosted REST endpoint.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use shopping_sync::gateway::postgrest::{
    filter_param, parse_error, parse_rows, select_params, RETURN_REPRESENTATION, SINGLE_OBJECT,
};
use shopping_sync::gateway::{Mutation, RemoteStore, Select};
use shopping_sync::{RemoteConfig, StoreError, StoreResult};

pub struct PostgrestStore {
    client: Client,
    config: RemoteConfig,
}

impl PostgrestStore {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.config.rest_url(table))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Vec<Value>> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &body));
        }
        parse_rows(&body)
    }
}

#[async_trait(?Send)]
impl RemoteStore for PostgrestStore {
    async fn select(&self, query: &Select) -> StoreResult<Vec<Value>> {
        let mut request = self
            .request(Method::GET, &query.table)
            .query(&select_params(query));
        if query.single {
            request = request.header(ACCEPT, SINGLE_OBJECT);
        }
        self.send(request).await
    }

    async fn execute(&self, mutation: &Mutation) -> StoreResult<Vec<Value>> {
        let request = match mutation {
            Mutation::Insert { table, row } => self.request(Method::POST, table).json(row),
            Mutation::Update {
                table,
                filter,
                patch,
            } => self
                .request(Method::PATCH, table)
                .query(&[filter_param(filter)])
                .json(patch),
            Mutation::Delete { table, filter } => self
                .request(Method::DELETE, table)
                .query(&[filter_param(filter)]),
        };
        self.send(request.header("Prefer", RETURN_REPRESENTATION))
            .await
    }
}
