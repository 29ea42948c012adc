//! TypeGraph entity client API.
//!
//! This module provides the `EntityClient` struct for managing entities and
//! their classifications on a TypeGraph service.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use typegraph_proto::current::{Classification, Entity};
use typegraph_proto::{EntityMutationResponse, SearchFilter};

use crate::api::{self, ApiInfo};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::transport::{Request, Response, Transport};

/// An entity client over a [`Transport`].
///
/// # Example
///
/// ```ignore
/// use typegraph_client::{ClientConfig, EntityClient};
/// use typegraph_proto::current::{Entity, Value};
///
/// async fn run(transport: impl typegraph_client::Transport) -> Result<(), typegraph_client::Error> {
///     let client = EntityClient::new(transport, ClientConfig::localhost())?;
///
///     let entity = Entity::new("Employee").with_attribute("name", Value::String("Ada".into()));
///     let created = client.create_entity(&entity).await?;
///
///     let fetched = client.get_entity_by_guid(&created.created[0].guid).await?;
///     println!("{}", fetched.type_name);
///     Ok(())
/// }
/// ```
pub struct EntityClient<T> {
    transport: T,
    config: ClientConfig,
    base_url: Url,
    next_request_id: AtomicU64,
}

impl<T: Transport> EntityClient<T> {
    /// Create a client sending through `transport`.
    pub fn new(transport: T, config: ClientConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::InvalidArgument(format!("invalid base URL '{}': {}", config.base_url, e))
        })?;
        Ok(Self {
            transport,
            config,
            base_url,
            next_request_id: AtomicU64::new(1),
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ========== Single entity ==========

    /// Get an entity by guid.
    pub async fn get_entity_by_guid(&self, guid: &str) -> Result<Entity, Error> {
        self.call(&api::GET_ENTITY_BY_GUID, &[guid], &[], None::<&()>).await
    }

    /// Create an entity.
    pub async fn create_entity(&self, entity: &Entity) -> Result<EntityMutationResponse, Error> {
        self.call(&api::CREATE_ENTITY, &[], &[], Some(entity)).await
    }

    /// Update the entity with the given guid.
    pub async fn update_entity(&self, guid: &str, entity: &Entity) -> Result<EntityMutationResponse, Error> {
        self.call(&api::UPDATE_ENTITY, &[guid], &[], Some(entity)).await
    }

    /// Delete an entity by guid.
    pub async fn delete_entity_by_guid(&self, guid: &str) -> Result<EntityMutationResponse, Error> {
        self.call(&api::DELETE_ENTITY_BY_GUID, &[guid], &[], None::<&()>).await
    }

    // ========== Classifications ==========

    /// Classifications attached to an entity.
    pub async fn get_classifications(&self, guid: &str) -> Result<Vec<Classification>, Error> {
        self.call(&api::GET_CLASSIFICATIONS, &[guid], &[], None::<&()>).await
    }

    /// Attach classifications to an entity.
    pub async fn add_classifications(&self, guid: &str, classifications: &[Classification]) -> Result<(), Error> {
        self.call_empty(&api::ADD_CLASSIFICATIONS, &[guid], &[], Some(classifications))
            .await
    }

    /// Replace the attributes of classifications attached to an entity.
    pub async fn update_classifications(
        &self,
        guid: &str,
        classifications: &[Classification],
    ) -> Result<(), Error> {
        self.call_empty(&api::UPDATE_CLASSIFICATIONS, &[guid], &[], Some(classifications))
            .await
    }

    /// Detach one classification from an entity.
    pub async fn delete_classification(&self, guid: &str, classification: &str) -> Result<(), Error> {
        self.call_empty(&api::DELETE_CLASSIFICATION, &[guid, classification], &[], None::<&()>)
            .await
    }

    /// Detach every classification from an entity.
    pub async fn delete_classifications(&self, guid: &str) -> Result<(), Error> {
        self.call_empty(&api::DELETE_CLASSIFICATIONS, &[guid], &[], None::<&()>)
            .await
    }

    // ========== Bulk ==========

    /// Get several entities, in request order.
    pub async fn get_entities_by_guids(&self, guids: &[String]) -> Result<Vec<Entity>, Error> {
        require_guids(guids)?;
        self.call(&api::GET_ENTITIES_BY_GUIDS, &[], &api::guid_query(guids), None::<&()>)
            .await
    }

    /// Create several entities, returning the stored ones in request order.
    pub async fn create_entities(&self, entities: &[Entity]) -> Result<Vec<Entity>, Error> {
        self.call(&api::CREATE_ENTITIES, &[], &[], Some(entities)).await
    }

    /// Update several entities, matched by guid, returning the stored ones
    /// in request order.
    pub async fn update_entities(&self, entities: &[Entity]) -> Result<Vec<Entity>, Error> {
        self.call(&api::UPDATE_ENTITIES, &[], &[], Some(entities)).await
    }

    /// Delete several entities.
    pub async fn delete_entities_by_guids(&self, guids: &[String]) -> Result<EntityMutationResponse, Error> {
        require_guids(guids)?;
        self.call(&api::DELETE_ENTITIES_BY_GUIDS, &[], &api::guid_query(guids), None::<&()>)
            .await
    }

    /// Entities matching `filter`.
    pub async fn search_entities(&self, filter: &SearchFilter) -> Result<Vec<Entity>, Error> {
        self.call(&api::SEARCH_ENTITIES, &[], &filter.to_query_pairs(), None::<&()>)
            .await
    }

    // ========== Plumbing ==========

    /// Send a request and decode the JSON body of a successful response.
    async fn call<B, R>(
        &self,
        api: &ApiInfo,
        params: &[&str],
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(api, params, query, body).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Send a request whose successful response body, if any, is ignored.
    async fn call_empty<B>(
        &self,
        api: &ApiInfo,
        params: &[&str],
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<(), Error>
    where
        B: Serialize + ?Sized,
    {
        self.send(api, params, query, body).await.map(|_| ())
    }

    async fn send<B>(
        &self,
        api: &ApiInfo,
        params: &[&str],
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<Response, Error>
    where
        B: Serialize + ?Sized,
    {
        let request = Request {
            method: api.method,
            url: api.url(&self.base_url, params, query)?,
            body: body.map(serde_json::to_vec).transpose()?,
        };
        let request_id = self.next_request_id();
        debug!(request_id, method = api.method.as_str(), url = %request.url, "sending request");

        let response = tokio::time::timeout(self.config.timeout, self.transport.send(request))
            .await
            .map_err(|_| Error::Timeout)??;

        debug!(
            request_id,
            status = response.status,
            nominal = api.expected_status,
            "received response"
        );
        if !response.is_success() {
            return Err(Error::Service {
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response)
    }

    /// Get the next request ID.
    fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::SeqCst)
    }
}

fn require_guids(guids: &[String]) -> Result<(), Error> {
    if guids.is_empty() || guids.iter().any(String::is_empty) {
        return Err(Error::InvalidArgument("guids must be non-empty".to_string()));
    }
    Ok(())
}

impl<T> std::fmt::Debug for EntityClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.config.timeout)
            .field("next_request_id", &self.next_request_id.load(Ordering::SeqCst))
            .finish()
    }
}
