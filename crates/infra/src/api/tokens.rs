//! Token entity client
//!
//! Tokens live under their service account. Only the create response
//! carries the plain-text secret.

use async_trait::async_trait;
use permsys_core::TokenApi;
use permsys_domain::{ApiResult, ETag, Entity, EntityBundle, ScopeId, Token};
use tracing::instrument;

use super::client::ApiClient;
use super::paths;
use super::wire::{token_in_scope, TokenBody};

/// [`TokenApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct TokenClient {
    api: ApiClient,
}

impl TokenClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn settle(bundle: EntityBundle<Token>, scope: &ScopeId, service_account_id: &str) -> EntityBundle<Token> {
        let token = token_in_scope(bundle.payload, scope, service_account_id);
        EntityBundle::new(token, bundle.etag)
    }
}

#[async_trait]
impl TokenApi for TokenClient {
    #[instrument(skip(self), fields(scope = %scope))]
    async fn list_tokens(&self, scope: &ScopeId, service_account_id: &str) -> ApiResult<Vec<Token>> {
        let tokens: Vec<Token> = self.api.list(&paths::tokens(scope, service_account_id)).await?;
        Ok(tokens
            .into_iter()
            .map(|token| token_in_scope(token, scope, service_account_id))
            .collect())
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_token(
        &self,
        scope: &ScopeId,
        service_account_id: &str,
        id: &str,
    ) -> ApiResult<EntityBundle<Token>> {
        let bundle = self.api.get(&paths::token(scope, service_account_id, id)).await?;
        Ok(Self::settle(bundle, scope, service_account_id))
    }

    #[instrument(
        skip_all,
        fields(scope = %token.meta.scope_id, service_account = %token.service_account_id, name = %token.meta.name)
    )]
    async fn create_token(&self, token: &Token) -> ApiResult<EntityBundle<Token>> {
        let path = paths::tokens(token.scope(), &token.service_account_id);
        let bundle = self.api.create(&path, &TokenBody::create(token)).await?;
        Ok(Self::settle(bundle, token.scope(), &token.service_account_id))
    }

    #[instrument(skip_all, fields(scope = %token.meta.scope_id, id = %token.meta.id))]
    async fn update_token(&self, token: &Token, etag: &ETag) -> ApiResult<EntityBundle<Token>> {
        let path = paths::token(token.scope(), &token.service_account_id, token.id());
        let bundle = self.api.update(&path, &TokenBody::update(token), etag).await?;
        Ok(Self::settle(bundle, token.scope(), &token.service_account_id))
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn delete_token(
        &self,
        scope: &ScopeId,
        service_account_id: &str,
        id: &str,
    ) -> ApiResult<()> {
        self.api.delete(&paths::token(scope, service_account_id, id)).await
    }
}
